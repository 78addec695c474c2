//! Identity-mapped MMU bring-up.
//!
//! Installs a static translation table covering the first 1 GiB of physical
//! RAM as cacheable Normal memory, and [3 GiB, 4 GiB) as strongly-ordered
//! Device memory, then enables the MMU and both caches. Uses 2 MiB block
//! descriptors at level 2, so no level-3 table is needed.
//!
//! This must run exactly once, before any cache-sensitive access, and before
//! any MMIO device driver is touched (the device window it maps is what lets
//! [`crate::architecture::gic`], [`crate::architecture::local_intc`] and
//! [`crate::board::uart`] be accessed safely as Device memory rather than
//! whatever the reset-time default attributes happen to be).

use aarch64_cpu::{
    asm::barrier,
    registers::{MAIR_EL1, SCTLR_EL1, TCR_EL1, TTBR0_EL1, TTBR1_EL1},
};
use core::sync::atomic::{AtomicBool, Ordering};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

/// Number of entries in a single translation table at any level.
const ENTRIES_PER_TABLE: usize = 512;
/// Size of a level-2 block descriptor's mapped region.
const BLOCK_SIZE: u64 = 2 * 1024 * 1024;
/// Base of the device window this kernel maps: 3 GiB.
const DEVICE_WINDOW_BASE: u64 = 3 * 1024 * 1024 * 1024;

const VALID: u64 = 1 << 0;
const TABLE_OR_PAGE: u64 = 1 << 1;
/// For L1/L2 descriptors pointing at a further table, bit 1 is also set; the
/// distinction from a block descriptor is made by the level, not this value,
/// so `TABLE_OR_PAGE` is reused for "table descriptor" at L0/L1.
const BLOCK: u64 = 0 << 1;
const ACCESS_FLAG: u64 = 1 << 10;
const INNER_SHAREABLE: u64 = 0b11 << 8;
const OUTER_SHAREABLE: u64 = 0b10 << 8;
const AP_EL1_RW: u64 = 0 << 6;

/// MAIR attribute index for Device-nGnRnE memory.
const ATTR_DEVICE: u64 = 0;
/// MAIR attribute index for Normal, Write-Back, RA/WA memory.
const ATTR_NORMAL: u64 = 1;

const fn attr_index(index: u64) -> u64 {
    index << 2
}

#[repr(C, align(4096))]
struct Table([u64; ENTRIES_PER_TABLE]);

impl Table {
    const fn zeroed() -> Self {
        Self([0; ENTRIES_PER_TABLE])
    }
}

static mut L0_TABLE: Table = Table::zeroed();
static mut L1_TABLE: Table = Table::zeroed();
static mut L2_NORMAL_TABLE: Table = Table::zeroed();
static mut L2_DEVICE_TABLE: Table = Table::zeroed();

static MMU_ENABLED: AtomicBool = AtomicBool::new(false);

/// Builds the static translation tables, programs `MAIR_EL1`/`TCR_EL1`, and
/// enables the MMU, data cache and instruction cache.
///
/// # Safety
/// Must be called exactly once during boot, before any other core is
/// running and before any cache-sensitive operation.
pub unsafe fn init() {
    // SAFETY: single-threaded at this point in boot; no other core is up yet
    // and no code has taken a reference into these tables.
    let (l0, l1, l2_normal, l2_device) = unsafe {
        (
            &mut *core::ptr::addr_of_mut!(L0_TABLE),
            &mut *core::ptr::addr_of_mut!(L1_TABLE),
            &mut *core::ptr::addr_of_mut!(L2_NORMAL_TABLE),
            &mut *core::ptr::addr_of_mut!(L2_DEVICE_TABLE),
        )
    };

    for entry in l0.0.iter_mut().chain(l1.0.iter_mut()) {
        *entry = 0;
    }

    for (i, entry) in l2_normal.0.iter_mut().enumerate() {
        let phys = i as u64 * BLOCK_SIZE;
        *entry = phys
            | VALID
            | BLOCK
            | ACCESS_FLAG
            | attr_index(ATTR_NORMAL)
            | INNER_SHAREABLE
            | AP_EL1_RW;
    }

    for (i, entry) in l2_device.0.iter_mut().enumerate() {
        let phys = DEVICE_WINDOW_BASE + i as u64 * BLOCK_SIZE;
        *entry = phys
            | VALID
            | BLOCK
            | ACCESS_FLAG
            | attr_index(ATTR_DEVICE)
            | OUTER_SHAREABLE
            | AP_EL1_RW;
    }

    l1.0[0] = (l2_normal as *const Table as u64) | VALID | TABLE_OR_PAGE;
    l1.0[3] = (l2_device as *const Table as u64) | VALID | TABLE_OR_PAGE;
    l0.0[0] = (l1 as *const Table as u64) | VALID | TABLE_OR_PAGE;

    // Attr0 = Device-nGnRnE (0x00), Attr1 = Normal WB RA/WA (0xFF).
    MAIR_EL1.set(0x00 | (0xFF << 8));

    TCR_EL1.write(
        TCR_EL1::T0SZ.val(16)
            + TCR_EL1::IRGN0::WriteBack_ReadAlloc_WriteAlloc_Cacheable
            + TCR_EL1::ORGN0::WriteBack_ReadAlloc_WriteAlloc_Cacheable
            + TCR_EL1::SH0::Inner
            + TCR_EL1::TG0::KiB_4
            + TCR_EL1::IPS::Bits_40,
    );

    TTBR0_EL1.set(l0 as *const Table as u64);
    TTBR1_EL1.set(0);

    barrier::dsb(barrier::SY);
    barrier::isb(barrier::SY);

    SCTLR_EL1.modify(SCTLR_EL1::M::Enable + SCTLR_EL1::C::Cacheable + SCTLR_EL1::I::Cacheable);

    barrier::isb(barrier::SY);

    MMU_ENABLED.store(true, Ordering::Release);
}

/// Whether [`init`] has completed and the MMU is active.
pub fn is_enabled() -> bool {
    MMU_ENABLED.load(Ordering::Acquire)
}

/// Installs the translation-table configuration core 0 published in
/// [`crate::architecture::smp`], then enables the MMU and both caches on
/// this core.
///
/// # Safety
/// Must only be called on a secondary core, after
/// [`crate::architecture::smp::wake_secondary_cores`] has published the
/// shared registers.
pub unsafe fn init_secondary() {
    use crate::architecture::smp::{SMP_SHARED_MAIR, SMP_SHARED_TCR, SMP_SHARED_TTBR0};

    // SAFETY: core 0 finished publishing these before releasing this core.
    let (ttbr0, tcr, mair) = unsafe { (SMP_SHARED_TTBR0, SMP_SHARED_TCR, SMP_SHARED_MAIR) };

    MAIR_EL1.set(mair);
    TCR_EL1.set(tcr);
    TTBR0_EL1.set(ttbr0);
    TTBR1_EL1.set(0);

    barrier::dsb(barrier::SY);
    barrier::isb(barrier::SY);

    SCTLR_EL1.modify(SCTLR_EL1::M::Enable + SCTLR_EL1::C::Cacheable + SCTLR_EL1::I::Cacheable);

    barrier::isb(barrier::SY);
}

/// Emits a textual description of the key MMU configuration registers, for
/// the `mmu` shell command.
pub fn dump_config() {
    crate::println!("MMU Configuration:");
    crate::println!(
        "  SCTLR_EL1: MMU={} D-Cache={} I-Cache={}",
        SCTLR_EL1.matches_all(SCTLR_EL1::M::Enable),
        SCTLR_EL1.matches_all(SCTLR_EL1::C::Cacheable),
        SCTLR_EL1.matches_all(SCTLR_EL1::I::Cacheable),
    );
    crate::println!("  TCR_EL1:   0x{:016X}", TCR_EL1.get());
    crate::println!("  MAIR_EL1:  0x{:016X}", MAIR_EL1.get());
    crate::println!("  TTBR0_EL1: 0x{:016X}", TTBR0_EL1.get());
    crate::println!("  Memory map:");
    crate::println!("    0x0000_0000-0x3FFF_FFFF  1GiB RAM    (Normal, cacheable)");
    crate::println!("    0xC000_0000-0xFFFF_FFFF  1GiB Device (UART, GIC, local peripherals)");
}
