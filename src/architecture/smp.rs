//! Secondary core bring-up via the QEMU `raspi4b` firmware spin-table.
//!
//! Cores 1-3 reset into a firmware stub that parks them in a `wfe` loop
//! polling a fixed physical address. Writing a non-zero entry address there
//! and issuing `sev` releases the corresponding core into
//! [`_per_core_init`][boot], the same secondary entry point the boot
//! assembly defines.
//!
//! [boot]: crate::architecture::boot

use crate::architecture::config::{NUM_CORES, SPIN_TABLE, STACK_SIZE};
use crate::kernel::core_state;
use aarch64_cpu::{
    asm::{barrier, sev},
    registers::{CNTFRQ_EL0, CNTPCT_EL0, MAIR_EL1, TCR_EL1, TTBR0_EL1},
};
use tock_registers::interfaces::Readable;

#[repr(align(16))]
struct SecondaryStack([u8; STACK_SIZE]);

impl SecondaryStack {
    const fn new() -> Self {
        Self([0; STACK_SIZE])
    }
}

static mut SECONDARY_STACKS: [SecondaryStack; NUM_CORES - 1] = [
    SecondaryStack::new(),
    SecondaryStack::new(),
    SecondaryStack::new(),
];

/// Stack-top pointers indexed by core ID, read by the `_per_core_init`
/// assembly entry. Slot 0 is unused; core 0 already has a boot stack.
#[no_mangle]
pub static mut SMP_STACK_TOPS: [u64; NUM_CORES] = [0; NUM_CORES];

/// MMU configuration sampled from core 0 after [`crate::architecture::mmu::init`],
/// consumed by each secondary core before it enables its own MMU.
#[no_mangle]
pub static mut SMP_SHARED_TTBR0: u64 = 0;
#[no_mangle]
pub static mut SMP_SHARED_TCR: u64 = 0;
#[no_mangle]
pub static mut SMP_SHARED_MAIR: u64 = 0;

extern "C" {
    fn _per_core_init() -> !;
}

/// Publishes the shared MMU configuration and per-core boot stacks, wakes
/// cores 1-3, and waits up to ~200 ms for all three to mark themselves
/// online before returning regardless.
///
/// # Safety
/// Must run exactly once, after the MMU is enabled on core 0 and before any
/// secondary core has been released.
pub unsafe fn wake_secondary_cores() {
    crate::call_once!();
    core_state::mark_online(0);

    // SAFETY: single core is running at this point; no secondary core has
    // been released yet to race these writes.
    unsafe {
        for (i, stack) in SECONDARY_STACKS.iter_mut().enumerate() {
            let top = stack.0.as_mut_ptr() as u64 + STACK_SIZE as u64;
            SMP_STACK_TOPS[i + 1] = top;
        }

        SMP_SHARED_TTBR0 = TTBR0_EL1.get();
        SMP_SHARED_TCR = TCR_EL1.get();
        SMP_SHARED_MAIR = MAIR_EL1.get();
    }

    barrier::dsb(barrier::SY);

    for &addr in SPIN_TABLE.iter() {
        // SAFETY: `addr` is one of the three fixed firmware spin-table
        // slots; writing the secondary entry point there and sev-ing wakes
        // exactly the core parked on it.
        unsafe {
            core::ptr::write_volatile(addr as *mut u64, _per_core_init as usize as u64);
        }
        sev();
    }

    let freq = CNTFRQ_EL0.get();
    let deadline = CNTPCT_EL0.get() + freq / 5;
    loop {
        if CNTPCT_EL0.get() >= deadline {
            break;
        }
        if (1..NUM_CORES as u8).all(core_state::is_online) {
            break;
        }
    }

    crate::log!(
        "{}/{} cores online",
        core_state::online_count(),
        NUM_CORES
    );
}
