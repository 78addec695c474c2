//! Fixed board and kernel constants.
//!
//! Centralizes every magic address and size so the rest of the kernel never
//! repeats one. Addresses are for the BCM2711-style SoC on the emulated
//! Raspberry Pi 4 board (QEMU `raspi4b`).

/// PL011-compatible UART0.
pub const UART0_BASE: usize = 0xFE20_1000;

/// GIC-400 distributor.
pub const GICD_BASE: usize = 0xFF84_1000;
/// GIC-400 CPU interface.
pub const GICC_BASE: usize = 0xFF84_2000;

/// ARM local peripherals block (per-core timer IRQ routing).
pub const LOCAL_PERIPHERALS_BASE: usize = 0xFF80_0000;

/// Physical addresses of the firmware spin-table slots for cores 1..3.
pub const SPIN_TABLE: [usize; 3] = [0xE0, 0xE8, 0xF0];

/// Number of cores brought up at boot.
pub const NUM_CORES: usize = 4;

/// Bytes per page.
pub const PAGE_SIZE: usize = 4096;
/// log2(PAGE_SIZE).
pub const PAGE_SHIFT: u32 = 12;

/// Number of pages managed by the bitmap page allocator.
pub const MANAGED_PAGES: usize = (64 * 1024 * 1024) / PAGE_SIZE;

/// Physical base address of the region the page allocator manages.
///
/// Placed well above the kernel image and its BSS so the two never collide.
pub const MANAGED_BASE: usize = 0x0020_0000;

/// Number of pages reserved up front for the sub-page object allocator's
/// bump/free-list heap window.
pub const HEAP_PAGES: usize = 64;

/// Per-task stack size.
pub const STACK_SIZE: usize = 8 * 1024;

/// Scheduling quantum, and the period of the periodic timer interrupt.
pub const TICK_INTERVAL_MS: u32 = 100;

/// Maximum number of schedulable tasks, including the reserved shell slot.
pub const MAX_TASKS: usize = 16;

/// GIC interrupt ID the non-secure physical timer is wired to (SPI 30, the
/// standard virt/raspi4 binding).
pub const TIMER_IRQ_ID: u32 = 30;
