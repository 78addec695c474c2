//! ARM "local peripherals" block.
//!
//! Per-core SoC-specific registers that gate the generic timer's interrupt
//! line to each core. On the emulated board the GIC alone does not deliver
//! the physical-timer interrupt; this block must also be armed.

use crate::architecture::config::{LOCAL_PERIPHERALS_BASE, NUM_CORES};
use crate::architecture::mmio::Mmio;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_structs,
    registers::ReadWrite,
};

register_structs! {
    #[allow(non_snake_case)]
    LocalPeripheralsBlock {
        (0x00 => _reserved0),
        (0x40 => TIMER_IRQ_CTRL: [ReadWrite<u32>; 4]),
        (0x60 => IRQ_SOURCE: [ReadWrite<u32>; 4]),
        (0x70 => @END),
    }
}

/// Bit enabling the non-secure physical timer IRQ in `TIMER_IRQ_CTRL`.
const NS_PHYSICAL_TIMER_IRQ: u32 = 1 << 1;

struct LocalPeripherals {
    registers: Mmio<LocalPeripheralsBlock>,
}

impl LocalPeripherals {
    const unsafe fn new(base: usize) -> Self {
        Self {
            registers: unsafe { Mmio::new(base as *mut LocalPeripheralsBlock) },
        }
    }
}

static LOCAL_PERIPHERALS: LocalPeripherals =
    unsafe { LocalPeripherals::new(LOCAL_PERIPHERALS_BASE) };

/// Arms the non-secure physical timer IRQ routing for core `core`.
pub fn enable_timer_irq_core(core: u8) {
    let index = core as usize;
    assert!(index < NUM_CORES, "Core index out of range");
    LOCAL_PERIPHERALS.registers.TIMER_IRQ_CTRL[index].set(NS_PHYSICAL_TIMER_IRQ);
}

/// Returns whether the physical timer IRQ is pending for core `core`,
/// according to the read-only pending-source window.
pub fn timer_irq_pending_core(core: u8) -> bool {
    let index = core as usize;
    assert!(index < NUM_CORES, "Core index out of range");
    LOCAL_PERIPHERALS.registers.IRQ_SOURCE[index].get() & NS_PHYSICAL_TIMER_IRQ != 0
}
