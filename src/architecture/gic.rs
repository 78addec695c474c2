//! GIC-400 class interrupt controller: distributor + CPU interface.
//!
//! On this board family the generic-timer interrupt is actually gated by the
//! ARM local peripherals block (see [`crate::architecture::local_intc`]); the
//! GIC must still be brought up identically so the same binary also works on
//! real hardware where the GIC alone is sufficient.

use crate::architecture::config::{GICC_BASE, GICD_BASE};
use crate::architecture::mmio::Mmio;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_structs,
    registers::{ReadOnly, ReadWrite, WriteOnly},
};

register_structs! {
    #[allow(non_snake_case)]
    DistributorBlock {
        (0x000 => CTLR: ReadWrite<u32>),
        (0x004 => _reserved0),
        (0x100 => ISENABLER: [ReadWrite<u32>; 32]),
        (0x180 => _reserved1),
        (0x400 => IPRIORITYR: [ReadWrite<u32>; 256]),
        (0x800 => ITARGETSR: [ReadWrite<u32>; 256]),
        (0xC00 => @END),
    }
}

register_structs! {
    #[allow(non_snake_case)]
    CpuInterfaceBlock {
        (0x00 => CTLR: ReadWrite<u32>),
        (0x04 => PMR: ReadWrite<u32>),
        (0x08 => _reserved0),
        (0x0C => IAR: ReadOnly<u32>),
        (0x10 => EOIR: WriteOnly<u32>),
        (0x14 => @END),
    }
}

/// Distributor register block, one per system.
struct Distributor {
    registers: Mmio<DistributorBlock>,
}

/// CPU interface register block, banked per core by hardware at a shared VA.
struct CpuInterface {
    registers: Mmio<CpuInterfaceBlock>,
}

impl Distributor {
    const unsafe fn new(base: usize) -> Self {
        Self {
            registers: unsafe { Mmio::new(base as *mut DistributorBlock) },
        }
    }
}

impl CpuInterface {
    const unsafe fn new(base: usize) -> Self {
        Self {
            registers: unsafe { Mmio::new(base as *mut CpuInterfaceBlock) },
        }
    }
}

static DISTRIBUTOR: Distributor = unsafe { Distributor::new(GICD_BASE) };
static CPU_INTERFACE: CpuInterface = unsafe { CpuInterface::new(GICC_BASE) };

/// Priority assigned to every enabled interrupt; mid-range so nothing starves.
const DEFAULT_PRIORITY: u32 = 0xA0;

/// Initializes the distributor and this core's CPU interface: disable then
/// re-enable both, and accept any interrupt priority.
pub fn init() {
    DISTRIBUTOR.registers.CTLR.set(0);
    CPU_INTERFACE.registers.CTLR.set(0);

    CPU_INTERFACE.registers.PMR.set(0xFF);

    DISTRIBUTOR.registers.CTLR.set(1);
    CPU_INTERFACE.registers.CTLR.set(1);
}

/// Enables `id`, with default priority, targeted at CPU 0.
pub fn enable_interrupt(id: u32) {
    let reg = (id / 4) as usize;
    let shift = (id % 4) * 8;

    let priority = DISTRIBUTOR.registers.IPRIORITYR[reg].get();
    DISTRIBUTOR.registers.IPRIORITYR[reg]
        .set((priority & !(0xFF << shift)) | (DEFAULT_PRIORITY << shift));

    let targets = DISTRIBUTOR.registers.ITARGETSR[reg].get();
    DISTRIBUTOR.registers.ITARGETSR[reg].set((targets & !(0xFF << shift)) | (0x01 << shift));

    let enable_reg = (id / 32) as usize;
    let enable_bit = id % 32;
    DISTRIBUTOR.registers.ISENABLER[enable_reg].set(1 << enable_bit);
}

/// Acknowledges the highest-priority pending interrupt, returning its ID.
pub fn get_interrupt() -> u32 {
    CPU_INTERFACE.registers.IAR.get() & 0x3FF
}

/// Signals end-of-interrupt for `id`.
pub fn end_interrupt(id: u32) {
    CPU_INTERFACE.registers.EOIR.set(id);
}
