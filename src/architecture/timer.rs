//! Raw access to the ARM generic physical timer.
//!
//! One generic timer exists per core; each core programs and re-arms its own
//! copy independently. The frequency register is shared system state.

use aarch64_cpu::{
    asm::barrier,
    registers::{CNTFRQ_EL0, CNTP_CTL_EL0, CNTP_TVAL_EL0, CNTPCT_EL0},
};
use core::num::NonZeroU32;
use tock_registers::interfaces::{Readable, Writeable};

/// Returns the frequency of the system counter, in Hz.
pub fn frequency() -> NonZeroU32 {
    // The upper 32 bits are architecturally reserved to zero.
    u32::try_from(CNTFRQ_EL0.get())
        .unwrap()
        .try_into()
        .expect("Counter frequency should be nonzero")
}

/// Returns the current raw value of the physical counter.
pub fn current_count() -> u64 {
    // Prevent the counter from being read ahead of time due to out-of-order
    // execution.
    barrier::isb(barrier::SY);
    CNTPCT_EL0.get()
}

/// Programs this core's physical timer to fire `ticks` counter cycles from
/// now, and enables it with the interrupt unmasked.
pub fn arm(ticks: u64) {
    CNTP_TVAL_EL0.set(ticks);
    CNTP_CTL_EL0.write(CNTP_CTL_EL0::ENABLE::SET + CNTP_CTL_EL0::IMASK::CLEAR);
}

/// Re-arms this core's timer for another `ticks` cycles from now, without
/// touching the enable/mask bits.
pub fn rearm(ticks: u64) {
    CNTP_TVAL_EL0.set(ticks);
}

/// Returns whether this core's timer condition is currently met
/// (`ISTATUS`), i.e. whether it is the source of a pending IRQ.
pub fn is_pending() -> bool {
    CNTP_CTL_EL0.is_set(CNTP_CTL_EL0::ISTATUS)
}
