use crate::{call_once_per_core, kernel::exception::PrivilegeLevel};
use aarch64_cpu::{
    asm::barrier,
    registers::{CurrentEL, DAIF, SCTLR_EL1, VBAR_EL1},
};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

/// Current privilege level.
pub fn exception_level() -> PrivilegeLevel {
    match CurrentEL.read_as_enum(CurrentEL::EL) {
        Some(CurrentEL::EL::Value::EL2) => PrivilegeLevel::Hypervisor,
        Some(CurrentEL::EL::Value::EL1) => PrivilegeLevel::Kernel,
        Some(CurrentEL::EL::Value::EL0) => PrivilegeLevel::User,
        _ => PrivilegeLevel::Unknown,
    }
}

/// Readies exception handling by pointing the vector base address register
/// at the trap entry vectors defined in [`crate::architecture::vectors`].
pub fn per_core_init() {
    extern "Rust" {
        static _exception_vector: core::cell::UnsafeCell<()>;
    }
    call_once_per_core!();

    VBAR_EL1.set(unsafe { core::ptr::addr_of!(_exception_vector) } as u64);

    // Force VBAR update to complete before the next instruction.
    barrier::isb(barrier::SY);
}

/// Unmasks IRQs, FIQs, SError and debug exceptions on the current core.
///
/// # Safety
/// Must only be called once per core, after the vector table and scheduler
/// are ready to service a trap.
pub unsafe fn enable() {
    call_once_per_core!();
    assert!(
        DAIF.matches_all(DAIF::D::Masked + DAIF::A::Masked + DAIF::I::Masked + DAIF::F::Masked),
        "Interrupts must be disabled to enable them"
    );
    DAIF.write(DAIF::D::Unmasked + DAIF::A::Unmasked + DAIF::I::Unmasked + DAIF::F::Unmasked);

    SCTLR_EL1.modify(SCTLR_EL1::A::Enable);
}

/// Saved interrupt-mask state, returned by [`disable`] and consumed by
/// [`restore`].
pub struct Masks {
    prior: u64,
}

/// Masks IRQs, FIQs, SError and debug exceptions, returning the prior state.
///
/// # Safety
/// Must be paired with a [`restore`] of the returned state so that masking
/// is never leaked across an early return.
pub unsafe fn disable() -> Masks {
    let state = Masks { prior: DAIF.get() };
    DAIF.write(DAIF::D::Masked + DAIF::A::Masked + DAIF::I::Masked + DAIF::F::Masked);
    state
}

/// Restores an interrupt-mask state previously returned by [`disable`].
///
/// # Safety
/// `state` must be the most recently returned, not-yet-restored state from
/// `disable` on this core.
pub unsafe fn restore(state: &Masks) {
    DAIF.set(state.prior);
}
