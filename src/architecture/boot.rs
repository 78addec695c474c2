//! Reset vector and secondary-core entry.
//!
//! `_start` is the fixed address QEMU's `raspi4b` machine jumps to on core
//! 0 at reset. It sets up a boot stack, zeroes BSS, then falls into
//! [`el2_init`] to drop to EL1. `_per_core_init` is the address written into
//! the firmware spin-table by [`crate::architecture::smp`]; a woken
//! secondary core lands there instead, picks its stack out of
//! [`crate::architecture::smp::SMP_STACK_TOPS`], and falls into the same
//! `el2_init`.

use crate::architecture::config::STACK_SIZE;

#[repr(align(16))]
struct BootStack([u8; STACK_SIZE]);

static mut BOOT_STACK: BootStack = BootStack([0; STACK_SIZE]);

core::arch::global_asm!(
    "
    .section .text._start

    .global _start
    _start:
        adrp x1, {boot_stack}
        add  x1, x1, :lo12:{boot_stack}
        add  x1, x1, {stack_size}
        mov  sp, x1

        adrp x1, __bss_start
        add  x1, x1, :lo12:__bss_start
        adrp x2, __bss_end
        add  x2, x2, :lo12:__bss_end
    1:
        cmp  x1, x2
        b.ge 2f
        str  xzr, [x1], 8
        b    1b
    2:
        bl {el2_init}
        b   .

    .global _per_core_init
    _per_core_init:
        mrs  x0, mpidr_el1
        and  x0, x0, 0b11
        adrp x1, {smp_stack_tops}
        add  x1, x1, :lo12:{smp_stack_tops}
        ldr  x1, [x1, x0, lsl 3]
        mov  sp, x1
        bl   {el2_init}
        b    .
    ",
    boot_stack = sym BOOT_STACK,
    stack_size = const STACK_SIZE as u64,
    smp_stack_tops = sym crate::architecture::smp::SMP_STACK_TOPS,
    el2_init = sym el2_init,
);

/// Switches the core from EL2 to EL1, sets up the per-exception-level stack
/// pointer, and jumps to the kernel's global or per-core init sequence.
#[no_mangle]
extern "C" fn el2_init() -> ! {
    use crate::kernel::exception::PrivilegeLevel;
    use aarch64_cpu::{
        asm::eret,
        registers::{CNTHCTL_EL2, CNTVOFF_EL2, ELR_EL2, HCR_EL2, SPSR_EL2, SP, SP_EL1},
    };
    use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

    assert_eq!(
        crate::architecture::exception::exception_level(),
        PrivilegeLevel::Hypervisor,
        "The boot sequence must be running in EL2"
    );

    HCR_EL2.modify(
        HCR_EL2::RW::EL1IsAarch64
            + HCR_EL2::TGE::DisableTrapGeneralExceptionsToEl2
            + HCR_EL2::E2H::DisableOsAtEl2,
    );

    CNTHCTL_EL2.write(CNTHCTL_EL2::EL1PCEN::SET + CNTHCTL_EL2::EL1PCTEN::SET);
    CNTVOFF_EL2.set(0);

    SPSR_EL2.modify(
        SPSR_EL2::D::Masked
            + SPSR_EL2::A::Masked
            + SPSR_EL2::I::Masked
            + SPSR_EL2::F::Masked
            + SPSR_EL2::M::EL1h,
    );

    ELR_EL2.set(crate::kernel::init::init as *const () as u64);
    SP_EL1.set(SP.get());
    eret();
}
