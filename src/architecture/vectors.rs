//! Exception vector table and trapframe save/restore.
//!
//! The kernel never runs below EL1, so every trap this kernel cares about
//! arrives through the "current EL, using SP_ELx" group of the vector
//! table. The other three groups (current EL with SP_EL0, and both lower-EL
//! groups) are wired to diagnostic panics in
//! [`crate::architecture::exception_handlers`] purely so a misconfigured
//! `VBAR_EL1` or an unexpected AArch32 trap doesn't run off into the weeds.
//!
//! IRQ is the one entry that does real work: it saves a full 34-word
//! trapframe (x0-x30, ELR_EL1, SPSR_EL1, padding for 16-byte stack
//! alignment), hands the saved stack pointer to
//! [`crate::kernel::scheduler::on_irq`], and resumes whatever stack pointer
//! comes back — which may belong to a different task than the one that was
//! interrupted.

use crate::kernel::scheduler::Trapframe;

core::arch::global_asm!(
    "
    .macro VECTOR handler
    .balign 0x80
    b \\handler
    .endm

    .section .text._vectors
    .balign 2048
    .global _exception_vector
    _exception_vector:
    VECTOR curr_el0_sync_entry
    VECTOR curr_el0_irq_entry
    VECTOR curr_el0_fiq_entry
    VECTOR curr_el0_other_entry

    VECTOR curr_elx_sync_entry
    VECTOR curr_elx_irq_entry
    VECTOR curr_elx_fiq_entry
    VECTOR curr_elx_other_entry

    VECTOR lower_el_sync_64_entry
    VECTOR lower_el_irq_64_entry
    VECTOR lower_el_fiq_64_entry
    VECTOR lower_el_other_64_entry

    VECTOR lower_el_sync_32_entry
    VECTOR lower_el_irq_32_entry
    VECTOR lower_el_fiq_32_entry
    VECTOR lower_el_other_32_entry

    .macro SAVE_TRAPFRAME
    sub sp, sp, 34 * 8
    stp x0,  x1,  [sp, 16 * 0]
    stp x2,  x3,  [sp, 16 * 1]
    stp x4,  x5,  [sp, 16 * 2]
    stp x6,  x7,  [sp, 16 * 3]
    stp x8,  x9,  [sp, 16 * 4]
    stp x10, x11, [sp, 16 * 5]
    stp x12, x13, [sp, 16 * 6]
    stp x14, x15, [sp, 16 * 7]
    stp x16, x17, [sp, 16 * 8]
    stp x18, x19, [sp, 16 * 9]
    stp x20, x21, [sp, 16 * 10]
    stp x22, x23, [sp, 16 * 11]
    stp x24, x25, [sp, 16 * 12]
    stp x26, x27, [sp, 16 * 13]
    stp x28, x29, [sp, 16 * 14]
    mrs x0, ELR_EL1
    mrs x1, SPSR_EL1
    stp x30, x0,  [sp, 16 * 15]
    stp x1,  xzr, [sp, 16 * 16]
    .endm

    .macro RESTORE_TRAPFRAME
    ldp x1,  x0, [sp, 16 * 16]
    msr SPSR_EL1, x1
    ldp x30, x1, [sp, 16 * 15]
    msr ELR_EL1, x1
    ldp x28, x29, [sp, 16 * 14]
    ldp x26, x27, [sp, 16 * 13]
    ldp x24, x25, [sp, 16 * 12]
    ldp x22, x23, [sp, 16 * 11]
    ldp x20, x21, [sp, 16 * 10]
    ldp x18, x19, [sp, 16 * 9]
    ldp x16, x17, [sp, 16 * 8]
    ldp x14, x15, [sp, 16 * 7]
    ldp x12, x13, [sp, 16 * 6]
    ldp x10, x11, [sp, 16 * 5]
    ldp x8,  x9,  [sp, 16 * 4]
    ldp x6,  x7,  [sp, 16 * 3]
    ldp x4,  x5,  [sp, 16 * 2]
    ldp x2,  x3,  [sp, 16 * 1]
    ldp x0,  x1,  [sp, 16 * 0]
    add sp, sp, 34 * 8
    .endm

    curr_el0_sync_entry:   SAVE_TRAPFRAME
                           bl curr_el0_sync
                           b .
    curr_el0_irq_entry:    SAVE_TRAPFRAME
                           bl curr_el0_irq
                           b .
    curr_el0_fiq_entry:    SAVE_TRAPFRAME
                           bl curr_el0_fiq
                           b .
    curr_el0_other_entry:  SAVE_TRAPFRAME
                           bl curr_el0_other
                           b .

    curr_elx_sync_entry:   SAVE_TRAPFRAME
                           bl curr_elx_sync
                           b .

    curr_elx_irq_entry:
    SAVE_TRAPFRAME
    mov x0, sp
    bl handle_irq_trapframe
    mov sp, x0
    RESTORE_TRAPFRAME
    eret

    curr_elx_fiq_entry:    SAVE_TRAPFRAME
                           bl curr_elx_fiq
                           b .
    curr_elx_other_entry:  SAVE_TRAPFRAME
                           bl curr_elx_other
                           b .

    lower_el_sync_64_entry:  SAVE_TRAPFRAME
                             bl lower_el_sync_64
                             b .
    lower_el_irq_64_entry:   SAVE_TRAPFRAME
                             bl lower_el_irq_64
                             b .
    lower_el_fiq_64_entry:   SAVE_TRAPFRAME
                             bl lower_el_fiq_64
                             b .
    lower_el_other_64_entry: SAVE_TRAPFRAME
                             bl lower_el_other_64
                             b .

    lower_el_sync_32_entry:  SAVE_TRAPFRAME
                             bl lower_el_sync_32
                             b .
    lower_el_irq_32_entry:   SAVE_TRAPFRAME
                             bl lower_el_irq_32
                             b .
    lower_el_fiq_32_entry:   SAVE_TRAPFRAME
                             bl lower_el_fiq_32
                             b .
    lower_el_other_32_entry: SAVE_TRAPFRAME
                             bl lower_el_other_32
                             b .
    "
);

/// Called from the IRQ vector entry with `sp` pointing at the just-saved
/// trapframe of the interrupted task. Returns the stack pointer of the
/// trapframe that should be resumed, which may be the same task or the one
/// the scheduler picked next.
#[no_mangle]
extern "C" fn handle_irq_trapframe(sp: *mut Trapframe) -> *mut Trapframe {
    crate::kernel::scheduler::on_irq(sp)
}
