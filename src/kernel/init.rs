use crate::{architecture, board, call_once, call_once_per_core, kernel, log};

extern "Rust" {
    /// The binary-specific entry point: the real shell for `main.rs`, the
    /// generated test harness for `lib.rs` and its integration tests.
    fn kernel_main() -> !;
}

/// Global and per-core initialization, reached from [`el2_init`][boot] on
/// every core.
///
/// Core 0 runs the full boot sequence once: console, allocators, MMU,
/// filesystem, interrupt controller, timer, scheduler, then wakes the
/// other cores. Every core — including 0 — then does its own vector-table
/// and local-interrupt setup before unmasking IRQs.
///
/// [boot]: crate::architecture::boot::el2_init
#[no_mangle]
pub extern "C" fn init() -> ! {
    if architecture::machine::core_id() == 0 {
        call_once!();

        board::init();
        log!("Console up. Bringing up the allocator...");

        kernel::page::init();
        kernel::heap::init();

        // SAFETY: single core running, no cache-sensitive access has
        // happened yet.
        unsafe {
            architecture::init();
        }

        kernel::fs::init();

        architecture::gic::init();
        architecture::gic::enable_interrupt(architecture::config::TIMER_IRQ_ID);
        architecture::local_intc::enable_timer_irq_core(0);
        arm_timer();

        kernel::scheduler::init();

        log!("Boot sequence complete, waking secondary cores");
        // SAFETY: MMU is enabled and the shared stacks have not been
        // handed to any secondary core yet.
        unsafe {
            architecture::smp::wake_secondary_cores();
        }
    }

    per_core_init()
}

fn arm_timer() {
    let ticks = (u64::from(architecture::timer::frequency().get()) / 1000)
        * u64::from(architecture::config::TICK_INTERVAL_MS);
    architecture::timer::arm(ticks);
}

/// Per-core initialization: vector table, and — for secondary cores —
/// MMU, local interrupt routing, and timer arming. Finishes by unmasking
/// IRQs and entering this core's main loop.
fn per_core_init() -> ! {
    call_once_per_core!();

    assert_eq!(
        architecture::exception::exception_level(),
        kernel::exception::PrivilegeLevel::Kernel,
        "The kernel must be running with kernel privileges"
    );

    architecture::per_core_init();

    let core = architecture::machine::core_id();
    if core != 0 {
        // SAFETY: core 0 published the shared translation-table config
        // before releasing this core.
        unsafe {
            architecture::mmu::init_secondary();
        }
        architecture::gic::init();
        architecture::local_intc::enable_timer_irq_core(core);
        arm_timer();
        kernel::core_state::mark_online(core);
    }

    log!("Core {}: enabling interrupts", core);
    // SAFETY: every subsystem this core's IRQ path touches (vectors,
    // timer, GIC, and — on core 0 — the scheduler) is initialized above.
    unsafe {
        architecture::exception::enable();
    }

    if core == 0 {
        // SAFETY: `kernel_main` is defined exactly once, by whichever
        // binary (or test harness) links against this module tree.
        unsafe { kernel_main() }
    } else {
        loop {
            aarch64_cpu::asm::wfi();
        }
    }
}
