#![feature(custom_test_frameworks)]
#![no_main]
#![no_std]
#![reexport_test_harness_main = "test_main"]
#![test_runner(libkernel::test_runner)]
#![feature(default_alloc_error_handler)]

use core::sync::atomic::{AtomicU64, Ordering};
use libkernel::kernel;
use test_macros::kernel_test;

#[no_mangle]
extern "Rust" fn kernel_main() -> ! {
    test_main();
    libkernel::architecture::shutdown(0);
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

extern "C" fn increment_and_exit() -> ! {
    COUNTER.fetch_add(1, Ordering::AcqRel);
    kernel::scheduler::exit();
}

#[kernel_test]
fn spawned_tasks_all_run() {
    const NUM_TASKS: u64 = 8;
    COUNTER.store(0, Ordering::Release);

    for _ in 0..NUM_TASKS {
        kernel::scheduler::spawn("worker", increment_and_exit).expect("task pool exhausted");
    }

    while COUNTER.load(Ordering::Acquire) < NUM_TASKS {
        aarch64_cpu::asm::wfi();
    }

    assert_eq!(COUNTER.load(Ordering::Acquire), NUM_TASKS);
}

#[kernel_test]
fn kill_rejects_the_shell_task() {
    assert!(kernel::scheduler::kill(0).is_err());
}

#[kernel_test]
fn kill_rejects_unknown_ids() {
    assert!(kernel::scheduler::kill(u32::MAX).is_err());
}
