//! The initialization sequences

#![no_main]
#![no_std]
#![feature(format_args_nl)]
#![feature(panic_info_message)]
#![feature(const_option)]
#![feature(once_cell)]
#![feature(strict_provenance_atomic_ptr)]
#![feature(result_option_inspect)]
#![feature(alloc_error_handler)]
#![feature(fn_traits)]
#![feature(ptr_to_from_bits)]
#![feature(ptr_metadata)]
#![feature(custom_test_frameworks)]
#![feature(default_alloc_error_handler)]
#![feature(pointer_byte_offsets)]
#![feature(int_roundings)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![reexport_test_harness_main = "test_main"]
#![test_runner(crate::test_runner)]

extern crate alloc;

pub mod architecture;
pub mod board;
pub mod kernel;

/// The default runner for `#[kernel_test]`s: each one runs once, in
/// sequence, on the boot context (no scheduler needed since tests are
/// synchronous functions).
pub fn test_runner(tests: &[&test_types::UnitTest]) -> ! {
    println!("Running {} tests", tests.len());

    for test in tests {
        println!("{}:", test.name);
        (test.test_func)();
        println!(".... PASSED");
    }

    architecture::shutdown(0);
}

/// The entry point `kernel::init::init` calls once boot is complete, for
/// the lib crate's own unit tests. Integration tests under `tests/` link
/// against this crate and provide their own.
#[cfg(test)]
#[no_mangle]
extern "Rust" fn kernel_main() -> ! {
    test_main();
    architecture::shutdown(0);
}
