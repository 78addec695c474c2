#![feature(custom_test_frameworks)]
#![no_main]
#![no_std]
#![reexport_test_harness_main = "test_main"]
#![test_runner(libkernel::test_runner)]
#![feature(default_alloc_error_handler)]

use libkernel::kernel;
use test_macros::kernel_test;

#[no_mangle]
extern "Rust" fn kernel_main() -> ! {
    test_main();
    libkernel::architecture::shutdown(0);
}

#[kernel_test]
fn heap_allocations_are_aligned_and_distinct() {
    let a = kernel::heap::alloc(32);
    let b = kernel::heap::alloc(32);

    assert!(!a.is_null());
    assert!(!b.is_null());
    assert_eq!(a as usize % 16, 0);
    assert_eq!(b as usize % 16, 0);
    assert_ne!(a, b);

    unsafe {
        kernel::heap::free(a);
        kernel::heap::free(b);
    }
}

#[kernel_test]
fn page_alloc_reuses_freed_run_first_fit() {
    let a = kernel::page::alloc().expect("page allocator exhausted");
    kernel::page::free(a);
    let b = kernel::page::alloc().expect("page allocator exhausted");

    assert_eq!(a, b);
    kernel::page::free(b);
}

#[kernel_test]
fn used_and_free_pages_sum_to_total() {
    let before_used = kernel::page::used_pages();
    let a = kernel::page::alloc_n(3).expect("page allocator exhausted");

    assert_eq!(kernel::page::used_pages(), before_used + 3);
    assert_eq!(
        kernel::page::used_pages() + kernel::page::free_pages(),
        kernel::page::total_pages()
    );

    kernel::page::free_n(a, 3);
    assert_eq!(kernel::page::used_pages(), before_used);
}
