#![feature(custom_test_frameworks)]
#![no_main]
#![no_std]
#![reexport_test_harness_main = "test_main"]
#![test_runner(libkernel::test_runner)]
#![feature(default_alloc_error_handler)]

use libkernel::kernel::fs;
use test_macros::kernel_test;

#[no_mangle]
extern "Rust" fn kernel_main() -> ! {
    test_main();
    libkernel::architecture::shutdown(0);
}

#[kernel_test]
fn mkdir_touch_and_pwd_round_trip() {
    fs::mkdir("/a").expect("mkdir /a");
    fs::mkdir("/a/b").expect("mkdir /a/b");
    fs::touch("/a/b/c").expect("touch /a/b/c");

    fs::cd("/a/b").expect("cd /a/b");
    assert_eq!(fs::pwd(), "/a/b");

    fs::cd("..").expect("cd ..");
    assert_eq!(fs::pwd(), "/a");

    fs::cd("/").expect("cd /");
    assert_eq!(fs::pwd(), "/");
}

#[kernel_test]
fn write_then_read_round_trips_content() {
    fs::write("/roundtrip.txt", b"hello kernel").expect("write");
    let content = fs::read("/roundtrip.txt").expect("read");
    assert_eq!(content, b"hello kernel");
    fs::rm("/roundtrip.txt").expect("rm");
}

#[kernel_test]
fn rmdir_rejects_non_empty_and_root() {
    fs::mkdir("/nonempty").expect("mkdir");
    fs::touch("/nonempty/file").expect("touch");

    assert!(fs::rmdir("/nonempty").is_err());
    assert!(fs::rmdir("/").is_err());

    fs::rm("/nonempty/file").expect("rm");
    fs::rmdir("/nonempty").expect("rmdir now empty");
}

#[kernel_test]
fn dotdot_at_root_clamps_instead_of_erroring() {
    fs::cd("/").expect("cd /");
    fs::cd("..").expect("cd ..");
    assert_eq!(fs::pwd(), "/");
}
