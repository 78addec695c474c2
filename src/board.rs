mod uart;
pub use uart::serial;

use crate::call_once;

pub fn init() {
    // Must only be initialized once
    call_once!();
    serial().init();
}
