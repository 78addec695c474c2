/// A serial output.
pub trait Serial {
    /// Writes a format string.
    fn write_fmt(&self, args: core::fmt::Arguments);

    /// Attempts to read a byte as input.
    fn read_byte(&self) -> Option<u8>;
}
