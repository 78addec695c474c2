/// Represents the privilege level of some execution context.
#[derive(PartialEq, Debug)]
pub enum PrivilegeLevel {
    /// Lowest privilege mode. Unused by this kernel; retained so a
    /// misconfigured vector base can still be reported precisely.
    User,
    /// OS privilege mode, the only level this kernel ever runs at.
    Kernel,
    /// Privilege mode above the OS; may or may not exist.
    Hypervisor,
    /// Unknown privilege level.
    Unknown,
}
