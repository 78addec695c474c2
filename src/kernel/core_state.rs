//! Per-core descriptors: online flag and local tick count.
//!
//! Each core only ever writes its own entry, from its own secondary entry
//! point, so no lock is needed beyond the atomics themselves.

use crate::architecture::config::NUM_CORES;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

struct CoreDescriptor {
    online: AtomicBool,
    ticks: AtomicU64,
}

impl CoreDescriptor {
    const fn new() -> Self {
        Self {
            online: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        }
    }
}

static CORES: [CoreDescriptor; NUM_CORES] = [
    CoreDescriptor::new(),
    CoreDescriptor::new(),
    CoreDescriptor::new(),
    CoreDescriptor::new(),
];

/// Marks `core` online. Called once from that core's own secondary entry
/// (core 0 marks itself online before the rest of boot continues).
pub fn mark_online(core: u8) {
    CORES[core as usize].online.store(true, Ordering::Release);
}

/// Whether `core` has marked itself online.
pub fn is_online(core: u8) -> bool {
    CORES[core as usize].online.load(Ordering::Acquire)
}

/// Records one timer tick observed on `core`.
pub fn record_tick(core: u8) {
    CORES[core as usize].ticks.fetch_add(1, Ordering::Relaxed);
}

/// Number of ticks observed on `core` so far.
pub fn ticks(core: u8) -> u64 {
    CORES[core as usize].ticks.load(Ordering::Relaxed)
}

/// Number of cores currently marked online.
pub fn online_count() -> usize {
    (0..NUM_CORES as u8).filter(|&c| is_online(c)).count()
}

/// Prints a table of every core's online/tick status, for the `cores`
/// shell command.
pub fn print_cores() {
    crate::println!("CORE  ONLINE  TICKS");
    for core in 0..NUM_CORES as u8 {
        crate::println!("{:<5} {:<7} {}", core, is_online(core), ticks(core));
    }
}
