//! Bitmap page allocator.
//!
//! Manages a fixed-size window of physical RAM ([`MANAGED_PAGES`] pages
//! starting at [`MANAGED_BASE`]) as 4 KiB pages, tracked one bit per page.
//! The sub-page object allocator in [`crate::kernel::heap`] is built on top
//! of this: large requests, and the heap window itself, come straight from
//! here.

use crate::architecture::config::{MANAGED_BASE, MANAGED_PAGES, PAGE_SIZE};
use crate::architecture::spinlock::SpinLock;
use crate::kernel::Mutex;

const BITMAP_BYTES: usize = MANAGED_PAGES.div_ceil(8);

struct PageAllocator {
    bitmap: [u8; BITMAP_BYTES],
    first_free_page: usize,
    used_pages: usize,
    enabled: bool,
}

impl PageAllocator {
    fn test(&self, page: usize) -> bool {
        if page >= MANAGED_PAGES {
            return true;
        }
        (self.bitmap[page / 8] >> (page % 8)) & 1 != 0
    }

    fn set(&mut self, page: usize) {
        if page < MANAGED_PAGES {
            self.bitmap[page / 8] |= 1 << (page % 8);
        }
    }

    fn clear(&mut self, page: usize) {
        if page < MANAGED_PAGES {
            self.bitmap[page / 8] &= !(1 << (page % 8));
        }
    }
}

static ALLOCATOR: SpinLock<PageAllocator> = SpinLock::new(PageAllocator {
    bitmap: [0; BITMAP_BYTES],
    first_free_page: MANAGED_BASE / PAGE_SIZE,
    used_pages: 0,
    enabled: false,
});

/// Verifies the managed region is writable, then marks the allocator live.
///
/// On read-back failure, prints a diagnostic and leaves the allocator
/// disabled; every subsequent [`alloc_n`] then fails closed.
pub fn init() {
    crate::call_once!();

    let probe_addr = MANAGED_BASE as *mut u8;
    let ok = unsafe {
        core::ptr::write_volatile(probe_addr, 0xAA);
        let observed = core::ptr::read_volatile(probe_addr);
        core::ptr::write_volatile(probe_addr, 0);
        observed == 0xAA
    };

    if !ok {
        crate::println!(
            "page allocator: read-back probe failed at 0x{:X}, leaving disabled",
            MANAGED_BASE
        );
        return;
    }

    ALLOCATOR.lock(|a| a.enabled = true);
}

/// Allocates `count` contiguous pages, returning the physical base address
/// of the run. Returns `None` if no such run exists, `count` is zero, or
/// the allocator is disabled.
pub fn alloc_n(count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }

    ALLOCATOR.lock(|a| {
        if !a.enabled {
            return None;
        }

        let mut i = 0;
        while i + count <= MANAGED_PAGES {
            let mut found = true;
            let mut j = 0;
            while j < count {
                if a.test(i + j) {
                    i = i + j + 1;
                    found = false;
                    break;
                }
                j += 1;
            }
            if found {
                for k in 0..count {
                    a.set(i + k);
                }
                a.used_pages += count;
                return Some((a.first_free_page + i) * PAGE_SIZE);
            }
        }
        None
    })
}

/// Allocates a single page. Shorthand for `alloc_n(1)`.
pub fn alloc() -> Option<usize> {
    alloc_n(1)
}

/// Releases `count` pages starting at `addr`. A page whose bit is already
/// clear is silently ignored (double-free is idempotent). Pages outside the
/// managed window are ignored outright: `test` treats out-of-range pages as
/// permanently "allocated" so `alloc_n`'s scan skips past them, but that
/// convention must not feed back into `used_pages` bookkeeping here.
pub fn free_n(addr: usize, count: usize) {
    let page = addr / PAGE_SIZE;
    ALLOCATOR.lock(|a| {
        if page < a.first_free_page {
            return;
        }
        let local = page - a.first_free_page;
        for i in 0..count {
            if local + i >= MANAGED_PAGES {
                continue;
            }
            if a.test(local + i) {
                a.clear(local + i);
                a.used_pages -= 1;
            }
        }
    });
}

/// Releases a single page. Shorthand for `free_n(addr, 1)`.
pub fn free(addr: usize) {
    free_n(addr, 1);
}

/// Total number of pages in the managed window.
pub fn total_pages() -> usize {
    MANAGED_PAGES
}

/// Number of pages currently allocated.
pub fn used_pages() -> usize {
    ALLOCATOR.lock(|a| a.used_pages)
}

/// Number of pages currently free.
pub fn free_pages() -> usize {
    MANAGED_PAGES - used_pages()
}
