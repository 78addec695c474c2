//! Sub-page object allocator: bump allocation and a free-list over a
//! page-backed heap window, falling back to page-granular allocation for
//! anything larger than half a page.
//!
//! Two allocators in one, deliberately: a fast bump/free-list path for
//! small, short-lived allocations, and direct page backing for anything
//! that would fragment it. Freed blocks are never coalesced — they keep
//! their original size and go back on the free-list as-is.

use crate::architecture::config::{HEAP_PAGES, PAGE_SIZE};
use crate::architecture::spinlock::SpinLock;
use crate::kernel::{page, Mutex};
use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;

/// Sentinel confirming a pointer passed to `free`/`dealloc` still has an
/// intact header.
const BLOCK_MAGIC: u32 = 0xDEAD_BEEF;

#[repr(C)]
struct BlockHeader {
    size: usize,
    magic: u32,
    /// Zero for a bump/free-list block; otherwise the number of pages this
    /// block is backed by, to hand back to the page allocator on free.
    page_count: usize,
    next: Option<NonNull<BlockHeader>>,
}

const HEADER_SIZE: usize = core::mem::size_of::<BlockHeader>();

struct HeapState {
    window_start: usize,
    window_end: usize,
    brk: usize,
    free_list: Option<NonNull<BlockHeader>>,
    initialized: bool,
}

unsafe impl Send for HeapState {}

static HEAP: SpinLock<HeapState> = SpinLock::new(HeapState {
    window_start: 0,
    window_end: 0,
    brk: 0,
    free_list: None,
    initialized: false,
});

/// Reserves [`HEAP_PAGES`] pages from the page allocator as the bump/
/// free-list window.
///
/// # Safety
/// Must run exactly once, after [`page::init`] and before any `alloc`.
pub fn init() {
    crate::call_once!();

    let base = page::alloc_n(HEAP_PAGES).expect("failed to reserve the kernel heap window");

    HEAP.lock(|heap| {
        heap.window_start = base;
        heap.window_end = base + HEAP_PAGES * PAGE_SIZE;
        heap.brk = base;
        heap.initialized = true;
    });
}

fn round_up_16(size: usize) -> usize {
    (size + 15) & !15
}

fn pages_for(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Allocates at least `size` bytes, 16-byte aligned. Returns null on
/// exhaustion.
pub fn alloc(size: usize) -> *mut u8 {
    if size == 0 {
        return core::ptr::null_mut();
    }

    let size = round_up_16(size);
    let total = size + HEADER_SIZE;

    if size > PAGE_SIZE / 2 {
        return alloc_page_backed(size, total);
    }

    HEAP.lock(|heap| {
        let mut cursor = heap.free_list;
        let mut prev: Option<NonNull<BlockHeader>> = None;
        while let Some(mut block) = cursor {
            let block_ref = unsafe { block.as_mut() };
            if block_ref.size >= size {
                match prev {
                    Some(mut p) => unsafe { p.as_mut().next = block_ref.next },
                    None => heap.free_list = block_ref.next,
                }
                block_ref.next = None;
                block_ref.magic = BLOCK_MAGIC;
                return unsafe { block.as_ptr().cast::<u8>().add(HEADER_SIZE) };
            }
            prev = cursor;
            cursor = block_ref.next;
        }

        if heap.brk + total > heap.window_end {
            return core::ptr::null_mut();
        }

        let header = heap.brk as *mut BlockHeader;
        heap.brk += total;
        unsafe {
            header.write(BlockHeader {
                size,
                magic: BLOCK_MAGIC,
                page_count: 0,
                next: None,
            });
            header.cast::<u8>().add(HEADER_SIZE)
        }
    })
}

fn alloc_page_backed(size: usize, total: usize) -> *mut u8 {
    let Some(base) = page::alloc_n(pages_for(total)) else {
        return core::ptr::null_mut();
    };
    let header = base as *mut BlockHeader;
    unsafe {
        header.write(BlockHeader {
            size,
            magic: BLOCK_MAGIC,
            page_count: pages_for(total),
            next: None,
        });
        header.cast::<u8>().add(HEADER_SIZE)
    }
}

/// Returns `ptr`'s backing allocation. Emits a diagnostic and leaves the
/// block untouched if the header's magic is corrupted.
///
/// # Safety
/// `ptr` must be a pointer previously returned by [`alloc`], not already
/// freed.
pub unsafe fn free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }

    let header = unsafe { ptr.sub(HEADER_SIZE) }.cast::<BlockHeader>();
    let header_ref = unsafe { &mut *header };

    if header_ref.magic != BLOCK_MAGIC {
        crate::println!("heap: free() on a block with a corrupted header, ignoring");
        return;
    }
    header_ref.magic = 0;

    if header_ref.page_count > 0 {
        page::free_n(header as usize, header_ref.page_count);
        return;
    }

    HEAP.lock(|heap| {
        header_ref.next = heap.free_list;
        heap.free_list = NonNull::new(header);
    });
}

/// Snapshot of heap occupancy, for the `mem` shell command.
pub struct Stats {
    pub window_pages: usize,
    pub bump_used: usize,
    pub bump_capacity: usize,
}

/// Returns a snapshot of the bump/free-list window's occupancy.
pub fn stats() -> Stats {
    HEAP.lock(|heap| Stats {
        window_pages: HEAP_PAGES,
        bump_used: heap.brk.saturating_sub(heap.window_start),
        bump_capacity: heap.window_end.saturating_sub(heap.window_start),
    })
}

/// The `#[global_allocator]`, routing `alloc`/`dealloc` through this
/// module so `alloc::vec::Vec`, `Box`, and friends work anywhere in the
/// kernel.
struct KernelAllocator;

unsafe impl GlobalAlloc for KernelAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // The allocator's own 16-byte alignment already satisfies any
        // request this kernel makes; a stricter request is a bug upstream.
        assert!(
            layout.align() <= 16,
            "kernel allocator cannot satisfy alignment > 16"
        );
        alloc(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        unsafe { free(ptr) }
    }
}

#[global_allocator]
static ALLOCATOR: KernelAllocator = KernelAllocator;
