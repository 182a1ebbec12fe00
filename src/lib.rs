//! # rmalloc - A Free-List Memory Allocator
//!
//! This crate provides a thread-safe **first-fit heap** that keeps every free
//! chunk in one address-ordered, doubly linked list. Memory comes from an
//! [`AddressSpace`] provider, by default the program break grown with `sbrk`.
//!
//! ## Overview
//!
//! Every chunk carries a header right before the bytes handed to the caller.
//! Free chunks are linked by address, so two chunks that sit next to each
//! other in memory also sit next to each other in the list:
//!
//! ```text
//!   Arena:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌───┬──────┬───┬────────────┬───┬────┬───┬──────────────────────────┐ │
//!   │ │ H │ used │ H │    free    │ H │used│ H │           free           │ │
//!   │ └───┴──────┴───┴────────────┴───┴────┴───┴──────────────────────────┘ │
//!   │                ▲                         ▲                            │
//!   │                │                         │                            │
//!   │              head ────── next ─────────► tail                         │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── chunk      - Chunk header and adjacency arithmetic (internal)
//!   ├── config     - HeapConfig growth knobs
//!   ├── error      - HeapError
//!   ├── free_list  - Address-ordered free list (internal)
//!   ├── growth     - Heap growth (internal)
//!   ├── heap       - Heap, the locked front end
//!   └── source     - AddressSpace providers: Sbrk, StaticArena
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rmalloc::Heap;
//!
//! fn main() {
//!     let heap = Heap::new();
//!
//!     let ptr = heap.allocate(8).unwrap() as *mut u64;
//!
//!     unsafe {
//!         *ptr = 42;
//!         println!("Value: {}", *ptr);
//!
//!         heap.deallocate(ptr as *mut u8).unwrap();
//!     }
//! }
//! ```
//!
//! ## How It Works
//!
//! **Allocation** rounds the request up to 8 bytes, takes the first free chunk
//! that fits and halves it while the half still fits:
//!
//! ```text
//!   allocate(64) from a 1024 byte chunk:
//!
//!   ┌───┬──────────────────────────────────────────────────────────┐
//!   │ H │                         1024                             │
//!   └───┴──────────────────────────────────────────────────────────┘
//!   ┌───┬────┬───┬────┬───┬──────┬───┬──────────┬───┬──────────────┐
//!   │ H │ 64 │ H │ 32 │ H │  96  │ H │   224    │ H │     480      │
//!   └───┴────┴───┴────┴───┴──────┴───┴──────────┴───┴──────────────┘
//!     ▲        └──────────── free remainders ───────────────────┘
//!     └── returned
//! ```
//!
//! If nothing fits, the heap grows once by a multiple of the page size (128
//! KiB by default, growing geometrically) and retries.
//!
//! **Deallocation** puts the chunk back at its address-ordered spot and merges
//! it with whatever free chunks touch it on either side. Freeing a chunk that
//! is already free is reported as [`HeapError::DoubleFree`] and changes
//! nothing.
//!
//! ## Limitations
//!
//! - **One lock**: every call serializes on a single mutex
//! - **No shrinking**: memory is never given back to the provider
//! - **8 byte alignment**: stricter layouts are refused by the `GlobalAlloc`
//!   front end
//! - **Unix-only** for [`Sbrk`]: requires `libc` and `sbrk` (POSIX systems)
//!
//! ## Safety
//!
//! Deallocation trusts the header in front of the pointer. Pointers that did
//! not come from the same heap are undefined behavior and are not detected.

pub mod align;
mod chunk;
mod config;
mod error;
mod free_list;
mod growth;
mod heap;
mod source;

pub use chunk::HEADER_SIZE;
pub use config::{DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_GROWTH, DEFAULT_PAGE_SIZE, HeapConfig};
pub use error::{HeapError, Result};
pub use heap::{Heap, HeapStats};
pub use source::{AddressSpace, Sbrk, StaticArena};
