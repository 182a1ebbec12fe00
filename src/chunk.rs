use std::{mem, ptr};

use crate::align::ALIGNMENT;

/// Bytes of metadata in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Chunk>();

const _: () = assert!(HEADER_SIZE % ALIGNMENT == 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
  Free,
  Used,
}

/// Header placed right before a chunk's payload inside the arena.
///
/// `prev` and `next` are only meaningful while the chunk is [`State::Free`];
/// they are nulled before a chunk is handed out so no stale link sits next to
/// the caller's bytes.
#[repr(C)]
pub struct Chunk {
  pub size: usize,
  pub state: State,
  pub prev: *mut Chunk,
  pub next: *mut Chunk,
}

impl Chunk {
  pub fn new(
    size: usize,
    state: State,
  ) -> Self {
    Self {
      size,
      state,
      prev: ptr::null_mut(),
      next: ptr::null_mut(),
    }
  }

  /// Writes a fresh, unlinked free header at `at`.
  ///
  /// # Safety
  ///
  /// `at` must be aligned to [`ALIGNMENT`] and valid for `HEADER_SIZE + size`
  /// bytes that no live chunk claims.
  pub unsafe fn format(
    at: *mut u8,
    size: usize,
  ) -> *mut Chunk {
    debug_assert!(at as usize % ALIGNMENT == 0);
    debug_assert!(size % ALIGNMENT == 0);

    let chunk = at as *mut Chunk;
    unsafe { chunk.write(Chunk::new(size, State::Free)) };
    chunk
  }

  #[inline]
  pub fn addr(chunk: *const Chunk) -> usize {
    chunk as usize
  }

  /// First payload byte of `chunk`.
  #[inline]
  pub fn payload(chunk: *mut Chunk) -> *mut u8 {
    (chunk as *mut u8).wrapping_add(HEADER_SIZE)
  }

  /// Recovers the header sitting right before a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`Chunk::payload`].
  #[inline]
  pub unsafe fn from_payload(payload: *mut u8) -> *mut Chunk {
    unsafe { payload.sub(HEADER_SIZE) as *mut Chunk }
  }

  /// Address of the first byte past the payload.
  ///
  /// # Safety
  ///
  /// `chunk` must point to an initialized header.
  #[inline]
  pub unsafe fn end(chunk: *const Chunk) -> usize {
    Chunk::addr(chunk) + HEADER_SIZE + unsafe { (*chunk).size }
  }

  /// Whether `lower` ends exactly where `upper` starts.
  ///
  /// This is the only adjacency test in the crate: splitting places remainders
  /// at `end`, and coalescing merges chunks for which this holds.
  ///
  /// # Safety
  ///
  /// `lower` must point to an initialized header.
  #[inline]
  pub unsafe fn precedes(
    lower: *const Chunk,
    upper: *const Chunk,
  ) -> bool {
    unsafe { Chunk::end(lower) == Chunk::addr(upper) }
  }
}
