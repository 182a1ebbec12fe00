//! Address-ordered free list.
//!
//! Every free chunk of the arena is linked here exactly once, sorted by
//! address. Keeping the order lets reclamation find a chunk's physical
//! neighbours by looking only at its list neighbours:
//!
//! ```text
//!   head                                                         tail
//!    │                                                             │
//!    ▼                                                             ▼
//!   ┌────┬──────┐ ┌────┬─────────┐ ┌────┬──────┐      ┌────┬──────────┐
//!   │hdr │ free │ │hdr │  used   │ │hdr │ free │ .... │hdr │   free   │
//!   └────┴──────┘ └────┴─────────┘ └────┴──────┘      └────┴──────────┘
//!    │ next ▲                        ▲  │ next          ▲
//!    └──────┼────────────────────────┘  └───────────────┘
//!           └──── prev ─────────────────
//! ```
//!
//! Nothing here locks: the [`Heap`](crate::Heap) serializes every call.

use std::ptr;

use crate::{
  align::{ALIGNMENT, align_down},
  chunk::{Chunk, HEADER_SIZE, State},
};

pub struct FreeList {
  head: *mut Chunk,
  tail: *mut Chunk,
  len: usize,
}

impl FreeList {
  pub const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
      tail: ptr::null_mut(),
      len: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  #[cfg(test)]
  pub fn head(&self) -> *mut Chunk {
    self.head
  }

  #[cfg(test)]
  pub fn tail(&self) -> *mut Chunk {
    self.tail
  }

  pub fn iter(&self) -> Iter {
    Iter { current: self.head }
  }

  /// First chunk, in address order, whose payload holds `size` bytes.
  pub fn first_fit(
    &self,
    size: usize,
  ) -> *mut Chunk {
    self
      .iter()
      .find(|&chunk| unsafe { (*chunk).size } >= size)
      .unwrap_or(ptr::null_mut())
  }

  /// Carves a used chunk of at least `size` bytes out of the list.
  ///
  /// Returns null when no free chunk is large enough.
  ///
  /// # Safety
  ///
  /// `size` must be a non-zero multiple of [`ALIGNMENT`].
  pub unsafe fn take(
    &mut self,
    size: usize,
  ) -> *mut Chunk {
    let chunk = self.first_fit(size);
    if chunk.is_null() {
      return chunk;
    }

    unsafe {
      self.split(chunk, size);
      self.unlink(chunk);
      (*chunk).state = State::Used;
    }

    chunk
  }

  /// Halves `chunk` while the half still serves `size` and the other half can
  /// stand on its own as a chunk with a non-empty payload.
  ///
  /// Each cut leaves a free remainder right behind the shrinking chunk, both in
  /// memory and in the list. The chunk ends up with fewer than `2 * size`
  /// bytes, or at most `2 * HEADER_SIZE + ALIGNMENT` for tiny requests.
  ///
  /// # Safety
  ///
  /// `chunk` must be linked in this list.
  pub unsafe fn split(
    &mut self,
    chunk: *mut Chunk,
    size: usize,
  ) {
    unsafe {
      loop {
        let whole = (*chunk).size;
        let half = align_down(whole / 2, ALIGNMENT);
        if half < size || half <= HEADER_SIZE {
          break;
        }

        (*chunk).size = half;
        let remainder = Chunk::format(Chunk::payload(chunk).add(half), whole - half - HEADER_SIZE);
        self.link_after(chunk, remainder);
      }
    }
  }

  /// Links a free chunk at its address-ordered position and merges it with
  /// any physically adjacent free neighbours.
  ///
  /// Returns the chunk that ends up covering the reclaimed bytes, which is an
  /// earlier neighbour if a backward merge happened.
  ///
  /// # Safety
  ///
  /// `chunk` must be an initialized, unlinked header inside the arena that
  /// overlaps no chunk of this list.
  pub unsafe fn reclaim(
    &mut self,
    chunk: *mut Chunk,
  ) -> *mut Chunk {
    unsafe {
      self.insert(chunk);
      self.coalesce(chunk)
    }
  }

  /// # Safety
  ///
  /// Same as [`FreeList::reclaim`].
  pub unsafe fn insert(
    &mut self,
    chunk: *mut Chunk,
  ) {
    unsafe {
      (*chunk).state = State::Free;

      match self.iter().find(|&current| current > chunk) {
        Some(successor) => self.link_before(successor, chunk),
        None => self.push_back(chunk),
      }
    }
  }

  /// Merges `chunk` with every adjacent free chunk on both sides.
  ///
  /// Calling it again on the returned chunk is a no-op.
  ///
  /// # Safety
  ///
  /// `chunk` must be linked in this list.
  pub unsafe fn coalesce(
    &mut self,
    chunk: *mut Chunk,
  ) -> *mut Chunk {
    unsafe {
      let mut chunk = chunk;

      loop {
        let next = (*chunk).next;
        if next.is_null() || !Chunk::precedes(chunk, next) {
          break;
        }

        (*chunk).size += HEADER_SIZE + (*next).size;
        self.unlink(next);
      }

      loop {
        let prev = (*chunk).prev;
        if prev.is_null() || !Chunk::precedes(prev, chunk) {
          break;
        }

        (*prev).size += HEADER_SIZE + (*chunk).size;
        self.unlink(chunk);
        chunk = prev;
      }

      chunk
    }
  }

  /// # Safety
  ///
  /// `chunk` must be linked in this list.
  pub unsafe fn unlink(
    &mut self,
    chunk: *mut Chunk,
  ) {
    unsafe {
      let prev = (*chunk).prev;
      let next = (*chunk).next;

      if prev.is_null() {
        self.head = next;
      } else {
        (*prev).next = next;
      }

      if next.is_null() {
        self.tail = prev;
      } else {
        (*next).prev = prev;
      }

      (*chunk).prev = ptr::null_mut();
      (*chunk).next = ptr::null_mut();
      self.len -= 1;
    }
  }

  unsafe fn push_back(
    &mut self,
    chunk: *mut Chunk,
  ) {
    unsafe {
      (*chunk).prev = self.tail;
      (*chunk).next = ptr::null_mut();

      if self.tail.is_null() {
        self.head = chunk;
      } else {
        (*self.tail).next = chunk;
      }

      self.tail = chunk;
      self.len += 1;
    }
  }

  unsafe fn link_after(
    &mut self,
    at: *mut Chunk,
    chunk: *mut Chunk,
  ) {
    unsafe {
      let next = (*at).next;

      (*chunk).prev = at;
      (*chunk).next = next;
      (*at).next = chunk;

      if next.is_null() {
        self.tail = chunk;
      } else {
        (*next).prev = chunk;
      }

      self.len += 1;
    }
  }

  unsafe fn link_before(
    &mut self,
    at: *mut Chunk,
    chunk: *mut Chunk,
  ) {
    unsafe {
      let prev = (*at).prev;

      (*chunk).prev = prev;
      (*chunk).next = at;
      (*at).prev = chunk;

      if prev.is_null() {
        self.head = chunk;
      } else {
        (*prev).next = chunk;
      }

      self.len += 1;
    }
  }
}

/// Walks the list from head to tail.
pub struct Iter {
  current: *mut Chunk,
}

impl Iterator for Iter {
  type Item = *mut Chunk;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let chunk = self.current;
    self.current = unsafe { (*chunk).next };
    Some(chunk)
  }
}
