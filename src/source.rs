use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use libc::{c_void, intptr_t, sbrk};

use crate::{
  align,
  align::ALIGNMENT,
  error::{HeapError, Result},
};

/// Something that hands out raw address space to the heap.
///
/// Space that was granted must stay mapped and untouched by anyone else for as
/// long as the heap lives. Successive grants are allowed to be scattered: the
/// heap only merges two regions after checking that their addresses meet.
pub trait AddressSpace {
  /// Extends the address space by `by` bytes and returns the base of the new
  /// region.
  fn extend(
    &mut self,
    by: usize,
  ) -> Result<NonNull<u8>>;
}

/// Grows the program break with `sbrk(2)`.
///
/// The break is process-wide and shared with the C allocator, so regions
/// granted here are usually but not necessarily contiguous. `sbrk` itself is
/// not synchronized: nothing else in the process may move the break while an
/// `extend` call runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

impl Sbrk {
  pub const fn new() -> Self {
    Self
  }
}

fn sbrk_failed(address: *mut c_void) -> bool {
  address == usize::MAX as *mut c_void
}

impl AddressSpace for Sbrk {
  fn extend(
    &mut self,
    by: usize,
  ) -> Result<NonNull<u8>> {
    unsafe {
      let current = sbrk(0);
      if sbrk_failed(current) {
        return Err(HeapError::OutOfMemory);
      }

      // Pad a misaligned break so the caller sees an aligned base.
      let pad = align!(current as usize) - current as usize;
      let total = by.checked_add(pad).ok_or(HeapError::OutOfMemory)?;
      let increment = intptr_t::try_from(total).map_err(|_| HeapError::OutOfMemory)?;

      let address = sbrk(increment);
      if sbrk_failed(address) {
        return Err(HeapError::OutOfMemory);
      }

      NonNull::new((address as *mut u8).add(pad)).ok_or(HeapError::OutOfMemory)
    }
  }
}

/// Fixed-capacity arena carved out of one buffer, front to back.
///
/// Consecutive grants are contiguous as long as every request is a multiple of
/// [`ALIGNMENT`]. The buffer is released when the arena is dropped, so heaps
/// built on top of it must not outlive it.
#[derive(Debug)]
pub struct StaticArena {
  base: NonNull<u8>,
  layout: Layout,
  capacity: usize,
  used: usize,
}

// The arena exclusively owns its buffer.
unsafe impl Send for StaticArena {}

impl StaticArena {
  const BUFFER_ALIGN: usize = 16;

  /// Allocates a buffer of at least `capacity` bytes.
  ///
  /// # Panics
  ///
  /// Panics if `capacity` does not fit a layout; aborts through
  /// [`alloc::handle_alloc_error`] if the buffer cannot be allocated.
  pub fn new(capacity: usize) -> Self {
    match Self::try_new(capacity) {
      Ok(arena) => arena,
      Err(_) => match Self::layout_for(capacity) {
        Some(layout) => alloc::handle_alloc_error(layout),
        None => panic!("arena capacity {capacity} overflows a layout"),
      },
    }
  }

  /// Allocates a buffer of at least `capacity` bytes, reporting
  /// [`HeapError::OutOfMemory`] instead of panicking.
  pub fn try_new(capacity: usize) -> Result<Self> {
    let layout = Self::layout_for(capacity).ok_or(HeapError::OutOfMemory)?;

    let base = unsafe { alloc::alloc(layout) };
    let base = NonNull::new(base).ok_or(HeapError::OutOfMemory)?;

    Ok(Self {
      base,
      layout,
      capacity: layout.size(),
      used: 0,
    })
  }

  fn layout_for(capacity: usize) -> Option<Layout> {
    let capacity = capacity.max(ALIGNMENT).checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1);
    Layout::from_size_align(capacity, Self::BUFFER_ALIGN).ok()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn remaining(&self) -> usize {
    self.capacity - self.used
  }

  /// Whether `address` lies inside the buffer.
  pub fn contains(
    &self,
    address: usize,
  ) -> bool {
    let start = self.base.as_ptr() as usize;
    (start..start + self.capacity).contains(&address)
  }
}

impl AddressSpace for StaticArena {
  fn extend(
    &mut self,
    by: usize,
  ) -> Result<NonNull<u8>> {
    if by > self.remaining() {
      return Err(HeapError::OutOfMemory);
    }

    let base = unsafe { self.base.add(self.used) };
    self.used = (self.used + align!(by)).min(self.capacity);

    Ok(base)
  }
}

impl Drop for StaticArena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
  }
}
