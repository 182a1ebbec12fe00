//! Heap growth.
//!
//! When no free chunk can serve a request, the heap asks its
//! [`AddressSpace`] for a fresh region and formats all of it as one free
//! chunk:
//!
//! ```text
//!   base (aligned up)                                      base + granted
//!   ┌────────────┬───────────────────────────────────────────────┐
//!   │   header   │          payload: granted - HEADER_SIZE       │
//!   └────────────┴───────────────────────────────────────────────┘
//! ```
//!
//! The new chunk goes through the regular reclamation path, so it lands at
//! its address-ordered spot and is merged with the previous tail only if the
//! provider really returned space that starts where the tail ends.

use std::ptr;

use log::{debug, warn};

use crate::{
  align,
  align::{ALIGNMENT, align_down},
  chunk::{Chunk, HEADER_SIZE},
  config::HeapConfig,
  error::{HeapError, Result},
  free_list::FreeList,
  source::AddressSpace,
};

/// Growth policy and bookkeeping for the arena.
pub struct Growth {
  config: HeapConfig,
  step: usize,
  granted: usize,
  count: usize,
}

impl Growth {
  pub const fn new(config: HeapConfig) -> Self {
    Self {
      config,
      step: config.page_size,
      granted: 0,
      count: 0,
    }
  }

  /// Bytes handed out by the provider so far.
  pub fn granted(&self) -> usize {
    self.granted
  }

  /// Successful growths so far.
  pub fn count(&self) -> usize {
    self.count
  }

  /// Payload bytes the next growth will ask for to serve `min_bytes`.
  pub fn round(
    &self,
    min_bytes: usize,
  ) -> Option<usize> {
    let page = self.config.page_size;
    let rounded = min_bytes.checked_add(page - 1)? & !(page - 1);

    Some(rounded.max(self.step))
  }

  /// Extends the arena by at least `min_bytes` of payload.
  ///
  /// Returns the free chunk that now covers the new region, possibly merged
  /// with a free chunk it touches. If the provider refuses the first request,
  /// the free list and the growth step are left untouched.
  ///
  /// A misaligned base costs up to [`ALIGNMENT`] bytes of payload. When that
  /// leaves the region too short, it is kept as an ordinary free chunk and the
  /// provider is asked once more with room to realign. Granted bytes are always
  /// counted, even when the second request fails.
  ///
  /// # Safety
  ///
  /// `list` must only link chunks inside space previously granted by `source`.
  pub unsafe fn grow<S: AddressSpace>(
    &mut self,
    list: &mut FreeList,
    source: &mut S,
    min_bytes: usize,
  ) -> Result<*mut Chunk> {
    let rounded = self.round(min_bytes).ok_or(HeapError::OutOfMemory)?;
    let request = rounded.checked_add(HEADER_SIZE).ok_or(HeapError::OutOfMemory)?;

    let mut chunk = unsafe { self.install(list, source, request, min_bytes) }?;
    if !Self::serves(chunk, min_bytes) {
      let request = request.checked_add(ALIGNMENT).ok_or(HeapError::OutOfMemory)?;
      chunk = unsafe { self.install(list, source, request, min_bytes) }?;
      if !Self::serves(chunk, min_bytes) {
        return Err(HeapError::OutOfMemory);
      }
    }

    self.count += 1;
    self.step = self
      .step
      .saturating_mul(self.config.growth_factor)
      .min(self.config.max_growth)
      .max(self.config.page_size);

    debug!(
      "grew arena to {} bytes (growth #{}, next step {} bytes, {} free chunks)",
      self.granted,
      self.count,
      self.step,
      list.len()
    );

    Ok(chunk)
  }

  fn serves(
    chunk: *mut Chunk,
    min_bytes: usize,
  ) -> bool {
    !chunk.is_null() && unsafe { (*chunk).size } >= min_bytes
  }

  /// Asks the provider for `request` bytes and links them as one free chunk.
  ///
  /// Returns null, with the bytes still counted as granted, when the region is
  /// too small to hold a chunk once aligned.
  unsafe fn install<S: AddressSpace>(
    &mut self,
    list: &mut FreeList,
    source: &mut S,
    request: usize,
    min_bytes: usize,
  ) -> Result<*mut Chunk> {
    let base = source.extend(request).inspect_err(|err| {
      warn!("growth by {request} bytes for a {min_bytes} byte request failed: {err}");
    })?;
    self.granted += request;

    let base_addr = base.as_ptr() as usize;
    let start = align!(base_addr);
    let end = align_down(base_addr + request, ALIGNMENT);
    if start != base_addr {
      warn!("provider returned misaligned base {base_addr:#x}, dropping {} bytes", start - base_addr);
    }
    if end < start + HEADER_SIZE + ALIGNMENT {
      return Ok(ptr::null_mut());
    }

    let chunk = unsafe {
      let chunk = Chunk::format(base.as_ptr().add(start - base_addr), end - start - HEADER_SIZE);
      list.reclaim(chunk)
    };

    Ok(chunk)
  }
}
