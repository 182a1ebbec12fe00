use std::{
  alloc::{GlobalAlloc, Layout},
  process, ptr,
};

use log::{error, trace};
use parking_lot::{Mutex, const_mutex};

use crate::{
  align,
  align::ALIGNMENT,
  chunk::{Chunk, HEADER_SIZE, State},
  config::HeapConfig,
  error::{HeapError, Result},
  free_list::FreeList,
  growth::Growth,
  source::{AddressSpace, Sbrk, StaticArena},
};

/// Point-in-time view of the heap, taken under its lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  /// Bytes granted by the address-space provider, headers included.
  pub arena_bytes: usize,
  /// Payload bytes sitting in free chunks.
  pub free_bytes: usize,
  pub free_chunks: usize,
  pub largest_free: usize,
  pub growths: usize,
}

struct Inner<S> {
  free: FreeList,
  growth: Growth,
  source: S,
}

// Chunk pointers only ever reference memory owned through `source`.
unsafe impl<S: Send> Send for Inner<S> {}

impl<S: AddressSpace> Inner<S> {
  unsafe fn take(
    &mut self,
    size: usize,
  ) -> Result<*mut Chunk> {
    unsafe {
      let chunk = self.free.take(size);
      if !chunk.is_null() {
        return Ok(chunk);
      }

      self.growth.grow(&mut self.free, &mut self.source, size)?;

      let chunk = self.free.take(size);
      if chunk.is_null() {
        return Err(HeapError::OutOfMemory);
      }

      Ok(chunk)
    }
  }
}

/// A first-fit heap over an address-ordered free list.
///
/// Every call takes one lock for its whole duration, heap growth included, so
/// the heap can be shared between threads and even installed as the
/// `#[global_allocator]`:
///
/// ```rust,ignore
/// use rmalloc::{Heap, Sbrk};
///
/// #[global_allocator]
/// static HEAP: Heap<Sbrk> = Heap::new();
/// ```
///
/// The lock is not reentrant. When the heap serves as the global allocator,
/// the installed logger must not allocate while handling records emitted at
/// `debug` level or above, which are logged with the lock held.
pub struct Heap<S> {
  inner: Mutex<Inner<S>>,
}

impl Heap<Sbrk> {
  /// A heap on top of the program break with the default configuration.
  pub const fn new() -> Self {
    Self::with_config(Sbrk::new(), HeapConfig::new())
  }
}

impl Default for Heap<Sbrk> {
  fn default() -> Self {
    Self::new()
  }
}

impl Heap<StaticArena> {
  /// A heap over a private buffer with exactly `capacity` bytes of payload,
  /// formatted as one free chunk up front.
  ///
  /// The heap never grows past that buffer; requests it cannot fit fail with
  /// [`HeapError::OutOfMemory`].
  pub fn with_capacity(capacity: usize) -> Result<Self> {
    let capacity = capacity
      .max(ALIGNMENT)
      .checked_add(ALIGNMENT - 1)
      .ok_or(HeapError::OutOfMemory)?
      & !(ALIGNMENT - 1);
    let buffer = capacity.checked_add(HEADER_SIZE).ok_or(HeapError::OutOfMemory)?;
    let config = HeapConfig::new()
      .with_page_size(ALIGNMENT)
      .with_growth_factor(1)
      .with_max_growth(ALIGNMENT);

    let heap = Self::try_with_config(StaticArena::try_new(buffer)?, config)?;
    heap.reserve(capacity)?;

    Ok(heap)
  }
}

impl<S: AddressSpace> Heap<S> {
  /// # Panics
  ///
  /// Panics if `config` does not pass [`HeapConfig::validate`].
  pub const fn with_config(
    source: S,
    config: HeapConfig,
  ) -> Self {
    assert!(config.validate().is_ok(), "invalid heap configuration");

    Self {
      inner: const_mutex(Inner {
        free: FreeList::new(),
        growth: Growth::new(config),
        source,
      }),
    }
  }

  pub fn try_with_config(
    source: S,
    config: HeapConfig,
  ) -> Result<Self> {
    config.validate()?;

    Ok(Self::with_config(source, config))
  }

  /// Allocates `size` bytes aligned to [`ALIGNMENT`].
  ///
  /// The memory is uninitialized. A zero `size` yields a null pointer, which
  /// [`Heap::deallocate`] accepts. If no free chunk fits, the heap grows once
  /// and retries; a second miss is reported as [`HeapError::OutOfMemory`] with
  /// the heap left as it was.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<*mut u8> {
    if size == 0 {
      return Ok(ptr::null_mut());
    }
    if size > isize::MAX as usize - ALIGNMENT {
      return Err(HeapError::OutOfMemory);
    }

    let aligned = align!(size);
    let chunk = unsafe { self.inner.lock().take(aligned) }?;
    let address = Chunk::payload(chunk);

    trace!("allocate({size}) -> {address:?} ({} byte chunk)", unsafe { (*chunk).size });

    Ok(address)
  }

  /// Returns memory obtained from [`Heap::allocate`] to the heap.
  ///
  /// The chunk is put back in address order and merged with free neighbours.
  /// Handing back a chunk that is already free fails with
  /// [`HeapError::DoubleFree`] and leaves the heap untouched; the heap stays
  /// usable, but the caller has lost track of its memory and should treat
  /// this as fatal.
  ///
  /// # Safety
  ///
  /// `address` must be null or a pointer returned by `allocate` on this heap.
  /// Pointers from anywhere else are not detected.
  pub unsafe fn deallocate(
    &self,
    address: *mut u8,
  ) -> Result<()> {
    if address.is_null() {
      return Ok(());
    }

    let mut inner = self.inner.lock();

    unsafe {
      let chunk = Chunk::from_payload(address);

      if (*chunk).state == State::Free {
        drop(inner);
        error!("double free of {address:?}");
        return Err(HeapError::DoubleFree {
          addr: address as usize,
        });
      }

      inner.free.reclaim(chunk);
    }

    drop(inner);
    trace!("deallocate({address:?})");

    Ok(())
  }

  /// Grows the arena ahead of time so that at least `bytes` more can be
  /// served without calling the provider.
  pub fn reserve(
    &self,
    bytes: usize,
  ) -> Result<()> {
    if bytes > isize::MAX as usize - ALIGNMENT {
      return Err(HeapError::OutOfMemory);
    }

    let mut inner = self.inner.lock();
    let Inner { free, growth, source } = &mut *inner;

    unsafe { growth.grow(free, source, align!(bytes.max(1))) }?;

    Ok(())
  }

  pub fn stats(&self) -> HeapStats {
    let inner = self.inner.lock();

    let mut stats = HeapStats {
      arena_bytes: inner.growth.granted(),
      free_chunks: inner.free.len(),
      growths: inner.growth.count(),
      ..HeapStats::default()
    };

    for chunk in inner.free.iter() {
      let size = unsafe { (*chunk).size };
      stats.free_bytes += size;
      stats.largest_free = stats.largest_free.max(size);
    }

    stats
  }
}

unsafe impl<S: AddressSpace> GlobalAlloc for Heap<S> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }

    self.allocate(layout.size().max(1)).unwrap_or(ptr::null_mut())
  }

  unsafe fn dealloc(
    &self,
    address: *mut u8,
    _layout: Layout,
  ) {
    if let Err(err) = unsafe { self.deallocate(address) } {
      error!("aborting: {err}");
      process::abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{ptr::NonNull, sync::Arc, thread};

  use rand::{Rng, SeedableRng, rngs::StdRng};

  use super::*;
  use crate::align::align_down;

  const H: usize = HEADER_SIZE;

  type Grants = Arc<Mutex<Vec<(usize, usize)>>>;

  /// Remembers every region handed to the heap.
  struct Recording<S> {
    inner: S,
    grants: Grants,
  }

  impl<S: AddressSpace> AddressSpace for Recording<S> {
    fn extend(
      &mut self,
      by: usize,
    ) -> Result<NonNull<u8>> {
      let base = self.inner.extend(by)?;
      self.grants.lock().push((base.as_ptr() as usize, by));
      Ok(base)
    }
  }

  /// Leaves a hole in front of every grant.
  struct Scattered(StaticArena);

  impl AddressSpace for Scattered {
    fn extend(
      &mut self,
      by: usize,
    ) -> Result<NonNull<u8>> {
      self.0.extend(64)?;
      self.0.extend(by)
    }
  }

  /// Hands out regions whose base sits four bytes past an aligned address.
  struct Misaligned(StaticArena);

  impl AddressSpace for Misaligned {
    fn extend(
      &mut self,
      by: usize,
    ) -> Result<NonNull<u8>> {
      let base = self.0.extend(by + ALIGNMENT)?;
      Ok(unsafe { base.add(4) })
    }
  }

  /// Hands out one buffer from its end towards its start, so every new region
  /// sits right below the previous one.
  struct Descending {
    _arena: StaticArena,
    base: NonNull<u8>,
    top: usize,
  }

  impl Descending {
    fn new(capacity: usize) -> Self {
      let mut arena = StaticArena::new(capacity);
      let top = arena.capacity();
      let base = arena.extend(top).unwrap();

      Self {
        _arena: arena,
        base,
        top,
      }
    }
  }

  impl AddressSpace for Descending {
    fn extend(
      &mut self,
      by: usize,
    ) -> Result<NonNull<u8>> {
      let by = align!(by);
      if by > self.top {
        return Err(HeapError::OutOfMemory);
      }

      self.top -= by;
      Ok(unsafe { self.base.add(self.top) })
    }
  }

  fn recording<S: AddressSpace>(
    source: S,
    config: HeapConfig,
  ) -> (Heap<Recording<S>>, Grants) {
    let grants = Grants::default();
    let source = Recording {
      inner: source,
      grants: grants.clone(),
    };

    (Heap::with_config(source, config), grants)
  }

  fn small_pages() -> HeapConfig {
    HeapConfig::new().with_page_size(4096).with_max_growth(64 * 1024)
  }

  fn chunk_size(address: *mut u8) -> usize {
    unsafe { (*Chunk::from_payload(address)).size }
  }

  /// Walks every granted region header by header and checks it against the
  /// free list: chunks tile the regions exactly, and the free list holds the
  /// free ones, in address order, and nothing else.
  fn check_arena<S>(
    heap: &Heap<S>,
    grants: &Grants,
  ) {
    let mut spans: Vec<(usize, usize)> = grants
      .lock()
      .iter()
      .map(|&(base, len)| (align!(base), align_down(base + len, ALIGNMENT)))
      .collect();
    spans.sort();

    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in spans {
      match merged.last_mut() {
        Some(last) if last.1 == start => last.1 = end,
        _ => merged.push((start, end)),
      }
    }

    let inner = heap.inner.lock();
    let mut walked_free = Vec::new();

    for (start, end) in merged {
      let mut at = start;
      while at < end {
        let chunk = at as *mut Chunk;
        unsafe {
          match (*chunk).state {
            State::Free => walked_free.push(at),
            State::Used => {
              assert!((*chunk).prev.is_null());
              assert!((*chunk).next.is_null());
            },
          }
          at = Chunk::end(chunk);
        }
      }
      assert_eq!(at, end, "chunks overran their region");
    }

    let listed: Vec<usize> = inner.free.iter().map(|chunk| chunk as usize).collect();
    assert!(listed.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(listed, walked_free);
    assert_eq!(listed.len(), inner.free.len());
  }

  #[test]
  fn test_zero_sized_requests() {
    let heap = Heap::with_capacity(1024).unwrap();
    let before = heap.stats();

    let address = heap.allocate(0).unwrap();

    assert!(address.is_null());
    assert!(unsafe { heap.deallocate(address) }.is_ok());
    assert_eq!(heap.stats(), before);
  }

  #[test]
  fn test_first_allocation_splits_fresh_arena() {
    let heap = Heap::with_capacity(64 * 1024).unwrap();
    let before = heap.stats();

    let p1 = heap.allocate(64).unwrap();
    let after = heap.stats();

    assert!(!p1.is_null());
    assert_eq!(chunk_size(p1), 64);
    assert_eq!(before.free_chunks, 1);
    assert_eq!(before.free_bytes, 64 * 1024);
    assert_eq!(after.free_bytes + 64 + after.free_chunks * H, before.free_bytes);
    assert_eq!(after.growths, before.growths);
  }

  #[test]
  fn test_small_allocation_is_aligned() {
    let heap = Heap::with_capacity(64 * 1024).unwrap();

    let p1 = heap.allocate(64).unwrap();
    let p2 = heap.allocate(2).unwrap();

    assert_ne!(p1, p2);
    assert_eq!(p2 as usize % ALIGNMENT, 0);
    assert!(chunk_size(p2) >= 8);
    assert!(p2 as usize >= p1 as usize + 64 || p2 as usize + chunk_size(p2) <= p1 as usize);
  }

  #[test]
  fn test_freed_space_is_reused() {
    let heap = Heap::with_capacity(64 * 1024).unwrap();

    let p1 = heap.allocate(64).unwrap();
    let _p2 = heap.allocate(2).unwrap();
    let growths = heap.stats().growths;

    unsafe { heap.deallocate(p1) }.unwrap();
    let p3 = heap.allocate(64).unwrap();

    assert_eq!(p3, p1);
    assert_eq!(heap.stats().growths, growths);
  }

  #[test]
  fn test_free_between_free_neighbours_collapses_three_chunks() {
    let heap = Heap::with_capacity(4096).unwrap();

    // 4096 splits into 64 | 32 | 96 | 224 | 480 | 992 | 2016
    let a = heap.allocate(64).unwrap();
    let b = heap.allocate(32).unwrap();
    let c = heap.allocate(96).unwrap();
    let guard = heap.allocate(224).unwrap();

    unsafe {
      assert!(Chunk::precedes(Chunk::from_payload(a), Chunk::from_payload(b)));
      assert!(Chunk::precedes(Chunk::from_payload(b), Chunk::from_payload(c)));
      assert!(Chunk::precedes(Chunk::from_payload(c), Chunk::from_payload(guard)));

      heap.deallocate(a).unwrap();
      heap.deallocate(c).unwrap();
      let chunks = heap.stats().free_chunks;

      heap.deallocate(b).unwrap();

      assert_eq!(heap.stats().free_chunks, chunks - 1);
      assert_eq!((*Chunk::from_payload(a)).size, 64 + 32 + 96 + 2 * H);
      assert_eq!(heap.inner.lock().free.head(), Chunk::from_payload(a));
    }
  }

  #[test]
  fn test_round_trip_restores_free_bytes() {
    let heap = Heap::with_capacity(64 * 1024).unwrap();
    let before = heap.stats();

    let address = heap.allocate(100).unwrap();
    assert!(heap.stats().free_bytes < before.free_bytes);
    unsafe { heap.deallocate(address) }.unwrap();

    // The remainders of every split sit right behind the chunk, so the free
    // cascades back into the single chunk we started from.
    assert_eq!(heap.stats(), before);
  }

  #[test]
  fn test_fragmentation_bound() {
    let heap = Heap::with_capacity(1024 * 1024).unwrap();

    for request in [1, 8, 24, 72, 100, 500, 1000, 4000, 10_000, 100_000] {
      let address = heap.allocate(request).unwrap();
      let size = chunk_size(address);
      let aligned = align!(request);

      assert!(size >= aligned);
      assert!(size < 2 * aligned || size <= 2 * H + ALIGNMENT, "{request} -> {size}");
    }
  }

  #[test]
  fn test_exhaustion_grows_transparently() {
    let (heap, grants) = recording(StaticArena::new(1024 * 1024), small_pages());
    let mut addresses = Vec::new();

    for i in 0..64 {
      let address = heap.allocate(1000).unwrap();
      unsafe { address.write_bytes(i as u8, 1000) };
      addresses.push(address);
    }

    let stats = heap.stats();
    assert!(stats.growths > 1);
    assert_eq!(stats.arena_bytes, grants.lock().iter().map(|&(_, len)| len).sum::<usize>());
    check_arena(&heap, &grants);

    for (i, &address) in addresses.iter().enumerate() {
      unsafe {
        assert_eq!(*address, i as u8);
        assert_eq!(*address.add(999), i as u8);
      }
    }

    for address in addresses {
      unsafe { heap.deallocate(address) }.unwrap();
    }

    let stats = heap.stats();
    assert_eq!(stats.free_chunks, 1);
    assert_eq!(stats.free_bytes, stats.arena_bytes - H);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_large_request_grows_past_the_step() {
    let (heap, grants) = recording(StaticArena::new(1024 * 1024), small_pages());

    let address = heap.allocate(100_000).unwrap();

    assert!(chunk_size(address) >= 100_000);
    assert_eq!(heap.stats().growths, 1);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_scattered_regions_stay_separate() {
    let (heap, grants) = recording(Scattered(StaticArena::new(1024 * 1024)), small_pages());

    let first = heap.allocate(4000).unwrap();
    let second = heap.allocate(4000).unwrap();
    unsafe {
      heap.deallocate(first).unwrap();
      heap.deallocate(second).unwrap();
    }

    let stats = heap.stats();
    assert_eq!(stats.growths, 2);
    assert_eq!(stats.free_chunks, 2);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_misaligned_grant_still_serves_the_request() {
    let (heap, grants) = recording(Misaligned(StaticArena::new(64 * 1024)), small_pages());

    // the first grant loses 8 bytes to realignment, the second one fits
    let address = heap.allocate(4096).unwrap();

    assert!(!address.is_null());
    assert_eq!(address as usize % ALIGNMENT, 0);
    assert_eq!(chunk_size(address), 4096);

    let stats = heap.stats();
    assert_eq!(stats.growths, 1);
    assert_eq!(stats.arena_bytes, (4096 + H) + (4096 + H + ALIGNMENT));
    assert_eq!(stats.free_chunks, 1);
    assert_eq!(stats.free_bytes, 4096 - ALIGNMENT);
    check_arena(&heap, &grants);

    unsafe { heap.deallocate(address) }.unwrap();
    assert_eq!(heap.stats().free_chunks, 2);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_region_granted_below_merges_forward() {
    let (heap, grants) = recording(Descending::new(64 * 1024), small_pages());

    heap.reserve(1).unwrap();
    let upper = heap.inner.lock().free.head() as usize;
    heap.reserve(1).unwrap();

    let stats = heap.stats();
    let lower = heap.inner.lock().free.head() as usize;
    assert_eq!(stats.growths, 2);
    assert_eq!(stats.free_chunks, 1);
    assert_eq!(lower + 2 * 4096 + H, upper);
    assert_eq!(stats.free_bytes, 4096 + 2 * 4096 + H);
    assert_eq!(stats.arena_bytes, stats.free_bytes + H);
    check_arena(&heap, &grants);

    let big = heap.allocate(3 * 4096).unwrap();
    let small = heap.allocate(64).unwrap();
    assert_eq!(big as usize, lower + H);
    check_arena(&heap, &grants);

    unsafe {
      heap.deallocate(big).unwrap();
      heap.deallocate(small).unwrap();
    }
    assert_eq!(heap.stats().free_chunks, 1);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_huge_capacity_is_out_of_memory() {
    assert!(matches!(Heap::with_capacity(usize::MAX), Err(HeapError::OutOfMemory)));
    assert!(matches!(Heap::with_capacity(isize::MAX as usize), Err(HeapError::OutOfMemory)));
  }

  #[test]
  fn test_out_of_memory_leaves_heap_consistent() {
    let heap = Heap::with_capacity(1024).unwrap();
    let kept = heap.allocate(64).unwrap();
    let before = heap.stats();

    assert_eq!(heap.allocate(4096), Err(HeapError::OutOfMemory));
    assert_eq!(heap.allocate(usize::MAX), Err(HeapError::OutOfMemory));
    assert_eq!(heap.stats(), before);

    unsafe { heap.deallocate(kept) }.unwrap();
    assert_eq!(heap.stats().free_bytes, 1024);
  }

  #[test]
  fn test_double_free_is_reported_once() {
    let (heap, grants) = recording(StaticArena::new(1024 * 1024), small_pages());

    let address = heap.allocate(64).unwrap();
    let _other = heap.allocate(64).unwrap();

    assert!(unsafe { heap.deallocate(address) }.is_ok());
    let after_first = heap.stats();
    check_arena(&heap, &grants);

    assert_eq!(
      unsafe { heap.deallocate(address) },
      Err(HeapError::DoubleFree {
        addr: address as usize
      })
    );
    assert_eq!(heap.stats(), after_first);
    check_arena(&heap, &grants);
  }

  #[test]
  fn test_invalid_config_is_rejected() {
    let config = HeapConfig::new().with_growth_factor(0);

    assert!(matches!(
      Heap::try_with_config(StaticArena::new(4096), config),
      Err(HeapError::InvalidConfig(_))
    ));
  }

  #[test]
  fn test_global_alloc_front_end() {
    let heap = Heap::with_capacity(64 * 1024).unwrap();

    unsafe {
      let layout = Layout::new::<u64>();
      let address = heap.alloc(layout) as *mut u64;
      assert!(!address.is_null());
      *address = 42;
      assert_eq!(*address, 42);
      heap.dealloc(address as *mut u8, layout);

      let overaligned = Layout::from_size_align(64, 64).unwrap();
      assert!(heap.alloc(overaligned).is_null());

      let huge = Layout::from_size_align(1 << 20, 8).unwrap();
      assert!(heap.alloc(huge).is_null());
    }
  }

  #[test]
  fn test_randomized_alloc_free_simulation() {
    let (heap, grants) = recording(StaticArena::new(4 * 1024 * 1024), small_pages());
    let mut rng = StdRng::seed_from_u64(0x42);
    let mut live: Vec<(*mut u8, usize, u8)> = Vec::new();

    for round in 0..2000 {
      if live.is_empty() || rng.random_bool(0.6) {
        let size = rng.random_range(1..=2048);
        let tag = round as u8;
        let address = heap.allocate(size).unwrap();
        unsafe { address.write_bytes(tag, size) };
        live.push((address, size, tag));
      } else {
        let index = rng.random_range(0..live.len());
        let (address, size, tag) = live.swap_remove(index);
        unsafe {
          assert_eq!(*address, tag);
          assert_eq!(*address.add(size - 1), tag);
          heap.deallocate(address).unwrap();
        }
      }

      if round % 250 == 0 {
        check_arena(&heap, &grants);
      }
    }

    for (address, _, _) in live {
      unsafe { heap.deallocate(address) }.unwrap();
    }

    check_arena(&heap, &grants);
    assert_eq!(heap.stats().free_chunks, 1);
  }

  #[test]
  fn test_concurrent_alloc_free() {
    let (heap, grants) = recording(StaticArena::new(16 * 1024 * 1024), small_pages());
    let heap = Arc::new(heap);

    let workers: Vec<_> = (0..8u64)
      .map(|id| {
        let heap = Arc::clone(&heap);
        thread::spawn(move || {
          let mut rng = StdRng::seed_from_u64(id);
          let mut live = Vec::new();

          for _ in 0..1000 {
            if live.is_empty() || rng.random_bool(0.55) {
              let size = rng.random_range(1..=1024);
              let address = heap.allocate(size).unwrap();
              unsafe { address.write_bytes(id as u8, size) };
              live.push((address as usize, size));
            } else {
              let (address, size) = live.swap_remove(rng.random_range(0..live.len()));
              let address = address as *mut u8;
              unsafe {
                assert_eq!(*address, id as u8);
                assert_eq!(*address.add(size - 1), id as u8);
                heap.deallocate(address).unwrap();
              }
            }
          }

          for (address, _) in live {
            unsafe { heap.deallocate(address as *mut u8) }.unwrap();
          }
        })
      })
      .collect();

    for worker in workers {
      worker.join().unwrap();
    }

    check_arena(&*heap, &grants);
    let stats = heap.stats();
    assert_eq!(stats.free_chunks, 1);
    assert_eq!(stats.free_bytes, stats.arena_bytes - H);
  }

  #[test]
  #[ignore = "moves the process-wide program break; run with --ignored"]
  fn test_sbrk_heap() {
    let heap = Heap::new();

    unsafe {
      let first = heap.allocate(8).unwrap() as *mut u64;
      *first = 3u64;

      let size: usize = 6;
      let second = heap.allocate(size * 2).unwrap() as *mut u16;
      for i in 0..size {
        *(second.add(i)) = (i + 1) as u16;
      }

      assert_eq!(*first, 3);
      for i in 0..size {
        assert_eq!((i + 1) as u16, *(second.add(i)));
      }

      heap.deallocate(first as *mut u8).unwrap();
      let third = heap.allocate(4).unwrap() as *mut u32;
      assert_eq!(first as *mut u32, third);

      heap.deallocate(third as *mut u8).unwrap();
      heap.deallocate(second as *mut u8).unwrap();
    }

    let stats = heap.stats();
    assert_eq!(stats.growths, 1);
    assert_eq!(stats.arena_bytes, 128 * 1024 + H);
  }
}
