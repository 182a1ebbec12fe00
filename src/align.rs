/// Alignment of every chunk header and payload handed out by the heap.
///
/// Eight bytes is enough for pointers and every primitive up to `u64`.
pub const ALIGNMENT: usize = 8;

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rmalloc::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Rounds `value` up to the heap [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use rmalloc::align;
///
/// assert_eq!(align!(1), 8);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(64), 64);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}

/// Rounds `value` down to a multiple of `align`.
#[inline]
pub const fn align_down(
  value: usize,
  align: usize,
) -> usize {
  debug_assert!(align.is_power_of_two());
  value & !(align - 1)
}
