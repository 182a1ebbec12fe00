use thiserror::Error;

/// Errors surfaced by the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  /// The address-space provider could not grant more memory.
  #[error("out of memory")]
  OutOfMemory,
  /// A chunk that is already free was handed back.
  ///
  /// The free list is left exactly as it was. Callers that cannot report this
  /// upward should abort, since someone still holds a pointer into memory the
  /// heap considers reusable.
  #[error("double free of pointer {addr:#x}")]
  DoubleFree { addr: usize },
  /// A [`HeapConfig`](crate::HeapConfig) failed validation.
  #[error("invalid heap configuration: {0}")]
  InvalidConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, HeapError>;
