use crate::{
  align::ALIGNMENT,
  error::{HeapError, Result},
};

/// Granularity of heap growth: 128 KiB.
pub const DEFAULT_PAGE_SIZE: usize = 128 * 1024;
pub const DEFAULT_GROWTH_FACTOR: usize = 2;
/// Upper bound on a single growth step: 64 MiB.
pub const DEFAULT_MAX_GROWTH: usize = 64 * 1024 * 1024;

/// Tuning knobs for heap growth.
///
/// Every growth asks the provider for at least the current growth step, which
/// starts at `page_size` and is multiplied by `growth_factor` after each
/// successful growth until it reaches `max_growth`. Requests larger than the
/// step are rounded up to a multiple of `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  pub page_size: usize,
  pub growth_factor: usize,
  pub max_growth: usize,
}

impl HeapConfig {
  pub const fn new() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      growth_factor: DEFAULT_GROWTH_FACTOR,
      max_growth: DEFAULT_MAX_GROWTH,
    }
  }

  pub const fn with_page_size(
    mut self,
    page_size: usize,
  ) -> Self {
    self.page_size = page_size;
    self
  }

  pub const fn with_growth_factor(
    mut self,
    growth_factor: usize,
  ) -> Self {
    self.growth_factor = growth_factor;
    self
  }

  pub const fn with_max_growth(
    mut self,
    max_growth: usize,
  ) -> Self {
    self.max_growth = max_growth;
    self
  }

  /// Checks the invariants growth relies on.
  pub const fn validate(&self) -> Result<()> {
    if !self.page_size.is_power_of_two() {
      return Err(HeapError::InvalidConfig("page size must be a power of two"));
    }
    if self.page_size < ALIGNMENT {
      return Err(HeapError::InvalidConfig("page size must be at least the heap alignment"));
    }
    if self.growth_factor == 0 {
      return Err(HeapError::InvalidConfig("growth factor must be at least 1"));
    }
    if self.max_growth < self.page_size {
      return Err(HeapError::InvalidConfig("max growth must be at least one page"));
    }

    Ok(())
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new()
  }
}
