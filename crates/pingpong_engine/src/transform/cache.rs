//! Lazily recomputed matrices

use crate::foundation::math::Mat4;

/// Whether a cached matrix reflects its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The stored matrix is current
    Clean,
    /// An input changed since the last computation
    Dirty,
}

/// A derived matrix that is only recomputed after its inputs change
///
/// Owners call [`invalidate`](Self::invalidate) from every setter and read
/// through [`get_or_compute`](Self::get_or_compute). Repeated reads without
/// an intervening change return the stored value without recomputing.
#[derive(Debug, Clone)]
pub struct CachedMatrix {
    value: Mat4,
    state: CacheState,
    recompute_count: u64,
}

impl Default for CachedMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl CachedMatrix {
    /// A dirty cache holding identity
    pub fn new() -> Self {
        Self {
            value: Mat4::identity(),
            state: CacheState::Dirty,
            recompute_count: 0,
        }
    }

    /// Mark the stored value stale
    pub fn invalidate(&mut self) {
        self.state = CacheState::Dirty;
    }

    /// Current cache state
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Return the stored matrix, recomputing it first if dirty
    pub fn get_or_compute(&mut self, compute: impl FnOnce() -> Mat4) -> Mat4 {
        if self.state == CacheState::Dirty {
            self.value = compute();
            self.state = CacheState::Clean;
            self.recompute_count += 1;
        }
        self.value
    }

    /// How many times the matrix has been computed
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }
}
