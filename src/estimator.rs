//! Shared estimator capability and runtime dispatch over estimator variants.
//!
//! Both estimators compute the same raw HyperLogLog estimate:
//!
//! `E = CONSTANT * m * (m / Σ 2^(-register[i]))`
//!
//! `CONSTANT` is applied uniformly regardless of `m`. Canonical HyperLogLog varies the
//! correction with `m` and switches to linear counting for small cardinalities, so this
//! estimate is only accurate for large `m` and cardinalities well above `m`.
//!
//! The register sum is bounded below by `m * 2^-64`, so the estimate is always finite
//! in practice; a non-finite estimate saturates to `u64::MAX`.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

use enum_dispatch::enum_dispatch;

use crate::compact::CompactEstimator;
use crate::standard::StandardEstimator;

/// Bias correction constant
pub const CONSTANT: f64 = 0.79402;

/// Estimator variants, dispatched through `CardinalityEstimator`
#[enum_dispatch]
pub enum Sketch<T: ?Sized, H> {
    Standard(StandardEstimator<T, H>),
    Compact(CompactEstimator<T, H>),
}

/// Estimator trait which must be implemented by all estimator variants.
#[enum_dispatch(Sketch<T, H>)]
pub trait CardinalityEstimator {
    /// Insert a precomputed 64-bit hash
    fn add_hash(&mut self, hash: u64);
    /// Recompute the estimate from current register state and cache it
    fn compute_cardinality(&mut self);
    /// Return the estimate cached by the last `compute_cardinality` call
    fn cardinality(&self) -> u64;
    /// Number of hash bits used for register indices
    fn precision(&self) -> u8;
    /// Number of registers, always `2^precision`
    fn num_registers(&self) -> usize;
    /// Memory size in bytes
    fn size_of(&self) -> usize;
    /// Human-readable summary of precision, register count, cached estimate and size
    fn summary(&self) -> String {
        format!(
            "precision: {}, registers: {}, estimate: {}, size: {}",
            self.precision(),
            self.num_registers(),
            self.cardinality(),
            self.size_of()
        )
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Sketch<T, H> {
    /// Insert a hashable item
    #[inline]
    pub fn add_elem(&mut self, item: &T) {
        match self {
            Sketch::Standard(e) => e.add_elem(item),
            Sketch::Compact(e) => e.add_elem(item),
        }
    }
}

impl<T: ?Sized, H> Debug for Sketch<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sketch::Standard(e) => write!(f, "Standard {:?}", e),
            Sketch::Compact(e) => write!(f, "Compact {:?}", e),
        }
    }
}

/// Return `2^(-value)`
#[inline]
pub(crate) fn inverse_pow2(value: u32) -> f64 {
    2f64.powi(-(value as i32))
}

/// Apply the estimate formula to `m` registers with harmonic sum `sum`
#[inline]
pub(crate) fn estimate(m: usize, sum: f64) -> u64 {
    let m = m as f64;
    let estimate = (CONSTANT * m * (m / sum)).floor();
    if estimate.is_finite() {
        estimate as u64
    } else {
        u64::MAX
    }
}
