//! Runtime selection of estimator variant and precision.

use std::hash::Hasher;

use tracing::debug;
use wyhash::WyHash;

use crate::compact::CompactEstimator;
use crate::error::EstimatorError;
use crate::estimator::Sketch;
use crate::standard::StandardEstimator;

/// Default number of hash bits used for register indices
pub const DEFAULT_PRECISION: i32 = 12;

/// Estimator variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with_serde", serde(rename_all = "snake_case"))]
pub enum EstimatorKind {
    /// One byte per register
    Standard,
    /// Dense fields with sparse overflow
    #[default]
    Compact,
}

/// Estimator configuration.
///
/// Precision is kept signed as given by the caller, negative values are clamped to 0
/// when the estimator is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with_serde", serde(default))]
pub struct EstimatorConfig {
    pub kind: EstimatorKind,
    pub precision: i32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            kind: EstimatorKind::default(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl EstimatorConfig {
    pub fn with_kind(mut self, kind: EstimatorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// Build estimator hashing items with `WyHash`
    pub fn build<T: ?Sized>(&self) -> Result<Sketch<T, WyHash>, EstimatorError> {
        self.build_with_hasher::<T, WyHash>()
    }

    /// Build estimator hashing items with `H`
    pub fn build_with_hasher<T: ?Sized, H: Hasher + Default>(
        &self,
    ) -> Result<Sketch<T, H>, EstimatorError> {
        debug!(kind = ?self.kind, precision = self.precision, "building estimator");
        Ok(match self.kind {
            EstimatorKind::Standard => Sketch::Standard(StandardEstimator::new(self.precision)?),
            EstimatorKind::Compact => Sketch::Compact(CompactEstimator::new(self.precision)?),
        })
    }
}
