//! `split-hyperloglog` estimates the number of distinct elements in a stream or dataset
//! using HyperLogLog registers, as a statistics primitive for query planning.
//!
//! Two estimators are provided:
//! - [`StandardEstimator`] stores one byte per register.
//! - [`CompactEstimator`] stores a small dense field per register and spills rare large
//!   register values into a sparse overflow map.
//!
//! Both implement [`CardinalityEstimator`] and can be selected at run time through
//! [`EstimatorConfig`], which builds a [`Sketch`].
//!
//! ```
//! use split_hyperloglog::{CardinalityEstimator, CompactEstimator};
//!
//! let mut estimator = CompactEstimator::<str>::new(12).unwrap();
//! for i in 0..10_000 {
//!     estimator.add_elem(&format!("user-{}", i));
//! }
//! estimator.compute_cardinality();
//! assert!(estimator.cardinality() > 0);
//! ```
mod compact;
mod config;
mod error;
mod estimator;
pub mod hash;
#[cfg(feature = "with_serde")]
mod serde;
mod standard;

pub use compact::CompactEstimator;
pub use config::{EstimatorConfig, EstimatorKind, DEFAULT_PRECISION};
pub use error::EstimatorError;
pub use estimator::{CardinalityEstimator, Sketch, CONSTANT};
pub use standard::StandardEstimator;
