//! ## Standard estimator
//! Register-array HyperLogLog with `m = 2^b` registers of one byte each.
//!
//! Register value is the 1-indexed position of the first set bit among the
//! `64 - b` bits following the register index, or 0 when none of them is set.

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{size_of, size_of_val};

use tracing::trace;
use wyhash::WyHash;

use crate::error::EstimatorError;
use crate::estimator::{estimate, inverse_pow2, CardinalityEstimator};
use crate::hash::{checked_precision, rank, register_index, HASH_BITS, MAX_PRECISION};

/// HyperLogLog estimator with one byte-sized register per index.
/// Items of type `T` are hashed with `H`.
pub struct StandardEstimator<T: ?Sized, H = WyHash> {
    /// One register per index
    registers: Vec<u8>,
    /// Number of hash bits used for register indices
    precision: u8,
    /// Estimate cached by the last `compute_cardinality` call
    cardinality: u64,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
    _marker: PhantomData<T>,
}

impl<T: ?Sized, H> StandardEstimator<T, H> {
    /// Creates new instance of `StandardEstimator` with `2^precision` registers.
    /// Negative precision is clamped to 0.
    pub fn new(precision: i32) -> Result<Self, EstimatorError> {
        let precision = checked_precision(precision)?;
        Ok(Self {
            registers: vec![0; 1 << precision],
            precision,
            cardinality: 0,
            build_hasher: BuildHasherDefault::default(),
            _marker: PhantomData,
        })
    }

    /// Restore estimator from register state previously read through its accessors,
    /// validating register count and register values.
    pub fn from_parts(
        precision: u8,
        cardinality: u64,
        registers: Vec<u8>,
    ) -> Result<Self, EstimatorError> {
        if precision > MAX_PRECISION {
            return Err(EstimatorError::PrecisionOutOfRange {
                precision: i32::from(precision),
                max: MAX_PRECISION,
            });
        }
        let expected = 1 << precision;
        if registers.len() != expected {
            return Err(EstimatorError::RegisterCountMismatch {
                expected,
                actual: registers.len(),
            });
        }
        let max = HASH_BITS - u32::from(precision);
        if let Some((index, &value)) = registers
            .iter()
            .enumerate()
            .find(|&(_, &value)| u32::from(value) > max)
        {
            return Err(EstimatorError::InvalidRegister {
                index,
                value: u32::from(value),
                max,
            });
        }

        Ok(Self {
            registers,
            precision,
            cardinality,
            build_hasher: BuildHasherDefault::default(),
            _marker: PhantomData,
        })
    }

    /// Return value of `index` register
    #[inline]
    pub fn register(&self, index: usize) -> Option<u8> {
        self.registers.get(index).copied()
    }

    /// Return all registers
    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> StandardEstimator<T, H> {
    /// Insert a hashable item into `StandardEstimator`
    #[inline]
    pub fn add_elem(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.add_hash(hash);
    }
}

impl<T: ?Sized, H> CardinalityEstimator for StandardEstimator<T, H> {
    /// Insert hash into `StandardEstimator`
    #[inline]
    fn add_hash(&mut self, hash: u64) {
        let index = register_index(hash, self.precision);
        let value = rank(hash, self.precision);
        let register = &mut self.registers[index];
        *register = (*register).max(value);
    }

    fn compute_cardinality(&mut self) {
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| inverse_pow2(u32::from(r)))
            .sum();
        self.cardinality = estimate(self.registers.len(), sum);
        trace!(sum, cardinality = self.cardinality, "computed standard estimate");
    }

    #[inline]
    fn cardinality(&self) -> u64 {
        self.cardinality
    }

    #[inline]
    fn precision(&self) -> u8 {
        self.precision
    }

    #[inline]
    fn num_registers(&self) -> usize {
        self.registers.len()
    }

    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }
}

impl<T: ?Sized, H> Clone for StandardEstimator<T, H> {
    fn clone(&self) -> Self {
        Self {
            registers: self.registers.clone(),
            precision: self.precision,
            cardinality: self.cardinality,
            build_hasher: BuildHasherDefault::default(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, H> PartialEq for StandardEstimator<T, H> {
    /// Compare estimators by register state and cached estimate
    fn eq(&self, rhs: &Self) -> bool {
        self.precision == rhs.precision
            && self.cardinality == rhs.cardinality
            && self.registers == rhs.registers
    }
}

impl<T: ?Sized, H> Debug for StandardEstimator<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ {} }}", self.summary())
    }
}
