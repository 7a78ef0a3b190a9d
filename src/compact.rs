//! ## Compact estimator
//! Split HyperLogLog with `m = 2^b` registers, each register value stored as
//! a `D`-bit dense field plus an optional `O`-bit overflow field.
//!
//! Register value is the number of leading zeros among the `64 - b` bits following
//! the register index (`64 - b` when none of them is set).
//!
//! Most registers hold small values, so every register gets a dense field and only
//! registers with value `>= 2^D` get an entry in the sparse overflow map:
//!
//! `value = dense[i] | (overflow[i] << D)`
//!
//! Dense encoding:
//! - dense[0..]    - stores dense fields using `D` bits per register, packed into `u32` words.
//! - dense[last]   - one extra word for branchless two-word field updates.
//!
//! Overflow encoding:
//! - index -> high bits of the register value (`value >> D`), present iff `value >= 2^D`.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{size_of, size_of_val};

use tracing::trace;
use wyhash::WyHash;

use crate::error::EstimatorError;
use crate::estimator::{estimate, inverse_pow2, CardinalityEstimator};
use crate::hash::{checked_precision, leading_zeros, register_index, HASH_BITS, MAX_PRECISION};

/// HyperLogLog estimator splitting each register into a `D`-bit dense field
/// and an `O`-bit overflow field kept only for registers of value `>= 2^D`.
/// Items of type `T` are hashed with `H`.
pub struct CompactEstimator<T: ?Sized, H = WyHash, const D: usize = 4, const O: usize = 3> {
    /// Bit-packed dense fields
    dense: Vec<u32>,
    /// Sparse overflow fields
    overflow: HashMap<usize, u8>,
    /// Number of hash bits used for register indices
    precision: u8,
    /// Estimate cached by the last `compute_cardinality` call
    cardinality: u64,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
    _marker: PhantomData<T>,
}

impl<T: ?Sized, H, const D: usize, const O: usize> CompactEstimator<T, H, D, O> {
    /// Ensure that `D` and `O` fit in a byte and together hold a leading zeros count of up to 64
    const VALID_WIDTHS: () = assert!(D >= 1 && D <= 8 && O >= 1 && O <= 8 && (1 << (D + O)) > 64);
    /// Number of values representable by a dense field
    pub const DENSE_CAPACITY: u32 = 1 << D;
    /// Number of values representable by an overflow field
    pub const OVERFLOW_CAPACITY: u32 = 1 << O;

    /// Creates new instance of `CompactEstimator` with `2^precision` registers.
    /// Negative precision is clamped to 0.
    pub fn new(precision: i32) -> Result<Self, EstimatorError> {
        // compile time check of params
        _ = Self::VALID_WIDTHS;

        let precision = checked_precision(precision)?;
        Ok(Self {
            dense: vec![0; Self::dense_len(precision)],
            overflow: HashMap::new(),
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
        dense: Vec<u32>,
        overflow: HashMap<usize, u8>,
    ) -> Result<Self, EstimatorError> {
        _ = Self::VALID_WIDTHS;

        if precision > MAX_PRECISION {
            return Err(EstimatorError::PrecisionOutOfRange {
                precision: i32::from(precision),
                max: MAX_PRECISION,
            });
        }
        let expected = Self::dense_len(precision);
        if dense.len() != expected {
            return Err(EstimatorError::RegisterCountMismatch {
                expected,
                actual: dense.len(),
            });
        }

        let estimator = Self {
            dense,
            overflow,
            precision,
            cardinality,
            build_hasher: BuildHasherDefault::default(),
            _marker: PhantomData,
        };

        let m = estimator.num_registers();
        let max = HASH_BITS - u32::from(precision);
        for (&index, &value) in estimator.overflow.iter() {
            if index >= m || value == 0 || u32::from(value) >= Self::OVERFLOW_CAPACITY {
                return Err(EstimatorError::InvalidRegister {
                    index,
                    value: u32::from(value),
                    max: Self::OVERFLOW_CAPACITY - 1,
                });
            }
        }
        if let Some((index, value)) = (0..m)
            .map(|idx| (idx, estimator.register_value(idx)))
            .find(|&(_, value)| value > max)
        {
            return Err(EstimatorError::InvalidRegister { index, value, max });
        }

        Ok(estimator)
    }

    /// Number of `u32` words holding `2^precision` dense fields plus one extra word
    #[inline]
    fn dense_len(precision: u8) -> usize {
        ((1usize << precision) * D).div_ceil(32) + 1
    }

    /// Update `index` register with `leading_zeros` if it is greater than the current value.
    /// Rejects indices outside `0..num_registers()` and counts above `64 - precision`.
    pub fn update_bucket(
        &mut self,
        index: usize,
        leading_zeros: u8,
    ) -> Result<(), EstimatorError> {
        let registers = self.num_registers();
        if index >= registers {
            return Err(EstimatorError::IndexOutOfRange { index, registers });
        }
        let max = HASH_BITS - u32::from(self.precision);
        if u32::from(leading_zeros) > max {
            return Err(EstimatorError::InvalidRegister {
                index,
                value: u32::from(leading_zeros),
                max,
            });
        }
        self.update_register(index, u32::from(leading_zeros));
        Ok(())
    }

    /// Raise `index` register to `value`, both already known to be in range
    #[inline]
    fn update_register(&mut self, index: usize, value: u32) {
        if value <= self.register_value(index) {
            return;
        }
        self.set_dense(index, value & (Self::DENSE_CAPACITY - 1));
        if value >= Self::DENSE_CAPACITY {
            let spill = (value >> D) as u8;
            trace!(index, value, spill, "spilling register into overflow bucket");
            self.overflow.insert(index, spill);
        }
    }

    /// Return reconstructed value of `index` register
    #[inline]
    pub fn register(&self, index: usize) -> Option<u32> {
        (index < self.num_registers()).then(|| self.register_value(index))
    }

    /// Return dense field of `index` register
    #[inline]
    pub fn dense_bucket(&self, index: usize) -> Option<u8> {
        (index < self.num_registers()).then(|| self.get_dense(index) as u8)
    }

    /// Return overflow field of `index` register, if the register has spilled
    #[inline]
    pub fn overflow_bucket(&self, index: usize) -> Option<u8> {
        self.overflow.get(&index).copied()
    }

    /// Return number of registers with an overflow field
    #[inline]
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Iterate over `(index, overflow)` pairs in no particular order
    #[inline]
    pub fn overflow_iter(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.overflow.iter().map(|(&index, &value)| (index, value))
    }

    /// Return packed dense words
    #[inline]
    pub fn dense_words(&self) -> &[u32] {
        &self.dense
    }

    #[inline]
    fn register_value(&self, index: usize) -> u32 {
        let high = self.overflow.get(&index).map_or(0, |&v| u32::from(v));
        self.get_dense(index) + (high << D)
    }

    /// Get dense field of `idx` register
    #[inline]
    fn get_dense(&self, idx: usize) -> u32 {
        let bit_idx = idx * D;
        let u32_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let bits = &self.dense[u32_idx..u32_idx + 2];
        let bits_1 = D.min(32 - bit_pos);
        let bits_2 = D - bits_1;
        let mask_1 = (1 << bits_1) - 1;
        let mask_2 = (1 << bits_2) - 1;

        ((bits[0] >> bit_pos) & mask_1) | ((bits[1] & mask_2) << bits_1)
    }

    /// Set dense field of `idx` register to `value`
    #[inline]
    fn set_dense(&mut self, idx: usize, value: u32) {
        let bit_idx = idx * D;
        let u32_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let bits = &mut self.dense[u32_idx..u32_idx + 2];
        let bits_1 = D.min(32 - bit_pos);
        let bits_2 = D - bits_1;
        let mask_1: u32 = (1 << bits_1) - 1;
        let mask_2: u32 = (1 << bits_2) - 1;

        // Unconditionally update two `u32` elements based on `value` bits and masks
        bits[0] &= !(mask_1 << bit_pos);
        bits[0] |= (value & mask_1) << bit_pos;
        bits[1] &= !mask_2;
        bits[1] |= (value >> bits_1) & mask_2;
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default, const D: usize, const O: usize>
    CompactEstimator<T, H, D, O>
{
    /// Insert a hashable item into `CompactEstimator`
    #[inline]
    pub fn add_elem(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.add_hash(hash);
    }
}

impl<T: ?Sized, H, const D: usize, const O: usize> CardinalityEstimator
    for CompactEstimator<T, H, D, O>
{
    /// Insert hash into `CompactEstimator`
    #[inline]
    fn add_hash(&mut self, hash: u64) {
        let index = register_index(hash, self.precision);
        let leading_zeros = leading_zeros(hash, self.precision);
        self.update_register(index, u32::from(leading_zeros));
    }

    fn compute_cardinality(&mut self) {
        let m = self.num_registers();
        let sum: f64 = (0..m)
            .map(|idx| inverse_pow2(self.register_value(idx)))
            .sum();
        self.cardinality = estimate(m, sum);
        trace!(
            sum,
            overflow = self.overflow.len(),
            cardinality = self.cardinality,
            "computed compact estimate"
        );
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
        1 << self.precision
    }

    /// Return memory size of `CompactEstimator`, counting allocated overflow slots
    fn size_of(&self) -> usize {
        size_of::<Self>()
            + size_of_val(self.dense.as_slice())
            + self.overflow.capacity() * size_of::<(usize, u8)>()
    }
}

impl<T: ?Sized, H, const D: usize, const O: usize> Clone for CompactEstimator<T, H, D, O> {
    fn clone(&self) -> Self {
        Self {
            dense: self.dense.clone(),
            overflow: self.overflow.clone(),
            precision: self.precision,
            cardinality: self.cardinality,
            build_hasher: BuildHasherDefault::default(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, H, const D: usize, const O: usize> PartialEq for CompactEstimator<T, H, D, O> {
    /// Compare estimators by register state and cached estimate
    fn eq(&self, rhs: &Self) -> bool {
        self.precision == rhs.precision
            && self.cardinality == rhs.cardinality
            && self.dense == rhs.dense
            && self.overflow == rhs.overflow
    }
}

impl<T: ?Sized, H, const D: usize, const O: usize> Debug for CompactEstimator<T, H, D, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ {}, overflow: {} }}",
            self.summary(),
            self.overflow.len()
        )
    }
}
