//! Hash layout shared by both estimators.
//!
//! A 64-bit hash with precision `b` is split into:
//! - bits 63..(64 - b)  - register index (top `b` bits, `0` when `b == 0`)
//! - bits (63 - b)..0   - remaining bits, whose leading zeros drive register values
//!
//! Leading zeros are counted within the `64 - b` bits width of the remaining bits,
//! so a hash whose remaining bits are all zero has `64 - b` leading zeros.

use tracing::debug;

use crate::error::EstimatorError;

/// Width of a hash value in bits
pub const HASH_BITS: u32 = 64;
/// Maximum supported precision, which gives `2^18` registers
pub const MAX_PRECISION: u8 = 18;

/// Validate precision passed at construction.
/// Negative values are clamped to 0, values above `MAX_PRECISION` are rejected.
pub(crate) fn checked_precision(precision: i32) -> Result<u8, EstimatorError> {
    if precision < 0 {
        debug!(precision, "clamping negative precision to 0");
        return Ok(0);
    }
    u8::try_from(precision)
        .ok()
        .filter(|&p| p <= MAX_PRECISION)
        .ok_or(EstimatorError::PrecisionOutOfRange {
            precision,
            max: MAX_PRECISION,
        })
}

/// Return register index stored in the top `precision` bits of `hash`
#[inline]
pub fn register_index(hash: u64, precision: u8) -> usize {
    if precision == 0 {
        return 0;
    }
    (hash >> (HASH_BITS - u32::from(precision))) as usize
}

/// Return the low `64 - precision` bits of `hash`
#[inline]
pub fn remaining_bits(hash: u64, precision: u8) -> u64 {
    if precision == 0 {
        return hash;
    }
    hash & ((1 << (HASH_BITS - u32::from(precision))) - 1)
}

/// Return number of leading zeros of the remaining bits within their `64 - precision` width
#[inline]
pub fn leading_zeros(hash: u64, precision: u8) -> u8 {
    (remaining_bits(hash, precision).leading_zeros() - u32::from(precision)) as u8
}

/// Return 1-indexed position of the first set bit among the remaining bits, or 0 if none is set
#[inline]
pub fn rank(hash: u64, precision: u8) -> u8 {
    if remaining_bits(hash, precision) == 0 {
        return 0;
    }
    leading_zeros(hash, precision) + 1
}
