//! # Serde module for estimators
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `StandardEstimator` and `CompactEstimator`, using custom serialization and
//! deserialization so that only register state is stored.
//!
//! During serialization, estimators are converted into tuples:
//! - `StandardEstimator`: `(precision, cardinality, registers)`
//! - `CompactEstimator`: `(precision, cardinality, dense_words, overflow)`, where `overflow`
//!   is a list of `(index, value)` pairs sorted by index.
//!
//! During deserialization, the tuple is validated (register count, register and overflow
//! ranges) before the estimator is reconstructed, so malformed input yields an error
//! instead of an estimator with broken invariants.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::collections::HashMap;

use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::compact::CompactEstimator;
use crate::estimator::CardinalityEstimator;
use crate::standard::StandardEstimator;

impl<T: ?Sized, H> Serialize for StandardEstimator<T, H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(&self.cardinality())?;
        tup.serialize_element(self.registers())?;
        tup.end()
    }
}

impl<'de, T: ?Sized, H> Deserialize<'de> for StandardEstimator<T, H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (precision, cardinality, registers): (u8, u64, Vec<u8>) =
            Deserialize::deserialize(deserializer)?;
        StandardEstimator::from_parts(precision, cardinality, registers).map_err(Error::custom)
    }
}

impl<T: ?Sized, H, const D: usize, const O: usize> Serialize for CompactEstimator<T, H, D, O> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Sort overflow entries so that equal estimators serialize identically.
        let mut overflow: Vec<(usize, u8)> = self.overflow_iter().collect();
        overflow.sort_unstable();

        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(&self.cardinality())?;
        tup.serialize_element(self.dense_words())?;
        tup.serialize_element(&overflow)?;
        tup.end()
    }
}

impl<'de, T: ?Sized, H, const D: usize, const O: usize> Deserialize<'de>
    for CompactEstimator<T, H, D, O>
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        let (precision, cardinality, dense, overflow): (u8, u64, Vec<u32>, Vec<(usize, u8)>) =
            Deserialize::deserialize(deserializer)?;
        let len = overflow.len();
        let overflow: HashMap<usize, u8> = overflow.into_iter().collect();
        if overflow.len() != len {
            return Err(Error::custom("duplicate overflow index"));
        }
        CompactEstimator::from_parts(precision, cardinality, dense, overflow).map_err(Error::custom)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0; "empty set")]
    #[test_case(1; "single element")]
    #[test_case(2; "two distinct elements")]
    #[test_case(100; "hundred distinct elements")]
    #[test_case(10000; "ten thousand distinct elements")]
    fn test_serde_standard(n: usize) {
        let mut estimator = StandardEstimator::<str>::new(8).unwrap();
        for i in 0..n {
            estimator.add_elem(&format!("item{}", i));
        }
        estimator.compute_cardinality();

        let serialized = serde_json::to_string(&estimator).expect("serialization failed");
        let deserialized: StandardEstimator<str> =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(estimator, deserialized);
    }

    #[test_case(0; "empty set")]
    #[test_case(1; "single element")]
    #[test_case(2; "two distinct elements")]
    #[test_case(100; "hundred distinct elements")]
    #[test_case(10000; "ten thousand distinct elements")]
    fn test_serde_compact(n: usize) {
        let mut estimator = CompactEstimator::<str>::new(8).unwrap();
        for i in 0..n {
            estimator.add_elem(&format!("item{}", i));
        }
        // Force some registers to spill into overflow.
        estimator.update_bucket(0, 40).unwrap();
        estimator.update_bucket(7, 17).unwrap();
        estimator.compute_cardinality();

        let serialized = serde_json::to_string(&estimator).expect("serialization failed");
        let deserialized: CompactEstimator<str> =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(estimator, deserialized);
        assert_eq!(deserialized.register(0), Some(40));
        assert!(deserialized.overflow_len() >= 2);
    }

    #[test]
    fn test_serialized_compact_layout() {
        let mut e = CompactEstimator::<str>::new(0).unwrap();
        e.update_bucket(0, 16).unwrap();
        assert_eq!(serde_json::to_string(&e).unwrap(), "[0,0,[0,0],[[0,1]]]");
    }

    #[test_case(0)]
    #[test_case(4)]
    #[test_case(18)]
    fn test_serde_compact_highest_register(precision: u8) {
        let mut estimator = CompactEstimator::<str>::new(i32::from(precision)).unwrap();
        let max = 64 - precision;
        estimator.update_bucket(0, max).unwrap();
        assert!(estimator.update_bucket(0, max + 1).is_err());
        assert!(estimator.update_bucket(0, 64 + 128).is_err());
        estimator.compute_cardinality();

        let serialized = serde_json::to_string(&estimator).expect("serialization failed");
        let deserialized: CompactEstimator<str> =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(estimator, deserialized);
        assert_eq!(deserialized.register(0), Some(u32::from(max)));
    }

    #[test]
    fn test_deserialize_invalid_json() {
        let invalid_json = "{ invalid_json_string }";
        let result: Result<StandardEstimator<str>, _> = serde_json::from_str(invalid_json);
        assert!(result.is_err());
        let result: Result<CompactEstimator<str>, _> = serde_json::from_str(invalid_json);
        assert!(result.is_err());
    }

    #[test_case("[2,0,[0,0,0]]"; "register count mismatch")]
    #[test_case("[1,0,[0,64]]"; "register out of range")]
    #[test_case("[19,0,[]]"; "precision out of range")]
    #[test_case("[2,0,[0,0,0,0],1]"; "trailing element")]
    fn test_failed_standard_deserialization(input: &str) {
        let result: Result<StandardEstimator<str>, _> = serde_json::from_str(input);
        assert!(result.is_err());
    }

    #[test_case("[0,0,[0],[]]"; "dense word count mismatch")]
    #[test_case("[0,0,[0,0],[[1,1]]]"; "overflow index out of range")]
    #[test_case("[0,0,[0,0],[[0,9]]]"; "overflow value out of range")]
    #[test_case("[0,0,[0,0],[[0,1],[0,2]]]"; "duplicate overflow index")]
    #[test_case("[4,0,[0,0,0],[[3,7]]]"; "register out of range")]
    fn test_failed_compact_deserialization(input: &str) {
        let result: Result<CompactEstimator<str>, _> = serde_json::from_str(input);
        assert!(result.is_err());
    }
}
