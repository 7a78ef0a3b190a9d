#![no_main]

use libfuzzer_sys::fuzz_target;
use split_hyperloglog::{CardinalityEstimator, CompactEstimator, StandardEstimator};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut estimator) = serde_json::from_slice::<StandardEstimator<usize>>(data) {
        estimator.add_elem(&1);
        estimator.compute_cardinality();
    }
    if let Ok(mut estimator) = serde_json::from_slice::<CompactEstimator<usize>>(data) {
        estimator.add_elem(&1);
        estimator.compute_cardinality();
    }
});
