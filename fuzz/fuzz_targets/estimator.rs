#![no_main]

use libfuzzer_sys::fuzz_target;
use split_hyperloglog::{CardinalityEstimator, CompactEstimator, StandardEstimator};
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let precision = (wyhash(data, 0) % 19) as i32;
    let mut standard = StandardEstimator::<[u8]>::new(precision).unwrap();
    let mut compact = CompactEstimator::<[u8]>::new(precision).unwrap();

    for chunk in data.chunks(4) {
        standard.add_elem(chunk);
        compact.add_elem(chunk);
    }

    // A hash with no bit set after the index has rank 0 but `64 - b` leading zeros
    let all_zero = 64 - u32::from(standard.precision());
    let mut all_zero_seen = false;
    for idx in 0..standard.num_registers() {
        let rank = u32::from(standard.register(idx).unwrap());
        let value = compact.register(idx).unwrap();
        if value == all_zero && rank != value + 1 {
            all_zero_seen = true;
            continue;
        }
        assert!(rank == value + 1 || (rank == 0 && value == 0));
    }

    standard.compute_cardinality();
    compact.compute_cardinality();
    if !all_zero_seen {
        assert!(standard.cardinality() >= compact.cardinality());
    }
    assert!(compact.size_of() > 0);
});
