use split_hyperloglog::{CardinalityEstimator, EstimatorConfig, EstimatorKind};

fn main() {
    for kind in [EstimatorKind::Standard, EstimatorKind::Compact] {
        let mut sketch = EstimatorConfig::default()
            .with_kind(kind)
            .with_precision(12)
            .build::<usize>()
            .unwrap();
        for i in 0..100_000 {
            sketch.add_elem(&i);
        }
        sketch.compute_cardinality();
        println!("{:?} estimate = {} ({:?})", kind, sketch.cardinality(), sketch);
    }
}
