use std::hash::Hash;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use split_hyperloglog::{CardinalityEstimator, CompactEstimator, StandardEstimator};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};

/// Insert and estimate operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 1 << 16;
/// Precision used by all benchmarked estimators
const PRECISION: i32 = 12;

criterion_group!(benches, benchmark);
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("insert");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_insert::<Standard>(&mut group, cardinality);
        bench_insert::<Compact>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_estimate::<Standard>(&mut group, cardinality);
        bench_estimate::<Compact>(&mut group, cardinality);
    }
    group.finish();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            standard: measure_error::<Standard>(cardinality),
            compact: measure_error::<Compact>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    println!("{}", Table::new(results).with(table_config));
}

/// Estimator operations shared by benchmarked estimators.
trait BenchEstimator<T: Hash + ?Sized> {
    fn new() -> Self;
    fn insert(&mut self, item: &T);
    fn estimate(&mut self) -> u64;
    fn name() -> String;
}

fn bench_insert<E: BenchEstimator<usize>>(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut estimator = E::new();
                for i in 0..black_box(cardinality) {
                    estimator.insert(black_box(&i));
                }
            });
        },
    );
}

fn bench_estimate<E: BenchEstimator<usize>>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            let mut estimator = E::new();
            for i in 0..black_box(cardinality) {
                estimator.insert(black_box(&i));
            }
            b.iter(|| estimator.estimate());
        },
    );
}

fn measure_error<E: BenchEstimator<usize>>(cardinality: usize) -> String {
    let n = 100;
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut estimator = E::new();
        for _ in 0..cardinality {
            estimator.insert(&rng.gen());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            (estimator.estimate() as f64 - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    standard: String,
    compact: String,
}

struct Standard(StandardEstimator<usize>);

impl BenchEstimator<usize> for Standard {
    fn new() -> Self {
        Self(StandardEstimator::new(PRECISION).unwrap())
    }

    fn insert(&mut self, item: &usize) {
        self.0.add_elem(item);
    }

    fn estimate(&mut self) -> u64 {
        self.0.compute_cardinality();
        self.0.cardinality()
    }

    fn name() -> String {
        "standard".to_string()
    }
}

struct Compact(CompactEstimator<usize>);

impl BenchEstimator<usize> for Compact {
    fn new() -> Self {
        Self(CompactEstimator::new(PRECISION).unwrap())
    }

    fn insert(&mut self, item: &usize) {
        self.0.add_elem(item);
    }

    fn estimate(&mut self) -> u64 {
        self.0.compute_cardinality();
        self.0.cardinality()
    }

    fn name() -> String {
        "compact".to_string()
    }
}
