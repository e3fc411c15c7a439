//! Criterion benchmarks for the threshold sweep in `rc-core`.
//!
//! The sweep costs every (threshold, fold) pair, so its work grows with grid
//! size times scored rows. Fold scoring is benchmarked separately because it
//! dominates end-to-end runs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rc_config::ModelConfig;
use rc_core::model::CalibratedLogisticFactory;
use rc_core::{
    CalibratedScorer, CostEvaluator, CostWeights, FoldAssigner, FoldOutcome, FoldScores,
    ThresholdGrid, ThresholdSelector,
};

/// Ten folds of pseudo-random probabilities with roughly 10% positives.
fn synthetic_outcomes(rows_per_fold: usize) -> Vec<FoldOutcome> {
    let mut rng = StdRng::seed_from_u64(42);
    (1..=10)
        .map(|fold| {
            let labels: Vec<u8> = (0..rows_per_fold)
                .map(|_| u8::from(rng.random_bool(0.1)))
                .collect();
            let probabilities = labels
                .iter()
                .map(|&l| (0.6 * rng.random::<f64>() + if l == 1 { 0.4 } else { 0.0 }).min(1.0))
                .collect();
            FoldOutcome::Scored(FoldScores {
                fold,
                indices: (0..rows_per_fold).collect(),
                probabilities,
                labels,
                warning: None,
            })
        })
        .collect()
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold/evaluate");
    for rows in [100usize, 1_000, 10_000] {
        let outcomes = synthetic_outcomes(rows);
        let selector = ThresholdSelector::new(
            ThresholdGrid::new(0.01, 0.99, 100).unwrap(),
            CostEvaluator::new(CostWeights::default()),
        );
        group.bench_with_input(BenchmarkId::new("rows_per_fold", rows), &outcomes, |b, o| {
            b.iter(|| black_box(selector.evaluate(black_box(o)).unwrap().selection))
        });
    }
    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..2_000 {
        let label = u8::from(i % 5 == 0);
        let shift = if label == 1 { 1.0 } else { 0.0 };
        x.push(vec![
            shift + ((i * 37) % 101) as f64 / 50.0 - 1.0,
            ((i * 13) % 17) as f64 / 8.0 - 1.0,
            ((i * 7) % 23) as f64 / 11.0 - 1.0,
        ]);
        y.push(label);
    }
    let folds = FoldAssigner::new(10, 42).assign(&y).unwrap();
    let scorer = CalibratedScorer::new(CalibratedLogisticFactory::new(ModelConfig::default(), 42));

    let mut group = c.benchmark_group("scorer/score_all");
    group.sample_size(10);
    group.bench_function("2000x3_10_folds", |b| {
        b.iter(|| black_box(scorer.score_all(&x, &y, &folds).unwrap().len()))
    });
    group.finish();
}

criterion_group!(benches, bench_sweep, bench_scoring);
criterion_main!(benches);
