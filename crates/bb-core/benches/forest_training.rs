//! Criterion benchmarks for model training and prediction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bb_core::model::{BoostingTrainer, Classifier, ForestTrainer};
use bb_data::{Column, Dataset};

fn training_set(rows: usize, features: usize) -> (Dataset, Vec<String>) {
    let columns: Vec<(String, Column)> = (0..features)
        .map(|c| {
            let values = (0..rows)
                .map(|r| ((r * 13 + c * 7) % 41) as f64 / 4.0)
                .collect();
            (format!("f{}", c), Column::Numeric(values))
        })
        .collect();
    let data = Dataset::from_columns(columns).unwrap();
    let labels = data
        .numeric("f0")
        .unwrap()
        .iter()
        .zip(data.numeric("f1").unwrap())
        .map(|(a, b)| if a + b > 10.0 { "pos" } else { "neg" }.to_string())
        .collect();
    (data, labels)
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    group.sample_size(10);

    for n_trees in [10usize, 50] {
        let (data, labels) = training_set(500, 10);
        let trainer = ForestTrainer {
            n_trees,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("fit", n_trees), &n_trees, |b, _| {
            b.iter(|| black_box(trainer.fit_forest(black_box(&data), black_box(&labels))));
        });

        let forest = trainer.fit_forest(&data, &labels).unwrap();
        group.bench_with_input(BenchmarkId::new("predict", n_trees), &n_trees, |b, _| {
            b.iter(|| black_box(forest.predict(black_box(&data))));
        });
    }

    group.finish();
}

fn bench_boosting(c: &mut Criterion) {
    let mut group = c.benchmark_group("boosting");
    group.sample_size(10);

    let (data, labels) = training_set(500, 10);
    for n_rounds in [10usize, 50] {
        let trainer = BoostingTrainer {
            n_rounds,
            max_depth: 4,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("fit", n_rounds), &n_rounds, |b, _| {
            b.iter(|| black_box(trainer.fit_boosted(black_box(&data), black_box(&labels))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forest, bench_boosting);
criterion_main!(benches);
