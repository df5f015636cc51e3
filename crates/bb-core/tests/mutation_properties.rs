//! Property tests for the mutation engine.

mod common;

use bb_core::mutation::{apply, compose, MutationOperator, MutationPlan};
use bb_data::{Column, Dataset};
use proptest::prelude::*;

fn operator() -> impl Strategy<Value = MutationOperator> {
    prop_oneof![
        (0.001f64..5.0).prop_map(|intensity| MutationOperator::Noise { intensity }),
        (0.0f64..=1.0).prop_map(|ratio| MutationOperator::Drop { ratio }),
        (0.001f64..5.0).prop_map(|ratio| MutationOperator::Shift { ratio }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operators_preserve_row_count(
        rows in 1usize..60,
        features in 1usize..8,
        op in operator(),
        seed in any::<u64>(),
    ) {
        let data = common::numeric_dataset(rows, features);
        let out = apply(&data, &op, seed).unwrap();
        prop_assert_eq!(out.n_rows(), rows);
        prop_assert!(out.n_columns() >= 1);
        prop_assert!(out.n_columns() <= features);
    }

    #[test]
    fn composition_is_deterministic(
        ops in prop::collection::vec(operator(), 0..5),
        seed in any::<u64>(),
    ) {
        let data = common::numeric_dataset(30, 6);
        let plan = ops.iter().fold(MutationPlan::new(seed), |p, op| p.then(*op));
        let first = compose(&data, plan.steps()).unwrap();
        let second = compose(&data, plan.steps()).unwrap();
        prop_assert_eq!(first.to_csv_bytes().unwrap(), second.to_csv_bytes().unwrap());
    }

    #[test]
    fn drop_keeps_surviving_columns_in_order(
        features in 2usize..12,
        ratio in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let data = common::numeric_dataset(10, features);
        let out = apply(&data, &MutationOperator::Drop { ratio }, seed).unwrap();
        let positions: Vec<usize> = out
            .column_names()
            .iter()
            .map(|n| data.index_of(n).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for name in out.column_names() {
            prop_assert_eq!(out.column(name), data.column(name));
        }
    }
}

#[test]
fn full_drop_of_single_column_keeps_it() {
    let data = common::numeric_dataset(15, 1);
    let out = apply(&data, &MutationOperator::Drop { ratio: 1.0 }, 3).unwrap();
    assert_eq!(out.column_names(), data.column_names());
    assert_eq!(out, data);
}

#[test]
fn noise_leaves_categorical_columns_alone() {
    let colors: Vec<Option<String>> = ["red", "blue", "red", "green"]
        .iter()
        .map(|s| Some(s.to_string()))
        .collect();
    let data = Dataset::from_columns(vec![
        ("x".to_string(), Column::Numeric(vec![1.0, 2.0, 3.0, 4.0])),
        ("color".to_string(), Column::Categorical(colors)),
    ])
    .unwrap();

    let out = apply(&data, &MutationOperator::Noise { intensity: 1.0 }, 9).unwrap();
    assert_eq!(out.column("color"), data.column("color"));
    assert_ne!(out.column("x"), data.column("x"));
}

#[test]
fn different_seeds_give_different_noise() {
    let data = common::numeric_dataset(20, 3);
    let op = MutationOperator::Noise { intensity: 0.5 };
    assert_ne!(apply(&data, &op, 1).unwrap(), apply(&data, &op, 2).unwrap());
}
