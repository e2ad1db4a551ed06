mod common;

use common::synthetic_corpus;
use rent_model::config::DataConfig;
use rent_model::data::records_to_frame;
use rent_model::preprocessing::preprocess_data;
use rent_model::split::{split_data, DataSplit};
use rstest::rstest;
use std::collections::BTreeSet;

fn split(n: usize, train_size: f64, seed: u64) -> DataSplit {
    let raw = records_to_frame(&synthetic_corpus(n)).unwrap();
    let prepared = preprocess_data(&raw, &DataConfig::default()).unwrap();
    split_data(&prepared.frame, "rent", train_size, Some(seed)).unwrap()
}

#[rstest]
#[case(40, 0.75)]
#[case(101, 0.6)]
#[case(57, 0.8)]
fn test_partitions_cover_input(#[case] n: usize, #[case] train_size: f64) {
    let s = split(n, train_size, 3);
    assert_eq!(s.len(), n);
    assert_eq!(s.x_train.height() + s.x_val.height() + s.x_test.height(), n);
    assert_eq!(s.y_train.len(), s.x_train.height());
    assert_eq!(s.y_val.len(), s.x_val.height());
    assert_eq!(s.y_test.len(), s.x_test.height());

    let mut all = BTreeSet::new();
    for rows in [&s.train_rows, &s.val_rows, &s.test_rows] {
        for row in rows {
            assert!(all.insert(*row), "row {} appears in two partitions", row);
        }
    }
    assert_eq!(all, (0..n).collect::<BTreeSet<usize>>());
}

#[test]
fn test_target_removed_from_features() {
    let s = split(40, 0.75, 3);
    assert!(!s.x_train.get_column_names().contains(&"rent"));
    assert_eq!(s.x_train.width(), 11);
}

#[test]
fn test_targets_follow_their_rows() {
    let corpus = synthetic_corpus(40);
    let s = split(40, 0.75, 9);
    for (row, y) in s.test_rows.iter().zip(&s.y_test) {
        assert_eq!(corpus[*row].rent.map(|r| r as f64), Some(*y));
    }
}

#[test]
fn test_same_seed_same_split() {
    let a = split(60, 0.75, 17);
    let b = split(60, 0.75, 17);
    assert_eq!(a.train_rows, b.train_rows);
    assert_eq!(a.val_rows, b.val_rows);
    assert_eq!(a.test_rows, b.test_rows);
    assert!(a.x_test.frame_equal(&b.x_test));
}
