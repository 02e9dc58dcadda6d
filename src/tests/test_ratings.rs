use std::io::Write;

use smartcore::linalg::basic::arrays::Array;

use crate::errors::{Axis, LoadError};
use crate::ratings::{canonical_axis, integral_form, RatingsMatrix};
use crate::tests::init;
use crate::tests::test_data::SAMPLE_CSV;

#[test]
fn test_load_sample_csv() {
    init();
    let ratings = RatingsMatrix::from_reader(SAMPLE_CSV.as_bytes()).unwrap();

    assert_eq!(ratings.shape(), (5, 5));
    assert_eq!(ratings.row_ids()[0], "54675785");
    assert_eq!(ratings.col_ids()[4], "60823");
    assert_eq!(*ratings.values().get((2, 3)), 4.0);
    assert_eq!(ratings.row(1), vec![4.0, 5.0, 1.0, 0.0, 0.0]);
    assert_eq!(ratings.position("3672"), Some(2));
}

#[test]
fn test_integral_form() {
    assert_eq!(integral_form(" 42 ").as_deref(), Some("42"));
    assert_eq!(integral_form("42.0").as_deref(), Some("42"));
    assert_eq!(integral_form("-7").as_deref(), Some("-7"));
    assert_eq!(integral_form("1.5"), None);
    assert_eq!(integral_form("DB00945"), None);
}

#[test]
fn test_canonical_axis_numeric_only_when_whole_axis_is() {
    assert_eq!(canonical_axis(&[" 42 ", "7.0", "007"]), vec!["42", "7", "7"]);
    assert_eq!(
        canonical_axis(&["007", " 7", "DB1"]),
        vec!["007", "7", "DB1"]
    );
    assert_eq!(canonical_axis(&["1", "1.5"]), vec!["1", "1.5"]);
}

#[test]
fn test_mixed_row_ids_stay_distinct() {
    let csv = "drug,a,b\n007,1,2\n7,3,4\nDB1,5,6\n";
    let ratings = RatingsMatrix::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(ratings.row_ids(), &["007", "7", "DB1"]);
    assert_eq!(ratings.position("007"), Some(0));
    assert_eq!(ratings.position("7"), Some(1));
    assert_eq!(ratings.position("7.0"), Some(1));
    assert_eq!(ratings.row(0), vec![1.0, 2.0]);
}

#[test]
fn test_float_formatted_row_ids_match_header() {
    let csv = "drug,1,2,3\n1.0,1,0,0\n2.0,0,1,0\n3.0,0,0,1\n";
    let ratings = RatingsMatrix::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(ratings.row_ids(), ratings.col_ids());
}

#[test]
fn test_empty_cells_are_zero_filled() {
    let csv = "drug,a,b\nx,,2\ny,3,\n";
    let ratings = RatingsMatrix::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(ratings.row(0), vec![0.0, 2.0]);
    assert_eq!(ratings.row(1), vec![3.0, 0.0]);
}

#[test]
fn test_non_numeric_cell_fails() {
    let csv = "drug,a,b\nx,1,high\n";
    match RatingsMatrix::from_reader(csv.as_bytes()) {
        Err(LoadError::NonNumeric { row, column, value }) => {
            assert_eq!(row, "x");
            assert_eq!(column, "b");
            assert_eq!(value, "high");
        }
        other => panic!("expected NonNumeric, got {:?}", other),
    }
}

#[test]
fn test_nan_cell_fails() {
    let csv = "drug,a\nx,NaN\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::NonNumeric { .. })
    ));
}

#[test]
fn test_duplicate_ids_fail() {
    let csv = "drug,a,b\nx,1,2\nx,3,4\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::DuplicateId { axis: Axis::Row, .. })
    ));

    let csv = "drug,a,a\nx,1,2\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::DuplicateId { axis: Axis::Column, .. })
    ));
}

#[test]
fn test_ragged_row_fails() {
    let csv = "drug,a,b\nx,1\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::RaggedRow { expected: 2, found: 1, .. })
    ));
}

#[test]
fn test_missing_row_id_fails() {
    let csv = "drug,a,b\n,1,2\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::MissingId { .. })
    ));
}

#[test]
fn test_in_memory_empty_id_reports_position() {
    let rows = vec!["a".to_string(), " ".to_string()];
    let cols = vec!["x".to_string(), "y".to_string()];
    let err = RatingsMatrix::new(rows, cols.clone(), vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        .unwrap_err();
    assert!(matches!(err, LoadError::EmptyId { axis: Axis::Row, index: 1 }));

    let cols = vec!["".to_string(), "y".to_string()];
    let err = RatingsMatrix::new(vec!["a".to_string()], cols, vec![vec![1.0, 2.0]]).unwrap_err();
    assert!(matches!(err, LoadError::EmptyId { axis: Axis::Column, index: 0 }));
    assert_eq!(err.to_string(), "empty column identifier at position 0");
}

#[test]
fn test_header_only_is_empty() {
    let csv = "drug,a,b\n";
    assert!(matches!(
        RatingsMatrix::from_reader(csv.as_bytes()),
        Err(LoadError::Empty)
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RatingsMatrix::from_path("/definitely/not/here/ratings_mat.csv").unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn test_tsv_by_extension() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    write!(file, "drug\ta\tb\nx\t1\t2\ny\t3\t4\n").unwrap();
    file.flush().unwrap();

    let ratings = RatingsMatrix::from_path(file.path()).unwrap();
    assert_eq!(ratings.shape(), (2, 2));
    assert_eq!(ratings.row(1), vec![3.0, 4.0]);
}

#[test]
fn test_content_hash_tracks_values() {
    let a = RatingsMatrix::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    let b = RatingsMatrix::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
    assert_eq!(a.content_hash(), b.content_hash());

    let changed = SAMPLE_CSV.replace("60823,0,0,3,4,5", "60823,0,0,3,4,4");
    let c = RatingsMatrix::from_reader(changed.as_bytes()).unwrap();
    assert_ne!(a.content_hash(), c.content_hash());

    assert!(a.same_content(&b));
    assert!(!a.same_content(&c));
}

#[test]
fn test_in_memory_rejects_ragged_rows() {
    let ids = vec!["a".to_string(), "b".to_string()];
    let err = RatingsMatrix::new(ids.clone(), ids, vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
    assert!(matches!(err, LoadError::RaggedRow { .. }));
}
