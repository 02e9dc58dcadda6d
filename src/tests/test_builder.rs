use approx::assert_relative_eq;
use log::info;
use smartcore::linalg::basic::arrays::Array;

use crate::autoencoder::{Autoencoder, AutoencoderConfig};
use crate::builder::EngineBuilder;
use crate::errors::{ConfigError, EngineError, LoadError};
use crate::scaling::MinMaxScaler;
use crate::tests::test_data::{five_by_five, random_ratings, SAMPLE_CSV};
use crate::tests::{init, test_builder};

#[test]
fn test_five_by_five_scenario() {
    init();
    let ratings = five_by_five();
    let table = test_builder().train(&ratings).unwrap();

    assert_eq!(table.len(), 5);
    assert_eq!(table.scores().shape(), (5, 5));

    let first = &ratings.row_ids()[0];
    let hits = table.top_similar(first, 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| &h.drug != first));
}

#[test]
fn test_table_axis_matches_input_order() {
    init();
    let ratings = random_ratings(12, 7);
    let table = test_builder().train(&ratings).unwrap();
    assert_eq!(table.ids(), ratings.row_ids());
}

#[test]
fn test_diagonal_is_one() {
    init();
    let ratings = random_ratings(10, 3);
    let table = test_builder().train(&ratings).unwrap();
    for id in table.ids() {
        let s = table.score(id, id).unwrap();
        assert!((s - 1.0).abs() < 1e-4, "self-similarity of {} is {}", id, s);
    }
}

#[test]
fn test_scores_are_bounded_and_symmetric() {
    init();
    let ratings = random_ratings(8, 11);
    let table = test_builder().train(&ratings).unwrap();
    let n = table.len();
    for i in 0..n {
        for j in 0..n {
            let s = *table.scores().get((i, j));
            assert!((-1.0..=1.0).contains(&s));
            assert_relative_eq!(s, *table.scores().get((j, i)), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_training_reduces_reconstruction_loss() {
    init();
    let ratings = five_by_five();
    let scaled = MinMaxScaler::new().fit_transform(ratings.values());

    let config = AutoencoderConfig::for_input_width(5).with_seed(42).with_passes(50);
    let mut model = Autoencoder::new(config).unwrap();
    let before = model.reconstruction_loss(&scaled);
    let report = model.fit(&scaled);
    let after = model.reconstruction_loss(&scaled);

    info!("loss before {:.6}, after {:.6}", before, after);
    assert_eq!(report.losses.len(), 50);
    assert_relative_eq!(report.initial_loss, before);
    assert_relative_eq!(report.losses[0], before, epsilon = 1e-12);
    assert_relative_eq!(report.final_loss, after);
    assert!(after < before, "loss did not drop: {} -> {}", before, after);
}

#[test]
fn test_seeded_training_is_reproducible() {
    init();
    let ratings = random_ratings(9, 5);
    let a = test_builder().train_with_report(&ratings).unwrap();
    let b = test_builder().train_with_report(&ratings).unwrap();

    assert_eq!(a.report.seed, 42);
    assert_eq!(a.report.losses, b.report.losses);
    for id in a.table.ids() {
        assert_eq!(a.table.row(id).unwrap(), b.table.row(id).unwrap());
    }
}

#[test]
fn test_reconstruction_back_to_rating_units() {
    init();
    let ratings = five_by_five();
    let trained = test_builder()
        .with_learning_rate(1e-2)
        .with_passes(200)
        .train_with_report(&ratings)
        .unwrap();

    let scaled = trained.scaler.transform(ratings.values());
    let restored = trained
        .scaler
        .inverse_transform(&trained.model.reconstruct(&scaled));
    assert_eq!(restored.shape(), (5, 5));

    let mut err = 0.0;
    for i in 0..5 {
        for j in 0..5 {
            err += (restored.get((i, j)) - ratings.values().get((i, j))).abs();
        }
    }
    // ratings span 0..5, so an untrained model is off by ~2 per cell
    assert!(err / 25.0 < 1.0, "mean abs error {}", err / 25.0);
}

#[test]
fn test_default_latent_adapts_to_narrow_input() {
    let config = EngineBuilder::new().config_for(5).unwrap();
    assert_eq!(config.latent_width, 4);
    assert_eq!(config.hidden_width, 128);

    let config = EngineBuilder::new().config_for(300).unwrap();
    assert_eq!(config.latent_width, 64);
}

#[test]
fn test_explicit_latent_must_compress() {
    init();
    let err = test_builder()
        .with_latent_width(5)
        .train(&five_by_five())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::LatentNotSmaller { latent: 5, input: 5 })
    ));
}

#[test]
fn test_single_column_cannot_compress() {
    let csv = "drug,a\nx,1\ny,2\n";
    let ratings = crate::ratings::RatingsMatrix::from_reader(csv.as_bytes()).unwrap();
    let err = test_builder().train(&ratings).unwrap_err();
    assert!(matches!(err, EngineError::Config(ConfigError::InputTooNarrow(1))));
}

#[test]
fn test_train_from_path() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratings_mat.csv");
    std::fs::write(&path, SAMPLE_CSV).unwrap();

    let table = test_builder().train_from_path(&path).unwrap();
    assert_eq!(table.len(), 5);
    assert!(table.contains("54675785"));
}

#[test]
fn test_train_from_bad_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratings_mat.csv");
    std::fs::write(&path, "drug,a,b\nx,1,oops\n").unwrap();

    let err = test_builder().train_from_path(&path).unwrap_err();
    assert!(matches!(err, EngineError::Load(LoadError::NonNumeric { .. })));
}

#[test]
fn test_zero_passes_keeps_initial_model() {
    let trained = test_builder()
        .with_passes(0)
        .train_with_report(&five_by_five())
        .unwrap();
    assert!(trained.report.losses.is_empty());
    assert_relative_eq!(trained.report.initial_loss, trained.report.final_loss);
    assert_eq!(trained.table.len(), 5);
}
