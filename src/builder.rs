use std::path::Path;

use crate::autoencoder::{
    Autoencoder, AutoencoderConfig, TrainingReport, DEFAULT_HIDDEN_WIDTH, DEFAULT_LEARNING_RATE,
    DEFAULT_NUM_PASSES, DEFAULT_REPORT_EVERY,
};
use crate::errors::{ConfigError, EngineError};
use crate::ratings::RatingsMatrix;
use crate::scaling::MinMaxScaler;
use crate::similarity::SimilarityTable;

// Add logging
use log::{debug, info, trace};

/// Builder settings that change the trained result.
pub(crate) type Fingerprint = (usize, Option<usize>, u64, usize, Option<u64>);

/// Everything one training call produced besides the table.
#[derive(Clone, Debug)]
pub struct TrainedEngine {
    pub table: SimilarityTable,
    pub report: TrainingReport,
    pub model: Autoencoder,
    pub scaler: MinMaxScaler,
}

#[derive(Clone, Debug)]
pub struct EngineBuilder {
    // Autoencoder shape
    hidden_width: usize,
    latent_width: Option<usize>, // None: capped default for the data width

    // Optimisation
    learning_rate: f64,
    num_passes: usize,
    seed: Option<u64>,

    report_every: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        debug!("Creating EngineBuilder with default parameters");
        Self {
            hidden_width: DEFAULT_HIDDEN_WIDTH,
            latent_width: None,
            learning_rate: DEFAULT_LEARNING_RATE,
            num_passes: DEFAULT_NUM_PASSES,
            seed: None,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        info!("Initializing new EngineBuilder");
        Self::default()
    }

    // -------------------- Autoencoder configuration --------------------

    pub fn with_hidden_width(mut self, hidden_width: usize) -> Self {
        info!("Setting hidden width: {}", hidden_width);
        self.hidden_width = hidden_width;
        self
    }

    /// Fix the latent width. It must stay below the ratings width or
    /// training fails with `ConfigError::LatentNotSmaller`.
    pub fn with_latent_width(mut self, latent_width: usize) -> Self {
        info!("Setting latent width: {}", latent_width);
        self.latent_width = Some(latent_width);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        info!("Setting learning rate: {}", learning_rate);
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_passes(mut self, num_passes: usize) -> Self {
        info!("Setting training passes: {}", num_passes);
        self.num_passes = num_passes;
        self
    }

    /// Seed for weight initialisation; without one every call draws a new seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        info!("Setting seed: {}", seed);
        self.seed = Some(seed);
        self
    }

    /// Log the loss every `report_every` passes (0 silences progress).
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }

    /// Resolve the autoencoder configuration for a ratings matrix this wide.
    pub fn config_for(&self, input_width: usize) -> Result<AutoencoderConfig, ConfigError> {
        let mut config = AutoencoderConfig::for_input_width(input_width);
        config.hidden_width = self.hidden_width;
        if let Some(latent) = self.latent_width {
            config.latent_width = latent;
        }
        config.learning_rate = self.learning_rate;
        config.num_passes = self.num_passes;
        config.seed = self.seed;
        config.report_every = self.report_every;
        config.validate()?;
        Ok(config)
    }

    /// Settings that change the trained result.
    pub(crate) fn fingerprint(&self) -> Fingerprint {
        (
            self.hidden_width,
            self.latent_width,
            self.learning_rate.to_bits(),
            self.num_passes,
            self.seed,
        )
    }

    // -------------------- Train --------------------

    /// Scale, train, embed and compare: the full similarity pipeline for an
    /// already loaded ratings matrix.
    pub fn train(&self, ratings: &RatingsMatrix) -> Result<SimilarityTable, EngineError> {
        Ok(self.train_with_report(ratings)?.table)
    }

    /// Load `path` and run `train` on it.
    pub fn train_from_path<P: AsRef<Path>>(&self, path: P) -> Result<SimilarityTable, EngineError> {
        let ratings = RatingsMatrix::from_path(path)?;
        self.train(&ratings)
    }

    /// Like `train`, also returning the fitted scaler, the trained model and
    /// its loss history.
    pub fn train_with_report(&self, ratings: &RatingsMatrix) -> Result<TrainedEngine, EngineError> {
        let (n_drugs, n_features) = ratings.shape();
        info!(
            "Building similarity engine from {} drugs with {} rating columns",
            n_drugs, n_features
        );

        let config = self.config_for(n_features)?;
        debug!("Resolved autoencoder config: {:?}", config);

        // 1) Scale every column into [0, 1]
        trace!("Fitting min-max scaler");
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(ratings.values());

        // 2) Train the autoencoder
        let mut model = Autoencoder::new(config)?;
        let report = model.fit(&scaled);

        // 3) Inference pass for the latent embeddings
        trace!("Extracting latent embeddings");
        let embeddings = model.encode(&scaled);

        // 4) Cosine similarity in latent space, original ids on both axes
        let table = SimilarityTable::from_embeddings(ratings.row_ids().to_vec(), &embeddings);

        info!(
            "Similarity engine build completed - final loss: {:.6}",
            report.final_loss
        );
        Ok(TrainedEngine {
            table,
            report,
            model,
            scaler,
        })
    }
}
