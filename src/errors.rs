//! Error types for loading, configuring and querying the similarity engine.
//!
//! - `LoadError`: the ratings source cannot be turned into a `RatingsMatrix`.
//!   Fatal for a training call.
//! - `ConfigError`: the autoencoder shape or optimiser settings are unusable
//!   for the given input width.
//! - `LookupError`: a query named a drug that the table does not contain.
//!   Non-fatal; its `Display` is meant to be shown to the user as-is.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which identifier axis of the ratings table an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read ratings source: {0}")]
    Io(#[from] io::Error),

    #[error("malformed ratings table: {0}")]
    Csv(#[from] csv::Error),

    #[error("non-numeric rating {value:?} at row {row:?}, column {column:?}")]
    NonNumeric {
        row: String,
        column: String,
        value: String,
    },

    #[error("missing drug identifier on line {line}")]
    MissingId { line: u64 },

    #[error("empty {axis} identifier at position {index}")]
    EmptyId { axis: Axis, index: usize },

    #[error("duplicate {axis} identifier {id:?}")]
    DuplicateId { axis: Axis, id: String },

    #[error("row {row:?} has {found} ratings, expected {expected}")]
    RaggedRow {
        row: String,
        expected: usize,
        found: usize,
    },

    #[error("ratings table has no rows or no rating columns")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("input width {0} is too small to compress (need at least 2 columns)")]
    InputTooNarrow(usize),

    #[error("latent width {latent} must be strictly smaller than input width {input}")]
    LatentNotSmaller { latent: usize, input: usize },

    #[error("{0} width must be positive")]
    ZeroWidth(&'static str),

    #[error("learning rate must be positive and finite, got {0}")]
    LearningRate(f64),

    #[error("config input width {config} does not match data width {data}")]
    WidthMismatch { config: usize, data: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Drug ID {0} not found in dataset")]
    NotFound(String),
}

/// Anything that can abort a training call.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
