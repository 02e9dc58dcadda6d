//! # drugspace
//!
//! Drug-to-drug similarity from a ratings matrix. Each drug's rating vector is
//! min-max scaled, compressed by a bottleneck autoencoder, and drugs are
//! compared by cosine similarity of their latent embeddings.
//!
//! ```no_run
//! let table = drugspace::train("ratings_mat.csv").unwrap();
//! match drugspace::top_similar(&table, "54675785", drugspace::DEFAULT_TOP_N) {
//!     Ok(hits) => {
//!         for hit in hits {
//!             println!("{} {:.4}", hit.drug, hit.score);
//!         }
//!     }
//!     Err(not_found) => println!("{}", not_found),
//! }
//! ```

pub mod autoencoder;
pub mod builder;
pub mod cache;
pub mod errors;
pub mod operators;
pub mod optimizer;
pub mod ratings;
pub mod scaling;
pub mod similarity;

#[cfg(test)]
mod tests;

use std::path::Path;

pub use crate::builder::EngineBuilder;
pub use crate::errors::{EngineError, LoadError, LookupError};
pub use crate::similarity::{SimilarDrug, SimilarityTable, DEFAULT_TOP_N};

/// Load a ratings file and train a similarity table with default settings.
pub fn train<P: AsRef<Path>>(ratings_source: P) -> Result<SimilarityTable, EngineError> {
    EngineBuilder::new().train_from_path(ratings_source)
}

/// The `top_n` drugs most similar to `drug_id`. See
/// [`SimilarityTable::top_similar`].
pub fn top_similar(
    table: &SimilarityTable,
    drug_id: &str,
    top_n: usize,
) -> Result<Vec<SimilarDrug>, LookupError> {
    table.top_similar(drug_id, top_n)
}
