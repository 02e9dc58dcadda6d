//! Pairwise cosine similarity over latent embeddings, and top-N lookup.
//!
//! `SimilarityTable` is square and indexed by drug id on both axes, in the
//! order the drugs appeared in the ratings matrix. The diagonal is fixed to 1
//! so every drug is maximally similar to itself, even when its embedding is
//! the zero vector.
//!
//! ```
//! use drugspace::operators::from_row_major;
//! use drugspace::similarity::SimilarityTable;
//!
//! let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let embeddings = from_row_major(vec![1.0, 0.0, 0.9, 0.1, 0.0, 1.0], 3, 2);
//! let table = SimilarityTable::from_embeddings(ids, &embeddings);
//!
//! let hits = table.top_similar("a", 1).unwrap();
//! assert_eq!(hits[0].drug, "b");
//! assert!(table.top_similar("zzz", 1).is_err());
//! ```

use std::collections::HashMap;
use std::io::Write;

use csv::{Writer, WriterBuilder};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::{arrays::Array, matrix::DenseMatrix};

use crate::errors::LookupError;
use crate::operators::{cosine_similarity, from_row_major, to_row_major};
use crate::ratings::resolve_id;

pub const DEFAULT_TOP_N: usize = 5;

/// One ranked neighbour of a queried drug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarDrug {
    #[serde(rename = "Drug")]
    pub drug: String,
    #[serde(rename = "Similarity Score")]
    pub score: f64,
}

#[derive(Clone, Debug)]
pub struct SimilarityTable {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    scores: DenseMatrix<f64>,
}

impl SimilarityTable {
    /// Cosine similarity between every pair of embedding rows.
    ///
    /// # Panics
    ///
    /// Panics if `ids.len()` differs from the number of embedding rows.
    pub fn from_embeddings(ids: Vec<String>, embeddings: &DenseMatrix<f64>) -> Self {
        let (flat, n, d) = to_row_major(embeddings);
        assert_eq!(ids.len(), n, "one id per embedding row required");
        info!("Computing {}x{} cosine similarity over {}-d embeddings", n, n, d);

        let rows: Vec<&[f64]> = if d == 0 {
            vec![&[][..]; n]
        } else {
            flat.chunks(d).collect()
        };

        let scores: Vec<f64> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let rows = &rows;
                (0..n).map(move |j| {
                    if i == j {
                        1.0
                    } else {
                        cosine_similarity(rows[i], rows[j])
                    }
                })
            })
            .collect();

        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        debug!("Similarity table built for {} drugs", n);

        Self {
            ids,
            index,
            scores: from_row_major(scores, n, n),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn scores(&self) -> &DenseMatrix<f64> {
        &self.scores
    }

    pub fn contains(&self, drug_id: &str) -> bool {
        self.position(drug_id).is_some()
    }

    /// Similarity between two drugs, if both are present.
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Some(*self.scores.get((i, j)))
    }

    /// Full row of scores for one drug, in axis order.
    pub fn row(&self, drug_id: &str) -> Result<Vec<f64>, LookupError> {
        let i = self.lookup(drug_id)?;
        Ok((0..self.len()).map(|j| *self.scores.get((i, j))).collect())
    }

    fn position(&self, drug_id: &str) -> Option<usize> {
        let id = resolve_id(drug_id, |c| self.index.contains_key(c))?;
        self.index.get(&id).copied()
    }

    fn lookup(&self, drug_id: &str) -> Result<usize, LookupError> {
        self.position(drug_id)
            .ok_or_else(|| LookupError::NotFound(drug_id.trim().to_string()))
    }

    /// The `top_n` drugs most similar to `drug_id`, best first.
    ///
    /// The queried drug itself is never returned. Equal scores keep the axis
    /// order. An unknown id yields `LookupError::NotFound`.
    pub fn top_similar(&self, drug_id: &str, top_n: usize) -> Result<Vec<SimilarDrug>, LookupError> {
        let i = self.lookup(drug_id)?;
        let mut ranked: Vec<(usize, f64)> = (0..self.len())
            .filter(|&j| j != i)
            .map(|j| (j, *self.scores.get((i, j))))
            .collect();

        // stable: ties stay in axis order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_n);

        debug!(
            "top {} for {}: {:?}",
            top_n,
            drug_id,
            ranked.iter().map(|&(j, s)| (&self.ids[j], s)).collect::<Vec<_>>()
        );

        Ok(ranked
            .into_iter()
            .map(|(j, score)| SimilarDrug {
                drug: self.ids[j].clone(),
                score,
            })
            .collect())
    }

    /// Write the whole table: header of ids, then one row per drug.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = Writer::from_writer(writer);
        let mut header = Vec::with_capacity(self.len() + 1);
        header.push(String::new());
        header.extend(self.ids.iter().cloned());
        wtr.write_record(&header)?;

        for (i, id) in self.ids.iter().enumerate() {
            let mut record = Vec::with_capacity(self.len() + 1);
            record.push(id.clone());
            record.extend((0..self.len()).map(|j| self.scores.get((i, j)).to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Write a ranked list with a `Drug,Similarity Score` header. The header is
/// written even when `hits` is empty.
pub fn write_similar_csv<W: Write>(hits: &[SimilarDrug], writer: W) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(["Drug", "Similarity Score"])?;
    for hit in hits {
        wtr.serialize(hit)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Answer one query the way the command line shows it.
///
/// A known drug gets its ranked neighbours, as CSV or as an aligned table. An
/// unknown drug gets the `LookupError` message. Returns whether the drug was
/// found; a missing drug is not an error.
pub fn write_query_report<W: Write>(
    table: &SimilarityTable,
    drug_id: &str,
    top_n: usize,
    as_csv: bool,
    mut writer: W,
) -> Result<bool, csv::Error> {
    match table.top_similar(drug_id, top_n) {
        Ok(hits) if as_csv => {
            write_similar_csv(&hits, writer)?;
            Ok(true)
        }
        Ok(hits) => {
            writeln!(writer, "Most similar drugs to {}:", drug_id.trim())?;
            writeln!(writer, "{:<24} {:>16}", "Drug", "Similarity Score")?;
            for hit in hits {
                writeln!(writer, "{:<24} {:>16.6}", hit.drug, hit.score)?;
            }
            Ok(true)
        }
        Err(not_found) => {
            debug!("query miss: {}", drug_id.trim());
            writeln!(writer, "{}", not_found)?;
            Ok(false)
        }
    }
}
