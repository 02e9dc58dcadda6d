//! Drug-by-drug ratings table.
//!
//! A `RatingsMatrix` is read once from a delimited file whose first column holds
//! the row (drug) identifiers and whose header row holds the column identifiers.
//! Every other cell is a numeric rating. Each identifier axis goes through
//! [`canonical_axis`]: ids are trimmed, and an all-numeric axis is written in
//! integer form so `"42"` and `"42.0"` name the same drug.
//!
//! ```
//! use drugspace::ratings::RatingsMatrix;
//!
//! let csv = "drug,a,b,c\nx,1,0,2\ny,0,3,1\n";
//! let ratings = RatingsMatrix::from_reader(csv.as_bytes()).unwrap();
//! assert_eq!(ratings.shape(), (2, 3));
//! assert_eq!(ratings.row_ids(), &["x".to_string(), "y".to_string()]);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, trace};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

use crate::errors::{Axis, LoadError};

/// Integral numeric form of an id (`"42.0"` -> `"42"`), if it has one.
pub fn integral_form(raw: &str) -> Option<String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
            Some(format!("{}", v as i64))
        }
        _ => None,
    }
}

/// Canonical string form of one identifier axis.
///
/// Surrounding whitespace is always dropped. Only when every id on the axis
/// is an integral number are they rewritten to their integer form, so a
/// float-typed index (`1.0, 2.0`) matches an integer header (`1, 2`). A mixed
/// axis keeps its ids verbatim: `"007"` stays `"007"` next to `"DB1"`.
pub fn canonical_axis<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let numeric: Option<Vec<String>> = raw.iter().map(|s| integral_form(s.as_ref())).collect();
    match numeric {
        Some(ids) if !ids.is_empty() => ids,
        _ => raw.iter().map(|s| s.as_ref().trim().to_string()).collect(),
    }
}

/// Stored form of a queried id: the trimmed id if `known` accepts it,
/// otherwise its integral form (queries like `"2244.0"` on a numeric axis).
pub(crate) fn resolve_id(drug_id: &str, known: impl Fn(&str) -> bool) -> Option<String> {
    let trimmed = drug_id.trim();
    if known(trimmed) {
        return Some(trimmed.to_string());
    }
    integral_form(trimmed).filter(|id| known(id))
}

#[derive(Clone, Debug)]
pub struct RatingsMatrix {
    row_ids: Vec<String>,
    col_ids: Vec<String>,
    values: DenseMatrix<f64>,
}

impl RatingsMatrix {
    /// Build from in-memory rows. Ids are canonicalised and checked for
    /// uniqueness; every row must have one value per column id.
    pub fn new(
        row_ids: Vec<String>,
        col_ids: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, LoadError> {
        let row_ids = canonical_axis(&row_ids);
        let col_ids = canonical_axis(&col_ids);

        if row_ids.is_empty() || col_ids.is_empty() {
            return Err(LoadError::Empty);
        }
        ensure_unique(&row_ids, Axis::Row)?;
        ensure_unique(&col_ids, Axis::Column)?;

        if rows.len() != row_ids.len() {
            return Err(LoadError::RaggedRow {
                row: "<all>".to_string(),
                expected: row_ids.len(),
                found: rows.len(),
            });
        }

        let ncols = col_ids.len();
        let mut flat = Vec::with_capacity(row_ids.len() * ncols);
        for (id, row) in row_ids.iter().zip(rows.iter()) {
            if row.len() != ncols {
                return Err(LoadError::RaggedRow {
                    row: id.clone(),
                    expected: ncols,
                    found: row.len(),
                });
            }
            if let Some((j, v)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(LoadError::NonNumeric {
                    row: id.clone(),
                    column: col_ids[j].clone(),
                    value: v.to_string(),
                });
            }
            flat.extend_from_slice(row);
        }

        let values = DenseMatrix::from_iterator(flat.into_iter(), row_ids.len(), ncols, 0);
        Ok(Self {
            row_ids,
            col_ids,
            values,
        })
    }

    /// Load a ratings file. `.tsv` and `.tab` files are read tab-separated,
    /// anything else comma-separated.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => {
                b'\t'
            }
            _ => b',',
        };
        info!("Loading ratings matrix from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader_with_delimiter(BufReader::new(file), delimiter)
    }

    /// Load a comma-separated ratings table from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_reader_with_delimiter(reader, b',')
    }

    pub fn from_reader_with_delimiter<R: Read>(
        reader: R,
        delimiter: u8,
    ) -> Result<Self, LoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        // first header cell labels the index column
        let col_ids: Vec<String> = rdr.headers()?.iter().skip(1).map(str::to_string).collect();
        let ncols = col_ids.len();
        debug!("Header carries {} column identifiers", ncols);

        let mut row_ids = Vec::new();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let (id, row) = parse_record(&record, &col_ids)?;
            trace!("Parsed row {} with {} ratings", id, row.len());
            row_ids.push(id);
            rows.push(row);
        }

        let ratings = Self::new(row_ids, col_ids, rows)?;
        info!(
            "Loaded ratings matrix: {} drugs x {} columns",
            ratings.nrows(),
            ratings.ncols()
        );
        Ok(ratings)
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn col_ids(&self) -> &[String] {
        &self.col_ids
    }

    pub fn values(&self) -> &DenseMatrix<f64> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_ids.len(), self.col_ids.len())
    }

    pub fn nrows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn ncols(&self) -> usize {
        self.col_ids.len()
    }

    /// Owned copy of one drug's rating vector.
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| *self.values.get((i, j))).collect()
    }

    pub fn position(&self, drug_id: &str) -> Option<usize> {
        let id = resolve_id(drug_id, |c| self.row_ids.iter().any(|r| r == c))?;
        self.row_ids.iter().position(|r| *r == id)
    }

    /// Same ids on both axes and bit-identical values.
    pub fn same_content(&self, other: &RatingsMatrix) -> bool {
        if self.row_ids != other.row_ids || self.col_ids != other.col_ids {
            return false;
        }
        let (n, f) = self.values.shape();
        (0..n).all(|i| {
            (0..f).all(|j| self.values.get((i, j)).to_bits() == other.values.get((i, j)).to_bits())
        })
    }

    /// Hash of the identifiers and the exact bit patterns of every value.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.row_ids.hash(&mut hasher);
        self.col_ids.hash(&mut hasher);
        let (n, f) = self.values.shape();
        for i in 0..n {
            for j in 0..f {
                self.values.get((i, j)).to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

fn parse_record(record: &StringRecord, col_ids: &[String]) -> Result<(String, Vec<f64>), LoadError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let id = match record.get(0) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => return Err(LoadError::MissingId { line }),
    };

    let found = record.len() - 1;
    if found != col_ids.len() {
        return Err(LoadError::RaggedRow {
            row: id,
            expected: col_ids.len(),
            found,
        });
    }

    let mut row = Vec::with_capacity(col_ids.len());
    for (cell, col) in record.iter().skip(1).zip(col_ids) {
        // empty cells are unrated pairs
        if cell.is_empty() {
            row.push(0.0);
            continue;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => row.push(v),
            _ => {
                return Err(LoadError::NonNumeric {
                    row: id,
                    column: col.clone(),
                    value: cell.to_string(),
                })
            }
        }
    }
    Ok((id, row))
}

fn ensure_unique(ids: &[String], axis: Axis) -> Result<(), LoadError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for (index, id) in ids.iter().enumerate() {
        if id.is_empty() {
            return Err(LoadError::EmptyId { axis, index });
        }
        if !seen.insert(id.as_str()) {
            return Err(LoadError::DuplicateId {
                axis,
                id: id.clone(),
            });
        }
    }
    Ok(())
}
