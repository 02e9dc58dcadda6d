//! Per-column min-max scaling.
//!
//! Each column is mapped affinely onto `feature_range` using the minimum and
//! maximum observed in the matrix the scaler was fit on. A column with zero
//! range is treated as having range 1, so its values collapse to the lower
//! bound instead of dividing by zero.

use log::{debug, trace};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

#[derive(Clone, Debug)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::with_range(0.0, 1.0)
    }
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `lo >= hi`.
    pub fn with_range(lo: f64, hi: f64) -> Self {
        assert!(lo < hi, "feature range must satisfy lo < hi");
        Self {
            feature_range: (lo, hi),
            data_min: Vec::new(),
            data_max: Vec::new(),
        }
    }

    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    pub fn is_fitted(&self) -> bool {
        !self.data_min.is_empty()
    }

    /// Record per-column minima and maxima.
    pub fn fit(&mut self, data: &DenseMatrix<f64>) -> &mut Self {
        let (n, f) = data.shape();
        let mut mins = vec![f64::INFINITY; f];
        let mut maxs = vec![f64::NEG_INFINITY; f];
        for i in 0..n {
            for j in 0..f {
                let v = *data.get((i, j));
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
        debug!("MinMaxScaler fit on {} rows x {} columns", n, f);
        trace!("column minima {:?}, maxima {:?}", mins, maxs);
        self.data_min = mins;
        self.data_max = maxs;
        self
    }

    pub fn transform(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (scale, offset) = self.coefficients();
        self.map_columns(data, |j, v| v * scale[j] + offset[j])
    }

    pub fn fit_transform(&mut self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        self.fit(data);
        self.transform(data)
    }

    /// Undo `transform`. Values from zero-range columns come back as that
    /// column's constant.
    pub fn inverse_transform(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (scale, offset) = self.coefficients();
        self.map_columns(data, |j, v| (v - offset[j]) / scale[j])
    }

    fn coefficients(&self) -> (Vec<f64>, Vec<f64>) {
        assert!(self.is_fitted(), "MinMaxScaler used before fit");
        let (lo, hi) = self.feature_range;
        let scale: Vec<f64> = self
            .data_min
            .iter()
            .zip(&self.data_max)
            .map(|(&mn, &mx)| {
                let range = mx - mn;
                let range = if range == 0.0 { 1.0 } else { range };
                (hi - lo) / range
            })
            .collect();
        let offset: Vec<f64> = self
            .data_min
            .iter()
            .zip(&scale)
            .map(|(&mn, &s)| lo - mn * s)
            .collect();
        (scale, offset)
    }

    fn map_columns<F>(&self, data: &DenseMatrix<f64>, op: F) -> DenseMatrix<f64>
    where
        F: Fn(usize, f64) -> f64,
    {
        let (n, f) = data.shape();
        assert_eq!(
            f,
            self.data_min.len(),
            "Dimension mismatch: scaler fit on {} columns",
            self.data_min.len()
        );
        let flat: Vec<f64> = (0..n)
            .flat_map(|i| (0..f).map(move |j| (i, j)))
            .map(|(i, j)| op(j, *data.get((i, j))))
            .collect();
        DenseMatrix::from_iterator(flat.into_iter(), n, f, 0)
    }
}
