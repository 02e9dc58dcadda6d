//! # Bottleneck autoencoder for drug rating vectors
//!
//! The model reproduces each drug's scaled rating vector through a narrow
//! latent layer; the latent vectors are the drug embeddings compared by the
//! similarity table.
//!
//! ```text
//! encoder: input ─Linear→ hidden ─ReLU→ ─Linear→ latent
//! decoder: latent ─Linear→ hidden ─ReLU→ ─Linear→ input
//! ```
//!
//! Training is full-batch: every pass runs the whole matrix forward, takes the
//! mean squared reconstruction error over all cells, backpropagates it through
//! the four layers and applies one Adam update. The pass count is the only
//! stopping criterion.
//!
//! Weights and biases start uniform in `[-1/√fan_in, 1/√fan_in]`, drawn from a
//! `ChaCha8Rng` seeded from the config, so a fixed seed gives a reproducible
//! model.
//!
//! # Examples
//!
//! ```
//! use drugspace::autoencoder::{Autoencoder, AutoencoderConfig};
//! use drugspace::operators::from_row_major;
//!
//! let data = from_row_major(vec![0.0, 1.0, 0.5, 1.0, 0.0, 0.25], 2, 3);
//! let config = AutoencoderConfig::for_input_width(3).with_seed(7).with_passes(5);
//! let mut model = Autoencoder::new(config).unwrap();
//! let report = model.fit(&data);
//! assert_eq!(report.losses.len(), 5);
//! ```

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::errors::ConfigError;
use crate::operators::{
    column_sums, from_row_major, matmul, matmul_a_bt, matmul_at_b, mean_squared_error,
    to_row_major,
};
use crate::optimizer::Adam;

pub const DEFAULT_HIDDEN_WIDTH: usize = 128;
pub const DEFAULT_LATENT_WIDTH: usize = 64;
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
pub const DEFAULT_NUM_PASSES: usize = 50;
pub const DEFAULT_REPORT_EVERY: usize = 10;

/// Shape and optimisation settings of one autoencoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoencoderConfig {
    pub input_width: usize,
    pub hidden_width: usize,
    pub latent_width: usize,
    pub learning_rate: f64,
    pub num_passes: usize,
    /// `None` draws a fresh seed at construction.
    pub seed: Option<u64>,
    /// Log the loss every this many passes; 0 disables progress logging.
    pub report_every: usize,
}

impl AutoencoderConfig {
    /// Defaults for an input of `input_width` columns. The latent width is
    /// capped below the input width so narrow tables still compress.
    pub fn for_input_width(input_width: usize) -> Self {
        Self {
            input_width,
            hidden_width: DEFAULT_HIDDEN_WIDTH,
            latent_width: DEFAULT_LATENT_WIDTH.min(input_width.saturating_sub(1)),
            learning_rate: DEFAULT_LEARNING_RATE,
            num_passes: DEFAULT_NUM_PASSES,
            seed: None,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_passes(mut self, num_passes: usize) -> Self {
        self.num_passes = num_passes;
        self
    }

    /// Shape and learning-rate checks. The pass count is not checked: zero
    /// passes is a valid request for the freshly initialised model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_width < 2 {
            return Err(ConfigError::InputTooNarrow(self.input_width));
        }
        if self.hidden_width == 0 {
            return Err(ConfigError::ZeroWidth("hidden"));
        }
        if self.latent_width == 0 {
            return Err(ConfigError::ZeroWidth("latent"));
        }
        if self.latent_width >= self.input_width {
            return Err(ConfigError::LatentNotSmaller {
                latent: self.latent_width,
                input: self.input_width,
            });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        Ok(())
    }
}

/// Fully connected layer `y = x Wᵀ + b` with `W` stored `out × in`.
#[derive(Clone, Debug)]
pub struct Linear {
    pub in_features: usize,
    pub out_features: usize,
    pub weight: Vec<f64>,
    pub bias: Vec<f64>,
}

struct LinearGrads {
    weight: Vec<f64>,
    bias: Vec<f64>,
    input: Vec<f64>,
}

impl Linear {
    fn new<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features as f64).sqrt();
        let weight = (0..in_features * out_features)
            .map(|_| rng.random_range(-bound..bound))
            .collect();
        let bias = (0..out_features)
            .map(|_| rng.random_range(-bound..bound))
            .collect();
        Self {
            in_features,
            out_features,
            weight,
            bias,
        }
    }

    /// `x` is `n × in_features`, row-major.
    pub fn forward(&self, x: &[f64], n: usize) -> Vec<f64> {
        let mut out = matmul_a_bt(x, &self.weight, n, self.in_features, self.out_features);
        for row in out.chunks_mut(self.out_features) {
            row.iter_mut().zip(&self.bias).for_each(|(o, b)| *o += b);
        }
        out
    }

    fn backward(&self, x: &[f64], grad_out: &[f64], n: usize) -> LinearGrads {
        LinearGrads {
            weight: matmul_at_b(grad_out, x, n, self.out_features, self.in_features),
            bias: column_sums(grad_out, n, self.out_features),
            input: matmul(grad_out, &self.weight, n, self.out_features, self.in_features),
        }
    }
}

fn relu(x: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| v.max(0.0)).collect()
}

/// Zero the gradient wherever the ReLU input was not positive.
fn relu_backward(grad: &mut [f64], pre_activation: &[f64]) {
    for (g, &z) in grad.iter_mut().zip(pre_activation) {
        if z <= 0.0 {
            *g = 0.0;
        }
    }
}

/// Intermediate activations kept for backpropagation.
struct ForwardPass {
    hidden_pre: Vec<f64>,
    hidden: Vec<f64>,
    latent: Vec<f64>,
    expand_pre: Vec<f64>,
    expand: Vec<f64>,
    output: Vec<f64>,
}

/// Loss history of one `fit` call.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    /// Reconstruction MSE of the freshly initialised model.
    pub initial_loss: f64,
    /// Loss computed during each pass, before that pass's update.
    pub losses: Vec<f64>,
    /// Reconstruction MSE after the last update.
    pub final_loss: f64,
    pub seed: u64,
}

#[derive(Clone, Debug)]
pub struct Autoencoder {
    config: AutoencoderConfig,
    seed: u64,
    encoder_hidden: Linear,
    encoder_latent: Linear,
    decoder_hidden: Linear,
    decoder_output: Linear,
}

impl Autoencoder {
    pub fn new(config: AutoencoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let (d, h, l) = (config.input_width, config.hidden_width, config.latent_width);
        info!(
            "Creating autoencoder {} -> {} -> {} -> {} -> {} (seed {})",
            d, h, l, h, d, seed
        );

        let encoder_hidden = Linear::new(d, h, &mut rng);
        let encoder_latent = Linear::new(h, l, &mut rng);
        let decoder_hidden = Linear::new(l, h, &mut rng);
        let decoder_output = Linear::new(h, d, &mut rng);

        Ok(Self {
            config,
            seed,
            encoder_hidden,
            encoder_latent,
            decoder_hidden,
            decoder_output,
        })
    }

    pub fn config(&self) -> &AutoencoderConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn latent_width(&self) -> usize {
        self.config.latent_width
    }

    fn forward(&self, x: &[f64], n: usize) -> ForwardPass {
        let hidden_pre = self.encoder_hidden.forward(x, n);
        let hidden = relu(&hidden_pre);
        let latent = self.encoder_latent.forward(&hidden, n);
        let expand_pre = self.decoder_hidden.forward(&latent, n);
        let expand = relu(&expand_pre);
        let output = self.decoder_output.forward(&expand, n);
        ForwardPass {
            hidden_pre,
            hidden,
            latent,
            expand_pre,
            expand,
            output,
        }
    }

    fn encode_flat(&self, x: &[f64], n: usize) -> Vec<f64> {
        let hidden = relu(&self.encoder_hidden.forward(x, n));
        self.encoder_latent.forward(&hidden, n)
    }

    fn decode_flat(&self, z: &[f64], n: usize) -> Vec<f64> {
        let expand = relu(&self.decoder_hidden.forward(z, n));
        self.decoder_output.forward(&expand, n)
    }

    fn check_width(&self, f: usize) {
        assert_eq!(
            f, self.config.input_width,
            "Dimension mismatch: model expects {} columns",
            self.config.input_width
        );
    }

    /// Latent embedding of every row, `n × latent_width`.
    pub fn encode(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (x, n, f) = to_row_major(data);
        self.check_width(f);
        let z = self.encode_flat(&x, n);
        from_row_major(z, n, self.config.latent_width)
    }

    /// Decoder output for every row, same shape as `data`.
    pub fn reconstruct(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (x, n, f) = to_row_major(data);
        self.check_width(f);
        let y = self.decode_flat(&self.encode_flat(&x, n), n);
        from_row_major(y, n, f)
    }

    pub fn reconstruction_loss(&self, data: &DenseMatrix<f64>) -> f64 {
        let (x, n, f) = to_row_major(data);
        self.check_width(f);
        let y = self.decode_flat(&self.encode_flat(&x, n), n);
        mean_squared_error(&y, &x)
    }

    /// Loss and parameter gradients in `parameters_mut` order.
    fn loss_and_gradients(&self, x: &[f64], n: usize) -> (f64, Vec<Vec<f64>>) {
        let pass = self.forward(x, n);
        let loss = mean_squared_error(&pass.output, x);

        let scale = 2.0 / x.len() as f64;
        let grad_output: Vec<f64> = pass
            .output
            .iter()
            .zip(x)
            .map(|(y, t)| scale * (y - t))
            .collect();

        let g4 = self.decoder_output.backward(&pass.expand, &grad_output, n);
        let mut grad_expand = g4.input;
        relu_backward(&mut grad_expand, &pass.expand_pre);

        let g3 = self.decoder_hidden.backward(&pass.latent, &grad_expand, n);
        let g2 = self.encoder_latent.backward(&pass.hidden, &g3.input, n);
        let mut grad_hidden = g2.input;
        relu_backward(&mut grad_hidden, &pass.hidden_pre);

        let g1 = self.encoder_hidden.backward(x, &grad_hidden, n);

        let grads = vec![
            g1.weight, g1.bias, g2.weight, g2.bias, g3.weight, g3.bias, g4.weight, g4.bias,
        ];
        (loss, grads)
    }

    fn parameters_mut(&mut self) -> Vec<&mut Vec<f64>> {
        vec![
            &mut self.encoder_hidden.weight,
            &mut self.encoder_hidden.bias,
            &mut self.encoder_latent.weight,
            &mut self.encoder_latent.bias,
            &mut self.decoder_hidden.weight,
            &mut self.decoder_hidden.bias,
            &mut self.decoder_output.weight,
            &mut self.decoder_output.bias,
        ]
    }

    /// Train in place for exactly `config.num_passes` full-batch passes.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not have `config.input_width` columns.
    pub fn fit(&mut self, data: &DenseMatrix<f64>) -> TrainingReport {
        let (x, n, f) = to_row_major(data);
        self.check_width(f);

        let passes = self.config.num_passes;
        let report_every = self.config.report_every;
        let mut optimizer = Adam::new(self.config.learning_rate);

        let initial_loss = self.reconstruction_loss(data);
        info!(
            "Training autoencoder on {} rows x {} columns for {} passes (lr {})",
            n, f, passes, self.config.learning_rate
        );
        debug!("Initial reconstruction loss: {:.6}", initial_loss);

        let mut losses = Vec::with_capacity(passes);
        for pass in 0..passes {
            let (loss, grads) = self.loss_and_gradients(&x, n);
            optimizer.step(&mut self.parameters_mut(), &grads);
            losses.push(loss);

            trace!("pass {} loss {:.8}", pass + 1, loss);
            if report_every > 0 && (pass + 1) % report_every == 0 {
                info!("Epoch [{}/{}], Loss: {:.4}", pass + 1, passes, loss);
            }
        }

        let final_loss = self.reconstruction_loss(data);
        info!(
            "Autoencoder training completed - initial loss: {:.6}, final loss: {:.6}",
            initial_loss, final_loss
        );

        TrainingReport {
            initial_loss,
            losses,
            final_loss,
            seed: self.seed,
        }
    }
}
