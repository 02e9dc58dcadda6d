//! Adam: per-parameter adaptive learning rates with bias-corrected moment
//! estimates.
//!
//! State is kept per parameter tensor in the order the tensors are passed to
//! `step`; callers must pass them in the same order on every step.

use log::trace;

pub const DEFAULT_BETA1: f64 = 0.9;
pub const DEFAULT_BETA2: f64 = 0.999;
pub const DEFAULT_EPS: f64 = 1e-8;

#[derive(Clone, Debug)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    step: u64,
    first_moment: Vec<Vec<f64>>,
    second_moment: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            eps: DEFAULT_EPS,
            step: 0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
        }
    }

    pub fn steps_taken(&self) -> u64 {
        self.step
    }

    /// Apply one update to every tensor in `params` using the matching
    /// gradient in `grads`.
    ///
    /// # Panics
    ///
    /// Panics if the tensor count or any tensor length differs from `grads`,
    /// or from what earlier steps saw.
    pub fn step(&mut self, params: &mut [&mut Vec<f64>], grads: &[Vec<f64>]) {
        assert_eq!(params.len(), grads.len(), "parameter/gradient count mismatch");
        if self.first_moment.is_empty() {
            self.first_moment = grads.iter().map(|g| vec![0.0; g.len()]).collect();
            self.second_moment = grads.iter().map(|g| vec![0.0; g.len()]).collect();
        }
        assert_eq!(
            self.first_moment.len(),
            grads.len(),
            "optimizer state built for a different parameter set"
        );

        self.step += 1;
        let t = self.step as i32;
        let bias1 = 1.0 - self.beta1.powi(t);
        let bias2 = 1.0 - self.beta2.powi(t);
        let step_size = self.learning_rate / bias1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.eps);

        for (((param, grad), m), v) in params
            .iter_mut()
            .zip(grads)
            .zip(self.first_moment.iter_mut())
            .zip(self.second_moment.iter_mut())
        {
            assert_eq!(param.len(), grad.len(), "Dimension mismatch");
            for (((p, &g), m_i), v_i) in param
                .iter_mut()
                .zip(grad.iter())
                .zip(m.iter_mut())
                .zip(v.iter_mut())
            {
                *m_i = b1 * *m_i + (1.0 - b1) * g;
                *v_i = b2 * *v_i + (1.0 - b2) * g * g;
                let denom = (*v_i / bias2).sqrt() + eps;
                *p -= step_size * *m_i / denom;
            }
        }
        trace!("Adam step {} applied to {} tensors", self.step, grads.len());
    }
}
