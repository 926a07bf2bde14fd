//! Reconstruction objectives shared by every model in the zoo.

use burn::prelude::*;
use burn::tensor::activation::{log_sigmoid, sigmoid};

/// Pixel-space reconstruction objective.
///
/// `SigmoidCrossEntropy` treats decoder outputs as logits over pixel
/// intensities in `[0, 1]`; `L2` compares logits to the target directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconLoss {
    SigmoidCrossEntropy,
    L2,
}

impl ReconLoss {
    /// Per-sample loss, summed over features. Shape `[batch, 1]`.
    pub fn per_sample<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        match self {
            ReconLoss::SigmoidCrossEntropy => {
                // -(t * log sigmoid(x) + (1 - t) * log sigmoid(-x)),
                // stable for large |x|.
                let ones = targets.ones_like();
                let loss = -(targets.clone() * log_sigmoid(logits.clone())
                    + (ones - targets) * log_sigmoid(-logits));
                loss.sum_dim(1)
            }
            ReconLoss::L2 => {
                let diff = logits - targets;
                (diff.clone() * diff).sum_dim(1)
            }
        }
    }

    /// Batch loss: per-sample sum over features, averaged over the batch.
    ///
    /// The sum reduction keeps the scale of the per-image evidence term,
    /// so it balances against a summed KL divergence.
    pub fn batch_loss<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        self.per_sample(logits, targets).mean()
    }

    /// Map decoder logits into pixel space.
    pub fn to_output<B: Backend, const D: usize>(&self, logits: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            ReconLoss::SigmoidCrossEntropy => sigmoid(logits),
            ReconLoss::L2 => logits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    #[test]
    fn l2_matches_manual_sum() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0], [0.0, -1.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0, 2.0], [1.0, 1.0]], &device);

        // Per-sample sums: 1.0 and 5.0, batch mean 3.0.
        let loss = scalar(ReconLoss::L2.batch_loss(logits, targets));
        assert!((loss - 3.0).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_cross_entropy_matches_naive_formula() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[0.5, -1.5, 2.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 0.25]], &device);

        let loss = scalar(ReconLoss::SigmoidCrossEntropy.batch_loss(logits.clone(), targets.clone()));

        let logits: Vec<f32> = logits.into_data().to_vec().unwrap();
        let targets: Vec<f32> = targets.into_data().to_vec().unwrap();
        let expected: f32 = logits
            .iter()
            .zip(&targets)
            .map(|(x, t)| {
                let p = 1.0 / (1.0 + (-x).exp());
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum();

        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn output_is_sigmoid_for_cross_entropy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 1>::from_floats([0.0], &device);

        let out: Vec<f32> = ReconLoss::SigmoidCrossEntropy
            .to_output(logits.clone())
            .into_data()
            .to_vec()
            .unwrap();
        assert!((out[0] - 0.5).abs() < 1e-6);

        let out: Vec<f32> = ReconLoss::L2.to_output(logits).into_data().to_vec().unwrap();
        assert_eq!(out[0], 0.0);
    }
}
