//! Diagonal Gaussian posterior used by the variational models.

use burn::prelude::*;
use burn::tensor::Distribution;

/// Latent posterior `N(mean, diag(exp(log_var)))` over a batch.
///
/// Both tensors have shape `[batch, latent_dim]`.
#[derive(Debug, Clone)]
pub struct DiagonalGaussian<B: Backend> {
    pub mean: Tensor<B, 2>,
    pub log_var: Tensor<B, 2>,
}

impl<B: Backend> DiagonalGaussian<B> {
    /// Builds the posterior, clamping log-variance to `[-30, 20]` so the
    /// `exp` stays finite in low precision.
    pub fn new(mean: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Self {
        let log_var = log_var.clamp(-30.0, 20.0);
        Self { mean, log_var }
    }

    /// Reparameterized draw: `mean + std * eps` with `eps ~ N(0, 1)`.
    pub fn sample(&self) -> Tensor<B, 2> {
        let std = (self.log_var.clone() * 0.5).exp();
        let noise = Tensor::random(
            self.mean.shape(),
            Distribution::Normal(0.0, 1.0),
            &self.mean.device(),
        );
        self.mean.clone() + std * noise
    }

    /// KL divergence to the standard normal prior: per-sample sum over
    /// latent dimensions, averaged over the batch.
    pub fn kl(&self) -> Tensor<B, 1> {
        let var = self.log_var.clone().exp();
        let mean_sq = self.mean.clone() * self.mean.clone();
        ((var + mean_sq - self.log_var.clone() - 1.0) * 0.5)
            .sum_dim(1)
            .mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn kl_of_standard_normal_is_zero() {
        let device = Default::default();
        let posterior = DiagonalGaussian::new(
            Tensor::<TestBackend, 2>::zeros([4, 8], &device),
            Tensor::<TestBackend, 2>::zeros([4, 8], &device),
        );

        let kl: f32 = posterior.kl().into_scalar();
        assert!(kl.abs() < 1e-6);
    }

    #[test]
    fn kl_is_positive_for_shifted_posterior() {
        let device = Default::default();
        let posterior = DiagonalGaussian::new(
            Tensor::<TestBackend, 2>::ones([4, 8], &device),
            Tensor::<TestBackend, 2>::ones([4, 8], &device) * 0.5,
        );

        let kl: f32 = posterior.kl().into_scalar();
        assert!(kl > 0.0);
    }

    #[test]
    fn sample_has_posterior_shape() {
        let device = Default::default();
        let posterior = DiagonalGaussian::new(
            Tensor::<TestBackend, 2>::zeros([3, 16], &device),
            Tensor::<TestBackend, 2>::zeros([3, 16], &device),
        );

        assert_eq!(posterior.sample().dims(), [3, 16]);
    }

    #[test]
    fn log_var_is_clamped() {
        let device = Default::default();
        let posterior = DiagonalGaussian::new(
            Tensor::<TestBackend, 2>::zeros([1, 2], &device),
            Tensor::<TestBackend, 2>::from_floats([[-100.0, 100.0]], &device),
        );

        let log_var: Vec<f32> = posterior.log_var.into_data().to_vec().unwrap();
        assert_eq!(log_var, vec![-30.0, 20.0]);
    }
}
