//! Generative model zoo over grayscale images.
//!
//! Four architectures share one training interface: a fully-connected
//! VAE ([`FcVae`]), a convolutional VAE ([`ConvVae`]), a plain
//! convolutional autoencoder ([`ConvAe`]), and a vector-quantized VAE
//! ([`VqVae`]). Each is built from a config struct carrying the layer
//! schedule, in the spirit of the architectures described in
//! <https://arxiv.org/abs/1803.10122> and <https://arxiv.org/abs/1711.00937>.

pub mod ae;
pub mod conv;
pub mod fc;
pub mod vq;

pub use ae::{ConvAe, ConvAeConfig};
pub use conv::{ConvVae, ConvVaeConfig};
pub use fc::{FcVae, FcVaeConfig};
pub use vq::{VqVae, VqVaeConfig};

use burn::prelude::*;

/// Loss breakdown reported by every model.
#[derive(Debug, Clone)]
pub struct LossTerms<B: Backend> {
    /// Objective minimized by the optimizer.
    pub total: Tensor<B, 1>,
    /// Reconstruction term.
    pub reconstruction: Tensor<B, 1>,
    /// Latent regularizer: weighted KL divergence for the variational
    /// models, codebook + commitment for the VQ-VAE, zero for the plain
    /// autoencoder.
    pub regularizer: Tensor<B, 1>,
}

/// Unified interface over the model zoo.
///
/// Images are grayscale `[batch, height, width]` tensors in `[0, 1]`.
pub trait LatentModel<B: Backend> {
    /// Training objective for a batch of images.
    fn loss(&self, images: Tensor<B, 3>) -> LossTerms<B>;

    /// Decode draws from the model's prior into image space.
    fn sample(&self, count: usize, device: &B::Device) -> Tensor<B, 3>;

    /// Encode then decode a batch of images.
    fn reconstruct(&self, images: Tensor<B, 3>) -> Tensor<B, 3>;
}
