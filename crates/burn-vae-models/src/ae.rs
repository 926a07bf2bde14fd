//! Plain convolutional autoencoder.
//!
//! The non-variational baseline: same topology as the convolutional VAE
//! with a deterministic linear middle and a reconstruction-only loss.
//! Sampling feeds standard-normal latents straight to the decoder.

use burn::module::Ignored;
use burn::nn::conv::{Conv2d, ConvTranspose2d};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::Distribution;
use burn::tensor::activation::relu;

use burn_vae_core::ReconLoss;

use crate::conv::{build_decoder_convs, build_encoder_convs};
use crate::{LatentModel, LossTerms};

/// Configuration for [`ConvAe`].
#[derive(Debug, Clone)]
pub struct ConvAeConfig {
    /// Input image size `[height, width]`.
    pub input_size: [usize; 2],
    pub encoder_filters: Vec<usize>,
    pub encoder_kernels: Vec<usize>,
    pub encoder_strides: Vec<usize>,
    /// Dense layers between the conv stack and the latent layer.
    pub encoder_units: Vec<usize>,
    /// Dense layers between the latent and the transposed-conv stack.
    pub decoder_units: Vec<usize>,
    pub decoder_filters: Vec<usize>,
    pub decoder_kernels: Vec<usize>,
    pub decoder_strides: Vec<usize>,
    /// Latent dimensionality.
    pub latent_dim: usize,
    /// Reconstruction objective.
    pub recon_loss: ReconLoss,
}

impl Default for ConvAeConfig {
    fn default() -> Self {
        Self {
            input_size: [28, 28],
            encoder_filters: vec![16, 32, 64, 128],
            encoder_kernels: vec![4, 4, 4, 4],
            encoder_strides: vec![2, 2, 2, 1],
            encoder_units: vec![],
            decoder_units: vec![512],
            decoder_filters: vec![64, 32, 16, 1],
            decoder_kernels: vec![4, 5, 5, 4],
            decoder_strides: vec![2, 2, 2, 1],
            latent_dim: 32,
            recon_loss: ReconLoss::SigmoidCrossEntropy,
        }
    }
}

impl ConvAeConfig {
    pub fn with_latent_dim(mut self, latent_dim: usize) -> Self {
        self.latent_dim = latent_dim;
        self
    }

    pub fn with_recon_loss(mut self, recon_loss: ReconLoss) -> Self {
        self.recon_loss = recon_loss;
        self
    }

    /// Initializes the model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvAe<B> {
        assert_eq!(self.encoder_filters.len(), self.encoder_kernels.len());
        assert_eq!(self.encoder_filters.len(), self.encoder_strides.len());
        assert_eq!(self.decoder_filters.len(), self.decoder_kernels.len());
        assert_eq!(self.decoder_filters.len(), self.decoder_strides.len());
        assert!(!self.decoder_units.is_empty());

        let (encoder_convs, flat) = build_encoder_convs(
            &self.encoder_filters,
            &self.encoder_kernels,
            &self.encoder_strides,
            self.input_size,
            device,
        );

        let mut encoder_fcs = Vec::new();
        let mut width = flat;
        for &units in &self.encoder_units {
            encoder_fcs.push(LinearConfig::new(width, units).init(device));
            width = units;
        }
        // No activation on the latent layer.
        let latent = LinearConfig::new(width, self.latent_dim).init(device);

        let mut decoder_fcs = Vec::new();
        let mut width = self.latent_dim;
        for &units in &self.decoder_units {
            decoder_fcs.push(LinearConfig::new(width, units).init(device));
            width = units;
        }
        let seed_channels = width;

        let decoder_convs = build_decoder_convs(
            seed_channels,
            &self.decoder_filters,
            &self.decoder_kernels,
            &self.decoder_strides,
            self.input_size,
            device,
        );

        ConvAe {
            encoder_convs,
            encoder_fcs,
            latent,
            decoder_fcs,
            decoder_convs,
            seed_channels,
            latent_dim: self.latent_dim,
            recon_loss: Ignored(self.recon_loss),
        }
    }
}

/// Convolutional autoencoder over grayscale images.
#[derive(Module, Debug)]
pub struct ConvAe<B: Backend> {
    encoder_convs: Vec<Conv2d<B>>,
    encoder_fcs: Vec<Linear<B>>,
    latent: Linear<B>,
    decoder_fcs: Vec<Linear<B>>,
    decoder_convs: Vec<ConvTranspose2d<B>>,
    seed_channels: usize,
    latent_dim: usize,
    recon_loss: Ignored<ReconLoss>,
}

impl<B: Backend> ConvAe<B> {
    /// Latent codes for a batch of images, `[batch, latent_dim]`.
    pub fn encode(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        let mut x = images.reshape([batch, 1, height, width]);
        for conv in &self.encoder_convs {
            x = relu(conv.forward(x));
        }

        let [batch, channels, height, width] = x.dims();
        let mut flat = x.reshape([batch, channels * height * width]);
        for layer in &self.encoder_fcs {
            flat = relu(layer.forward(flat));
        }
        self.latent.forward(flat)
    }

    /// Decoder logits, `[batch, height, width]`.
    pub fn decode(&self, z: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, _] = z.dims();
        let mut h = z;
        for layer in &self.decoder_fcs {
            h = relu(layer.forward(h));
        }

        let mut x = h.reshape([batch, self.seed_channels, 1, 1]);
        let last = self.decoder_convs.len() - 1;
        for (idx, conv) in self.decoder_convs.iter().enumerate() {
            x = conv.forward(x);
            if idx != last {
                x = relu(x);
            }
        }

        let [batch, _, height, width] = x.dims();
        x.reshape([batch, height, width])
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    fn flatten(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        images.reshape([batch, height * width])
    }
}

impl<B: Backend> LatentModel<B> for ConvAe<B> {
    fn loss(&self, images: Tensor<B, 3>) -> LossTerms<B> {
        let logits = self.decode(self.encode(images.clone()));
        let reconstruction = self
            .recon_loss
            .batch_loss(self.flatten(logits), self.flatten(images));

        LossTerms {
            total: reconstruction.clone(),
            regularizer: reconstruction.zeros_like(),
            reconstruction,
        }
    }

    fn sample(&self, count: usize, device: &B::Device) -> Tensor<B, 3> {
        let z = Tensor::random(
            [count, self.latent_dim],
            Distribution::Normal(0.0, 1.0),
            device,
        );
        self.recon_loss.to_output(self.decode(z))
    }

    fn reconstruct(&self, images: Tensor<B, 3>) -> Tensor<B, 3> {
        self.recon_loss.to_output(self.decode(self.encode(images)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn regularizer_is_zero() {
        let device = Default::default();
        let model = ConvAeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let terms = model.loss(images);
        let reg: f32 = terms.regularizer.into_scalar();
        let total: f32 = terms.total.into_scalar();
        let recon: f32 = terms.reconstruction.into_scalar();

        assert_eq!(reg, 0.0);
        assert_eq!(total, recon);
    }

    #[test]
    fn encode_decode_shapes() {
        let device = Default::default();
        let model = ConvAeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let codes = model.encode(images);
        assert_eq!(codes.dims(), [2, 32]);
        assert_eq!(model.decode(codes).dims(), [2, 28, 28]);
    }
}
