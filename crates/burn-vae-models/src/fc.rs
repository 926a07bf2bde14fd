//! Fully-connected VAE over flattened images.

use burn::module::Ignored;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::Distribution;
use burn::tensor::activation::relu;

use burn_vae_core::{DiagonalGaussian, ReconLoss};

use crate::{LatentModel, LossTerms};

/// Configuration for [`FcVae`].
#[derive(Debug, Clone)]
pub struct FcVaeConfig {
    /// Input image size `[height, width]`; the model works on the
    /// flattened pixels.
    pub input_size: [usize; 2],
    /// Hidden widths of the encoder stack.
    pub encoder_units: Vec<usize>,
    /// Hidden widths of the decoder stack.
    pub decoder_units: Vec<usize>,
    /// Latent dimensionality.
    pub latent_dim: usize,
    /// Reconstruction objective.
    pub recon_loss: ReconLoss,
    /// Weight on the KL term.
    pub beta: f64,
}

impl Default for FcVaeConfig {
    fn default() -> Self {
        Self {
            input_size: [28, 28],
            encoder_units: vec![512, 256],
            decoder_units: vec![256, 512],
            latent_dim: 32,
            recon_loss: ReconLoss::SigmoidCrossEntropy,
            beta: 1.0,
        }
    }
}

impl FcVaeConfig {
    pub fn with_latent_dim(mut self, latent_dim: usize) -> Self {
        self.latent_dim = latent_dim;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_recon_loss(mut self, recon_loss: ReconLoss) -> Self {
        self.recon_loss = recon_loss;
        self
    }

    /// Initializes the model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FcVae<B> {
        let flat = self.input_size[0] * self.input_size[1];

        let mut encoder = Vec::new();
        let mut width = flat;
        for &units in &self.encoder_units {
            encoder.push(LinearConfig::new(width, units).init(device));
            width = units;
        }
        let mean = LinearConfig::new(width, self.latent_dim).init(device);
        let log_var = LinearConfig::new(width, self.latent_dim).init(device);

        let mut decoder = Vec::new();
        width = self.latent_dim;
        for &units in &self.decoder_units {
            decoder.push(LinearConfig::new(width, units).init(device));
            width = units;
        }
        let output = LinearConfig::new(width, flat).init(device);

        FcVae {
            encoder,
            mean,
            log_var,
            decoder,
            output,
            height: self.input_size[0],
            width: self.input_size[1],
            latent_dim: self.latent_dim,
            recon_loss: Ignored(self.recon_loss),
            beta: self.beta,
        }
    }
}

/// Fully-connected VAE: ReLU dense stacks around a Gaussian latent.
#[derive(Module, Debug)]
pub struct FcVae<B: Backend> {
    encoder: Vec<Linear<B>>,
    mean: Linear<B>,
    log_var: Linear<B>,
    decoder: Vec<Linear<B>>,
    output: Linear<B>,
    height: usize,
    width: usize,
    latent_dim: usize,
    recon_loss: Ignored<ReconLoss>,
    beta: f64,
}

impl<B: Backend> FcVae<B> {
    /// Posterior over latents for flattened inputs `[batch, pixels]`.
    pub fn encode(&self, x: Tensor<B, 2>) -> DiagonalGaussian<B> {
        let mut h = x;
        for layer in &self.encoder {
            h = relu(layer.forward(h));
        }
        DiagonalGaussian::new(self.mean.forward(h.clone()), self.log_var.forward(h))
    }

    /// Decoder logits for a batch of latents, `[batch, pixels]`.
    pub fn decode(&self, z: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut h = z;
        for layer in &self.decoder {
            h = relu(layer.forward(h));
        }
        self.output.forward(h)
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    fn flatten(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        images.reshape([batch, height * width])
    }

    fn to_images(&self, logits: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, _] = logits.dims();
        self.recon_loss
            .to_output(logits)
            .reshape([batch, self.height, self.width])
    }
}

impl<B: Backend> LatentModel<B> for FcVae<B> {
    fn loss(&self, images: Tensor<B, 3>) -> LossTerms<B> {
        let x = self.flatten(images);
        let posterior = self.encode(x.clone());
        let logits = self.decode(posterior.sample());

        let reconstruction = self.recon_loss.batch_loss(logits, x);
        let kl = posterior.kl() * self.beta;
        let total = reconstruction.clone() + kl.clone();

        LossTerms {
            total,
            reconstruction,
            regularizer: kl,
        }
    }

    fn sample(&self, count: usize, device: &B::Device) -> Tensor<B, 3> {
        let z = Tensor::random(
            [count, self.latent_dim],
            Distribution::Normal(0.0, 1.0),
            device,
        );
        self.to_images(self.decode(z))
    }

    fn reconstruct(&self, images: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.flatten(images);
        let posterior = self.encode(x);
        self.to_images(self.decode(posterior.mean))
    }
}
