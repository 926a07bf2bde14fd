//! Vector-quantized VAE.
//!
//! The encoder projects each image onto `slots` latent vectors, each
//! snapped to its nearest codebook row (<https://arxiv.org/abs/1711.00937>).
//! Sampling draws uniform random codes and decodes them.

use burn::module::Ignored;
use burn::nn::conv::{Conv2d, ConvTranspose2d};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;
use burn::tensor::{Distribution, Int};

use burn_vae_core::{ReconLoss, VectorQuantizer};

use crate::conv::{build_decoder_convs, build_encoder_convs};
use crate::{LatentModel, LossTerms};

/// Configuration for [`VqVae`].
#[derive(Debug, Clone)]
pub struct VqVaeConfig {
    /// Input image size `[height, width]`.
    pub input_size: [usize; 2],
    pub encoder_filters: Vec<usize>,
    pub encoder_kernels: Vec<usize>,
    pub encoder_strides: Vec<usize>,
    /// Dense layers between the conv stack and the latent projection.
    pub encoder_units: Vec<usize>,
    /// Dense layers between the quantized latent and the transposed-conv
    /// stack.
    pub decoder_units: Vec<usize>,
    pub decoder_filters: Vec<usize>,
    pub decoder_kernels: Vec<usize>,
    pub decoder_strides: Vec<usize>,
    /// Number of quantized latent vectors per image.
    pub slots: usize,
    /// Codebook size.
    pub num_codes: usize,
    /// Width of each codebook row.
    pub code_dim: usize,
    /// Reconstruction objective.
    pub recon_loss: ReconLoss,
    /// Weight on the codebook loss.
    pub codebook_weight: f64,
    /// Weight on the commitment loss.
    pub commitment_weight: f64,
}

impl Default for VqVaeConfig {
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
            slots: 8,
            num_codes: 64,
            code_dim: 32,
            recon_loss: ReconLoss::SigmoidCrossEntropy,
            codebook_weight: 1.0,
            commitment_weight: 0.25,
        }
    }
}

impl VqVaeConfig {
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_num_codes(mut self, num_codes: usize) -> Self {
        self.num_codes = num_codes;
        self
    }

    pub fn with_code_dim(mut self, code_dim: usize) -> Self {
        self.code_dim = code_dim;
        self
    }

    pub fn with_commitment_weight(mut self, commitment_weight: f64) -> Self {
        self.commitment_weight = commitment_weight;
        self
    }

    /// Initializes the model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> VqVae<B> {
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
        let projection = LinearConfig::new(width, self.slots * self.code_dim).init(device);

        let quantizer = VectorQuantizer::new(self.num_codes, self.code_dim, device);

        let mut decoder_fcs = Vec::new();
        let mut width = self.slots * self.code_dim;
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

        VqVae {
            encoder_convs,
            encoder_fcs,
            projection,
            quantizer,
            decoder_fcs,
            decoder_convs,
            seed_channels,
            slots: self.slots,
            num_codes: self.num_codes,
            recon_loss: Ignored(self.recon_loss),
            codebook_weight: self.codebook_weight,
            commitment_weight: self.commitment_weight,
        }
    }
}

/// Vector-quantized VAE over grayscale images.
#[derive(Module, Debug)]
pub struct VqVae<B: Backend> {
    encoder_convs: Vec<Conv2d<B>>,
    encoder_fcs: Vec<Linear<B>>,
    projection: Linear<B>,
    quantizer: VectorQuantizer<B>,
    decoder_fcs: Vec<Linear<B>>,
    decoder_convs: Vec<ConvTranspose2d<B>>,
    seed_channels: usize,
    slots: usize,
    num_codes: usize,
    recon_loss: Ignored<ReconLoss>,
    codebook_weight: f64,
    commitment_weight: f64,
}

impl<B: Backend> VqVae<B> {
    /// Unquantized latent vectors, `[batch, slots, code_dim]`.
    pub fn encode(&self, images: Tensor<B, 3>) -> Tensor<B, 3> {
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

        let z_e = relu(self.projection.forward(flat));
        let dim = self.quantizer.code_dim();
        z_e.reshape([batch, self.slots, dim])
    }

    /// Codebook indices for a batch of images, `[batch, slots]`.
    pub fn codes(&self, images: Tensor<B, 3>) -> Tensor<B, 2, Int> {
        self.quantizer.quantize(self.encode(images)).codes
    }

    /// Decoder logits from latents `[batch, slots, code_dim]`.
    pub fn decode(&self, latents: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, slots, dim] = latents.dims();
        let mut h = latents.reshape([batch, slots * dim]);
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

    /// Decodes integer codes `[batch, slots]` into images.
    pub fn decode_codes(&self, codes: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let latents = self.quantizer.lookup(codes);
        self.recon_loss.to_output(self.decode(latents))
    }

    fn flatten(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        images.reshape([batch, height * width])
    }
}

impl<B: Backend> LatentModel<B> for VqVae<B> {
    fn loss(&self, images: Tensor<B, 3>) -> LossTerms<B> {
        let [_, height, width] = images.dims();
        let quantized = self.quantizer.quantize(self.encode(images.clone()));
        let logits = self.decode(quantized.latents);

        // Per-pixel mean reconstruction, as is usual for this objective.
        let reconstruction = self
            .recon_loss
            .batch_loss(self.flatten(logits), self.flatten(images))
            / (height * width) as f64;

        let regularizer = quantized.codebook_loss * self.codebook_weight
            + quantized.commitment_loss * self.commitment_weight;
        let total = reconstruction.clone() + regularizer.clone();

        LossTerms {
            total,
            reconstruction,
            regularizer,
        }
    }

    fn sample(&self, count: usize, device: &B::Device) -> Tensor<B, 3> {
        let codes = Tensor::<B, 2>::random(
            [count, self.slots],
            Distribution::Uniform(0.0, self.num_codes as f64),
            device,
        )
        .int();
        self.decode_codes(codes)
    }

    fn reconstruct(&self, images: Tensor<B, 3>) -> Tensor<B, 3> {
        let quantized = self.quantizer.quantize(self.encode(images));
        self.recon_loss.to_output(self.decode(quantized.latents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn codes_are_within_the_codebook() {
        let device = Default::default();
        let model = VqVaeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let codes: Vec<i64> = model.codes(images).into_data().to_vec().unwrap();
        assert_eq!(codes.len(), 2 * 8);
        assert!(codes.iter().all(|&c| (0..64).contains(&c)));
    }

    #[test]
    fn loss_terms_are_finite() {
        let device = Default::default();
        let model = VqVaeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let terms = model.loss(images);
        let total: f32 = terms.total.into_scalar();
        let reg: f32 = terms.regularizer.into_scalar();
        assert!(total.is_finite());
        assert!(reg >= 0.0);
    }

    #[test]
    fn sample_decodes_random_codes() {
        let device = Default::default();
        let model = VqVaeConfig::default().init::<TestBackend>(&device);

        assert_eq!(model.sample(4, &device).dims(), [4, 28, 28]);
    }

    #[test]
    fn decode_codes_round_trips() {
        let device = Default::default();
        let model = VqVaeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let codes = model.codes(images);
        assert_eq!(model.decode_codes(codes).dims(), [2, 28, 28]);
    }
}
