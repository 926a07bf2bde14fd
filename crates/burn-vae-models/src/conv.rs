//! Convolutional VAE.
//!
//! A ReLU conv stack compresses the image to a flat feature vector, a
//! Gaussian middle samples the latent, and a dense layer seeds a 1x1
//! feature map that transposed convolutions grow back to the input
//! resolution.

use burn::module::Ignored;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::Distribution;
use burn::tensor::activation::relu;

use burn_vae_core::shape::{conv_out_dim, conv_transpose_out_dim, same_padding};
use burn_vae_core::{DiagonalGaussian, ReconLoss};

use crate::{LatentModel, LossTerms};

/// Configuration for [`ConvVae`].
#[derive(Debug, Clone)]
pub struct ConvVaeConfig {
    /// Input image size `[height, width]`.
    pub input_size: [usize; 2],
    /// Encoder conv output channels, one entry per layer.
    pub encoder_filters: Vec<usize>,
    /// Encoder kernel sizes, matching `encoder_filters`.
    pub encoder_kernels: Vec<usize>,
    /// Encoder strides, matching `encoder_filters`.
    pub encoder_strides: Vec<usize>,
    /// Dense layers between the conv stack and the latent heads.
    pub encoder_units: Vec<usize>,
    /// Dense layers between the latent and the transposed-conv stack; the
    /// last width becomes the channel count of the 1x1 spatial seed.
    pub decoder_units: Vec<usize>,
    /// Decoder transposed-conv output channels; the last must be 1.
    pub decoder_filters: Vec<usize>,
    /// Decoder kernel sizes, matching `decoder_filters`.
    pub decoder_kernels: Vec<usize>,
    /// Decoder strides, matching `decoder_filters`.
    pub decoder_strides: Vec<usize>,
    /// Latent dimensionality.
    pub latent_dim: usize,
    /// Reconstruction objective.
    pub recon_loss: ReconLoss,
    /// Weight on the KL term.
    pub beta: f64,
}

impl Default for ConvVaeConfig {
    /// The 28x28 schedule from <https://arxiv.org/abs/1803.10122> at half
    /// the filter counts; the transposed-conv chain grows a 1x1 seed back
    /// to exactly 28x28 (1 -> 4 -> 11 -> 25 -> 28).
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
            beta: 1.0,
        }
    }
}

impl ConvVaeConfig {
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
    ///
    /// Panics if the schedule vectors disagree in length or the decoder
    /// does not land on the input resolution.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvVae<B> {
        assert_eq!(self.encoder_filters.len(), self.encoder_kernels.len());
        assert_eq!(self.encoder_filters.len(), self.encoder_strides.len());
        assert_eq!(self.decoder_filters.len(), self.decoder_kernels.len());
        assert_eq!(self.decoder_filters.len(), self.decoder_strides.len());
        assert!(
            !self.decoder_units.is_empty(),
            "decoder needs a dense layer to seed the feature map"
        );

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
        let mean = LinearConfig::new(width, self.latent_dim).init(device);
        let log_var = LinearConfig::new(width, self.latent_dim).init(device);

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

        ConvVae {
            encoder_convs,
            encoder_fcs,
            mean,
            log_var,
            decoder_fcs,
            decoder_convs,
            seed_channels,
            latent_dim: self.latent_dim,
            height: self.input_size[0],
            width: self.input_size[1],
            recon_loss: Ignored(self.recon_loss),
            beta: self.beta,
        }
    }
}

/// Builds an encoder conv stack and returns it with its flatten width.
pub(crate) fn build_encoder_convs<B: Backend>(
    filters: &[usize],
    kernels: &[usize],
    strides: &[usize],
    input_size: [usize; 2],
    device: &B::Device,
) -> (Vec<Conv2d<B>>, usize) {
    let mut convs = Vec::new();
    let mut channels = 1;
    let (mut height, mut width) = (input_size[0], input_size[1]);

    for idx in 0..filters.len() {
        let kernel = kernels[idx];
        let stride = strides[idx];
        let padding = same_padding(kernel);

        convs.push(
            Conv2dConfig::new([channels, filters[idx]], [kernel, kernel])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .init(device),
        );

        channels = filters[idx];
        height = conv_out_dim(height, kernel, stride, padding);
        width = conv_out_dim(width, kernel, stride, padding);
    }

    (convs, channels * height * width)
}

/// Builds a transposed-conv stack growing a 1x1 seed to `input_size`.
pub(crate) fn build_decoder_convs<B: Backend>(
    seed_channels: usize,
    filters: &[usize],
    kernels: &[usize],
    strides: &[usize],
    input_size: [usize; 2],
    device: &B::Device,
) -> Vec<ConvTranspose2d<B>> {
    let mut convs = Vec::new();
    let mut channels = seed_channels;
    let (mut height, mut width) = (1, 1);

    for idx in 0..filters.len() {
        let kernel = kernels[idx];
        let stride = strides[idx];

        convs.push(
            ConvTranspose2dConfig::new([channels, filters[idx]], [kernel, kernel])
                .with_stride([stride, stride])
                .init(device),
        );

        channels = filters[idx];
        height = conv_transpose_out_dim(height, kernel, stride);
        width = conv_transpose_out_dim(width, kernel, stride);
    }

    assert_eq!(
        [height, width],
        input_size,
        "decoder schedule must reproduce the input resolution"
    );
    assert_eq!(channels, 1, "decoder must emit a single channel");

    convs
}

/// Convolutional VAE over grayscale images.
#[derive(Module, Debug)]
pub struct ConvVae<B: Backend> {
    encoder_convs: Vec<Conv2d<B>>,
    encoder_fcs: Vec<Linear<B>>,
    mean: Linear<B>,
    log_var: Linear<B>,
    decoder_fcs: Vec<Linear<B>>,
    decoder_convs: Vec<ConvTranspose2d<B>>,
    seed_channels: usize,
    latent_dim: usize,
    height: usize,
    width: usize,
    recon_loss: Ignored<ReconLoss>,
    beta: f64,
}

impl<B: Backend> ConvVae<B> {
    /// Posterior over latents for a batch of images.
    pub fn encode(&self, images: Tensor<B, 3>) -> DiagonalGaussian<B> {
        let flat = self.features(images);
        DiagonalGaussian::new(self.mean.forward(flat.clone()), self.log_var.forward(flat))
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

    fn features(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
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
        flat
    }

    fn flatten(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        images.reshape([batch, height * width])
    }
}

impl<B: Backend> LatentModel<B> for ConvVae<B> {
    fn loss(&self, images: Tensor<B, 3>) -> LossTerms<B> {
        let posterior = self.encode(images.clone());
        let logits = self.decode(posterior.sample());

        let reconstruction = self
            .recon_loss
            .batch_loss(self.flatten(logits), self.flatten(images));
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
        self.recon_loss.to_output(self.decode(z))
    }

    fn reconstruct(&self, images: Tensor<B, 3>) -> Tensor<B, 3> {
        let posterior = self.encode(images);
        self.recon_loss.to_output(self.decode(posterior.mean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn default_decoder_lands_on_28x28() {
        let device = Default::default();
        let model = ConvVaeConfig::default().init::<TestBackend>(&device);
        let z = Tensor::zeros([2, 32], &device);

        assert_eq!(model.decode(z).dims(), [2, 28, 28]);
    }

    #[test]
    fn loss_terms_are_finite_on_default_config() {
        let device = Default::default();
        let model = ConvVaeConfig::default().init::<TestBackend>(&device);
        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);

        let terms = model.loss(images);
        let total: f32 = terms.total.into_scalar();
        assert!(total.is_finite());
    }

    #[test]
    fn sample_and_reconstruct_shapes() {
        let device = Default::default();
        let model = ConvVaeConfig::default().init::<TestBackend>(&device);

        assert_eq!(model.sample(3, &device).dims(), [3, 28, 28]);

        let images = Tensor::random([2, 28, 28], Distribution::Uniform(0.0, 1.0), &device);
        assert_eq!(model.reconstruct(images).dims(), [2, 28, 28]);
    }

    #[test]
    #[should_panic(expected = "reproduce the input resolution")]
    fn mismatched_decoder_schedule_panics() {
        let device = Default::default();
        let config = ConvVaeConfig {
            decoder_kernels: vec![4, 5, 5, 5],
            ..Default::default()
        };
        let _ = config.init::<TestBackend>(&device);
    }
}
