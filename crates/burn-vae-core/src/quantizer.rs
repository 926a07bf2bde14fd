//! Vector-quantization middle layer for the VQ-VAE.
//!
//! Encoder outputs are matched to their nearest codebook rows; gradients
//! reach the encoder through a straight-through estimator while the
//! codebook and commitment losses train the codebook and encoder toward
//! each other.

use burn::module::Param;
use burn::nn::Initializer;
use burn::prelude::*;
use burn::tensor::Int;

/// Trainable codebook of `num_codes` embeddings of width `code_dim`.
#[derive(Module, Debug)]
pub struct VectorQuantizer<B: Backend> {
    /// Codebook rows, shape `[num_codes, code_dim]`.
    pub codebook: Param<Tensor<B, 2>>,
}

/// Result of quantizing a batch of encoder outputs.
#[derive(Debug, Clone)]
pub struct Quantized<B: Backend> {
    /// Straight-through latents for the decoder, `[batch, slots, code_dim]`.
    pub latents: Tensor<B, 3>,
    /// Selected codebook indices, `[batch, slots]`.
    pub codes: Tensor<B, 2, Int>,
    /// `mean ||detach(z_e) - e||^2`: pulls codebook rows toward encodings.
    pub codebook_loss: Tensor<B, 1>,
    /// `mean ||z_e - detach(e)||^2`: keeps encodings near their codes.
    pub commitment_loss: Tensor<B, 1>,
}

impl<B: Backend> VectorQuantizer<B> {
    /// Creates a quantizer with an `N(0, 0.02)` initialized codebook.
    pub fn new(num_codes: usize, code_dim: usize, device: &B::Device) -> Self {
        let codebook = Initializer::Normal {
            mean: 0.0,
            std: 0.02,
        }
        .init([num_codes, code_dim], device);

        Self { codebook }
    }

    pub fn num_codes(&self) -> usize {
        self.codebook.val().dims()[0]
    }

    pub fn code_dim(&self) -> usize {
        self.codebook.val().dims()[1]
    }

    /// Quantizes encoder outputs `[batch, slots, code_dim]`.
    pub fn quantize(&self, z_e: Tensor<B, 3>) -> Quantized<B> {
        let [batch, slots, dim] = z_e.dims();
        let flat = z_e.clone().reshape([batch * slots, dim]);
        let codebook = self.codebook.val();

        // Squared distances |x|^2 - 2 x.e + |e|^2, [batch * slots, num_codes].
        let x_sq = (flat.clone() * flat.clone()).sum_dim(1);
        let e_sq = (codebook.clone() * codebook.clone()).sum_dim(1).transpose();
        let cross = flat.clone().matmul(codebook.clone().transpose());
        let distances = x_sq + e_sq - cross * 2.0;

        let codes = distances.argmin(1);
        let selected = codebook.select(0, codes.clone().reshape([batch * slots]));

        let codebook_loss = {
            let diff = flat.clone().detach() - selected.clone();
            (diff.clone() * diff).sum_dim(1).mean()
        };
        let commitment_loss = {
            let diff = flat - selected.clone().detach();
            (diff.clone() * diff).sum_dim(1).mean()
        };

        // Straight-through: the decoder sees codebook rows, the encoder
        // receives the decoder's gradient unchanged.
        let quantized = selected.reshape([batch, slots, dim]);
        let latents = z_e.clone() + (quantized - z_e).detach();

        Quantized {
            latents,
            codes: codes.reshape([batch, slots]),
            codebook_loss,
            commitment_loss,
        }
    }

    /// Embeds integer codes: `[batch, slots] -> [batch, slots, code_dim]`.
    pub fn lookup(&self, codes: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, slots] = codes.dims();
        let dim = self.code_dim();
        self.codebook
            .val()
            .select(0, codes.reshape([batch * slots]))
            .reshape([batch, slots, dim])
    }
}
