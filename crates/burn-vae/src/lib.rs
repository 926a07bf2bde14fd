//! burn-vae: autoencoder training examples on MNIST in pure Rust
//!
//! Reimplements a family of classic autoencoder architectures on the
//! Burn deep learning framework: a fully-connected VAE, a convolutional
//! VAE, a plain convolutional autoencoder, and a vector-quantized VAE,
//! all trained with one shared loop.
//!
//! # Backend Selection
//!
//! Choose a backend via feature flags:
//! - `ndarray`: CPU backend (no GPU required)
//! - `wgpu`: WebGPU backend (cross-platform GPU)
//! - `tch`: PyTorch backend via libtorch (CUDA, MPS support)
//! - `cuda`: Native CUDA backend (NVIDIA only)
//!
//! # Example
//!
//! ```toml
//! [dependencies]
//! burn-vae = { version = "0.1", features = ["ndarray"] }
//! ```
//!
//! ```ignore
//! use burn::backend::Autodiff;
//! use burn_vae::backends::{default_device, DefaultBackend};
//! use burn_vae::{fit, ConvVaeConfig, LatentModel, TrainConfig};
//!
//! let device = default_device();
//! let model = ConvVaeConfig::default().init::<Autodiff<DefaultBackend>>(&device);
//! let outcome = fit(model, &TrainConfig::default(), &device);
//! let samples = outcome.model.sample(25, &device);
//! ```

pub use burn_vae_core as core;
pub use burn_vae_models as models;
pub use burn_vae_train as train;

pub mod backends;

pub use models::{
    ConvAe, ConvAeConfig, ConvVae, ConvVaeConfig, FcVae, FcVaeConfig, LatentModel, LossTerms,
    VqVae, VqVaeConfig,
};
pub use train::{fit, save_grid, save_run, LossHistory, TrainConfig, TrainOutcome};
