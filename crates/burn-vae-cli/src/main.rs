//! burn-vae CLI
//!
//! Trains the autoencoder examples on MNIST and writes their artifacts
//! (sample grid, model record, loss history, run configuration).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::tensor::backend::Backend;
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;

use burn_vae::backends::{default_device, DefaultBackend};
use burn_vae::{
    ConvAeConfig, ConvVaeConfig, FcVaeConfig, LatentModel, TrainConfig, VqVaeConfig,
};

type InferenceBackend = DefaultBackend;
type TrainBackend = Autodiff<DefaultBackend>;

#[derive(Parser)]
#[command(name = "burn-vae")]
#[command(about = "Autoencoder training examples on MNIST in pure Rust")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TrainArgs {
    /// Number of passes over the training set
    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// Mini-batch size
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1.0e-3)]
    learning_rate: f64,

    /// Decoupled weight decay (defaults per model)
    #[arg(long)]
    weight_decay: Option<f64>,

    /// RNG seed for shuffling, init, and latent noise
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of decoder samples to render into the grid
    #[arg(long, default_value_t = 25)]
    samples: usize,

    /// Dataloader worker threads
    #[arg(long, default_value_t = 1)]
    num_workers: usize,

    /// Output directory (defaults to artifacts/<model>)
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the fully-connected VAE on MNIST
    FcMnist {
        #[command(flatten)]
        train: TrainArgs,

        /// Latent dimensionality
        #[arg(long, default_value_t = 32)]
        latent: usize,

        /// Weight on the KL term
        #[arg(long, default_value_t = 1.0)]
        beta: f64,
    },

    /// Train the convolutional VAE on MNIST
    ConvMnist {
        #[command(flatten)]
        train: TrainArgs,

        /// Latent dimensionality
        #[arg(long, default_value_t = 32)]
        latent: usize,

        /// Weight on the KL term
        #[arg(long, default_value_t = 1.0)]
        beta: f64,
    },

    /// Train the convolutional autoencoder on MNIST
    AeMnist {
        #[command(flatten)]
        train: TrainArgs,

        /// Latent dimensionality
        #[arg(long, default_value_t = 32)]
        latent: usize,
    },

    /// Train the vector-quantized VAE on MNIST
    VqMnist {
        #[command(flatten)]
        train: TrainArgs,

        /// Quantized latent vectors per image
        #[arg(long, default_value_t = 8)]
        slots: usize,

        /// Codebook size
        #[arg(long, default_value_t = 64)]
        num_codes: usize,

        /// Width of each codebook row
        #[arg(long, default_value_t = 32)]
        code_dim: usize,

        /// Weight on the commitment loss
        #[arg(long, default_value_t = 0.25)]
        commitment: f64,
    },

    /// Show compiled backends and available models
    Info,
}

/// Application entry point
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::FcMnist {
            train,
            latent,
            beta,
        } => {
            let device = default_device();
            let model = FcVaeConfig::default()
                .with_latent_dim(latent)
                .with_beta(beta)
                .init::<TrainBackend>(&device);
            run("fc-mnist", model, &train, 1.0e-4, &device)
        }

        Commands::ConvMnist {
            train,
            latent,
            beta,
        } => {
            let device = default_device();
            let model = ConvVaeConfig::default()
                .with_latent_dim(latent)
                .with_beta(beta)
                .init::<TrainBackend>(&device);
            run("conv-mnist", model, &train, 5.0e-4, &device)
        }

        Commands::AeMnist { train, latent } => {
            let device = default_device();
            let model = ConvAeConfig::default()
                .with_latent_dim(latent)
                .init::<TrainBackend>(&device);
            run("ae-mnist", model, &train, 5.0e-4, &device)
        }

        Commands::VqMnist {
            train,
            slots,
            num_codes,
            code_dim,
            commitment,
        } => {
            let device = default_device();
            let model = VqVaeConfig::default()
                .with_slots(slots)
                .with_num_codes(num_codes)
                .with_code_dim(code_dim)
                .with_commitment_weight(commitment)
                .init::<TrainBackend>(&device);
            run("vq-mnist", model, &train, 5.0e-4, &device)
        }

        Commands::Info => {
            info();
            Ok(())
        }
    }
}

/// Trains a model, renders its samples, and persists the run artifacts.
fn run<M>(
    name: &str,
    model: M,
    args: &TrainArgs,
    default_decay: f64,
    device: &<TrainBackend as Backend>::Device,
) -> Result<()>
where
    M: LatentModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: LatentModel<InferenceBackend>,
{
    let config = TrainConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        weight_decay: args.weight_decay.unwrap_or(default_decay),
        seed: args.seed,
        num_workers: args.num_workers,
    };
    let dir = args
        .artifact_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("artifacts").join(name));

    println!("burn-vae: {name}\n");
    println!("Configuration:");
    println!("  Epochs:        {}", config.epochs);
    println!("  Batch size:    {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!("  Weight decay:  {}", config.weight_decay);
    println!("  Seed:          {}", config.seed);
    println!("  Artifacts:     {}", dir.display());
    println!();

    let outcome = burn_vae::fit(model, &config, device);

    if let Some(last) = outcome.history.last() {
        println!(
            "\nFinal losses: total {:.4}  recon {:.4}  reg {:.4}",
            last.total, last.reconstruction, last.regularizer
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("rendering samples...");

    let inference = outcome.model.valid();
    let samples = inference.sample(args.samples, device);
    let columns = (args.samples as f64).sqrt().ceil() as usize;

    spinner.set_message("saving artifacts...");
    burn_vae::save_run(&dir, inference, &config, &outcome.history, samples, columns)
        .context("failed to save run artifacts")?;
    spinner.finish_and_clear();

    println!("Samples saved to: {}", dir.join("samples.png").display());
    println!("Model record saved to: {}", dir.join("model.mpk").display());

    Ok(())
}

fn info() {
    println!("burn-vae: autoencoder training examples on MNIST\n");
    println!("Available backends:");

    #[cfg(feature = "ndarray")]
    println!("  - ndarray (CPU, enabled)");
    #[cfg(not(feature = "ndarray"))]
    println!("  - ndarray (CPU, not enabled)");

    #[cfg(feature = "wgpu")]
    println!("  - wgpu (WebGPU, enabled)");
    #[cfg(not(feature = "wgpu"))]
    println!("  - wgpu (WebGPU, not enabled)");

    #[cfg(feature = "tch")]
    println!("  - tch/libtorch (CPU/CUDA/MPS, enabled)");
    #[cfg(not(feature = "tch"))]
    println!("  - tch/libtorch (CPU/CUDA/MPS, not enabled)");

    #[cfg(feature = "cuda")]
    println!("  - cuda (NVIDIA CUDA, enabled)");
    #[cfg(not(feature = "cuda"))]
    println!("  - cuda (NVIDIA CUDA, not enabled)");

    println!("\nAvailable models:");
    println!("  - fully-connected VAE (fc-mnist)");
    println!("  - convolutional VAE (conv-mnist)");
    println!("  - convolutional autoencoder (ae-mnist)");
    println!("  - vector-quantized VAE (vq-mnist)");

    println!("\nEach training run writes samples.png, model.mpk, losses.csv");
    println!("and train.json to its artifact directory.");
}
