//! Shared training loop.
//!
//! One loop serves every model in the zoo: Adam with decoupled weight
//! decay, one optimizer step per mini-batch, and per-epoch averages of
//! the loss breakdown.

use std::io;
use std::path::Path;

use burn::data::dataloader::DataLoader;
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

use burn_vae_models::LatentModel;

use crate::data;

/// Hyperparameters of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Passes over the training set.
    pub epochs: usize,
    /// Mini-batch size.
    pub batch_size: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Decoupled weight decay applied by the optimizer.
    pub weight_decay: f64,
    /// Seed for shuffling, init, and latent noise.
    pub seed: u64,
    /// Dataloader worker threads.
    pub num_workers: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 100,
            learning_rate: 1.0e-3,
            weight_decay: 5.0e-4,
            seed: 42,
            num_workers: 1,
        }
    }
}

impl TrainConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Loss averages for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub total: f64,
    pub reconstruction: f64,
    pub regularizer: f64,
}

/// Loss averages collected over a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LossHistory {
    pub epochs: Vec<EpochLoss>,
}

impl LossHistory {
    pub fn push(&mut self, loss: EpochLoss) {
        self.epochs.push(loss);
    }

    pub fn last(&self) -> Option<&EpochLoss> {
        self.epochs.last()
    }

    /// Writes the history as CSV: epoch, total, reconstruction, regularizer.
    pub fn write_csv(&self, path: &Path) -> io::Result<()> {
        let mut out = String::from("epoch,total,reconstruction,regularizer\n");
        for loss in &self.epochs {
            out.push_str(&format!(
                "{},{},{},{}\n",
                loss.epoch, loss.total, loss.reconstruction, loss.regularizer
            ));
        }
        std::fs::write(path, out)
    }
}

/// A trained model together with its loss history.
pub struct TrainOutcome<M> {
    pub model: M,
    pub history: LossHistory,
}

/// Trains `model` on the MNIST training split.
pub fn fit<B, M>(mut model: M, config: &TrainConfig, device: &B::Device) -> TrainOutcome<M>
where
    B: AutodiffBackend,
    M: LatentModel<B> + AutodiffModule<B>,
{
    B::seed(config.seed);

    let loader = data::mnist_train_loader::<B>(config.batch_size, config.seed, config.num_workers);
    let mut optim = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay as f32)))
        .init();

    let mut history = LossHistory::default();

    for epoch in 1..=config.epochs {
        let mut sums = [0.0f64; 3];
        let mut batches = 0usize;

        for batch in loader.iter() {
            let terms = model.loss(batch.images);
            let grads = GradientsParams::from_grads(terms.total.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);

            sums[0] += scalar(&terms.total);
            sums[1] += scalar(&terms.reconstruction);
            sums[2] += scalar(&terms.regularizer);
            batches += 1;
        }

        let count = batches.max(1) as f64;
        let loss = EpochLoss {
            epoch,
            total: sums[0] / count,
            reconstruction: sums[1] / count,
            regularizer: sums[2] / count,
        };
        println!(
            "epoch {:>3}/{}: total {:.4}  recon {:.4}  reg {:.4}",
            epoch, config.epochs, loss.total, loss.reconstruction, loss.regularizer
        );
        history.push(loss);
    }

    TrainOutcome { model, history }
}

fn scalar<B: Backend>(value: &Tensor<B, 1>) -> f64 {
    value.clone().into_scalar().elem::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_csv_format() {
        let mut history = LossHistory::default();
        history.push(EpochLoss {
            epoch: 1,
            total: 1.5,
            reconstruction: 1.0,
            regularizer: 0.5,
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("losses.csv");
        history.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "epoch,total,reconstruction,regularizer\n1,1.5,1,0.5\n");
    }

    #[test]
    fn config_builders() {
        let config = TrainConfig::default()
            .with_epochs(3)
            .with_batch_size(16)
            .with_learning_rate(1.0e-4)
            .with_weight_decay(1.0e-4)
            .with_seed(7);

        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.learning_rate, 1.0e-4);
        assert_eq!(config.weight_decay, 1.0e-4);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn last_returns_the_final_epoch() {
        let mut history = LossHistory::default();
        assert!(history.last().is_none());

        for epoch in 1..=3 {
            history.push(EpochLoss {
                epoch,
                total: epoch as f64,
                reconstruction: 0.0,
                regularizer: 0.0,
            });
        }
        assert_eq!(history.last().unwrap().epoch, 3);
    }
}
