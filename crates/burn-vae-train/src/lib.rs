//! Training support for the burn-vae model zoo: MNIST batching, a shared
//! optimization loop, sample-grid rendering, and artifact persistence.

pub mod artifacts;
pub mod data;
pub mod grid;
pub mod trainer;

pub use artifacts::{save_run, ArtifactError};
pub use data::{MnistBatch, MnistBatcher};
pub use grid::save_grid;
pub use trainer::{fit, EpochLoss, LossHistory, TrainConfig, TrainOutcome};
