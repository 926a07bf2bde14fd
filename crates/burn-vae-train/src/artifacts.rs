//! Artifact persistence for finished runs.
//!
//! Each run directory holds the model record (`model.mpk`), the loss
//! history (`losses.csv`), the run configuration (`train.json`), and a
//! grid of decoder samples (`samples.png`).

use std::fs;
use std::path::Path;

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, RecorderError};
use thiserror::Error;

use crate::grid::save_grid;
use crate::trainer::{LossHistory, TrainConfig};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record error: {0}")]
    Record(#[from] RecorderError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the standard artifact set for a finished run.
pub fn save_run<B: Backend, M: Module<B>>(
    dir: &Path,
    model: M,
    config: &TrainConfig,
    history: &LossHistory,
    samples: Tensor<B, 3>,
    columns: usize,
) -> Result<(), ArtifactError> {
    fs::create_dir_all(dir)?;

    model.save_file(
        dir.join("model"),
        &NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
    )?;
    history.write_csv(&dir.join("losses.csv"))?;
    fs::write(dir.join("train.json"), serde_json::to_string_pretty(config)?)?;
    save_grid(samples, columns, &dir.join("samples.png"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_vae_models::{FcVaeConfig, LatentModel};

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn run_directory_layout() {
        let device = Default::default();
        let model = FcVaeConfig {
            input_size: [8, 8],
            encoder_units: vec![16],
            decoder_units: vec![16],
            latent_dim: 4,
            ..Default::default()
        }
        .init::<TestBackend>(&device);

        let samples = model.sample(4, &device);
        let dir = tempfile::tempdir().unwrap();

        save_run(
            dir.path(),
            model,
            &TrainConfig::default(),
            &LossHistory::default(),
            samples,
            2,
        )
        .unwrap();

        assert!(dir.path().join("model.mpk").exists());
        assert!(dir.path().join("losses.csv").exists());
        assert!(dir.path().join("train.json").exists());
        assert!(dir.path().join("samples.png").exists());
    }
}
