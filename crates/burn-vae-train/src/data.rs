//! MNIST batching.
//!
//! Dataset download and iteration are owned by burn; this module only
//! shapes items into `[batch, 28, 28]` tensors scaled to `[0, 1]`.

use std::sync::Arc;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::vision::{MnistDataset, MnistItem};
use burn::prelude::*;
use burn::tensor::TensorData;

/// A batch of grayscale images in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct MnistBatch<B: Backend> {
    pub images: Tensor<B, 3>,
}

/// Stacks MNIST items into image batches; labels are unused here.
#[derive(Debug, Clone, Default)]
pub struct MnistBatcher;

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let images = items
            .iter()
            .map(|item| TensorData::from(item.image))
            .map(|data| Tensor::<B, 2>::from_data(data.convert::<B::FloatElem>(), device))
            .map(|tensor| tensor.reshape([1, 28, 28]))
            .collect();

        let images = Tensor::cat(images, 0) / 255.0;

        MnistBatch { images }
    }
}

/// Shuffled loader over the MNIST training split.
pub fn mnist_train_loader<B: Backend>(
    batch_size: usize,
    seed: u64,
    num_workers: usize,
) -> Arc<dyn DataLoader<B, MnistBatch<B>>> {
    DataLoaderBuilder::new(MnistBatcher)
        .batch_size(batch_size)
        .shuffle(seed)
        .num_workers(num_workers)
        .build(MnistDataset::train())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    fn item(fill: f32) -> MnistItem {
        MnistItem {
            image: [[fill; 28]; 28],
            label: 0,
        }
    }

    #[test]
    fn batch_is_scaled_to_unit_range() {
        let device = Default::default();
        let batch: MnistBatch<TestBackend> =
            MnistBatcher.batch(vec![item(0.0), item(255.0)], &device);

        assert_eq!(batch.images.dims(), [2, 28, 28]);

        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        let (first, second) = values.split_at(28 * 28);
        assert!(first.iter().all(|&v| v == 0.0));
        assert!(second.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
