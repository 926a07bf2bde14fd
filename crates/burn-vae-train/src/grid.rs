//! Rendering sample batches into image files.

use std::path::Path;

use burn::prelude::*;
use image::{GrayImage, ImageError, Luma};

/// Tiles a batch of grayscale images `[count, height, width]` in `[0, 1]`
/// into a row-major grid and writes it as a PNG.
pub fn save_grid<B: Backend>(
    samples: Tensor<B, 3>,
    columns: usize,
    path: &Path,
) -> Result<(), ImageError> {
    let [count, height, width] = samples.dims();
    assert!(count > 0 && columns > 0);
    let rows = count.div_ceil(columns);

    let values: Vec<f32> = samples
        .clamp(0.0, 1.0)
        .into_data()
        .convert::<f32>()
        .to_vec()
        .unwrap();

    let mut canvas = GrayImage::new((columns * width) as u32, (rows * height) as u32);
    for index in 0..count {
        let (row, col) = (index / columns, index % columns);
        for y in 0..height {
            for x in 0..width {
                let value = values[index * height * width + y * width + x];
                let pixel = Luma([(value * 255.0).round() as u8]);
                canvas.put_pixel((col * width + x) as u32, (row * height + y) as u32, pixel);
            }
        }
    }

    canvas.save(path)
}
