//! End-to-end optimization checks on a tiny model, without touching the
//! real dataset.

use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

use burn_vae_models::{ConvAe, ConvAeConfig, LatentModel};

type TestBackend = burn_ndarray::NdArray<f32>;
type TrainBackend = Autodiff<TestBackend>;

fn tiny_model(device: &<TrainBackend as Backend>::Device) -> ConvAe<TrainBackend> {
    ConvAeConfig {
        input_size: [8, 8],
        encoder_filters: vec![4, 8],
        encoder_kernels: vec![3, 3],
        encoder_strides: vec![2, 2],
        encoder_units: vec![],
        decoder_units: vec![16],
        decoder_filters: vec![8, 1],
        decoder_kernels: vec![4, 5],
        decoder_strides: vec![2, 1],
        latent_dim: 4,
        ..Default::default()
    }
    .init(device)
}

#[test]
fn optimizer_steps_reduce_the_loss_on_a_fixed_batch() {
    let device = Default::default();
    TrainBackend::seed(3);

    let mut model = tiny_model(&device);
    let mut optim = AdamConfig::new().init();
    let images =
        Tensor::<TrainBackend, 3>::random([4, 8, 8], Distribution::Uniform(0.0, 1.0), &device);

    let initial: f32 = model.loss(images.clone()).total.into_scalar();

    let mut last = initial;
    for _ in 0..40 {
        let terms = model.loss(images.clone());
        last = terms.total.clone().into_scalar();
        let grads = GradientsParams::from_grads(terms.total.backward(), &model);
        model = optim.step(1.0e-3, model, grads);
    }

    assert!(
        last < initial,
        "expected loss to drop, got {initial} -> {last}"
    );
}

#[test]
fn valid_model_samples_without_autodiff() {
    let device = Default::default();
    let model = tiny_model(&device);

    let inference = model.valid();
    let samples = inference.sample(3, &device);
    assert_eq!(samples.dims(), [3, 8, 8]);
}
