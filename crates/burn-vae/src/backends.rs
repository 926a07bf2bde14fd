//! Backend support for burn-vae
//!
//! This module provides convenient access to different Burn backends.
//! Enable the desired backend via feature flags:
//!
//! - `ndarray`: CPU backend using ndarray (no GPU required)
//! - `wgpu`: WebGPU backend (cross-platform GPU support)
//! - `tch`: PyTorch backend via libtorch (supports CUDA, MPS)
//! - `cuda`: Native CUDA backend (NVIDIA GPUs only)
//!
//! Training wraps whichever backend is selected in
//! `burn::backend::Autodiff`.

#[cfg(feature = "ndarray")]
pub use burn_ndarray::{NdArray, NdArrayDevice};

#[cfg(feature = "wgpu")]
pub use burn_wgpu::{Wgpu, WgpuDevice};

#[cfg(feature = "tch")]
pub use burn_tch::{LibTorch, LibTorchDevice};

#[cfg(feature = "cuda")]
pub use burn_cuda::{Cuda, CudaDevice};

/// Type alias for the default backend when using the ndarray feature
#[cfg(feature = "ndarray")]
pub type DefaultBackend = NdArray;

/// Type alias for the default backend when using the wgpu feature
#[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
pub type DefaultBackend = Wgpu;

/// Type alias for the default backend when using the tch feature
#[cfg(all(feature = "tch", not(any(feature = "ndarray", feature = "wgpu"))))]
pub type DefaultBackend = LibTorch;

/// Type alias for the default backend when using the cuda feature
#[cfg(all(
    feature = "cuda",
    not(any(feature = "ndarray", feature = "wgpu", feature = "tch"))
))]
pub type DefaultBackend = Cuda;

/// Get the default device for the enabled backend
#[cfg(feature = "ndarray")]
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Get the default device for the enabled backend
#[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
pub fn default_device() -> WgpuDevice {
    WgpuDevice::default()
}

/// Get the default device for the enabled backend
#[cfg(all(feature = "tch", not(any(feature = "ndarray", feature = "wgpu"))))]
pub fn default_device() -> LibTorchDevice {
    // Prefer CUDA when libtorch can see a GPU.
    if burn_tch::is_cuda_available() {
        LibTorchDevice::Cuda(0)
    } else {
        LibTorchDevice::Cpu
    }
}

/// Get the default device for the enabled backend
#[cfg(all(
    feature = "cuda",
    not(any(feature = "ndarray", feature = "wgpu", feature = "tch"))
))]
pub fn default_device() -> CudaDevice {
    CudaDevice::default()
}
