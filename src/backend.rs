//! Backend selection.
//!
//! The CPU NdArray backend is the default so that training runs, evaluation,
//! and the test suite are deterministic on any machine; the `wgpu` cargo
//! feature switches the whole pipeline to the GPU backend.

use burn::backend::Autodiff;

#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::NdArray;

/// The autodiff backend used for gradient passes. Validation, evaluation,
/// and inference run on the inner backend.
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device for the selected backend.
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Human-readable name for the selected backend.
pub fn backend_name() -> &'static str {
    #[cfg(feature = "wgpu")]
    {
        "WGPU (GPU)"
    }
    #[cfg(not(feature = "wgpu"))]
    {
        "NdArray (CPU)"
    }
}
