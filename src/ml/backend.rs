// ============================================================
// Layer 5 — Execution Context
// ============================================================
// Which burn backend runs the math, and on which device.
//
//   TrainBackend = Autodiff<EvalBackend>  → gradients on
//   EvalBackend                           → model.valid(), no graph
//
// The CPU ndarray backend is the default; building with the
// `wgpu` feature moves everything to the GPU. The device value
// is created once and passed to every tensor-producing call
// (model init, batchers, loss, checkpoint loading).

use burn::backend::Autodiff;

#[cfg(feature = "wgpu")]
mod selected {
    pub type Backend = burn::backend::Wgpu;
    pub type Device  = burn::backend::wgpu::WgpuDevice;
    pub const NAME: &str = "wgpu";
}

#[cfg(not(feature = "wgpu"))]
mod selected {
    pub type Backend = burn::backend::NdArray;
    pub type Device  = burn::backend::ndarray::NdArrayDevice;
    pub const NAME: &str = "ndarray";
}

pub type EvalBackend  = selected::Backend;
pub type TrainBackend = Autodiff<EvalBackend>;
pub type Device       = selected::Device;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub device: Device,
}

impl ExecutionContext {
    pub fn resolve() -> Self {
        let device = Device::default();
        tracing::info!("Using {} backend on device {:?}", selected::NAME, device);
        Self { device }
    }
}
