// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All tensor work lives here.
//
//   backend.rs  — NdArray by default, Wgpu behind the `wgpu`
//                 feature; Autodiff on top for training
//
//   model.rs    — small CNN classifier behind ImageClassifier
//
//   steps.rs    — one train pass (forward, loss, backward,
//                 optimizer step) and one evaluate pass
//
//   learner.rs  — model + optimizer + loaders as an EpochRunner
//
//   driver.rs   — epoch loop, best-accuracy watermark,
//                 checkpoint on strict improvement
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

pub mod backend;

/// CNN image classifier
pub mod model;

pub mod steps;

pub mod learner;

/// Epoch loop and checkpoint policy
pub mod driver;
