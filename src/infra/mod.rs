// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of a run:
//
//   checkpoint.rs — weight encoding (NamedMpkBytesRecorder),
//                   checkpoint_<acc>%.mpk files, and the run's
//                   train_config.json / classes.json
//
//   metrics.rs    — per-epoch CSV log
//
//   curves.rs     — results.json + learning_curves.svg
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Learning curve plots
pub mod curves;
