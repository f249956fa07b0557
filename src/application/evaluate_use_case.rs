// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved checkpoint against a folder of labelled images.
//
//   Step 1: Read train_config.json + classes.json   (Layer 6 - infra)
//   Step 2: Rebuild the model, load weights         (Layer 5/6)
//   Step 3: Load the images with the saved labels   (Layer 4 - data)
//   Step 4: One evaluation pass, no gradients       (Layer 5 - ml)
//
// The config and class list are looked up next to the checkpoint
// unless a different directory is given.

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
};
use std::path::{Path, PathBuf};

use crate::data::{batcher::build_test_loader, dataset::ImageDataset, loader::ImageFolderLoader};
use crate::domain::metrics::EpochMetrics;
use crate::infra::checkpoint::{load_weights, CheckpointManager};
use crate::ml::{
    backend::{EvalBackend, ExecutionContext, TrainBackend},
    model::{Cnn, CnnConfig},
    steps::{evaluate_step, Progress},
};

pub struct EvaluateUseCase {
    checkpoint: PathBuf,
    test_dir:   PathBuf,
    config_dir: Option<PathBuf>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EvaluateReport {
    pub classes: Vec<String>,
    pub samples: usize,
    pub metrics: EpochMetrics,
}

impl EvaluateUseCase {
    pub fn new(checkpoint: impl Into<PathBuf>, test_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            test_dir:   test_dir.into(),
            config_dir: None,
            batch_size: None,
        }
    }

    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn execute(&self) -> Result<EvaluateReport> {
        let ctx = ExecutionContext::resolve();

        // ── Step 1: Saved run metadata ────────────────────────────────────────
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => self
                .checkpoint
                .parent()
                .map(Path::to_path_buf)
                .context("Checkpoint path has no parent directory")?,
        };
        let store   = CheckpointManager::new(config_dir)?;
        let cfg     = store.load_config()?;
        let classes = store.load_classes()?;

        // ── Step 2: Model ─────────────────────────────────────────────────────
        let model: Cnn<TrainBackend> = CnnConfig::new(classes.len())
            .with_dropout(cfg.dropout)
            .init(&ctx.device);
        let model = load_weights(model, &self.checkpoint, &ctx.device)?.valid();

        // ── Step 3: Data ──────────────────────────────────────────────────────
        let images  = ImageFolderLoader::new(&self.test_dir, cfg.image_size).load_as(&classes)?;
        let samples = images.samples.len();
        let loader  = build_test_loader::<EvalBackend>(
            ImageDataset::new(images.samples),
            self.batch_size.unwrap_or(cfg.batch_size),
            cfg.num_workers,
            ctx.device.clone(),
        );

        // ── Step 4: Evaluate ──────────────────────────────────────────────────
        let loss_fn: CrossEntropyLoss<EvalBackend> = CrossEntropyLossConfig::new().init(&ctx.device);
        let progress = Progress { phase: "Test", epoch: 1, num_epochs: 1, log_every: cfg.log_every };
        let metrics  = evaluate_step(&model, loader.as_ref(), &loss_fn, progress)?;

        tracing::info!(
            "Evaluated '{}' on {} images: loss={:.4} acc={:.2}%",
            self.checkpoint.display(),
            samples,
            metrics.loss,
            metrics.accuracy * 100.0
        );
        Ok(EvaluateReport { classes, samples, metrics })
    }
}
