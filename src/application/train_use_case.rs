// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Validate the configuration
//   Step 2: Resolve the execution context      (Layer 5 - ml)
//   Step 3: Load train / test images           (Layer 4 - data)
//   Step 4: Build model, optimizer             (Layer 5 - ml)
//   Step 5: Optionally restore weights         (Layer 6 - infra)
//   Step 6: Save config + class list           (Layer 6 - infra)
//   Step 7: Run the epoch driver               (Layer 5 - ml)
//   Step 8: Plot learning curves               (Layer 6 - infra)
//
// Restoring happens before anything is written, so a bad
// checkpoint fails the run without touching the output dirs.
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::optim::SgdConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    batcher::{build_test_loader, build_train_loader},
    dataset::ImageDataset,
    loader::ImageFolderLoader,
    splitter::split_train_val,
};
use crate::domain::metrics::ResultsHistory;
use crate::infra::{
    checkpoint::{load_weights, CheckpointManager},
    curves::plot_curves,
    metrics::MetricsLogger,
};
use crate::ml::{
    backend::{EvalBackend, ExecutionContext, TrainBackend},
    driver::EpochDriver,
    learner::{Learner, LearnerSettings},
    model::{Cnn, CnnConfig},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so it can be saved next to the checkpoints and
// reloaded by `evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_dir:      String,
    /// When absent, `train_fraction` of `train_dir` is kept for
    /// training and the rest becomes the test set.
    pub test_dir:       Option<String>,
    pub train_fraction: f64,
    pub checkpoint_dir: String,
    pub output_dir:     String,
    pub image_size:     u32,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub dropout:        f64,
    pub num_workers:    usize,
    pub seed:           u64,
    pub log_every:      usize,
    pub continue_train: bool,
    pub pth_file:       Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_dir:      "data/train".to_string(),
            test_dir:       None,
            train_fraction: 0.8,
            checkpoint_dir: "checkpoints".to_string(),
            output_dir:     "output".to_string(),
            image_size:     64,
            batch_size:     32,
            epochs:         10,
            lr:             1e-2,
            dropout:        0.5,
            num_workers:    2,
            seed:           42,
            log_every:      20,
            continue_train: false,
            pth_file:       None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be a positive integer");
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("learning rate must be a positive number, got {}", self.lr);
        }
        if self.batch_size == 0 {
            bail!("batch size must be a positive integer");
        }
        if self.image_size < 2 {
            bail!("image size must be at least 2 pixels, got {}", self.image_size);
        }
        if !(0.0..=1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1], got {}", self.dropout);
        }
        if self.test_dir.is_none() && !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            bail!("train fraction must be in (0, 1) when no test directory is given");
        }
        match (self.continue_train, &self.pth_file) {
            (true, None) => bail!("continue_train is set but no checkpoint file was given"),
            (false, Some(_)) => bail!("a checkpoint file was given without continue_train"),
            _ => Ok(()),
        }
    }
}

/// What a finished run hands back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history:       ResultsHistory,
    pub best_accuracy: f64,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Configuration ─────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Execution context ─────────────────────────────────────────
        let ctx = ExecutionContext::resolve();

        // ── Step 3: Data ──────────────────────────────────────────────────────
        let (classes, train_set, test_set) = self.load_datasets()?;
        tracing::info!(
            "{} classes | {} train images | {} test images",
            classes.len(),
            train_set.sample_count(),
            test_set.sample_count()
        );

        // ── Step 4: Model, optimizer ──────────────────────────────────────────
        tracing::info!("----> Creating Model");
        let model_cfg = CnnConfig::new(classes.len()).with_dropout(cfg.dropout);
        let mut model: Cnn<TrainBackend> = model_cfg.init(&ctx.device);
        let optim = SgdConfig::new().init::<TrainBackend, Cnn<TrainBackend>>();

        // ── Step 5: Continue training ─────────────────────────────────────────
        // Weights only: the optimizer always starts fresh.
        if cfg.continue_train {
            let pth = cfg.pth_file.as_deref().context("continue_train requires a checkpoint file")?;
            tracing::info!("----> Loading Checkpoint '{}'", pth);
            model = load_weights(model, Path::new(pth), &ctx.device)?;
        }

        // ── Step 6: Persist run configuration ─────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        checkpoints.save_config(cfg)?;
        checkpoints.save_classes(&classes)?;
        let metrics_log = MetricsLogger::new(&cfg.output_dir)?;

        // ── Step 7: Epoch loop ────────────────────────────────────────────────
        let train_loader = build_train_loader::<TrainBackend>(
            train_set, cfg.batch_size, cfg.num_workers, cfg.seed, ctx.device.clone(),
        );
        let test_loader = build_test_loader::<EvalBackend>(
            test_set, cfg.batch_size, cfg.num_workers, ctx.device.clone(),
        );
        let settings = LearnerSettings {
            lr:         cfg.lr,
            num_epochs: cfg.epochs,
            log_every:  cfg.log_every,
        };
        let mut learner = Learner::new(model, optim, train_loader, test_loader, settings, &ctx.device);

        let mut driver = EpochDriver::new(cfg.epochs, &checkpoints).with_metrics_logger(&metrics_log);
        let history = driver.run(&mut learner)?;

        // ── Step 8: Learning curves ───────────────────────────────────────────
        plot_curves(&history, Path::new(&cfg.output_dir))?;

        Ok(TrainReport { history, best_accuracy: driver.best_accuracy() })
    }

    /// (class names, train set, test set)
    fn load_datasets(&self) -> Result<(Vec<String>, ImageDataset, ImageDataset)> {
        let cfg   = &self.config;
        let train = ImageFolderLoader::new(&cfg.train_dir, cfg.image_size).load()?;

        match &cfg.test_dir {
            Some(test_dir) => {
                let test = ImageFolderLoader::new(test_dir, cfg.image_size).load_as(&train.classes)?;
                Ok((train.classes, ImageDataset::new(train.samples), ImageDataset::new(test.samples)))
            }
            None => {
                let (train_samples, test_samples) =
                    split_train_val(train.samples, cfg.train_fraction, cfg.seed);
                if train_samples.is_empty() || test_samples.is_empty() {
                    bail!(
                        "'{}' is too small to split into train and test sets",
                        cfg.train_dir
                    );
                }
                Ok((train.classes, ImageDataset::new(train_samples), ImageDataset::new(test_samples)))
            }
        }
    }
}
