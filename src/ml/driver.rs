// ============================================================
// Layer 5 — Epoch Driver
// ============================================================
// Runs a fixed number of epochs, each one:
//
//   1. runner.train_epoch(e)
//   2. runner.evaluate(e)          ← always the post-training weights
//   3. test accuracy > watermark?  → write checkpoint, raise watermark
//   4. append to history (+ metrics CSV)
//
// The watermark lives in the driver, starts at 0 and only moves on
// a strict improvement, so ties never write a second file.
// Any error from a step aborts the whole run.

use anyhow::{bail, Result};

use crate::domain::{
    metrics::{BestAccuracy, ResultsHistory},
    traits::EpochRunner,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};

pub struct EpochDriver<'a> {
    num_epochs:  usize,
    checkpoints: &'a CheckpointManager,
    metrics_log: Option<&'a MetricsLogger>,
    best:        BestAccuracy,
}

impl<'a> EpochDriver<'a> {
    pub fn new(num_epochs: usize, checkpoints: &'a CheckpointManager) -> Self {
        Self {
            num_epochs,
            checkpoints,
            metrics_log: None,
            best: BestAccuracy::new(),
        }
    }

    pub fn with_metrics_logger(mut self, logger: &'a MetricsLogger) -> Self {
        self.metrics_log = Some(logger);
        self
    }

    /// Highest test accuracy reached so far (0 before the first epoch).
    pub fn best_accuracy(&self) -> f64 {
        self.best.value()
    }

    pub fn run<R: EpochRunner>(&mut self, runner: &mut R) -> Result<ResultsHistory> {
        if self.num_epochs == 0 {
            bail!("Number of epochs must be at least 1");
        }

        let mut history = ResultsHistory::new();
        tracing::info!("----> Start Training ({} epochs)", self.num_epochs);

        for epoch in 1..=self.num_epochs {
            let train = runner.train_epoch(epoch)?;
            let test  = runner.evaluate(epoch)?;

            if self.best.observe(test.accuracy) {
                let path = self.checkpoints.save_best(&runner.snapshot()?, test.accuracy)?;
                tracing::info!(
                    "New best test accuracy {:.2}% → '{}'",
                    test.accuracy * 100.0,
                    path.display()
                );
            }

            history.push_epoch(train, test);
            if let Some(log) = self.metrics_log {
                log.log(epoch, &train, &test)?;
            }

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.2}% | test_loss={:.4} | test_acc={:.2}%",
                epoch, self.num_epochs,
                train.loss, train.accuracy * 100.0,
                test.loss,  test.accuracy * 100.0,
            );
        }

        tracing::info!("----> Done (best test accuracy {:.2}%)", self.best.value() * 100.0);
        Ok(history)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, fs, path::Path, sync::Arc};

    use anyhow::anyhow;
    use burn::{
        backend::NdArray,
        data::dataloader::DataLoader,
        nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
        prelude::*,
    };

    use crate::data::{
        batcher::{build_test_loader, ImageBatch},
        dataset::{ImageDataset, ImageSample},
    };
    use crate::domain::metrics::EpochMetrics;
    use crate::ml::{
        model::ImageClassifier,
        steps::{evaluate_step, Progress},
    };

    /// Replays fixed per-epoch test accuracies and records call order.
    struct ScriptedRunner {
        test_acc: Vec<f64>,
        calls:    RefCell<Vec<String>>,
        fail_at:  Option<usize>,
    }

    impl ScriptedRunner {
        fn new(test_acc: &[f64]) -> Self {
            Self { test_acc: test_acc.to_vec(), calls: RefCell::new(Vec::new()), fail_at: None }
        }
    }

    impl EpochRunner for ScriptedRunner {
        fn train_epoch(&mut self, epoch: usize) -> Result<EpochMetrics> {
            if self.fail_at == Some(epoch) {
                return Err(anyhow!("device out of memory"));
            }
            self.calls.borrow_mut().push(format!("train {epoch}"));
            Ok(EpochMetrics::new(1.0 / epoch as f64, 0.5))
        }

        fn evaluate(&self, epoch: usize) -> Result<EpochMetrics> {
            self.calls.borrow_mut().push(format!("eval {epoch}"));
            Ok(EpochMetrics::new(1.0, self.test_acc[epoch - 1]))
        }

        fn snapshot(&self) -> Result<Vec<u8>> {
            let epoch = self.calls.borrow().len() / 2;
            Ok(format!("weights after epoch {epoch}").into_bytes())
        }
    }

    fn checkpoint_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("checkpoint_"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_two_epoch_scenario_writes_two_checkpoints() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[0.5, 1.0]);

        let mut driver = EpochDriver::new(2, &mgr);
        let history    = driver.run(&mut runner).unwrap();

        assert_eq!(history.test_acc(), &[0.5, 1.0]);
        assert_eq!(checkpoint_names(tmp.path()), vec![
            "checkpoint_100.0000%.mpk".to_string(),
            "checkpoint_50.0000%.mpk".to_string(),
        ]);
        assert_eq!(driver.best_accuracy(), 1.0);
    }

    /// Scores that ignore the pixels: one fixed `[batch, 2]` table per epoch.
    struct FixedLogits {
        rows: Vec<[f32; 2]>,
    }

    impl<B: Backend> ImageClassifier<B> for FixedLogits {
        fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
            let flat: Vec<f32> = self.rows.iter().flatten().copied().collect();
            Tensor::<B, 1>::from_floats(flat.as_slice(), &images.device()).reshape([self.rows.len(), 2])
        }
    }

    /// Evaluates the epoch's FixedLogits through the real evaluate step.
    struct FixedLogitsRunner {
        per_epoch: Vec<FixedLogits>,
        loader:    Arc<dyn DataLoader<ImageBatch<NdArray>>>,
        loss_fn:   CrossEntropyLoss<NdArray>,
    }

    impl EpochRunner for FixedLogitsRunner {
        fn train_epoch(&mut self, _epoch: usize) -> Result<EpochMetrics> {
            Ok(EpochMetrics::new(0.7, 0.5))
        }

        fn evaluate(&self, epoch: usize) -> Result<EpochMetrics> {
            let progress = Progress { phase: "Test", epoch, num_epochs: self.per_epoch.len(), log_every: 0 };
            evaluate_step(&self.per_epoch[epoch - 1], self.loader.as_ref(), &self.loss_fn, progress)
        }

        fn snapshot(&self) -> Result<Vec<u8>> {
            Ok(b"weights".to_vec())
        }
    }

    #[test]
    fn test_fixed_logits_score_half_then_all_and_checkpoint_twice() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = burn::backend::ndarray::NdArrayDevice::default();

        // labels [0, 1], one batch, dataset order
        let samples = vec![
            ImageSample::new(vec![0.0; 3 * 2 * 2], [3, 2, 2], 0),
            ImageSample::new(vec![0.0; 3 * 2 * 2], [3, 2, 2], 1),
        ];
        let mut runner = FixedLogitsRunner {
            per_epoch: vec![
                FixedLogits { rows: vec![[3.0, 0.0], [3.0, 0.0]] }, // only sample 0 right
                FixedLogits { rows: vec![[3.0, 0.0], [0.0, 3.0]] }, // both right
            ],
            loader:  build_test_loader::<NdArray>(ImageDataset::new(samples), 2, 1, device.clone()),
            loss_fn: CrossEntropyLossConfig::new().init(&device),
        };

        let mut driver = EpochDriver::new(2, &mgr);
        let history    = driver.run(&mut runner).unwrap();

        assert_eq!(history.test_acc(), &[0.5, 1.0]);
        assert!(history.test_loss()[1] < history.test_loss()[0]);
        assert_eq!(checkpoint_names(tmp.path()), vec![
            "checkpoint_100.0000%.mpk".to_string(),
            "checkpoint_50.0000%.mpk".to_string(),
        ]);
    }

    #[test]
    fn test_only_strict_improvements_write() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let accs = [0.25, 0.25, 0.5, 0.4, 0.5, 0.75, 0.0];
        let mut runner = ScriptedRunner::new(&accs);

        let mut driver = EpochDriver::new(accs.len(), &mgr);
        let history    = driver.run(&mut runner).unwrap();

        assert_eq!(checkpoint_names(tmp.path()).len(), 3);
        assert_eq!(Some(driver.best_accuracy()), history.best_test_accuracy());
        assert!(tmp.path().join("checkpoint_75.0000%.mpk").exists());

        // the 0.5 file holds the weights of the first epoch that reached it
        let weights = fs::read_to_string(tmp.path().join("checkpoint_50.0000%.mpk")).unwrap();
        assert_eq!(weights, "weights after epoch 3");
    }

    #[test]
    fn test_zero_accuracy_never_checkpoints() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[0.0, 0.0]);

        EpochDriver::new(2, &mgr).run(&mut runner).unwrap();
        assert!(checkpoint_names(tmp.path()).is_empty());
    }

    #[test]
    fn test_history_lengths_match_epochs() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[0.1, 0.2, 0.3, 0.2]);

        let history = EpochDriver::new(4, &mgr).run(&mut runner).unwrap();
        for (name, values) in history.series() {
            assert_eq!(values.len(), 4, "{name}");
        }
        assert!(history.train_acc().iter().chain(history.test_acc()).all(|a| (0.0..=1.0).contains(a)));
    }

    #[test]
    fn test_train_runs_before_evaluate_every_epoch() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[0.1, 0.2]);

        EpochDriver::new(2, &mgr).run(&mut runner).unwrap();
        assert_eq!(*runner.calls.borrow(), vec!["train 1", "eval 1", "train 2", "eval 2"]);
    }

    #[test]
    fn test_step_failure_aborts_run() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[0.5, 0.9, 1.0]);
        runner.fail_at = Some(2);

        let mut driver = EpochDriver::new(3, &mgr);
        assert!(driver.run(&mut runner).is_err());
        // only the first epoch completed
        assert_eq!(checkpoint_names(tmp.path()), vec!["checkpoint_50.0000%.mpk".to_string()]);
        assert_eq!(driver.best_accuracy(), 0.5);
    }

    #[test]
    fn test_metrics_logger_gets_one_row_per_epoch() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path().join("ckpt")).unwrap();
        let logger = MetricsLogger::new(tmp.path().join("out")).unwrap();
        let mut runner = ScriptedRunner::new(&[0.1, 0.2, 0.3]);

        EpochDriver::new(3, &mgr).with_metrics_logger(&logger).run(&mut runner).unwrap();
        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1 + 3);
    }

    #[test]
    fn test_zero_epochs_is_rejected() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path()).unwrap();
        let mut runner = ScriptedRunner::new(&[]);
        assert!(EpochDriver::new(0, &mgr).run(&mut runner).is_err());
    }
}
