// ============================================================
// Layer 3 — Epoch Metrics, Results History, Watermark
// ============================================================
// Plain bookkeeping types for a training run. Nothing in here
// knows about tensors: the ML layer reduces every batch to a
// (loss, correct, batch_len) triple before it gets here.
//
//   MetricAccumulator  → running sums inside one pass
//   EpochMetrics       → averaged result of one pass
//   ResultsHistory     → four per-epoch series for plotting
//   BestAccuracy       → watermark gating checkpoint writes
//
// Accuracy is the MEAN OF PER-BATCH FRACTIONS, not
// total_correct / total_samples. A short final batch
// therefore weighs as much as a full one.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Average loss and accuracy of one phase (train or test) of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub loss:     f64,
    /// Range: [0.0, 1.0]
    pub accuracy: f64,
}

impl EpochMetrics {
    pub fn new(loss: f64, accuracy: f64) -> Self {
        Self { loss, accuracy }
    }
}

// ─── MetricAccumulator ───────────────────────────────────────────────────────
#[derive(Debug, Default, Clone)]
pub struct MetricAccumulator {
    loss_sum:     f64,
    accuracy_sum: f64,
    batches:      usize,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch: its scalar loss and how many of its
    /// `batch_len` samples were classified correctly.
    pub fn update(&mut self, loss: f64, correct: usize, batch_len: usize) {
        self.loss_sum += loss;
        if batch_len > 0 {
            self.accuracy_sum += correct as f64 / batch_len as f64;
        }
        self.batches += 1;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Loss averaged over the batches seen so far (0 before the first batch).
    pub fn running_loss(&self) -> f64 {
        if self.batches == 0 { return 0.0; }
        self.loss_sum / self.batches as f64
    }

    pub fn running_accuracy(&self) -> f64 {
        if self.batches == 0 { return 0.0; }
        self.accuracy_sum / self.batches as f64
    }

    /// Close the pass. A pass over an empty batch source has no
    /// meaningful average and aborts the run.
    pub fn finish(self) -> Result<EpochMetrics> {
        if self.batches == 0 {
            bail!("no batches were produced by the data source");
        }
        Ok(EpochMetrics::new(self.running_loss(), self.running_accuracy()))
    }
}

// ─── ResultsHistory ──────────────────────────────────────────────────────────
/// Per-epoch series handed to plotting at the end of a run.
///
/// The four vectors are private so they can only grow together
/// through [`ResultsHistory::push_epoch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsHistory {
    train_loss: Vec<f64>,
    train_acc:  Vec<f64>,
    test_loss:  Vec<f64>,
    test_acc:   Vec<f64>,
}

impl ResultsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_epoch(&mut self, train: EpochMetrics, test: EpochMetrics) {
        self.train_loss.push(train.loss);
        self.train_acc.push(train.accuracy);
        self.test_loss.push(test.loss);
        self.test_acc.push(test.accuracy);
    }

    /// Number of completed epochs.
    pub fn len(&self) -> usize {
        self.test_acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_acc.is_empty()
    }

    pub fn train_loss(&self) -> &[f64] { &self.train_loss }
    pub fn train_acc(&self)  -> &[f64] { &self.train_acc }
    pub fn test_loss(&self)  -> &[f64] { &self.test_loss }
    pub fn test_acc(&self)   -> &[f64] { &self.test_acc }

    /// `(name, values)` pairs in a fixed order, keyed the way the
    /// history is serialised.
    pub fn series(&self) -> [(&'static str, &[f64]); 4] {
        [
            ("train_loss", &self.train_loss),
            ("train_acc",  &self.train_acc),
            ("test_loss",  &self.test_loss),
            ("test_acc",   &self.test_acc),
        ]
    }

    pub fn best_test_accuracy(&self) -> Option<f64> {
        self.test_acc.iter().copied().reduce(f64::max)
    }
}

// ─── BestAccuracy ────────────────────────────────────────────────────────────
/// Highest test accuracy seen so far in a run. Starts at 0 and never
/// decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestAccuracy(f64);

impl BestAccuracy {
    pub fn new() -> Self {
        Self(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Raise the watermark if `accuracy` is strictly higher.
    /// Returns true when it moved; ties return false.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        if accuracy > self.0 {
            self.0 = accuracy;
            true
        } else {
            false
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_averages_per_batch_fractions() {
        let mut acc = MetricAccumulator::new();
        acc.update(1.0, 4, 4); // 1.0
        acc.update(3.0, 0, 1); // 0.0, short final batch
        let m = acc.finish().unwrap();
        assert_eq!(m.loss, 2.0);
        // per-batch mean, not 4 / 5
        assert_eq!(m.accuracy, 0.5);
    }

    #[test]
    fn test_running_values_before_first_batch() {
        let acc = MetricAccumulator::new();
        assert_eq!(acc.running_loss(), 0.0);
        assert_eq!(acc.running_accuracy(), 0.0);
    }

    #[test]
    fn test_empty_pass_is_an_error() {
        assert!(MetricAccumulator::new().finish().is_err());
    }

    #[test]
    fn test_history_series_grow_together() {
        let mut h = ResultsHistory::new();
        h.push_epoch(EpochMetrics::new(1.0, 0.2), EpochMetrics::new(1.1, 0.5));
        h.push_epoch(EpochMetrics::new(0.8, 0.4), EpochMetrics::new(0.9, 0.25));
        for (_, values) in h.series() {
            assert_eq!(values.len(), 2);
        }
        assert_eq!(h.len(), 2);
        assert_eq!(h.best_test_accuracy(), Some(0.5));
    }

    #[test]
    fn test_history_json_keys() {
        let mut h = ResultsHistory::new();
        h.push_epoch(EpochMetrics::new(1.0, 0.5), EpochMetrics::new(2.0, 0.25));
        let json = serde_json::to_value(&h).unwrap();
        for key in ["train_loss", "train_acc", "test_loss", "test_acc"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_watermark_only_moves_on_strict_improvement() {
        let mut best = BestAccuracy::new();
        assert_eq!(best.value(), 0.0);
        assert!(!best.observe(0.0));
        assert!(best.observe(0.5));
        assert!(!best.observe(0.5));
        assert!(!best.observe(0.3));
        assert!(best.observe(0.75));
        assert_eq!(best.value(), 0.75);
    }
}
