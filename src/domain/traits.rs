// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The epoch driver only needs three things from whatever owns
// the model: run a training pass, run an evaluation pass, and
// hand over the current weights as bytes. Putting that behind
// a trait keeps the driver free of burn generics and lets the
// driver tests script exact accuracies.
//
// Implementations:
//   - ml::learner::Learner → burn model + optimizer + loaders
//   - scripted runners in the driver tests

use anyhow::Result;

use crate::domain::metrics::EpochMetrics;

// ─── EpochRunner ──────────────────────────────────────────────────────────────
pub trait EpochRunner {
    /// One pass over the training set with parameter updates.
    fn train_epoch(&mut self, epoch: usize) -> Result<EpochMetrics>;

    /// One pass over the test set. Must not change any parameter.
    fn evaluate(&self, epoch: usize) -> Result<EpochMetrics>;

    /// Serialised model parameters (weights only, no optimizer state).
    fn snapshot(&self) -> Result<Vec<u8>>;
}
