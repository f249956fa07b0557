// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Used when no separate test folder is configured: shuffles
// the training samples and carves off a held-out set.
//
// The shuffle is driven by a seeded StdRng so the same seed
// always produces the same split, which keeps a resumed run
// evaluating on the same held-out images.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, test).
///
/// `train_fraction` is the proportion kept for training, e.g. 0.8.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let held_out = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test ({}% / {}%)",
        samples.len(),
        held_out.len(),
        (samples.len()  * 100) / total.max(1),
        (held_out.len() * 100) / total.max(1),
    );

    (samples, held_out)
}
