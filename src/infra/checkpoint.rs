// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights.
//
// What gets written to the checkpoint directory:
//   1. checkpoint_<acc%>.mpk — weights, one per new best accuracy
//   2. train_config.json     — the run configuration
//   3. classes.json          — class names in label order
//
// File naming:
//   checkpoints/
//     checkpoint_50.0000%.mpk   ← first epoch, 50% test accuracy
//     checkpoint_87.5000%.mpk   ← a later, better epoch
//
// Weights are encoded with Burn's NamedMpkBytesRecorder and the
// bytes are written by us. Burn's file recorders replace the path
// extension, which would eat the ".0000%" part of the name.
//
// Only parameters are stored: no optimizer state, no epoch.
// Files are never overwritten or pruned.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;

pub const CHECKPOINT_EXTENSION: &str = "mpk";

type WeightsRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// `checkpoint_<accuracy*100 to 4 decimals>%.mpk`
pub fn checkpoint_file_name(accuracy: f64) -> String {
    format!("checkpoint_{:.4}%.{}", accuracy * 100.0, CHECKPOINT_EXTENSION)
}

/// Serialise a model's parameters (and nothing else) to bytes.
pub fn encode_weights<B: Backend, M: Module<B>>(model: &M) -> Result<Vec<u8>> {
    <WeightsRecorder as Recorder<B>>::record(&WeightsRecorder::default(), model.clone().into_record(), ())
        .context("Failed to encode model weights")
}

/// Load encoded weights into `model`.
///
/// Field names are checked by the record decoder. Shapes are only
/// checked through the total parameter count, which must equal the
/// count of the model they are loaded into.
pub fn decode_weights<B: Backend, M: Module<B>>(
    model:  M,
    bytes:  Vec<u8>,
    device: &B::Device,
) -> Result<M> {
    let expected = model.num_params();

    let record: M::Record = <WeightsRecorder as Recorder<B>>::load(&WeightsRecorder::default(), bytes, device)
        .context("Checkpoint does not match the model's parameter structure")?;
    let model = model.load_record(record);

    let found = model.num_params();
    if found != expected {
        bail!(
            "Checkpoint holds {} parameters but the model has {}",
            found,
            expected
        );
    }
    Ok(model)
}

/// Read a checkpoint file from disk and load it into `model`.
pub fn load_weights<B: Backend, M: Module<B>>(
    model:  M,
    path:   &Path,
    device: &B::Device,
) -> Result<M> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;
    decode_weights(model, bytes, device)
        .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))
}

/// Manages the files of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write already-encoded weights under the accuracy-derived name.
    pub fn save_best(&self, weights: &[u8], accuracy: f64) -> Result<PathBuf> {
        let path = self.dir.join(checkpoint_file_name(accuracy));
        fs::write(&path, weights)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved checkpoint '{}' ({} bytes)", path.display(), weights.len());
        Ok(path)
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'evaluate'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_classes(&self, classes: &[String]) -> Result<()> {
        let path = self.dir.join("classes.json");
        fs::write(&path, serde_json::to_string_pretty(classes)?)
            .with_context(|| format!("Cannot write class list to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_classes(&self) -> Result<Vec<String>> {
        let path = self.dir.join("classes.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read class list from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::model::{Cnn, CnnConfig};

    #[test]
    fn test_file_name_format() {
        assert_eq!(checkpoint_file_name(0.5), "checkpoint_50.0000%.mpk");
        assert_eq!(checkpoint_file_name(1.0), "checkpoint_100.0000%.mpk");
        assert_eq!(checkpoint_file_name(0.123456), "checkpoint_12.3456%.mpk");
    }

    #[test]
    fn test_save_best_keeps_full_name_and_never_overwrites_others() {
        let tmp  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(tmp.path().join("ckpt")).unwrap();
        let a = mgr.save_best(b"first", 0.5).unwrap();
        let b = mgr.save_best(b"second", 0.75).unwrap();

        assert_eq!(a.file_name().unwrap(), "checkpoint_50.0000%.mpk");
        assert_eq!(fs::read(&a).unwrap(), b"first");
        assert_eq!(fs::read(&b).unwrap(), b"second");
    }

    #[test]
    fn test_weights_round_trip_through_file() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let model: Cnn<NdArray> = CnnConfig::new(4).init(&device);
        let path = mgr.save_best(&encode_weights(&model).unwrap(), 0.25).unwrap();

        let fresh: Cnn<NdArray> = CnnConfig::new(4).init(&device);
        let loaded = load_weights(fresh, &path, &device).unwrap();

        let expected: Vec<f32> = model.fc2.weight.val().into_data().to_vec().unwrap();
        let actual: Vec<f32>   = loaded.fc2.weight.val().into_data().to_vec().unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_mismatched_architecture_is_rejected() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let three: Cnn<NdArray> = CnnConfig::new(3).init(&device);
        let path = mgr.save_best(&encode_weights(&three).unwrap(), 0.9).unwrap();

        let two: Cnn<NdArray> = CnnConfig::new(2).init(&device);
        assert!(load_weights(two, &path, &device).is_err());
    }

    #[test]
    fn test_narrower_conv_layers_are_rejected() {
        let device = Default::default();
        let narrow: Cnn<NdArray> = CnnConfig::new(2).with_filters(8).init(&device);
        let bytes = encode_weights(&narrow).unwrap();

        let wide: Cnn<NdArray> = CnnConfig::new(2).init(&device);
        assert!(decode_weights(wide, bytes, &device).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let device = Default::default();
        let model: Cnn<NdArray> = CnnConfig::new(2).init(&device);
        assert!(load_weights(model, Path::new("/nonexistent/checkpoint.mpk"), &device).is_err());
    }

    #[test]
    fn test_classes_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        let classes = vec!["cat".to_string(), "dog".to_string()];
        mgr.save_classes(&classes).unwrap();
        assert_eq!(mgr.load_classes().unwrap(), classes);
    }
}
