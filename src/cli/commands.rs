// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the image classifier on a folder-per-class dataset
    Train(TrainArgs),

    /// Score a saved checkpoint on a labelled image folder
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training images, one sub-folder per class
    #[arg(long, default_value = "data/train")]
    pub train_dir: String,

    /// Test images with the same sub-folders. Without it, part of
    /// the training folder is held out instead
    #[arg(long)]
    pub test_dir: Option<String>,

    /// Share of --train-dir used for training when --test-dir is absent
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Where checkpoint_<acc>%.mpk files and the run config are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Where metrics.csv, results.json and learning_curves.svg go
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Images are resized to image_size × image_size
    #[arg(long, default_value_t = 64)]
    pub image_size: u32,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value_t = 1e-2)]
    pub lr: f64,

    /// Dropout before the output layer (training only)
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Background threads per data loader
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// Seed for shuffling and the train/test split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print a running loss/accuracy line every N batches (0 = off)
    #[arg(long, default_value_t = 20)]
    pub log_every: usize,

    /// Resume from the weights in --pth-file
    #[arg(long, requires = "pth_file")]
    pub continue_train: bool,

    /// Checkpoint to resume from
    #[arg(long, requires = "continue_train")]
    pub pth_file: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_dir:      a.train_dir,
            test_dir:       a.test_dir,
            train_fraction: a.train_fraction,
            checkpoint_dir: a.checkpoint_dir,
            output_dir:     a.output_dir,
            image_size:     a.image_size,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            dropout:        a.dropout,
            num_workers:    a.num_workers,
            seed:           a.seed,
            log_every:      a.log_every,
            continue_train: a.continue_train,
            pth_file:       a.pth_file,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// A checkpoint_<acc>%.mpk file written by `train`
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// Labelled images, one sub-folder per class
    #[arg(long)]
    pub test_dir: PathBuf,

    /// Folder holding train_config.json and classes.json
    /// (defaults to the checkpoint's folder)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Overrides the batch size saved with the run
    #[arg(long)]
    pub batch_size: Option<usize>,
}
