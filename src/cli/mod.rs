// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`    — runs the epoch loop, writes checkpoints + curves
//   2. `evaluate` — scores one checkpoint on a test folder
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vision-trainer",
    version = "0.1.0",
    about = "Train a small CNN image classifier, keeping a checkpoint for every new best test accuracy."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on images in: {}", args.train_dir);
    let checkpoint_dir = args.checkpoint_dir.clone();
    let output_dir     = args.output_dir.clone();

    let report = TrainUseCase::new(args.into()).execute()?;

    println!("\nTraining complete ({} epochs).", report.history.len());
    println!("  Best test accuracy : {:.2}%", report.best_accuracy * 100.0);
    println!("  Checkpoints        : {}", checkpoint_dir);
    println!("  Learning curves    : {}/learning_curves.svg", output_dir);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.checkpoint, args.test_dir)
        .with_config_dir(args.config_dir)
        .with_batch_size(args.batch_size)
        .execute()?;

    println!("\nClasses  : {}", report.classes.join(", "));
    println!("Images   : {}", report.samples);
    println!("Loss     : {:.4}", report.metrics.loss);
    println!("Accuracy : {:.2}%", report.metrics.accuracy * 100.0);
    Ok(())
}
