// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per completed epoch, so a run that dies
// halfway still leaves its learning curve behind.
//
// Output file: <output_dir>/metrics.csv
//
//   epoch,train_loss,train_acc,test_loss,test_acc
//   1,2.104500,0.312500,1.989200,0.375000
//   2,1.870100,0.437500,1.854300,0.500000
//
// The header is only written when the file is new, so a resumed
// run (--continue-train) keeps appending to the same log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::metrics::EpochMetrics;

const HEADER: &str = "epoch,train_loss,train_acc,test_loss,test_acc";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, epoch: usize, train: &EpochMetrics, test: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            epoch, train.loss, train.accuracy, test.loss, test.accuracy,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_under_one_header() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(1, &EpochMetrics::new(2.0, 0.25), &EpochMetrics::new(1.5, 0.5)).unwrap();

        // a second logger on the same dir must not repeat the header
        let again = MetricsLogger::new(tmp.path()).unwrap();
        again.log(2, &EpochMetrics::new(1.0, 0.5), &EpochMetrics::new(1.25, 0.75)).unwrap();

        let text = fs::read_to_string(again.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "1,2.000000,0.250000,1.500000,0.500000",
            "2,1.000000,0.500000,1.250000,0.750000",
        ]);
    }
}
