// ============================================================
// Layer 6 — Learning Curves
// ============================================================
// Turns a finished ResultsHistory into files a person can look at:
//
//   results.json          the four per-epoch series
//   learning_curves.svg   loss panel + accuracy panel,
//                         train in blue, test in orange
//
// The SVG is plain text, so there is no rendering dependency.

use anyhow::{Context, Result};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::metrics::ResultsHistory;

const PANEL_WIDTH:  f64 = 420.0;
const PANEL_HEIGHT: f64 = 300.0;
const MARGIN:       f64 = 45.0;
const TRAIN_COLOR:  &str = "#1f77b4";
const TEST_COLOR:   &str = "#ff7f0e";

/// Files written by [`plot_curves`].
#[derive(Debug, Clone)]
pub struct CurveArtifacts {
    pub json: PathBuf,
    pub svg:  PathBuf,
}

pub fn plot_curves(history: &ResultsHistory, out_dir: &Path) -> Result<CurveArtifacts> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Cannot create output directory '{}'", out_dir.display()))?;

    let json = out_dir.join("results.json");
    fs::write(&json, serde_json::to_string_pretty(history)?)
        .with_context(|| format!("Cannot write '{}'", json.display()))?;

    let svg = out_dir.join("learning_curves.svg");
    fs::write(&svg, render_svg(history))
        .with_context(|| format!("Cannot write '{}'", svg.display()))?;

    tracing::info!("Learning curves written to '{}'", svg.display());
    Ok(CurveArtifacts { json, svg })
}

pub fn render_svg(history: &ResultsHistory) -> String {
    let width  = PANEL_WIDTH * 2.0;
    let mut svg = String::new();

    // writing into a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{PANEL_HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    let loss_max = history
        .train_loss()
        .iter()
        .chain(history.test_loss())
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let loss_top = if loss_max > 0.0 { loss_max * 1.1 } else { 1.0 };

    panel(&mut svg, 0.0, "Loss", loss_top, history.train_loss(), history.test_loss());
    panel(&mut svg, PANEL_WIDTH, "Accuracy", 1.0, history.train_acc(), history.test_acc());

    svg.push_str("</svg>\n");
    svg
}

fn panel(svg: &mut String, x0: f64, title: &str, y_top: f64, train: &[f64], test: &[f64]) {
    let left   = x0 + MARGIN;
    let right  = x0 + PANEL_WIDTH - MARGIN / 2.0;
    let top    = MARGIN / 1.5;
    let bottom = PANEL_HEIGHT - MARGIN;
    let epochs = train.len().max(test.len());

    let _ = writeln!(svg, r#"<text x="{}" y="{}" text-anchor="middle" font-size="14">{title}</text>"#, (left + right) / 2.0, top - 10.0);
    let _ = writeln!(svg, r#"<line x1="{left}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="black"/>"#);
    let _ = writeln!(svg, r#"<line x1="{left}" y1="{top}" x2="{left}" y2="{bottom}" stroke="black"/>"#);
    let _ = writeln!(svg, r#"<text x="{}" y="{}" text-anchor="end">{:.2}</text>"#, left - 4.0, top + 4.0, y_top);
    let _ = writeln!(svg, r#"<text x="{}" y="{}" text-anchor="end">0</text>"#, left - 4.0, bottom + 4.0);
    let _ = writeln!(svg, r#"<text x="{}" y="{}" text-anchor="middle">epoch</text>"#, (left + right) / 2.0, bottom + 30.0);

    let to_x = |i: usize| {
        if epochs <= 1 {
            (left + right) / 2.0
        } else {
            left + (right - left) * i as f64 / (epochs - 1) as f64
        }
    };
    let to_y = |v: f64| bottom - (bottom - top) * (v / y_top).clamp(0.0, 1.0);

    for i in 0..epochs {
        let _ = writeln!(svg, r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#, to_x(i), bottom + 15.0, i + 1);
    }

    for (values, color, label, row) in [(train, TRAIN_COLOR, "train", 0.0), (test, TEST_COLOR, "test", 1.0)] {
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| format!("{:.2},{:.2}", to_x(i), to_y(*v)))
            .collect();
        if points.len() > 1 {
            let _ = writeln!(svg, r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#, points.join(" "));
        }
        for p in &points {
            let (cx, cy) = p.split_once(',').unwrap_or(("0", "0"));
            let _ = writeln!(svg, r#"<circle cx="{cx}" cy="{cy}" r="3" fill="{color}"/>"#);
        }

        let ly = top + 12.0 + row * 16.0;
        let _ = writeln!(svg, r#"<line x1="{}" y1="{ly}" x2="{}" y2="{ly}" stroke="{color}" stroke-width="2"/>"#, right - 70.0, right - 50.0);
        let _ = writeln!(svg, r#"<text x="{}" y="{}">{label}</text>"#, right - 45.0, ly + 4.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::EpochMetrics;

    fn history(epochs: usize) -> ResultsHistory {
        let mut h = ResultsHistory::new();
        for e in 0..epochs {
            let f = e as f64;
            h.push_epoch(EpochMetrics::new(2.0 - f * 0.5, 0.3 + f * 0.2), EpochMetrics::new(2.1 - f * 0.4, 0.25 + f * 0.25));
        }
        h
    }

    #[test]
    fn test_svg_has_both_panels_and_series() {
        let svg = render_svg(&history(3));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(">Loss<"));
        assert!(svg.contains(">Accuracy<"));
        // train + test in each panel
        assert_eq!(svg.matches("<polyline").count(), 4);
    }

    #[test]
    fn test_single_epoch_draws_points_only() {
        let svg = render_svg(&history(1));
        assert_eq!(svg.matches("<polyline").count(), 0);
        assert_eq!(svg.matches("<circle").count(), 4);
    }

    #[test]
    fn test_plot_curves_writes_json_and_svg() {
        let tmp = tempfile::tempdir().unwrap();
        let h = history(2);
        let out = plot_curves(&h, &tmp.path().join("out")).unwrap();

        let parsed: ResultsHistory = serde_json::from_str(&fs::read_to_string(&out.json).unwrap()).unwrap();
        assert_eq!(parsed, h);
        assert!(fs::read_to_string(&out.svg).unwrap().contains("<svg"));
    }
}
