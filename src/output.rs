//! JSON summaries written by the subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Result of `mmc tower`.
#[derive(Debug, Serialize)]
pub struct TowerSummary {
    pub station: Option<String>,
    pub n_times: usize,
    pub n_levels: usize,
    pub mean_mode: String,
    pub shear: Option<ShearSummary>,
    pub levels: Vec<TowerLevel>,
}

/// Power-law fit of the time-mean wind profile.
#[derive(Debug, Serialize)]
pub struct ShearSummary {
    pub reference_height: f64,
    pub alpha: f64,
    pub r_squared: f64,
}

/// Statistics of one tower level.
#[derive(Debug, Serialize)]
pub struct TowerLevel {
    pub index: usize,
    pub height: Option<f64>,
    pub mean_speed: f64,
    pub mean_direction: f64,
    pub tke: f64,
    /// Mean of the windowed `w'theta'` covariance.
    pub heat_flux: f64,
    pub psd: Vec<PsdSummary>,
}

/// One-sided Welch PSD of one variable.
#[derive(Debug, Serialize)]
pub struct PsdSummary {
    pub variable: String,
    pub n_segments: usize,
    pub peak_frequency: f64,
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

/// Result of `mmc synthetic`.
#[derive(Debug, Serialize)]
pub struct SyntheticSummary {
    pub seed: u64,
    pub shape: [usize; 4],
    pub injected_frequency: f64,
    pub mean_mode: String,
    pub tke_mean: f64,
    pub confidence: ConfidenceSummary,
    pub spectra: Vec<LevelSpectrum>,
    pub distributions: Vec<LevelDistribution>,
}

/// Chi-squared confidence factors of the averaged spectra.
#[derive(Debug, Serialize)]
pub struct ConfidenceSummary {
    pub probability: f64,
    pub degrees_of_freedom: usize,
    pub lower: f64,
    pub upper: f64,
}

/// Location-averaged spectrum and cospectrum of one level.
#[derive(Debug, Serialize)]
pub struct LevelSpectrum {
    pub level: usize,
    pub peak_frequency: f64,
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
    pub uw_cospectrum: Vec<f64>,
}

/// Location-summed histogram and mean moments of one level.
#[derive(Debug, Serialize)]
pub struct LevelDistribution {
    pub level: usize,
    pub bin_centers: Vec<f64>,
    pub counts: Vec<usize>,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Frequency of the largest value, skipping the mean (zero-frequency) bin.
pub fn peak_frequency(frequencies: &[f64], power: &[f64]) -> f64 {
    frequencies
        .iter()
        .zip(power)
        .skip(1)
        .filter(|(_, p)| !p.is_nan())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(f64::NAN, |(f, _)| *f)
}

/// Mean of the non-NaN entries; NaN if there are none.
pub fn nan_mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Writes `value` as pretty JSON to `path`, or to stdout.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise summary")?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write summary: {}", path.display()))?;
            info!(path = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
