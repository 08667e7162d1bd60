use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level mmc configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MmcConfig {
    /// Global RNG seed for synthetic data.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Mean/perturbation decomposition settings.
    #[serde(default)]
    pub mean: MeanToml,

    /// Spectral estimator settings.
    #[serde(default)]
    pub spectra: SpectraToml,

    /// Distribution estimator settings.
    #[serde(default)]
    pub distribution: DistributionToml,

    /// Covariance settings.
    #[serde(default)]
    pub covariance: CovarianceToml,

    /// Tower reader and tower PSD settings.
    #[serde(default)]
    pub tower: TowerToml,

    /// Synthetic model-grid settings.
    #[serde(default)]
    pub synthetic: SyntheticToml,
}

impl MmcConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text).context("failed to parse TOML config")
    }

    /// Uses the defaults when `path` does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }
}

fn default_true() -> bool {
    true
}

// ---- [mean] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeanToml {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_mean_dim")]
    pub dim: String,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default)]
    pub delta: f64,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for MeanToml {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            dim: default_mean_dim(),
            window_size: default_window_size(),
            delta: 0.0,
            iterations: default_iterations(),
            parallel: true,
        }
    }
}

fn default_mode() -> String {
    "static".to_string()
}
fn default_mean_dim() -> String {
    "time".to_string()
}
fn default_window_size() -> usize {
    600
}
fn default_iterations() -> usize {
    3
}

// ---- [spectra] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpectraToml {
    #[serde(default = "default_spectral_dim")]
    pub spectral_dim: String,
    #[serde(default = "default_average_dim")]
    pub average_dim: String,
    #[serde(default)]
    pub levels: Option<Vec<usize>>,
    #[serde(default)]
    pub locations: Option<Vec<usize>>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: i64,
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default = "default_detrend")]
    pub detrend: String,
}

impl Default for SpectraToml {
    fn default() -> Self {
        Self {
            spectral_dim: default_spectral_dim(),
            average_dim: default_average_dim(),
            levels: None,
            locations: None,
            confidence: default_confidence(),
            segment_seconds: default_segment_seconds(),
            window: default_window(),
            detrend: default_detrend(),
        }
    }
}

fn default_spectral_dim() -> String {
    "time".to_string()
}
fn default_average_dim() -> String {
    "y".to_string()
}
fn default_confidence() -> f64 {
    0.95
}
fn default_segment_seconds() -> i64 {
    600
}
fn default_window() -> String {
    "hann".to_string()
}
fn default_detrend() -> String {
    "linear".to_string()
}

// ---- [distribution] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionToml {
    #[serde(default = "default_location_dim")]
    pub location_dim: String,
    #[serde(default = "default_bin_min")]
    pub bin_min: f64,
    #[serde(default = "default_bin_max")]
    pub bin_max: f64,
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    #[serde(default)]
    pub levels: Option<Vec<usize>>,
    #[serde(default)]
    pub locations: Option<Vec<usize>>,
}

impl Default for DistributionToml {
    fn default() -> Self {
        Self {
            location_dim: default_location_dim(),
            bin_min: default_bin_min(),
            bin_max: default_bin_max(),
            n_bins: default_n_bins(),
            levels: None,
            locations: None,
        }
    }
}

fn default_location_dim() -> String {
    "x".to_string()
}
fn default_bin_min() -> f64 {
    -5.0
}
fn default_bin_max() -> f64 {
    5.0
}
fn default_n_bins() -> usize {
    50
}

// ---- [covariance] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovarianceToml {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub resample: bool,
    #[serde(default)]
    pub centered: bool,
}

impl Default for CovarianceToml {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            resample: false,
            centered: false,
        }
    }
}

fn default_interval() -> String {
    "10min".to_string()
}

// ---- [tower] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TowerToml {
    /// Timestamp of model hour zero, `YYYY-MM-DDTHH:MM:SS`.
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_true")]
    pub surface: bool,
    #[serde(default = "default_psd_variables")]
    pub psd_variables: Vec<String>,
}

impl Default for TowerToml {
    fn default() -> Self {
        Self {
            start: default_start(),
            surface: true,
            psd_variables: default_psd_variables(),
        }
    }
}

fn default_start() -> String {
    "2013-11-08T00:00:00".to_string()
}
fn default_psd_variables() -> Vec<String> {
    vec!["w".to_string(), "wspd".to_string()]
}

// ---- [synthetic] ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticToml {
    #[serde(default = "default_shape")]
    pub shape: [usize; 4],
    #[serde(default = "default_dt")]
    pub dt_seconds: f64,
    #[serde(default = "default_spacing")]
    pub dx: f64,
    #[serde(default = "default_spacing")]
    pub dy: f64,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_mean_wind")]
    pub mean_wind: f64,
    #[serde(default = "default_noise")]
    pub noise: f64,
    #[serde(default = "default_wave_amplitude")]
    pub wave_amplitude: f64,
    #[serde(default = "default_wave_period")]
    pub wave_period_seconds: f64,
}

impl Default for SyntheticToml {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            dt_seconds: default_dt(),
            dx: default_spacing(),
            dy: default_spacing(),
            start: default_start(),
            mean_wind: default_mean_wind(),
            noise: default_noise(),
            wave_amplitude: default_wave_amplitude(),
            wave_period_seconds: default_wave_period(),
        }
    }
}

fn default_shape() -> [usize; 4] {
    [3600, 5, 10, 10]
}
fn default_dt() -> f64 {
    1.0
}
fn default_spacing() -> f64 {
    30.0
}
fn default_mean_wind() -> f64 {
    8.0
}
fn default_noise() -> f64 {
    0.3
}
fn default_wave_amplitude() -> f64 {
    1.0
}
fn default_wave_period() -> f64 {
    60.0
}
