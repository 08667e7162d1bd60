//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDateTime, TimeDelta};

use crate::config::*;

use mmc_covariance::CovarianceConfig;
use mmc_decompose::{DecomposeConfig, Execution, MeanMode, SmoothingParams};
use mmc_distribution::DistributionRequest;
use mmc_field::Dim;
use mmc_io::TowerConfig;
use mmc_spectra::{Detrend, PsdConfig, SpectralRequest, WindowKind};

/// Parses a dimension name such as `"time"` or `"west_east"`.
pub fn parse_dim(s: &str) -> Result<Dim> {
    s.parse()
        .with_context(|| format!("invalid dimension {s:?}"))
}

/// Parses `YYYY-MM-DDTHH:MM:SS` (a space also separates date and time).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .with_context(|| format!("invalid timestamp {s:?}"))
}

/// Builds a [`DecomposeConfig`] from the `[mean]` table.
pub fn build_decompose_config(mean: &MeanToml) -> Result<DecomposeConfig> {
    let params = SmoothingParams::new(mean.window_size)
        .with_delta(mean.delta)
        .with_iterations(mean.iterations);
    let mode = MeanMode::parse(&mean.mode, params)?;
    let execution = if mean.parallel {
        Execution::Parallel
    } else {
        Execution::Sequential
    };
    let config = DecomposeConfig::new(parse_dim(&mean.dim)?)
        .with_mode(mode)
        .with_execution(execution);
    config.validate()?;
    Ok(config)
}

/// Builds a [`SpectralRequest`] from the `[spectra]` table.
pub fn build_spectral_request(spectra: &SpectraToml) -> Result<SpectralRequest> {
    let mut request = SpectralRequest::new(
        parse_dim(&spectra.spectral_dim)?,
        parse_dim(&spectra.average_dim)?,
    );
    if let Some(ref levels) = spectra.levels {
        request = request.with_levels(levels.clone());
    }
    if let Some(ref locations) = spectra.locations {
        request = request.with_locations(locations.clone());
    }
    request.validate()?;
    Ok(request)
}

/// Builds the tower [`PsdConfig`] from the `[spectra]` table.
pub fn build_psd_config(spectra: &SpectraToml) -> Result<PsdConfig> {
    if spectra.segment_seconds <= 0 {
        bail!(
            "segment_seconds must be positive, got {}",
            spectra.segment_seconds
        );
    }
    let window: WindowKind = spectra.window.parse()?;
    let detrend: Detrend = spectra.detrend.parse()?;
    Ok(PsdConfig::new()
        .with_segment(TimeDelta::seconds(spectra.segment_seconds))
        .with_window(window)
        .with_detrend(detrend))
}

/// Builds a [`DistributionRequest`] with `n_bins` equal-width bins.
pub fn build_distribution_request(dist: &DistributionToml) -> Result<DistributionRequest> {
    if dist.n_bins == 0 {
        bail!("n_bins must be at least 1");
    }
    let width = (dist.bin_max - dist.bin_min) / dist.n_bins as f64;
    let edges: Vec<f64> = (0..=dist.n_bins)
        .map(|i| dist.bin_min + width * i as f64)
        .collect();
    let mut request = DistributionRequest::new(parse_dim(&dist.location_dim)?, edges);
    if let Some(ref levels) = dist.levels {
        request = request.with_levels(levels.clone());
    }
    if let Some(ref locations) = dist.locations {
        request = request.with_locations(locations.clone());
    }
    request.validate()?;
    Ok(request)
}

/// Builds a [`CovarianceConfig`] from the `[covariance]` table.
pub fn build_covariance_config(cov: &CovarianceToml) -> Result<CovarianceConfig> {
    let config = CovarianceConfig::new(cov.interval.parse()?)
        .with_resample(cov.resample)
        .with_centered(cov.centered);
    config.validate()?;
    Ok(config)
}

/// Builds a [`TowerConfig`] from the `[tower]` table.
pub fn build_tower_config(tower: &TowerToml) -> Result<TowerConfig> {
    Ok(TowerConfig::new(parse_timestamp(&tower.start)?).with_surface(tower.surface))
}
