//! Tower command: tslist reader -> decomposition -> PSD and heat flux per level.

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use mmc_covariance::{CovarianceConfig, LeveledSeries, Series, covariance};
use mmc_decompose::{TurbulenceStats, turbulence_statistics};
use mmc_field::{Dataset, Dim, Field, ProgressEvent};
use mmc_formulas::fit_power_law_alpha;
use mmc_io::read_tower;
use mmc_spectra::{PsdConfig, power_spectral_density};

use crate::cli::TowerArgs;
use crate::config::MmcConfig;
use crate::convert;
use crate::output::{
    PsdSummary, ShearSummary, TowerLevel, TowerSummary, nan_mean, peak_frequency, write_json,
};

/// Run the tower analysis.
pub fn run(args: TowerArgs) -> Result<()> {
    let _cmd = info_span!("tower").entered();
    let config = MmcConfig::load_or_default(&args.config)?;

    let tower_cfg = convert::build_tower_config(&config.tower)?;
    let decompose_cfg = convert::build_decompose_config(&config.mean)?;
    let psd_cfg = convert::build_psd_config(&config.spectra)?;
    let cov_cfg = convert::build_covariance_config(&config.covariance)?;

    info!(prefix = %args.prefix.display(), "reading tower");
    let tower = read_tower(&args.prefix, &tower_cfg)
        .with_context(|| format!("failed to read tower: {}", args.prefix.display()))?;
    let fields = &tower.fields;
    let Some([nt, nz, _, _]) = fields.shape() else {
        bail!("tower holds no fields");
    };

    let stats = turbulence_statistics(fields, &decompose_cfg, &log_progress)
        .context("turbulence statistics failed")?;
    info!(mode = stats.record().mode.name(), "decomposition complete");

    let heat_flux = heat_flux_by_level(fields, tower.heights.as_deref(), &cov_cfg)?;

    let levels = (0..nz)
        .into_par_iter()
        .map(|k| {
            let psd = config
                .tower
                .psd_variables
                .iter()
                .map(|var| level_psd(&stats, fields.times(), var, k, &psd_cfg))
                .collect::<Result<Vec<_>>>()?;
            Ok(TowerLevel {
                index: k,
                height: tower.heights.as_ref().map(|h| h[k]),
                mean_speed: level_mean(&stats, "UMean", k)?,
                mean_direction: level_mean(&stats, "UdirMean", k)?,
                tke: nan_mean(&stats.tke().lane(Dim::Time, [0, k, 0, 0])),
                heat_flux: heat_flux[k],
                psd,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let shear = match tower.heights.as_deref() {
        Some(heights) => shear_fit(heights, &levels),
        None => {
            warn!("no PH profile, skipping power-law fit");
            None
        }
    };

    let summary = TowerSummary {
        station: tower.surface.as_ref().map(|s| s.header.name.clone()),
        n_times: nt,
        n_levels: nz,
        mean_mode: stats.record().mode.name().to_string(),
        shear,
        levels,
    };
    write_json(&summary, args.output.as_deref())
}

pub(crate) fn log_progress(event: &ProgressEvent) {
    tracing::trace!(
        stage = %event.stage,
        completed = event.completed,
        total = event.total,
        "step"
    );
}

/// Time-mean of a named mean field at level `k`.
fn level_mean(stats: &TurbulenceStats, name: &str, k: usize) -> Result<f64> {
    let field = stats
        .mean(name)
        .with_context(|| format!("mean {name} missing"))?;
    Ok(nan_mean(&field.lane(Dim::Time, [0, k, 0, 0])))
}

/// Welch PSD of the perturbation of `var` at level `k`.
fn level_psd(
    stats: &TurbulenceStats,
    times: &[NaiveDateTime],
    var: &str,
    k: usize,
    config: &PsdConfig,
) -> Result<PsdSummary> {
    let decomposition = stats
        .decomposition(var)
        .with_context(|| format!("no decomposition for {var:?}"))?;
    let series = decomposition.perturbation().lane(Dim::Time, [0, k, 0, 0]);
    let spectrum = power_spectral_density(&series, times, config)
        .with_context(|| format!("PSD failed for {var} at level {k}"))?;
    Ok(PsdSummary {
        variable: var.to_string(),
        n_segments: spectrum.n_segments,
        peak_frequency: peak_frequency(&spectrum.frequencies, &spectrum.power),
        frequencies: spectrum.frequencies,
        power: spectrum.power,
    })
}

/// Mean windowed `w'theta'` covariance per level, computed on the leveled
/// stack of all levels.
fn heat_flux_by_level(
    fields: &impl Dataset,
    heights: Option<&[f64]>,
    config: &CovarianceConfig,
) -> Result<Vec<f64>> {
    let w = fields.require("w")?;
    let theta = fields.require("theta")?;
    let nz = w.len_of(Dim::Height);
    let level_of = |k: usize| heights.map_or(k as f64, |h| h[k]);

    let a = stack_levels(w, &level_of)?;
    let b = stack_levels(theta, &level_of)?;
    let cov = covariance(&a.into(), &b.into(), config).context("heat flux covariance failed")?;
    let Series::Leveled(cov) = cov else {
        bail!("covariance of leveled inputs must be leveled");
    };

    Ok((0..nz)
        .map(|k| {
            let level = level_of(k);
            nan_mean(
                cov.levels()
                    .iter()
                    .zip(cov.values())
                    .filter(|(l, _)| l.total_cmp(&level).is_eq())
                    .map(|(_, v)| v),
            )
        })
        .collect())
}

fn stack_levels(field: &Field, level_of: &impl Fn(usize) -> f64) -> Result<LeveledSeries> {
    let nz = field.len_of(Dim::Height);
    let mut times = Vec::new();
    let mut levels = Vec::new();
    let mut values = Vec::new();
    for k in 0..nz {
        times.extend_from_slice(field.times());
        levels.extend(std::iter::repeat_n(level_of(k), field.times().len()));
        values.extend(field.lane(Dim::Time, [0, k, 0, 0]));
    }
    Ok(LeveledSeries::new(times, levels, values)?)
}

/// Fits the shear exponent through the lowest level above ground.
fn shear_fit(heights: &[f64], levels: &[TowerLevel]) -> Option<ShearSummary> {
    let reference = heights.iter().position(|&z| z > 0.0)?;
    let speed: Vec<f64> = levels.iter().map(|l| l.mean_speed).collect();
    match fit_power_law_alpha(heights, &speed, heights[reference], speed[reference]) {
        Ok(fit) => Some(ShearSummary {
            reference_height: heights[reference],
            alpha: fit.alpha,
            r_squared: fit.r_squared,
        }),
        Err(e) => {
            warn!(error = %e, "power-law fit failed");
            None
        }
    }
}
