//! Synthetic command: seeded model grid -> decomposition -> spectra ->
//! distributions.

use std::f64::consts::PI;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDateTime, TimeDelta};
use ndarray::{Array4, Axis, Zip};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::{info, info_span};

use mmc_decompose::turbulence_statistics;
use mmc_distribution::distributions;
use mmc_field::{DX, DY, Dataset, DatasetKind, Field, FieldSet};
use mmc_formulas::speed_direction;
use mmc_spectra::{SpectralEstimate, cospectra, power_spectra};

use crate::cli::SyntheticArgs;
use crate::config::{MmcConfig, SyntheticToml};
use crate::convert;
use crate::output::{
    ConfidenceSummary, LevelDistribution, LevelSpectrum, SyntheticSummary, nan_mean,
    peak_frequency, write_json,
};
use crate::tower_cmd::log_progress;

/// Run the synthetic pipeline.
pub fn run(args: SyntheticArgs) -> Result<()> {
    let _cmd = info_span!("synthetic").entered();
    let config = MmcConfig::load_or_default(&args.config)?;
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);

    let set = generate(&config.synthetic, seed)?;
    info!(seed, shape = ?set.shape(), "synthetic grid generated");

    let summary = analyse(&set, &config, seed)?;
    write_json(&summary, args.output.as_deref())
}

/// Builds a model-grid dataset with a periodic vertical-velocity signal of
/// `wave_period_seconds` on top of Gaussian noise.
pub(crate) fn generate(cfg: &SyntheticToml, seed: u64) -> Result<FieldSet> {
    let [nt, nz, ny, nx] = cfg.shape;
    if cfg.shape.contains(&0) {
        bail!("synthetic shape must be non-empty, got {:?}", cfg.shape);
    }
    if cfg.dt_seconds <= 0.0 || cfg.wave_period_seconds <= 0.0 {
        bail!("dt_seconds and wave_period_seconds must be positive");
    }
    let start = convert::parse_timestamp(&cfg.start)?;
    let times: Vec<NaiveDateTime> = (0..nt)
        .map(|i| {
            let ms = (i as f64 * cfg.dt_seconds * 1000.0).round() as i64;
            start + TimeDelta::milliseconds(ms)
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, cfg.noise).context("invalid noise level")?;
    let omega = 2.0 * PI / cfg.wave_period_seconds;
    let shape = (nt, nz, ny, nx);

    let u = Array4::from_shape_fn(shape, |(_, z, _, _)| {
        cfg.mean_wind * (1.0 + 0.05 * z as f64) + noise.sample(&mut rng)
    });
    let v = Array4::from_shape_fn(shape, |_| noise.sample(&mut rng));
    let w = Array4::from_shape_fn(shape, |(t, _, _, _)| {
        cfg.wave_amplitude * (omega * t as f64 * cfg.dt_seconds).sin() + noise.sample(&mut rng)
    });
    let theta = Array4::from_shape_fn(shape, |(_, z, _, _)| {
        300.0 + 0.5 * z as f64 + 0.1 * noise.sample(&mut rng)
    });
    let p = Array4::from_shape_fn(shape, |(_, z, _, _)| 1000.0 - 5.0 * z as f64);

    let mut wspd = Array4::zeros(shape);
    let mut wdir = Array4::zeros(shape);
    Zip::from(&mut wspd)
        .and(&mut wdir)
        .and(&u)
        .and(&v)
        .for_each(|s, d, &u, &v| (*s, *d) = speed_direction(u, v));

    let mut set = FieldSet::new(DatasetKind::ModelGrid)
        .with_attr(DX, cfg.dx)
        .with_attr(DY, cfg.dy);
    for (name, data) in [
        ("u", u),
        ("v", v),
        ("w", w),
        ("theta", theta),
        ("p", p),
        ("wspd", wspd),
        ("wdir", wdir),
    ] {
        set.insert(Field::new(name, data, times.clone())?)?;
    }
    Ok(set)
}

/// Runs decomposition, spectra, cospectra and distributions on `set`.
pub(crate) fn analyse(set: &FieldSet, config: &MmcConfig, seed: u64) -> Result<SyntheticSummary> {
    let decompose_cfg = convert::build_decompose_config(&config.mean)?;
    let request = convert::build_spectral_request(&config.spectra)?;
    let dist_request = convert::build_distribution_request(&config.distribution)?;

    let stats = turbulence_statistics(set, &decompose_cfg, &log_progress)
        .context("turbulence statistics failed")?;
    let mean_of = |name: &str| {
        stats
            .mean(name)
            .with_context(|| format!("mean {name} missing"))
    };
    let (u, w) = (set.require("u")?, set.require("w")?);
    let (u_mean, w_mean) = (mean_of("uMean")?, mean_of("wMean")?);

    let spectra = power_spectra(w, w_mean, &request, &log_progress).context("spectra failed")?;
    let uw = cospectra(u, u_mean, w, w_mean, &request, &log_progress)
        .context("cospectra failed")?;
    let (lower, upper) = spectra.confidence_factors(config.spectra.confidence)?;
    info!(
        n_averaged = spectra.n_averaged(),
        lower, upper, "spectra complete"
    );

    let dist = distributions(w, w_mean, &dist_request, &log_progress)
        .context("distributions failed")?;

    let spectra_summary = spectra
        .levels()
        .iter()
        .enumerate()
        .map(|(l, &level)| {
            let power = location_average(&spectra, l);
            LevelSpectrum {
                level,
                peak_frequency: peak_frequency(spectra.frequencies(), &power),
                frequencies: spectra.frequencies().to_vec(),
                power,
                uw_cospectrum: location_average(&uw, l),
            }
        })
        .collect();

    let distribution_summary = dist
        .levels()
        .iter()
        .enumerate()
        .map(|(l, &level)| LevelDistribution {
            level,
            bin_centers: dist.bin_centers(),
            counts: dist
                .counts()
                .index_axis(Axis(0), l)
                .sum_axis(Axis(0))
                .to_vec(),
            skewness: nan_mean(dist.skewness().row(l)),
            kurtosis: nan_mean(dist.kurtosis().row(l)),
        })
        .collect();

    Ok(SyntheticSummary {
        seed,
        shape: config.synthetic.shape,
        injected_frequency: 1.0 / config.synthetic.wave_period_seconds,
        mean_mode: stats.record().mode.name().to_string(),
        tke_mean: nan_mean(stats.tke().data()),
        confidence: ConfidenceSummary {
            probability: config.spectra.confidence,
            degrees_of_freedom: 2 * spectra.n_averaged(),
            lower,
            upper,
        },
        spectra: spectra_summary,
        distributions: distribution_summary,
    })
}

/// Mean spectrum over all locations of level position `l`.
fn location_average(estimate: &SpectralEstimate, l: usize) -> Vec<f64> {
    estimate
        .power()
        .index_axis(Axis(0), l)
        .mean_axis(Axis(0))
        .map_or_else(Vec::new, |m| m.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mmc_field::Dim;

    fn small() -> MmcConfig {
        let mut config = MmcConfig::default();
        config.synthetic.shape = [600, 2, 3, 4];
        config
    }

    #[test]
    fn generated_grid_shape_and_spacing() {
        let config = small();
        let set = generate(&config.synthetic, 3).unwrap();
        assert_eq!(set.kind(), DatasetKind::ModelGrid);
        assert_eq!(set.shape(), Some([600, 2, 3, 4]));
        let w = set.require("w").unwrap();
        assert_eq!(w.spacing(Dim::X).unwrap(), 30.0);
        assert_eq!(w.time_step().unwrap(), 1.0);
    }

    #[test]
    fn same_seed_same_grid() {
        let config = small();
        let a = generate(&config.synthetic, 9).unwrap();
        let b = generate(&config.synthetic, 9).unwrap();
        assert_eq!(a.require("w").unwrap().data(), b.require("w").unwrap().data());
    }

    #[test]
    fn spectral_peak_at_injected_frequency() {
        let config = small();
        let set = generate(&config.synthetic, 20180511).unwrap();
        let summary = analyse(&set, &config, 20180511).unwrap();
        assert_eq!(summary.spectra.len(), 2);
        for level in &summary.spectra {
            assert_eq!(level.frequencies.len(), 300);
            assert_relative_eq!(level.peak_frequency, 1.0 / 60.0, max_relative = 1e-9);
        }
        assert_eq!(summary.confidence.degrees_of_freedom, 6);
        assert!(summary.confidence.lower < 1.0 && summary.confidence.upper > 1.0);
        // 600 times x 3 rows x 4 columns; samples beyond +-5 are dropped.
        let total: usize = summary.distributions[0].counts.iter().sum();
        assert!(total <= 7200);
        assert!(total > 7000);
    }

    #[test]
    fn tke_matches_moments() {
        let config = small();
        let set = generate(&config.synthetic, 1).unwrap();
        let decompose_cfg = convert::build_decompose_config(&config.mean).unwrap();
        let stats = turbulence_statistics(&set, &decompose_cfg, &log_progress).unwrap();
        let uu = stats.moment("UU").unwrap().data();
        let ww = stats.moment("ww").unwrap().data();
        Zip::from(stats.tke().data())
            .and(uu)
            .and(ww)
            .for_each(|&tke, &uu, &ww| assert_eq!(tke, 0.5 * (uu + ww).sqrt()));
    }

    #[test]
    #[ignore = "full 3600 x 5 x 10 x 10 grid - run with --ignored"]
    fn full_grid_end_to_end() {
        let config = MmcConfig::default();
        assert_eq!(config.synthetic.shape, [3600, 5, 10, 10]);
        assert_eq!(config.mean.mode, "static");
        let set = generate(&config.synthetic, 42).unwrap();
        let summary = analyse(&set, &config, 42).unwrap();

        assert_eq!(summary.spectra.len(), 5);
        for level in &summary.spectra {
            assert_eq!(level.frequencies.len(), 1800);
            assert_relative_eq!(level.peak_frequency, 1.0 / 60.0, max_relative = 1e-9);
        }
        assert_eq!(summary.confidence.degrees_of_freedom, 20);

        let decompose_cfg = convert::build_decompose_config(&config.mean).unwrap();
        let stats = turbulence_statistics(&set, &decompose_cfg, &log_progress).unwrap();
        Zip::from(stats.tke().data())
            .and(stats.moment("UU").unwrap().data())
            .and(stats.moment("ww").unwrap().data())
            .for_each(|&tke, &uu, &ww| assert_eq!(tke, 0.5 * (uu + ww).sqrt()));
    }
}
