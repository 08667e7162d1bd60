//! Splitting a field into a mean and a perturbation.

use mmc_field::{
    Attribute, Dim, Field, FieldError, ProgressEvent, ProgressObserver, Stage, report,
};
use mmc_smooth::{Lowess, LowessConfig};
use mmc_smooth::SmoothError;
use ndarray::{Array4, ArrayView1, Axis, Zip};
use tracing::debug;

use crate::config::{DecomposeConfig, Execution, MeanMode};
use crate::error::DecomposeError;

/// Provenance of a mean field: how and along which dimension it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanRecord {
    /// Mean mode including smoothing parameters.
    pub mode: MeanMode,
    /// Dimension the mean was taken along.
    pub dim: Dim,
    /// Smoothing fraction actually used (smoothed mode only).
    pub fraction: Option<f64>,
}

impl MeanRecord {
    /// Attribute entries describing this record.
    pub fn attributes(&self) -> Vec<(&'static str, Attribute)> {
        let mut attrs = vec![
            ("mean_mode", Attribute::from(self.mode.name())),
            ("mean_dim", Attribute::from(self.dim.name())),
        ];
        if let MeanMode::Smoothed(params) = self.mode {
            attrs.push(("mean_window_size", params.window_size().into()));
            attrs.push(("mean_delta", params.delta().into()));
            attrs.push(("mean_iterations", params.iterations().into()));
        }
        if let Some(fraction) = self.fraction {
            attrs.push(("mean_fraction", fraction.into()));
        }
        attrs
    }

    fn stamp(&self, mut field: Field) -> Field {
        for (key, value) in self.attributes() {
            field = field.with_attr(key, value);
        }
        field
    }
}

/// A field split into mean and perturbation parts.
#[derive(Clone, Debug)]
pub struct Decomposition {
    mean: Field,
    perturbation: Field,
    record: MeanRecord,
}

impl Decomposition {
    /// Returns the mean field.
    ///
    /// In static mode the mean dimension has length 1.
    pub fn mean(&self) -> &Field {
        &self.mean
    }

    /// Returns the perturbation field (same shape as the input).
    pub fn perturbation(&self) -> &Field {
        &self.perturbation
    }

    /// Returns how the mean was computed.
    pub fn record(&self) -> &MeanRecord {
        &self.record
    }

    /// Consumes self, returning `(mean, perturbation)`.
    pub fn into_parts(self) -> (Field, Field) {
        (self.mean, self.perturbation)
    }
}

/// Splits `field` into mean and perturbation along `config.mean_dim()`.
///
/// - Static: arithmetic mean, the mean axis kept with length 1; the
///   perturbation subtracts the mean broadcast along that axis.
/// - Smoothed: every 1-D lane along the mean axis is LOWESS-smoothed
///   against the axis coordinate with `fraction = window_size / len`. One
///   progress event is reported per vertical level (per time step when the
///   mean axis is height). A lane holding NaN or infinity gets an all-NaN
///   mean.
///
/// The mean is named `<name>Mean` and the perturbation `<name>Pert`; both
/// carry the [`MeanRecord`] as attributes.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`DecomposeError::InvalidWindow`] | window < 2 or longer than the series |
/// | [`DecomposeError::InvalidDelta`] | negative or non-finite delta |
/// | [`DecomposeError::Field`] | empty mean axis |
/// | [`DecomposeError::Smooth`] | the smoother rejects the coordinate or a lane |
#[tracing::instrument(skip_all, fields(field = field.name(), mean_dim = %config.mean_dim(), mode = config.mode().name()))]
pub fn decompose(
    field: &Field,
    config: &DecomposeConfig,
    progress: &dyn ProgressObserver,
) -> Result<Decomposition, DecomposeError> {
    config.validate()?;
    let dim = config.mean_dim();
    let len = field.len_of(dim);
    if len == 0 {
        return Err(FieldError::InsufficientLength { dim, len, min: 1 }.into());
    }

    let (mean, fraction) = match config.mode() {
        MeanMode::Static => {
            let mean = field
                .data()
                .mean_axis(dim.axis())
                .ok_or(FieldError::InsufficientLength { dim, len, min: 1 })?
                .insert_axis(dim.axis());
            (mean, None)
        }
        MeanMode::Smoothed(params) => {
            if params.window_size() > len {
                return Err(DecomposeError::InvalidWindow {
                    window_size: params.window_size(),
                    len,
                });
            }
            let fraction = params.fraction(len);
            let lowess = LowessConfig::new()
                .with_fraction(fraction)
                .with_delta(params.delta())
                .with_iterations(params.iterations());
            let coords = field.coordinates(dim);
            let smoother = Lowess::new(&coords, &lowess)?;
            debug!(fraction, span = smoother.span(), "smoothing lanes");
            let mean = smoothed_mean(field, dim, &smoother, config.execution(), progress)?;
            (mean, Some(fraction))
        }
    };

    let perturbation = field.data() - &mean;
    let record = MeanRecord {
        mode: config.mode(),
        dim,
        fraction,
    };
    let mean = record.stamp(field.derive(format!("{}Mean", field.name()), mean)?);
    let perturbation = record.stamp(field.derive(format!("{}Pert", field.name()), perturbation)?);

    Ok(Decomposition {
        mean,
        perturbation,
        record,
    })
}

/// LOWESS mean of every lane along `dim`, processed one slab at a time.
fn smoothed_mean(
    field: &Field,
    dim: Dim,
    smoother: &Lowess<'_>,
    execution: Execution,
    progress: &dyn ProgressObserver,
) -> Result<Array4<f64>, SmoothError> {
    let slab = if dim == Dim::Height {
        Dim::Time
    } else {
        Dim::Height
    };
    // Position of the mean axis once the slab axis is indexed away.
    let lane_axis = Axis(if dim.index() > slab.index() {
        dim.index() - 1
    } else {
        dim.index()
    });

    let data = field.data();
    let mut mean = Array4::<f64>::zeros(data.raw_dim());
    let total = field.len_of(slab);

    for (k, (src, mut dst)) in data
        .axis_iter(slab.axis())
        .zip(mean.axis_iter_mut(slab.axis()))
        .enumerate()
    {
        let lanes = Zip::from(src.lanes(lane_axis));
        let fitted = match execution {
            Execution::Sequential => lanes.map_collect(|y| smooth_lane(smoother, y)),
            Execution::Parallel => lanes.par_map_collect(|y| smooth_lane(smoother, y)),
        };
        if let Some(err) = fitted.iter().find_map(|r| r.as_ref().err()) {
            return Err(err.clone());
        }
        Zip::from(&fitted)
            .and(dst.lanes_mut(lane_axis))
            .for_each(|lane, mut out| {
                if let Ok(values) = lane {
                    out.assign(&ArrayView1::from(values.as_slice()));
                }
            });
        report(
            progress,
            ProgressEvent {
                stage: Stage::Smoothing,
                completed: k + 1,
                total,
            },
        );
    }
    Ok(mean)
}

fn smooth_lane(smoother: &Lowess<'_>, y: ArrayView1<'_, f64>) -> Result<Vec<f64>, SmoothError> {
    smoother.fit(&y.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmoothingParams;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeDelta};
    use mmc_field::silent;

    fn field(shape: (usize, usize, usize, usize)) -> Field {
        let t0 = NaiveDate::from_ymd_opt(2018, 5, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let times = (0..shape.0 as i64)
            .map(|i| t0 + TimeDelta::seconds(i))
            .collect();
        let data = Array4::from_shape_fn(shape, |(t, z, y, x)| {
            (t as f64 * 0.7).sin() + z as f64 + 0.1 * y as f64 - 0.2 * x as f64
        });
        Field::new("u", data, times).unwrap().with_spacing(30.0, 30.0)
    }

    #[test]
    fn static_mean_collapses_axis() {
        let f = field((6, 2, 3, 4));
        let d = decompose(&f, &DecomposeConfig::new(Dim::X), &silent).unwrap();
        assert_eq!(d.mean().shape(), [6, 2, 3, 1]);
        assert_eq!(d.perturbation().shape(), [6, 2, 3, 4]);
        assert_eq!(d.mean().name(), "uMean");
        assert_eq!(d.perturbation().name(), "uPert");
        // mean over x of -0.2 * x for x in 0..4 is -0.3
        let expected = (0.0_f64).sin() + 1.0 + 0.2 - 0.3;
        assert_relative_eq!(d.mean().data()[[0, 1, 2, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn static_mean_over_time_keeps_first_timestamp() {
        let f = field((5, 1, 2, 2));
        let d = decompose(&f, &DecomposeConfig::new(Dim::Time), &silent).unwrap();
        assert_eq!(d.mean().times(), &f.times()[..1]);
        assert_eq!(d.perturbation().times(), f.times());
    }

    #[test]
    fn records_attributes() {
        let f = field((20, 2, 1, 1));
        let cfg = DecomposeConfig::new(Dim::Time)
            .with_mode(MeanMode::Smoothed(SmoothingParams::new(5).with_delta(1.0)));
        let d = decompose(&f, &cfg, &silent).unwrap();
        let m = d.mean();
        assert_eq!(m.attr("mean_mode").and_then(Attribute::as_text), Some("smoothed"));
        assert_eq!(m.attr("mean_dim").and_then(Attribute::as_text), Some("time"));
        assert_eq!(m.number_attr("mean_window_size"), Some(5.0));
        assert_eq!(m.number_attr("mean_fraction"), Some(0.25));
        assert_eq!(m.number_attr("mean_delta"), Some(1.0));
        assert_eq!(d.record().fraction, Some(0.25));
    }

    #[test]
    fn window_longer_than_series() {
        let f = field((4, 1, 1, 1));
        let cfg = DecomposeConfig::new(Dim::Time)
            .with_mode(MeanMode::Smoothed(SmoothingParams::new(5)));
        assert!(matches!(
            decompose(&f, &cfg, &silent),
            Err(DecomposeError::InvalidWindow { window_size: 5, len: 4 })
        ));
    }

    #[test]
    fn nan_lane_smooths_to_nan_only_in_that_lane() {
        let mut data = field((12, 1, 1, 2)).into_data();
        data[[4, 0, 0, 1]] = f64::NAN;
        let f = Field::new("u", data, field((12, 1, 1, 1)).times().to_vec()).unwrap();
        let cfg = DecomposeConfig::new(Dim::Time)
            .with_mode(MeanMode::Smoothed(SmoothingParams::new(6)));
        let d = decompose(&f, &cfg, &silent).unwrap();
        let mean = d.mean().data();
        assert!((0..12).all(|t| mean[[t, 0, 0, 1]].is_nan()));
        assert!((0..12).all(|t| mean[[t, 0, 0, 0]].is_finite()));
    }

    #[test]
    fn smoothed_along_height_reports_per_time_step() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let f = field((3, 6, 2, 2));
        let count = AtomicUsize::new(0);
        let obs = |e: &ProgressEvent| {
            assert_eq!(e.total, 3);
            count.fetch_add(1, Ordering::Relaxed);
        };
        let cfg = DecomposeConfig::new(Dim::Height)
            .with_mode(MeanMode::Smoothed(SmoothingParams::new(3).with_iterations(0)));
        let d = decompose(&f, &cfg, &obs).unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 3);
        // Linear in height, so the local linear fit is exact.
        for (&m, &v) in d.mean().data().iter().zip(f.data().iter()) {
            assert_relative_eq!(m, v, epsilon = 1e-9);
        }
    }
}
