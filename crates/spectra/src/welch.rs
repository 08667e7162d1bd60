//! Welch's method: averaged, windowed periodograms of overlapping segments.

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use crate::error::SpectraError;
use crate::window::{Detrend, Symmetry, Window, WindowKind};

/// Segment length used when none is configured (clamped to the series).
pub const DEFAULT_SEGMENT_LENGTH: usize = 256;

/// Segment duration of [`power_spectral_density`] by default.
pub const DEFAULT_SEGMENT_SECONDS: i64 = 600;

/// Normalisation of the averaged periodogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    /// Power spectral density, `|X|² / (fs · Σw²)`, units of `x² / Hz`.
    #[default]
    Density,
    /// Power spectrum, `|X|² / (Σw)²`, units of `x²`.
    Spectrum,
}

/// Which frequencies are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sides {
    /// Non-negative frequencies, interior bins doubled.
    #[default]
    OneSided,
    /// All frequencies in FFT order (non-negative first).
    TwoSided,
}

/// Windowing, detrending and FFT of fixed-length segments.
pub(crate) struct SegmentTransform {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    detrend: Detrend,
}

impl SegmentTransform {
    pub(crate) fn new(len: usize, window: Window, detrend: Detrend) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(len),
            window: window.coefficients(len),
            detrend,
        }
    }

    /// Sum of squared window coefficients.
    pub(crate) fn window_power(&self) -> f64 {
        self.window.iter().map(|w| w * w).sum()
    }

    /// Squared sum of window coefficients.
    pub(crate) fn window_gain(&self) -> f64 {
        let s: f64 = self.window.iter().sum();
        s * s
    }

    /// Unnormalised FFT of the detrended, windowed segment.
    pub(crate) fn transform(&self, segment: &[f64]) -> Vec<Complex<f64>> {
        let mut x = segment.to_vec();
        self.detrend.apply(&mut x);
        let mut buf: Vec<Complex<f64>> = x
            .iter()
            .zip(&self.window)
            .map(|(&v, &w)| Complex::new(v * w, 0.0))
            .collect();
        self.fft.process(&mut buf);
        buf
    }
}

/// Configuration for [`welch`] and [`csd`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchConfig {
    window: Window,
    segment_length: Option<usize>,
    overlap: Option<usize>,
    detrend: Detrend,
    sides: Sides,
    scaling: Scaling,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            window: Window::hann(),
            segment_length: None,
            overlap: None,
            detrend: Detrend::Constant,
            sides: Sides::OneSided,
            scaling: Scaling::Density,
        }
    }
}

impl WelchConfig {
    /// Periodic Hann window, 256-sample segments, half overlap, constant
    /// detrend, one-sided density.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the taper window.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Sets the segment length in samples.
    pub fn with_segment_length(mut self, n: usize) -> Self {
        self.segment_length = Some(n);
        self
    }

    /// Sets the overlap between segments in samples.
    pub fn with_overlap(mut self, n: usize) -> Self {
        self.overlap = Some(n);
        self
    }

    /// Sets the detrending applied to each segment.
    pub fn with_detrend(mut self, detrend: Detrend) -> Self {
        self.detrend = detrend;
        self
    }

    /// Sets one- or two-sided output.
    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }

    /// Sets the scaling.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Returns the taper window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Returns the detrending.
    pub fn detrend(&self) -> Detrend {
        self.detrend
    }

    /// Returns one- or two-sided output.
    pub fn sides(&self) -> Sides {
        self.sides
    }

    /// Returns the scaling.
    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// Resolves `(segment_length, overlap)` for a series of length `n`.
    ///
    /// The segment length is clamped to `n`; the overlap defaults to half
    /// a segment.
    pub fn segmentation(&self, n: usize) -> Result<(usize, usize), SpectraError> {
        let nperseg = self.segment_length.unwrap_or(DEFAULT_SEGMENT_LENGTH).min(n);
        if nperseg == 0 {
            return Err(SpectraError::InvalidSegment {
                reason: "segment length must be positive".into(),
            });
        }
        let noverlap = self.overlap.unwrap_or(nperseg / 2);
        if noverlap >= nperseg {
            return Err(SpectraError::InvalidSegment {
                reason: format!("overlap {noverlap} must be less than segment length {nperseg}"),
            });
        }
        Ok((nperseg, noverlap))
    }
}

/// Averaged auto-spectrum of a real series.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Frequencies in cycles per unit of `1 / fs`.
    pub frequencies: Vec<f64>,
    /// Power at each frequency.
    pub power: Vec<f64>,
    /// Number of segments averaged.
    pub n_segments: usize,
}

/// Averaged cross-spectrum `conj(X) · Y` of two real series.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSpectrum {
    /// Frequencies in cycles per unit of `1 / fs`.
    pub frequencies: Vec<f64>,
    /// Complex cross-spectral density at each frequency.
    pub values: Vec<Complex<f64>>,
    /// Number of segments averaged.
    pub n_segments: usize,
}

impl CrossSpectrum {
    /// Real part of the cross-spectrum.
    pub fn cospectrum(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.re).collect()
    }

    /// Negated imaginary part of the cross-spectrum.
    pub fn quadrature(&self) -> Vec<f64> {
        self.values.iter().map(|c| -c.im).collect()
    }
}

/// Power spectral density estimate of `x` sampled at `fs` by Welch's method.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SpectraError::TooShort`] | fewer than 2 samples |
/// | [`SpectraError::InvalidSegment`] | zero segment length, overlap ≥ segment, non-positive `fs` |
pub fn welch(x: &[f64], fs: f64, config: &WelchConfig) -> Result<Spectrum, SpectraError> {
    let cross = averaged_cross(x, x, fs, config)?;
    Ok(Spectrum {
        power: cross.cospectrum(),
        frequencies: cross.frequencies,
        n_segments: cross.n_segments,
    })
}

/// Cross spectral density estimate of `x` and `y` by Welch's method.
///
/// # Errors
///
/// As [`welch`], plus [`SpectraError::LengthMismatch`] if the series differ
/// in length.
pub fn csd(x: &[f64], y: &[f64], fs: f64, config: &WelchConfig) -> Result<CrossSpectrum, SpectraError> {
    if x.len() != y.len() {
        return Err(SpectraError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    averaged_cross(x, y, fs, config)
}

fn averaged_cross(
    x: &[f64],
    y: &[f64],
    fs: f64,
    config: &WelchConfig,
) -> Result<CrossSpectrum, SpectraError> {
    let n = x.len();
    if n < 2 {
        return Err(SpectraError::TooShort { n, min: 2 });
    }
    if !fs.is_finite() || fs <= 0.0 {
        return Err(SpectraError::InvalidSegment {
            reason: format!("sampling frequency must be positive, got {fs}"),
        });
    }
    let (nperseg, noverlap) = config.segmentation(n)?;
    let step = nperseg - noverlap;
    let n_segments = (n - nperseg) / step + 1;

    let transform = SegmentTransform::new(nperseg, config.window, config.detrend);
    let scale = match config.scaling {
        Scaling::Density => 1.0 / (fs * transform.window_power()),
        Scaling::Spectrum => 1.0 / transform.window_gain(),
    };

    let mut acc = vec![Complex::new(0.0, 0.0); nperseg];
    for s in 0..n_segments {
        let range = s * step..s * step + nperseg;
        let xf = transform.transform(&x[range.clone()]);
        let yf = transform.transform(&y[range]);
        for ((a, xk), yk) in acc.iter_mut().zip(&xf).zip(&yf) {
            *a += xk.conj() * yk;
        }
    }
    let norm = scale / n_segments as f64;
    acc.iter_mut().for_each(|a| *a *= norm);
    debug!(nperseg, noverlap, n_segments, "welch segments averaged");

    let (frequencies, values) = match config.sides {
        Sides::TwoSided => {
            let freqs = (0..nperseg)
                .map(|k| {
                    let k = if k <= (nperseg - 1) / 2 {
                        k as f64
                    } else {
                        k as f64 - nperseg as f64
                    };
                    k * fs / nperseg as f64
                })
                .collect();
            (freqs, acc)
        }
        Sides::OneSided => {
            let nfreq = nperseg / 2 + 1;
            let mut values: Vec<Complex<f64>> = acc.into_iter().take(nfreq).collect();
            // The Nyquist bin has no negative twin when the length is even.
            let last = if nperseg % 2 == 0 { nfreq - 1 } else { nfreq };
            for v in values.iter_mut().take(last).skip(1) {
                *v *= 2.0;
            }
            let freqs = (0..nfreq).map(|k| k as f64 * fs / nperseg as f64).collect();
            (freqs, values)
        }
    };

    Ok(CrossSpectrum {
        frequencies,
        values,
        n_segments,
    })
}

/// Options for [`power_spectral_density`] on timestamped series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsdConfig {
    segment: TimeDelta,
    window: WindowKind,
    detrend: Detrend,
    scaling: Scaling,
    start: Option<NaiveDateTime>,
    interval: Option<TimeDelta>,
}

impl Default for PsdConfig {
    fn default() -> Self {
        Self {
            segment: TimeDelta::seconds(DEFAULT_SEGMENT_SECONDS),
            window: WindowKind::Hann,
            detrend: Detrend::Linear,
            scaling: Scaling::Density,
            start: None,
            interval: None,
        }
    }
}

impl PsdConfig {
    /// 10-minute Hann segments, linear detrend, density scaling, full record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment duration.
    pub fn with_segment(mut self, segment: TimeDelta) -> Self {
        self.segment = segment;
        self
    }

    /// Sets the window shape (always periodic).
    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    /// Sets the detrending.
    pub fn with_detrend(mut self, detrend: Detrend) -> Self {
        self.detrend = detrend;
        self
    }

    /// Sets the scaling.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Restricts the analysis to `[start, start + interval]`.
    ///
    /// Either bound may be omitted: the start defaults to the first
    /// timestamp and the interval to the rest of the record.
    pub fn with_range(mut self, start: Option<NaiveDateTime>, interval: Option<TimeDelta>) -> Self {
        self.start = start;
        self.interval = interval;
        self
    }

    /// Returns the segment duration.
    pub fn segment(&self) -> TimeDelta {
        self.segment
    }
}

/// One-sided PSD of a timestamped series, segments given as a duration.
///
/// The sampling interval is taken from `times`, which must be equidistant.
/// The segment length in samples is `floor(segment / dt)`, clamped to the
/// selected record.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SpectraError::LengthMismatch`] | `series` and `times` differ in length |
/// | [`SpectraError::Field`] | fewer than 2 timestamps, or not equidistant |
/// | [`SpectraError::InvalidSegment`] | segment shorter than one sample |
/// | [`SpectraError::TooShort`] | fewer than 2 samples in the selected range |
#[tracing::instrument(skip_all, fields(n = series.len(), segment_s = config.segment.num_seconds()))]
pub fn power_spectral_density(
    series: &[f64],
    times: &[NaiveDateTime],
    config: &PsdConfig,
) -> Result<Spectrum, SpectraError> {
    if series.len() != times.len() {
        return Err(SpectraError::LengthMismatch {
            left: series.len(),
            right: times.len(),
        });
    }
    let Some(&first) = times.first() else {
        return Err(SpectraError::TooShort { n: 0, min: 2 });
    };
    let start = config.start.unwrap_or(first);
    let selected: Vec<usize> = (0..times.len())
        .filter(|&i| times[i] >= start && config.interval.is_none_or(|iv| times[i] <= start + iv))
        .collect();
    let sel_times: Vec<NaiveDateTime> = selected.iter().map(|&i| times[i]).collect();
    let sel_series: Vec<f64> = selected.iter().map(|&i| series[i]).collect();

    let dt = mmc_field::time_step(&sel_times)?;
    let segment_s = config.segment.num_milliseconds() as f64 / 1000.0;
    let nperseg = (segment_s / dt + 1e-9).floor() as usize;
    if nperseg == 0 {
        return Err(SpectraError::InvalidSegment {
            reason: format!("segment of {segment_s} s is shorter than the {dt} s sample interval"),
        });
    }

    let welch_config = WelchConfig::new()
        .with_window(Window::new(config.window, Symmetry::Periodic))
        .with_segment_length(nperseg)
        .with_detrend(config.detrend)
        .with_scaling(config.scaling);
    welch(&sel_series, 1.0 / dt, &welch_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::f64::consts::PI;

    fn sine(n: usize, freq: f64, fs: f64, amp: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn one_sided_frequency_axis() {
        let x = sine(64, 4.0, 64.0, 1.0);
        let s = welch(&x, 64.0, &WelchConfig::new().with_segment_length(32)).unwrap();
        assert_eq!(s.frequencies.len(), 17);
        assert_eq!(s.frequencies[0], 0.0);
        assert_relative_eq!(s.frequencies[16], 32.0);
        // 64 samples, 32 per segment, 16 overlap.
        assert_eq!(s.n_segments, 3);
    }

    #[test]
    fn two_sided_frequency_axis_in_fft_order() {
        let x = sine(8, 1.0, 8.0, 1.0);
        let cfg = WelchConfig::new().with_sides(Sides::TwoSided);
        let s = welch(&x, 8.0, &cfg).unwrap();
        assert_eq!(
            s.frequencies,
            vec![0.0, 1.0, 2.0, 3.0, -4.0, -3.0, -2.0, -1.0]
        );
    }

    #[test]
    fn parseval_with_boxcar_density() {
        // One boxcar segment, no detrend: the two-sided density integrates
        // to the mean square of the signal.
        let x: Vec<f64> = (0..16).map(|i| ((i * 7 % 5) as f64) - 1.3).collect();
        let cfg = WelchConfig::new()
            .with_window(Window::new(WindowKind::Boxcar, Symmetry::Symmetric))
            .with_detrend(Detrend::None)
            .with_sides(Sides::TwoSided);
        let fs = 2.0;
        let s = welch(&x, fs, &cfg).unwrap();
        let integral: f64 = s.power.iter().sum::<f64>() * fs / 16.0;
        let mean_square = x.iter().map(|v| v * v).sum::<f64>() / 16.0;
        assert_relative_eq!(integral, mean_square, epsilon = 1e-10);
    }

    #[test]
    fn one_sided_doubles_interior_bins() {
        let x: Vec<f64> = (0..16).map(|i| (i as f64 * 0.9).cos()).collect();
        let two = welch(&x, 1.0, &WelchConfig::new().with_sides(Sides::TwoSided)).unwrap();
        let one = welch(&x, 1.0, &WelchConfig::new()).unwrap();
        assert_relative_eq!(one.power[0], two.power[0], epsilon = 1e-12);
        assert_relative_eq!(one.power[3], 2.0 * two.power[3], epsilon = 1e-12);
        assert_relative_eq!(one.power[8], two.power[8], epsilon = 1e-12);
    }

    #[test]
    fn sine_peak_location() {
        let fs = 10.0;
        let x = sine(1000, 1.25, fs, 2.0);
        let s = welch(&x, fs, &WelchConfig::new().with_segment_length(200)).unwrap();
        let peak = s
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_relative_eq!(s.frequencies[peak], 1.25, epsilon = 1e-12);
    }

    #[test]
    fn csd_of_series_with_itself_is_real_psd() {
        let x: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).sin() + 0.1 * i as f64).collect();
        let cfg = WelchConfig::new().with_segment_length(16);
        let p = welch(&x, 1.0, &cfg).unwrap();
        let c = csd(&x, &x, 1.0, &cfg).unwrap();
        for (a, b) in p.power.iter().zip(c.values.iter()) {
            assert_relative_eq!(*a, b.re, epsilon = 1e-12);
            assert!(b.im.abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_segmentation() {
        let x = vec![0.0; 10];
        let cfg = WelchConfig::new().with_segment_length(4).with_overlap(4);
        assert!(matches!(
            welch(&x, 1.0, &cfg),
            Err(SpectraError::InvalidSegment { .. })
        ));
        assert!(matches!(
            welch(&x[..1], 1.0, &WelchConfig::new()),
            Err(SpectraError::TooShort { n: 1, min: 2 })
        ));
        assert!(csd(&x, &x[..5], 1.0, &WelchConfig::new()).is_err());
    }

    fn times(n: usize, step_s: i64) -> Vec<NaiveDateTime> {
        let t0 = NaiveDate::from_ymd_opt(2013, 11, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n as i64)
            .map(|i| t0 + TimeDelta::seconds(i * step_s))
            .collect()
    }

    #[test]
    fn psd_segment_from_duration() {
        // 1 Hz for one hour: 600-sample segments, 300 overlap, 11 segments.
        let x = sine(3600, 0.05, 1.0, 1.0);
        let s = power_spectral_density(&x, &times(3600, 1), &PsdConfig::new()).unwrap();
        assert_eq!(s.frequencies.len(), 301);
        assert_eq!(s.n_segments, 11);
        assert_relative_eq!(s.frequencies[1], 1.0 / 600.0, epsilon = 1e-12);
        let peak = s
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_relative_eq!(s.frequencies[peak], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn psd_range_selection() {
        let t = times(100, 10);
        let x: Vec<f64> = (0..100).map(|i| (i as f64).sin()).collect();
        let cfg = PsdConfig::new()
            .with_segment(TimeDelta::seconds(200))
            .with_range(Some(t[10]), Some(TimeDelta::seconds(490)));
        // Samples 10..=59, 20 per segment.
        let s = power_spectral_density(&x, &t, &cfg).unwrap();
        assert_eq!(s.frequencies.len(), 11);
        assert_eq!(s.n_segments, 4);
    }

    #[test]
    fn psd_rejects_uneven_timestamps() {
        let mut t = times(10, 1);
        t[5] += TimeDelta::milliseconds(300);
        let err = power_spectral_density(&[0.0; 10], &t, &PsdConfig::new()).unwrap_err();
        assert!(matches!(err, SpectraError::Field(_)));
        let err = power_spectral_density(&[0.0; 9], &times(10, 1), &PsdConfig::new()).unwrap_err();
        assert!(matches!(err, SpectraError::LengthMismatch { left: 9, right: 10 }));
    }

    #[test]
    fn psd_segment_shorter_than_step() {
        let cfg = PsdConfig::new().with_segment(TimeDelta::seconds(5));
        let err = power_spectral_density(&[0.0; 10], &times(10, 10), &cfg).unwrap_err();
        assert!(matches!(err, SpectraError::InvalidSegment { .. }));
    }
}
