//! Statistical helper functions shared by the mmc estimators.
//!
//! All functions operate on plain `&[f64]` slices. Moment statistics follow
//! the population (biased) convention used by `scipy.stats`, so that the
//! distribution estimator reproduces the reference numbers without any
//! bias correction.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// `k`-th central moment with N denominator: `(1/N) Σ (x - mean)^k`.
///
/// Returns NaN if empty.
pub fn central_moment(data: &[f64], k: i32) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(k)).sum::<f64>() / data.len() as f64
}

/// Biased sample skewness `g1 = m3 / m2^1.5`.
///
/// Returns NaN for empty or constant input (zero second moment).
pub fn skewness(data: &[f64]) -> f64 {
    let m2 = central_moment(data, 2);
    if m2.is_nan() || m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(data, 3) / m2.powf(1.5)
}

/// Biased excess (Fisher) kurtosis `g2 = m4 / m2^2 - 3`.
///
/// A Gaussian population has excess kurtosis 0. Returns NaN for empty or
/// constant input.
pub fn excess_kurtosis(data: &[f64]) -> f64 {
    let m2 = central_moment(data, 2);
    if m2.is_nan() || m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(data, 4) / (m2 * m2) - 3.0
}

/// Counts `data` into the bins defined by `edges`.
///
/// Bins are half-open `[e_i, e_{i+1})` except the last, which is closed on
/// both sides. Values outside `[e_0, e_last]` and NaN are not counted.
/// Returns `edges.len() - 1` counts (empty if fewer than 2 edges).
///
/// `edges` must be strictly increasing (caller's responsibility).
pub fn histogram(data: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let n_bins = edges.len() - 1;
    let lo = edges[0];
    let hi = edges[n_bins];
    let mut counts = vec![0usize; n_bins];
    for &x in data {
        if !(x >= lo && x <= hi) {
            continue;
        }
        // partition_point gives the number of edges <= x.
        let idx = edges.partition_point(|&e| e <= x);
        let bin = idx.saturating_sub(1).min(n_bins - 1);
        counts[bin] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_central_moment_second_is_population_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population variance = 4.0
        assert_relative_eq!(central_moment(&data, 2), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skewness_symmetric() {
        let data = [-3.0, -1.0, 0.0, 1.0, 3.0];
        assert_relative_eq!(skewness(&data), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skewness_known_value() {
        // deviations from mean 4: [-3, -2, -1, 6]; m2 = 12.5, m3 = 45
        let data = [1.0, 2.0, 3.0, 10.0];
        assert_relative_eq!(skewness(&data), 45.0 / 12.5_f64.powf(1.5), epsilon = 1e-12);
    }

    #[test]
    fn test_kurtosis_two_point() {
        // Two-point symmetric distribution: m4/m2^2 = 1 -> excess = -2.
        let data = [-1.0, 1.0, -1.0, 1.0];
        assert_relative_eq!(excess_kurtosis(&data), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moments_constant_is_nan() {
        assert!(skewness(&[2.0, 2.0, 2.0]).is_nan());
        assert!(excess_kurtosis(&[2.0, 2.0, 2.0]).is_nan());
        assert!(skewness(&[]).is_nan());
    }

    #[test]
    fn test_histogram_basic() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        let data = [0.0, 0.5, 1.0, 1.5, 2.9, 3.0];
        // last bin is closed: 3.0 falls into [2, 3]
        assert_eq!(histogram(&data, &edges), vec![2, 2, 2]);
    }

    #[test]
    fn test_histogram_out_of_range_dropped() {
        let edges = [0.0, 1.0];
        let data = [-0.1, 0.5, 1.1, f64::NAN];
        assert_eq!(histogram(&data, &edges), vec![1]);
    }

    #[test]
    fn test_histogram_degenerate_edges() {
        assert!(histogram(&[1.0], &[0.0]).is_empty());
    }
}
