use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use mmc_distribution::{DistributionError, DistributionRequest, distributions};
use mmc_field::{Dim, ErrorKind, Field, ProgressEvent, Stage, silent};
use ndarray::{Array4, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

fn times(n: usize) -> Vec<NaiveDateTime> {
    let t0 = NaiveDate::from_ymd_opt(2018, 5, 11)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n as i64).map(|i| t0 + TimeDelta::seconds(i)).collect()
}

fn time_mean(field: &Field) -> Field {
    let mean = field
        .data()
        .mean_axis(Axis(0))
        .unwrap()
        .insert_axis(Axis(0));
    field.derive("mean", mean).unwrap()
}

fn edges(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| lo + (hi - lo) * i as f64 / n as f64)
        .collect()
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[test]
fn counts_sum_to_sample_count() {
    let data = Array4::from_shape_fn((30, 3, 4, 5), |(t, z, y, x)| {
        ((t * 7 + z * 3 + y * 5 + x * 11) % 13) as f64
    });
    let w = Field::new("w", data, times(30)).unwrap();
    let request = DistributionRequest::new(Dim::X, edges(-20.0, 20.0, 16));
    let est = distributions(&w, &time_mean(&w), &request, &silent).unwrap();

    assert_eq!(est.counts().shape(), &[3, 5, 16]);
    assert_eq!(est.location_dim(), Dim::X);
    for il in 0..3 {
        for ij in 0..5 {
            // 30 times x 4 rows along y
            assert_eq!(est.n_samples()[[il, ij]], 120);
            let total: usize = est
                .counts()
                .index_axis(Axis(0), il)
                .index_axis(Axis(0), ij)
                .sum();
            assert_eq!(total, 120);
        }
    }
}

#[test]
fn out_of_range_samples_are_dropped() {
    let data = Array4::from_shape_fn((10, 1, 1, 2), |(t, _, _, _)| t as f64);
    let w = Field::new("w", data, times(10)).unwrap();
    let zero = w.derive("zero", Array4::zeros((1, 1, 1, 2))).unwrap();
    // Values 0..=9; edges cover [2, 6] so 2,3,4,5,6 are counted.
    let request = DistributionRequest::new(Dim::Y, [2.0, 4.0, 6.0]);
    let est = distributions(&w, &zero, &request, &silent).unwrap();
    assert_eq!(est.counts()[[0, 0, 0]], 4); // 2,2,3,3 from both x columns
    assert_eq!(est.counts()[[0, 0, 1]], 6); // 4,5,6 closed last bin
    assert_eq!(est.n_samples()[[0, 0]], 20);
}

#[test]
fn selected_levels_and_locations() {
    let data = Array4::from_shape_fn((8, 4, 3, 3), |(t, z, y, _)| (t * (z + 1) + y) as f64);
    let w = Field::new("w", data, times(8)).unwrap();
    let request = DistributionRequest::new(Dim::Y, edges(-50.0, 50.0, 10))
        .with_levels([3, 1])
        .with_locations([2]);
    let est = distributions(&w, &time_mean(&w), &request, &silent).unwrap();
    assert_eq!(est.levels(), &[3, 1]);
    assert_eq!(est.locations(), &[2]);
    assert_eq!(est.counts().shape(), &[2, 1, 10]);
    assert_eq!(est.bin_centers().len(), 10);
    let density = est.density(0, 0).unwrap();
    let integral: f64 = density.iter().map(|d| d * 10.0).sum();
    assert_relative_eq!(integral, 1.0, epsilon = 1e-12);
    assert!(est.density(2, 0).is_none());
}

// ---------------------------------------------------------------------------
// Shape statistics
// ---------------------------------------------------------------------------

#[test]
fn symmetric_samples_have_zero_skewness() {
    let data = Array4::from_shape_fn((40, 1, 2, 6), |(t, _, _, x)| {
        let v = t as f64 - 19.5;
        v * v * v.signum() + 0.25 * x as f64
    });
    let w = Field::new("w", data, times(40)).unwrap();
    let request = DistributionRequest::new(Dim::Y, edges(-500.0, 500.0, 20));
    let est = distributions(&w, &time_mean(&w), &request, &silent).unwrap();
    for s in est.skewness().iter() {
        assert!(s.abs() < 1e-10, "skewness {s}");
    }
}

#[test]
fn gaussian_samples_have_zero_excess_kurtosis() {
    let mut rng = StdRng::seed_from_u64(20180511);
    let normal = Normal::new(0.0, 1.5).unwrap();
    let data = Array4::from_shape_fn((500, 1, 2, 20), |_| normal.sample(&mut rng));
    let w = Field::new("w", data, times(500)).unwrap();
    let request = DistributionRequest::new(Dim::Y, edges(-10.0, 10.0, 40));
    let est = distributions(&w, &time_mean(&w), &request, &silent).unwrap();
    for (s, k) in est.skewness().iter().zip(est.kurtosis().iter()) {
        assert!(s.abs() < 0.1, "skewness {s}");
        assert!(k.abs() < 0.2, "kurtosis {k}");
    }
}

#[test]
fn constant_samples_give_nan_moments() {
    let w = Field::new("w", Array4::from_elem((5, 1, 1, 2), 3.0), times(5)).unwrap();
    let request = DistributionRequest::new(Dim::X, [-1.0, 1.0]);
    let est = distributions(&w, &time_mean(&w), &request, &silent).unwrap();
    assert!(est.skewness()[[0, 0]].is_nan());
    assert!(est.kurtosis()[[0, 1]].is_nan());
    assert_eq!(est.counts()[[0, 1, 0]], 5);
}

#[test]
fn progress_reported_per_level() {
    use std::sync::Mutex;
    let w = Field::new("w", Array4::zeros((4, 3, 2, 2)), times(4)).unwrap();
    let events = Mutex::new(Vec::new());
    let obs = |e: &ProgressEvent| events.lock().unwrap().push(*e);
    distributions(&w, &time_mean(&w), &DistributionRequest::new(Dim::X, [0.0, 1.0]), &obs)
        .unwrap();
    let events = events.into_inner().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.stage == Stage::Distribution));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn invalid_requests() {
    let w = Field::new("w", Array4::zeros((4, 2, 2, 2)), times(4)).unwrap();
    let mean = time_mean(&w);

    let err = distributions(&w, &mean, &DistributionRequest::new(Dim::Y, [1.0, 0.0]), &silent)
        .unwrap_err();
    assert!(matches!(err, DistributionError::InvalidEdges { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = distributions(&w, &mean, &DistributionRequest::new(Dim::Time, [0.0, 1.0]), &silent)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let request = DistributionRequest::new(Dim::Y, [0.0, 1.0]).with_locations([2]);
    let err = distributions(&w, &mean, &request, &silent).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let bad_mean = Field::new("m", Array4::zeros((4, 3, 2, 2)), times(4)).unwrap();
    let err = distributions(&w, &bad_mean, &DistributionRequest::new(Dim::Y, [0.0, 1.0]), &silent)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
}
