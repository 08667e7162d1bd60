use approx::assert_relative_eq;
use mmc_smooth::{Lowess, LowessConfig, lowess};

fn coordinate(n: usize, step: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * step).collect()
}

#[test]
fn prepared_smoother_matches_one_shot() {
    let x = coordinate(200, 30.0);
    let cfg = LowessConfig::new().with_fraction(0.05).with_delta(60.0);
    let smoother = Lowess::new(&x, &cfg).unwrap();
    assert_eq!(smoother.span(), 10);

    for phase in [0.0, 0.7, 1.9] {
        let y: Vec<f64> = x
            .iter()
            .map(|v| (v / 900.0 + phase).sin() + 0.2 * (v / 37.0).cos())
            .collect();
        let a = smoother.fit(&y).unwrap();
        let b = lowess(&x, &y, &cfg).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn wide_window_tracks_slow_signal() {
    let x = coordinate(400, 1.0);
    let slow: Vec<f64> = x.iter().map(|v| (v / 200.0).sin()).collect();
    let fast: Vec<f64> = x.iter().map(|v| 0.3 * (v * 1.3).sin()).collect();
    let y: Vec<f64> = slow.iter().zip(&fast).map(|(a, b)| a + b).collect();

    let fit = lowess(&x, &y, &LowessConfig::new().with_fraction(0.1)).unwrap();
    for i in 50..350 {
        assert_relative_eq!(fit[i], slow[i], epsilon = 0.05);
    }
}
