//! Per-(level, location) distributions of a perturbation field.

use mmc_field::{Dim, Field, ProgressEvent, ProgressObserver, Stage, report};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use tracing::info;

use crate::error::DistributionError;

/// Which samples enter a distribution estimate, and how they are binned.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRequest {
    location_dim: Dim,
    bin_edges: Vec<f64>,
    levels: Option<Vec<usize>>,
    locations: Option<Vec<usize>>,
}

impl DistributionRequest {
    /// Creates a request over all levels and all indices of `location_dim`.
    pub fn new(location_dim: Dim, bin_edges: impl Into<Vec<f64>>) -> Self {
        Self {
            location_dim,
            bin_edges: bin_edges.into(),
            levels: None,
            locations: None,
        }
    }

    /// Restricts the estimate to the given vertical level indices.
    pub fn with_levels(mut self, levels: impl Into<Vec<usize>>) -> Self {
        self.levels = Some(levels.into());
        self
    }

    /// Restricts the estimate to the given indices of the location dimension.
    pub fn with_locations(mut self, locations: impl Into<Vec<usize>>) -> Self {
        self.locations = Some(locations.into());
        self
    }

    /// Returns the dimension locations are taken along.
    pub fn location_dim(&self) -> Dim {
        self.location_dim
    }

    /// Returns the shared bin edges.
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Checks the location dimension and the bin edges.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DistributionError::InvalidLocationDim`] | location dimension is time or height |
    /// | [`DistributionError::InvalidEdges`] | fewer than 2 edges, or not strictly increasing |
    pub fn validate(&self) -> Result<(), DistributionError> {
        if !self.location_dim.is_horizontal() {
            return Err(DistributionError::InvalidLocationDim {
                dim: self.location_dim,
            });
        }
        if self.bin_edges.len() < 2 {
            return Err(DistributionError::InvalidEdges {
                reason: format!("need at least 2 edges, got {}", self.bin_edges.len()),
            });
        }
        if let Some(i) = self.bin_edges.windows(2).position(|w| w[1] <= w[0] || w[1].is_nan()) {
            return Err(DistributionError::InvalidEdges {
                reason: format!("edges must be strictly increasing (at index {})", i + 1),
            });
        }
        Ok(())
    }
}

/// Histograms and shape statistics per (level, location).
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEstimate {
    bin_edges: Vec<f64>,
    counts: Array3<usize>,
    skewness: Array2<f64>,
    kurtosis: Array2<f64>,
    n_samples: Array2<usize>,
    levels: Vec<usize>,
    locations: Vec<usize>,
    location_dim: Dim,
}

impl DistributionEstimate {
    /// Shared bin edges (one more than the number of bins).
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Histogram counts, shape `(levels, locations, bins)`.
    pub fn counts(&self) -> &Array3<usize> {
        &self.counts
    }

    /// Biased sample skewness, shape `(levels, locations)`.
    pub fn skewness(&self) -> &Array2<f64> {
        &self.skewness
    }

    /// Excess kurtosis, shape `(levels, locations)`.
    pub fn kurtosis(&self) -> &Array2<f64> {
        &self.kurtosis
    }

    /// Number of flattened samples per pair, including those outside the bins.
    pub fn n_samples(&self) -> &Array2<usize> {
        &self.n_samples
    }

    /// Vertical level indices, in output order.
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Location indices, in output order.
    pub fn locations(&self) -> &[usize] {
        &self.locations
    }

    /// Returns the dimension locations are taken along.
    pub fn location_dim(&self) -> Dim {
        self.location_dim
    }

    /// Bin centres.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }

    /// Histogram normalised to a probability density over the binned samples.
    ///
    /// Returns `None` for out-of-range positions; all zeros if no sample fell
    /// into any bin.
    pub fn density(&self, level_pos: usize, location_pos: usize) -> Option<Vec<f64>> {
        if level_pos >= self.levels.len() || location_pos >= self.locations.len() {
            return None;
        }
        let counts = self.counts.index_axis(Axis(0), level_pos);
        let counts = counts.index_axis(Axis(0), location_pos);
        let total: usize = counts.sum();
        Some(
            counts
                .iter()
                .zip(self.bin_edges.windows(2))
                .map(|(&c, w)| {
                    if total == 0 {
                        0.0
                    } else {
                        c as f64 / (total as f64 * (w[1] - w[0]))
                    }
                })
                .collect(),
        )
    }
}

/// Distributions of the perturbation `field - mean`.
///
/// For every requested (level, location) pair the perturbation is flattened
/// across time and the other horizontal dimension, then binned against the
/// shared edges (half-open bins, last bin closed, out-of-range samples
/// dropped). Skewness is `m3 / m2^1.5` and kurtosis `m4 / m2² - 3`, both
/// with population moments; constant samples give NaN.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`DistributionError::InvalidLocationDim`] | location dimension is time or height |
/// | [`DistributionError::InvalidEdges`] | fewer than 2 edges, or not strictly increasing |
/// | [`DistributionError::Field`] | index out of range, mean does not broadcast |
#[tracing::instrument(skip_all, fields(field = field.name(), location_dim = %request.location_dim()))]
pub fn distributions(
    field: &Field,
    mean: &Field,
    request: &DistributionRequest,
    progress: &dyn ProgressObserver,
) -> Result<DistributionEstimate, DistributionError> {
    request.validate()?;
    let location_dim = request.location_dim();
    let levels = match &request.levels {
        Some(levels) => levels.clone(),
        None => (0..field.len_of(Dim::Height)).collect(),
    };
    let locations = match &request.locations {
        Some(locations) => locations.clone(),
        None => (0..field.len_of(location_dim)).collect(),
    };
    for &k in &levels {
        field.check_index(Dim::Height, k)?;
    }
    for &j in &locations {
        field.check_index(location_dim, j)?;
    }

    let pert = field.anomaly(mean)?;
    let edges = request.bin_edges();
    let n_bins = edges.len() - 1;
    let shape = (levels.len(), locations.len());
    let mut counts = Array3::<usize>::zeros((shape.0, shape.1, n_bins));
    let mut skewness = Array2::<f64>::zeros(shape);
    let mut kurtosis = Array2::<f64>::zeros(shape);
    let mut n_samples = Array2::<usize>::zeros(shape);

    for (il, &level) in levels.iter().enumerate() {
        let slab = pert.data().index_axis(Dim::Height.axis(), level);
        for (ij, &location) in locations.iter().enumerate() {
            let samples = flatten(&slab, location_dim, location);
            for (c, h) in counts
                .slice_mut(s![il, ij, ..])
                .iter_mut()
                .zip(mmc_stats::histogram(&samples, edges))
            {
                *c = h;
            }
            skewness[[il, ij]] = mmc_stats::skewness(&samples);
            kurtosis[[il, ij]] = mmc_stats::excess_kurtosis(&samples);
            n_samples[[il, ij]] = samples.len();
        }
        report(
            progress,
            ProgressEvent {
                stage: Stage::Distribution,
                completed: il + 1,
                total: levels.len(),
            },
        );
    }

    info!(
        levels = levels.len(),
        locations = locations.len(),
        n_bins,
        "distributions estimated"
    );
    Ok(DistributionEstimate {
        bin_edges: edges.to_vec(),
        counts,
        skewness,
        kurtosis,
        n_samples,
        levels,
        locations,
        location_dim,
    })
}

/// Samples of one `(time, y, x)` slab at `location`, in time-major order.
fn flatten(slab: &ArrayView3<'_, f64>, location_dim: Dim, location: usize) -> Vec<f64> {
    // The slab has lost the height axis, so y and x sit one position lower.
    let axis = Axis(location_dim.index() - 1);
    let plane: ArrayView2<'_, f64> = slab.index_axis(axis, location);
    plane.iter().copied().collect()
}
