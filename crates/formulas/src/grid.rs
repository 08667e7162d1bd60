//! Helpers for WRF's staggered Arakawa-C grid.

use ndarray::{
    Array, Array4, ArrayView, ArrayView2, ArrayView3, ArrayView4, Axis, Dimension, Slice, Zip,
};

use crate::error::FormulaError;

/// Standard gravity used to turn geopotential into height [m s^-2].
pub const GRAVITY: f64 = 9.81;

/// Averages neighbouring points along `axis`, moving staggered values to
/// cell centres. The result is one shorter along `axis`.
///
/// # Errors
///
/// Returns [`FormulaError::InsufficientData`] if `axis` has fewer than 2 points.
pub fn unstagger<D: Dimension>(
    var: ArrayView<'_, f64, D>,
    axis: Axis,
) -> Result<Array<f64, D>, FormulaError> {
    let n = var.len_of(axis);
    if n < 2 {
        return Err(FormulaError::InsufficientData { n, min: 2 });
    }
    let lower = var.slice_axis(axis, Slice::from(..n - 1));
    let upper = var.slice_axis(axis, Slice::from(1..));
    Ok(Zip::from(&lower)
        .and(&upper)
        .map_collect(|&a, &b| (a + b) / 2.0))
}

/// Heights above ground from WRF geopotential.
///
/// `ph` and `phb` are `(time, bottom_top_stag, south_north, west_east)` and
/// `hgt` is the terrain height `(time, south_north, west_east)`. Returns
/// `(z, z_stag)`: cell-centre heights and heights on the staggered levels.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`FormulaError::GridMismatch`] | shapes of `ph`, `phb` and `hgt` disagree |
/// | [`FormulaError::InsufficientData`] | fewer than 2 staggered levels |
pub fn height_from_geopotential(
    ph: ArrayView4<'_, f64>,
    phb: ArrayView4<'_, f64>,
    hgt: ArrayView3<'_, f64>,
) -> Result<(Array4<f64>, Array4<f64>), FormulaError> {
    if ph.shape() != phb.shape() {
        return Err(FormulaError::GridMismatch {
            reason: format!("PH {:?} vs PHB {:?}", ph.shape(), phb.shape()),
        });
    }
    let (nt, _, ny, nx) = ph.dim();
    if hgt.dim() != (nt, ny, nx) {
        return Err(FormulaError::GridMismatch {
            reason: format!("PH {:?} vs HGT {:?}", ph.shape(), hgt.shape()),
        });
    }
    let mut z_stag = Zip::from(&ph)
        .and(&phb)
        .map_collect(|&a, &b| (a + b) / GRAVITY);
    for mut level in z_stag.axis_iter_mut(Axis(1)) {
        level -= &hgt;
    }
    let z = unstagger(z_stag.view(), Axis(1))?;
    Ok((z, z_stag))
}

/// Grid index `(i, j)` (west-east, south-north) nearest to `(lat, lon)`.
///
/// Distance is Euclidean in degrees. Ties resolve to the first point in
/// row-major order. Returns `None` for an empty grid or when every distance
/// is NaN.
///
/// # Errors
///
/// Returns [`FormulaError::GridMismatch`] if the coordinate arrays differ in shape.
pub fn nearest_grid_index(
    lats: ArrayView2<'_, f64>,
    lons: ArrayView2<'_, f64>,
    lat: f64,
    lon: f64,
) -> Result<Option<(usize, usize)>, FormulaError> {
    if lats.shape() != lons.shape() {
        return Err(FormulaError::GridMismatch {
            reason: format!("XLAT {:?} vs XLONG {:?}", lats.shape(), lons.shape()),
        });
    }
    let mut best: Option<((usize, usize), f64)> = None;
    for ((j, i), &glat) in lats.indexed_iter() {
        let glon = lons[[j, i]];
        let d = ((glat - lat).powi(2) + (glon - lon).powi(2)).sqrt();
        if d.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some(((i, j), d));
        }
    }
    Ok(best.map(|(ij, _)| ij))
}
