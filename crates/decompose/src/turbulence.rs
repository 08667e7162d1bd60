//! Second-moment turbulence statistics over a dataset.

use std::collections::BTreeMap;

use mmc_field::{Dataset, DatasetKind, Field, FieldError, ProgressObserver};
use ndarray::Zip;
use tracing::info;

use crate::config::DecomposeConfig;
use crate::decompose::{Decomposition, MeanRecord, decompose};
use crate::error::DecomposeError;

/// Variables every dataset must provide.
pub const REQUIRED_VARIABLES: [&str; 6] = ["u", "v", "w", "theta", "wspd", "wdir"];

/// Pressure, required and averaged for model-grid input only.
pub const PRESSURE: &str = "p";

/// Output names of the means, keyed by input variable.
const MEAN_NAMES: [(&str, &str); 7] = [
    ("u", "uMean"),
    ("v", "vMean"),
    ("w", "wMean"),
    ("theta", "thetaMean"),
    ("wspd", "UMean"),
    ("wdir", "UdirMean"),
    (PRESSURE, "pMean"),
];

/// Means, perturbation moments and turbulent kinetic energy of a dataset.
///
/// Built as a new bundle; the input dataset is never modified.
#[derive(Clone, Debug)]
pub struct TurbulenceStats {
    kind: DatasetKind,
    record: MeanRecord,
    decompositions: BTreeMap<String, Decomposition>,
    means: BTreeMap<String, Field>,
    moments: BTreeMap<String, Field>,
    tke: Field,
}

impl TurbulenceStats {
    /// Returns the kind of the source dataset.
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Returns how the means were computed.
    pub fn record(&self) -> &MeanRecord {
        &self.record
    }

    /// Returns the decomposition of input variable `var` (e.g. `"w"`).
    pub fn decomposition(&self, var: &str) -> Option<&Decomposition> {
        self.decompositions.get(var)
    }

    /// Returns a mean by output name (e.g. `"uMean"`, `"UMean"`).
    pub fn mean(&self, name: &str) -> Option<&Field> {
        self.means.get(name)
    }

    /// Returns a moment by name (e.g. `"uw"`, `"UU"`).
    pub fn moment(&self, name: &str) -> Option<&Field> {
        self.moments.get(name)
    }

    /// Iterates over all means in name order.
    pub fn means(&self) -> impl Iterator<Item = &Field> {
        self.means.values()
    }

    /// Iterates over all moments in name order.
    pub fn moments(&self) -> impl Iterator<Item = &Field> {
        self.moments.values()
    }

    /// Returns `TKE = 0.5 * sqrt(UU + ww)`.
    pub fn tke(&self) -> &Field {
        &self.tke
    }
}

/// Decomposes the standard variables of `dataset` and derives moments.
///
/// Requires `u v w theta wspd wdir`, plus `p` for model-grid input. Moments
/// are pointwise products of perturbations: `uu vv ww uv uw vw wth`, and
/// `UU` from the wind speed perturbation. Model-grid input additionally
/// yields `pMean` and `Uw`. `TKE` is `0.5 * sqrt(UU + ww)`.
///
/// `Uw` is the squared wind speed perturbation, the same values as `UU`,
/// not `wspd' * w'` as its name suggests. This reproduces the established
/// model-grid output and is probably a defect there; it is kept until the
/// intended definition is confirmed.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`DecomposeError::Field`] | a required variable is missing |
/// | any from [`decompose`] | invalid configuration |
#[tracing::instrument(skip_all, fields(kind = dataset.kind().name(), mean_dim = %config.mean_dim()))]
pub fn turbulence_statistics<D: Dataset + ?Sized>(
    dataset: &D,
    config: &DecomposeConfig,
    progress: &dyn ProgressObserver,
) -> Result<TurbulenceStats, DecomposeError> {
    config.validate()?;
    let kind = dataset.kind();
    let mut inputs: Vec<&str> = REQUIRED_VARIABLES.to_vec();
    if kind == DatasetKind::ModelGrid {
        inputs.push(PRESSURE);
    }
    let fields = inputs
        .iter()
        .map(|name| dataset.require(name))
        .collect::<Result<Vec<_>, FieldError>>()?;

    let mut decompositions = BTreeMap::new();
    let mut means = BTreeMap::new();
    for (name, field) in inputs.iter().zip(fields) {
        let d = decompose(field, config, progress)?;
        if let Some((_, out)) = MEAN_NAMES.iter().find(|(var, _)| var == name) {
            means.insert(out.to_string(), d.mean().clone().with_name(*out));
        }
        decompositions.insert(name.to_string(), d);
    }

    let pert = |var: &str| perturbation(&decompositions, var);

    let ww = product("ww", pert("w")?, pert("w")?)?;
    let speed_variance = product("UU", pert("wspd")?, pert("wspd")?)?;
    let tke_data = Zip::from(speed_variance.data())
        .and(ww.data())
        .map_collect(|&a, &b| 0.5 * (a + b).sqrt());
    let tke = speed_variance.derive("TKE", tke_data)?;

    let mut pairs = vec![
        ("uu", "u", "u"),
        ("vv", "v", "v"),
        ("uv", "u", "v"),
        ("uw", "u", "w"),
        ("vw", "v", "w"),
        ("wth", "w", "theta"),
    ];
    if kind == DatasetKind::ModelGrid {
        pairs.push(("Uw", "wspd", "wspd"));
    }
    let mut moments = BTreeMap::new();
    for (name, a, b) in pairs {
        moments.insert(name.to_string(), product(name, pert(a)?, pert(b)?)?);
    }
    moments.insert("ww".to_string(), ww);
    moments.insert("UU".to_string(), speed_variance);

    let record = *decompositions
        .get("u")
        .map(Decomposition::record)
        .ok_or_else(|| FieldError::MissingVariable { name: "u".into() })?;

    info!(
        n_means = means.len(),
        n_moments = moments.len(),
        "turbulence statistics computed"
    );
    Ok(TurbulenceStats {
        kind,
        record,
        decompositions,
        means,
        moments,
        tke,
    })
}

fn perturbation<'a>(
    decompositions: &'a BTreeMap<String, Decomposition>,
    var: &str,
) -> Result<&'a Field, FieldError> {
    decompositions
        .get(var)
        .map(Decomposition::perturbation)
        .ok_or_else(|| FieldError::MissingVariable { name: var.into() })
}

/// Pointwise product of two perturbation fields.
fn product(name: &str, a: &Field, b: &Field) -> Result<Field, FieldError> {
    if a.shape() != b.shape() {
        return Err(FieldError::ShapeMismatch {
            expected: a.shape(),
            got: b.shape(),
        });
    }
    let data = Zip::from(a.data())
        .and(b.data())
        .map_collect(|&x, &y| x * y);
    a.derive(name, data)
}
