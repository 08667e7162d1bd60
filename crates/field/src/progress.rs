//! Progress reporting for long-running estimators.

use std::fmt;

/// The computation a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Smoothed-mean decomposition, one event per slab.
    Smoothing,
    /// Power spectra, one event per level.
    Spectra,
    /// Cospectra, one event per level.
    Cospectra,
    /// Distributions, one event per level.
    Distribution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Smoothing => "smoothing",
            Stage::Spectra => "spectra",
            Stage::Cospectra => "cospectra",
            Stage::Distribution => "distribution",
        })
    }
}

/// A unit of completed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Which computation advanced.
    pub stage: Stage,
    /// Units completed so far (1-based).
    pub completed: usize,
    /// Total units.
    pub total: usize,
}

/// Receives progress events.
///
/// Implemented for every `Fn(&ProgressEvent) + Sync`, so a closure can be
/// passed directly. Use [`silent`] to ignore progress.
pub trait ProgressObserver: Sync {
    /// Called once per completed unit of work.
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that discards every event.
pub fn silent(_: &ProgressEvent) {}

/// Forwards `event` to `observer` and emits a matching `tracing` event.
pub fn report(observer: &dyn ProgressObserver, event: ProgressEvent) {
    tracing::debug!(
        stage = %event.stage,
        completed = event.completed,
        total = event.total,
        "progress"
    );
    observer.on_progress(&event);
}
