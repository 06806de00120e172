//! # Shared Filter State
//!
//! The observable data model holding the current filter specification and
//! design results. A single [`FilterState`] is created at process start and
//! lives for the process lifetime; it is written only by the design
//! pipeline and read by arbitrarily many subscribers.
//!
//! Writers never mutate fields in place. The pipeline assembles a complete
//! [`FilterSpec`] snapshot - bands, taps, response and the recomputed error
//! statistics - and publishes it in one step, so no subscriber can observe
//! a partially updated design.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{FilterBandError, FilterBandType};

/// Number of frequency-response sample points per design.
///
/// Limited by the native engine's bounded working stack: each point costs
/// the native side two double-precision scratch slots, so raising this
/// requires a larger native stack budget.
pub const NO_POINTS: usize = 4001;

/// One frequency band of a multi-band filter specification.
///
/// The desired amplitude is interpolated linearly from `desired_begin` at
/// `freq_begin` to `desired_end` at `freq_end`. Immutable once submitted
/// for a design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterBandSpec {
    pub freq_begin: f64,
    pub freq_end: f64,
    pub desired_begin: f64,
    pub desired_end: f64,
    /// Relative importance of the band in the least-squares fit (> 0).
    pub weight: f64,
}

/// Complete snapshot of one filter design.
///
/// `fr` and `hm` are parallel arrays (response sample frequency and
/// magnitude, ascending in `fr`); `bands`, `error_per_band` and
/// `type_per_band` always have equal lengths. After a failed design the
/// snapshot equals [`FilterSpec::empty`]: `sample_frequency` is 0 and every
/// array is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub sample_frequency: f64,
    pub bands: Vec<FilterBandSpec>,
    /// Filter coefficients; `num_taps` entries on success.
    pub taps: Vec<f64>,
    /// Frequencies of the sampled frequency response.
    pub fr: Vec<f64>,
    /// Magnitudes of the sampled frequency response.
    pub hm: Vec<f64>,
    pub error_per_band: Vec<FilterBandError>,
    pub type_per_band: Vec<FilterBandType>,
}

impl FilterSpec {
    /// The empty form: no valid design.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Observable holder of the current [`FilterSpec`].
pub struct FilterState {
    current: Arc<FilterSpec>,
    observers: Vec<Box<dyn Fn(&FilterSpec) + Send>>,
}

impl FilterState {
    /// Create the state holder with the empty spec.
    pub fn new() -> Self {
        Self {
            current: Arc::new(FilterSpec::empty()),
            observers: Vec::new(),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<FilterSpec> {
        Arc::clone(&self.current)
    }

    /// Register an observer called with every published snapshot.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&FilterSpec) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Replace the current snapshot and notify observers in registration
    /// order. Called only by the design pipeline, with a fully assembled
    /// spec.
    pub(crate) fn publish(&mut self, spec: FilterSpec) {
        self.current = Arc::new(spec);
        for observer in &self.observers {
            observer(&self.current);
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterState")
            .field("current", &self.current)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_starts_in_empty_form() {
        let state = FilterState::new();
        let spec = state.snapshot();
        assert_eq!(*spec, FilterSpec::empty());
        assert_eq!(spec.sample_frequency, 0.0);
        assert!(spec.bands.is_empty());
        assert!(spec.taps.is_empty());
        assert!(spec.fr.is_empty());
        assert!(spec.hm.is_empty());
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let mut state = FilterState::new();
        state.publish(FilterSpec {
            sample_frequency: 48000.0,
            taps: vec![1.0, 2.0, 1.0],
            ..FilterSpec::empty()
        });
        let spec = state.snapshot();
        assert_eq!(spec.sample_frequency, 48000.0);
        assert_eq!(spec.taps.len(), 3);
    }

    #[test]
    fn test_observers_see_complete_snapshot() {
        let seen: Arc<Mutex<Vec<(f64, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut state = FilterState::new();

        let sink = Arc::clone(&seen);
        state.subscribe(move |spec| {
            // Sample frequency and taps must arrive together.
            sink.lock()
                .unwrap()
                .push((spec.sample_frequency, spec.taps.len()));
        });

        state.publish(FilterSpec {
            sample_frequency: 1.0,
            taps: vec![0.5; 64],
            ..FilterSpec::empty()
        });
        state.publish(FilterSpec::empty());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(1.0, 64), (0.0, 0)]);
    }

    #[test]
    fn test_earlier_snapshots_stay_valid() {
        let mut state = FilterState::new();
        state.publish(FilterSpec {
            sample_frequency: 2.0,
            ..FilterSpec::empty()
        });
        let old = state.snapshot();
        state.publish(FilterSpec::empty());
        assert_eq!(old.sample_frequency, 2.0);
        assert_eq!(state.snapshot().sample_frequency, 0.0);
    }
}
