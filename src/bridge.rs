//! # Engine Bridge
//!
//! Owns the lifecycle of the native FIR engine and marshals every design
//! and frequency-response request across the boundary.
//!
//! The bridge starts `Uninitialized`, moves to `Loading` when
//! [`initialize`](EngineBridge::initialize) spawns the loader thread, and
//! becomes `Ready` once the native entry points are bound. The transition
//! is one-way and one-time; a failed load leaves the bridge permanently
//! not-ready. Callers that must wait for the engine register an
//! [`on_ready`](EngineBridge::on_ready) observer: it fires exactly once,
//! and immediately (before the call returns) when the engine is already up,
//! so late subscribers never race the initialization.
//!
//! After `Ready`, [`design_filter`](EngineBridge::design_filter) and
//! [`compute_response`](EngineBridge::compute_response) are synchronous and
//! blocking. Every buffer handed to the engine lives inside the calling
//! scope and is freed on all exit paths, native error codes included.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use crate::analysis::analyze;
use crate::engine::{FirEntryPoints, NativeFirEngine};
use crate::marshal::EngineBuffer;
use crate::state::{FilterBandSpec, FilterSpec, FilterState, NO_POINTS};

/// Upper bound on the number of filter taps.
///
/// Driven by the native engine's fixed-size working memory.
pub const MAX_TAPS: usize = 1001;

/// Failures of a design request.
///
/// All of these are returned as values, never panicked. Validation errors
/// are raised before any buffer is allocated.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DesignError {
    #[error("FIR engine not initialized")]
    EngineNotReady,

    #[error("number of taps out of range 1..1001 (got {0})")]
    InvalidTapCount(usize),

    #[error("mismatch between number of band frequencies, amplitudes and weights")]
    ArrayLengthMismatch,

    #[error("native FIR computation failed: {0}")]
    NativeComputationFailure(String),
}

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    Loading,
    Ready,
}

struct Inner {
    phase: EnginePhase,
    engine: Option<Arc<dyn FirEntryPoints>>,
    pending: Vec<Box<dyn FnOnce() + Send>>,
}

/// Bridge between filter specifications and the native FIR engine.
pub struct EngineBridge {
    inner: Mutex<Inner>,
}

impl EngineBridge {
    /// Create an uninitialized bridge.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: EnginePhase::Uninitialized,
                engine: None,
                pending: Vec::new(),
            }),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> EnginePhase {
        self.lock().phase
    }

    /// Whether the engine is ready for design requests.
    pub fn is_ready(&self) -> bool {
        self.phase() == EnginePhase::Ready
    }

    /// Register an observer fired exactly once when the engine is ready.
    ///
    /// If the engine is already ready the observer fires synchronously,
    /// before this call returns. Otherwise observers fire in registration
    /// order when the engine comes up (on the loader thread).
    pub fn on_ready<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut inner = self.lock();
            if inner.phase != EnginePhase::Ready {
                inner.pending.push(Box::new(observer));
                return;
            }
        }
        observer();
    }

    /// Start loading the native engine in the background.
    ///
    /// One-shot: calls after the first are ignored. A load failure is
    /// logged and leaves the bridge not-ready for the process lifetime.
    pub fn initialize(self: &Arc<Self>) {
        {
            let mut inner = self.lock();
            if inner.phase != EnginePhase::Uninitialized {
                return;
            }
            inner.phase = EnginePhase::Loading;
        }

        let bridge = Arc::clone(self);
        thread::spawn(move || {
            let started = Instant::now();
            match NativeFirEngine::load() {
                Ok(engine) => {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "native FIR engine initialized"
                    );
                    bridge.install(Arc::new(engine));
                }
                Err(err) => {
                    tracing::error!("failed to load native FIR engine: {}", err);
                }
            }
        });
    }

    /// Bind an engine implementation and transition to `Ready`.
    ///
    /// Fires all pending observers in registration order. Used by the
    /// loader thread, and directly by tests and alternative engine builds.
    pub fn install(&self, engine: Arc<dyn FirEntryPoints>) {
        let pending = {
            let mut inner = self.lock();
            if inner.phase == EnginePhase::Ready {
                tracing::warn!("engine already installed, ignoring");
                return;
            }
            inner.engine = Some(engine);
            inner.phase = EnginePhase::Ready;
            std::mem::take(&mut inner.pending)
        };
        for observer in pending {
            observer();
        }
    }

    /// Synthesize `num_taps` least-squares FIR taps.
    ///
    /// Validates the request, marshals the four input arrays plus a
    /// reserved output buffer across the boundary, runs the native `firls`
    /// entry point and copies the taps back. All five buffers are freed
    /// before this returns, on success and failure alike. A nonzero native
    /// status is decoded via `firerror` and reported as
    /// [`DesignError::NativeComputationFailure`].
    pub fn design_filter(
        &self,
        num_taps: usize,
        frequency_bands: &[f64],
        desired_begin: &[f64],
        desired_end: &[f64],
        weights: &[f64],
        sample_frequency: f64,
    ) -> Result<Vec<f64>, DesignError> {
        let engine = self.engine()?;

        if num_taps < 1 || num_taps > MAX_TAPS {
            return Err(DesignError::InvalidTapCount(num_taps));
        }
        let num_bands = desired_begin.len();
        if frequency_bands.len() != 2 * num_bands
            || desired_end.len() != num_bands
            || weights.len() != num_bands
        {
            return Err(DesignError::ArrayLengthMismatch);
        }

        tracing::debug!(num_taps, num_bands, "marshaling design request");
        let bands_buf = EngineBuffer::copy_in(frequency_bands);
        let begin_buf = EngineBuffer::copy_in(desired_begin);
        let end_buf = EngineBuffer::copy_in(desired_end);
        let weight_buf = EngineBuffer::copy_in(weights);
        let mut taps_buf = EngineBuffer::reserve(num_taps);

        let status = unsafe {
            engine.firls(
                taps_buf.as_mut_ptr(),
                num_taps as i32,
                num_bands as i32,
                bands_buf.as_ptr(),
                begin_buf.as_ptr(),
                end_buf.as_ptr(),
                weight_buf.as_ptr(),
                sample_frequency,
            )
        };

        if status != 0 {
            return Err(DesignError::NativeComputationFailure(
                engine.firerror(status),
            ));
        }
        Ok(taps_buf.copy_out())
        // buffers freed here on every path
    }

    /// Sample the magnitude frequency response of `taps` at `num_points`
    /// frequencies.
    ///
    /// Returns the parallel `(frequencies, magnitudes)` arrays. Failure -
    /// engine not ready or a nonzero native status - yields two empty
    /// sequences; this mirrors the native contract and carries no separate
    /// error type.
    pub fn compute_response(
        &self,
        num_points: usize,
        taps: &[f64],
        sample_frequency: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let Ok(engine) = self.engine() else {
            return (Vec::new(), Vec::new());
        };

        let taps_buf = EngineBuffer::copy_in(taps);
        let mut freq_buf = EngineBuffer::reserve(num_points);
        let mut mag_buf = EngineBuffer::reserve(num_points);

        let status = unsafe {
            engine.firfreqz(
                freq_buf.as_mut_ptr(),
                mag_buf.as_mut_ptr(),
                num_points as i32,
                taps.len() as i32,
                taps_buf.as_ptr(),
                sample_frequency,
            )
        };

        if status != 0 {
            return (Vec::new(), Vec::new());
        }
        (freq_buf.copy_out(), mag_buf.copy_out())
    }

    /// Run a complete design request and publish the result.
    ///
    /// Synthesizes taps, rebuilds the band list from the input arrays
    /// (pairing `frequency_bands[2i], frequency_bands[2i+1]` with
    /// `desired_begin[i], desired_end[i], weights[i]`), samples the
    /// frequency response at [`NO_POINTS`] frequencies and recomputes the
    /// per-band error statistics. Exactly one complete snapshot is
    /// published into `state`: the full result on success, the empty form
    /// on any failure. An empty frequency response counts as failure.
    #[allow(clippy::too_many_arguments)]
    pub fn request_design(
        &self,
        state: &mut FilterState,
        num_taps: usize,
        frequency_bands: &[f64],
        desired_begin: &[f64],
        desired_end: &[f64],
        weights: &[f64],
        sample_frequency: f64,
    ) -> Result<Vec<f64>, DesignError> {
        let started = Instant::now();
        let taps = match self.design_filter(
            num_taps,
            frequency_bands,
            desired_begin,
            desired_end,
            weights,
            sample_frequency,
        ) {
            Ok(taps) => taps,
            Err(err) => {
                tracing::warn!("filter design failed: {}", err);
                state.publish(FilterSpec::empty());
                return Err(err);
            }
        };
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            num_taps,
            "firls synthesis complete"
        );

        let bands: Vec<FilterBandSpec> = (0..desired_begin.len())
            .map(|i| FilterBandSpec {
                freq_begin: frequency_bands[2 * i],
                freq_end: frequency_bands[2 * i + 1],
                desired_begin: desired_begin[i],
                desired_end: desired_end[i],
                weight: weights[i],
            })
            .collect();

        let started = Instant::now();
        let (fr, hm) = self.compute_response(NO_POINTS, &taps, sample_frequency);
        if fr.is_empty() {
            tracing::warn!("frequency response computation failed");
            state.publish(FilterSpec::empty());
            return Err(DesignError::NativeComputationFailure(
                "frequency response computation failed".to_string(),
            ));
        }
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            points = fr.len(),
            "frequency response complete"
        );

        let (type_per_band, error_per_band) = analyze(&bands, &fr, &hm);
        state.publish(FilterSpec {
            sample_frequency,
            bands,
            taps: taps.clone(),
            fr,
            hm,
            error_per_band,
            type_per_band,
        });
        Ok(taps)
    }

    fn engine(&self) -> Result<Arc<dyn FirEntryPoints>, DesignError> {
        let inner = self.lock();
        match (&inner.engine, inner.phase) {
            (Some(engine), EnginePhase::Ready) => Ok(Arc::clone(engine)),
            _ => Err(DesignError::EngineNotReady),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("engine bridge lock poisoned")
    }
}

impl Default for EngineBridge {
    fn default() -> Self {
        Self::new()
    }
}
