//! # firls-bridge
//!
//! Bridge between a UI-facing multi-band FIR filter specification and a
//! native least-squares synthesis / frequency-response engine.
//!
//! ## Overview
//!
//! The native engine exposes three C entry points: `firls` (tap
//! synthesis), `firerror` (status-code decoding) and `firfreqz`
//! (frequency-response sampling). This crate owns everything on the near
//! side of that boundary:
//!
//! - **[`EngineBridge`]**: engine lifecycle (`Uninitialized → Loading →
//!   Ready` with replay-on-late-subscribe readiness observers), request
//!   validation, and the design/response calls themselves
//! - **[`EngineBuffer`]**: scoped marshaling of double-precision arrays
//!   across the boundary, released exactly once on every exit path
//! - **[`FilterState`]**: the observable snapshot of the current design,
//!   published whole so readers never see a partial update
//! - **[`analyze`]**: per-band classification and error/ripple statistics
//!   over the sampled frequency response
//!
//! ## Control Flow
//!
//! ```text
//! request_design → validate → marshal in → firls → marshal taps out
//!                → firfreqz → marshal (fr, hm) out
//!                → analyze bands → publish FilterSpec snapshot
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use firls_bridge::{EngineBridge, FilterState};
//!
//! let bridge = Arc::new(EngineBridge::new());
//! bridge.initialize();
//!
//! let mut state = FilterState::new();
//! state.subscribe(|spec| println!("{} taps", spec.taps.len()));
//!
//! // Passband 0.0..0.2, stopband 0.3..0.5 at fs = 1.0
//! let result = bridge.request_design(
//!     &mut state,
//!     64,
//!     &[0.0, 0.2, 0.3, 0.5],
//!     &[1.0, 0.0],
//!     &[1.0, 0.0],
//!     &[1.0, 1.0],
//!     1.0,
//! );
//! ```

pub mod analysis;
pub mod bridge;
pub mod engine;
pub mod logging;
pub mod marshal;
pub mod state;

pub use analysis::{analyze, FilterBandError, FilterBandType};
pub use bridge::{DesignError, EngineBridge, EnginePhase, MAX_TAPS};
pub use engine::{is_available, EngineLoadError, FirEntryPoints, NativeFirEngine};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use marshal::EngineBuffer;
pub use state::{FilterBandSpec, FilterSpec, FilterState, NO_POINTS};
