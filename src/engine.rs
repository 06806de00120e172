//! # Native Engine Binding
//!
//! Low-level binding to the native least-squares FIR library.
//!
//! This module uses dynamic loading (libloading) to avoid a compile-time
//! dependency on the native library. The library is loaded at runtime,
//! allowing the same binary to start with or without the engine installed.
//!
//! ## Library Functions
//!
//! Exactly three entry points are bound, once, when the library loads:
//!
//! - `firls` - least-squares FIR tap synthesis
//! - `firerror` - decode a `firls` status code into a message
//! - `firfreqz` - sample the magnitude frequency response of a tap set
//!
//! All arrays crossing the boundary are contiguous double-precision values
//! in native byte order. The caller owns every buffer it passes in and must
//! free each one exactly once, regardless of outcome.

use std::ffi::{c_char, c_double, c_int, CStr};

use libloading::{Library, Symbol};

/// The three native entry points behind a fixed interface.
///
/// The bridge depends on this trait rather than on the loader, so tests and
/// alternative engine builds can substitute their own implementation.
pub trait FirEntryPoints: Send + Sync {
    /// Synthesize `num_taps` least-squares FIR taps into `result`.
    ///
    /// Returns 0 on success; any other value is an opaque failure code to be
    /// decoded with [`firerror`](FirEntryPoints::firerror).
    ///
    /// # Safety
    ///
    /// `result` must point to at least `num_taps` writable doubles; `bands`
    /// must hold `2 * num_bands` doubles and `desired_begin`, `desired_end`
    /// and `weight` must hold `num_bands` doubles each.
    #[allow(clippy::too_many_arguments)]
    unsafe fn firls(
        &self,
        result: *mut f64,
        num_taps: i32,
        num_bands: i32,
        bands: *const f64,
        desired_begin: *const f64,
        desired_end: *const f64,
        weight: *const f64,
        sample_frequency: f64,
    ) -> i32;

    /// Decode a nonzero `firls` status code into a human-readable message.
    fn firerror(&self, code: i32) -> String;

    /// Sample the magnitude response of `taps` at `num_points` frequencies.
    ///
    /// Writes `num_points` doubles into each of `frequencies` and
    /// `magnitudes` on success (status 0).
    ///
    /// # Safety
    ///
    /// `frequencies` and `magnitudes` must each point to at least
    /// `num_points` writable doubles; `taps` must hold `num_taps` doubles.
    unsafe fn firfreqz(
        &self,
        frequencies: *mut f64,
        magnitudes: *mut f64,
        num_points: i32,
        num_taps: i32,
        taps: *const f64,
        sample_frequency: f64,
    ) -> i32;
}

/// Engine loading errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineLoadError {
    #[error("native FIR engine library not found - install the firls runtime")]
    LibraryNotFound,
}

/// Loaded native library and its three function pointers.
struct FirSymbols {
    _lib: Library,
    firls: Symbol<
        'static,
        unsafe extern "C" fn(
            *mut c_double,
            c_int,
            c_int,
            *const c_double,
            *const c_double,
            *const c_double,
            *const c_double,
            c_double,
        ) -> c_int,
    >,
    firerror: Symbol<'static, unsafe extern "C" fn(c_int) -> *const c_char>,
    firfreqz: Symbol<
        'static,
        unsafe extern "C" fn(
            *mut c_double,
            *mut c_double,
            c_int,
            c_int,
            *const c_double,
            c_double,
        ) -> c_int,
    >,
}

/// Library names to try on different platforms.
#[cfg(target_os = "linux")]
const LIB_NAMES: &[&str] = &["libfir.so.1", "libfir.so"];

#[cfg(target_os = "macos")]
const LIB_NAMES: &[&str] = &["libfir.dylib", "libfir.1.dylib"];

#[cfg(target_os = "windows")]
const LIB_NAMES: &[&str] = &["fir.dll", "libfir.dll"];

fn load_symbols() -> Option<FirSymbols> {
    for name in LIB_NAMES {
        if let Ok(lib) = unsafe { Library::new(name) } {
            let result = unsafe {
                // The symbols borrow the Library; transmute the reference to
                // 'static because the Library lives in the same struct.
                let lib_ref: &'static Library = std::mem::transmute(&lib);

                Some(FirSymbols {
                    firls: lib_ref.get(b"firls\0").ok()?,
                    firerror: lib_ref.get(b"firerror\0").ok()?,
                    firfreqz: lib_ref.get(b"firfreqz\0").ok()?,
                    _lib: lib,
                })
            };

            if result.is_some() {
                tracing::info!("loaded native FIR engine: {}", name);
                return result;
            }
        }
    }
    tracing::debug!("native FIR engine library not found");
    None
}

/// The dynamically loaded native engine.
pub struct NativeFirEngine {
    sym: FirSymbols,
}

impl NativeFirEngine {
    /// Load the native library and bind its three entry points.
    pub fn load() -> Result<Self, EngineLoadError> {
        load_symbols()
            .map(|sym| Self { sym })
            .ok_or(EngineLoadError::LibraryNotFound)
    }
}

impl FirEntryPoints for NativeFirEngine {
    unsafe fn firls(
        &self,
        result: *mut f64,
        num_taps: i32,
        num_bands: i32,
        bands: *const f64,
        desired_begin: *const f64,
        desired_end: *const f64,
        weight: *const f64,
        sample_frequency: f64,
    ) -> i32 {
        (self.sym.firls)(
            result,
            num_taps,
            num_bands,
            bands,
            desired_begin,
            desired_end,
            weight,
            sample_frequency,
        )
    }

    fn firerror(&self, code: i32) -> String {
        let msg = unsafe { (self.sym.firerror)(code) };
        if msg.is_null() {
            format!("unknown FIR engine error (code {})", code)
        } else {
            unsafe { CStr::from_ptr(msg).to_string_lossy().into_owned() }
        }
    }

    unsafe fn firfreqz(
        &self,
        frequencies: *mut f64,
        magnitudes: *mut f64,
        num_points: i32,
        num_taps: i32,
        taps: *const f64,
        sample_frequency: f64,
    ) -> i32 {
        (self.sym.firfreqz)(
            frequencies,
            magnitudes,
            num_points,
            num_taps,
            taps,
            sample_frequency,
        )
    }
}

/// Check if the native FIR library can be loaded on this machine.
pub fn is_available() -> bool {
    NativeFirEngine::load().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_availability() {
        // This test just checks that library detection works either way.
        if is_available() {
            println!("native FIR engine is available");
        } else {
            println!("native FIR engine not available (expected on most dev machines)");
        }
    }

    #[test]
    fn test_load_error_display() {
        let err = EngineLoadError::LibraryNotFound;
        assert!(err.to_string().contains("not found"));
    }
}
