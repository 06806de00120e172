//! # Per-Band Error Analysis
//!
//! Turns raw frequency-response samples into band-classified error
//! statistics. [`analyze`] is a pure function over the submitted band
//! specifications and the `(fr, hm)` response sample pairs; it runs after
//! every design, successful or not.
//!
//! Within each band the target amplitude is the line through
//! `(freq_begin, desired_begin)` and `(freq_end, desired_end)`. The error
//! series is the signed deviation of the measured magnitude from the
//! absolute value of that line, taken over all response samples inside the
//! band (edges inclusive, so a sample on a shared boundary counts in both
//! neighboring bands).

use serde::{Deserialize, Serialize};

use crate::state::FilterBandSpec;

/// Band classification derived from the desired amplitude edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterBandType {
    /// Mixed-sign or partially-zero desired edges.
    Undefined,
    /// Both desired edges strictly positive.
    PassBand,
    /// Both desired edges exactly zero.
    StopBand,
}

impl FilterBandType {
    /// Classify a band from its desired amplitude edges.
    pub fn classify(band: &FilterBandSpec) -> Self {
        if band.desired_begin == 0.0 && band.desired_end == 0.0 {
            FilterBandType::StopBand
        } else if band.desired_begin > 0.0 && band.desired_end > 0.0 {
            FilterBandType::PassBand
        } else {
            FilterBandType::Undefined
        }
    }
}

/// Error statistics for one band of the frequency response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterBandError {
    /// Number of response samples falling in the band, edges inclusive.
    pub no_points: usize,
    /// Maximum of the signed absolute-error series.
    pub max_error: f64,
    /// Minimum of the signed absolute-error series.
    pub min_error: f64,
    /// Trapezoidal estimate of the mean squared error over the band.
    pub error_integral: f64,
    /// Maximum of actual/target; only meaningful for a passband, else 0.
    pub max_rel_error: f64,
    /// Minimum of actual/target; only meaningful for a passband, else 0.
    pub min_rel_error: f64,
}

/// Recompute per-band classification and error statistics.
///
/// `fr` and `hm` are the parallel frequency/magnitude arrays of the last
/// response computation, ascending in `fr`. With empty `bands` (the state
/// after a failed design) both outputs are empty.
///
/// A band that selects zero samples keeps the extremes of the empty series:
/// `max_error` is `-infinity` and `min_error` is `+infinity`, while
/// `error_integral` stays 0. This mirrors the reference behavior and is
/// deliberately not replaced with another sentinel.
pub fn analyze(
    bands: &[FilterBandSpec],
    fr: &[f64],
    hm: &[f64],
) -> (Vec<FilterBandType>, Vec<FilterBandError>) {
    let mut types = Vec::with_capacity(bands.len());
    let mut errors = Vec::with_capacity(bands.len());

    for band in bands {
        let band_type = FilterBandType::classify(band);

        // Target line through the band's desired amplitude edges.
        let m = (band.desired_end - band.desired_begin) / (band.freq_end - band.freq_begin);
        let c = band.desired_begin - band.freq_begin * m;

        let mut series = Vec::new();
        let mut max_rel = f64::NEG_INFINITY;
        let mut min_rel = f64::INFINITY;
        for (&x, &y) in fr.iter().zip(hm.iter()) {
            if x >= band.freq_begin && x <= band.freq_end {
                let target = (c + m * x).abs();
                series.push(y - target);
                if band_type == FilterBandType::PassBand {
                    let rel = y / target;
                    max_rel = max_rel.max(rel);
                    min_rel = min_rel.min(rel);
                }
            }
        }

        let max_error = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min_error = series.iter().cloned().fold(f64::INFINITY, f64::min);

        let error_integral = if series.len() < 2 {
            0.0
        } else {
            let first = series[0];
            let last = series[series.len() - 1];
            let mut sum = 0.5 * (first * first + last * last);
            for e in &series[1..series.len() - 1] {
                sum += e * e;
            }
            sum / (series.len() - 1) as f64
        };

        let (max_rel_error, min_rel_error) = if band_type == FilterBandType::PassBand {
            (max_rel, min_rel)
        } else {
            (0.0, 0.0)
        };

        types.push(band_type);
        errors.push(FilterBandError {
            no_points: series.len(),
            max_error,
            min_error,
            error_integral,
            max_rel_error,
            min_rel_error,
        });
    }

    (types, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(
        freq_begin: f64,
        freq_end: f64,
        desired_begin: f64,
        desired_end: f64,
    ) -> FilterBandSpec {
        FilterBandSpec {
            freq_begin,
            freq_end,
            desired_begin,
            desired_end,
            weight: 1.0,
        }
    }

    #[test]
    fn test_band_classification() {
        assert_eq!(
            FilterBandType::classify(&band(0.0, 0.2, 0.0, 0.0)),
            FilterBandType::StopBand
        );
        assert_eq!(
            FilterBandType::classify(&band(0.0, 0.2, 1.0, 0.5)),
            FilterBandType::PassBand
        );
        assert_eq!(
            FilterBandType::classify(&band(0.0, 0.2, 0.0, 1.0)),
            FilterBandType::Undefined
        );
        assert_eq!(
            FilterBandType::classify(&band(0.0, 0.2, -1.0, 1.0)),
            FilterBandType::Undefined
        );
    }

    #[test]
    fn test_output_lengths_match_band_count() {
        let bands = vec![band(0.0, 0.4, 1.0, 1.0), band(0.6, 1.0, 0.0, 0.0)];
        let fr = vec![0.0, 0.25, 0.5, 0.75, 1.0];
        let hm = vec![1.0, 1.0, 0.5, 0.0, 0.0];
        let (types, errors) = analyze(&bands, &fr, &hm);
        assert_eq!(types.len(), bands.len());
        assert_eq!(errors.len(), bands.len());
    }

    #[test]
    fn test_empty_bands_yield_empty_outputs() {
        let (types, errors) = analyze(&[], &[], &[]);
        assert!(types.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_error_series_against_interpolated_target() {
        // Target line rises from 0 to 1 across the band; at x = 0.5 the
        // target is 0.5, so a magnitude of 0.75 is an error of +0.25.
        let bands = vec![band(0.0, 1.0, 0.0, 1.0)];
        let fr = vec![0.5];
        let hm = vec![0.75];
        let (_, errors) = analyze(&bands, &fr, &hm);
        assert_eq!(errors[0].no_points, 1);
        assert!((errors[0].max_error - 0.25).abs() < 1e-12);
        assert!((errors[0].min_error - 0.25).abs() < 1e-12);
        // Fewer than 2 points: no integral.
        assert_eq!(errors[0].error_integral, 0.0);
    }

    #[test]
    fn test_error_integral_two_samples() {
        // Zero target makes the error series equal the magnitudes.
        let bands = vec![band(0.0, 1.0, 0.0, 0.0)];
        let (e0, e1) = (0.3, -0.4);
        let (_, errors) = analyze(&bands, &[0.0, 1.0], &[e0, e1]);
        let expected = 0.5 * (e0 * e0 + e1 * e1);
        assert!((errors[0].error_integral - expected).abs() < 1e-12);
    }

    #[test]
    fn test_error_integral_three_samples() {
        let bands = vec![band(0.0, 1.0, 0.0, 0.0)];
        let (e0, e1, e2) = (0.1, 0.5, -0.2);
        let (_, errors) = analyze(&bands, &[0.0, 0.5, 1.0], &[e0, e1, e2]);
        let expected = (0.5 * e0 * e0 + e1 * e1 + 0.5 * e2 * e2) / 2.0;
        assert!((errors[0].error_integral - expected).abs() < 1e-12);
    }

    #[test]
    fn test_passband_relative_errors() {
        // Flat target of 2.0; magnitudes 1.0 and 3.0 give ratios 0.5 and 1.5.
        let bands = vec![band(0.0, 1.0, 2.0, 2.0)];
        let (types, errors) = analyze(&bands, &[0.0, 1.0], &[1.0, 3.0]);
        assert_eq!(types[0], FilterBandType::PassBand);
        assert!((errors[0].max_rel_error - 1.5).abs() < 1e-12);
        assert!((errors[0].min_rel_error - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_stopband_relative_errors_are_zero() {
        let bands = vec![band(0.0, 1.0, 0.0, 0.0)];
        let (types, errors) = analyze(&bands, &[0.0, 1.0], &[0.1, 0.2]);
        assert_eq!(types[0], FilterBandType::StopBand);
        assert_eq!(errors[0].max_rel_error, 0.0);
        assert_eq!(errors[0].min_rel_error, 0.0);
    }

    #[test]
    fn test_band_with_no_samples_keeps_unbounded_extremes() {
        // Band lies entirely above the sampled frequency range.
        let bands = vec![band(2.0, 3.0, 1.0, 1.0)];
        let (_, errors) = analyze(&bands, &[0.0, 0.5, 1.0], &[1.0, 1.0, 1.0]);
        assert_eq!(errors[0].no_points, 0);
        assert_eq!(errors[0].max_error, f64::NEG_INFINITY);
        assert_eq!(errors[0].min_error, f64::INFINITY);
        assert_eq!(errors[0].error_integral, 0.0);
    }

    #[test]
    fn test_shared_boundary_sample_counts_in_both_bands() {
        let bands = vec![band(0.0, 0.5, 1.0, 1.0), band(0.5, 1.0, 0.0, 0.0)];
        let fr = vec![0.0, 0.5, 1.0];
        let hm = vec![1.0, 0.5, 0.0];
        let (_, errors) = analyze(&bands, &fr, &hm);
        assert_eq!(errors[0].no_points, 2);
        assert_eq!(errors[1].no_points, 2);
    }
}
