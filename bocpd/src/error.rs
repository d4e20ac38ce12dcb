//! Errors raised by the run-length filter, its likelihoods and the detector.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BocpdError>;

/// Errors that can occur while configuring or stepping a detector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BocpdError {
    /// A hazard rate, threshold or prior parameter is out of range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The update would have produced NaN or infinite probabilities.
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// The likelihood tracks a different number of hypotheses than the
    /// run-length distribution expects.
    #[error("alignment error: expected {expected} hypotheses, found {found}")]
    Alignment {
        /// Hypotheses required by the filter.
        expected: usize,
        /// Hypotheses reported by the likelihood.
        found: usize,
    },

    /// A window-control call referenced a start time outside the active window.
    #[error(
        "start time {start_time} is outside the active window [{window_start}, {next_time}]"
    )]
    InvalidWindow {
        /// Requested start time.
        start_time: usize,
        /// Current start of the window.
        window_start: usize,
        /// Time index of the next observation.
        next_time: usize,
    },

    /// The observation lies outside the support of the likelihood.
    #[error("observation {0} is outside the support of the likelihood")]
    UnsupportedObservation(f64),
}
