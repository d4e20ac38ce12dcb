//! This library provides Bayesian online change point detection (BOCPD) tools:
//!  * The run-length filter as [`Bocpd`]
//!  * Threshold-based detection with a warm-up phase as [`ChangepointDetector`]
//!  * Observation likelihoods: [`GaussianWithEstimation`], [`PoissonGamma`]
//!    and [`GaussianKnownVariance`]
//!
//! # Example
//! ```rust
//! use bocpd::{ChangepointDetector, DetectorConfig};
//!
//! let mut cpd = ChangepointDetector::from_config(&DetectorConfig {
//!     hazard_lambda: 100.0,
//!     accumulation_cap: 5,
//!     threshold: 0.5,
//! }).unwrap();
//!
//! let data = [
//!     -0.26, 0.51, -0.23, -0.32, -0.93, -0.21, 1.11, 0.42, 1.04, 0.25, 10.0,
//! ];
//! for x in data {
//!     cpd.update(x).unwrap();
//! }
//! assert_eq!(cpd.changepoints(), &[10]);
//! ```
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

pub mod generators;

mod bocpd;
pub use bocpd::*;

mod detector;
pub use detector::*;

mod error;
pub use error::{BocpdError, Result};

mod hazard;
pub use hazard::*;

mod likelihood;
pub use likelihood::*;

mod run_length;
pub use run_length::RunLengthDistribution;

mod traits;
pub use self::traits::*;

pub use rv;
