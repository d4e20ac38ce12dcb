//! Observation likelihoods for the run-length filter.
//!
//! * [`GaussianWithEstimation`] estimates a Gaussian from the running tail and
//!   needs a warm-up window.
//! * [`PoissonGamma`] is the conjugate model for event counts.
//! * [`GaussianKnownVariance`] is the conjugate model for a Gaussian mean.

mod gaussian_estimation;
pub use gaussian_estimation::GaussianWithEstimation;

mod gaussian_known_variance;
pub use gaussian_known_variance::GaussianKnownVariance;

mod poisson;
pub use poisson::PoissonGamma;
