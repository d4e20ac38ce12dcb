//! Hazard functions.

use crate::error::{BocpdError, Result};
use crate::traits::HazardFunction;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// A constant hazard function.
/// This is the hazard function that corresponds to a geometric distribution
/// with timescale λ.
pub fn constant_hazard(lambda: f64) -> impl Fn(usize) -> f64 {
    let inv_lambda = 1.0 / lambda;
    move |_: usize| inv_lambda
}

/// Validated constant hazard, `H(r) = 1/λ` for every run length `r`.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantHazard {
    lambda: f64,
}

impl ConstantHazard {
    /// Create a constant hazard with timescale `lambda`.
    ///
    /// The expected run length between change points is `lambda`.
    ///
    /// # Errors
    /// `lambda` must be finite and at least one, otherwise the hazard would not
    /// be a probability.
    ///
    /// # Example
    /// ```rust
    /// use bocpd::{ConstantHazard, HazardFunction};
    ///
    /// let h = ConstantHazard::new(250.0).unwrap();
    /// assert_eq!(h.hazard(0), h.hazard(1000));
    /// ```
    pub fn new(lambda: f64) -> Result<Self> {
        if lambda.is_finite() && lambda >= 1.0 {
            Ok(Self { lambda })
        } else {
            Err(BocpdError::Configuration(format!(
                "hazard timescale must be a finite value >= 1, got {lambda}"
            )))
        }
    }

    /// Timescale λ.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

/// Accept `h` if it is a probability.
pub(crate) fn check_hazard(h: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&h) {
        Ok(h)
    } else {
        Err(BocpdError::Configuration(format!(
            "hazard must be a probability in [0, 1], got {h}"
        )))
    }
}

impl HazardFunction for ConstantHazard {
    fn hazard(&self, _run_length: usize) -> f64 {
        self.lambda.recip()
    }
}
