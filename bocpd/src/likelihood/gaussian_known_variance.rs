//! Gaussian likelihood with unknown mean and known variance.

use crate::error::{BocpdError, Result};
use crate::traits::ObservationLikelihood;
use rv::dist::Gaussian;
use rv::traits::Rv;
use std::collections::VecDeque;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Normal observations with known variance `σ²ₓ` and a `N(μ₀, σ²₀)` prior on
/// the mean, updated per run-length hypothesis.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKnownVariance {
    prior_mean: f64,
    prior_variance: f64,
    observation_variance: f64,
    /// `(mean, precision)` of the posterior over the mean, indexed by run length.
    posteriors: VecDeque<(f64, f64)>,
}

impl GaussianKnownVariance {
    /// Create the model.
    ///
    /// # Errors
    /// The prior mean must be finite and both variances positive and finite.
    pub fn new(
        prior_mean: f64,
        prior_variance: f64,
        observation_variance: f64,
    ) -> Result<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !prior_mean.is_finite()
            || !positive(prior_variance)
            || !positive(observation_variance)
        {
            return Err(BocpdError::Configuration(format!(
                "invalid Gaussian prior: mean {prior_mean}, variance {prior_variance}, \
                 observation variance {observation_variance}"
            )));
        }

        Ok(Self {
            prior_mean,
            prior_variance,
            observation_variance,
            posteriors: VecDeque::new(),
        })
    }

    /// Posterior means, indexed by run length.
    pub fn means(&self) -> impl Iterator<Item = f64> + '_ {
        self.posteriors.iter().map(|&(mean, _)| mean)
    }

    /// Posterior predictive variances, indexed by run length.
    pub fn predictive_variances(&self) -> impl Iterator<Item = f64> + '_ {
        self.posteriors
            .iter()
            .map(|&(_, precision)| precision.recip() + self.observation_variance)
    }
}

impl ObservationLikelihood for GaussianKnownVariance {
    fn hypotheses(&self) -> usize {
        self.posteriors.len()
    }

    fn predictive(&self, observation: f64) -> Result<Vec<f64>> {
        self.means()
            .zip(self.predictive_variances())
            .map(|(mean, variance)| {
                Gaussian::new(mean, variance.sqrt())
                    .map(|g| g.f(&observation))
                    .map_err(|err| {
                        BocpdError::NumericalDegeneracy(format!(
                            "no Gaussian with mean {mean} and variance {variance}: {err:?}"
                        ))
                    })
            })
            .collect()
    }

    fn update_posterior(&mut self, observation: f64) -> Result<()> {
        if !observation.is_finite() {
            return Err(BocpdError::UnsupportedObservation(observation));
        }

        let obs_precision = self.observation_variance.recip();
        self.posteriors.iter_mut().for_each(|(mean, precision)| {
            let updated = *precision + obs_precision;
            *mean = (*mean * *precision + observation * obs_precision) / updated;
            *precision = updated;
        });
        self.posteriors
            .push_front((self.prior_mean, self.prior_variance.recip()));
        Ok(())
    }

    fn prune(&mut self, gap_size: usize) {
        self.posteriors.truncate(gap_size + 1);
    }

    fn engage(&mut self, observation: f64) -> Result<()> {
        if !observation.is_finite() {
            return Err(BocpdError::UnsupportedObservation(observation));
        }
        self.posteriors.clear();
        self.posteriors
            .push_front((self.prior_mean, self.prior_variance.recip()));
        Ok(())
    }
}
