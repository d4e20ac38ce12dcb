//! Gaussian likelihood with parameters estimated from the running tail.

use crate::error::{BocpdError, Result};
use crate::traits::ObservationLikelihood;
use rv::dist::Gaussian;
use rv::traits::Rv;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Gaussian likelihood whose mean and variance are re-estimated from every
/// sample seen since the last prune.
///
/// Each step appends one `(mean, variance)` pair computed from the whole
/// retained tail. The pair is shared by all run-length hypotheses alive at
/// that step instead of keeping one conjugate posterior per hypothesis, so the
/// estimator needs a warm-up window ([`accumulate`](Self::accumulate)) before
/// the variance is meaningful.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GaussianWithEstimation {
    /// Raw samples since the last prune.
    samples: Vec<f64>,
    /// One mean estimate per hypothesis.
    means: Vec<f64>,
    /// One variance estimate per hypothesis.
    variances: Vec<f64>,
    sample_sum: f64,
    squared_sample_sum: f64,
}

impl GaussianWithEstimation {
    /// An estimator with no samples.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples retained since the last prune.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Mean estimates, one per hypothesis.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Variance estimates, one per hypothesis.
    #[must_use]
    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    /// Sum of the retained samples.
    #[must_use]
    pub fn sample_sum(&self) -> f64 {
        self.sample_sum
    }

    /// Sum of the squared retained samples.
    #[must_use]
    pub fn squared_sample_sum(&self) -> f64 {
        self.squared_sample_sum
    }

    fn push_sample(&mut self, observation: f64) {
        self.sample_sum += observation;
        self.squared_sample_sum += observation * observation;
        self.samples.push(observation);
    }

    /// `(mean, variance)` of the retained tail extended by `extra`.
    fn tail_estimate(&self, extra: &[f64]) -> Result<(f64, f64)> {
        let count = self.samples.len() + extra.len();
        if count < 2 {
            return Err(BocpdError::NumericalDegeneracy(
                "variance of a single sample is undefined".into(),
            ));
        }

        let n = count as f64;
        let sum = self.sample_sum + extra.iter().sum::<f64>();
        let squared_sum = self.squared_sample_sum
            + extra.iter().map(|x| x * x).sum::<f64>();
        let mean = sum / n;
        let variance = (squared_sum - sum * sum / n) / (n - 1.0);
        if !(variance.is_finite() && variance > 0.0) {
            return Err(BocpdError::NumericalDegeneracy(format!(
                "estimated variance {variance} from {count} samples"
            )));
        }
        Ok((mean, variance))
    }

    fn clear_estimates(&mut self) {
        self.means.clear();
        self.variances.clear();
    }
}

impl ObservationLikelihood for GaussianWithEstimation {
    fn hypotheses(&self) -> usize {
        self.means.len()
    }

    fn predictive(&self, observation: f64) -> Result<Vec<f64>> {
        self.means
            .iter()
            .zip(self.variances.iter())
            .map(|(&mean, &variance)| {
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
        let (mean, variance) = self.tail_estimate(&[observation])?;

        self.push_sample(observation);
        self.means.push(mean);
        self.variances.push(variance);
        Ok(())
    }

    fn prune(&mut self, gap_size: usize) {
        let drop = self.samples.len().saturating_sub(gap_size);
        self.samples.drain(..drop);

        self.sample_sum = self.samples.iter().sum();
        self.squared_sample_sum = 0.0;
        for x in &self.samples {
            self.squared_sample_sum += x * x;
        }

        self.clear_estimates();
    }

    // The last warm-up sample is both accumulated and estimated from, so the
    // first estimate counts it twice.
    fn engage(&mut self, observation: f64) -> Result<()> {
        let (mean, variance) =
            self.tail_estimate(&[observation, observation])?;

        self.push_sample(observation);
        self.push_sample(observation);
        self.clear_estimates();
        self.means.push(mean);
        self.variances.push(variance);
        Ok(())
    }

    fn accumulate(&mut self, observation: f64) -> Result<()> {
        self.push_sample(observation);
        Ok(())
    }
}
