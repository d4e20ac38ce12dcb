//! Online Bayesian Change Point Detection
//!
//! This code is derived from
//! "Bayesian Online Changepoint Detection"; Ryan Adams, David `MacKay`; arXiv:0710.3742
//! Which can be found [here](https://arxiv.org/pdf/0710.3742.pdf).

use crate::error::{BocpdError, Result};
use crate::hazard::check_hazard;
use crate::run_length::RunLengthDistribution;
use crate::traits::{HazardFunction, ObservationLikelihood};
use tracing::trace;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Online Bayesian Change Point Detection state container.
///
/// The filter tracks a window of the stream starting at `start_time`. Run
/// length `r` of the distribution is aligned with hypothesis `r` of the
/// likelihood.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Bocpd<H, L> {
    /// Prior probability of a change at each run length.
    hazard: H,
    /// Probability of observing the next datum under each run length.
    likelihood: L,
    /// Run-length probabilities.
    r: RunLengthDistribution,
    /// Time index of the first step of the window.
    start_time: usize,
    /// Time index of the next observation.
    t: usize,
    /// Steps in the window, `t - start_time`.
    gap_size: usize,
}

impl<H, L> Bocpd<H, L>
where
    H: HazardFunction,
    L: ObservationLikelihood,
{
    /// Create a new Bocpd analyzer
    ///
    /// # Parameters
    /// * `hazard` - Prior probability of a change point at each run length.
    /// * `likelihood` - Predictive model for the observations.
    ///
    /// # Example
    /// ```rust
    /// use bocpd::{Bocpd, ConstantHazard, GaussianKnownVariance};
    ///
    /// let mut cpd = Bocpd::new(
    ///     ConstantHazard::new(250.0).unwrap(),
    ///     GaussianKnownVariance::new(0.0, 1.0, 1.0).unwrap(),
    /// );
    /// for x in [0.1, -0.3, 0.2] {
    ///     cpd.update(x).unwrap();
    /// }
    /// assert_eq!(cpd.most_likely_run_length().0, 2);
    /// ```
    pub fn new(hazard: H, likelihood: L) -> Self {
        Self {
            hazard,
            likelihood,
            r: RunLengthDistribution::new(),
            start_time: 0,
            t: 0,
            gap_size: 0,
        }
    }

    /// Update the model with a new datum.
    ///
    /// If the likelihood holds no hypotheses yet the datum opens a new window:
    /// the likelihood absorbs it and the filter restarts at the next time
    /// index, certain of run length zero.
    ///
    /// # Errors
    /// * [`BocpdError::Alignment`] if the likelihood's predictive does not
    ///   cover every live run length.
    /// * [`BocpdError::NumericalDegeneracy`] if the evidence underflows or the
    ///   likelihood cannot update.
    /// * [`BocpdError::Configuration`] if the hazard function returns a value
    ///   outside `[0, 1]`.
    ///
    /// The filter is unchanged when an error is returned.
    pub fn update(&mut self, observation: f64) -> Result<()> {
        if self.likelihood.hypotheses() == 0 {
            return self.open_window(observation);
        }

        let gap_size = self.gap_size + 1;
        let predictive = self.likelihood.predictive(observation)?;
        if predictive.len() != gap_size {
            return Err(BocpdError::Alignment {
                expected: gap_size,
                found: predictive.len(),
            });
        }

        let evidence: f64 = self
            .r
            .as_slice()
            .iter()
            .zip(predictive.iter())
            .map(|(r, p)| r * p)
            .sum();
        if !evidence.is_finite() || evidence < f64::MIN_POSITIVE {
            return Err(BocpdError::NumericalDegeneracy(format!(
                "run-length evidence {evidence} at time {}",
                self.t
            )));
        }

        let hazards = (0..gap_size)
            .map(|i| check_hazard(self.hazard.hazard(i)))
            .collect::<Result<Vec<f64>>>()?;

        self.likelihood.update_posterior(observation)?;

        let r = self.r.slots_mut(gap_size + 2);
        let mut r0 = 0.0;
        let mut r_sum = 0.0;
        for i in (0..gap_size).rev() {
            // Evaluate growth probabilities and shift probabilities down
            // scaling by the hazard function and the predprobs
            let h = hazards[i];
            let mass = r[i] * predictive[i];
            r[i + 1] = mass * (1.0 - h);
            r0 += mass * h;
            r_sum += r[i + 1];
        }
        r_sum += r0;
        // Accumulate mass back down to r[0], the probability there was a
        // change point at this location.
        r[0] = r0;

        // Normalize R
        for p in &mut r[..=gap_size] {
            *p /= r_sum;
        }
        self.r.set_len(gap_size + 1);

        debug_assert!(
            !self.r.as_slice().iter().any(|x| x.is_nan()),
            "Resulting run-length probabilities cannot contain NaNs"
        );

        self.t += 1;
        self.gap_size = gap_size;
        Ok(())
    }

    fn open_window(&mut self, observation: f64) -> Result<()> {
        self.likelihood.update_posterior(observation)?;
        let found = self.likelihood.hypotheses();
        if found != 1 {
            return Err(BocpdError::Alignment { expected: 1, found });
        }

        let time = self.t;
        self.set_times(time);
        trace!(time, "opened run-length window");
        Ok(())
    }

    /// Most likely run length and its probability, ties going to the shorter
    /// run.
    ///
    /// # Panics
    /// Never; the distribution always has at least one live run length.
    #[must_use]
    pub fn most_likely_run_length(&self) -> (usize, f64) {
        self.r
            .argmax_within(self.gap_size + 1)
            .expect("r should not be empty")
    }

    /// Most likely run length excluding the longest one, which stands for "no
    /// change since the window started". `None` while the window is empty.
    #[must_use]
    pub fn most_likely_non_max_run_length(&self) -> Option<(usize, f64)> {
        self.r.argmax_within(self.gap_size)
    }

    fn set_gap(&mut self, start_time: usize) -> Result<()> {
        if start_time > self.t {
            return Err(BocpdError::InvalidWindow {
                start_time,
                window_start: self.start_time,
                next_time: self.t,
            });
        }
        self.start_time = start_time;
        self.gap_size = self.t - start_time;
        Ok(())
    }

    /// Synchronize the clock so that `time` is the last observed index and
    /// restart the window at `time + 1`.
    ///
    /// The likelihood is not touched; it must hold exactly one hypothesis for
    /// the next [`update`](Self::update) to align.
    pub fn set_times(&mut self, time: usize) {
        self.t = time + 1;
        self.start_time = self.t;
        self.gap_size = 0;
        self.r.reset(1);
    }

    /// Discard everything before `start_time` and restart the run-length
    /// distribution with all of its mass on run length zero.
    ///
    /// Pruning at the current start time is a no-op.
    ///
    /// # Errors
    /// * [`BocpdError::InvalidWindow`] if `start_time` precedes the window or
    ///   lies past the next time index.
    /// * [`BocpdError::Alignment`] if the pruned likelihood does not match the
    ///   new window.
    pub fn prune(&mut self, start_time: usize) -> Result<()> {
        if start_time == self.start_time {
            return Ok(());
        }
        if start_time < self.start_time {
            return Err(BocpdError::InvalidWindow {
                start_time,
                window_start: self.start_time,
                next_time: self.t,
            });
        }

        self.set_gap(start_time)?;
        self.likelihood.prune(self.gap_size);

        let found = self.likelihood.hypotheses();
        if found != 0 && found != self.gap_size + 1 {
            return Err(BocpdError::Alignment {
                expected: self.gap_size + 1,
                found,
            });
        }

        self.r.reset(self.gap_size + 1);
        trace!(start_time, gap_size = self.gap_size, "pruned run-length window");
        Ok(())
    }
}

impl<H, L> Bocpd<H, L> {
    /// Probabilities of the live run lengths `0..=gap_size`.
    #[must_use]
    pub fn run_length_probs(&self) -> &[f64] {
        self.r.as_slice()
    }

    /// Time index at which the current window starts.
    #[must_use]
    pub fn start_time(&self) -> usize {
        self.start_time
    }

    /// Steps in the current window.
    #[must_use]
    pub fn gap_size(&self) -> usize {
        self.gap_size
    }

    /// Time index of the last observation, if any.
    #[must_use]
    pub fn time(&self) -> Option<usize> {
        self.t.checked_sub(1)
    }

    /// Hazard function.
    pub fn hazard(&self) -> &H {
        &self.hazard
    }

    /// Observation likelihood.
    pub fn likelihood(&self) -> &L {
        &self.likelihood
    }

    pub(crate) fn likelihood_mut(&mut self) -> &mut L {
        &mut self.likelihood
    }
}
