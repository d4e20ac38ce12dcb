use crate::error::Result;

/// Prior probability of a change point given the current run length.
///
/// Implementations must be pure: the same run length always maps to the same
/// probability in `[0, 1]`. Any `Fn(usize) -> f64` closure is a hazard
/// function, so partially applied helpers such as
/// [`constant_hazard`](crate::constant_hazard) can be passed directly.
pub trait HazardFunction {
    /// Hazard for a single run length.
    fn hazard(&self, run_length: usize) -> f64;

    /// Hazard for each of the given run lengths, in order.
    fn hazards(&self, run_lengths: &[usize]) -> Vec<f64> {
        run_lengths.iter().map(|&r| self.hazard(r)).collect()
    }
}

impl<F> HazardFunction for F
where
    F: Fn(usize) -> f64,
{
    fn hazard(&self, run_length: usize) -> f64 {
        self(run_length)
    }
}

/// Predictive model whose per-run-length hypotheses are updated sequentially.
///
/// Hypothesis `r` is aligned with entry `r` of the run-length distribution:
/// before a step the filter expects [`predictive`](Self::predictive) to
/// return exactly one density per live run length.
pub trait ObservationLikelihood {
    /// Number of run-length hypotheses currently tracked.
    fn hypotheses(&self) -> usize;

    /// Density of `observation` under every tracked hypothesis.
    ///
    /// # Errors
    /// Fails if a hypothesis cannot produce a finite density or the
    /// observation is outside the model's support.
    fn predictive(&self, observation: f64) -> Result<Vec<f64>>;

    /// Absorb `observation` into every hypothesis and start a new one for run
    /// length zero. The likelihood is left untouched on error.
    ///
    /// # Errors
    /// Fails if the updated parameters would be degenerate.
    fn update_posterior(&mut self, observation: f64) -> Result<()>;

    /// Drop everything older than the trailing `gap_size` steps.
    fn prune(&mut self, gap_size: usize);

    /// Feed the last warm-up observation and restart from a single
    /// hypothesis built from it, dropping any hypotheses left by a prune.
    /// The likelihood is left untouched on error.
    ///
    /// # Errors
    /// Fails if the warm-up window cannot form a hypothesis.
    fn engage(&mut self, observation: f64) -> Result<()>;

    /// Feed a warm-up observation that does not yet produce a hypothesis.
    ///
    /// Models without a warm-up phase ignore it.
    ///
    /// # Errors
    /// Fails if the observation is outside the model's support.
    fn accumulate(&mut self, observation: f64) -> Result<()> {
        let _ = observation;
        Ok(())
    }
}
