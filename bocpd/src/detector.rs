//! Threshold-based change point detection on top of [`Bocpd`].

use crate::bocpd::Bocpd;
use crate::error::{BocpdError, Result};
use crate::hazard::{check_hazard, ConstantHazard};
use crate::likelihood::GaussianWithEstimation;
use crate::traits::{HazardFunction, ObservationLikelihood};
use tracing::debug;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Settings for a [`ChangepointDetector`] with a constant hazard and the
/// estimated Gaussian likelihood.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Constant hazard timescale λ.
    pub hazard_lambda: f64,
    /// Warm-up samples collected before the filter engages, and after each
    /// change point.
    pub accumulation_cap: usize,
    /// Probability a non-maximal run length must exceed to be declared.
    pub threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hazard_lambda: 250.0,
            accumulation_cap: 15,
            threshold: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Check every parameter.
    ///
    /// # Errors
    /// [`BocpdError::Configuration`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        ConstantHazard::new(self.hazard_lambda)?;
        validate_threshold(self.threshold)
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(BocpdError::Configuration(format!(
            "threshold must lie in (0, 1), got {threshold}"
        )))
    }
}

/// Where the detector is in its warm-up cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Observations feed the likelihood's warm-up window.
    Accumulating {
        /// Warm-up observations still needed.
        remaining: usize,
    },
    /// Observations run through the run-length filter.
    Active,
}

/// Online change point detector.
///
/// After `accumulation_cap` warm-up observations the detector runs every
/// datum through a [`Bocpd`] filter. Whenever the most likely run length
/// other than the longest one is also the overall mode and its probability
/// exceeds `threshold`, a change point is declared, the filter is pruned to
/// the new regime and the warm-up restarts for whatever part of the cap the
/// new regime has not already covered.
///
/// Run length zero is never declared. It would place the change point at the
/// start of the current window, which is either the previous change point or
/// the engagement step.
///
/// A step that returns an error leaves the detector as it was, so the caller
/// may skip the offending datum and carry on.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ChangepointDetector<H, L> {
    bocpd: Bocpd<H, L>,
    accumulation_cap: usize,
    threshold: f64,
    /// Warm-up observations left before the filter engages.
    remaining: usize,
    /// Time index of the next observation.
    t: usize,
    changepoints: Vec<usize>,
    run_lengths: Vec<Option<usize>>,
}

impl<H> ChangepointDetector<H, GaussianWithEstimation>
where
    H: HazardFunction,
{
    /// Create a detector over the estimated Gaussian likelihood.
    ///
    /// The estimator needs two samples for a variance, so `accumulation_cap`
    /// should be at least 2. With a cap of 0 or 1 the step that engages the
    /// filter fails with [`BocpdError::NumericalDegeneracy`].
    ///
    /// # Errors
    /// `threshold` must lie in `(0, 1)` and the hazard at run length zero must
    /// be a probability.
    ///
    /// # Example
    /// ```rust
    /// use bocpd::{ChangepointDetector, ConstantHazard};
    ///
    /// let mut cpd = ChangepointDetector::new(
    ///     ConstantHazard::new(100.0).unwrap(),
    ///     5,
    ///     0.5,
    /// ).unwrap();
    ///
    /// for x in [0.2, -0.4, 0.1, 0.7, -0.3, 0.5] {
    ///     cpd.update(x).unwrap();
    /// }
    /// assert_eq!(cpd.run_lengths(), &[None, None, None, None, None, Some(1)]);
    /// ```
    pub fn new(
        hazard: H,
        accumulation_cap: usize,
        threshold: f64,
    ) -> Result<Self> {
        Self::with_likelihood(
            hazard,
            GaussianWithEstimation::new(),
            accumulation_cap,
            threshold,
        )
    }
}

impl ChangepointDetector<ConstantHazard, GaussianWithEstimation> {
    /// Create a detector from validated settings.
    ///
    /// # Errors
    /// See [`DetectorConfig::validate`].
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            ConstantHazard::new(config.hazard_lambda)?,
            config.accumulation_cap,
            config.threshold,
        )
    }
}

impl<H, L> ChangepointDetector<H, L>
where
    H: HazardFunction,
    L: ObservationLikelihood,
{
    /// Create a detector over any likelihood.
    ///
    /// With `accumulation_cap == 0` the first datum opens the filter's window
    /// directly, which requires a likelihood that can form a hypothesis from a
    /// single observation.
    ///
    /// # Errors
    /// `threshold` must lie in `(0, 1)` and the hazard at run length zero must
    /// be a probability.
    pub fn with_likelihood(
        hazard: H,
        likelihood: L,
        accumulation_cap: usize,
        threshold: f64,
    ) -> Result<Self> {
        validate_threshold(threshold)?;
        check_hazard(hazard.hazard(0))?;
        Ok(Self {
            bocpd: Bocpd::new(hazard, likelihood),
            accumulation_cap,
            threshold,
            remaining: accumulation_cap,
            t: 0,
            changepoints: Vec::new(),
            run_lengths: Vec::new(),
        })
    }

    /// Process the next datum, returning the change point declared at this
    /// step, if any.
    ///
    /// # Errors
    /// Any error from the filter or the likelihood; see [`Bocpd::update`].
    pub fn update(&mut self, observation: f64) -> Result<Option<usize>> {
        let time = self.t;

        if self.remaining > 0 {
            let likelihood = self.bocpd.likelihood_mut();
            if self.remaining == 1 {
                likelihood.engage(observation)?;
                self.bocpd.set_times(time);
                debug!(time, "run-length filter engaged");
            } else {
                likelihood.accumulate(observation)?;
            }
            self.remaining -= 1;
            self.run_lengths.push(None);
            self.t += 1;
            return Ok(None);
        }

        self.bocpd.update(observation)?;
        self.t += 1;

        let (run_length, probability) = self.bocpd.most_likely_run_length();
        self.run_lengths.push(Some(run_length));

        let Some((non_max_run_length, non_max_probability)) =
            self.bocpd.most_likely_non_max_run_length()
        else {
            return Ok(None);
        };

        if non_max_run_length > 0
            && non_max_probability > self.threshold
            && non_max_probability >= probability
        {
            let changepoint = self.bocpd.start_time() + non_max_run_length;
            self.remaining =
                self.accumulation_cap.saturating_sub(non_max_run_length);
            self.bocpd.prune(changepoint)?;
            self.changepoints.push(changepoint);
            debug!(
                changepoint,
                run_length = non_max_run_length,
                probability = non_max_probability,
                remaining = self.remaining,
                "change point declared"
            );
            return Ok(Some(changepoint));
        }

        Ok(None)
    }
}

impl<H, L> ChangepointDetector<H, L> {
    /// Declared change points, strictly increasing.
    #[must_use]
    pub fn changepoints(&self) -> &[usize] {
        &self.changepoints
    }

    /// Most likely run length at every step; `None` while accumulating.
    #[must_use]
    pub fn run_lengths(&self) -> &[Option<usize>] {
        &self.run_lengths
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.remaining {
            0 => Phase::Active,
            remaining => Phase::Accumulating { remaining },
        }
    }

    /// Underlying run-length filter.
    #[must_use]
    pub fn bocpd(&self) -> &Bocpd<H, L> {
        &self.bocpd
    }

    /// Warm-up length.
    #[must_use]
    pub fn accumulation_cap(&self) -> usize {
        self.accumulation_cap
    }

    /// Decision threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Time index of the last observation, if any.
    #[must_use]
    pub fn time(&self) -> Option<usize> {
        self.t.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constant_hazard, generators, GaussianKnownVariance};
    use proptest::prelude::*;
    use rand::{rngs::SmallRng, SeedableRng};

    /// N(0, 1) draws, a +10 outlier at time index 10, then N(0, 1) again.
    const OUTLIER_SERIES: [f64; 21] = [
        -0.26, 0.51, -0.23, -0.32, -0.93, -0.21, 1.11, 0.42, 1.04, 0.25, 10.0,
        0.39, 0.19, -1.67, 0.86, 0.51, 0.5, -1.69, -1.74, -0.89, -0.47,
    ];

    fn conjugate_detector(
        lambda: f64,
        accumulation_cap: usize,
    ) -> ChangepointDetector<ConstantHazard, GaussianKnownVariance> {
        ChangepointDetector::with_likelihood(
            ConstantHazard::new(lambda).unwrap(),
            GaussianKnownVariance::new(0.0, 4.0, 1.0).unwrap(),
            accumulation_cap,
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn rejects_thresholds_outside_unit_interval() {
        for threshold in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                ChangepointDetector::new(constant_hazard(10.0), 5, threshold),
                Err(BocpdError::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_hazards_that_are_not_probabilities() {
        for lambda in [0.5, -3.0] {
            assert!(matches!(
                ChangepointDetector::with_likelihood(
                    constant_hazard(lambda),
                    GaussianKnownVariance::new(0.0, 1.0, 1.0).unwrap(),
                    0,
                    0.5,
                ),
                Err(BocpdError::Configuration(_))
            ));
        }
    }

    #[test]
    fn failed_engagement_keeps_the_warm_up_window() {
        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 2, 0.5).unwrap();
        cpd.update(3.0).unwrap();

        // A repeated sample has zero variance
        assert!(matches!(
            cpd.update(3.0),
            Err(BocpdError::NumericalDegeneracy(_))
        ));
        assert_eq!(cpd.bocpd().likelihood().samples(), &[3.0]);
        assert_eq!(cpd.time(), Some(0));
        assert_eq!(cpd.run_lengths(), &[None]);
        assert_eq!(cpd.phase(), Phase::Accumulating { remaining: 1 });

        assert_eq!(cpd.update(4.0).unwrap(), None);
        assert_eq!(cpd.bocpd().likelihood().samples(), &[3.0, 4.0, 4.0]);
        assert_eq!(cpd.time(), Some(1));
        assert_eq!(cpd.phase(), Phase::Active);

        cpd.update(3.5).unwrap();
        assert_eq!(cpd.run_lengths(), &[None, None, Some(1)]);
    }

    #[test]
    fn config_validation() {
        assert!(DetectorConfig::default().validate().is_ok());

        let config = DetectorConfig {
            hazard_lambda: 0.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            ChangepointDetector::from_config(&config),
            Err(BocpdError::Configuration(_))
        ));

        let config = DetectorConfig {
            threshold: 1.0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let cpd =
            ChangepointDetector::from_config(&DetectorConfig::default())
                .unwrap();
        assert_eq!(cpd.accumulation_cap(), 15);
        assert_eq!(cpd.phase(), Phase::Accumulating { remaining: 15 });
        assert::close(cpd.bocpd().hazard().lambda(), 250.0, 1E-12);
    }

    #[test]
    fn no_warm_up_with_negligible_hazard() {
        let mut cpd = conjugate_detector(1E6, 0);
        assert_eq!(cpd.phase(), Phase::Active);
        for x in [0.3, -1.1, 0.8, -0.4, 1.2] {
            assert_eq!(cpd.update(x).unwrap(), None);
        }
        assert_eq!(
            cpd.run_lengths(),
            &[Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
        assert!(cpd.changepoints().is_empty());
    }

    #[test]
    fn outlier_after_warm_up_is_a_change_point() {
        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 5, 0.5).unwrap();

        let declared: Vec<Option<usize>> = OUTLIER_SERIES
            .iter()
            .map(|&x| cpd.update(x).unwrap())
            .collect();

        assert_eq!(&cpd.run_lengths()[..5], &[None; 5]);
        assert!(cpd.run_lengths()[5..].iter().all(Option::is_some));
        assert_eq!(declared[10], Some(10));
        assert_eq!(cpd.changepoints(), &[10]);
        assert_eq!(cpd.run_lengths().len(), OUTLIER_SERIES.len());
    }

    #[test]
    fn detection_is_robust_to_hazard_and_threshold() {
        for lambda in [10.0, 50.0, 250.0] {
            for threshold in [0.3, 0.7] {
                let mut cpd = ChangepointDetector::new(
                    ConstantHazard::new(lambda).unwrap(),
                    5,
                    threshold,
                )
                .unwrap();
                for &x in &OUTLIER_SERIES {
                    cpd.update(x).unwrap();
                }
                assert_eq!(cpd.changepoints(), &[10]);
            }
        }
    }

    #[test]
    fn stays_active_when_new_regime_covers_the_cap() {
        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 5, 0.5).unwrap();
        for &x in &OUTLIER_SERIES[..11] {
            cpd.update(x).unwrap();
        }
        assert_eq!(cpd.phase(), Phase::Active);
        assert_eq!(cpd.bocpd().likelihood().samples(), &[10.0]);

        // The next datum reopens the window from the retained tail
        cpd.update(OUTLIER_SERIES[11]).unwrap();
        assert_eq!(cpd.run_lengths().last(), Some(&Some(0)));
        assert_eq!(cpd.bocpd().start_time(), 12);
    }

    #[test]
    fn warm_up_restarts_after_short_run_change_point() {
        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 8, 0.5).unwrap();
        let mut declared = None;
        for &x in &OUTLIER_SERIES {
            if let Some(cp) = cpd.update(x).unwrap() {
                declared = Some(cp);
                break;
            }
        }
        // With a longer warm-up the outlier lands two steps into the window
        assert_eq!(declared, Some(10));
        assert_eq!(cpd.phase(), Phase::Accumulating { remaining: 6 });

        cpd.update(0.3).unwrap();
        assert_eq!(cpd.run_lengths().last(), Some(&None));
    }

    #[test]
    fn single_sample_warm_up_is_degenerate() {
        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 0, 0.5).unwrap();
        assert!(matches!(
            cpd.update(1.0),
            Err(BocpdError::NumericalDegeneracy(_))
        ));

        let mut cpd =
            ChangepointDetector::new(constant_hazard(100.0), 1, 0.5).unwrap();
        assert!(matches!(
            cpd.update(1.0),
            Err(BocpdError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn long_series_invariants() {
        let mut rng = SmallRng::seed_from_u64(0xABCD);
        let data = generators::level_shifts(
            &mut rng,
            &[(250, 0.0), (250, 10.0), (250, -10.0), (250, 0.0)],
        )
        .unwrap();

        let mut cpd =
            ChangepointDetector::new(constant_hazard(250.0), 15, 0.5).unwrap();
        for (i, &x) in data.iter().enumerate() {
            cpd.update(x).unwrap();
            assert_eq!(cpd.run_lengths().len(), i + 1);
            assert_eq!(cpd.time(), Some(i));
            let sum: f64 = cpd.bocpd().run_length_probs().iter().sum();
            assert::close(sum, 1.0, 1E-9);
        }
        assert!(cpd.changepoints().windows(2).all(|w| w[0] < w[1]));
        assert!(cpd.changepoints().iter().all(|&cp| cp < data.len()));
    }

    proptest! {
        #[test]
        fn trace_and_change_points_stay_consistent(
            xs in prop::collection::vec(-5.0_f64..5.0, 1..120),
            lambda in 2.0_f64..300.0,
            cap in 0_usize..10,
        ) {
            let mut cpd = conjugate_detector(lambda, cap);
            for (i, &x) in xs.iter().enumerate() {
                let declared = cpd.update(x).unwrap();
                prop_assert_eq!(cpd.run_lengths().len(), i + 1);
                if let Some(cp) = declared {
                    prop_assert!(cp <= i);
                    prop_assert_eq!(cpd.changepoints().last(), Some(&cp));
                }
            }
            prop_assert!(cpd.changepoints().windows(2).all(|w| w[0] < w[1]));
        }
    }

    proptest! {
        #[test]
        fn estimated_gaussian_steps_are_atomic(
            xs in prop::collection::vec(-5.0_f64..5.0, 1..120),
            lambda in 2.0_f64..300.0,
            cap in 2_usize..10,
        ) {
            let mut cpd = ChangepointDetector::new(
                ConstantHazard::new(lambda).unwrap(),
                cap,
                0.5,
            )
            .unwrap();

            let mut accepted = 0;
            for x in xs {
                let time = cpd.time();
                match cpd.update(x) {
                    Ok(declared) => {
                        accepted += 1;
                        if let Some(cp) = declared {
                            prop_assert!(cp < accepted);
                        }
                    }
                    Err(_) => prop_assert_eq!(cpd.time(), time),
                }
                prop_assert_eq!(cpd.run_lengths().len(), accepted);
            }
            prop_assert!(cpd.changepoints().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn config_round_trips_through_json() {
        let config = DetectorConfig {
            hazard_lambda: 100.0,
            accumulation_cap: 5,
            threshold: 0.25,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
