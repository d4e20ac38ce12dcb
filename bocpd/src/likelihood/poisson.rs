//! Poisson likelihood with a conjugate Gamma prior on the rate.

use crate::error::{BocpdError, Result};
use crate::traits::ObservationLikelihood;
use rand::{rngs::SmallRng, SeedableRng};
use rv::prelude::*;
use std::collections::VecDeque;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

type PoissonStat = <Poisson as HasSuffStat<u32>>::Stat;

/// Poisson counts with a `Gamma(shape, rate)` prior on the rate.
///
/// Every hypothesis keeps the sufficient statistic of the observations in its
/// run; the posterior predictive is negative binomial.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct PoissonGamma {
    prior: Gamma,
    /// Sufficient statistics, indexed by run length.
    suff_stats: VecDeque<PoissonStat>,
    /// Reference empty suff_stat.
    empty_suffstat: PoissonStat,
}

impl PoissonGamma {
    /// Create the model from the Gamma prior's shape and rate.
    ///
    /// # Errors
    /// Both parameters must be positive and finite.
    ///
    /// # Example
    /// ```rust
    /// use bocpd::{ObservationLikelihood, PoissonGamma};
    ///
    /// let mut lik = PoissonGamma::new(1.0, 1.0).unwrap();
    /// lik.update_posterior(3.0).unwrap();
    /// assert_eq!(lik.hypotheses(), 1);
    /// ```
    pub fn new(shape: f64, rate: f64) -> Result<Self> {
        let prior = Gamma::new(shape, rate).map_err(|err| {
            BocpdError::Configuration(format!(
                "invalid Gamma({shape}, {rate}) prior: {err:?}"
            ))
        })?;
        Ok(Self::with_prior(prior))
    }

    /// Create the model from an existing Gamma prior.
    #[must_use]
    pub fn with_prior(prior: Gamma) -> Self {
        let mut rng = SmallRng::seed_from_u64(0xABCD);
        let fx: Poisson = prior.draw(&mut rng);
        let empty_suffstat = <Poisson as HasSuffStat<u32>>::empty_suffstat(&fx);

        Self {
            prior,
            suff_stats: VecDeque::new(),
            empty_suffstat,
        }
    }

    /// Prior over the Poisson rate.
    #[must_use]
    pub fn prior(&self) -> &Gamma {
        &self.prior
    }
}

/// Interpret an observation as an event count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(observation: f64) -> Result<u32> {
    if observation >= 0.0
        && observation <= f64::from(u32::MAX)
        && observation.fract() == 0.0
    {
        Ok(observation as u32)
    } else {
        Err(BocpdError::UnsupportedObservation(observation))
    }
}

impl ObservationLikelihood for PoissonGamma {
    fn hypotheses(&self) -> usize {
        self.suff_stats.len()
    }

    fn predictive(&self, observation: f64) -> Result<Vec<f64>> {
        let count = as_count(observation)?;
        Ok(self
            .suff_stats
            .iter()
            .map(|stat| {
                ConjugatePrior::<u32, Poisson>::ln_pp(
                    &self.prior,
                    &count,
                    &DataOrSuffStat::SuffStat(stat),
                )
                .exp()
            })
            .collect())
    }

    fn update_posterior(&mut self, observation: f64) -> Result<()> {
        let count = as_count(observation)?;
        self.suff_stats
            .iter_mut()
            .for_each(|stat| stat.observe(&count));
        self.suff_stats.push_front(self.empty_suffstat.clone());
        Ok(())
    }

    fn prune(&mut self, gap_size: usize) {
        self.suff_stats.truncate(gap_size + 1);
    }

    fn engage(&mut self, observation: f64) -> Result<()> {
        as_count(observation)?;
        self.suff_stats.clear();
        self.suff_stats.push_front(self.empty_suffstat.clone());
        Ok(())
    }
}
