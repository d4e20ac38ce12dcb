//! Growable run-length probability buffer.

use rv::misc::argmax;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Posterior over run lengths `0..len`.
///
/// The backing buffer only ever grows, by doubling, and every slot past the
/// logical length is zero until it is written.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunLengthDistribution {
    probs: Vec<f64>,
    len: usize,
}

impl Default for RunLengthDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLengthDistribution {
    /// A distribution certain of run length zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probs: vec![1.0],
            len: 1,
        }
    }

    /// Number of live run lengths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; at least run length zero is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.probs.len()
    }

    /// Probabilities of the live run lengths.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs[..self.len]
    }

    /// Put all mass on run length zero and keep `len` live slots.
    pub fn reset(&mut self, len: usize) {
        let len = len.max(1);
        self.reserve(len);
        self.probs.iter_mut().for_each(|p| *p = 0.0);
        self.probs[0] = 1.0;
        self.len = len;
    }

    /// Make room for at least `slots` entries, doubling the buffer.
    pub(crate) fn reserve(&mut self, slots: usize) {
        if self.probs.len() < slots {
            let capacity = slots.max(2 * self.probs.len());
            self.probs.resize(capacity, 0.0);
        }
    }

    /// Mutable view of the first `slots` entries, growing the buffer if needed.
    pub(crate) fn slots_mut(&mut self, slots: usize) -> &mut [f64] {
        self.reserve(slots);
        &mut self.probs[..slots]
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.probs.len());
        self.len = len;
    }

    /// Most probable run length among the first `limit` live slots, ties going
    /// to the shortest run.
    pub(crate) fn argmax_within(&self, limit: usize) -> Option<(usize, f64)> {
        let probs = &self.probs[..limit.min(self.len)];
        argmax(probs).first().map(|&i| (i, probs[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_certain_at_zero() {
        let r = RunLengthDistribution::new();
        assert_eq!(r.as_slice(), &[1.0]);
        assert_eq!(r.argmax_within(1), Some((0, 1.0)));
        assert_eq!(r.argmax_within(0), None);
    }

    #[test]
    fn buffer_doubles_and_zero_fills() {
        let mut r = RunLengthDistribution::new();
        r.reserve(2);
        assert_eq!(r.capacity(), 2);
        r.reserve(3);
        assert_eq!(r.capacity(), 4);
        r.reserve(9);
        assert_eq!(r.capacity(), 9);
        assert_eq!(r.len(), 1);
        assert!(r.probs[1..].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn reset_is_degenerate() {
        let mut r = RunLengthDistribution::new();
        r.slots_mut(4).copy_from_slice(&[0.1, 0.2, 0.3, 0.4]);
        r.set_len(4);
        r.reset(3);
        assert_eq!(r.as_slice(), &[1.0, 0.0, 0.0]);
        assert!(r.probs.iter().skip(1).all(|&p| p == 0.0));
    }

    #[test]
    fn ties_break_toward_shorter_runs() {
        let mut r = RunLengthDistribution::new();
        r.slots_mut(4).copy_from_slice(&[0.1, 0.4, 0.4, 0.1]);
        r.set_len(4);
        assert_eq!(r.argmax_within(4), Some((1, 0.4)));
        assert_eq!(r.argmax_within(2), Some((1, 0.4)));
        assert_eq!(r.argmax_within(1), Some((0, 0.1)));
    }
}
