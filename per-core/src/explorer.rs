//! Exploration strategy.
use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with exponentially decaying epsilon.
///
/// At step `t`, a uniformly random action is taken with probability
/// `eps_end + (eps_start - eps_end) * exp(-t / eps_decay)`, and the greedy
/// action otherwise.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at step 0.
    pub eps_start: f64,

    /// Asymptotic value of epsilon.
    pub eps_end: f64,

    /// Time constant of the decay, in steps.
    pub eps_decay: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 0.9,
            eps_end: 0.05,
            eps_decay: 200.0,
        }
    }
}

impl EpsilonGreedy {
    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the asymptotic epsilon value.
    pub fn eps_end(mut self, v: f64) -> Self {
        self.eps_end = v;
        self
    }

    /// Set the time constant of the decay.
    pub fn eps_decay(mut self, v: f64) -> Self {
        self.eps_decay = v;
        self
    }

    /// Epsilon at `step`.
    pub fn epsilon(&self, step: usize) -> f64 {
        if self.eps_decay <= 0.0 {
            return self.eps_end;
        }
        self.eps_end + (self.eps_start - self.eps_end) * (-(step as f64) / self.eps_decay).exp()
    }

    /// Takes an action at `step`.
    ///
    /// `greedy` is called only when the greedy branch is taken, so the
    /// caller can defer the forward pass of its network.
    pub fn select<R, F>(&self, step: usize, n_actions: usize, rng: &mut R, greedy: F) -> Result<usize>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> Result<usize>,
    {
        self.select_with_eps(self.epsilon(step), n_actions, rng, greedy)
    }

    /// Like [`EpsilonGreedy::select`] with a given epsilon.
    pub fn select_with_eps<R, F>(&self, eps: f64, n_actions: usize, rng: &mut R, greedy: F) -> Result<usize>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> Result<usize>,
    {
        ensure!(n_actions > 0, "No action to select from");
        if rng.gen::<f64>() < eps {
            Ok(rng.gen_range(0..n_actions))
        } else {
            greedy()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_epsilon_decays_to_end() {
        let explorer = EpsilonGreedy::default();
        assert!((explorer.epsilon(0) - 0.9).abs() < 1e-12);

        let e200 = 0.05 + 0.85 * (-1f64).exp();
        assert!((explorer.epsilon(200) - e200).abs() < 1e-12);

        let mut prev = explorer.epsilon(0);
        for t in (1..5000).step_by(50) {
            let eps = explorer.epsilon(t);
            assert!(eps <= prev);
            assert!(eps >= 0.05);
            prev = eps;
        }
        assert!((explorer.epsilon(100_000) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_is_lazy() -> Result<()> {
        let explorer = EpsilonGreedy::default().eps_start(1.0).eps_end(1.0);
        let mut rng = StdRng::seed_from_u64(0);
        for t in 0..100 {
            let a = explorer.select(t, 3, &mut rng, || panic!("greedy branch taken"))?;
            assert!(a < 3);
        }

        let explorer = EpsilonGreedy::default().eps_start(0.0).eps_end(0.0);
        for t in 0..100 {
            assert_eq!(explorer.select(t, 3, &mut rng, || Ok(2))?, 2);
        }
        Ok(())
    }

    #[test]
    fn test_random_actions_cover_action_space() -> Result<()> {
        let explorer = EpsilonGreedy::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            counts[explorer.select_with_eps(1.0, 4, &mut rng, || Ok(0))?] += 1;
        }
        assert!(counts.iter().all(|&c| c > 800));
        Ok(())
    }

    #[test]
    fn test_no_actions() {
        let explorer = EpsilonGreedy::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(explorer.select(0, 0, &mut rng, || Ok(0)).is_err());
    }
}
