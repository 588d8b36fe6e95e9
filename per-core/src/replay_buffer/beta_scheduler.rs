//! Scheduling the exponent of importance weight for PER.
use serde::{Deserialize, Serialize};

/// Scheduler of the exponent of importance weight for PER.
///
/// $\beta$ grows linearly from `beta_start` to 1 over `beta_frames` steps and
/// stays at 1 afterwards. The scheduler has no internal state; the caller
/// passes the step.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BetaScheduler {
    /// Initial value of $\beta$.
    pub beta_start: f32,

    /// Steps when $\beta$ reaches 1.
    pub beta_frames: usize,
}

impl Default for BetaScheduler {
    fn default() -> Self {
        Self {
            beta_start: 0.4,
            beta_frames: 1000,
        }
    }
}

impl BetaScheduler {
    /// Creates a scheduler.
    pub fn new(beta_start: f32, beta_frames: usize) -> Self {
        Self {
            beta_start,
            beta_frames,
        }
    }

    /// Gets the exponent of importance sampling weights at `step`.
    pub fn beta(&self, step: usize) -> f32 {
        if self.beta_frames == 0 {
            return 1.0;
        }
        let beta_start = self.beta_start as f64;
        let beta = beta_start + step as f64 * (1.0 - beta_start) / self.beta_frames as f64;
        beta.min(1.0) as f32
    }
}
