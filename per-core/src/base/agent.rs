//! Agent.
use super::{ExperienceBufferBase, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on states of type `S`.
pub trait Agent<S, R>: Policy<S>
where
    R: ReplayBufferBase + ExperienceBufferBase,
{
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters, `beta` is the exponent of the importance
    /// sampling weights. Returns `Ok(None)` when the step was skipped, for
    /// example while the buffer holds fewer transitions than a batch.
    fn opt(&mut self, buffer: &mut R, beta: f32) -> Result<Option<Record>>;

    /// Copies the parameters of the trained network into the target network.
    fn sync_target(&mut self) -> Result<()>;

    /// Save the parameters of the agent in the given directory.
    /// This method commonly creates a number of files consisting the agent
    /// in the directory. The DQN agent in `per_candle_agent` crate saves
    /// two Q-networks corresponding to the original and target networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
