//! Environment.
use super::{Info, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP with a finite set of actions.
///
/// Besides the usual `reset`/`step` pair, the environment renders its scene
/// as a frame. Agents in this crate learn from rendered frames rather than
/// from the observations returned by [`Env::step`].
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs;

    /// Raw frame returned by [`Env::render`].
    type Frame;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performes an environment step with the action of the given index.
    fn step(&mut self, act: usize) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Renders the current scene.
    fn render(&mut self) -> Result<Self::Frame>;

    /// The number of discrete actions.
    fn n_actions(&self) -> usize;
}
