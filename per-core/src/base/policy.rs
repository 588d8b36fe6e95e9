//! Policy.
use anyhow::Result;

/// A policy on states of type `S`.
///
/// Policy is a mapping from a state to the index of an action.
/// `step` is the number of actions taken so far in training. Exploration
/// schedules depend on it, so a policy does not keep its own step counter.
pub trait Policy<S> {
    /// Sample an action given a state.
    fn sample(&mut self, state: &S, step: usize) -> Result<usize>;
}
