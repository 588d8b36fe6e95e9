//! Replay buffer interface.
//!
//! Pushing experiences and generating batches are split into two traits,
//! [`ExperienceBufferBase`] and [`ReplayBufferBase`].
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if no experience has been pushed yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Samples a batch of `size` experiences.
    ///
    /// `beta` is the exponent of importance sampling weights.
    fn batch(&mut self, size: usize, beta: f32) -> Result<Self::Batch>;

    /// Overwrites the priorities of the experiences at `ixs`.
    ///
    /// `priorities` holds exactly one value per index, in the order of `ixs`.
    fn update_priority(&mut self, ixs: &[usize], priorities: &[f32]) -> Result<()>;
}
