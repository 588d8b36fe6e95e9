#![warn(missing_docs)]
//! Core of a DQN trainer with prioritized experience replay.
//!
//! The crate does not depend on any tensor backend. It provides
//!
//! * the [`replay_buffer`] module with the prioritized replay buffer, its
//!   priority store and the beta scheduler,
//! * the interfaces an environment, a frame preprocessor and an agent
//!   implement ([`Env`], [`FramePreprocessor`], [`Agent`]),
//! * the [`Trainer`] running episodes and the [`Evaluator`] scoring a policy.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Agent, DifferenceStepProcessor, Env, ExperienceBufferBase, FramePreprocessor, Info, Policy,
    ReplayBufferBase, Step, StepProcessor,
};

mod explorer;
pub use explorer::EpsilonGreedy;

mod evaluator;
pub use evaluator::Evaluator;

mod trainer;
pub use trainer::{Trainer, TrainerConfig, TrainerState};

#[cfg(test)]
mod dummy;
