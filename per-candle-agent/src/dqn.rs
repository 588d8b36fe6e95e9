//! DQN agent with prioritized experience replay.
mod base;
mod config;
mod model;
pub use base::Dqn;
pub use config::DqnConfig;
pub use model::{DqnModel, DqnModelConfig};
