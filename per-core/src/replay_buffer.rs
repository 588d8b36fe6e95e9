//! Prioritized experience replay.
//!
//! # Key Components
//!
//! - [`Transition`]: the unit stored in and sampled from the buffer
//! - [`PriorityStore`]: one priority per slot of the buffer
//! - [`PrioritizedReplayBuffer`]: circular buffer sampling transitions in
//!   proportion to `priority^alpha`
//! - [`PrioritizedBatch`]: a sampled batch with its slot indices and
//!   importance sampling weights
//! - [`BetaScheduler`]: anneals the exponent of importance sampling weights
//!
//! # Examples
//!
//! ```rust
//! use per_core::replay_buffer::{
//!     BetaScheduler, NextState, PrioritizedReplayBuffer, PrioritizedReplayBufferConfig,
//!     Transition,
//! };
//!
//! let config = PrioritizedReplayBufferConfig::default().capacity(100).alpha(0.6);
//! let mut buffer = PrioritizedReplayBuffer::<Vec<f32>>::new(&config).unwrap();
//!
//! for i in 0..10 {
//!     let s = vec![i as f32];
//!     let tr = Transition::new(s.clone(), 0, 1.0, NextState::Present(s), false);
//!     buffer.push(tr);
//! }
//!
//! let beta = BetaScheduler::default().beta(0);
//! let batch = buffer.sample(4, beta).unwrap();
//! let priorities = vec![0.5; batch.len()];
//! buffer.update_priorities(&batch.indices, &priorities).unwrap();
//! ```
mod base;
mod batch;
mod beta_scheduler;
mod categorical;
mod config;
mod priority_store;
mod transition;
pub use base::PrioritizedReplayBuffer;
pub use batch::{partition_next_states, PrioritizedBatch};
pub use beta_scheduler::BetaScheduler;
pub use categorical::Categorical;
pub use config::PrioritizedReplayBufferConfig;
pub use priority_store::PriorityStore;
pub use transition::{NextState, Transition};
