//! DQN agent with prioritized experience replay, implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! * [`cnn::Cnn`] is the action-value network on screen differences.
//! * [`dqn::Dqn`] implements [`per_core::Agent`]; its optimization step samples
//!   a prioritized batch, weights the TD errors with importance sampling
//!   weights and writes new priorities back to the buffer.
//! * [`preprocess::ScreenPreprocessor`] turns rendered RGB frames into tensors.
pub mod cnn;
pub mod dqn;
pub mod model;
pub mod opt;
pub mod preprocess;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Creates the candle device.
    ///
    /// Fails for [`Device::Cuda`] if candle was built without CUDA support.
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
