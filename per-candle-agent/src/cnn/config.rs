use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Height of the input.
    pub height: usize,

    /// Width of the input.
    pub width: usize,

    /// Number of actions.
    pub out_dim: i64,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            in_channels: 3,
            height: 40,
            width: 90,
            out_dim: 0,
        }
    }
}

impl CnnConfig {
    /// Constructs [`CnnConfig`] for inputs of shape `[in_channels, height, width]`.
    pub fn new(in_channels: usize, height: usize, width: usize, out_dim: i64) -> Self {
        Self {
            in_channels,
            height,
            width,
            out_dim,
        }
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}
