//! Configuration of DQN agent.
use super::DqnModelConfig;
use crate::{util::OutDim, Device};
use anyhow::Result;
use per_core::EpsilonGreedy;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C>
where
    C: OutDim,
{
    /// Configuration of the action-value function and its optimizer.
    pub model_config: DqnModelConfig<C>,

    /// Number of transitions in a batch.
    pub batch_size: usize,

    /// Discount factor of rewards.
    pub discount_factor: f64,

    /// Added to the squared TD error of a transition to get its new priority.
    pub priority_eps: f32,

    /// Optimization steps are skipped until the buffer holds this number of
    /// transitions, and at least `batch_size`.
    pub min_transitions_warmup: usize,

    /// Exploration in training mode.
    pub explorer: EpsilonGreedy,

    /// Device of the networks.
    pub device: Option<Device>,

    /// Seed of the random number generator for exploration.
    pub seed: u64,

    /// Starts in training mode if `true`.
    pub train: bool,
}

impl<C> Default for DqnConfig<C>
where
    C: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 32,
            discount_factor: 0.8,
            priority_eps: 1e-5,
            min_transitions_warmup: 0,
            explorer: EpsilonGreedy::default(),
            device: None,
            seed: 42,
            train: false,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<C>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the offset added to new priorities.
    pub fn priority_eps(mut self, v: f32) -> Self {
        self.priority_eps = v;
        self
    }

    /// Sets the number of warmup transitions.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Sets the seed of exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the output dimension of the action-value function.
    pub fn out_dim(mut self, v: i64) -> Self {
        self.model_config = self.model_config.out_dim(v);
        self
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
