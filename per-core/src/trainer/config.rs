//! Configuration of [`Trainer`](super::Trainer).
use crate::replay_buffer::BetaScheduler;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub num_episodes: usize,

    /// Interval of copying the trained network into the target network, in episodes.
    pub target_update_interval: usize,

    /// Interval of reporting the mean episode reward, in episodes.
    pub report_interval: usize,

    /// Episodes are truncated after this number of steps.
    pub max_steps_per_episode: Option<usize>,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Schedule of the exponent of importance sampling weights.
    pub beta_scheduler: BetaScheduler,

    /// Seed of the training environment.
    pub env_seed: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_episodes: 400,
            target_update_interval: 50,
            report_interval: 20,
            max_steps_per_episode: None,
            model_dir: None,
            beta_scheduler: BetaScheduler::default(),
            env_seed: 0,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn num_episodes(mut self, v: usize) -> Self {
        self.num_episodes = v;
        self
    }

    /// Sets the interval of target network updates in episodes.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the interval of reports in episodes.
    pub fn report_interval(mut self, v: usize) -> Self {
        self.report_interval = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = Some(v);
        self
    }

    /// Sets the directory the trained model is saved in.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the beta scheduler.
    pub fn beta_scheduler(mut self, v: BetaScheduler) -> Self {
        self.beta_scheduler = v;
        self
    }

    /// Sets the seed of the training environment.
    pub fn env_seed(mut self, v: i64) -> Self {
        self.env_seed = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .num_episodes(10)
            .target_update_interval(5)
            .max_steps_per_episode(200)
            .beta_scheduler(BetaScheduler::new(0.5, 2000))
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
