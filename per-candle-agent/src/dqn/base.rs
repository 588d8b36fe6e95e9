//! DQN agent implemented with candle.
use super::{config::DqnConfig, model::DqnModel};
use crate::{model::SubModel1, util::copy_vars, util::OutDim};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use log::trace;
use per_core::{
    error::PerError,
    record::{Record, RecordValue},
    replay_buffer::{partition_next_states, PrioritizedBatch},
    Agent, EpsilonGreedy, ExperienceBufferBase, Policy, ReplayBufferBase,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// DQN agent trained with prioritized experience replay.
///
/// States are tensors of shape `[1, channels, height, width]`; a batch of
/// states is their concatenation along the first axis.
///
/// # Optimization step
///
/// ```mermaid
/// graph TD
///     A["batch(batch_size, beta)"] --> B[partition next states]
///     B --> C["Q(s, a) of the trained network"]
///     B --> D["max Q'(s', .) of the target network, 0 if terminal"]
///     C --> E["d = (Q(s, a) - r - gamma max Q'(s', .))^2"]
///     D --> E
///     E --> F["loss = mean(w d)"]
///     E --> G["update_priority(indices, d + eps)"]
///     F --> H[backward step]
/// ```
///
/// The loss is checked for finiteness before the buffer is touched. A
/// non-finite loss fails with [`PerError::NonFiniteLoss`], leaving the
/// priorities and the parameters as they were.
pub struct Dqn<Q, R>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = PrioritizedBatch<Tensor>> + ExperienceBufferBase,
{
    pub(in crate::dqn) min_transitions_warmup: usize,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) phantom: PhantomData<R>,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) priority_eps: f32,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    rng: StdRng,
}

impl<Q, R> Dqn<Q, R>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = PrioritizedBatch<Tensor>> + ExperienceBufferBase,
{
    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the trained network.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        let device = config
            .device
            .context("No device is given for DQN agent")?
            .to_candle()?;
        let qnet = DqnModel::build(config.model_config.clone(), device.clone())?;
        let qnet_tgt = DqnModel::build(config.model_config, device.clone())?;
        copy_vars(qnet_tgt.get_varmap(), qnet.get_varmap())?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            min_transitions_warmup: config.min_transitions_warmup,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            priority_eps: config.priority_eps,
            train: config.train,
            explorer: config.explorer,
            device,
            n_opts: 0,
            phantom: PhantomData,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Action values of the trained network in inference mode.
    pub fn action_values(&self, states: &Tensor) -> Result<Tensor> {
        self.qnet.forward_t(states, false)
    }

    /// Stacks `states` along the batch axis.
    fn stack(&self, states: &[Tensor]) -> Result<Tensor> {
        Ok(Tensor::cat(states, 0)?.to_device(&self.device)?)
    }

    /// `max_a Q'(s', a)` for each row of the batch, 0 for terminal rows.
    ///
    /// The target network is only evaluated on the non-terminal next states.
    fn next_values(&self, batch: &PrioritizedBatch<Tensor>) -> Result<Tensor> {
        let n = batch.len();
        let (mask, next_states) = partition_next_states(&batch.next_states);
        let mut values = vec![0f32; n];

        if !next_states.is_empty() {
            let xs = self.stack(&next_states)?;
            let q = self
                .qnet_tgt
                .forward_t(&xs, false)?
                .max(1)?
                .to_vec1::<f32>()?;
            let mut q = q.into_iter();
            for (v, present) in values.iter_mut().zip(mask.iter()) {
                if *present {
                    *v = q.next().context("Fewer target values than next states")?;
                }
            }
        }

        Ok(Tensor::from_vec(values, (n,), &self.device)?.detach())
    }

    /// Samples a prioritized batch, updates priorities and takes a gradient step.
    ///
    /// Returns the loss and the new priorities of the sampled transitions.
    fn update_critic(&mut self, buffer: &mut R, beta: f32) -> Result<(f32, Vec<f32>)> {
        let batch = buffer.batch(self.batch_size, beta)?;
        let n = batch.len();

        let states = self.stack(&batch.states)?;
        let actions = {
            let a = batch.actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
            Tensor::from_vec(a, (n, 1), &self.device)?
        };
        let rewards = Tensor::from_slice(&batch.rewards[..], (n,), &self.device)?;
        let weights = Tensor::from_slice(&batch.weights[..], (n,), &self.device)?;

        let pred = self
            .qnet
            .forward_t(&states, true)?
            .gather(&actions, 1)?
            .squeeze(1)?;
        let tgt = (self.next_values(&batch)?.affine(self.discount_factor, 0.0)? + rewards)?;

        let td_errs = (pred - tgt)?.sqr()?;
        let loss = (&td_errs * &weights)?.mean_all()?;
        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(PerError::NonFiniteLoss(loss_value).into());
        }

        let priorities = td_errs
            .to_vec1::<f32>()?
            .into_iter()
            .map(|d| d + self.priority_eps)
            .collect::<Vec<_>>();
        trace!("New priorities of {:?}: {:?}", batch.indices, priorities);
        buffer.update_priority(&batch.indices, &priorities)?;

        self.qnet.backward_step(&loss)?;

        Ok((loss_value, priorities))
    }

    fn greedy(qnet: &DqnModel<Q>, state: &Tensor) -> Result<usize> {
        let a = qnet
            .forward_t(state, false)?
            .argmax(1)?
            .flatten_all()?
            .to_vec1::<u32>()?;
        let a = a.first().context("No action value")?;
        Ok(*a as usize)
    }
}

impl<Q, R> Policy<Tensor> for Dqn<Q, R>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = PrioritizedBatch<Tensor>> + ExperienceBufferBase,
{
    /// Epsilon-greedy action selection.
    ///
    /// In evaluation mode, epsilon is fixed to the final value of the schedule.
    fn sample(&mut self, state: &Tensor, step: usize) -> Result<usize> {
        let eps = if self.train {
            self.explorer.epsilon(step)
        } else {
            self.explorer.eps_end
        };
        let n_actions = self.qnet.out_dim as usize;
        let qnet = &self.qnet;
        self.explorer
            .select_with_eps(eps, n_actions, &mut self.rng, || Self::greedy(qnet, state))
    }
}

impl<Q, R> Agent<Tensor, R> for Dqn<Q, R>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = PrioritizedBatch<Tensor>> + ExperienceBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R, beta: f32) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size.max(self.min_transitions_warmup) {
            return Ok(None);
        }

        let (loss, priorities) = self.update_critic(buffer, beta)?;
        self.n_opts += 1;

        Ok(Some(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_opts", RecordValue::Scalar(self.n_opts as f32)),
            ("priorities", RecordValue::Array1(priorities)),
        ])))
    }

    fn sync_target(&mut self) -> Result<()> {
        copy_vars(self.qnet_tgt.get_varmap(), self.qnet.get_varmap())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cnn::{Cnn, CnnConfig},
        dqn::DqnModelConfig,
        util::get_var,
    };
    use per_core::replay_buffer::{
        NextState, PrioritizedReplayBuffer, PrioritizedReplayBufferConfig, Transition,
    };
    use tempdir::TempDir;

    type Buffer = PrioritizedReplayBuffer<Tensor>;
    type TestDqn = Dqn<Cnn, Buffer>;

    const H: usize = 40;
    const W: usize = 44;

    fn config() -> DqnConfig<CnnConfig> {
        let model_config = DqnModelConfig::default().q_config(CnnConfig::new(3, H, W, 2));
        DqnConfig::default()
            .model_config(model_config)
            .batch_size(4)
            .device(crate::Device::Cpu)
    }

    fn state(v: f32) -> Result<Tensor> {
        Ok(Tensor::full(v, (1, 3, H, W), &Device::Cpu)?)
    }

    fn buffer_with(n: usize, terminal_every: usize) -> Result<Buffer> {
        let config = PrioritizedReplayBufferConfig::default().capacity(32).alpha(0.6);
        let mut buffer = Buffer::new(&config)?;
        for i in 0..n {
            let next_state = if (i + 1) % terminal_every == 0 {
                NextState::Terminal
            } else {
                NextState::Present(state(i as f32 * 0.1 + 0.1)?)
            };
            let done = next_state.is_terminal();
            let tr = Transition::new(state(i as f32 * 0.1)?, i % 2, 1.0, next_state, done);
            buffer.push(tr);
        }
        Ok(buffer)
    }

    #[test]
    fn test_opt_updates_priorities() -> Result<()> {
        let mut agent = TestDqn::build(config())?;
        agent.train();
        let mut buffer = buffer_with(8, 3)?;

        let record = agent.opt(&mut buffer, 0.4)?.context("no optimization step")?;
        assert!(record.get_scalar("loss")?.is_finite());
        assert_eq!(agent.n_opts(), 1);

        // seeded priorities are 1, updated ones are squared errors plus eps
        let changed = (0..8)
            .filter_map(|ix| buffer.priority(ix))
            .filter(|&p| p != 1.0)
            .count();
        assert!(changed >= 1);
        assert!((0..8).all(|ix| buffer.priority(ix).unwrap() >= 1e-5));
        Ok(())
    }

    #[test]
    fn test_priorities_are_unweighted_squared_errors() -> Result<()> {
        let mut agent = TestDqn::build(config().batch_size(6))?;
        agent.train();

        // two buffers with the same seed draw the same batch
        let priorities = (1..=8).map(|p| (p * p) as f32).collect::<Vec<_>>();
        let ixs = (0..8).collect::<Vec<_>>();
        let mut buffer = buffer_with(8, 3)?;
        buffer.update_priorities(&ixs, &priorities)?;
        let mut replica = buffer_with(8, 3)?;
        replica.update_priorities(&ixs, &priorities)?;
        let batch = replica.sample(6, 0.4)?;
        assert!(batch.weights.iter().any(|&w| w < 1.0));

        // squared errors computed like the update, before the gradient step
        let n = batch.len();
        let actions = batch.actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
        let actions = Tensor::from_vec(actions, (n, 1), &Device::Cpu)?;
        let pred = agent
            .qnet
            .forward_t(&agent.stack(&batch.states)?, true)?
            .gather(&actions, 1)?
            .squeeze(1)?
            .to_vec1::<f32>()?;
        let next_values = agent.next_values(&batch)?.to_vec1::<f32>()?;
        let sq_errs = (0..n)
            .map(|i| {
                let tgt = batch.rewards[i] + agent.discount_factor as f32 * next_values[i];
                (pred[i] - tgt).powi(2)
            })
            .collect::<Vec<_>>();

        let record = agent.opt(&mut buffer, 0.4)?.context("no optimization step")?;
        let eps = agent.priority_eps;
        let close = |a: f32, b: f32| (a - b).abs() <= 1e-4 * b.abs().max(1.0);

        for (i, &ix) in batch.indices.iter().enumerate() {
            let p = buffer.priority(ix).context("empty slot")?;
            assert!(close(p, sq_errs[i] + eps), "{} != {}", p, sq_errs[i] + eps);
        }
        let recorded = record.get_array1("priorities")?;
        assert_eq!(recorded.len(), n);
        for (r, d) in recorded.iter().zip(sq_errs.iter()) {
            assert!(close(*r, d + eps));
        }

        let weighted_mean = sq_errs
            .iter()
            .zip(batch.weights.iter())
            .map(|(d, w)| d * w)
            .sum::<f32>()
            / n as f32;
        let loss = record.get_scalar("loss")?;
        assert!(close(loss, weighted_mean), "{} != {}", loss, weighted_mean);
        Ok(())
    }

    #[test]
    fn test_opt_skipped_with_few_transitions() -> Result<()> {
        let mut agent = TestDqn::build(config().min_transitions_warmup(6))?;
        let mut buffer = buffer_with(3, 100)?;
        assert!(agent.opt(&mut buffer, 0.4)?.is_none());
        let mut buffer = buffer_with(5, 100)?;
        assert!(agent.opt(&mut buffer, 0.4)?.is_none());
        let mut buffer = buffer_with(6, 100)?;
        assert!(agent.opt(&mut buffer, 0.4)?.is_some());
        Ok(())
    }

    #[test]
    fn test_all_terminal_batch() -> Result<()> {
        let mut agent = TestDqn::build(config())?;
        let mut buffer = buffer_with(4, 1)?;
        let batch = buffer.sample(4, 1.0)?;
        assert!(batch.next_states.iter().all(|s| s.is_terminal()));

        let values = agent.next_values(&batch)?.to_vec1::<f32>()?;
        assert_eq!(values, vec![0.0; 4]);
        assert!(agent.opt(&mut buffer, 1.0)?.is_some());
        Ok(())
    }

    #[test]
    fn test_next_values_follow_mask() -> Result<()> {
        let agent = TestDqn::build(config())?;
        let mut buffer = buffer_with(6, 2)?;
        let batch = buffer.sample(4, 1.0)?;
        let values = agent.next_values(&batch)?.to_vec1::<f32>()?;
        for (v, s) in values.iter().zip(batch.next_states.iter()) {
            match s {
                NextState::Terminal => assert_eq!(*v, 0.0),
                NextState::Present(x) => {
                    let q = agent.qnet_tgt.forward_t(x, false)?.max(1)?.to_vec1::<f32>()?;
                    assert!((q[0] - v).abs() < 1e-4);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_non_finite_loss_leaves_buffer_untouched() -> Result<()> {
        let mut agent = TestDqn::build(config().batch_size(1))?;
        agent.train();
        let config = PrioritizedReplayBufferConfig::default().capacity(1);
        let mut buffer = Buffer::new(&config)?;
        buffer.push(Transition::new(state(0.0)?, 0, f32::NAN, NextState::Terminal, true));

        let before = get_var(agent.qnet.get_varmap(), "head.weight")?.to_vec2::<f32>()?;
        let err = agent.opt(&mut buffer, 0.4).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PerError>(),
            Some(PerError::NonFiniteLoss(_))
        ));
        assert_eq!(buffer.priority(0), Some(1.0));
        let after = get_var(agent.qnet.get_varmap(), "head.weight")?.to_vec2::<f32>()?;
        assert_eq!(before, after);
        assert_eq!(agent.n_opts(), 0);
        Ok(())
    }

    #[test]
    fn test_sync_target() -> Result<()> {
        let mut agent = TestDqn::build(config())?;
        let w = |m: &DqnModel<Cnn>| -> Result<Vec<Vec<f32>>> {
            Ok(get_var(m.get_varmap(), "head.weight")?.to_vec2::<f32>()?)
        };
        assert_eq!(w(&agent.qnet)?, w(&agent.qnet_tgt)?);

        agent.train();
        let mut buffer = buffer_with(8, 3)?;
        for _ in 0..3 {
            agent.opt(&mut buffer, 0.4)?;
        }
        assert_ne!(w(&agent.qnet)?, w(&agent.qnet_tgt)?);

        agent.sync_target()?;
        assert_eq!(w(&agent.qnet)?, w(&agent.qnet_tgt)?);
        Ok(())
    }

    #[test]
    fn test_sample_actions() -> Result<()> {
        let explorer = EpsilonGreedy::default().eps_start(0.0).eps_end(0.0);
        let mut agent = TestDqn::build(config().explorer(explorer))?;
        let s = state(0.5)?;
        let greedy = agent
            .action_values(&s)?
            .argmax(1)?
            .to_vec1::<u32>()?[0] as usize;
        agent.train();
        for t in 0..10 {
            assert_eq!(agent.sample(&s, t)?, greedy);
        }

        let explorer = EpsilonGreedy::default().eps_start(1.0).eps_end(1.0);
        let mut agent = TestDqn::build(config().explorer(explorer))?;
        agent.eval();
        let mut counts = [0usize; 2];
        for t in 0..200 {
            counts[agent.sample(&s, t)?] += 1;
        }
        assert!(counts[0] > 50 && counts[1] > 50);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = TestDqn::build(config())?;
        agent.train();
        let mut buffer = buffer_with(8, 3)?;
        agent.opt(&mut buffer, 0.4)?;
        agent.save_params(dir.path())?;
        assert!(dir.path().join("qnet.safetensors").exists());
        assert!(dir.path().join("qnet_tgt.safetensors").exists());

        let mut agent2 = TestDqn::build(config())?;
        agent2.load_params(dir.path())?;
        let s = state(0.3)?;
        let q1 = agent.action_values(&s)?.to_vec2::<f32>()?;
        let q2 = agent2.action_values(&s)?.to_vec2::<f32>()?;
        assert_eq!(q1, q2);
        Ok(())
    }

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        let config = config().discount_factor(0.9).seed(7);
        config.save(&path)?;
        assert_eq!(DqnConfig::<CnnConfig>::load(&path)?, config);
        Ok(())
    }
}
