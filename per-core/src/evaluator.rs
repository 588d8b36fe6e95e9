//! Evaluate a [`Policy`].
use crate::{replay_buffer::NextState, record::Record, Env, Policy, StepProcessor};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes and averages the total rewards.
///
/// The evaluator owns its environment and step processor, so evaluation does
/// not disturb the episode in progress in [`Trainer`](crate::Trainer).
/// Nothing is pushed to a replay buffer and no optimization step is done.
///
/// The caller of [`Evaluator::evaluate`] needs to handle the internal state of
/// the policy, like training/evaluation mode.
pub struct Evaluator<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    n_episodes: usize,
    max_steps: Option<usize>,
    env: E,
    processor: P,
}

impl<E, P> Evaluator<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Constructs an evaluator running `n_episodes` episodes.
    pub fn new(
        env_config: &E::Config,
        processor_config: &P::Config,
        seed: i64,
        n_episodes: usize,
    ) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps: None,
            env: E::build(env_config, seed)?,
            processor: P::build(processor_config)?,
        })
    }

    /// Truncates evaluation episodes after `v` steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = Some(v);
        self
    }

    /// Total rewards of each episode.
    pub fn episode_rewards<A: Policy<P::State>>(&mut self, policy: &mut A) -> Result<Vec<f32>> {
        let mut rewards = Vec::with_capacity(self.n_episodes);

        for _ in 0..self.n_episodes {
            self.env.reset()?;
            let mut state = self.processor.reset(&mut self.env)?;
            let mut r_total = 0f32;
            let mut t = 0;

            loop {
                let act = policy.sample(&state, t)?;
                let step = self.env.step(act)?;
                r_total += step.reward;
                t += 1;
                let tr = self.processor.process(state, &step, &mut self.env)?;
                if self.max_steps.map_or(false, |m| t >= m) {
                    break;
                }
                match tr.next_state {
                    NextState::Present(s) => state = s,
                    NextState::Terminal => break,
                }
            }
            rewards.push(r_total);
        }

        Ok(rewards)
    }

    /// Average total reward over the episodes.
    pub fn evaluate<A: Policy<P::State>>(&mut self, policy: &mut A) -> Result<f32> {
        let rewards = self.episode_rewards(policy)?;
        let mean = match rewards.len() {
            0 => 0.0,
            n => rewards.iter().sum::<f32>() / n as f32,
        };
        info!("Average score over {} episodes: {}", rewards.len(), mean);
        Ok(mean)
    }

    /// Like [`Evaluator::evaluate`], returns the result as `"eval_reward"`.
    pub fn evaluate_record<A: Policy<P::State>>(&mut self, policy: &mut A) -> Result<Record> {
        Ok(Record::from_scalar("eval_reward", self.evaluate(policy)?))
    }
}
