//! Train [`Agent`].
mod config;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    replay_buffer::{BetaScheduler, NextState, Transition},
    Agent, Env, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{debug, info};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Objects and counters of a training run.
///
/// Returned by [`Trainer::train()`], so that the caller can inspect the
/// replay buffer and the episode durations after training.
pub struct TrainerState<E, P, R> {
    /// Environment for training.
    pub env: E,

    /// Turns environment steps into transitions.
    pub processor: P,

    /// Replay buffer.
    pub buffer: R,

    /// The number of actions taken so far.
    pub steps_done: usize,

    /// Index of the next episode.
    pub episode: usize,

    /// Number of steps of each finished episode.
    pub episode_durations: Vec<usize>,

    /// Rewards accumulated since the last report.
    pub total_reward: f32,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages training loop and related objects.
///
/// # Training loop
///
/// For each episode `i` in `0..num_episodes`:
///
/// 1. Reset [`Env`] and get the first state from [`StepProcessor`].
/// 2. Take an action with [`Agent`] (a [`Policy`](crate::Policy)) given the state and
///    the number of actions taken so far, `steps_done`. Then `steps_done += 1`.
/// 3. Step the environment and accumulate the reward.
/// 4. Turn the step into a [`Transition`] and push it into the replay buffer.
/// 5. Do an optimization step with `beta = beta_scheduler.beta(steps_done)`. The
///    agent can skip it, for example while the buffer holds fewer transitions
///    than a batch.
/// 6. If the episode is over, or `max_steps_per_episode` is reached, record
///    its duration. Otherwise back to step 2.
/// 7. If `i % report_interval == 0`, record `total_reward / report_interval` as
///    `"mean_reward"` and reset `total_reward`.
/// 8. If `i % target_update_interval == 0`, copy the trained network into the
///    target network.
///
/// After the last episode, the agent is saved in `model_dir` if given.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|Transition|D[ReplayBufferBase]
///     D -->|PrioritizedBatch|A
///     A -->|priorities|D
/// ```
///
/// Training can be aborted from another thread with the flag returned by
/// [`Trainer::stop_handle()`]. It is checked before every environment step.
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = Transition<P::State>> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the transition producer.
    step_proc_config: P::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    /// Seed of the environment.
    env_seed: i64,

    /// The number of training episodes.
    num_episodes: usize,

    /// Interval of target network updates in episodes.
    target_update_interval: usize,

    /// Interval of reports in episodes.
    report_interval: usize,

    max_steps_per_episode: Option<usize>,

    /// Where to save the trained model.
    model_dir: Option<String>,

    beta_scheduler: BetaScheduler,

    stop: Arc<AtomicBool>,
}

/// `true` at multiples of `interval`, never if `interval` is zero.
fn is_due(episode: usize, interval: usize) -> bool {
    interval > 0 && episode % interval == 0
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = Transition<P::State>> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            step_proc_config,
            replay_buffer_config,
            env_seed: config.env_seed,
            num_episodes: config.num_episodes,
            target_update_interval: config.target_update_interval,
            report_interval: config.report_interval,
            max_steps_per_episode: config.max_steps_per_episode,
            model_dir: config.model_dir,
            beta_scheduler: config.beta_scheduler,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a flag aborting training when set to `true`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Builds the environment, the step processor and an empty replay buffer.
    pub fn init_state(&self) -> Result<TrainerState<E, P, R>> {
        Ok(TrainerState {
            env: E::build(&self.env_config, self.env_seed)?,
            processor: P::build(&self.step_proc_config)?,
            buffer: R::build(&self.replay_buffer_config)?,
            steps_done: 0,
            episode: 0,
            episode_durations: vec![],
            total_reward: 0.0,
        })
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Runs an episode, from reset of the environment to the end-of-episode
    /// bookkeeping.
    ///
    /// Returns `false` if training was aborted during the episode. Then the
    /// episode is neither counted nor recorded, and its rewards are dropped
    /// from the running total. Its transitions stay in the buffer.
    pub fn run_episode<A>(
        &self,
        agent: &mut A,
        state: &mut TrainerState<E, P, R>,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<bool>
    where
        A: Agent<P::State, R>,
    {
        let episode = state.episode;
        let total_reward = state.total_reward;
        state.env.reset()?;
        let mut s = state.processor.reset(&mut state.env)?;
        let mut t = 0;

        loop {
            if self.is_stopped() {
                info!("Training stopped in episode {}", episode);
                state.total_reward = total_reward;
                return Ok(false);
            }

            let act = agent.sample(&s, state.steps_done)?;
            state.steps_done += 1;
            let step = state.env.step(act)?;
            state.total_reward += step.reward;
            t += 1;

            let tr = state.processor.process(s, &step, &mut state.env)?;
            let next_state = tr.next_state.clone();
            state.buffer.push(tr)?;

            let beta = self.beta_scheduler.beta(state.steps_done);
            if let Some(mut record) = agent.opt(&mut state.buffer, beta)? {
                record.insert("beta", Scalar(beta));
                recorder.store(record);
            }

            let truncated = self.max_steps_per_episode.map_or(false, |m| t >= m);
            match next_state {
                NextState::Present(next) if !truncated => s = next,
                _ => break,
            }
        }

        debug!("Episode {} finished after {} steps", episode, t);
        state.episode_durations.push(t);
        recorder.store(Record::from_slice(&[
            ("episode", Scalar(episode as f32)),
            ("duration", Scalar(t as f32)),
        ]));

        if is_due(episode, self.report_interval) {
            let mean_reward = state.total_reward / self.report_interval as f32;
            info!(
                "Mean episode {}/{} reward is: {:.2}",
                episode, self.num_episodes, mean_reward
            );
            recorder.store(Record::from_scalar("mean_reward", mean_reward));
            state.total_reward = 0.0;
        }

        if is_due(episode, self.target_update_interval) {
            agent.sync_target()?;
            info!("Updated the target network after episode {}", episode);
        }

        recorder.flush(episode as _);
        state.episode += 1;
        Ok(true)
    }

    /// Train the agent.
    ///
    /// Returns the state at the end of training, or at the point training
    /// was aborted.
    pub fn train<A>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<TrainerState<E, P, R>>
    where
        A: Agent<P::State, R>,
    {
        let mut state = self.init_state()?;
        agent.train();

        while state.episode < self.num_episodes {
            if !self.run_episode(agent, &mut state, recorder)? {
                break;
            }
        }

        if let Some(model_dir) = &self.model_dir {
            agent.save_params(Path::new(model_dir))?;
            info!("Saved the model in {:?}", model_dir);
        }

        Ok(state)
    }
}
