//! Environment step.
use super::Env;
use crate::replay_buffer::{NextState, Transition};
use anyhow::{Context, Result};
use std::marker::PhantomData;

/// Additional information to `Obs`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
/// [`StepProcessor`] turns it into a transition `(s_t, a_t, r_t, s_t+1)`.
pub struct Step<E: Env> {
    /// Index of the action.
    pub act: usize,

    /// Observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is over.
    pub is_done: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: E::Obs, act: usize, reward: f32, is_done: bool, info: E::Info) -> Self {
        Step {
            act,
            obs,
            reward,
            is_done,
            info,
        }
    }
}

/// Turns [`Step`]s of an environment into [`Transition`]s.
///
/// This trait is used in [`Trainer`](crate::Trainer). The state of a
/// transition is derived by the processor, typically from rendered frames,
/// and is not necessarily the observation of the environment.
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// State in the transitions produced by this trait.
    type State: Clone;

    /// Build a processor.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Called right after `env` was reset. Returns the first state of the episode.
    fn reset(&mut self, env: &mut E) -> Result<Self::State>;

    /// Produces the transition from `state` given the step just taken in `env`.
    fn process(
        &mut self,
        state: Self::State,
        step: &Step<E>,
        env: &mut E,
    ) -> Result<Transition<Self::State>>;
}

/// Converts raw frames into states.
pub trait FramePreprocessor<F> {
    /// Configuration.
    type Config: Clone;

    /// Preprocessed frame, and the difference of two of them.
    type State: Clone;

    /// Builds the preprocessor.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Converts a raw frame into a fixed-shape state.
    fn preprocess(&self, frame: &F) -> Result<Self::State>;

    /// Returns `current - last`.
    fn difference(&self, current: &Self::State, last: &Self::State) -> Result<Self::State>;
}

/// A [`StepProcessor`] whose states are differences of consecutive
/// preprocessed frames.
///
/// At the end of an episode the next state is [`NextState::Terminal`].
pub struct DifferenceStepProcessor<E, F>
where
    E: Env,
    F: FramePreprocessor<E::Frame>,
{
    preprocessor: F,
    current: Option<F::State>,
    phantom: PhantomData<E>,
}

impl<E, F> DifferenceStepProcessor<E, F>
where
    E: Env,
    F: FramePreprocessor<E::Frame>,
{
    fn screen(&self, env: &mut E) -> Result<F::State> {
        let frame = env.render()?;
        self.preprocessor.preprocess(&frame)
    }
}

impl<E, F> StepProcessor<E> for DifferenceStepProcessor<E, F>
where
    E: Env,
    F: FramePreprocessor<E::Frame>,
{
    type Config = F::Config;
    type State = F::State;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            preprocessor: F::build(config)?,
            current: None,
            phantom: PhantomData,
        })
    }

    fn reset(&mut self, env: &mut E) -> Result<Self::State> {
        let last = self.screen(env)?;
        let current = self.screen(env)?;
        let state = self.preprocessor.difference(&current, &last)?;
        self.current = Some(current);
        Ok(state)
    }

    fn process(
        &mut self,
        state: Self::State,
        step: &Step<E>,
        env: &mut E,
    ) -> Result<Transition<Self::State>> {
        let last = self
            .current
            .take()
            .context("process() was called before reset()")?;
        let current = self.screen(env)?;
        let next_state = if step.is_done {
            NextState::Terminal
        } else {
            NextState::Present(self.preprocessor.difference(&current, &last)?)
        };
        self.current = Some(current);

        Ok(Transition::new(
            state,
            step.act,
            step.reward,
            next_state,
            step.is_done,
        ))
    }
}
