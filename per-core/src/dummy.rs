//! Dummy environment and preprocessor for testing.
use crate::{DifferenceStepProcessor, Env, FramePreprocessor, Policy, Step};
use anyhow::Result;

/// Gives reward `act` at each step and ends after `len` steps.
///
/// The rendered frame is the number of steps since reset.
pub struct CountEnv {
    t: usize,
    len: usize,
}

impl Env for CountEnv {
    type Config = usize;
    type Obs = ();
    type Frame = f32;
    type Info = ();

    fn build(config: &usize, _seed: i64) -> Result<Self> {
        Ok(Self { t: 0, len: *config })
    }

    fn reset(&mut self) -> Result<()> {
        self.t = 0;
        Ok(())
    }

    fn step(&mut self, act: usize) -> Result<Step<Self>> {
        self.t += 1;
        Ok(Step::new((), act, act as f32, self.t >= self.len, ()))
    }

    fn render(&mut self) -> Result<f32> {
        Ok(self.t as f32)
    }

    fn n_actions(&self) -> usize {
        3
    }
}

/// Scalar frames, unchanged.
pub struct Scalar;

impl FramePreprocessor<f32> for Scalar {
    type Config = ();
    type State = f32;

    fn build(_config: &()) -> Result<Self> {
        Ok(Scalar)
    }

    fn preprocess(&self, frame: &f32) -> Result<f32> {
        Ok(*frame)
    }

    fn difference(&self, current: &f32, last: &f32) -> Result<f32> {
        Ok(current - last)
    }
}

pub type CountProcessor = DifferenceStepProcessor<CountEnv, Scalar>;

/// Always takes the same action.
pub struct Constant(pub usize);

impl Policy<f32> for Constant {
    fn sample(&mut self, _state: &f32, _step: usize) -> Result<usize> {
        Ok(self.0)
    }
}
