//! Prioritized replay buffer.
use super::{
    Categorical, PrioritizedBatch, PrioritizedReplayBufferConfig, PriorityStore, Transition,
};
use crate::{error::PerError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, SeedableRng};

/// A circular replay buffer sampling transitions in proportion to their priorities.
///
/// Transition `i` is drawn with probability $P(i) = p_i^\alpha / \sum_k p_k^\alpha$,
/// where $p_i$ is its priority. A pushed transition gets the maximum
/// priority in the buffer, so it is sampled at least as often as any other
/// transition until a learning step re-evaluates it.
///
/// The buffer is filled slot by slot. Once `capacity` transitions have been
/// pushed, each push overwrites the oldest transition.
pub struct PrioritizedReplayBuffer<S> {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Exponent for prioritization.
    alpha: f32,

    /// Current insertion index.
    pos: usize,

    /// Stored transitions, at most `capacity`.
    memory: Vec<Transition<S>>,

    /// One priority per slot.
    priorities: PriorityStore,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<S: Clone> PrioritizedReplayBuffer<S> {
    /// Creates a buffer.
    ///
    /// # Errors
    ///
    /// Fails if the capacity is zero or alpha is not in `[0, 1]`.
    pub fn new(config: &PrioritizedReplayBufferConfig) -> Result<Self, PerError> {
        if config.capacity == 0 {
            return Err(PerError::ZeroCapacity);
        }
        if !(0.0..=1.0).contains(&config.alpha) {
            return Err(PerError::InvalidAlpha(config.alpha));
        }

        Ok(Self {
            capacity: config.capacity,
            alpha: config.alpha,
            pos: 0,
            memory: Vec::with_capacity(config.capacity),
            priorities: PriorityStore::new(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Adds a transition at the current insertion index.
    ///
    /// The transition gets the maximum priority in the buffer, or 1 if the
    /// buffer is empty.
    pub fn push(&mut self, tr: Transition<S>) {
        let max_p = self.max_priority().unwrap_or(1.0);

        if self.memory.len() < self.capacity {
            self.memory.push(tr);
        } else {
            self.memory[self.pos] = tr;
        }

        self.priorities.set(self.pos, max_p);
        self.pos = (self.pos + 1) % self.capacity;
    }

    /// Samples `batch_size` transitions with replacement.
    ///
    /// Importance sampling weights are $w_i = (N P(i))^{-\beta}$, divided by
    /// their maximum within the batch.
    ///
    /// # Errors
    ///
    /// Fails if `batch_size` is zero or larger than the number of stored
    /// transitions, or if the priorities do not define a distribution.
    pub fn sample(&mut self, batch_size: usize, beta: f32) -> Result<PrioritizedBatch<S>, PerError> {
        let size = self.len();
        if batch_size == 0 {
            return Err(PerError::EmptyBatch);
        }
        if size < batch_size {
            return Err(PerError::InsufficientTransitions {
                requested: batch_size,
                available: size,
            });
        }

        let dist = self.distribution()?;
        let indices = (0..batch_size)
            .map(|_| dist.sample(&mut self.rng))
            .collect::<Vec<_>>();

        let n = size as f64;
        let beta = beta as f64;
        let ws = indices
            .iter()
            .map(|&ix| (n * dist.probability(ix)).powf(-beta))
            .collect::<Vec<_>>();
        let w_max = ws.iter().cloned().fold(f64::MIN, f64::max);
        let weights = ws.iter().map(|w| (w / w_max) as f32).collect::<Vec<_>>();
        trace!("Sampled {:?} with weights {:?}", indices, weights);

        let mut batch = PrioritizedBatch {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            dones: Vec::with_capacity(batch_size),
            indices,
            weights,
        };
        for &ix in batch.indices.iter() {
            let tr = &self.memory[ix];
            batch.states.push(tr.state.clone());
            batch.actions.push(tr.action);
            batch.rewards.push(tr.reward);
            batch.next_states.push(tr.next_state.clone());
            batch.dones.push(tr.done);
        }

        Ok(batch)
    }

    /// Overwrites the priorities of the transitions at `indices`.
    ///
    /// `priorities[i]` is the new priority of slot `indices[i]`. Nothing is
    /// updated if any of the arguments is invalid.
    ///
    /// # Errors
    ///
    /// Fails if the lengths differ, an index is not a stored transition, or
    /// a priority is not a positive finite number. Every stored priority is
    /// thus positive, and so is the seed of a pushed transition.
    pub fn update_priorities(&mut self, indices: &[usize], priorities: &[f32]) -> Result<(), PerError> {
        if indices.len() != priorities.len() {
            return Err(PerError::LengthMismatch {
                indices: indices.len(),
                priorities: priorities.len(),
            });
        }
        let size = self.len();
        for (&index, &priority) in indices.iter().zip(priorities.iter()) {
            if index >= size {
                return Err(PerError::IndexOutOfRange { index, size });
            }
            if !priority.is_finite() || priority <= 0.0 {
                return Err(PerError::InvalidPriority { index, priority });
            }
        }

        for (&ix, &p) in indices.iter().zip(priorities.iter()) {
            self.priorities.set(ix, p);
        }

        Ok(())
    }

    /// Sampling probabilities of the stored transitions, in slot order.
    pub fn probabilities(&self) -> Result<Vec<f64>, PerError> {
        let dist = self.distribution()?;
        Ok((0..dist.len()).map(|ix| dist.probability(ix)).collect())
    }

    fn distribution(&self) -> Result<Categorical, PerError> {
        let alpha = self.alpha as f64;
        let ps = self
            .priorities
            .as_slice(self.len())
            .iter()
            .map(|&p| (p as f64).powf(alpha))
            .collect::<Vec<_>>();
        Categorical::new(&ps)
    }
}

impl<S> PrioritizedReplayBuffer<S> {
    /// Returns the current number of transitions in the buffer.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if no transition has been pushed.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Exponent for prioritization.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Slot the next transition will be written to.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The transition stored in slot `ix`.
    pub fn get(&self, ix: usize) -> Option<&Transition<S>> {
        self.memory.get(ix)
    }

    /// Priority of slot `ix`, `None` if the slot is empty.
    pub fn priority(&self, ix: usize) -> Option<f32> {
        if ix < self.len() {
            Some(self.priorities.get(ix))
        } else {
            None
        }
    }

    /// Maximum priority of the stored transitions, `None` if empty.
    pub fn max_priority(&self) -> Option<f32> {
        self.priorities.max(self.len())
    }
}

impl<S: Clone> ExperienceBufferBase for PrioritizedReplayBuffer<S> {
    type Item = Transition<S>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        PrioritizedReplayBuffer::push(self, tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}

impl<S: Clone> ReplayBufferBase for PrioritizedReplayBuffer<S> {
    type Config = PrioritizedReplayBufferConfig;
    type Batch = PrioritizedBatch<S>;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self::new(config)?)
    }

    fn batch(&mut self, size: usize, beta: f32) -> Result<Self::Batch> {
        Ok(self.sample(size, beta)?)
    }

    fn update_priority(&mut self, ixs: &[usize], priorities: &[f32]) -> Result<()> {
        Ok(self.update_priorities(ixs, priorities)?)
    }
}
