//! Batches sampled from the prioritized replay buffer.
use super::NextState;

/// A batch of transitions sampled from
/// [`PrioritizedReplayBuffer`](super::PrioritizedReplayBuffer).
///
/// States, actions and rewards are columns of equal length. Next states stay
/// per-item, because some of them can be [`NextState::Terminal`].
#[derive(Debug, Clone)]
pub struct PrioritizedBatch<S> {
    /// States `s_t`.
    pub states: Vec<S>,

    /// Action indices `a_t`.
    pub actions: Vec<usize>,

    /// Rewards `r_t`.
    pub rewards: Vec<f32>,

    /// Next states `s_t+1`.
    pub next_states: Vec<NextState<S>>,

    /// Flags denoting the end of an episode.
    pub dones: Vec<bool>,

    /// Slots of the sampled transitions in the buffer.
    pub indices: Vec<usize>,

    /// Normalized importance sampling weights. The maximum is 1.
    pub weights: Vec<f32>,
}

impl<S> PrioritizedBatch<S> {
    /// The number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Splits next states into a non-terminal mask and the non-terminal states.
///
/// The second element holds the states of the rows where the mask is `true`,
/// in row order.
pub fn partition_next_states<S: Clone>(next_states: &[NextState<S>]) -> (Vec<bool>, Vec<S>) {
    let mask = next_states.iter().map(|s| !s.is_terminal()).collect();
    let states = next_states
        .iter()
        .filter_map(|s| s.as_present().cloned())
        .collect();
    (mask, states)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_next_states() {
        let next_states = vec![
            NextState::Present(1),
            NextState::Terminal,
            NextState::Present(3),
            NextState::Terminal,
        ];
        let (mask, states) = partition_next_states(&next_states);
        assert_eq!(mask, vec![true, false, true, false]);
        assert_eq!(states, vec![1, 3]);
    }

    #[test]
    fn test_partition_all_terminal() {
        let next_states: Vec<NextState<u8>> = vec![NextState::Terminal; 3];
        let (mask, states) = partition_next_states(&next_states);
        assert_eq!(mask, vec![false; 3]);
        assert!(states.is_empty());
    }
}
