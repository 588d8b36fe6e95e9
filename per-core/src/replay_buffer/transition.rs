//! Transitions stored in the replay buffer.

/// State following a transition.
///
/// [`NextState::Terminal`] marks the end of an episode, where no next state
/// exists and the value of the next state is zero by definition.
#[derive(Debug, Clone, PartialEq)]
pub enum NextState<S> {
    /// The state observed after the action.
    Present(S),

    /// The episode ended with the action.
    Terminal,
}

impl<S> NextState<S> {
    /// Returns `true` for [`NextState::Terminal`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, NextState::Terminal)
    }

    /// Returns a reference to the state, `None` if terminal.
    pub fn as_present(&self) -> Option<&S> {
        match self {
            NextState::Present(s) => Some(s),
            NextState::Terminal => None,
        }
    }

    /// Converts into an `Option`, `None` if terminal.
    pub fn into_option(self) -> Option<S> {
        match self {
            NextState::Present(s) => Some(s),
            NextState::Terminal => None,
        }
    }
}

/// A transition `(s_t, a_t, r_t, s_t+1, done_t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// State.
    pub state: S,

    /// Index of the action taken in `state`.
    pub action: usize,

    /// Reward.
    pub reward: f32,

    /// State after the action.
    pub next_state: NextState<S>,

    /// Flag denoting if the episode is over.
    pub done: bool,
}

impl<S> Transition<S> {
    /// Constructs a transition.
    pub fn new(state: S, action: usize, reward: f32, next_state: NextState<S>, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}
