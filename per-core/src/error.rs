//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The replay buffer was configured with zero capacity.
    #[error("Capacity of the replay buffer must be positive")]
    ZeroCapacity,

    /// The priority exponent is outside of `[0, 1]`.
    #[error("Priority exponent alpha must be in [0, 1], got {0}")]
    InvalidAlpha(f32),

    /// A batch of zero transitions was requested.
    #[error("Batch size must be positive")]
    EmptyBatch,

    /// Sampling was requested with fewer stored transitions than the batch size.
    #[error("Cannot sample {requested} transitions from a buffer holding {available}")]
    InsufficientTransitions {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions in the buffer.
        available: usize,
    },

    /// Indices and priorities given to `update_priorities` differ in length.
    #[error("Got {indices} indices but {priorities} priorities")]
    LengthMismatch {
        /// Number of indices.
        indices: usize,
        /// Number of priorities.
        priorities: usize,
    },

    /// An index does not refer to a stored transition.
    #[error("Index {index} is out of range for a buffer holding {size} transitions")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of transitions in the buffer.
        size: usize,
    },

    /// A priority is not positive or not finite.
    #[error("Invalid priority {priority} for index {index}")]
    InvalidPriority {
        /// Slot the priority was meant for.
        index: usize,
        /// The offending value.
        priority: f32,
    },

    /// The priorities do not define a probability distribution.
    #[error("Priorities sum to {0}, sampling distribution is undefined")]
    DegenerateDistribution(f64),

    /// The loss of an optimization step is NaN or infinite.
    #[error("Non-finite loss: {0}")]
    NonFiniteLoss(f32),
}
