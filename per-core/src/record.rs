//! Types and traits for recording training metrics.
//!
//! # Basic Usage
//!
//! ```rust
//! use per_core::record::{Record, RecordValue};
//!
//! // following values are obtained with some process in reality
//! let episode = 3;
//! let duration = 42;
//! let loss = 0.25f32;
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(episode as f32));
//! record.insert("duration", RecordValue::Scalar(duration as f32));
//! record.insert("loss", RecordValue::Scalar(loss));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
//! ```
//!
//! The [`Trainer`](crate::Trainer) stores records into an
//! [`AggregateRecorder`] and flushes it at the end of every episode.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
