use super::{AggregateRecorder, Record, Recorder};
use log::trace;

/// Buffered recorder.
///
/// Keeps every record in memory. Stored records are merged into a single
/// record per flush, so that records of the same training step, coming from
/// the agent and the trainer, end up in one entry.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    pending: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scalar values recorded under `key`, in recording order.
    pub fn scalars(&self, key: &str) -> Vec<f32> {
        self.buf
            .iter()
            .filter_map(|r| r.get_scalar(key).ok())
            .collect()
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.pending.push(record);
    }

    fn flush(&mut self, step: i64) {
        if self.pending.is_empty() {
            return;
        }
        trace!("Flush {} records at step {}", self.pending.len(), step);
        let record = self
            .pending
            .drain(..)
            .fold(Record::empty(), |acc, r| acc.merge(r));
        self.buf.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordValue;

    #[test]
    fn test_flush_merges_pending_records() {
        let mut recorder = BufferedRecorder::new();
        recorder.store(Record::from_scalar("loss", 0.5));
        recorder.store(Record::from_scalar("duration", 12.0));
        recorder.flush(0);
        recorder.flush(1);
        recorder.write(Record::from_slice(&[("loss", RecordValue::Scalar(0.25))]));

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.scalars("loss"), vec![0.5, 0.25]);
        assert_eq!(recorder.scalars("duration"), vec![12.0]);
    }
}
