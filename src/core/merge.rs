//! Hand-off of completed event records from workers to the output stream.
//!
//! Workers never share a mutable output slot. Each one snapshots its
//! finished buffer into an owned [`EventRecord`], sends it over a bounded
//! channel and resets its buffer. A single [`OutputCoordinator`] receives
//! the records in arrival order, copies each into its output slot and
//! appends the slot to the stream, so records are always whole.

use crate::core::errors::MergeError;
use crate::core::record::{RecordBuffer, RecordWriter};
use crate::core::types::WorkerId;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use std::io::Write;

/// Completed listmode values of one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub worker: WorkerId,
    /// Index of the event within its worker's sequence
    pub event: u64,
    pub values: Vec<f64>,
    /// Whether any detector fired during the event
    pub has_data: bool,
}

/// Create the bounded channel linking workers to the coordinator
pub fn record_channel(capacity: usize) -> (Sender<EventRecord>, Receiver<EventRecord>) {
    bounded(capacity)
}

/// Worker-side end of the merge channel
#[derive(Debug, Clone)]
pub struct RecordMerger {
    worker: WorkerId,
    sender: Sender<EventRecord>,
}

impl RecordMerger {
    pub fn new(worker: WorkerId, sender: Sender<EventRecord>) -> Self {
        Self { worker, sender }
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Publish the buffer's contents as one record, then reset the buffer.
    ///
    /// Blocks while the channel is full. The buffer is left untouched if
    /// the coordinator has gone away.
    pub fn merge(&self, event: u64, buffer: &mut RecordBuffer) -> Result<(), MergeError> {
        let record = EventRecord {
            worker: self.worker,
            event,
            values: buffer.values().to_vec(),
            has_data: buffer.has_data(),
        };
        self.sender
            .send(record)
            .map_err(|_| MergeError::Disconnected {
                worker: self.worker,
            })?;
        buffer.reset();
        Ok(())
    }
}

/// What the coordinator wrote once every worker has finished
#[derive(Debug)]
pub struct MergeOutcome<W> {
    pub output: W,
    pub records: u64,
    pub records_with_data: u64,
    pub records_per_worker: Vec<u64>,
}

/// Single consumer that owns the output slot and the output stream
pub struct OutputCoordinator<W: Write> {
    slot: RecordBuffer,
    writer: RecordWriter<W>,
    records_with_data: u64,
    records_per_worker: Vec<u64>,
}

impl<W: Write> OutputCoordinator<W> {
    pub fn new(writer: RecordWriter<W>, detectors: usize, fields: usize, workers: usize) -> Self {
        Self {
            slot: RecordBuffer::new(detectors, fields),
            writer,
            records_with_data: 0,
            records_per_worker: vec![0; workers],
        }
    }

    /// Copy a record into the output slot and append the slot to the stream
    pub fn publish(&mut self, record: &EventRecord) -> Result<(), MergeError> {
        self.slot.copy_from(&record.values);
        self.writer.append(self.slot.values())?;
        if record.has_data {
            self.records_with_data += 1;
        }
        if let Some(count) = self.records_per_worker.get_mut(record.worker) {
            *count += 1;
        }
        Ok(())
    }

    /// Consume records until every sender has been dropped, then flush
    pub fn run(mut self, receiver: Receiver<EventRecord>) -> Result<MergeOutcome<W>, MergeError> {
        debug!("Output coordinator started");
        for record in receiver.iter() {
            self.publish(&record)?;
        }
        let records = self.writer.records();
        let output = self.writer.finish()?;
        debug!("Output coordinator finished after {} records", records);
        Ok(MergeOutcome {
            output,
            records,
            records_with_data: self.records_with_data,
            records_per_worker: self.records_per_worker,
        })
    }
}
