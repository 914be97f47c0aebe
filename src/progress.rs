use std::sync::mpsc::{self, Receiver, SyncSender};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `Error` never appears in an engine snapshot; it marks the final frame a
/// stream writes when the run fails (see `EventStreamSink::send_error`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Running,
    Completed,
    Error,
}

/// Read-only view of a run in progress.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_time: f64,
    pub total_duration: f64,
    /// Customers whose service has completed.
    pub customers_processed: usize,
    pub current_queue_length: usize,
    pub avg_wait_time: f64,
    pub server_utilization: f64,
    pub status: ProgressStatus,
}

/// Receives snapshots while the engine runs.
///
/// The engine waits for `report` to return before taking its next step and
/// never calls it re-entrantly. `is_cancelled` is checked at every report
/// point; returning `true` stops the run with partial results.
pub trait ProgressSink {
    fn report(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressSnapshot),
{
    fn report(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self(snapshot);
        Ok(())
    }
}

/// What the engine does when a sink returns an error.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SinkFailurePolicy {
    /// Log the failure and keep simulating.
    #[default]
    Continue,
    /// Stop and surface `Error::Streaming`.
    Abort,
}

/// Forwards snapshots to another thread over a bounded channel.
///
/// With the default capacity of zero the send is a rendezvous, so `report`
/// only returns once the consumer has taken the snapshot.
pub struct ChannelSink {
    sender: SyncSender<ProgressSnapshot>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<ProgressSnapshot>) {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> (Self, Receiver<ProgressSnapshot>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.sender
            .send(snapshot.clone())
            .map_err(|_| Error::Streaming("progress receiver disconnected".to_string()))
    }
}

/// Stops the run once `limit` reports have been delivered.
pub struct CancelAfter<S> {
    inner: S,
    limit: usize,
    delivered: usize,
}

impl<S: ProgressSink> CancelAfter<S> {
    pub fn new(inner: S, limit: usize) -> Self {
        Self {
            inner,
            limit,
            delivered: 0,
        }
    }
}

impl<S: ProgressSink> ProgressSink for CancelAfter<S> {
    fn report(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.delivered += 1;
        self.inner.report(snapshot)
    }

    fn is_cancelled(&self) -> bool {
        self.delivered >= self.limit || self.inner.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snapshot(current_time: f64) -> ProgressSnapshot {
        ProgressSnapshot {
            current_time,
            total_duration: 10.0,
            customers_processed: 0,
            current_queue_length: 0,
            avg_wait_time: 0.0,
            server_utilization: 0.0,
            status: ProgressStatus::Running,
        }
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        let mut sink = |snapshot: &ProgressSnapshot| seen.push(snapshot.current_time);
        sink.report(&snapshot(1.0)).expect("closure sink never fails");
        sink.report(&snapshot(2.0)).expect("closure sink never fails");
        assert!(!sink.is_cancelled());
        assert_eq!(seen, vec![1.0, 2.0]);
    }

    #[test]
    fn channel_sink_delivers_in_order() {
        let (mut sink, receiver) = ChannelSink::new();
        let consumer = thread::spawn(move || receiver.iter().map(|s| s.current_time).collect());
        for time in [0.0, 0.5, 1.0] {
            sink.report(&snapshot(time)).expect("receiver is alive");
        }
        drop(sink);
        let times: Vec<f64> = consumer.join().expect("consumer should not panic");
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn channel_sink_fails_when_receiver_dropped() {
        let (mut sink, receiver) = ChannelSink::with_capacity(1);
        drop(receiver);
        let err = sink.report(&snapshot(0.0)).unwrap_err();
        assert!(matches!(err, Error::Streaming(_)));
    }

    #[test]
    fn cancel_after_limit() {
        let mut count = 0usize;
        let mut sink = CancelAfter::new(|_: &ProgressSnapshot| count += 1, 2);
        assert!(!sink.is_cancelled());
        sink.report(&snapshot(0.0)).expect("closure sink never fails");
        assert!(!sink.is_cancelled());
        sink.report(&snapshot(1.0)).expect("closure sink never fails");
        assert!(sink.is_cancelled());
        drop(sink);
        assert_eq!(count, 2);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(snapshot(0.0)).expect("snapshot should serialize");
        assert_eq!(json["status"], "running");
        assert_eq!(json["totalDuration"], 10.0);
        assert_eq!(json["customersProcessed"], 0);
    }
}
