use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Pending work in the engine's heap. Customer fields are indices into the
/// run's customer list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    CustomerArrival { customer: usize },
    ServiceComplete { server: usize, customer: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct ScheduledEvent {
    pub time: f64,
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(time: f64, event: Event) -> Self {
        Self { time, event }
    }
}

// Completions sort ahead of arrivals at the same instant, so a freed server
// picks up the queue head before a simultaneous arrival is considered.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.event.priority().cmp(&other.event.priority()))
            .then_with(|| self.event.tiebreaker().cmp(&other.event.tiebreaker()))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl Event {
    fn priority(&self) -> u8 {
        match self {
            Event::ServiceComplete { .. } => 0,
            Event::CustomerArrival { .. } => 1,
        }
    }

    fn tiebreaker(&self) -> usize {
        match self {
            Event::ServiceComplete { customer, .. } => *customer,
            Event::CustomerArrival { customer } => *customer,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Arrival,
    ServiceStart,
    ServiceEnd,
    Departure,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventType::Arrival => "arrival",
            EventType::ServiceStart => "service_start",
            EventType::ServiceEnd => "service_end",
            EventType::Departure => "departure",
        };
        f.write_str(label)
    }
}

/// One entry of the run's append-only log. `queue_length` counts waiting
/// customers only, after the mutation that produced the entry.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEvent {
    pub customer_id: usize,
    pub event_type: EventType,
    pub event_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<usize>,
    pub queue_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_time: Option<f64>,
}
