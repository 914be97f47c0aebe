use std::collections::VecDeque;

use crate::events::{EventType, QueueEvent};

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id: usize,
    pub arrival_time: f64,
    pub service_start_time: Option<f64>,
    pub service_end_time: Option<f64>,
    pub server_id: Option<usize>,
}

impl Customer {
    pub fn new(id: usize, arrival_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_start_time: None,
            service_end_time: None,
            server_id: None,
        }
    }

    pub fn wait_time(&self) -> Option<f64> {
        self.service_start_time
            .map(|started| started - self.arrival_time)
    }
}

#[derive(Clone, Debug)]
pub struct Server {
    pub id: usize,
    pub busy: bool,
    pub busy_since: f64,
    pub busy_time: f64,
}

impl Server {
    fn idle(id: usize) -> Self {
        Self {
            id,
            busy: false,
            busy_since: 0.0,
            busy_time: 0.0,
        }
    }

    /// Busy time accumulated up to `now`, counting the service in progress.
    pub fn busy_time_at(&self, now: f64) -> f64 {
        if self.busy {
            self.busy_time + (now - self.busy_since).max(0.0)
        } else {
            self.busy_time
        }
    }
}

/// Everything a single run owns: customers, servers, the FIFO wait queue and
/// the append-only event log.
#[derive(Clone, Debug)]
pub struct EngineState {
    pub time: f64,
    pub customers: Vec<Customer>,
    pub servers: Vec<Server>,
    pub wait_queue: VecDeque<usize>,
    pub events: Vec<QueueEvent>,
    /// Running integral of the queue length over simulated time.
    pub queue_area: f64,
    pub last_queue_update: f64,
    pub completed: usize,
    pub completed_wait_total: f64,
}

impl EngineState {
    pub fn new(num_servers: usize, customers: Vec<Customer>) -> Self {
        Self {
            time: 0.0,
            customers,
            servers: (1..=num_servers).map(Server::idle).collect(),
            wait_queue: VecDeque::new(),
            events: Vec::new(),
            queue_area: 0.0,
            last_queue_update: 0.0,
            completed: 0,
            completed_wait_total: 0.0,
        }
    }

    /// Lowest-id idle server, as an index into `servers`.
    pub fn idle_server(&self) -> Option<usize> {
        self.servers.iter().position(|server| !server.busy)
    }

    pub fn queue_length(&self) -> usize {
        self.wait_queue.len()
    }

    /// Folds the queue length held since the last update into the area.
    pub fn advance_queue_area(&mut self, now: f64) {
        let elapsed = now - self.last_queue_update;
        if elapsed > 0.0 {
            self.queue_area += self.wait_queue.len() as f64 * elapsed;
            self.last_queue_update = now;
        }
    }

    pub fn total_busy_time_at(&self, now: f64) -> f64 {
        self.servers
            .iter()
            .map(|server| server.busy_time_at(now))
            .sum()
    }

    /// Appends a log entry at the current time. Callers advance the queue
    /// area before mutating the queue, so the entry sees the post-mutation
    /// length.
    pub fn record(&mut self, customer_idx: usize, event_type: EventType, detail: EventDetail) {
        let event = QueueEvent {
            customer_id: self.customers[customer_idx].id,
            event_type,
            event_time: self.time,
            server_id: detail.server_id,
            queue_length: self.wait_queue.len(),
            wait_time: detail.wait_time,
            service_time: detail.service_time,
        };
        self.events.push(event);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EventDetail {
    pub server_id: Option<usize>,
    pub wait_time: Option<f64>,
    pub service_time: Option<f64>,
}
