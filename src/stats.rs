use serde::{Deserialize, Serialize};

use crate::events::QueueEvent;
use crate::state::EngineState;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    pub total_customers: usize,
    pub avg_wait_time: f64,
    /// Time-weighted over the run's horizon.
    pub avg_queue_length: f64,
    pub max_queue_length: usize,
    pub server_utilization: f64,
    /// Simulated instant the run reached; the full duration unless cancelled.
    pub end_time: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    pub events: Vec<QueueEvent>,
}

/// Derives the summary statistics of a run that stopped at `horizon`.
///
/// The state's queue area must already be advanced to `horizon`.
pub fn aggregate(state: &mut EngineState, horizon: f64, cancelled: bool) -> SimulationResults {
    let (started, wait_total) = state
        .customers
        .iter()
        .filter_map(|customer| customer.wait_time())
        .fold((0usize, 0.0), |(count, total), wait| (count + 1, total + wait));
    let avg_wait_time = if started == 0 {
        0.0
    } else {
        wait_total / started as f64
    };

    let avg_queue_length = if horizon > 0.0 {
        state.queue_area / horizon
    } else {
        0.0
    };
    let max_queue_length = state
        .events
        .iter()
        .map(|event| event.queue_length)
        .max()
        .unwrap_or(0);
    let server_utilization = utilization(
        state.total_busy_time_at(horizon),
        state.servers.len(),
        horizon,
    );

    SimulationResults {
        total_customers: state.customers.len(),
        avg_wait_time,
        avg_queue_length,
        max_queue_length,
        server_utilization,
        end_time: horizon,
        cancelled,
        events: std::mem::take(&mut state.events),
    }
}

/// `busy / (servers * elapsed)`, clamped to `[0, 1]`; 0 before time advances.
pub fn utilization(busy_time: f64, servers: usize, elapsed: f64) -> f64 {
    if elapsed <= 0.0 || servers == 0 {
        return 0.0;
    }
    (busy_time / (servers as f64 * elapsed)).clamp(0.0, 1.0)
}

/// Mean over `count` observations, 0 when there are none.
pub fn running_mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
