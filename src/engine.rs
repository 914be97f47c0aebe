use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info, info_span, trace, warn};

use crate::arrivals::generate_arrivals;
use crate::error::{Error, Result};
use crate::events::{Event, EventType, ScheduledEvent};
use crate::models::SimulationParams;
use crate::progress::{ProgressSink, ProgressSnapshot, ProgressStatus, SinkFailurePolicy};
use crate::random::VariateSource;
use crate::state::{EngineState, EventDetail};
use crate::stats::{aggregate, running_mean, utilization, SimulationResults};

/// Number of progress reports spread over the horizon, besides the first
/// and the last.
const PROGRESS_STEPS: f64 = 100.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    pub sink_failure: SinkFailurePolicy,
}

/// A single M/M/c run. The engine is consumed by `run`, so every run starts
/// from freshly built state and its own random source.
pub struct SimulationEngine<R> {
    pub params: SimulationParams,
    pub options: RunOptions,
    state: EngineState,
    pending: BinaryHeap<Reverse<ScheduledEvent>>,
    variates: VariateSource<R>,
}

impl SimulationEngine<StdRng> {
    pub fn new(params: SimulationParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimulationEngine<R> {
    /// Parameters are validated by `run`, not here.
    pub fn with_rng(params: SimulationParams, rng: R) -> Self {
        Self {
            params,
            options: RunOptions::default(),
            state: EngineState::new(0, Vec::new()),
            pending: BinaryHeap::new(),
            variates: VariateSource::new(rng),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(self) -> Result<SimulationResults> {
        self.execute(None)
    }

    pub fn run_with_progress(self, sink: &mut dyn ProgressSink) -> Result<SimulationResults> {
        self.execute(Some(sink))
    }

    fn execute(mut self, mut sink: Option<&mut dyn ProgressSink>) -> Result<SimulationResults> {
        self.params.validate()?;
        let span = info_span!(
            "simulation",
            arrival_rate = self.params.arrival_rate,
            service_rate = self.params.service_rate,
            servers = self.params.num_servers,
            duration = self.params.duration
        );
        let _entered = span.enter();
        info!(
            traffic_intensity = self.params.traffic_intensity(),
            "simulation started"
        );

        let customers = generate_arrivals(&self.params, &mut self.variates);
        debug!(arrivals = customers.len(), "generated arrivals");
        self.pending = customers
            .iter()
            .enumerate()
            .map(|(idx, customer)| {
                Reverse(ScheduledEvent::new(
                    customer.arrival_time,
                    Event::CustomerArrival { customer: idx },
                ))
            })
            .collect();
        self.state = EngineState::new(self.params.num_servers, customers);

        let duration = self.params.duration;
        let interval = duration / PROGRESS_STEPS;
        let mut last_report = 0.0;
        let mut cancelled = self.emit_progress(&mut sink, ProgressStatus::Running)?;

        while !cancelled {
            let Some(&Reverse(next)) = self.pending.peek() else {
                break;
            };
            if next.time >= duration {
                break;
            }
            if sink.is_some() && next.time - last_report >= interval {
                self.advance_to(next.time);
                last_report = next.time;
                cancelled = self.emit_progress(&mut sink, ProgressStatus::Running)?;
                if cancelled {
                    break;
                }
            }

            self.pending.pop();
            self.advance_to(next.time);
            match next.event {
                Event::ServiceComplete { server, customer } => {
                    self.complete_service(server, customer)
                }
                Event::CustomerArrival { customer } => self.admit(customer),
            }
        }

        let horizon = if cancelled { self.state.time } else { duration };
        self.advance_to(horizon);
        if cancelled {
            warn!(at = horizon, "simulation cancelled");
        } else {
            self.emit_progress(&mut sink, ProgressStatus::Completed)?;
        }

        let results = aggregate(&mut self.state, horizon, cancelled);
        info!(
            customers = results.total_customers,
            events = results.events.len(),
            avg_wait_time = results.avg_wait_time,
            avg_queue_length = results.avg_queue_length,
            max_queue_length = results.max_queue_length,
            server_utilization = results.server_utilization,
            "simulation finished"
        );
        Ok(results)
    }

    fn advance_to(&mut self, time: f64) {
        self.state.advance_queue_area(time);
        self.state.time = time;
    }

    fn admit(&mut self, customer: usize) {
        trace!(
            time = self.state.time,
            customer = self.state.customers[customer].id,
            "arrival"
        );
        match self.state.idle_server() {
            Some(server) => {
                self.state
                    .record(customer, EventType::Arrival, EventDetail::default());
                self.start_service(customer, server);
            }
            None => {
                self.state.wait_queue.push_back(customer);
                self.state
                    .record(customer, EventType::Arrival, EventDetail::default());
            }
        }
    }

    fn start_service(&mut self, customer: usize, server: usize) {
        let now = self.state.time;
        let service_time = self.variates.exponential(self.params.service_rate);
        let server_id = self.state.servers[server].id;

        let record = &mut self.state.customers[customer];
        record.service_start_time = Some(now);
        record.server_id = Some(server_id);
        let wait_time = now - record.arrival_time;

        let slot = &mut self.state.servers[server];
        slot.busy = true;
        slot.busy_since = now;

        trace!(time = now, server = server_id, service_time, "service start");
        self.state.record(
            customer,
            EventType::ServiceStart,
            EventDetail {
                server_id: Some(server_id),
                wait_time: Some(wait_time),
                service_time: Some(service_time),
            },
        );
        self.pending.push(Reverse(ScheduledEvent::new(
            now + service_time,
            Event::ServiceComplete { server, customer },
        )));
    }

    fn complete_service(&mut self, server: usize, customer: usize) {
        let now = self.state.time;
        let server_id = self.state.servers[server].id;

        let record = &mut self.state.customers[customer];
        let started = record.service_start_time.unwrap_or(now);
        record.service_end_time = Some(now);
        let wait_time = started - record.arrival_time;
        let service_time = now - started;

        self.state.completed += 1;
        self.state.completed_wait_total += wait_time;
        trace!(time = now, server = server_id, "service end");
        self.state.record(
            customer,
            EventType::ServiceEnd,
            EventDetail {
                server_id: Some(server_id),
                wait_time: Some(wait_time),
                service_time: Some(service_time),
            },
        );
        self.state.record(
            customer,
            EventType::Departure,
            EventDetail {
                server_id: Some(server_id),
                ..EventDetail::default()
            },
        );

        let slot = &mut self.state.servers[server];
        slot.busy_time += now - slot.busy_since;
        slot.busy = false;

        if let Some(next) = self.state.wait_queue.pop_front() {
            self.start_service(next, server);
        }
    }

    fn snapshot(&self, status: ProgressStatus) -> ProgressSnapshot {
        let now = self.state.time;
        ProgressSnapshot {
            current_time: now,
            total_duration: self.params.duration,
            customers_processed: self.state.completed,
            current_queue_length: self.state.queue_length(),
            avg_wait_time: running_mean(self.state.completed_wait_total, self.state.completed),
            server_utilization: utilization(
                self.state.total_busy_time_at(now),
                self.state.servers.len(),
                now,
            ),
            status,
        }
    }

    /// Delivers one snapshot and reports whether the sink asked to stop.
    fn emit_progress(
        &self,
        sink: &mut Option<&mut dyn ProgressSink>,
        status: ProgressStatus,
    ) -> Result<bool> {
        let Some(sink) = sink.as_deref_mut() else {
            return Ok(false);
        };
        let snapshot = self.snapshot(status);
        debug!(
            time = snapshot.current_time,
            processed = snapshot.customers_processed,
            queue = snapshot.current_queue_length,
            "progress"
        );
        if let Err(err) = sink.report(&snapshot) {
            match self.options.sink_failure {
                SinkFailurePolicy::Continue => {
                    warn!(error = %err, "progress sink failed, continuing")
                }
                SinkFailurePolicy::Abort => {
                    return Err(match err {
                        Error::Streaming(_) => err,
                        other => Error::Streaming(other.to_string()),
                    })
                }
            }
        }
        Ok(sink.is_cancelled())
    }
}

pub fn run_to_completion(params: &SimulationParams, seed: u64) -> Result<SimulationResults> {
    SimulationEngine::new(params.clone(), seed).run()
}

pub fn run_with_progress(
    params: &SimulationParams,
    seed: u64,
    sink: &mut dyn ProgressSink,
) -> Result<SimulationResults> {
    SimulationEngine::new(params.clone(), seed).run_with_progress(sink)
}
