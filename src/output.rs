use std::fmt::Write as _;
use std::io::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::SimulationParams;
use crate::progress::{ProgressSink, ProgressSnapshot, ProgressStatus};
use crate::stats::SimulationResults;

/// A finished run together with the inputs that produced it.
pub struct RunReport<'a> {
    pub params: &'a SimulationParams,
    pub seed: u64,
    pub results: &'a SimulationResults,
}

pub trait Formatter {
    fn write(&self, report: &RunReport) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for SummaryFormatter {
    fn write(&self, report: &RunReport) -> String {
        let mut output = String::new();
        write_parameters(&mut output, report);
        write_summary(&mut output, report.results);
        output
    }
}

impl Formatter for HumanFormatter {
    fn write(&self, report: &RunReport) -> String {
        let mut output = String::new();
        write_parameters(&mut output, report);
        let _ = writeln!(output, "Events:");
        for event in &report.results.events {
            let _ = write!(
                output,
                "{:>10.4} customer {} {}",
                event.event_time, event.customer_id, event.event_type
            );
            if let Some(server_id) = event.server_id {
                let _ = write!(output, " server={}", server_id);
            }
            let _ = write!(output, " queue={}", event.queue_length);
            if let Some(wait_time) = event.wait_time {
                let _ = write!(output, " wait={:.4}", wait_time);
            }
            if let Some(service_time) = event.service_time {
                let _ = write!(output, " service={:.4}", service_time);
            }
            output.push('\n');
        }
        write_summary(&mut output, report.results);
        output
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, report: &RunReport) -> String {
        let body = serde_json::json!({
            "params": report.params,
            "seed": report.seed,
            "results": report.results,
        });
        match serde_json::to_string_pretty(&body) {
            Ok(mut json) => {
                json.push('\n');
                json
            }
            Err(err) => format!("{{\"error\":\"{}\"}}\n", err),
        }
    }
}

fn write_parameters(output: &mut String, report: &RunReport) {
    let params = report.params;
    let _ = writeln!(output, "Parameters:");
    let _ = writeln!(output, "arrival_rate: {}", params.arrival_rate);
    let _ = writeln!(output, "service_rate: {}", params.service_rate);
    let _ = writeln!(output, "num_servers: {}", params.num_servers);
    let _ = writeln!(output, "duration: {}", params.duration);
    let _ = writeln!(output, "seed: {}", report.seed);
    let _ = writeln!(
        output,
        "traffic_intensity: {:.4}",
        params.traffic_intensity()
    );
}

fn write_summary(output: &mut String, results: &SimulationResults) {
    let _ = writeln!(output, "Summary:");
    let _ = writeln!(output, "total_customers: {}", results.total_customers);
    let _ = writeln!(output, "avg_wait_time: {:.4}", results.avg_wait_time);
    let _ = writeln!(output, "avg_queue_length: {:.4}", results.avg_queue_length);
    let _ = writeln!(output, "max_queue_length: {}", results.max_queue_length);
    let _ = writeln!(
        output,
        "server_utilization: {:.2}%",
        results.server_utilization * 100.0
    );
    let _ = writeln!(output, "events: {}", results.events.len());
    if results.cancelled {
        let _ = writeln!(output, "cancelled at: {:.4}", results.end_time);
    }
}

/// Renders snapshots as server-sent-event frames on any writer.
///
/// Each frame is flushed before `report` returns, so a slow reader holds the
/// engine back instead of letting frames pile up.
pub struct EventStreamSink<W> {
    writer: W,
}

impl<W: Write> EventStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn send<T: Serialize>(&mut self, event: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string(data).map_err(|err| Error::Streaming(err.to_string()))?;
        write!(self.writer, "event: {}\ndata: {}\n\n", event, json)
            .and_then(|_| self.writer.flush())
            .map_err(|err| Error::Streaming(err.to_string()))
    }

    /// Final frame for a run that stopped with an error.
    pub fn send_error(&mut self, err: &Error) -> Result<()> {
        self.send(
            "error",
            &serde_json::json!({
                "status": ProgressStatus::Error,
                "error": err.to_string(),
            }),
        )
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for EventStreamSink<W> {
    fn report(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.send("progress", snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventType, QueueEvent};
    use std::io;

    fn sample_results() -> SimulationResults {
        SimulationResults {
            total_customers: 1,
            avg_wait_time: 0.0,
            avg_queue_length: 0.0,
            max_queue_length: 0,
            server_utilization: 0.5,
            end_time: 10.0,
            cancelled: false,
            events: vec![QueueEvent {
                customer_id: 1,
                event_type: EventType::ServiceStart,
                event_time: 1.25,
                server_id: Some(1),
                queue_length: 0,
                wait_time: Some(0.0),
                service_time: Some(5.0),
            }],
        }
    }

    #[test]
    fn summary_lists_parameters_and_statistics() {
        let params = SimulationParams::new(5.0, 6.0, 3, 60.0);
        let results = sample_results();
        let report = RunReport {
            params: &params,
            seed: 42,
            results: &results,
        };
        let expected = concat!(
            "Parameters:\n",
            "arrival_rate: 5\n",
            "service_rate: 6\n",
            "num_servers: 3\n",
            "duration: 60\n",
            "seed: 42\n",
            "traffic_intensity: 0.2778\n",
            "Summary:\n",
            "total_customers: 1\n",
            "avg_wait_time: 0.0000\n",
            "avg_queue_length: 0.0000\n",
            "max_queue_length: 0\n",
            "server_utilization: 50.00%\n",
            "events: 1\n",
        );
        assert_eq!(SummaryFormatter.write(&report), expected);
    }

    #[test]
    fn human_output_lists_events() {
        let params = SimulationParams::new(5.0, 6.0, 3, 60.0);
        let results = sample_results();
        let report = RunReport {
            params: &params,
            seed: 0,
            results: &results,
        };
        let output = HumanFormatter.write(&report);
        assert!(output.contains(
            "    1.2500 customer 1 service_start server=1 queue=0 wait=0.0000 service=5.0000\n"
        ));
    }

    #[test]
    fn json_output_parses() {
        let params = SimulationParams::new(5.0, 6.0, 3, 60.0);
        let results = sample_results();
        let report = RunReport {
            params: &params,
            seed: 7,
            results: &results,
        };
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.write(&report)).expect("valid json");
        assert_eq!(value["seed"], 7);
        assert_eq!(value["params"]["num_servers"], 3);
        assert_eq!(value["results"]["serverUtilization"], 0.5);
        assert_eq!(value["results"]["events"][0]["eventType"], "service_start");
    }

    #[test]
    fn event_stream_frames_progress() {
        let mut sink = EventStreamSink::new(Vec::new());
        let snapshot = ProgressSnapshot {
            current_time: 0.0,
            total_duration: 60.0,
            customers_processed: 0,
            current_queue_length: 0,
            avg_wait_time: 0.0,
            server_utilization: 0.0,
            status: ProgressStatus::Running,
        };
        sink.report(&snapshot).expect("vec writer never fails");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert!(text.starts_with("event: progress\ndata: {"));
        assert!(text.contains("\"status\":\"running\""));
        assert!(text.ends_with("}\n\n"));
    }

    #[test]
    fn error_frame_carries_error_status() {
        let mut sink = EventStreamSink::new(Vec::new());
        let err = Error::Streaming("sink unavailable".to_string());
        sink.send_error(&err).expect("vec writer never fails");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert!(text.starts_with("event: error\ndata: {"));
        let data = text
            .trim_end()
            .strip_prefix("event: error\ndata: ")
            .expect("data line");
        let frame: serde_json::Value = serde_json::from_str(data).expect("frame is json");
        assert_eq!(frame["status"], "error");
        assert_eq!(frame["error"], "progress stream failed: sink unavailable");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_a_streaming_error() {
        let mut sink = EventStreamSink::new(BrokenPipe);
        let err = sink.send("start", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, Error::Streaming(_)));
    }
}
