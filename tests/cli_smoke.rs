use predicates::prelude::*;
use predicates::str::{contains, diff, starts_with};

fn run_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "run",
        "--arrival-rate",
        "5",
        "--service-rate",
        "6",
        "--servers",
        "3",
        "--duration",
        "60",
        "--seed",
        "42",
    ];
    args.extend_from_slice(extra);
    args
}

#[test]
fn summary_lists_parameters_and_statistics() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim");
    cmd.args(run_args(&["--format", "summary"]));
    cmd.assert()
        .success()
        .stdout(starts_with(concat!(
            "Parameters:\n",
            "arrival_rate: 5\n",
            "service_rate: 6\n",
            "num_servers: 3\n",
            "duration: 60\n",
            "seed: 42\n",
            "traffic_intensity: 0.2778\n",
            "Summary:\n",
            "total_customers: ",
        )))
        .stdout(contains("server_utilization: "))
        .stdout(contains("Events:").not());
}

#[test]
fn human_output_lists_events() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim");
    cmd.args(run_args(&[]));
    cmd.assert()
        .success()
        .stdout(contains("Events:\n"))
        .stdout(contains(" customer 1 arrival queue=0\n"))
        .stdout(contains(" customer 1 service_start server=1 queue=0 wait=0.0000"));
}

#[test]
fn same_seed_prints_identical_output() {
    let first = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim")
        .args(run_args(&["--format", "json"]))
        .output()
        .expect("command should run");
    assert!(first.status.success());
    let expected = String::from_utf8(first.stdout).expect("utf8 output");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim");
    cmd.args(run_args(&["--format", "json"]));
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn json_output_is_machine_readable() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim")
        .args(run_args(&["--format", "json"]))
        .output()
        .expect("command should run");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(value["seed"], 42);
    assert_eq!(value["params"]["num_servers"], 3);
    let results = &value["results"];
    let utilization = results["serverUtilization"]
        .as_f64()
        .expect("utilization is a number");
    assert!((0.0..=1.0).contains(&utilization));
    let events = results["events"].as_array().expect("events array");
    assert!(!events.is_empty());
    assert_eq!(events[0]["eventType"], "arrival");
    assert_eq!(events[0]["customerId"], 1);
}

#[test]
fn progress_streams_start_progress_and_complete_frames() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("mmc-sim")
        .args(run_args(&["--progress"]))
        .output()
        .expect("command should run");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 output");

    let events: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect();
    assert_eq!(events.first(), Some(&"start"));
    assert_eq!(events.last(), Some(&"complete"));
    assert!(events[1..events.len() - 1]
        .iter()
        .all(|event| *event == "progress"));

    let snapshots: Vec<serde_json::Value> = text
        .split("\n\n")
        .filter(|frame| frame.starts_with("event: progress\n"))
        .filter_map(|frame| frame.lines().nth(1))
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("progress data is json"))
        .collect();
    let last = snapshots.last().expect("at least one snapshot");
    assert_eq!(last["status"], "completed");
    assert_eq!(last["currentTime"], 60.0);
    assert_eq!(snapshots[0]["currentTime"], 0.0);
}
