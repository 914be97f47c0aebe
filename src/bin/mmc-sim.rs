use std::io;

use mmc_sim::config::{self, Command, FormatArg, ParamArgs, RunArgs};
use mmc_sim::engine::{RunOptions, SimulationEngine};
use mmc_sim::error::Result;
use mmc_sim::logging;
use mmc_sim::output::{
    EventStreamSink, Formatter, HumanFormatter, JsonFormatter, RunReport, SummaryFormatter,
};
use mmc_sim::progress::SinkFailurePolicy;
use serde_json::json;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = config::parse_args()?;
    logging::init_logging(&cli.log_level);
    match cli.command {
        Command::Run(args) => run_simulation(&args),
        Command::ShowConfig(args) => show_config(&args),
    }
}

fn run_simulation(args: &RunArgs) -> Result<()> {
    let (params, seed) = config::resolve_params(&args.params)?;
    let options = RunOptions {
        sink_failure: if args.strict_progress {
            SinkFailurePolicy::Abort
        } else {
            SinkFailurePolicy::Continue
        },
    };
    let engine = SimulationEngine::new(params.clone(), seed).with_options(options);

    if args.progress {
        let mut sink = EventStreamSink::new(io::stdout().lock());
        sink.send("start", &json!({ "params": &params, "seed": seed }))?;
        return match engine.run_with_progress(&mut sink) {
            Ok(results) => sink.send("complete", &results),
            Err(err) => {
                let _ = sink.send_error(&err);
                Err(err)
            }
        };
    }

    let results = engine.run()?;
    let report = RunReport {
        params: &params,
        seed,
        results: &results,
    };
    print!("{}", formatter_for(&args.format).write(&report));
    Ok(())
}

fn show_config(args: &ParamArgs) -> Result<()> {
    let (params, seed) = config::resolve_params(args)?;
    println!("Arrival rate: {}/min", params.arrival_rate);
    println!("Service rate: {}/min per server", params.service_rate);
    println!("Servers: {}", params.num_servers);
    println!("Duration: {} min", params.duration);
    println!("Seed: {}", seed);
    println!("Traffic intensity: {:.4}", params.traffic_intensity());
    Ok(())
}

fn formatter_for(format: &FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
