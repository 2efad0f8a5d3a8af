use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use qosflow::{driver, report, Scenario};
use tracing_subscriber::EnvFilter;

/// Per-class throughput, delay and jitter report for a recorded flow monitor dump.
#[derive(Parser, Debug)]
#[command(name = "qosflow", version)]
struct Cli {
    /// JSON array of flows: `{ "id", "tuple", "record" }`
    flows: PathBuf,

    /// Scenario parameters as JSON; defaults apply to anything missing. Times are given in
    /// milliseconds (`sim_time_ms`, `calc_start_ms`), `offered_load` in Mb/s
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Print the scenario settings before the results
    #[arg(long)]
    settings: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => driver::read_scenario(path)
            .with_context(|| format!("reading scenario {}", path.display()))?,
        None => Scenario::default(),
    };
    let flows = driver::read_flows(&cli.flows)
        .with_context(|| format!("reading flows {}", cli.flows.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.settings {
        report::write_settings(&mut out, &scenario)?;
        writeln!(out)?;
    }
    driver::report(&scenario, &flows, &mut out)?;
    Ok(())
}
