//! Command-line runner for bounded-pipe producer/consumer scenarios.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use parking_lot::Mutex;
use pipe::timeout_from_secs;
use pipe_scenarios::{
    verify_run, ArcStatsSink, ScenarioConfig, ScenarioKind, ScenarioRunner, ScenarioStats,
    StatsSink,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Text rendering helpers used by the CLI commands.
mod render {
    use pipe_scenarios::{CheckResult, ScenarioConfig, ScenarioRun, ScenarioStats};
    use std::fmt::Write;

    /// Format the outcome of one scenario run.
    pub fn report(
        config: &ScenarioConfig,
        run: &ScenarioRun,
        stats: &ScenarioStats,
        verdict: &CheckResult,
    ) -> String {
        let mut out = String::new();
        writeln!(
            out,
            "Scenario: {} capacity={} producers={} items={}",
            config.kind.name(),
            config.capacity,
            config.producers,
            config.expected_items()
        )
        .expect("write header");
        writeln!(
            out,
            "Pipe: produced={} consumed={} drained={} elapsed={}ms",
            stats.produced,
            stats.consumed,
            run.drained.len(),
            run.elapsed.as_millis()
        )
        .expect("write throughput");
        writeln!(
            out,
            "Waits: full={} produce_timeouts={} consume_timeouts={} max_depth={}",
            stats.full_waits, stats.produce_timeouts, stats.consume_timeouts, stats.max_depth
        )
        .expect("write waits");
        writeln!(
            out,
            "Close: {:?} rejected={} discarded={}",
            run.close_outcome, stats.rejected, run.pipe_metrics.discarded
        )
        .expect("write close");
        match verdict {
            Ok(()) => out.push_str("Result: PASS\n"),
            Err(reason) => writeln!(out, "Result: FAIL ({reason})").expect("write verdict"),
        }
        out
    }
}

/// Run producer/consumer workloads against a bounded pipe and verify them.
#[derive(Parser, Debug)]
#[command(author, version, about = "Exercise the bounded hand-off pipe", long_about = None)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. `debug` or `pipe=trace`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scenario and print its report.
    Run {
        #[arg(value_enum)]
        scenario: ScenarioArg,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Run every scenario with the same options.
    All {
        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    /// Unthrottled producers, one consumer.
    Flood,
    /// Producers push in bursts of `--burst-size`.
    Burst,
    /// Slow consumer forces producers to block.
    Backpressure,
    /// Graceful close while a slow consumer still has a backlog.
    GracefulDrain,
    /// Fill the pipe with no consumer, then close immediately.
    ImmediateClose,
}

#[derive(Args, Debug)]
struct RunOpts {
    /// Items pushed by each producer. The burst scenario needs a positive
    /// multiple of `--burst-size`.
    #[arg(long, default_value_t = 1024)]
    items: u32,
    /// Pipe capacity.
    #[arg(long, default_value_t = 16)]
    capacity: usize,
    /// Number of producer threads.
    #[arg(long, default_value_t = 1)]
    producers: u32,
    /// Items per burst for the burst scenario.
    #[arg(long, default_value_t = 32)]
    burst_size: u32,
    /// Per-call produce/consume timeout in (fractional) seconds.
    #[arg(long, default_value = "1", value_parser = parse_secs)]
    timeout: Duration,
    /// Grace window for the closing drain in (fractional) seconds.
    #[arg(long, default_value = "30", value_parser = parse_secs)]
    grace: Duration,
    /// Consumer delay per item in milliseconds for the slow-consumer scenarios.
    #[arg(long, default_value_t = 1)]
    consumer_delay_ms: u64,
}

impl RunOpts {
    fn config(&self, scenario: ScenarioArg) -> Result<ScenarioConfig> {
        let consumer_delay = Duration::from_millis(self.consumer_delay_ms);
        let kind = match scenario {
            ScenarioArg::Flood => ScenarioKind::Flood { items: self.items },
            ScenarioArg::Burst => {
                let burst_size = self.burst_size;
                ensure!(burst_size > 0, "--burst-size must be positive");
                ensure!(
                    self.items > 0 && self.items % burst_size == 0,
                    "--items {} is not a positive multiple of --burst-size {}",
                    self.items,
                    burst_size
                );
                ScenarioKind::Burst {
                    bursts: self.items / burst_size,
                    burst_size,
                }
            }
            ScenarioArg::Backpressure => ScenarioKind::Backpressure {
                items: self.items,
                consumer_delay,
            },
            ScenarioArg::GracefulDrain => ScenarioKind::GracefulDrain {
                items: self.items,
                consumer_delay,
            },
            ScenarioArg::ImmediateClose => ScenarioKind::ImmediateClose { items: self.items },
        };
        Ok(ScenarioConfig::new(kind)
            .capacity(self.capacity)
            .producers(self.producers)
            .timeout(self.timeout)
            .grace_window(self.grace))
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let configs: Vec<ScenarioConfig> = match &cli.command {
        Command::Run { scenario, opts } => vec![opts.config(*scenario)?],
        Command::All { opts } => ScenarioArg::value_variants()
            .iter()
            .map(|scenario| opts.config(*scenario))
            .collect::<Result<_>>()?,
    };

    let mut failed = 0usize;
    for config in configs {
        if !run_scenario(config)? {
            failed += 1;
        }
    }

    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed, "scenario verification failed");
        Ok(ExitCode::FAILURE)
    }
}

/// Runs and verifies one scenario, printing its report. Returns whether it passed.
fn run_scenario(config: ScenarioConfig) -> Result<bool> {
    let sink = ArcStatsSink::new(Arc::new(Mutex::new(ScenarioStats::default())));
    let runner = ScenarioRunner::new(config, sink.clone());
    let config = runner.config();
    let run = runner
        .run()
        .with_context(|| format!("scenario {} did not complete", config.kind.name()))?;
    let stats = sink.snapshot();
    let verdict = verify_run(config, &run, &stats);
    print!("{}", render::report(config, &run, &stats, &verdict));
    if verdict.is_ok() {
        info!(scenario = config.kind.name(), "scenario passed");
    }
    Ok(verdict.is_ok())
}

fn init_tracing(filter: Option<&str>) {
    let env_filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // Ignore error if already set (e.g., during tests).
    let _ = fmt().with_env_filter(env_filter).try_init();
}

fn parse_secs(input: &str) -> Result<Duration, String> {
    let secs = input
        .parse::<f64>()
        .map_err(|_| format!("invalid number of seconds '{input}'"))?;
    timeout_from_secs(secs).map_err(|err| err.to_string())
}
