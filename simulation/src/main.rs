//! HERA simulator command line

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use hera_logging::{HeraSubscriberBuilder, LogConfig};
use hera_sim::{scenarios, write_omega_csv, SimReport, SimSettings, World};

#[derive(Parser)]
#[command(
    name = "hera-sim",
    about = "Delay-tolerant network simulation with HERA routing",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write JSONL logs to this directory instead of the console
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario from a settings file
    Run {
        /// TOML settings file
        #[arg(short, long)]
        settings: PathBuf,

        /// Connection trace overriding the settings file
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write omega samples to this CSV file
        #[arg(long)]
        omega_csv: Option<PathBuf>,
    },

    /// Walk through the three-node worked example
    WorkedExample,

    /// Run a seeded random scenario with default router parameters
    Random {
        /// Number of nodes
        #[arg(short, long, default_value = "20")]
        nodes: u32,

        /// Simulated seconds
        #[arg(short, long, default_value = "43200")]
        duration: f64,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn log_config(verbose: bool, log_dir: Option<PathBuf>) -> LogConfig {
    let mut config = match log_dir {
        Some(dir) => LogConfig::batch(dir),
        None => LogConfig {
            default_level: "warn".to_string(),
            ..LogConfig::development()
        },
    };
    if verbose {
        config.default_level = "debug".to_string();
    }
    config
}

fn print_report(report: &SimReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
        println!("\n=== Routing Info ===");
        print!("{}", report.routing_dump());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _log_guard = HeraSubscriberBuilder::new()
        .with_config(log_config(cli.verbose, cli.log_dir))
        .init();

    match cli.command {
        Commands::Run {
            settings,
            trace,
            json,
            omega_csv,
        } => {
            let mut settings = SimSettings::load(&settings)
                .with_context(|| format!("loading {}", settings.display()))?;
            if trace.is_some() {
                settings.scenario.trace_file = trace;
            }
            // Sampling is needed for the CSV even if the settings don't ask for it
            if omega_csv.is_some() && settings.report.omega_sample_interval.is_none() {
                settings.report.omega_sample_interval = settings.router.seconds_in_time_unit;
            }

            let mut world = World::from_settings(settings)?;
            let report = world.run();

            if let Some(path) = omega_csv {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_omega_csv(&report.omega_samples, BufWriter::new(file))?;
                eprintln!("Wrote {} omega samples to {}", report.omega_samples.len(), path.display());
            }
            print_report(&report, json)?;
        }
        Commands::WorkedExample => {
            let example = scenarios::run_worked_example()?;
            println!("\nomega_A(C) = {:.6}", example.omega_a_c);
        }
        Commands::Random {
            nodes,
            duration,
            seed,
            json,
        } => {
            let report = scenarios::run_random(nodes, duration, seed)?;
            print_report(&report, json)?;
        }
    }

    Ok(())
}
