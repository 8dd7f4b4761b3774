//! Grove CLI: simulation, benchmarking and output inspection.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "grove")]
#[command(version, about = "Grove: material point method solvers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario from a config file.
    Simulate {
        /// Path to scenario config (TOML).
        #[arg(short, long, default_value = "simulation.toml")]
        config: String,

        /// Log every step event through tracing.
        #[arg(long)]
        events: bool,
    },

    /// Run benchmark scenarios.
    Benchmark {
        /// Which scenario to run (elastic_impact, cantilever_beam, vortex, colliding_disks, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Grid refinement factor.
        #[arg(short, long, default_value_t = 1.0)]
        resolution: f64,

        /// Stop each scenario after this many steps.
        #[arg(long)]
        max_steps: Option<u64>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Summarize an exported frame file.
    Inspect {
        /// Path to a JSON frame file.
        path: String,
    },

    /// Validate a scenario config or a frame file.
    Validate {
        /// Path to a `.toml` config or `.json` frame file.
        path: String,
    },

    /// List the material presets.
    Materials,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate { config, events } => commands::simulate(&config, events),
        Commands::Benchmark {
            scenario,
            resolution,
            max_steps,
            output,
        } => commands::benchmark(&scenario, resolution, max_steps, output.as_deref()),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Materials => commands::materials(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
