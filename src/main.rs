use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use vr_engine::api::{AppState, create_router};
use vr_engine::calculation::run_calculation;
use vr_engine::config::{ConfigLoader, EngineConfig};
use vr_engine::ingest::DatasetLoader;
use vr_engine::models::ReferenceMonth;
use vr_engine::report::{build_report, template_columns, write_report};

#[derive(Parser)]
#[command(name = "vr-engine")]
#[command(about = "Monthly meal-voucher benefit calculation", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the month's benefits and write the supplier report
    Run(RunArgs),
    /// Serve POST /calculate over HTTP
    Serve {
        /// Configuration directory
        #[arg(short, long, default_value = "config/default")]
        config: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Configuration directory
    #[arg(short, long, default_value = "config/default")]
    config: PathBuf,

    /// Reference month (1-12)
    #[arg(short, long)]
    month: u32,

    /// Reference year
    #[arg(short, long)]
    year: i32,

    /// Directory holding the input tables (defaults to the configured input_dir)
    #[arg(short, long, conflicts_with = "archive")]
    input: Option<PathBuf>,

    /// Zip archive holding the input tables
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Report path, .xlsx or .csv (defaults to the configured output_file)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn load_config(dir: &Path) -> Result<EngineConfig> {
    let loader = ConfigLoader::load(dir)
        .with_context(|| format!("Failed to load configuration from {}", dir.display()))?;
    info!(config = %dir.display(), name = %loader.settings().name, "Configuration loaded");
    Ok(loader.into_config())
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let reference = ReferenceMonth::new(args.month, args.year)?;
    let loader = DatasetLoader::new(&config);

    let dataset = match &args.archive {
        Some(archive) => loader
            .load_archive(archive)
            .with_context(|| format!("Failed to read archive {}", archive.display()))?,
        None => {
            let dir = args
                .input
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.sources().input_dir));
            loader
                .load_dir(&dir)
                .with_context(|| format!("Failed to read input directory {}", dir.display()))?
        }
    };

    let run = run_calculation(&dataset, &config, reference)?;
    for warning in &run.warnings {
        debug!(
            code = %warning.code,
            employee_id = ?warning.employee_id,
            "{}",
            warning.message
        );
    }
    if !run.warnings.is_empty() {
        warn!(count = run.warnings.len(), "Run finished with data warnings");
    }

    let columns = template_columns(&dataset, config.report());
    let report = build_report(&run, &columns, &config.report().mapping);
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.sources().output_file));
    write_report(&report, &output)?;

    info!(
        competence = %run.reference.competence(),
        employees = run.totals.employees,
        excluded = run.totals.excluded,
        total_value = %run.totals.total_value,
        employer_cost = %run.totals.employer_cost,
        employee_cost = %run.totals.employee_cost,
        output = %output.display(),
        "Benefit run written"
    );
    Ok(())
}

async fn serve(config_dir: &Path, addr: SocketAddr) -> Result<()> {
    let config = load_config(config_dir)?;
    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("vr-engine started with verbosity level: {}", cli.verbose);

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Serve { config, addr } => serve(&config, addr).await,
    }
}
