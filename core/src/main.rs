//! UKF: run the unscented Kalman filter over synthetic or recorded measurements.
//!
//! - `sine`: filter the noisy reference sine signal and report how much noise was removed.
//! - `filter`: filter a CSV file of measurements (one row per measurement).
//! - `defaults`: write the default filter configuration to a file.
//!
//! Filter settings come from a configuration file (`--config`, TOML/JSON/YAML) and can be
//! overridden per parameter on the command line.
use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use ukf::sim::{
    FilterRecord, SignalNoise, SignalRecord, SignalSummary, degrees_to_step,
    noisy_sine, read_measurements, run_filter, run_signal,
};
use ukf::{FilterConfig, UnscentedKalmanFilter};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about = "Unscented Kalman filter for noisy measurement streams.")]
struct Cli {
    /// Filter configuration file (TOML/JSON/YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ParameterArgs,

    #[command(subcommand)]
    command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log file path (if not specified, logs to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

/// Per-parameter overrides of the configuration file
#[derive(Args, Clone, Debug, Default)]
struct ParameterArgs {
    /// Sigma-point spread
    #[arg(long, global = true)]
    alpha: Option<f64>,
    /// Secondary scaling parameter
    #[arg(long, global = true)]
    ki: Option<f64>,
    /// Distribution prior (2 for Gaussian)
    #[arg(long, global = true)]
    beta: Option<f64>,
    /// Process-noise standard deviation
    #[arg(long, global = true)]
    q: Option<f64>,
    /// Measurement-noise standard deviation
    #[arg(long, global = true)]
    r: Option<f64>,
    /// State dimension (0 infers it from the first measurement)
    #[arg(long, global = true)]
    state_dimension: Option<usize>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Filter a synthetic noisy sine signal
    Sine(SineArgs),
    /// Filter a CSV file of measurements
    Filter(FilterArgs),
    /// Write the default configuration to a file
    Defaults {
        /// Output configuration file (.toml/.json/.yaml)
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Clone, Debug)]
struct SineArgs {
    /// Number of samples
    #[arg(long, default_value_t = 100)]
    samples: usize,
    /// Phase step between samples in degrees (converted with π ≈ 3.14)
    #[arg(long, default_value_t = 5.0)]
    step_degrees: f64,
    /// Lower bound of the uniform measurement noise
    #[arg(long, default_value_t = 0.0)]
    noise_low: f64,
    /// Upper bound of the uniform measurement noise
    #[arg(long, default_value_t = 0.5)]
    noise_high: f64,
    /// RNG seed for the noise (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Output CSV file for the per-sample results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct FilterArgs {
    /// Input CSV file, one measurement per row
    #[arg(short, long)]
    input: PathBuf,
    /// Output CSV file
    #[arg(short, long)]
    output: PathBuf,
    /// Treat the first row of the input as a header
    #[arg(long)]
    headers: bool,
}

/// Initialize the logger with the specified configuration.
///
/// # Arguments
/// * `log_level` - Log level string (off, error, warn, info, debug, trace)
/// * `log_file` - Optional path to log file (logs to stderr if None)
fn init_logger(log_level: &str, log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    use std::io::Write;

    let level = log_level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
        log::LevelFilter::Info
    });

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    });

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let target = Box::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?,
        );
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.try_init()?;
    Ok(())
}

/// Load the configuration file (or the defaults) and apply the command line overrides.
fn load_config(path: Option<&PathBuf>, overrides: &ParameterArgs) -> Result<FilterConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => {
            info!("Loading filter configuration from {}", path.display());
            FilterConfig::from_file(path)?
        }
        None => FilterConfig::default(),
    };
    let mut params = config.parameters;
    if let Some(alpha) = overrides.alpha {
        params = params.with_alpha(alpha);
    }
    if let Some(ki) = overrides.ki {
        params = params.with_ki(ki);
    }
    if let Some(beta) = overrides.beta {
        params = params.with_beta(beta);
    }
    if let Some(q) = overrides.q {
        params = params.with_q(q);
    }
    if let Some(r) = overrides.r {
        params = params.with_r(r);
    }
    config.parameters = params;
    if let Some(state_dimension) = overrides.state_dimension {
        config.state_dimension = state_dimension;
    }
    Ok(config)
}

fn build_filter(config: &FilterConfig) -> Result<UnscentedKalmanFilter, Box<dyn Error>> {
    let filter = UnscentedKalmanFilter::new(config.state_dimension, config.parameters)?
        .with_initial_state(config.initial_state.clone());
    info!(
        "Initialized UKF: state dimension {}, {:?}",
        config.state_dimension, config.parameters
    );
    Ok(filter)
}

fn run_sine(args: &SineArgs, config: &FilterConfig) -> Result<(), Box<dyn Error>> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let noise = SignalNoise::Uniform {
        low: args.noise_low,
        high: args.noise_high,
    };
    let signal = noisy_sine(args.samples, degrees_to_step(args.step_degrees), noise, &mut rng)?;
    let mut filter = build_filter(config)?;
    let records = run_signal(&mut filter, &signal)?;
    let summary = SignalSummary::from_records(&records);
    info!(
        "Mean absolute error vs. truth: measurements {:.4}, estimates {:.4}",
        summary.measurement_mae, summary.estimate_mae
    );
    info!(
        "Total variation: measurements {:.4}, estimates {:.4}",
        summary.measurement_variation, summary.estimate_variation
    );
    info!("Final state variance: {:.6}", summary.final_variance);
    if let Some(output) = &args.output {
        SignalRecord::to_csv(&records, output)?;
        info!("Results written to {}", output.display());
    }
    Ok(())
}

fn run_file(args: &FilterArgs, config: &FilterConfig) -> Result<(), Box<dyn Error>> {
    info!("Processing file: {}", args.input.display());
    let measurements = read_measurements(&args.input, args.headers)?;
    if measurements.is_empty() {
        warn!("No measurements found in {}", args.input.display());
    }
    let mut filter = build_filter(config)?;
    let records = run_filter(&mut filter, &measurements)?;
    info!("Filtered {} measurements", records.len());
    FilterRecord::to_csv(&records, &args.output)?;
    info!("Results written to {}", args.output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(&cli.log_level, cli.log_file.as_ref())?;

    let config = load_config(cli.config.as_ref(), &cli.overrides)?;
    match cli.command {
        Command::Sine(args) => run_sine(&args, &config),
        Command::Filter(args) => run_file(&args, &config),
        Command::Defaults { output } => {
            config.to_file(&output)?;
            info!("Configuration written to {}", output.display());
            Ok(())
        }
    }
}
