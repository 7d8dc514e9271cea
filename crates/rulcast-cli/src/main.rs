//! CLI for rulcast — health-score and RUL estimation for equipment telemetry.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rulcast")]
#[command(about = "rulcast — component health scoring and remaining-useful-life estimation")]
#[command(version = rulcast_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the smoothed health-score series for a request file
    Score {
        /// Request JSON file (unit_model, component, vhms, optional pap)
        #[arg(long)]
        input: String,

        /// Directory of model artifact manifests
        #[arg(long, default_value = "model")]
        models: String,

        /// Write the response JSON to a file instead of stdout
        #[arg(long)]
        output: Option<String>,

        /// Lab-sample match window in days
        #[arg(long, default_value = "30")]
        time_window: i64,

        /// Health-score smoothing window (odd)
        #[arg(long, default_value = "7")]
        smooth_window: usize,
    },

    /// Health-score series plus per-unit RUL predictions
    Rul {
        /// Request JSON file (unit_model, component, vhms, optional pap)
        #[arg(long)]
        input: String,

        /// Directory of model artifact manifests
        #[arg(long, default_value = "model")]
        models: String,

        /// Write the response JSON to a file instead of stdout
        #[arg(long)]
        output: Option<String>,

        /// Lab-sample match window in days
        #[arg(long, default_value = "30")]
        time_window: i64,

        /// Health-score smoothing window (odd)
        #[arg(long, default_value = "7")]
        smooth_window: usize,

        /// Operating hours of history required for a prediction
        #[arg(long, default_value = "4000")]
        required_trend_hour: u32,

        /// Health score treated as the failure threshold
        #[arg(long, default_value = "50.0")]
        failure_threshold: f64,
    },

    /// List resolvable model bundles in an artifact directory
    Models {
        /// Directory of model artifact manifests
        #[arg(long, default_value = "model")]
        dir: String,
    },

    /// Start the HTTP scoring server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory of model artifact manifests
        #[arg(long, default_value = "model")]
        models: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            input,
            models,
            output,
            time_window,
            smooth_window,
        } => commands::score::run(
            &input,
            &models,
            output.as_deref(),
            commands::base_config(time_window, smooth_window),
        ),
        Commands::Rul {
            input,
            models,
            output,
            time_window,
            smooth_window,
            required_trend_hour,
            failure_threshold,
        } => {
            let mut config = commands::base_config(time_window, smooth_window);
            config.required_trend_hour = required_trend_hour;
            config.failure_threshold = failure_threshold;
            commands::rul::run(&input, &models, output.as_deref(), config)
        }
        Commands::Models { dir } => commands::models::run(&dir),
        Commands::Serve { port, host, models } => commands::serve::run(&host, port, &models),
    }
}
