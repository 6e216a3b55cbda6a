use anyhow::Result;
use clap::{Parser, Subcommand};
use lokiwatch::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lokiwatch",
    about = "Polling log-anomaly alerting for Loki-backed syslog pipelines",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the detection loop (poll Loki, score windows, emit alerts)
    Run {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run a single detection cycle and print the result
    Scan {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration and exit
    CheckConfig {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = Config::load(config.as_deref())?;
            tracing::info!(loki_url = %config.loki_url, "Starting lokiwatch daemon");
            lokiwatch::run(config).await?;
        }
        Commands::Scan { config, json } => {
            let config = Config::load(config.as_deref())?;
            let outcome = lokiwatch::scan(config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let m = &outcome.metrics;
                println!("\n=== lokiwatch window scan ===");
                println!("Lines:         {}", m.total);
                println!("Log rate:      {:.2}/min", m.log_rate);
                println!("Security rate: {:.2}/min", m.security_rate);
                println!("Error rate:    {:.2}/min", m.error_rate);
                match m.throughput_avg {
                    Some(avg) => println!("Throughput:    {avg:.2}"),
                    None => println!("Throughput:    no data"),
                }
                println!("Score:         {:.2}", outcome.score.score);
                println!("Reasons:       {:?}", outcome.score.reasons);
                println!("Alerted:       {}", outcome.alerted);
                println!("=============================\n");
            }
        }
        Commands::CheckConfig { config } => {
            let config = Config::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
