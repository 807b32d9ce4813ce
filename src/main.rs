use cf_driver::commands::Operation;
use cf_driver::error::{AppError, EXIT_CONFIG_FAILURE};
use cf_driver::infrastructure::config::{Config, LogFormat};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cf-driver")]
#[command(about = "Cloud Foundry application driver", long_about = None)]
struct Args {
    #[command(subcommand)]
    operation: Operation,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", AppError::from(e));
            std::process::exit(EXIT_CONFIG_FAILURE);
        }
    };

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting...");

    let mut stdout = std::io::stdout();
    let exit_code = match cf_driver::app::run(&config, args.operation, &mut stdout).await {
        Ok(()) => 0,
        Err(e) => e.report(),
    };

    std::process::exit(exit_code);
}

fn init_logging(config: &Config) {
    let default_filter = if config.is_development() {
        "cf_driver=debug"
    } else {
        "cf_driver=info"
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
