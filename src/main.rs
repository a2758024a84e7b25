use buzztail::config::resolve_config_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "buzztail")]
#[command(about = "Synthetic message producer and live-tailing analytics consumer", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Append generated messages to the shared file
    Produce,
    /// Follow the shared file and report message rate and alerts
    Consume,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buzztail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Some(Commands::Consume) | None => buzztail::cli::run::consume(config_path.as_deref())
            .await
            .map(|_| ())
            .map_err(Into::into),
        Some(Commands::Produce) => buzztail::cli::run::produce(config_path.as_deref())
            .await
            .map(|_| ())
            .map_err(Into::into),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => buzztail::cli::config::init(stdout),
        },
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
