use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use logtap_core::config::{Overrides, Settings};
use logtap_core::ConfigError;

const EXAMPLE: &str = "\
Example:
    logtap --app <your_app_name> --svc <your_service_name> --endpoint 127.0.0.1:4150";

#[derive(Parser)]
#[command(
    name = "logtap",
    version,
    about = "Publish stdin log lines to NSQ, wrapping non-JSON lines in an envelope",
    after_help = EXAMPLE
)]
struct Cli {
    /// NSQ endpoint, 'host:port'.
    #[arg(long)]
    endpoint: Option<String>,

    /// Topic for logging (defaults to 'log.raw#ephemeral'). Always forced to
    /// end with '#ephemeral'.
    #[arg(long)]
    topic: Option<String>,

    /// Name of the application.
    #[arg(long)]
    app: Option<String>,

    /// Name of the service.
    #[arg(long)]
    svc: Option<String>,

    /// Config file (defaults to $XDG_CONFIG_HOME/logtap/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Extra attempts for a failed publish (default 0: log and move on).
    #[arg(long, value_name = "N")]
    publish_retries: Option<u32>,

    /// Log debug diagnostics to stderr.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            topic: self.topic.clone(),
            endpoint: self.endpoint.clone(),
            app: self.app.clone(),
            svc: self.svc.clone(),
            retries: self.publish_retries,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())?;

    // Invalid input exits 0, matching the historical behaviour of the tool.
    let validated = match settings.validate() {
        Ok(validated) => validated,
        Err(e @ (ConfigError::InvalidEndpoint(_) | ConfigError::InvalidTopic(_))) => {
            eprintln!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let settings = validated.settings;

    if let Some(old) = validated.renamed_from {
        eprintln!("{old} has been renamed to {}", settings.topic);
    }
    eprintln!(
        "Producing logs to '{}' on '{}'",
        settings.topic, settings.endpoint
    );

    logtap::tap_stdin(&settings).await?;
    Ok(())
}
