use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use railmadad::config::DEFAULT_LISTEN;
use railmadad::ui::{self, Backend};
use railmadad::{
    GatewayClient, ModelConfig, QueryGateway, ServerConfig, TravelAssistant, server,
};

type MainResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "railmadad")]
#[command(author, version, about = "AI travel assistant for Indian Railways", long_about = None)]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    model: ModelConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query gateway over HTTP.
    Serve {
        #[arg(long, env = "RAILMADAD_LISTEN", default_value = DEFAULT_LISTEN)]
        listen: String,
    },

    /// Open the chat panel in the terminal.
    Chat {
        /// Use a running gateway instead of calling the model in-process.
        #[arg(long, env = "RAILMADAD_SERVER")]
        remote: Option<String>,
    },

    /// Ask a single question and print the answer.
    Ask { query: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        // Log lines would tear the inline viewport.
        (Commands::Chat { .. }, false) => "warn",
        _ => "info",
    };
    init_tracing(default_level);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> MainResult<ExitCode> {
    match cli.command {
        Commands::Serve { listen } => {
            let gateway = local_gateway(cli.model)?;
            server::run(ServerConfig { listen }, gateway).await?;
        }
        Commands::Chat { remote } => {
            let backend = match remote {
                Some(url) => Backend::Remote(GatewayClient::new(&url)),
                None => Backend::Local(local_gateway(cli.model)?),
            };
            ui::run_tui(backend)?;
        }
        Commands::Ask { query } => {
            let gateway = local_gateway(cli.model)?;
            let result = gateway.handle(&query).await;
            if let Some(error) = result.error_text() {
                eprintln!("{error}");
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", result.message());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn local_gateway(config: ModelConfig) -> MainResult<Arc<QueryGateway>> {
    let assistant = TravelAssistant::new(config)?;
    Ok(Arc::new(QueryGateway::new(Arc::new(assistant))))
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
