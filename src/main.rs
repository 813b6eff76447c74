use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

use foody::constants;
use foody::llm_interaction::OpenAiChatClient;
use foody::web_server::{self, WebState};
use foody::{AppState, JsonFileStore, TimeApiDateResolver};

/// Serve the daily food picker page.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, env = "FOODY_HOST", default_value = "127.0.0.1", help = "Address to bind the web server to.")]
    host: IpAddr,
    #[arg(long, env = "FOODY_PORT", default_value_t = 8501, help = "Port for the web server.")]
    port: u16,
    #[arg(long, help = "Path of the JSON data file (defaults to FOODY_DATA_FILE or food_data.json).")]
    data_file: Option<String>,
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,foody=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let data_file = cli.data_file.unwrap_or_else(|| constants::DATA_FILE.clone());
    info!(%data_file, "Foody starting");

    let store = Arc::new(JsonFileStore::new(&data_file));
    let app = AppState::load(store).context(format!("Failed to load food data from {}", data_file))?;

    let state = WebState::new(
        app,
        Arc::new(TimeApiDateResolver::default()),
        Arc::new(OpenAiChatClient::from_env()),
        constants::TEMPLATES_DIR.as_str(),
    );
    let addr = SocketAddr::new(cli.host, cli.port);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        _ = &mut ctrl_c => {
            info!("Ctrl-C received, shutting down.");
        }
        res = web_server::start_web_server(addr, state, constants::STATIC_DIR.as_str()) => {
            if let Err(e) = res {
                error!("Web server failed: {:?}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
