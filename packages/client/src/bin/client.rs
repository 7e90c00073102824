//! Terminal chat client.
//!
//! Lists the user's channels, opens one over WebSocket, and relays
//! messages from stdin. Reconnects with backoff when the connection
//! drops.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin simplechat -- --username alice --user-id u-1
//! cargo run --bin simplechat -- -n bob -i u-2 -c general
//! ```

use std::sync::Arc;

use clap::Parser;
use url::Url;

use simplechat_client::app::controller::ChatController;
use simplechat_client::app::notify::TerminalNotifier;
use simplechat_client::app::runner;
use simplechat_client::connection::reconnect::ReconnectPolicy;
use simplechat_client::connection::transport::WsConnector;
use simplechat_client::directory::HttpChannelDirectory;
use simplechat_client::session::Session;
use simplechat_shared::logger::setup_logger;
use simplechat_shared::time::SystemClock;

#[derive(Parser, Debug)]
#[command(name = "simplechat")]
#[command(about = "Terminal chat client with channels and live messaging", long_about = None)]
struct Args {
    /// Display name carried on messages and the WebSocket handshake
    #[arg(short = 'n', long)]
    username: String,

    /// Server-side user id
    #[arg(short = 'i', long)]
    user_id: String,

    /// Base URL of the channel directory API
    #[arg(long, default_value = "http://127.0.0.1:8888/api")]
    api_url: String,

    /// Base URL of the chat WebSocket endpoint
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws/chat")]
    ws_url: String,

    /// Bearer token for the directory API
    #[arg(long)]
    token: Option<String>,

    /// Channel to open on startup
    #[arg(short = 'c', long)]
    channel: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let ws_base = match Url::parse(&args.ws_url) {
        Ok(url) => url,
        Err(error) => {
            tracing::error!("invalid --ws-url '{}': {}", args.ws_url, error);
            std::process::exit(1);
        }
    };
    let api_base = match Url::parse(&args.api_url) {
        Ok(url) => url,
        Err(error) => {
            tracing::error!("invalid --api-url '{}': {}", args.api_url, error);
            std::process::exit(1);
        }
    };
    let directory = Arc::new(HttpChannelDirectory::new(api_base, args.token.clone()));

    let session = Session::new(args.user_id, args.username, args.token);
    let controller = ChatController::new(
        session,
        ws_base,
        directory,
        Arc::new(WsConnector),
        Arc::new(TerminalNotifier),
        Arc::new(SystemClock),
    );

    if let Err(error) = runner::run(controller, ReconnectPolicy::default(), args.channel).await {
        tracing::error!("client error: {}", error);
        std::process::exit(1);
    }
}
