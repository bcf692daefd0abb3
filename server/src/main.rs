use clap::Parser;
use log::{error, info};
use server::config::RoomConfig;
use server::network::NetworkServer;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, then runs the WebSocket server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Physics tick period in milliseconds
        #[clap(short, long, default_value = "50")]
        tick_ms: u64,
        /// Seconds a player may stay idle before their room is closed
        #[clap(short, long, default_value = "30")]
        inactivity_timeout_secs: u64,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = RoomConfig::default()
        .with_tick_period(Duration::from_millis(args.tick_ms.max(1)))
        .with_inactivity_timeout(Duration::from_secs(args.inactivity_timeout_secs));

    let address = format!("{}:{}", args.host, args.port);
    let server = NetworkServer::bind(&address, config).await?;

    info!(
        "Running at {:.1}Hz with a {:?} inactivity timeout",
        config.tick_rate(),
        config.inactivity_timeout
    );

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
