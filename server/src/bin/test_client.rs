use clap::Parser;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use shared::ServerMessage;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tokio_tungstenite::tungstenite::Message;

/// Headless client: holds the throttle for both local players and prints
/// what the server reports back.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// WebSocket URL of the race server
    #[clap(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
    /// How long to keep both throttles held
    #[clap(short, long, default_value = "5")]
    seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (websocket, _) = tokio_tungstenite::connect_async(args.url.as_str()).await?;
    let (mut sink, mut frames) = websocket.split();

    let input = json!({"type": "input", "input": {"w": true, "up": true}}).to_string();
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut send_timer = interval(Duration::from_millis(50));
    let mut snapshots = 0u64;

    while Instant::now() < deadline {
        tokio::select! {
            _ = send_timer.tick() => {
                sink.send(Message::Text(input.clone())).await?;
            }
            frame = frames.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        println!("Server closed the connection");
                        return Ok(());
                    }
                };

                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::Connected { player_id, room_id, mode }) => {
                        println!("Connected as {} to room {} ({} mode)", player_id, room_id, mode);
                    }
                    Ok(ServerMessage::GameState { players, winner, .. }) => {
                        snapshots += 1;
                        // Roughly once a second at the default tick rate
                        if snapshots % 20 == 0 {
                            for player in &players {
                                println!(
                                    "player {}: ({:.1}, {:.1}) speed {:.2} checkpoint {}",
                                    player.id, player.x, player.y, player.speed, player.checkpoint
                                );
                            }
                        }
                        if !winner.is_empty() {
                            println!("Winner: {}", winner);
                        }
                    }
                    Err(e) => println!("Unrecognized message: {}", e),
                }
            }
        }
    }

    sink.send(Message::Close(None)).await?;
    println!("Received {} snapshots", snapshots);
    Ok(())
}
