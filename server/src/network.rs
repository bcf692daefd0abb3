//! WebSocket adapter between browser clients and rooms
//!
//! Each accepted connection is a local two-player session: both players sit
//! at the same keyboard and share the socket. The connection gets its own
//! room, a writer task that drains the room's outbound queue, and a read
//! loop that routes every input message through both players' key mappings.
//!
//! Keep-alive follows the usual ping/pong scheme: the writer pings every
//! [`PING_PERIOD`], and the reader gives up if no frame of any kind arrives
//! within [`PONG_WAIT`].

use crate::config::RoomConfig;
use crate::input::InputRouter;
use crate::room::Room;
use crate::setup::RaceSetup;
use crate::transport::{ChannelTransport, Outbound, Transport};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub const PING_PERIOD: Duration = Duration::from_secs(30);
pub const PONG_WAIT: Duration = Duration::from_secs(60);
pub const WRITE_WAIT: Duration = Duration::from_secs(10);

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Accepts WebSocket connections and runs one local race per connection
pub struct NetworkServer {
    listener: TcpListener,
    config: RoomConfig,
    next_connection_id: AtomicU32,
}

impl NetworkServer {
    pub async fn bind(addr: &str, config: RoomConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            config,
            next_connection_id: AtomicU32::new(1),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the listener fails for good.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let connection_id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
                    let config = self.config;

                    tokio::spawn(async move {
                        if let Err(e) = handle_local_game(stream, addr, connection_id, config).await
                        {
                            warn!(
                                "Connection {} from {} ended with error: {}",
                                connection_id, addr, e
                            );
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

pub fn generate_room_id() -> String {
    format!("local-{:08x}", rand::random::<u32>())
}

async fn handle_local_game(
    stream: TcpStream,
    addr: SocketAddr,
    connection_id: u32,
    config: RoomConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let websocket = tokio_tungstenite::accept_async(stream).await?;
    info!("Client {} connected from {}", connection_id, addr);

    let (sink, mut frames) = websocket.split();
    let (sender, outbound) = mpsc::unbounded_channel();
    let transport = Arc::new(ChannelTransport::new(connection_id, sender));
    let writer = tokio::spawn(run_writer(sink, outbound, connection_id));

    // The ack goes out before the room exists so it precedes every snapshot.
    let room_id = generate_room_id();
    let ack = ServerMessage::Connected {
        player_id: "local".to_string(),
        room_id: room_id.clone(),
        mode: "local".to_string(),
    };
    transport.send(&serde_json::to_string(&ack)?)?;

    let (room, routers) = RaceSetup::local(room_id, config)
        .initialize(transport.clone())
        .await;
    info!("Local multiplayer game started in room {}", room.id());

    loop {
        let frame = match timeout(PONG_WAIT, frames.next()).await {
            Err(_) => {
                warn!("Client {} silent for {:?}, dropping connection", connection_id, PONG_WAIT);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                warn!("Error reading message from client {}: {}", connection_id, e);
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => route_message(&room, &routers, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    room.mark_closed();
    for id in routers.keys() {
        room.remove_participant(id).await;
    }
    transport.close();
    if let Err(e) = writer.await {
        error!("Writer task for client {} panicked: {}", connection_id, e);
    }

    info!("Local game in room {} ended", room.id());
    Ok(())
}

/// Feeds one inbound text frame to every player's router. Anything that is
/// not an input message is dropped.
async fn route_message(room: &Room, routers: &HashMap<String, InputRouter>, text: &str) {
    match ClientMessage::parse(text) {
        Some(ClientMessage::Input { input }) => {
            for (id, router) in routers {
                room.handle_input(id, router.translate(&input)).await;
            }
        }
        Some(ClientMessage::Unknown) => {
            debug!("Ignoring message of unknown type in room {}", room.id());
        }
        None => {
            debug!("Dropping malformed message in room {}", room.id());
        }
    }
}

/// Drains the outbound queue into the socket and keeps the connection
/// alive with periodic pings. Returning drops the queue, which makes every
/// later send on the connection's transport fail.
async fn run_writer(
    mut sink: WsSink,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    connection_id: u32,
) {
    let mut ping_timer = interval_at(Instant::now() + PING_PERIOD, PING_PERIOD);

    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write_frame(&mut sink, Message::Text(text)).await {
                        warn!("Error sending to client {}: {}", connection_id, e);
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write_frame(&mut sink, Message::Close(None)).await;
                    break;
                }
            },
            _ = ping_timer.tick() => {
                if let Err(e) = write_frame(&mut sink, Message::Ping(Vec::new())).await {
                    warn!("Error sending ping to client {}: {}", connection_id, e);
                    break;
                }
            }
        }
    }

    debug!("Writer for client {} stopped", connection_id);
}

async fn write_frame(
    sink: &mut WsSink,
    frame: Message,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    timeout(WRITE_WAIT, sink.send(frame)).await??;
    Ok(())
}
