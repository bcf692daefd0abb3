//! # Race Server Library
//!
//! This library provides the authoritative backend for a real-time
//! two-player racing game. It owns vehicle physics, checkpoint progression,
//! and winner detection, and streams the resulting state to connected
//! clients at a fixed tick rate.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every vehicle is advanced by the server on a fixed clock. Clients only
//! report which keys are held; positions, speeds, checkpoints, and the
//! winner are decided here and pushed back as snapshots.
//!
//! ### Room Lifecycle
//! A room holds exactly two participants. It waits for the second join,
//! runs the race, freezes physics once someone finishes, and tears itself
//! down when a connection fails, a participant leaves, or a player goes
//! idle for too long.
//!
//! ### State Broadcasting
//! After every tick the room serializes one consistent snapshot and hands
//! it to each connection. A failed delivery ends the whole room.
//!
//! ## Architecture Design
//!
//! ### One Loop Per Room
//! Each running room owns a background task that waits on three sources:
//! the physics tick, a slower inactivity check, and a stop signal. Input
//! arrives concurrently from the connection's read path and is serialized
//! against ticks by the room-wide lock.
//!
//! ### WebSocket Transport
//! Clients connect over WebSocket and exchange JSON messages. The room never
//! touches the socket directly: it writes into a per-connection queue that a
//! writer task drains, so a slow or dead socket can never stall a tick.
//!
//! ## Module Organization
//!
//! ### Vehicle Module (`vehicle`)
//! Physics for one car: acceleration, clamped speed, speed decay, steering
//! above a minimum speed, and heading normalization.
//!
//! ### Game Module (`game`)
//! Synchronous race state: roster in join order, checkpoint scoring, the
//! winner, and the room phase.
//!
//! ### Room Module (`room`)
//! The concurrent wrapper around the game state: locking, the game loop,
//! broadcast, inactivity eviction, and shutdown.
//!
//! ### Input Module (`input`)
//! Key mappings that turn raw key events into directional input.
//!
//! ### Network Module (`network`)
//! WebSocket accept loop, per-connection reader and writer, and keep-alive.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::RoomConfig;
//! use server::network::NetworkServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Bind with the standard 50ms tick and 30s inactivity timeout
//!     let server = NetworkServer::bind("127.0.0.1:8080", RoomConfig::default()).await?;
//!
//!     // Every accepted connection gets its own two-player room
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod input;
pub mod network;
pub mod room;
pub mod setup;
pub mod transport;
pub mod vehicle;
