//! Concurrent room: race state, connections, and the background game loop
//!
//! A [`Room`] is shared between the connection read path, which feeds it
//! input at arbitrary times, and its own loop task, which advances physics
//! and broadcasts snapshots on a fixed clock. All race state sits behind one
//! room-wide `RwLock`; ticks, joins, removals, and input take it exclusively,
//! snapshot capture takes it shared. The closed flag lives outside the lock
//! so the loop can check it every tick without contending with input.
//!
//! ## Lifecycle
//!
//! ```text
//! Waiting --2nd join--> Running --winner--> Finished
//!                          |                    |
//!                          +--------------------+--> Closed
//!           (transport failure, removal, or inactivity)
//! ```
//!
//! The loop is spawned exactly once, by the join that fills the roster, and
//! exits on the stop signal or when it finds the room marked closed. Exiting
//! tears the room down: it is marked closed and never broadcasts again.

use crate::config::RoomConfig;
use crate::game::{GameState, Join, RoomPhase};
use crate::transport::{Transport, TransportError};
use crate::vehicle::VehicleModel;
use log::{debug, error, info, warn};
use shared::{default_course, DirectionalInput, ServerMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

struct RoomState {
    game: GameState,
    transports: HashMap<String, Arc<dyn Transport>>,
    /// Handed to the loop task when the race is armed
    stop_receiver: Option<mpsc::Receiver<()>>,
}

pub struct Room {
    id: String,
    config: RoomConfig,
    state: RwLock<RoomState>,
    closed: AtomicBool,
    loop_active: AtomicBool,
    stop_sender: mpsc::Sender<()>,
}

impl Room {
    /// Creates an empty room on the standard course.
    pub fn new(id: impl Into<String>, config: RoomConfig) -> Arc<Self> {
        Self::with_game(id, config, GameState::new(default_course()))
    }

    pub fn with_game(id: impl Into<String>, config: RoomConfig, game: GameState) -> Arc<Self> {
        // A single slot is enough: one pending stop request already ends the loop.
        let (stop_sender, stop_receiver) = mpsc::channel(1);

        Arc::new(Self {
            id: id.into(),
            config,
            state: RwLock::new(RoomState {
                game,
                transports: HashMap::new(),
                stop_receiver: Some(stop_receiver),
            }),
            closed: AtomicBool::new(false),
            loop_active: AtomicBool::new(false),
            stop_sender,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Seats a participant. Returns false if the roster is full, the race
    /// has already been armed, or the id is taken.
    ///
    /// The join that fills the roster starts the game loop.
    pub async fn add_participant(
        self: &Arc<Self>,
        vehicle: VehicleModel,
        transport: Arc<dyn Transport>,
    ) -> bool {
        if self.is_closed() {
            return false;
        }

        let mut state = self.state.write().await;
        let id = vehicle.id.clone();

        match state.game.add_participant(vehicle) {
            Join::Rejected => {
                warn!("Room {} rejected player {}", self.id, id);
                false
            }
            Join::Seated => {
                state.transports.insert(id, transport);
                true
            }
            Join::RaceArmed => {
                state.transports.insert(id, transport);
                if let Some(stop_receiver) = state.stop_receiver.take() {
                    self.loop_active.store(true, Ordering::SeqCst);
                    let room = Arc::clone(self);
                    tokio::spawn(async move {
                        room.run_game_loop(stop_receiver).await;
                    });
                }
                true
            }
        }
    }

    /// Removes a participant. Once the race has started this also stops
    /// the loop; there are no rejoins.
    pub async fn remove_participant(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        state.transports.remove(id);
        let removed = state.game.remove_participant(id);

        if state.game.started() {
            self.request_shutdown();
        }
        removed
    }

    /// Applies input to the named participant. Unknown ids are ignored.
    pub async fn handle_input(&self, id: &str, input: DirectionalInput) {
        let mut state = self.state.write().await;
        if !state.game.apply_input(id, input) {
            debug!("Ignoring input for unknown player {} in room {}", id, self.id);
        }
    }

    /// Advances the race one step. Normally driven by the game loop.
    pub async fn tick(&self) -> Option<String> {
        let mut state = self.state.write().await;
        state.game.update()
    }

    /// Sends the current snapshot to every connection once.
    ///
    /// A single failed delivery closes the whole room and requests shutdown.
    pub async fn broadcast(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            return Ok(());
        }

        let (payload, recipients) = {
            let state = self.state.read().await;
            if state.game.phase() == RoomPhase::Closed {
                return Ok(());
            }

            let payload = serde_json::to_string(&state.game.snapshot())?;
            let mut recipients: Vec<Arc<dyn Transport>> = Vec::new();
            for vehicle in state.game.participants() {
                if let Some(transport) = state.transports.get(&vehicle.id) {
                    let connection_id = transport.connection_id();
                    if !recipients.iter().any(|r| r.connection_id() == connection_id) {
                        recipients.push(Arc::clone(transport));
                    }
                }
            }
            (payload, recipients)
        };

        for transport in recipients {
            if let Err(e) = transport.send(&payload) {
                self.mark_closed();
                self.request_shutdown();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Closes the room if any participant has been idle past the timeout.
    ///
    /// Every idle participant's connection is closed, not only the first.
    /// Returns the ids that were found idle.
    pub async fn check_inactivity(&self) -> Vec<String> {
        let timeout = self.config.inactivity_timeout;
        let idle: Vec<(String, Option<Arc<dyn Transport>>)> = {
            let state = self.state.read().await;
            state
                .game
                .inactive_participants(timeout)
                .into_iter()
                .map(|id| {
                    let transport = state.transports.get(&id).cloned();
                    (id, transport)
                })
                .collect()
        };

        if idle.is_empty() {
            return Vec::new();
        }

        for (id, transport) in &idle {
            warn!(
                "Player {} inactive for {:?}, closing connection and shutting down room {}",
                id, timeout, self.id
            );
            if let Some(transport) = transport {
                transport.close();
            }
        }

        self.mark_closed();
        self.request_shutdown();
        idle.into_iter().map(|(id, _)| id).collect()
    }

    /// Records that outbound delivery is known to be dead. Irreversible.
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Asks the game loop to stop. Never blocks; safe to call any number of
    /// times, including after the loop has exited or before it started.
    pub fn request_shutdown(&self) {
        if !self.loop_active.load(Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.stop_sender.try_send(()) {
            debug!("Stop request for room {} not queued: {}", self.id, e);
        }
    }

    /// True while the background loop is running.
    pub fn is_running(&self) -> bool {
        self.loop_active.load(Ordering::SeqCst)
    }

    pub async fn phase(&self) -> RoomPhase {
        if self.is_closed() {
            return RoomPhase::Closed;
        }
        self.state.read().await.game.phase()
    }

    pub async fn is_full(&self) -> bool {
        self.state.read().await.game.is_full()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.game.len()
    }

    pub async fn winner(&self) -> Option<String> {
        self.state.read().await.game.winner().map(str::to_string)
    }

    pub async fn participant(&self, id: &str) -> Option<VehicleModel> {
        self.state.read().await.game.participant(id).cloned()
    }

    pub async fn snapshot(&self) -> ServerMessage {
        self.state.read().await.game.snapshot()
    }

    async fn run_game_loop(self: Arc<Self>, mut stop_receiver: mpsc::Receiver<()>) {
        let mut tick_timer = interval(self.config.tick_period);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let check_period = self.config.inactivity_check_period;
        let mut inactivity_timer = interval_at(Instant::now() + check_period, check_period);
        inactivity_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Game started in room {}", self.id);

        loop {
            tokio::select! {
                _ = tick_timer.tick() => {
                    if self.is_closed() {
                        info!("Connection closed, stopping game loop in room {}", self.id);
                        break;
                    }
                    self.tick().await;
                    if let Err(e) = self.broadcast().await {
                        error!("Broadcast failed in room {}: {}. Marking room closed.", self.id, e);
                    }
                }
                _ = inactivity_timer.tick() => {
                    self.check_inactivity().await;
                }
                _ = stop_receiver.recv() => {
                    info!("Game stopped in room {}", self.id);
                    break;
                }
            }
        }

        self.teardown().await;
    }

    async fn teardown(&self) {
        self.mark_closed();
        {
            let mut state = self.state.write().await;
            state.game.close();
        }
        self.loop_active.store(false, Ordering::SeqCst);
        debug!("Room {} torn down", self.id);
    }
}
