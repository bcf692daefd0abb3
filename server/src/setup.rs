//! Building a ready-to-race room from a list of player configurations

use crate::config::RoomConfig;
use crate::input::{InputRouter, KeyMapping};
use crate::room::Room;
use crate::transport::Transport;
use crate::vehicle::VehicleModel;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

/// Start position and key bindings for one player
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub key_mapping: KeyMapping,
}

impl PlayerConfig {
    pub fn new(id: &str, x: f64, y: f64, key_mapping: KeyMapping) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            key_mapping,
        }
    }
}

pub struct RaceSetup {
    room_id: String,
    config: RoomConfig,
    players: Vec<PlayerConfig>,
}

impl RaceSetup {
    pub fn new(room_id: impl Into<String>, config: RoomConfig) -> Self {
        Self {
            room_id: room_id.into(),
            config,
            players: Vec::new(),
        }
    }

    /// Two players on one keyboard: "1" on WASD, "2" on the arrow keys.
    pub fn local(room_id: impl Into<String>, config: RoomConfig) -> Self {
        let mut setup = Self::new(room_id, config);
        setup.add_player(PlayerConfig::new("1", 100.0, 200.0, KeyMapping::wasd()));
        setup.add_player(PlayerConfig::new("2", 100.0, 350.0, KeyMapping::arrows()));
        setup
    }

    pub fn add_player(&mut self, player: PlayerConfig) {
        self.players.push(player);
    }

    pub fn players(&self) -> &[PlayerConfig] {
        &self.players
    }

    /// Creates the room and seats every configured player on `transport`.
    ///
    /// Seating the second player starts the race. Players the room refuses
    /// get no router.
    pub async fn initialize(
        &self,
        transport: Arc<dyn Transport>,
    ) -> (Arc<Room>, HashMap<String, InputRouter>) {
        let room = Room::new(self.room_id.clone(), self.config);
        let mut routers = HashMap::new();

        for player in &self.players {
            let vehicle = VehicleModel::new(player.id.clone(), player.x, player.y);
            if room.add_participant(vehicle, Arc::clone(&transport)).await {
                routers.insert(player.id.clone(), InputRouter::new(player.key_mapping.clone()));
            } else {
                warn!("Player {} could not join room {}", player.id, self.room_id);
            }
        }

        (room, routers)
    }
}
