use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const CAR_ACCELERATION: f64 = 1.0;
pub const CAR_MAX_SPEED: f64 = 12.0;
pub const CAR_REVERSE_SPEED: f64 = -6.0;
pub const CAR_TURN_SPEED: f64 = 5.0;
pub const SPEED_DECAY_RATE: f64 = 0.99;
pub const MINIMUM_SPEED: f64 = 0.2;
pub const TURN_THRESHOLD: f64 = 0.5;

pub const MAX_PARTICIPANTS: usize = 2;
pub const CHECKPOINT_RADIUS: f64 = 50.0;

pub const TICK_PERIOD: Duration = Duration::from_millis(50);
pub const INACTIVITY_CHECK_PERIOD: Duration = Duration::from_secs(5);
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Centers of the six gates, in the order they must be visited.
const COURSE_CENTERS: [(f64, f64); 6] = [
    (200.0, 300.0),
    (400.0, 450.0),
    (600.0, 300.0),
    (800.0, 450.0),
    (1000.0, 300.0),
    (1200.0, 200.0),
];

/// Physics parameters applied by a vehicle on every input and tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleTuning {
    pub acceleration: f64,
    pub max_forward_speed: f64,
    /// Negative bound; reversing is allowed down to this speed.
    pub max_reverse_speed: f64,
    /// Degrees per accepted turn input.
    pub turn_rate: f64,
    pub decay_rate: f64,
    pub minimum_speed: f64,
    pub turn_threshold: f64,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            acceleration: CAR_ACCELERATION,
            max_forward_speed: CAR_MAX_SPEED,
            max_reverse_speed: CAR_REVERSE_SPEED,
            turn_rate: CAR_TURN_SPEED,
            decay_rate: SPEED_DECAY_RATE,
            minimum_speed: MINIMUM_SPEED,
            turn_threshold: TURN_THRESHOLD,
        }
    }
}

/// Circular gate. Serializes to the wire shape `{x, y, radius}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Checkpoint {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Strictly inside the radius; a point on the boundary does not count.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.distance_to(x, y) < self.radius
    }
}

/// The fixed course shared by every room.
pub fn default_course() -> Vec<Checkpoint> {
    COURSE_CENTERS
        .iter()
        .map(|&(x, y)| Checkpoint::new(x, y, CHECKPOINT_RADIUS))
        .collect()
}

/// Semantic steering flags consumed by the physics model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionalInput {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub speed: f64,
    pub finished: bool,
    pub checkpoint: usize,
}

/// Messages the server pushes to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected {
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "roomId")]
        room_id: String,
        mode: String,
    },
    #[serde(rename = "gameState")]
    GameState {
        players: Vec<PlayerSnapshot>,
        winner: String,
        started: bool,
        checkpoints: Vec<Checkpoint>,
    },
}

/// Messages clients send to the server.
///
/// Key values inside `input` are left untyped; translating them is the
/// job of the per-participant key mapping.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "input")]
    Input { input: Map<String, Value> },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parses an inbound text frame. Anything that is not a well-formed
    /// message yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
