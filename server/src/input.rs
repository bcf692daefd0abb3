//! Translation of raw key events into directional input
//!
//! Clients report the state of physical keys by name (`"w"`, `"up"`, ...).
//! Each participant owns an [`InputRouter`] configured with the four key
//! names bound to it, so two players sharing one keyboard and one socket
//! can be told apart by which keys they press.

use serde_json::{Map, Value};
use shared::DirectionalInput;

/// Physical key names bound to the four semantic directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl KeyMapping {
    pub fn new(up: &str, down: &str, left: &str, right: &str) -> Self {
        Self {
            up: up.to_string(),
            down: down.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    pub fn wasd() -> Self {
        Self::new("w", "s", "a", "d")
    }

    pub fn arrows() -> Self {
        Self::new("up", "down", "left", "right")
    }
}

#[derive(Debug, Clone)]
pub struct InputRouter {
    mapping: KeyMapping,
}

impl InputRouter {
    pub fn new(mapping: KeyMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    /// Picks this participant's bound keys out of a raw event.
    ///
    /// Keys that are missing or not booleans read as released.
    pub fn translate(&self, raw: &Map<String, Value>) -> DirectionalInput {
        let pressed = |key: &str| raw.get(key).and_then(Value::as_bool).unwrap_or(false);

        DirectionalInput {
            up: pressed(&self.mapping.up),
            down: pressed(&self.mapping.down),
            left: pressed(&self.mapping.left),
            right: pressed(&self.mapping.right),
        }
    }
}
