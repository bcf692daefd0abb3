use crate::vehicle::VehicleModel;
use log::info;
use shared::{Checkpoint, DirectionalInput, ServerMessage, MAX_PARTICIPANTS};
use std::time::Duration;

/// Lifecycle of a room's race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Fewer than two participants have joined
    Waiting,
    /// Race armed and physics advancing
    Running,
    /// A winner is decided; physics frozen, snapshots still flowing
    Finished,
    /// Terminal; no further ticks or broadcasts
    Closed,
}

/// Result of seating a vehicle in the race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Rejected,
    Seated,
    /// The vehicle filled the roster and the race is now running
    RaceArmed,
}

/// Authoritative race state for one room.
///
/// Participants are kept in join order, which is also the order they are
/// advanced in each tick and therefore decides who wins a same-tick finish.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    participants: Vec<VehicleModel>,
    checkpoints: Vec<Checkpoint>,
    winner: Option<String>,
    started: bool,
    phase: RoomPhase,
}

impl GameState {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            tick: 0,
            participants: Vec::with_capacity(MAX_PARTICIPANTS),
            checkpoints,
            winner: None,
            started: false,
            phase: RoomPhase::Waiting,
        }
    }

    pub fn add_participant(&mut self, vehicle: VehicleModel) -> Join {
        if self.started || self.phase == RoomPhase::Closed || self.is_full() {
            return Join::Rejected;
        }
        if self.participant(&vehicle.id).is_some() {
            return Join::Rejected;
        }

        info!(
            "Added player {} at ({}, {})",
            vehicle.id, vehicle.x, vehicle.y
        );
        self.participants.push(vehicle);

        if self.is_full() {
            self.started = true;
            self.phase = RoomPhase::Running;
            Join::RaceArmed
        } else {
            Join::Seated
        }
    }

    /// Removing anyone after the race was armed closes the race for good.
    pub fn remove_participant(&mut self, id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|vehicle| vehicle.id != id);
        let removed = self.participants.len() < before;

        if removed {
            info!("Removed player {}", id);
        }
        if self.started {
            self.phase = RoomPhase::Closed;
        }
        removed
    }

    /// Returns false if no participant has that id.
    pub fn apply_input(&mut self, id: &str, input: DirectionalInput) -> bool {
        match self.participants.iter_mut().find(|vehicle| vehicle.id == id) {
            Some(vehicle) => {
                vehicle.apply_input(input);
                true
            }
            None => false,
        }
    }

    /// Advances every vehicle one step and scores checkpoints.
    ///
    /// Frozen once a winner exists. Returns the winner's id if it was
    /// decided during this call.
    pub fn update(&mut self) -> Option<String> {
        if self.winner.is_some() || self.phase != RoomPhase::Running {
            return None;
        }

        self.tick += 1;
        let course_len = self.checkpoints.len();
        let mut decided = None;

        for vehicle in self.participants.iter_mut() {
            vehicle.advance();

            let Some(checkpoint) = self.checkpoints.get(vehicle.checkpoint_index) else {
                continue;
            };
            if !checkpoint.contains(vehicle.x, vehicle.y) {
                continue;
            }

            let completed = vehicle.advance_checkpoint(course_len);
            info!(
                "Player {} reached checkpoint {}",
                vehicle.id, vehicle.checkpoint_index
            );

            if completed && self.winner.is_none() {
                info!("Player {} won the race!", vehicle.id);
                self.winner = Some(vehicle.id.clone());
                decided = Some(vehicle.id.clone());
            }
        }

        if self.winner.is_some() {
            self.phase = RoomPhase::Finished;
        }
        decided
    }

    pub fn close(&mut self) {
        self.phase = RoomPhase::Closed;
    }

    /// Ids of participants idle for longer than `timeout`, in join order.
    pub fn inactive_participants(&self, timeout: Duration) -> Vec<String> {
        self.participants
            .iter()
            .filter(|vehicle| vehicle.is_inactive(timeout))
            .map(|vehicle| vehicle.id.clone())
            .collect()
    }

    pub fn snapshot(&self) -> ServerMessage {
        ServerMessage::GameState {
            players: self.participants.iter().map(VehicleModel::snapshot).collect(),
            winner: self.winner.clone().unwrap_or_default(),
            started: self.started,
            checkpoints: self.checkpoints.clone(),
        }
    }

    pub fn participant(&self, id: &str) -> Option<&VehicleModel> {
        self.participants.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn participants(&self) -> &[VehicleModel] {
        &self.participants
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }
}
