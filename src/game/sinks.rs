//! Outbound collaborators of a round: the scene that draws balls and the
//! presentation layer that shows scores

use serde::{Deserialize, Serialize};

use super::error::SceneError;
use super::object::{GameObject, ObjectId};
use super::round::RoundPhase;
use super::RoundEpoch;

/// Why a ball left the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Player picked it
    Selected,
    /// Ran out of life
    Expired,
    /// Round stopped while it was alive
    Cleared,
}

/// Point-in-time view of a round for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: RoundEpoch,
    pub phase: RoundPhase,
    pub correct_score: u32,
    pub wrong_score: u32,
    pub time_remaining: u32,
    pub live_objects: usize,
}

/// Final payload shown when time runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverResult {
    pub correct_score: u32,
    pub wrong_score: u32,
}

/// Scene side of the game: fire-and-forget create/destroy of visuals
pub trait SceneSink: Send {
    fn create(&mut self, object: &GameObject);

    /// Fails when no visual exists for `id`; the round treats that as benign
    fn destroy(&mut self, id: &ObjectId, reason: RemovalReason) -> Result<(), SceneError>;
}

/// Score board and game-over popup
pub trait PresentationSink: Send {
    fn round_started(&mut self, snapshot: &RoundSnapshot);

    /// Sent after every countdown tick and every scoring selection
    fn scores(&mut self, snapshot: &RoundSnapshot);

    fn game_over(&mut self, result: &GameOverResult);
}
