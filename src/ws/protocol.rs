//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RoundConfig;
use crate::game::sinks::RemovalReason;
use crate::game::{Category, ObjectId, Position, RoundEpoch};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// "New Game" button
    NewGame,

    /// Player picked an object in the scene
    Select {
        /// Scene name of the picked object (may not be a ball at all)
        object_id: ObjectId,
    },

    /// "Quit" button: abandon the round
    Quit,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        session_id: Uuid,
        server_time: u64,
        /// Round constants the client should expect
        config: RoundConfig,
    },

    /// A round has begun, scores reset
    RoundStarted {
        round: RoundEpoch,
        time_remaining: u32,
    },

    /// Create a ball in the scene
    ObjectSpawned {
        object_id: ObjectId,
        category: Category,
        position: Position,
        /// Display colour (RGB, 0..1)
        color: [f32; 3],
        radius: f32,
    },

    /// Remove a ball from the scene
    ObjectRemoved {
        object_id: ObjectId,
        reason: RemovalReason,
    },

    /// Score board refresh
    ScoreUpdate {
        correct_score: u32,
        wrong_score: u32,
        time_remaining: u32,
        live_objects: usize,
    },

    /// Time is up
    GameOver {
        correct_score: u32,
        wrong_score: u32,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}
