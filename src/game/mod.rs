//! Round simulation modules

pub mod clock;
pub mod error;
pub mod object;
pub mod registry;
pub mod round;
pub mod selection;
pub mod session;
pub mod sinks;
pub mod spawner;

pub use error::SceneError;
pub use object::{Category, GameObject, ObjectId, Position, SpawnBounds};
pub use session::{RoundSession, SessionHandle, SessionRegistry};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Monotonic round counter stamped on every queued event.
///
/// Events carrying an epoch other than the controller's current one belong to
/// a round that has already been stopped and are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundEpoch(u64);

impl RoundEpoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Everything that can touch round state, serialized onto one queue
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// Spawn cadence fired
    SpawnTick { epoch: RoundEpoch },
    /// Countdown cadence fired
    CountdownTick { epoch: RoundEpoch },
    /// The player picked an object in the scene
    Selection { epoch: RoundEpoch, object_id: ObjectId },
    /// Start (or restart) a round
    NewGame,
    /// Abandon the current round and return to idle
    Quit,
    /// Host is going away; clean up and stop processing
    Shutdown,
}

/// Producer side of a round's event queue
pub type RoundQueue = mpsc::UnboundedSender<RoundEvent>;
