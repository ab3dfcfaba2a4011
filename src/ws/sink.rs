//! Scene and presentation sinks that forward round output to the client

use std::collections::HashSet;
use tokio::sync::broadcast;

use crate::game::sinks::{
    GameOverResult, PresentationSink, RemovalReason, RoundSnapshot, SceneSink,
};
use crate::game::{GameObject, ObjectId, SceneError};

use super::protocol::ServerMsg;

/// Client-side scene: balls are drawn by the client from these messages.
///
/// Tracks which visuals the client was told about so a destroy for an
/// unknown ball is reported instead of forwarded.
pub struct ClientScene {
    tx: broadcast::Sender<ServerMsg>,
    radius: f32,
    visuals: HashSet<ObjectId>,
}

impl ClientScene {
    pub fn new(tx: broadcast::Sender<ServerMsg>, radius: f32) -> Self {
        Self {
            tx,
            radius,
            visuals: HashSet::new(),
        }
    }
}

impl SceneSink for ClientScene {
    fn create(&mut self, object: &GameObject) {
        self.visuals.insert(object.id().clone());
        let _ = self.tx.send(ServerMsg::ObjectSpawned {
            object_id: object.id().clone(),
            category: object.category(),
            position: object.position(),
            color: object.category().rgb(),
            radius: self.radius,
        });
    }

    fn destroy(&mut self, id: &ObjectId, reason: RemovalReason) -> Result<(), SceneError> {
        if !self.visuals.remove(id) {
            return Err(SceneError::UnknownVisual(id.clone()));
        }
        let _ = self.tx.send(ServerMsg::ObjectRemoved {
            object_id: id.clone(),
            reason,
        });
        Ok(())
    }
}

/// Score board and game-over popup on the client
pub struct ClientPresenter {
    tx: broadcast::Sender<ServerMsg>,
}

impl ClientPresenter {
    pub fn new(tx: broadcast::Sender<ServerMsg>) -> Self {
        Self { tx }
    }
}

impl PresentationSink for ClientPresenter {
    fn round_started(&mut self, snapshot: &RoundSnapshot) {
        let _ = self.tx.send(ServerMsg::RoundStarted {
            round: snapshot.round,
            time_remaining: snapshot.time_remaining,
        });
    }

    fn scores(&mut self, snapshot: &RoundSnapshot) {
        let _ = self.tx.send(ServerMsg::ScoreUpdate {
            correct_score: snapshot.correct_score,
            wrong_score: snapshot.wrong_score,
            time_remaining: snapshot.time_remaining,
            live_objects: snapshot.live_objects,
        });
    }

    fn game_over(&mut self, result: &GameOverResult) {
        let _ = self.tx.send(ServerMsg::GameOver {
            correct_score: result.correct_score,
            wrong_score: result.wrong_score,
        });
    }
}
