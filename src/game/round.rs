//! Round controller - countdown, scoring and the Idle/Running/Ended machine

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RoundConfig;

use super::clock::{Cadence, Scheduler};
use super::object::{Category, ObjectId};
use super::registry::ObjectRegistry;
use super::selection::{SelectionHandler, SelectionSource, SubscriptionToken};
use super::sinks::{GameOverResult, PresentationSink, RemovalReason, RoundSnapshot, SceneSink};
use super::spawner::Spawner;
use super::{RoundEpoch, RoundEvent, RoundQueue};

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// No round, or a round was abandoned
    Idle,
    /// Clock running, balls spawning
    Running,
    /// Time ran out, final scores shown
    Ended,
}

/// Running totals. Both only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    /// Correct balls picked
    pub correct: u32,
    /// Wrong balls picked plus correct balls missed
    pub wrong: u32,
}

/// Round state (owned by the controller)
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub scores: Scores,
    pub time_remaining: u32,
    pub phase: RoundPhase,
}

impl RoundState {
    fn idle() -> Self {
        Self {
            scores: Scores::default(),
            time_remaining: 0,
            phase: RoundPhase::Idle,
        }
    }
}

/// Everything outside the round that the controller talks to
pub struct Collaborators {
    pub clock: Box<dyn Scheduler>,
    pub selection: Box<dyn SelectionSource>,
    pub scene: Box<dyn SceneSink>,
    pub presentation: Box<dyn PresentationSink>,
}

/// Drives one round at a time.
///
/// All methods run on the round's single event queue, so nothing here is
/// shared across threads. Mutations only happen while the phase is
/// `Running`; late events from a stopped round are dropped.
pub struct RoundController {
    config: RoundConfig,
    state: RoundState,
    registry: ObjectRegistry,
    spawner: Spawner,
    epoch: RoundEpoch,
    queue: RoundQueue,
    subscription: Option<SubscriptionToken>,
    clock: Box<dyn Scheduler>,
    selection: Box<dyn SelectionSource>,
    scene: Box<dyn SceneSink>,
    presentation: Box<dyn PresentationSink>,
}

impl RoundController {
    /// Create an idle controller. `queue` is the round's own event queue;
    /// the clock and the selection source post into it.
    pub fn new(config: RoundConfig, collaborators: Collaborators, queue: RoundQueue) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let Collaborators {
            clock,
            selection,
            scene,
            presentation,
        } = collaborators;

        Self {
            registry: ObjectRegistry::new(config.object_lifetime_ticks),
            spawner: Spawner::new(seed, &config),
            config,
            state: RoundState::idle(),
            epoch: RoundEpoch::default(),
            queue,
            subscription: None,
            clock,
            selection,
            scene,
            presentation,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn epoch(&self) -> RoundEpoch {
        self.epoch
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round: self.epoch,
            phase: self.state.phase,
            correct_score: self.state.scores.correct,
            wrong_score: self.state.scores.wrong,
            time_remaining: self.state.time_remaining,
            live_objects: self.registry.len(),
        }
    }

    /// Dispatch one queued event
    pub fn handle(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::SpawnTick { epoch } => {
                if self.is_current(epoch) {
                    self.on_spawn_tick();
                } else {
                    debug!(round = epoch.value(), "Dropping stale spawn tick");
                }
            }
            RoundEvent::CountdownTick { epoch } => {
                if self.is_current(epoch) {
                    self.on_countdown_tick();
                } else {
                    debug!(round = epoch.value(), "Dropping stale countdown tick");
                }
            }
            RoundEvent::Selection { epoch, object_id } => {
                if self.is_current(epoch) {
                    self.on_selection(&object_id);
                } else {
                    debug!(round = epoch.value(), object_id = %object_id, "Dropping stale selection");
                }
            }
            RoundEvent::NewGame => self.new_game(),
            RoundEvent::Quit | RoundEvent::Shutdown => self.cleanup(),
        }
    }

    /// Start a fresh round, tearing down whatever the previous one left
    pub fn new_game(&mut self) {
        self.cleanup();

        self.epoch = self.epoch.next();
        self.state = RoundState {
            scores: Scores::default(),
            time_remaining: self.config.round_length_ticks,
            phase: RoundPhase::Running,
        };
        if let Some(seed) = self.config.seed {
            self.spawner.reseed(seed);
        }

        self.registry.open();
        let cadence = Cadence {
            spawn_interval: self.config.spawn_interval(),
            tick_interval: self.config.tick_interval(),
        };
        self.clock.start(cadence, self.epoch, self.queue.clone());

        match self.selection.subscribe(self.epoch, self.queue.clone()) {
            Ok(token) => self.subscription = Some(token),
            Err(e) => {
                warn!(
                    round = self.epoch.value(),
                    error = %e,
                    "Selection source unavailable, round continues without selection scoring"
                );
            }
        }

        info!(
            round = self.epoch.value(),
            time_remaining = self.state.time_remaining,
            "Round started"
        );
        let snapshot = self.snapshot();
        self.presentation.round_started(&snapshot);
    }

    /// One countdown step: age every ball, penalise missed correct balls,
    /// end the round when time is up
    pub fn on_countdown_tick(&mut self) {
        if self.state.phase != RoundPhase::Running {
            debug!("Countdown tick outside a running round ignored");
            return;
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);

        for object in self.registry.age_all() {
            if object.category() == Category::Correct {
                self.state.scores.wrong += 1;
            }
            debug!(object_id = %object.id(), category = ?object.category(), "Ball expired");
            self.destroy_visual(object.id(), RemovalReason::Expired);
        }

        let snapshot = self.snapshot();
        self.presentation.scores(&snapshot);

        if self.state.time_remaining == 0 {
            self.end_game();
        }
    }

    /// One spawn step
    pub fn on_spawn_tick(&mut self) {
        if self.state.phase != RoundPhase::Running {
            debug!("Spawn tick outside a running round ignored");
            return;
        }

        match self.spawner.spawn(&mut self.registry) {
            Ok(ids) => {
                for id in &ids {
                    if let Some(object) = self.registry.get(id) {
                        self.scene.create(object);
                    }
                }
                debug!(round = self.epoch.value(), spawned = ids.len(), "Spawn tick");
            }
            Err(e) => debug!(error = %e, "Spawn skipped"),
        }
    }

    /// The player picked `id` in the scene
    pub fn on_selection(&mut self, id: &ObjectId) {
        if self.state.phase != RoundPhase::Running {
            debug!(object_id = %id, "Selection outside a running round ignored");
            return;
        }

        match SelectionHandler::resolve(&mut self.registry, &mut self.state.scores, id) {
            Some(object) => {
                debug!(object_id = %id, category = ?object.category(), "Ball selected");
                self.destroy_visual(object.id(), RemovalReason::Selected);
                let snapshot = self.snapshot();
                self.presentation.scores(&snapshot);
            }
            None => debug!(object_id = %id, "Selection is not a live ball"),
        }
    }

    /// Time is up. Balls still alive are removed without penalty.
    ///
    /// Returns the final result, or `None` if no round was running.
    pub fn end_game(&mut self) -> Option<GameOverResult> {
        if self.state.phase != RoundPhase::Running {
            return None;
        }

        self.release_resources();
        self.state.phase = RoundPhase::Ended;

        let result = GameOverResult {
            correct_score: self.state.scores.correct,
            wrong_score: self.state.scores.wrong,
        };
        info!(
            round = self.epoch.value(),
            correct = result.correct_score,
            wrong = result.wrong_score,
            "Round over"
        );
        self.presentation.game_over(&result);
        Some(result)
    }

    /// Return to idle from any phase. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if self.state.phase == RoundPhase::Running {
            info!(round = self.epoch.value(), "Round abandoned");
        }
        self.release_resources();
        self.state.phase = RoundPhase::Idle;
    }

    fn release_resources(&mut self) {
        self.clock.stop();

        if let Some(token) = self.subscription.take() {
            self.selection.unsubscribe(token);
        }

        for object in self.registry.close() {
            self.destroy_visual(object.id(), RemovalReason::Cleared);
        }
    }

    fn is_current(&self, epoch: RoundEpoch) -> bool {
        self.state.phase == RoundPhase::Running && epoch == self.epoch
    }

    fn destroy_visual(&mut self, id: &ObjectId, reason: RemovalReason) {
        if let Err(e) = self.scene.destroy(id, reason) {
            warn!(object_id = %id, error = %e, "Visual object missing on destroy");
        }
    }
}
