//! Round clock - two independent cadences posted onto the round queue

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::{RoundEpoch, RoundEvent, RoundQueue};

/// Spawn and countdown periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub spawn_interval: Duration,
    pub tick_interval: Duration,
}

/// Periodic event source driving a round.
///
/// Implementations post [`RoundEvent::SpawnTick`] and
/// [`RoundEvent::CountdownTick`] stamped with the epoch given to `start`.
/// After `stop` returns nothing new is posted; events already queued carry a
/// stale epoch once the controller moves on and are discarded there.
pub trait Scheduler: Send {
    fn start(&mut self, cadence: Cadence, epoch: RoundEpoch, queue: RoundQueue);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Tokio interval task
#[derive(Default)]
pub struct IntervalClock {
    task: Option<JoinHandle<()>>,
}

impl IntervalClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for IntervalClock {
    fn start(&mut self, cadence: Cadence, epoch: RoundEpoch, queue: RoundQueue) {
        self.stop();

        // Neither cadence fires at t=0
        let now = Instant::now();
        let task = tokio::spawn(async move {
            let mut spawn = interval_at(now + cadence.spawn_interval, cadence.spawn_interval);
            let mut tick = interval_at(now + cadence.tick_interval, cadence.tick_interval);
            spawn.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // Countdown wins ties so decay happens before a same-instant spawn
                let event = tokio::select! {
                    biased;
                    _ = tick.tick() => RoundEvent::CountdownTick { epoch },
                    _ = spawn.tick() => RoundEvent::SpawnTick { epoch },
                };

                if queue.send(event).is_err() {
                    debug!(round = epoch.value(), "Round queue closed, clock exiting");
                    break;
                }
            }
        });

        self.task = Some(task);
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_test::assert_ok;

    fn cadence() -> Cadence {
        Cadence {
            spawn_interval: Duration::from_millis(2000),
            tick_interval: Duration::from_millis(1000),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_both_cadences() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let epoch = RoundEpoch::default().next();
        let mut clock = IntervalClock::new();
        clock.start(cadence(), epoch, tx);
        assert!(clock.is_running());

        tokio::time::sleep(Duration::from_millis(4500)).await;
        clock.stop();

        let mut ticks = 0;
        let mut spawns = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                RoundEvent::CountdownTick { epoch: e } => {
                    assert_eq!(e, epoch);
                    ticks += 1;
                }
                RoundEvent::SpawnTick { epoch: e } => {
                    assert_eq!(e, epoch);
                    spawns += 1;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(ticks, 4);
        assert_eq!(spawns, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_first_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = IntervalClock::new();
        clock.start(cadence(), RoundEpoch::default(), tx);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let first = assert_ok!(rx.try_recv());
        assert!(matches!(first, RoundEvent::CountdownTick { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_the_clock() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = IntervalClock::new();
        clock.start(cadence(), RoundEpoch::default(), tx);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.stop();
        assert!(!clock.is_running());
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());

        // Stopping twice is fine
        clock.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = RoundEpoch::default().next();
        let second = first.next();
        let mut clock = IntervalClock::new();

        clock.start(cadence(), first, tx.clone());
        clock.start(cadence(), second, tx);
        tokio::time::sleep(Duration::from_millis(3100)).await;
        clock.stop();

        while let Ok(event) = rx.try_recv() {
            match event {
                RoundEvent::CountdownTick { epoch } | RoundEvent::SpawnTick { epoch } => {
                    assert_eq!(epoch, second)
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }
}
