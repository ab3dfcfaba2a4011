//! Selection handling - resolving picks against the registry and the
//! observer registration through which picks reach a round

use parking_lot::Mutex;
use std::sync::Arc;

use super::error::SubscriptionError;
use super::object::{Category, GameObject, ObjectId};
use super::registry::ObjectRegistry;
use super::round::Scores;
use super::{RoundEpoch, RoundEvent, RoundQueue};

/// Applies the selection scoring rule
pub struct SelectionHandler;

impl SelectionHandler {
    /// Resolve a pick. Returns the removed object, or `None` when `id` is not
    /// a live ball (never selected, already expired, or already picked), in
    /// which case scores are untouched.
    pub fn resolve(
        registry: &mut ObjectRegistry,
        scores: &mut Scores,
        id: &ObjectId,
    ) -> Option<GameObject> {
        let object = registry.remove(id).ok()?;

        match object.category() {
            Category::Correct => scores.correct += 1,
            Category::Wrong => scores.wrong += 1,
        }
        Some(object)
    }
}

/// Proof of a live subscription, handed back to release it
#[derive(Debug, PartialEq, Eq)]
pub struct SubscriptionToken {
    id: u64,
}

/// External source of selection events.
///
/// A round subscribes once when it starts and releases the token when it
/// stops. While subscribed, the source posts [`RoundEvent::Selection`] onto
/// the round queue stamped with the subscribing epoch.
pub trait SelectionSource: Send {
    fn subscribe(
        &mut self,
        epoch: RoundEpoch,
        queue: RoundQueue,
    ) -> Result<SubscriptionToken, SubscriptionError>;

    /// Release a subscription. Unknown or stale tokens are ignored.
    fn unsubscribe(&mut self, token: SubscriptionToken);
}

/// Selection source fed by a host (e.g. a WebSocket reader).
///
/// Clones share state: the host keeps one clone to publish into, the round
/// holds another as its [`SelectionSource`].
#[derive(Clone, Default)]
pub struct SelectionFeed {
    inner: Arc<Mutex<FeedState>>,
}

#[derive(Default)]
struct FeedState {
    subscriber: Option<Subscriber>,
    next_token: u64,
    detached: bool,
}

struct Subscriber {
    token: u64,
    epoch: RoundEpoch,
    queue: RoundQueue,
}

impl SelectionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a pick to the subscribed round. Returns false when nobody is
    /// listening, in which case the pick is dropped.
    pub fn publish(&self, object_id: ObjectId) -> bool {
        let state = self.inner.lock();
        match &state.subscriber {
            Some(sub) => sub
                .queue
                .send(RoundEvent::Selection {
                    epoch: sub.epoch,
                    object_id,
                })
                .is_ok(),
            None => false,
        }
    }

    /// The producer is gone: drop the current subscriber and refuse new ones
    pub fn detach(&self) {
        let mut state = self.inner.lock();
        state.detached = true;
        state.subscriber = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.lock().subscriber.is_some()
    }
}

impl SelectionSource for SelectionFeed {
    fn subscribe(
        &mut self,
        epoch: RoundEpoch,
        queue: RoundQueue,
    ) -> Result<SubscriptionToken, SubscriptionError> {
        let mut state = self.inner.lock();
        if state.detached {
            return Err(SubscriptionError::Detached);
        }
        if state.subscriber.is_some() {
            return Err(SubscriptionError::AlreadySubscribed);
        }

        state.next_token += 1;
        let token = state.next_token;
        state.subscriber = Some(Subscriber {
            token,
            epoch,
            queue,
        });
        Ok(SubscriptionToken { id: token })
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        let mut state = self.inner.lock();
        if state.subscriber.as_ref().map(|s| s.token) == Some(token.id) {
            state.subscriber = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::object::Position;
    use tokio::sync::mpsc;

    fn registry_with(categories: &[Category]) -> (ObjectRegistry, Vec<ObjectId>) {
        let mut registry = ObjectRegistry::new(3);
        registry.open();
        let ids: Vec<ObjectId> = categories
            .iter()
            .map(|c| registry.add(*c, Position::default()).unwrap())
            .collect();
        (registry, ids)
    }

    #[test]
    fn picking_correct_scores() {
        let (mut registry, ids) = registry_with(&[Category::Correct]);
        let mut scores = Scores::default();

        let picked = SelectionHandler::resolve(&mut registry, &mut scores, &ids[0]).unwrap();
        assert_eq!(picked.category(), Category::Correct);
        assert_eq!(scores, Scores { correct: 1, wrong: 0 });
        assert!(registry.is_empty());
    }

    #[test]
    fn picking_wrong_penalizes() {
        let (mut registry, ids) = registry_with(&[Category::Correct, Category::Wrong]);
        let mut scores = Scores::default();

        SelectionHandler::resolve(&mut registry, &mut scores, &ids[1]).unwrap();
        assert_eq!(scores, Scores { correct: 0, wrong: 1 });
        assert!(registry.contains(&ids[0]));
    }

    #[test]
    fn stale_and_foreign_picks_are_ignored() {
        let (mut registry, ids) = registry_with(&[Category::Correct]);
        let mut scores = Scores::default();

        assert!(SelectionHandler::resolve(&mut registry, &mut scores, &ids[0]).is_some());
        assert!(SelectionHandler::resolve(&mut registry, &mut scores, &ids[0]).is_none());
        assert!(
            SelectionHandler::resolve(&mut registry, &mut scores, &"pCube1".into()).is_none()
        );
        assert_eq!(scores, Scores { correct: 1, wrong: 0 });
    }

    #[test]
    fn feed_forwards_only_while_subscribed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut feed = SelectionFeed::new();
        let host = feed.clone();

        assert!(!host.publish("ball_01_green".into()));

        let epoch = RoundEpoch::default().next();
        let token = feed.subscribe(epoch, tx).unwrap();
        assert!(host.publish("ball_01_green".into()));
        assert_eq!(
            rx.try_recv().unwrap(),
            RoundEvent::Selection {
                epoch,
                object_id: "ball_01_green".into()
            }
        );

        feed.unsubscribe(token);
        assert!(!host.is_subscribed());
        assert!(!host.publish("ball_01_green".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn single_subscriber_at_a_time() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut feed = SelectionFeed::new();
        let epoch = RoundEpoch::default();

        let first = feed.subscribe(epoch, tx.clone()).unwrap();
        assert_eq!(
            feed.subscribe(epoch, tx.clone()).unwrap_err(),
            SubscriptionError::AlreadySubscribed
        );

        feed.unsubscribe(first);
        assert!(feed.subscribe(epoch.next(), tx).is_ok());
    }

    #[test]
    fn stale_token_does_not_release_newer_subscription() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut feed = SelectionFeed::new();

        let old = feed.subscribe(RoundEpoch::default(), tx.clone()).unwrap();
        let stale = SubscriptionToken { id: old.id };
        feed.unsubscribe(old);
        let _current = feed.subscribe(RoundEpoch::default().next(), tx).unwrap();

        feed.unsubscribe(stale);
        assert!(feed.is_subscribed());
    }

    #[test]
    fn detached_feed_refuses_subscribers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut feed = SelectionFeed::new();
        feed.clone().detach();
        assert_eq!(
            feed.subscribe(RoundEpoch::default(), tx).unwrap_err(),
            SubscriptionError::Detached
        );
    }
}
