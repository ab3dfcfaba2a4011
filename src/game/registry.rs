//! Object registry - owns the live balls and their decay counters

use super::error::RoundError;
use super::object::{Category, GameObject, ObjectId, Position};

/// Live objects of the current round.
///
/// The registry is only writable while open; the round controller opens it
/// when a round starts and closes it (dropping every object) when the round
/// stops. Objects are kept in spawn order.
#[derive(Debug)]
pub struct ObjectRegistry {
    objects: Vec<GameObject>,
    lifetime: u32,
    open: bool,
}

impl ObjectRegistry {
    /// Create a closed registry whose objects live `lifetime` ticks
    pub fn new(lifetime: u32) -> Self {
        Self {
            objects: Vec::new(),
            lifetime,
            open: false,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the registry and hand back whatever was still live
    pub fn close(&mut self) -> Vec<GameObject> {
        self.open = false;
        self.clear()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Create a new object.
    ///
    /// The id is `live count + 1` plus the colour, so it can clash with an
    /// object spawned earlier that is still alive. A clash is reported as
    /// [`RoundError::Collision`] and nothing is added.
    pub fn add(&mut self, category: Category, position: Position) -> Result<ObjectId, RoundError> {
        if !self.open {
            return Err(RoundError::InvalidState { operation: "add object" });
        }

        let id = ObjectId::for_spawn(self.objects.len() + 1, category);
        if self.contains(&id) {
            return Err(RoundError::Collision(id));
        }

        self.objects
            .push(GameObject::new(id.clone(), category, position, self.lifetime));
        Ok(id)
    }

    /// Age every object by one tick, removing and returning the ones that
    /// ran out of life
    pub fn age_all(&mut self) -> Vec<GameObject> {
        if !self.open {
            return Vec::new();
        }

        let mut expired = Vec::new();
        let mut live = Vec::with_capacity(self.objects.len());
        for mut object in self.objects.drain(..) {
            if object.age() {
                expired.push(object);
            } else {
                live.push(object);
            }
        }
        self.objects = live;
        expired
    }

    /// Remove a live object
    pub fn remove(&mut self, id: &ObjectId) -> Result<GameObject, RoundError> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.id() == id)
            .ok_or_else(|| RoundError::NotFound(id.clone()))?;
        Ok(self.objects.remove(idx))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.iter().any(|o| o.id() == id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every object, returning them
    pub fn clear(&mut self) -> Vec<GameObject> {
        std::mem::take(&mut self.objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_registry(lifetime: u32) -> ObjectRegistry {
        let mut registry = ObjectRegistry::new(lifetime);
        registry.open();
        registry
    }

    #[test]
    fn add_requires_open_registry() {
        let mut registry = ObjectRegistry::new(3);
        let err = registry.add(Category::Correct, Position::default()).unwrap_err();
        assert!(matches!(err, RoundError::InvalidState { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn add_starts_objects_at_full_life() {
        let mut registry = open_registry(3);
        let id = registry.add(Category::Correct, Position::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(id.as_str(), "ball_01_green");

        let ball = registry.get(&id).unwrap();
        assert_eq!(ball.remaining_life(), 3);
        assert_eq!(ball.position(), Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn add_reports_collision_with_live_id() {
        let mut registry = open_registry(3);
        let first = registry.add(Category::Correct, Position::default()).unwrap();
        let second = registry.add(Category::Wrong, Position::default()).unwrap();
        assert_eq!(second.as_str(), "ball_02_red");

        // Live count drops back to 1, so the next red ball is ball_02_red again
        registry.remove(&first).unwrap();
        let err = registry.add(Category::Wrong, Position::default()).unwrap_err();
        assert_eq!(err, RoundError::Collision(second.clone()));
        assert_eq!(registry.len(), 1);

        // A green ball at the same sequence is a different id
        let third = registry.add(Category::Correct, Position::default()).unwrap();
        assert_eq!(third.as_str(), "ball_02_green");
    }

    #[test]
    fn age_all_expires_objects_in_the_same_call() {
        let mut registry = open_registry(2);
        let id = registry.add(Category::Wrong, Position::default()).unwrap();

        assert!(registry.age_all().is_empty());
        assert_eq!(registry.get(&id).unwrap().remaining_life(), 1);

        let expired = registry.age_all();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id(), &id);
        assert!(!registry.contains(&id));
    }

    #[test]
    fn live_objects_never_reach_zero_life() {
        let mut registry = open_registry(3);
        for tick in 0..10 {
            if tick % 2 == 0 {
                let _ = registry.add(Category::Correct, Position::default());
            }
            registry.age_all();
            assert!(registry.iter().all(|o| o.remaining_life() >= 1));
        }
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut registry = open_registry(3);
        let id = ObjectId::from("ball_09_green");
        assert_eq!(registry.remove(&id).unwrap_err(), RoundError::NotFound(id));
    }

    #[test]
    fn closed_registry_does_not_age() {
        let mut registry = open_registry(1);
        registry.add(Category::Correct, Position::default()).unwrap();
        let dropped = registry.close();
        assert_eq!(dropped.len(), 1);
        assert!(registry.age_all().is_empty());
        assert!(!registry.is_open());
    }
}
