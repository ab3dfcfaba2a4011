//! Spawner - drops a random handful of balls into the registry each spawn tick

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::RoundConfig;

use super::error::RoundError;
use super::object::{Category, ObjectId, Position, SpawnBounds};
use super::registry::ObjectRegistry;

/// Random ball generator (deterministic for a given seed)
pub struct Spawner {
    rng: ChaCha8Rng,
    spawn_min: u32,
    spawn_max: u32,
    bounds: SpawnBounds,
}

impl Spawner {
    pub fn new(seed: u64, config: &RoundConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            spawn_min: config.spawn_min,
            spawn_max: config.spawn_max,
            bounds: config.spawn_bounds,
        }
    }

    /// Restart the random sequence
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Spawn one batch into `registry`, returning the ids that were added.
    ///
    /// Units whose id collides with a live object are skipped, not retried,
    /// so a batch may add fewer balls than it drew.
    pub fn spawn(&mut self, registry: &mut ObjectRegistry) -> Result<Vec<ObjectId>, RoundError> {
        let count = self.rng.gen_range(self.spawn_min..=self.spawn_max);
        let mut added = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let category = self.random_category();
            let position = self.random_position();

            match registry.add(category, position) {
                Ok(id) => added.push(id),
                Err(RoundError::Collision(id)) => {
                    debug!(object_id = %id, "Spawn id already live, skipping unit");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(added)
    }

    fn random_category(&mut self) -> Category {
        if self.rng.gen_bool(0.5) {
            Category::Correct
        } else {
            Category::Wrong
        }
    }

    fn random_position(&mut self) -> Position {
        let SpawnBounds { min, max } = self.bounds;
        Position {
            x: self.rng.gen_range(min.x..=max.x),
            y: self.rng.gen_range(min.y..=max.y),
            z: self.rng.gen_range(min.z..=max.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_registry() -> ObjectRegistry {
        let mut registry = ObjectRegistry::new(3);
        registry.open();
        registry
    }

    #[test]
    fn batch_size_stays_in_range() {
        let config = RoundConfig::default();
        let mut spawner = Spawner::new(7, &config);

        for _ in 0..200 {
            let mut registry = open_registry();
            let added = spawner.spawn(&mut registry).unwrap();
            // Fresh registry, so no collisions are possible
            assert!((1..=4).contains(&added.len()), "got {}", added.len());
            assert_eq!(registry.len(), added.len());
        }
    }

    #[test]
    fn positions_fall_inside_bounds() {
        let config = RoundConfig::default();
        let mut spawner = Spawner::new(11, &config);
        let mut registry = open_registry();

        for _ in 0..20 {
            spawner.spawn(&mut registry).unwrap();
            for ball in registry.clear() {
                let p = ball.position();
                assert!(config.spawn_bounds.contains(&p), "{p:?} out of bounds");
            }
        }
    }

    #[test]
    fn both_categories_show_up() {
        let config = RoundConfig::default();
        let mut spawner = Spawner::new(3, &config);
        let draws: Vec<Category> = (0..64).map(|_| spawner.random_category()).collect();
        assert!(draws.contains(&Category::Correct));
        assert!(draws.contains(&Category::Wrong));
    }

    #[test]
    fn same_seed_same_batch() {
        let config = RoundConfig::default();
        let mut a = Spawner::new(99, &config);
        let mut b = Spawner::new(99, &config);
        let mut reg_a = open_registry();
        let mut reg_b = open_registry();

        assert_eq!(a.spawn(&mut reg_a).unwrap(), b.spawn(&mut reg_b).unwrap());
        let pos_a: Vec<Position> = reg_a.iter().map(|o| o.position()).collect();
        let pos_b: Vec<Position> = reg_b.iter().map(|o| o.position()).collect();
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn fixed_batch_with_collisions_skips_units() {
        let config = RoundConfig {
            spawn_min: 4,
            spawn_max: 4,
            ..RoundConfig::default()
        };
        let mut spawner = Spawner::new(5, &config);
        let mut registry = open_registry();

        let first = spawner.spawn(&mut registry).unwrap();
        assert_eq!(first.len(), 4);

        // Removing the oldest ball makes the next sequence numbers clash
        // with balls that are still live
        let oldest = first[0].clone();
        registry.remove(&oldest).unwrap();
        let second = spawner.spawn(&mut registry).unwrap();
        assert!(second.len() <= 4);
        assert!(second.iter().all(|id| !first[1..].contains(id)));
        assert_eq!(registry.len(), 3 + second.len());
    }

    #[test]
    fn closed_registry_is_invalid_state() {
        let config = RoundConfig::default();
        let mut spawner = Spawner::new(1, &config);
        let mut registry = ObjectRegistry::new(3);
        assert!(matches!(
            spawner.spawn(&mut registry),
            Err(RoundError::InvalidState { .. })
        ));
    }
}
