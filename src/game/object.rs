//! Game objects ("balls") and their value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoring polarity of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Green ball, picking it scores
    Correct,
    /// Red ball, picking it is a penalty
    Wrong,
}

impl Category {
    /// Colour name used in object ids
    pub fn colour_name(self) -> &'static str {
        match self {
            Category::Correct => "green",
            Category::Wrong => "red",
        }
    }

    /// Display colour (linear RGB)
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Category::Correct => [0.0, 1.0, 0.0],
            Category::Wrong => [1.0, 0.0, 0.0],
        }
    }
}

/// Identifier of a live object, shared with the scene and the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Deterministic spawn name, e.g. `ball_03_green`
    pub fn for_spawn(seq: usize, category: Category) -> Self {
        Self(format!("ball_{:02}_{}", seq, category.colour_name()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// World-space position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned box that spawn positions are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBounds {
    pub min: Position,
    pub max: Position,
}

impl SpawnBounds {
    pub fn contains(&self, p: &Position) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            min: Position::new(-5.0, 0.5, -5.0),
            max: Position::new(5.0, 5.0, 5.0),
        }
    }
}

/// A live ball. Only the registry ages it.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    id: ObjectId,
    category: Category,
    position: Position,
    remaining_life: u32,
}

impl GameObject {
    pub(super) fn new(id: ObjectId, category: Category, position: Position, life: u32) -> Self {
        Self {
            id,
            category,
            position,
            remaining_life: life,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn remaining_life(&self) -> u32 {
        self.remaining_life
    }

    /// Decrement life, returns true once it reaches zero
    pub(super) fn age(&mut self) -> bool {
        self.remaining_life = self.remaining_life.saturating_sub(1);
        self.remaining_life == 0
    }
}
