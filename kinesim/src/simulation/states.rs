//! Core state types for the kinematics engine.
//!
//! - `Entity`         an immutable body taken from the scenario
//! - `KinematicState` position/velocity/acceleration of one entity at one time
//! - `FrameState`     one tick's snapshot for every entity, in scenario order
//!
//! All vectors are `NVec2` (nalgebra, f64) with y pointing up.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

/// How an entity is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Rectangle,
    Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String, // unique within a scenario
    pub name: String, // display name
    pub mass: Option<f64>, // kg, > 0 when present
    pub initial_position: NVec2, // reference origin of every formula
    pub shape: Shape,
    pub color: String, // opaque, passed through to the renderer
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub position: NVec2,
    pub velocity: NVec2,
    pub acceleration: NVec2,
}

impl KinematicState {
    /// Entity sitting still at `position`
    pub fn at_rest(position: NVec2) -> Self {
        Self {
            position,
            velocity: NVec2::zeros(),
            acceleration: NVec2::zeros(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityFrame {
    pub entity_id: String,
    pub position: NVec2,
    pub velocity: NVec2,
    pub acceleration: NVec2,
}

impl EntityFrame {
    pub fn new(entity_id: &str, state: KinematicState) -> Self {
        Self {
            entity_id: entity_id.to_owned(),
            position: state.position,
            velocity: state.velocity,
            acceleration: state.acceleration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub sim_time: f64, // >= 0
    pub entities: Vec<EntityFrame>, // same order as scenario entities
}

impl FrameState {
    /// Look up an entity by id
    pub fn entity(&self, id: &str) -> Option<&EntityFrame> {
        self.entities.iter().find(|e| e.entity_id == id)
    }
}
