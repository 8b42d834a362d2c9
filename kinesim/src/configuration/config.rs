//! Configuration types for loading simulation scenarios from YAML or JSON.
//!
//! This module defines thin, `serde`-deserializable representations of:
//!
//! - [`EngineConfig`]    – stepper options (step, run length, terminal policy, clock)
//! - [`ViewportConfig`]  – world-to-screen transform and renderer options
//! - [`RawScenario`]     – untrusted analyzer output, validated into a `Scenario`
//! - [`SimulationFile`]  – top-level wrapper used by the CLI
//!
//! # File format
//! A projectile scenario matching these types:
//!
//! ```yaml
//! engine:
//!   step: 0.0166666667      # logical tick in seconds
//!   t_end: 10.0             # run length cap
//!   on_terminal: "loop"     # or "halt"
//!   clock: "fixed"          # or "wall"
//!
//! viewport:
//!   scale: 20.0
//!
//! scenario:
//!   motionFamily: "projectile"
//!   description: "A ball is thrown straight up at 10 m/s"
//!   entities:
//!     - id: "ball"
//!       name: "Ball"
//!       mass: 0.5
//!       initialPosition: { x: 0.0, y: 0.0 }
//!       shape: "circle"
//!       color: "#e4572e"
//!   parameters:
//!     velocity: 10.0
//!     angle: 90.0
//!     gravity: 9.8
//!   adjustableParameters: ["velocity", "angle", "gravity"]
//!   units: { velocity: "m/s", angle: "deg", gravity: "m/s^2" }
//! ```
//!
//! `RawScenario` uses the analyzer's camelCase field names. Parameter values are
//! kept as untyped JSON values so the validator can name non-numeric fields.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;

/// What the stepper does when a run reaches its terminal time
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalPolicy {
    #[serde(rename = "loop")] // restart at simTime 0, replaying forever
    #[default]
    Loop,

    #[serde(rename = "halt")] // freeze on the terminal frame until reset
    Halt,
}

/// How far one tick advances simulation time
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    #[serde(rename = "fixed")] // constant logical step, independent of frame timing
    #[default]
    Fixed,

    #[serde(rename = "wall")] // real elapsed seconds, clamped to max_step
    Wall,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub step: f64, // logical tick in seconds
    pub max_step: f64, // largest advance per tick in wall-clock mode
    pub t_end: f64, // run length cap
    pub on_terminal: TerminalPolicy,
    pub clock: ClockMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step: 1.0 / 60.0,
            max_step: 0.1,
            t_end: 10.0,
            on_terminal: TerminalPolicy::Loop,
            clock: ClockMode::Fixed,
        }
    }
}

impl EngineConfig {
    /// `step`, `max_step` and `t_end` are durations: finite and > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("step", self.step), ("max_step", self.max_step), ("t_end", self.t_end)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError { name, value });
            }
        }
        Ok(())
    }
}

/// World-to-screen transform plus renderer knobs.
/// `screen_x = origin_x + world_x * scale`, `screen_y = ground_y - world_y * scale`
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64, // pixels
    pub height: f64, // pixels
    pub origin_x: f64, // screen x of world x = 0
    pub ground_y: f64, // screen y of world y = 0
    pub scale: f64, // pixels per metre
    pub trail_samples: usize, // trajectory sub-steps per draw
    pub velocity_scale: f64, // seconds of travel shown by a velocity arrow
    pub background: String,
    pub ground_color: String,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            origin_x: 50.0,
            ground_y: 350.0,
            scale: 20.0,
            trail_samples: 60,
            velocity_scale: 0.2,
            background: "#f8fafc".to_owned(),
            ground_color: "#334155".to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct RawVector2 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeConfig {
    #[default]
    Circle,
    Rectangle,
    Point,
}

/// One entity as the analyzer reports it
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEntity {
    pub id: Option<String>, // defaults to `entity-<index>`
    pub name: Option<String>, // defaults to the id
    pub mass: Option<f64>,
    pub initial_position: RawVector2,
    pub shape: ShapeConfig,
    pub color: Option<String>,
}

/// Untrusted scenario description produced by the external analyzer
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawScenario {
    pub motion_family: Option<String>,
    pub entities: Vec<RawEntity>,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub adjustable_parameters: Vec<String>,
    pub units: BTreeMap<String, String>,
    pub description: String,
}

/// Top-level scenario file loaded by the CLI
#[derive(Deserialize, Debug, Clone)]
pub struct SimulationFile {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    pub scenario: RawScenario,
}
