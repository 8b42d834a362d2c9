//! Renderer contract: frame + scenario in, drawing out
//!
//! Renderers own no simulation state. Trajectories are re-sampled from the
//! closed-form formulas on every draw rather than accumulated from past frames.

use log::trace;

use crate::configuration::config::ViewportConfig;
use crate::simulation::kinematics::evaluate;
use crate::simulation::params::ParameterSet;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{FrameState, NVec2, Shape};

const GLYPH_RADIUS: f64 = 8.0; // px
const LABEL_OFFSET: f64 = 14.0; // px above the glyph

/// Point in screen space: x right, y down, pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64, color: String },
    Line { from: ScreenPoint, to: ScreenPoint, color: String },
    Polyline { points: Vec<ScreenPoint>, color: String },
    Circle { center: ScreenPoint, radius: f64, color: String },
    Rect { center: ScreenPoint, width: f64, height: f64, color: String },
    Point { at: ScreenPoint, color: String },
    Arrow { from: ScreenPoint, to: ScreenPoint, color: String },
    Label { at: ScreenPoint, text: String },
}

pub trait SceneRenderer {
    type Output;

    fn render(&mut self, frame: &FrameState, scenario: &Scenario, params: &ParameterSet) -> Self::Output;
}

impl ViewportConfig {
    /// Fixed world-to-screen affine transform
    pub fn to_screen(&self, world: NVec2) -> ScreenPoint {
        ScreenPoint {
            x: self.origin_x + world.x * self.scale,
            y: self.ground_y - world.y * self.scale,
        }
    }
}

/// Reference renderer producing a backend-neutral command list
#[derive(Debug, Clone, Default)]
pub struct CommandRenderer {
    pub viewport: ViewportConfig,
}

impl CommandRenderer {
    pub fn new(viewport: ViewportConfig) -> Self {
        Self { viewport }
    }

    /// Path of entity `index` from t = 0 to `until`, `trail_samples` sub-steps.
    /// `None` when there is nothing to draw or `index` is out of range.
    pub fn trajectory(&self, scenario: &Scenario, index: usize, params: &ParameterSet, until: f64) -> Option<Vec<ScreenPoint>> {
        let n = self.viewport.trail_samples;
        if n == 0 || until <= 0.0 {
            return None;
        }
        (0..=n)
            .map(|i| {
                let t = until * i as f64 / n as f64;
                evaluate(scenario, index, params, t).map(|s| self.viewport.to_screen(s.position))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| trace!("no trail for entity {index}: {err}"))
            .ok()
    }
}

impl SceneRenderer for CommandRenderer {
    type Output = Vec<DrawCommand>;

    fn render(&mut self, frame: &FrameState, scenario: &Scenario, params: &ParameterSet) -> Vec<DrawCommand> {
        let vp = &self.viewport;
        let mut out = vec![
            DrawCommand::Clear {
                width: vp.width,
                height: vp.height,
                color: vp.background.clone(),
            },
            DrawCommand::Line {
                from: ScreenPoint { x: 0.0, y: vp.ground_y },
                to: ScreenPoint { x: vp.width, y: vp.ground_y },
                color: vp.ground_color.clone(),
            },
        ];

        for (index, entity) in scenario.moving().iter().enumerate() {
            if let Some(points) = self.trajectory(scenario, index, params, frame.sim_time) {
                out.push(DrawCommand::Polyline {
                    points,
                    color: entity.color.clone(),
                });
            }
        }

        for (entity, state) in scenario.entities.iter().zip(&frame.entities) {
            let center = vp.to_screen(state.position);
            let color = entity.color.clone();
            out.push(match entity.shape {
                Shape::Circle => DrawCommand::Circle {
                    center,
                    radius: GLYPH_RADIUS,
                    color: color.clone(),
                },
                Shape::Rectangle => DrawCommand::Rect {
                    center,
                    width: 2.0 * GLYPH_RADIUS,
                    height: 2.0 * GLYPH_RADIUS,
                    color: color.clone(),
                },
                Shape::Point => DrawCommand::Point {
                    at: center,
                    color: color.clone(),
                },
            });
            if state.velocity != NVec2::zeros() {
                out.push(DrawCommand::Arrow {
                    from: center,
                    to: vp.to_screen(state.position + state.velocity * vp.velocity_scale),
                    color,
                });
            }
            out.push(DrawCommand::Label {
                at: ScreenPoint {
                    x: center.x,
                    y: center.y - LABEL_OFFSET,
                },
                text: entity.name.clone(),
            });
        }
        out
    }
}

/// Plain-text dump of a frame, for headless runs and logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl SceneRenderer for TextRenderer {
    type Output = String;

    fn render(&mut self, frame: &FrameState, scenario: &Scenario, _params: &ParameterSet) -> String {
        let mut lines = vec![format!("t={:.4}s", frame.sim_time)];
        for (entity, state) in scenario.entities.iter().zip(&frame.entities) {
            let (p, v, a) = (state.position, state.velocity, state.acceleration);
            lines.push(format!(
                "  {:<12} pos=({:.3}, {:.3}) vel=({:.3}, {:.3}) acc=({:.3}, {:.3})",
                entity.name, p.x, p.y, v.x, v.y, a.x, a.y
            ));
        }
        lines.join("\n")
    }
}
