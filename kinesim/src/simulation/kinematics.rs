//! Closed-form kinematics, one pure function per motion family
//!
//! Every function maps `(entity, parameters, t)` to a `KinematicState`
//! with no hidden state, so any frame can be evaluated directly from its
//! time. Angles arrive in degrees and are converted only for trigonometry.
//! y points up; `entity.initial_position` is the reference origin.

use crate::error::ComputationError;
use crate::simulation::params::ParameterSet;
use crate::simulation::scenario::{MotionFamily, Scenario};
use crate::simulation::states::{Entity, EntityFrame, FrameState, KinematicState, NVec2};

fn out_of_domain(name: &str, value: f64, reason: &'static str) -> ComputationError {
    ComputationError::OutOfDomain {
        name: name.to_owned(),
        value,
        reason,
    }
}

/// Launch from the entity's position with speed `velocity` at `angle` degrees
/// above the horizontal, under downward `gravity`
pub fn projectile(entity: &Entity, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let v0 = params.require("velocity")?;
    let theta = params.require("angle")?.to_radians();
    let g = params.require("gravity")?;

    let vx = v0 * theta.cos();
    let vy = v0 * theta.sin();

    Ok(KinematicState {
        position: entity.initial_position + NVec2::new(vx * t, vy * t - 0.5 * g * t * t),
        velocity: NVec2::new(vx, vy - g * t),
        acceleration: NVec2::new(0.0, -g),
    })
}

/// Constant acceleration along x starting at `origin`; y is held
pub fn linear_motion(origin: NVec2, v0: f64, a: f64, t: f64) -> KinematicState {
    KinematicState {
        position: NVec2::new(origin.x + v0 * t + 0.5 * a * t * t, origin.y),
        velocity: NVec2::new(v0 + a * t, 0.0),
        acceleration: NVec2::new(a, 0.0),
    }
}

pub fn linear(entity: &Entity, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let v0 = params.require("velocity")?;
    let a = params.require_or("acceleration", 0.0)?;
    Ok(linear_motion(entity.initial_position, v0, a, t))
}

/// Final velocities of a 1-D perfectly elastic collision
pub fn elastic_collision(m1: f64, v1: f64, m2: f64, v2: f64) -> (f64, f64) {
    let total = m1 + m2;
    let v1_final = ((m1 - m2) * v1 + 2.0 * m2 * v2) / total;
    let v2_final = ((m2 - m1) * v2 + 2.0 * m1 * v1) / total;
    (v1_final, v2_final)
}

/// Time at which two bodies moving along x meet.
/// Coincident bodies collide immediately; separating ones never do.
pub fn contact_time(x1: f64, v1: f64, x2: f64, v2: f64) -> Option<f64> {
    let gap = x2 - x1;
    if gap == 0.0 {
        return Some(0.0);
    }
    let closing = v1 - v2;
    if closing == 0.0 {
        return None;
    }
    let t = gap / closing;
    (t > 0.0).then_some(t)
}

/// Pre- and post-collision parameters of a two-body scenario
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPlan {
    pub v1: f64,
    pub v2: f64,
    pub v1_final: f64,
    pub v2_final: f64,
    pub contact: Option<f64>, // None if the bodies never meet
}

pub fn collision_plan(first: &Entity, second: &Entity, params: &ParameterSet) -> Result<CollisionPlan, ComputationError> {
    let m1 = params.require("m1")?;
    let m2 = params.require("m2")?;
    let v1 = params.require("v1")?;
    let v2 = params.require("v2")?;
    if m1 <= 0.0 {
        return Err(out_of_domain("m1", m1, "mass must be positive"));
    }
    if m2 <= 0.0 {
        return Err(out_of_domain("m2", m2, "mass must be positive"));
    }

    let (v1_final, v2_final) = elastic_collision(m1, v1, m2, v2);
    Ok(CollisionPlan {
        v1,
        v2,
        v1_final,
        v2_final,
        contact: contact_time(first.initial_position.x, v1, second.initial_position.x, v2),
    })
}

/// State of body `index` (0 or 1): linear at the pre-collision velocity until
/// contact, then linear at the post-collision velocity from the contact point
pub fn collision_body(entity: &Entity, index: usize, plan: &CollisionPlan, t: f64) -> KinematicState {
    let (v, v_final) = if index == 0 {
        (plan.v1, plan.v1_final)
    } else {
        (plan.v2, plan.v2_final)
    };
    match plan.contact {
        Some(tc) if t >= tc => {
            let at_contact = linear_motion(entity.initial_position, v, 0.0, tc);
            linear_motion(at_contact.position, v_final, 0.0, t - tc)
        }
        _ => linear_motion(entity.initial_position, v, 0.0, t),
    }
}

/// Small-angle pendulum hanging from the entity's initial position.
/// `angle` is the release amplitude in degrees.
pub fn pendulum(entity: &Entity, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let length = params.require("length")?;
    let theta0 = params.require("angle")?.to_radians();
    let g = params.require("gravity")?;
    if length <= 0.0 {
        return Err(out_of_domain("length", length, "must be positive"));
    }
    if g < 0.0 {
        return Err(out_of_domain("gravity", g, "must not be negative"));
    }

    let omega = (g / length).sqrt();
    let theta = theta0 * (omega * t).cos();
    let theta_dot = -theta0 * omega * (omega * t).sin();
    let theta_ddot = -omega * omega * theta;

    let (sin, cos) = theta.sin_cos();
    let tangent = NVec2::new(cos, sin);
    let inward = NVec2::new(-sin, cos);

    Ok(KinematicState {
        position: entity.initial_position + length * NVec2::new(sin, -cos),
        velocity: length * theta_dot * tangent,
        acceleration: length * theta_ddot * tangent + length * theta_dot * theta_dot * inward,
    })
}

/// Along-slope motion of a block: distance, speed and acceleration down the slope
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slide {
    s: f64,
    v: f64,
    a: f64,
}

#[derive(Debug, Clone, Copy)]
struct Slope {
    down: f64, // acceleration while sliding down
    up: f64, // deceleration magnitude while moving up
}

impl Slope {
    fn new(g: f64, theta: f64, mu: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            down: g * (sin - mu * cos),
            up: g * (sin + mu * cos),
        }
    }

    /// Phase of a block that starts at rest or moving down the slope
    fn from_downhill(&self, v0: f64, t: f64) -> Slide {
        let a = self.down;
        if v0 == 0.0 && a <= 0.0 {
            return Slide { s: 0.0, v: 0.0, a: 0.0 };
        }
        if a < 0.0 {
            let stop = v0 / -a;
            if t >= stop {
                return Slide {
                    s: v0 * stop + 0.5 * a * stop * stop,
                    v: 0.0,
                    a: 0.0,
                };
            }
        }
        Slide {
            s: v0 * t + 0.5 * a * t * t,
            v: v0 + a * t,
            a,
        }
    }

    /// Time the block comes to rest after being pushed uphill (v0 < 0)
    fn uphill_stop(&self, v0: f64) -> Option<f64> {
        (v0 < 0.0 && self.up > 0.0).then(|| -v0 / self.up)
    }

    fn at(&self, v0: f64, t: f64) -> Slide {
        if v0 >= 0.0 {
            return self.from_downhill(v0, t);
        }
        match self.uphill_stop(v0) {
            Some(stop) if t >= stop => {
                let s_stop = v0 * stop + 0.5 * self.up * stop * stop;
                let rest = self.from_downhill(0.0, t - stop);
                Slide { s: s_stop + rest.s, ..rest }
            }
            _ => Slide {
                s: v0 * t + 0.5 * self.up * t * t,
                v: v0 + self.up * t,
                a: self.up,
            },
        }
    }
}

/// Time to cover `d` starting at speed `v` with constant acceleration `a`
fn travel_time(v: f64, a: f64, d: f64) -> Option<f64> {
    if d <= 0.0 {
        return Some(0.0);
    }
    let disc = v * v + 2.0 * a * d;
    if disc < 0.0 {
        return None;
    }
    let denom = v + disc.sqrt();
    (denom > 0.0).then(|| 2.0 * d / denom)
}

fn slope_from(params: &ParameterSet) -> Result<(Slope, f64, f64), ComputationError> {
    let theta = params.require("angle")?.to_radians();
    let g = params.require("gravity")?;
    let mu = params.require_or("friction", 0.0)?;
    let v0 = params.require_or("velocity", 0.0)?;
    if mu < 0.0 {
        return Err(out_of_domain("friction", mu, "must not be negative"));
    }
    Ok((Slope::new(g, theta, mu), theta, v0))
}

/// Block on an incline of `angle` degrees, released from the entity's
/// position with speed `velocity` down the slope (negative pushes it uphill)
pub fn incline(entity: &Entity, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let (slope, theta, v0) = slope_from(params)?;
    let slide = slope.at(v0, t);
    let down = NVec2::new(theta.cos(), -theta.sin());

    Ok(KinematicState {
        position: entity.initial_position + slide.s * down,
        velocity: slide.v * down,
        acceleration: slide.a * down,
    })
}

/// Time at which the block has travelled `length` down the slope
fn incline_end(params: &ParameterSet) -> Result<Option<f64>, ComputationError> {
    let length = params.require("length")?;
    if length <= 0.0 {
        return Err(out_of_domain("length", length, "must be positive"));
    }
    let (slope, _, v0) = slope_from(params)?;
    if v0 >= 0.0 {
        if v0 == 0.0 && slope.down <= 0.0 {
            return Ok(None);
        }
        return Ok(travel_time(v0, slope.down, length));
    }
    let Some(stop) = slope.uphill_stop(v0) else {
        return Ok(None);
    };
    let s_stop = v0 * stop + 0.5 * slope.up * stop * stop;
    if slope.down <= 0.0 {
        return Ok(None);
    }
    Ok(travel_time(0.0, slope.down, length - s_stop).map(|rest| stop + rest))
}

/// Uniform circular motion about the entity's position, starting on the +x axis
pub fn circular(entity: &Entity, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let r = params.require("radius")?;
    let v = params.require("velocity")?;
    if r <= 0.0 {
        return Err(out_of_domain("radius", r, "must be positive"));
    }

    let omega = v / r;
    let (sin, cos) = (omega * t).sin_cos();
    Ok(KinematicState {
        position: entity.initial_position + r * NVec2::new(cos, sin),
        velocity: v * NVec2::new(-sin, cos),
        acceleration: -omega * omega * r * NVec2::new(cos, sin),
    })
}

/// State of the scenario's entity at `index`. Scenery entities sit still.
pub fn evaluate(scenario: &Scenario, index: usize, params: &ParameterSet, t: f64) -> Result<KinematicState, ComputationError> {
    let entity = scenario
        .entities
        .get(index)
        .ok_or(ComputationError::NoSuchEntity(index))?;
    if index >= scenario.motion_family.moving_entities() {
        return Ok(KinematicState::at_rest(entity.initial_position));
    }
    match scenario.motion_family {
        MotionFamily::Projectile => projectile(entity, params, t),
        MotionFamily::Linear => linear(entity, params, t),
        MotionFamily::Pendulum => pendulum(entity, params, t),
        MotionFamily::Incline => incline(entity, params, t),
        MotionFamily::Circular => circular(entity, params, t),
        MotionFamily::Collision => {
            let plan = collision_plan(&scenario.entities[0], &scenario.entities[1], params)?;
            Ok(collision_body(entity, index, &plan, t))
        }
    }
}

/// Evaluate every entity at `t`. Fails as a whole if any entity fails.
pub fn evaluate_frame(scenario: &Scenario, params: &ParameterSet, t: f64) -> Result<FrameState, ComputationError> {
    let entities = scenario
        .entities
        .iter()
        .enumerate()
        .map(|(i, e)| evaluate(scenario, i, params, t).map(|state| EntityFrame::new(&e.id, state)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FrameState { sim_time: t, entities })
}

/// When the motion itself ends, if it does: projectile landing on the
/// ground plane y = 0, or an incline block reaching the end of the slope
pub fn terminal_time(scenario: &Scenario, params: &ParameterSet) -> Result<Option<f64>, ComputationError> {
    match scenario.motion_family {
        MotionFamily::Projectile => {
            let y0 = scenario.entities[0].initial_position.y;
            let v0 = params.require("velocity")?;
            let theta = params.require("angle")?.to_radians();
            let g = params.require("gravity")?;
            if g <= 0.0 {
                return Ok(None);
            }
            let vy = v0 * theta.sin();
            let disc = vy * vy + 2.0 * g * y0;
            if disc < 0.0 {
                return Ok(None);
            }
            let t = (vy + disc.sqrt()) / g;
            Ok((t > 0.0).then_some(t))
        }
        MotionFamily::Incline => match params.get("length") {
            Some(_) => incline_end(params),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}
