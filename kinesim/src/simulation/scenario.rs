//! Build validated scenarios from untrusted analyzer output
//!
//! Takes a `RawScenario` (serde-facing, loosely typed) and produces a
//! `Scenario` containing:
//! - the motion family as a closed enum (`MotionFamily`)
//! - runtime entities (`Entity`) with nalgebra positions
//! - numeric base parameters, with family defaults filled in
//! - the adjustable-parameter whitelist and unit metadata
//!
//! Validation is the only place malformed input is rejected; everything
//! downstream may assume a `Scenario` is internally consistent.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::configuration::config::{RawScenario, ShapeConfig};
use crate::error::ValidationError;
use crate::simulation::states::{Entity, NVec2, Shape};

/// Tunable names accepted even when the scenario declares no base value
pub const KNOWN_TUNABLES: [&str; 6] = [
    "velocity",
    "gravity",
    "angle",
    "mass",
    "acceleration",
    "friction",
];

pub const STANDARD_GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionFamily {
    Projectile,
    Linear,
    Collision,
    Pendulum,
    Incline,
    Circular,
}

impl MotionFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            MotionFamily::Projectile => "projectile",
            MotionFamily::Linear => "linear",
            MotionFamily::Collision => "collision",
            MotionFamily::Pendulum => "pendulum",
            MotionFamily::Incline => "incline",
            MotionFamily::Circular => "circular",
        }
    }

    /// Parameters the formulas cannot do without
    pub fn required_parameters(self) -> &'static [&'static str] {
        match self {
            MotionFamily::Projectile => &["velocity", "angle"],
            MotionFamily::Linear => &["velocity"],
            MotionFamily::Collision => &["m1", "m2", "v1", "v2"],
            MotionFamily::Pendulum => &["length", "angle"],
            MotionFamily::Incline => &["angle"],
            MotionFamily::Circular => &["radius", "velocity"],
        }
    }

    /// Values filled in when the analyzer leaves them out
    pub fn default_parameters(self) -> &'static [(&'static str, f64)] {
        match self {
            MotionFamily::Projectile | MotionFamily::Pendulum => &[("gravity", STANDARD_GRAVITY)],
            MotionFamily::Linear => &[("acceleration", 0.0)],
            MotionFamily::Incline => &[
                ("gravity", STANDARD_GRAVITY),
                ("friction", 0.0),
                ("velocity", 0.0),
            ],
            MotionFamily::Collision | MotionFamily::Circular => &[],
        }
    }

    /// Entities that take part in the motion; the rest are scenery
    pub fn moving_entities(self) -> usize {
        match self {
            MotionFamily::Collision => 2,
            _ => 1,
        }
    }

    /// Base values that must be strictly positive when present
    fn positive_parameters(self) -> &'static [&'static str] {
        match self {
            MotionFamily::Collision => &["m1", "m2"],
            MotionFamily::Pendulum | MotionFamily::Incline => &["length"],
            MotionFamily::Circular => &["radius"],
            _ => &[],
        }
    }
}

impl FromStr for MotionFamily {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projectile" => Ok(MotionFamily::Projectile),
            "linear" => Ok(MotionFamily::Linear),
            "collision" => Ok(MotionFamily::Collision),
            "pendulum" => Ok(MotionFamily::Pendulum),
            "incline" => Ok(MotionFamily::Incline),
            "circular" => Ok(MotionFamily::Circular),
            _ => Err(ValidationError::UnknownMotionFamily(s.to_owned())),
        }
    }
}

impl fmt::Display for MotionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated physics problem. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub motion_family: MotionFamily,
    pub entities: Vec<Entity>,
    pub parameters: BTreeMap<String, f64>,
    pub adjustable_parameters: BTreeSet<String>,
    pub units: BTreeMap<String, String>,
    pub description: String,
}

impl Scenario {
    /// Entities that follow the family's motion (one, or two for collisions)
    pub fn moving(&self) -> &[Entity] {
        let n = self.motion_family.moving_entities().min(self.entities.len());
        &self.entities[..n]
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }
}

pub fn validate(raw: RawScenario) -> Result<Scenario, ValidationError> {
    let family: MotionFamily = raw.motion_family.as_deref().unwrap_or("").parse()?;

    if raw.entities.is_empty() {
        return Err(ValidationError::NoEntities);
    }

    // Entities: map `RawEntity` -> runtime `Entity`, ids must be unique
    let mut seen = BTreeSet::new();
    let mut entities = Vec::with_capacity(raw.entities.len());
    for (i, re) in raw.entities.into_iter().enumerate() {
        let id = re.id.unwrap_or_else(|| format!("entity-{i}"));
        if !seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateEntityId(id));
        }
        if let Some(mass) = re.mass {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(ValidationError::InvalidMass { id, mass });
            }
        }
        entities.push(Entity {
            name: re.name.unwrap_or_else(|| id.clone()),
            id,
            mass: re.mass,
            initial_position: NVec2::new(re.initial_position.x, re.initial_position.y),
            shape: match re.shape {
                ShapeConfig::Circle => Shape::Circle,
                ShapeConfig::Rectangle => Shape::Rectangle,
                ShapeConfig::Point => Shape::Point,
            },
            color: re.color.unwrap_or_else(|| "#3b82f6".to_owned()),
        });
    }

    let needed = family.moving_entities();
    if entities.len() < needed {
        return Err(ValidationError::TooFewEntities {
            family: family.as_str(),
            needed,
            got: entities.len(),
        });
    }

    // Parameters: every value must be a finite number
    let mut parameters = BTreeMap::new();
    for (name, value) in raw.parameters {
        match value.as_f64() {
            Some(v) if v.is_finite() => {
                parameters.insert(name, v);
            }
            _ => return Err(ValidationError::MissingParameter(name)),
        }
    }

    for &name in family.required_parameters() {
        if !parameters.contains_key(name) {
            return Err(ValidationError::MissingParameter(name.to_owned()));
        }
    }

    for &(name, value) in family.default_parameters() {
        parameters.entry(name.to_owned()).or_insert_with(|| {
            debug!("{family}: defaulting {name} to {value}");
            value
        });
    }

    for &name in family.positive_parameters() {
        if parameters.get(name).is_some_and(|&v| v <= 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: name.to_owned(),
                reason: "must be positive",
            });
        }
    }

    let mut adjustable_parameters = BTreeSet::new();
    for name in raw.adjustable_parameters {
        if !parameters.contains_key(&name) && !KNOWN_TUNABLES.contains(&name.as_str()) {
            return Err(ValidationError::UnrecognizedAdjustable(name));
        }
        adjustable_parameters.insert(name);
    }

    Ok(Scenario {
        motion_family: family,
        entities,
        parameters,
        adjustable_parameters,
        units: raw.units,
        description: raw.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::RawEntity;
    use serde_json::{json, Value};

    fn raw(family: &str, params: &[(&str, Value)], entities: usize) -> RawScenario {
        RawScenario {
            motion_family: Some(family.to_owned()),
            entities: (0..entities).map(|_| RawEntity::default()).collect(),
            parameters: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn family_names_are_case_insensitive() {
        assert_eq!("Projectile".parse::<MotionFamily>(), Ok(MotionFamily::Projectile));
        assert_eq!(" circular ".parse::<MotionFamily>(), Ok(MotionFamily::Circular));
    }

    #[test]
    fn unknown_family_fails_closed() {
        let err = validate(raw("orbital", &[], 1)).unwrap_err();
        assert_eq!(err, ValidationError::UnknownMotionFamily("orbital".into()));

        let mut missing = raw("linear", &[("velocity", json!(1.0))], 1);
        missing.motion_family = None;
        assert!(matches!(
            validate(missing),
            Err(ValidationError::UnknownMotionFamily(_))
        ));
    }

    #[test]
    fn empty_entities_rejected() {
        let err = validate(raw("linear", &[("velocity", json!(1.0))], 0)).unwrap_err();
        assert_eq!(err, ValidationError::NoEntities);
    }

    #[test]
    fn missing_parameter_is_named() {
        let err = validate(raw("projectile", &[("velocity", json!(5.0))], 1)).unwrap_err();
        assert_eq!(err, ValidationError::MissingParameter("angle".into()));
    }

    #[test]
    fn non_numeric_parameter_is_missing() {
        let params = [("velocity", json!("fast")), ("angle", json!(30.0))];
        let err = validate(raw("projectile", &params, 1)).unwrap_err();
        assert_eq!(err, ValidationError::MissingParameter("velocity".into()));

        let params = [("velocity", Value::Null), ("angle", json!(30.0))];
        let err = validate(raw("projectile", &params, 1)).unwrap_err();
        assert_eq!(err, ValidationError::MissingParameter("velocity".into()));
    }

    #[test]
    fn collision_needs_two_bodies_and_positive_masses() {
        let params = [
            ("m1", json!(2.0)),
            ("m2", json!(1.0)),
            ("v1", json!(3.0)),
            ("v2", json!(0.0)),
        ];
        assert!(matches!(
            validate(raw("collision", &params, 1)),
            Err(ValidationError::TooFewEntities { needed: 2, got: 1, .. })
        ));

        let params = [
            ("m1", json!(0.0)),
            ("m2", json!(1.0)),
            ("v1", json!(3.0)),
            ("v2", json!(0.0)),
        ];
        assert!(matches!(
            validate(raw("collision", &params, 2)),
            Err(ValidationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn zero_entity_mass_rejected() {
        let mut r = raw("linear", &[("velocity", json!(1.0))], 1);
        r.entities[0].mass = Some(0.0);
        assert!(matches!(validate(r), Err(ValidationError::InvalidMass { .. })));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut r = raw("linear", &[("velocity", json!(1.0))], 2);
        r.entities[0].id = Some("a".into());
        r.entities[1].id = Some("a".into());
        assert_eq!(validate(r), Err(ValidationError::DuplicateEntityId("a".into())));
    }

    #[test]
    fn adjustable_must_be_known_or_declared() {
        let mut r = raw("linear", &[("velocity", json!(1.0)), ("drag", json!(0.1))], 1);
        r.adjustable_parameters = vec!["drag".into(), "mass".into()];
        let scenario = validate(r).unwrap();
        assert!(scenario.adjustable_parameters.contains("drag"));
        assert!(scenario.adjustable_parameters.contains("mass"));

        let mut r = raw("linear", &[("velocity", json!(1.0))], 1);
        r.adjustable_parameters = vec!["spin".into()];
        assert_eq!(
            validate(r),
            Err(ValidationError::UnrecognizedAdjustable("spin".into()))
        );
    }

    #[test]
    fn family_defaults_are_filled_in() {
        let scenario = validate(raw("incline", &[("angle", json!(30.0))], 1)).unwrap();
        assert_eq!(scenario.parameters["gravity"], STANDARD_GRAVITY);
        assert_eq!(scenario.parameters["friction"], 0.0);
        assert_eq!(scenario.entities[0].id, "entity-0");
        assert_eq!(scenario.entities[0].name, "entity-0");
        assert_eq!(scenario.moving().len(), 1);
    }

    #[test]
    fn incline_length_must_be_positive_when_given() {
        for length in [0.0, -5.0] {
            let params = [("angle", json!(30.0)), ("length", json!(length))];
            assert_eq!(
                validate(raw("incline", &params, 1)),
                Err(ValidationError::InvalidParameter {
                    name: "length".into(),
                    reason: "must be positive",
                })
            );
        }
        let params = [("angle", json!(30.0)), ("length", json!(5.0))];
        assert!(validate(raw("incline", &params, 1)).is_ok());
    }
}
