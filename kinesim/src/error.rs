//! Error types for kinesim.

use thiserror::Error;

/// Malformed or incomplete analyzer output. Fatal to a scenario load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown motion family: {0:?}")]
    UnknownMotionFamily(String),

    #[error("scenario has no entities")]
    NoEntities,

    #[error("duplicate entity id: {0}")]
    DuplicateEntityId(String),

    #[error("entity {id} has invalid mass {mass}")]
    InvalidMass { id: String, mass: f64 },

    #[error("{family} needs at least {needed} entities, got {got}")]
    TooFewEntities {
        family: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("missing or non-numeric parameter: {0}")]
    MissingParameter(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: &'static str },

    #[error("adjustable parameter {0} is not a recognized tunable")]
    UnrecognizedAdjustable(String),
}

/// A kinematics function received input it cannot evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("parameter {0} is not set")]
    MissingParameter(String),

    #[error("parameter {name} is not finite ({value})")]
    NonFinite { name: String, value: f64 },

    #[error("parameter {name} = {value} is out of domain: {reason}")]
    OutOfDomain {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("scenario has no entity at index {0}")]
    NoSuchEntity(usize),
}

/// Engine settings that cannot drive the clock.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("engine setting {name} must be finite and positive, got {value}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: f64,
}

/// Failure reported by an external scenario analyzer.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("analysis failed: {0}")]
pub struct AnalysisError(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("parameter {0} is not adjustable in this scenario")]
    UnknownParameter(String),

    #[error("tick skipped: {0}")]
    Computation(#[from] ComputationError),

    #[error("no scenario loaded")]
    NotRunning,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub type Result<T> = std::result::Result<T, SimError>;
