pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Entity, EntityFrame, FrameState, KinematicState, NVec2, Shape};
pub use simulation::scenario::{validate, MotionFamily, Scenario};
pub use simulation::params::{ParameterSet, ParameterStore};
pub use simulation::engine::Stepper;
pub use simulation::scheduler::{AnimationLoop, FrameQueue, FrameScheduler, FrameToken};
pub use simulation::analyzer::ScenarioAnalyzer;

pub use configuration::config::{ClockMode, EngineConfig, RawEntity, RawScenario, SimulationFile, TerminalPolicy, ViewportConfig};

pub use error::{AnalysisError, ComputationError, ConfigError, SimError, ValidationError};

pub use visualization::render::{CommandRenderer, DrawCommand, SceneRenderer, ScreenPoint, TextRenderer};
#[cfg(feature = "viewer")]
pub use visualization::vis2d::run_2d;

pub use benchmark::benchmark::{bench_tick, bench_trajectory};
