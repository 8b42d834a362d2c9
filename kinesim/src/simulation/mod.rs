pub mod analyzer;
pub mod engine;
pub mod kinematics;
pub mod params;
pub mod scenario;
pub mod scheduler;
pub mod states;
