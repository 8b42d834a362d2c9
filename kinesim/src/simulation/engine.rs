//! Simulation clock and stepper
//!
//! Two-state machine:
//! - `Idle`     no scenario loaded
//! - `Running`  owns the scenario, its parameter store, simTime and the last good frame
//!
//! Every frame is a pure function of (scenario, parameter snapshot, simTime),
//! so reset and seek never replay history.

use log::{debug, info, warn};

use crate::configuration::config::{ClockMode, EngineConfig, RawScenario, TerminalPolicy};
use crate::error::{ComputationError, Result, SimError};
use crate::simulation::kinematics::{collision_plan, evaluate_frame, terminal_time};
use crate::simulation::params::{ParameterSet, ParameterStore};
use crate::simulation::scenario::{validate, MotionFamily, Scenario};
use crate::simulation::states::FrameState;

#[derive(Debug)]
struct Run {
    scenario: Scenario,
    store: ParameterStore,
    sim_time: f64,
    last_frame: Option<FrameState>,
    finished: bool, // halted on the terminal frame
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Running(Box<Run>),
}

#[derive(Debug, Default)]
pub struct Stepper {
    config: EngineConfig,
    state: State,
}

impl Stepper {
    /// Fails if the clock settings cannot advance time
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: State::Idle,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate analyzer output and start running it. On error the current
    /// state is left untouched.
    pub fn load(&mut self, raw: RawScenario) -> Result<()> {
        let scenario = validate(raw)?;
        self.load_scenario(scenario);
        Ok(())
    }

    /// Replace whatever is loaded with an already validated scenario
    pub fn load_scenario(&mut self, scenario: Scenario) {
        info!(
            "loading {} scenario with {} entities",
            scenario.motion_family,
            scenario.entities.len()
        );
        let store = ParameterStore::new(&scenario);
        self.state = State::Running(Box::new(Run {
            scenario,
            store,
            sim_time: 0.0,
            last_frame: None,
            finished: false,
        }));
    }

    pub fn clear(&mut self) {
        if self.is_running() {
            info!("clearing scenario");
        }
        self.state = State::Idle;
    }

    /// Back to simTime 0 keeping scenario and parameters. No-op when idle.
    pub fn reset(&mut self) {
        if let State::Running(run) = &mut self.state {
            debug!("reset at t={:.4}", run.sim_time);
            run.sim_time = 0.0;
            run.finished = false;
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// True once a halting run has reached its terminal frame
    pub fn is_finished(&self) -> bool {
        self.run().is_some_and(|run| run.finished)
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.run().map(|run| &run.scenario)
    }

    pub fn parameters(&self) -> Option<&ParameterStore> {
        self.run().map(|run| &run.store)
    }

    pub fn sim_time(&self) -> Option<f64> {
        self.run().map(|run| run.sim_time)
    }

    pub fn last_frame(&self) -> Option<&FrameState> {
        self.run().and_then(|run| run.last_frame.as_ref())
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.run_mut()?.store.set(name, value)
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.run().and_then(|run| run.store.get(name))
    }

    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.run_mut()?.store.reset_to_defaults();
        Ok(())
    }

    /// Copy of the effective parameter values
    pub fn snapshot(&self) -> Option<ParameterSet> {
        self.run().map(|run| run.store.snapshot())
    }

    /// Evaluate the frame at `t` without touching the clock
    pub fn frame_at(&self, t: f64) -> Result<FrameState> {
        let run = self.run().ok_or(SimError::NotRunning)?;
        Ok(evaluate_frame(&run.scenario, &run.store.snapshot(), t.max(0.0))?)
    }

    /// Jump to `t` (negative clamps to 0) and emit that frame
    pub fn seek(&mut self, t: f64) -> Result<FrameState> {
        let t = t.max(0.0);
        let frame = self.frame_at(t)?;
        let run = self.run_mut()?;
        run.sim_time = t;
        run.finished = false;
        run.last_frame = Some(frame.clone());
        Ok(frame)
    }

    /// Advance one tick and emit the new frame.
    ///
    /// A failed evaluation, or a non-finite wall-clock delta, leaves simTime
    /// and the last good frame as they were.
    pub fn tick(&mut self, elapsed_real_seconds: f64) -> Result<FrameState> {
        let step = match self.config.clock {
            ClockMode::Fixed => Ok(self.config.step),
            ClockMode::Wall if elapsed_real_seconds.is_finite() => {
                Ok(elapsed_real_seconds.clamp(0.0, self.config.max_step))
            }
            ClockMode::Wall => Err(ComputationError::NonFinite {
                name: "elapsed".to_owned(),
                value: elapsed_real_seconds,
            }),
        };
        let (t_end, policy) = (self.config.t_end, self.config.on_terminal);
        let run = self.run_mut()?;

        let frame = match step.and_then(|step| run.advance(step, t_end, policy)) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("tick at t={:.4} failed: {err}", run.sim_time);
                return Err(err.into());
            }
        };
        run.last_frame = Some(frame.clone());
        Ok(frame)
    }

    fn run(&self) -> Option<&Run> {
        match &self.state {
            State::Running(run) => Some(&**run),
            State::Idle => None,
        }
    }

    fn run_mut(&mut self) -> Result<&mut Run> {
        match &mut self.state {
            State::Running(run) => Ok(&mut **run),
            State::Idle => Err(SimError::NotRunning),
        }
    }
}

impl Run {
    /// Compute the next frame; commits simTime only on success
    fn advance(&mut self, step: f64, t_end: f64, policy: TerminalPolicy) -> std::result::Result<FrameState, ComputationError> {
        let params = self.store.snapshot();

        if self.finished {
            return evaluate_frame(&self.scenario, &params, self.sim_time);
        }

        let previous = self.sim_time;
        let mut t = (previous + step).max(0.0);

        let end = match terminal_time(&self.scenario, &params)? {
            Some(landing) => landing.min(t_end),
            None => t_end,
        };

        let mut finished = false;
        if t >= end {
            match policy {
                TerminalPolicy::Loop => {
                    debug!("terminal at t={end:.4}, looping");
                    t = 0.0;
                }
                TerminalPolicy::Halt => {
                    debug!("terminal at t={end:.4}, halting");
                    t = end;
                    finished = true;
                }
            }
        }

        let frame = evaluate_frame(&self.scenario, &params, t)?;

        if self.scenario.motion_family == MotionFamily::Collision && t > previous {
            let plan = collision_plan(&self.scenario.entities[0], &self.scenario.entities[1], &params)?;
            if let Some(tc) = plan.contact.filter(|&tc| previous < tc && tc <= t) {
                debug!(
                    "collision at t={tc:.4}: v1 {} -> {}, v2 {} -> {}",
                    plan.v1, plan.v1_final, plan.v2, plan.v2_final
                );
            }
        }

        self.sim_time = t;
        self.finished = finished;
        Ok(frame)
    }
}
