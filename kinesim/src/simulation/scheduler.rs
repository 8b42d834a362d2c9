//! Cooperative frame scheduling for the stepper
//!
//! `AnimationLoop` separates *what* evolves (the `Stepper`) from *when* it is
//! driven. A `FrameScheduler` hands out tokens for future frame callbacks; the
//! host calls `AnimationLoop::on_frame` with the token when the callback fires.
//! Only the single pending token is honoured, so a callback that outlives a
//! `clear()` or a reload is a no-op rather than a tick against stale state.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::configuration::config::{EngineConfig, RawScenario};
use crate::error::{Result, SimError};
use crate::simulation::analyzer::ScenarioAnalyzer;
use crate::simulation::engine::Stepper;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::FrameState;

/// Handle for one requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Periodic scheduling primitive (animation frame, timer, game loop)
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Deterministic scheduler: requested frames queue up until the host pops them
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    due: VecDeque<FrameToken>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next callback to fire, oldest first
    pub fn pop_due(&mut self) -> Option<FrameToken> {
        self.due.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.due.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next_id);
        self.next_id += 1;
        self.due.push_back(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.due.retain(|t| *t != token);
    }
}

type FrameListener = Box<dyn FnMut(&FrameState)>;
type ErrorListener = Box<dyn FnMut(&SimError)>;

/// Owns the stepper and drives it from a `FrameScheduler`
pub struct AnimationLoop<S: FrameScheduler> {
    stepper: Stepper,
    scheduler: S,
    pending: Option<FrameToken>,
    frame_listeners: Vec<FrameListener>,
    error_listeners: Vec<ErrorListener>,
    last_error: Option<SimError>,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    pub fn new(config: EngineConfig, scheduler: S) -> Result<Self> {
        Ok(Self {
            stepper: Stepper::new(config)?,
            scheduler,
            pending: None,
            frame_listeners: Vec::new(),
            error_listeners: Vec::new(),
            last_error: None,
        })
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Called with every emitted frame
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&FrameState) + 'static,
    {
        self.frame_listeners.push(Box::new(listener));
    }

    /// Called with every skipped tick
    pub fn subscribe_errors<F>(&mut self, listener: F)
    where
        F: FnMut(&SimError) + 'static,
    {
        self.error_listeners.push(Box::new(listener));
    }

    /// Most recent tick failure, cleared by the next successful tick
    pub fn last_error(&self) -> Option<&SimError> {
        self.last_error.as_ref()
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    pub fn load(&mut self, raw: RawScenario) -> Result<()> {
        self.stepper.load(raw)?;
        self.started();
        Ok(())
    }

    pub fn load_scenario(&mut self, scenario: Scenario) {
        self.stepper.load_scenario(scenario);
        self.started();
    }

    /// Analyze a word problem and load the result
    pub fn load_problem(&mut self, analyzer: &dyn ScenarioAnalyzer, problem: &str) -> Result<()> {
        let raw = analyzer.analyze(problem)?;
        self.load(raw)
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.stepper.set_parameter(name, value)
    }

    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.stepper.reset_to_defaults()
    }

    pub fn reset(&mut self) {
        self.stepper.reset();
    }

    /// Cancel the pending callback and drop the scenario
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.last_error = None;
        self.stepper.clear();
    }

    /// Entry point for the scheduler's callback. Returns false when the token
    /// is stale and nothing ran.
    pub fn on_frame(&mut self, token: FrameToken, elapsed_real_seconds: f64) -> bool {
        if self.pending != Some(token) {
            trace!("ignoring stale frame callback {token:?}");
            return false;
        }
        self.pending = None;

        match self.stepper.tick(elapsed_real_seconds) {
            Ok(frame) => {
                self.last_error = None;
                for listener in &mut self.frame_listeners {
                    listener(&frame);
                }
            }
            Err(err) => {
                for listener in &mut self.error_listeners {
                    listener(&err);
                }
                self.last_error = Some(err);
            }
        }

        if self.stepper.is_running() {
            self.pending = Some(self.scheduler.request_frame());
        }
        true
    }

    fn started(&mut self) {
        self.last_error = None;
        self.cancel_pending();
        self.pending = Some(self.scheduler.request_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            debug!("cancelling frame callback {token:?}");
            self.scheduler.cancel_frame(token);
        }
    }
}

impl AnimationLoop<FrameQueue> {
    /// Fire the oldest due callback, if any
    pub fn pump(&mut self, elapsed_real_seconds: f64) -> bool {
        match self.scheduler.pop_due() {
            Some(token) => self.on_frame(token, elapsed_real_seconds),
            None => false,
        }
    }
}

impl<S: FrameScheduler> Drop for AnimationLoop<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
