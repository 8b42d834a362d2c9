use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_relative_eq;
use serde_json::json;

use kinesim::{
    AnalysisError, AnimationLoop, ComputationError, EngineConfig, FrameQueue, RawEntity, RawScenario, SimError,
    SimulationFile, Stepper, TerminalPolicy, ValidationError,
};
use kinesim::configuration::config::RawVector2;

/// Single ball launched from the origin
pub fn projectile_raw(velocity: f64, angle: f64, gravity: f64) -> RawScenario {
    RawScenario {
        motion_family: Some("projectile".into()),
        entities: vec![RawEntity {
            id: Some("ball".into()),
            ..Default::default()
        }],
        parameters: [
            ("velocity".to_owned(), json!(velocity)),
            ("angle".to_owned(), json!(angle)),
            ("gravity".to_owned(), json!(gravity)),
        ]
        .into_iter()
        .collect(),
        adjustable_parameters: vec!["velocity".into(), "angle".into(), "gravity".into()],
        ..Default::default()
    }
}

/// Two carts 6 m apart, the 2 kg one moving at 3 m/s towards the 1 kg one
pub fn collision_raw() -> RawScenario {
    let cart = |id: &str, x: f64, mass: f64| RawEntity {
        id: Some(id.into()),
        mass: Some(mass),
        initial_position: RawVector2 { x, y: 0.0 },
        ..Default::default()
    };
    RawScenario {
        motion_family: Some("collision".into()),
        entities: vec![cart("a", 0.0, 2.0), cart("b", 6.0, 1.0)],
        parameters: [
            ("m1".to_owned(), json!(2.0)),
            ("m2".to_owned(), json!(1.0)),
            ("v1".to_owned(), json!(3.0)),
            ("v2".to_owned(), json!(0.0)),
        ]
        .into_iter()
        .collect(),
        adjustable_parameters: vec!["v1".into(), "v2".into()],
        ..Default::default()
    }
}

pub fn stepper_with(policy: TerminalPolicy, raw: RawScenario) -> Stepper {
    let mut stepper = Stepper::new(EngineConfig {
        on_terminal: policy,
        ..Default::default()
    })
    .expect("valid engine config");
    stepper.load(raw).expect("valid scenario");
    stepper
}

// ==================================================================================
// Stepper tests
// ==================================================================================

#[test]
fn projectile_straight_up_at_one_second() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(10.0, 90.0, 9.8));
    let frame = stepper.seek(1.0).unwrap();
    let ball = frame.entity("ball").unwrap();
    assert_relative_eq!(ball.position.y, 5.1, epsilon = 1e-9);
    assert_relative_eq!(ball.velocity.y, 0.2, epsilon = 1e-9);
}

#[test]
fn projectile_loops_on_landing() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(10.0, 90.0, 9.8));

    // time of flight 2 v0 / g = 2.0408 s; the 122nd tick is still airborne
    for _ in 0..122 {
        stepper.tick(0.0).unwrap();
    }
    let t = stepper.sim_time().unwrap();
    assert_relative_eq!(t, 122.0 / 60.0, epsilon = 1e-9);
    let y = stepper.last_frame().unwrap().entities[0].position.y;
    assert!(y > 0.0 && y < 0.5, "ball should be just above ground, y = {y}");

    let frame = stepper.tick(0.0).unwrap();
    assert_eq!(frame.sim_time, 0.0);
    assert_eq!(stepper.sim_time(), Some(0.0));
    assert_relative_eq!(frame.entities[0].position.y, 0.0);
}

#[test]
fn projectile_halts_on_landing() {
    let mut stepper = stepper_with(TerminalPolicy::Halt, projectile_raw(10.0, 90.0, 9.8));
    for _ in 0..200 {
        stepper.tick(0.0).unwrap();
    }
    assert!(stepper.is_finished());
    let landed = stepper.last_frame().unwrap().clone();
    assert_relative_eq!(landed.sim_time, 2.0 * 10.0 / 9.8, epsilon = 1e-12);
    assert_relative_eq!(landed.entities[0].position.y, 0.0, epsilon = 1e-9);

    assert_eq!(stepper.tick(0.0).unwrap(), landed);

    stepper.reset();
    assert!(!stepper.is_finished());
    assert_relative_eq!(stepper.tick(0.0).unwrap().sim_time, 1.0 / 60.0);
}

#[test]
fn reset_reproduces_first_frame() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(12.0, 40.0, 9.81));
    let first = stepper.tick(0.0).unwrap();
    for _ in 0..37 {
        stepper.tick(0.0).unwrap();
    }
    stepper.reset();
    assert_eq!(stepper.tick(0.0).unwrap(), first);
}

#[test]
fn unknown_parameter_leaves_store_unchanged() {
    let mut raw = projectile_raw(10.0, 45.0, 9.8);
    raw.adjustable_parameters = vec!["velocity".into()];
    let mut stepper = stepper_with(TerminalPolicy::Loop, raw);

    let before = stepper.snapshot().unwrap();
    assert_eq!(
        stepper.set_parameter("gravity", 1.6),
        Err(SimError::UnknownParameter("gravity".into()))
    );
    assert_eq!(stepper.snapshot().unwrap(), before);
}

#[test]
fn parameter_change_applies_on_next_tick() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(10.0, 90.0, 9.8));
    stepper.seek(0.5).unwrap();
    stepper.set_parameter("gravity", 0.0).unwrap();
    let frame = stepper.frame_at(1.0).unwrap();
    assert_relative_eq!(frame.entities[0].position.y, 10.0, epsilon = 1e-9);

    stepper.reset_to_defaults().unwrap();
    assert_eq!(stepper.parameter("gravity"), Some(9.8));
}

#[test]
fn failed_tick_keeps_last_good_frame() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(10.0, 45.0, 9.8));
    stepper.tick(0.0).unwrap();
    let good = stepper.tick(0.0).unwrap();

    stepper.set_parameter("velocity", f64::NAN).unwrap();
    let err = stepper.tick(0.0).unwrap_err();
    assert!(matches!(
        err,
        SimError::Computation(ComputationError::NonFinite { .. })
    ));
    assert_eq!(stepper.last_frame(), Some(&good));
    assert_eq!(stepper.sim_time(), Some(good.sim_time));

    stepper.set_parameter("velocity", 10.0).unwrap();
    let next = stepper.tick(0.0).unwrap();
    assert_relative_eq!(next.sim_time, 3.0 / 60.0);
}

#[test]
fn clear_returns_to_idle() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, projectile_raw(10.0, 45.0, 9.8));
    stepper.clear();
    assert!(!stepper.is_running());
    assert!(stepper.scenario().is_none());
    assert_eq!(stepper.tick(0.0), Err(SimError::NotRunning));
    assert_eq!(stepper.set_parameter("velocity", 1.0), Err(SimError::NotRunning));
}

#[test]
fn engine_settings_from_file_are_checked() {
    let yaml = "engine:\n  step: -0.1\nscenario:\n  motionFamily: linear\n";
    let sim: SimulationFile = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(Stepper::new(sim.engine.clone()), Err(SimError::Config(_))));
    assert!(matches!(
        AnimationLoop::new(sim.engine, FrameQueue::new()),
        Err(SimError::Config(_))
    ));
}

#[test]
fn non_positive_slope_length_override_is_rejected() {
    let raw = RawScenario {
        motion_family: Some("incline".into()),
        entities: vec![RawEntity::default()],
        parameters: [("angle".to_owned(), json!(30.0)), ("length".to_owned(), json!(5.0))]
            .into_iter()
            .collect(),
        adjustable_parameters: vec!["length".into()],
        ..Default::default()
    };
    let mut stepper = stepper_with(TerminalPolicy::Loop, raw);
    let good = stepper.tick(0.0).unwrap();

    stepper.set_parameter("length", -5.0).unwrap();
    assert!(matches!(
        stepper.tick(0.0),
        Err(SimError::Computation(ComputationError::OutOfDomain { .. }))
    ));
    assert_eq!(stepper.last_frame(), Some(&good));

    stepper.set_parameter("length", 5.0).unwrap();
    assert_relative_eq!(stepper.tick(0.0).unwrap().sim_time, 2.0 / 60.0);
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn collision_example_velocities() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, collision_raw());

    let before = stepper.seek(1.0).unwrap();
    assert_relative_eq!(before.entities[0].velocity.x, 3.0);
    assert_relative_eq!(before.entities[1].velocity.x, 0.0);

    // contact at t = 6 m / 3 m/s = 2 s
    let after = stepper.seek(2.5).unwrap();
    let (a, b) = (&after.entities[0], &after.entities[1]);
    assert_relative_eq!(a.velocity.x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(b.velocity.x, 4.0, epsilon = 1e-12);
    assert_relative_eq!(a.position.x, 6.5, epsilon = 1e-12);
    assert_relative_eq!(b.position.x, 8.0, epsilon = 1e-12);
}

#[test]
fn collision_conserves_momentum_across_contact() {
    let mut stepper = stepper_with(TerminalPolicy::Loop, collision_raw());
    for (v1, v2) in [(3.0, -2.0), (-1.0, -4.0), (7.5, 0.25)] {
        stepper.set_parameter("v1", v1).unwrap();
        stepper.set_parameter("v2", v2).unwrap();
        let late = stepper.frame_at(9.0).unwrap();
        let p_after = 2.0 * late.entities[0].velocity.x + 1.0 * late.entities[1].velocity.x;
        assert_relative_eq!(p_after, 2.0 * v1 + 1.0 * v2, epsilon = 1e-9);
    }
}

// ==================================================================================
// Animation loop tests
// ==================================================================================

#[test]
fn animation_loop_emits_frames_to_subscribers() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    let sink = Rc::clone(&seen);
    animation.subscribe(move |frame| sink.borrow_mut().push(frame.sim_time));

    animation.load(projectile_raw(10.0, 45.0, 9.8)).unwrap();
    for _ in 0..3 {
        assert!(animation.pump(0.016));
    }
    assert_eq!(seen.borrow().len(), 3);
    assert_relative_eq!(seen.borrow()[2], 3.0 / 60.0);
    assert_eq!(animation.scheduler().pending(), 1);
}

#[test]
fn clear_cancels_pending_tick() {
    let fired = Rc::new(Cell::new(0));
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    let counter = Rc::clone(&fired);
    animation.subscribe(move |_| counter.set(counter.get() + 1));

    animation.load(projectile_raw(10.0, 45.0, 9.8)).unwrap();
    animation.pump(0.0);
    assert_eq!(fired.get(), 1);

    animation.clear();
    assert!(!animation.is_scheduled());
    assert_eq!(animation.scheduler().pending(), 0);
    assert!(!animation.pump(0.0));
    assert_eq!(fired.get(), 1);
}

#[test]
fn stale_callback_after_clear_is_noop() {
    let fired = Rc::new(Cell::new(0));
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    let counter = Rc::clone(&fired);
    animation.subscribe(move |_| counter.set(counter.get() + 1));

    animation.load(projectile_raw(10.0, 45.0, 9.8)).unwrap();
    // host already dequeued the callback when teardown happens
    let token = animation.scheduler_mut().pop_due().unwrap();
    animation.clear();
    assert!(!animation.on_frame(token, 0.016));
    assert_eq!(fired.get(), 0);
}

#[test]
fn reload_keeps_a_single_pending_tick() {
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    animation.load(projectile_raw(10.0, 45.0, 9.8)).unwrap();
    let stale = animation.scheduler_mut().pop_due().unwrap();
    animation.load(collision_raw()).unwrap();
    animation.load(collision_raw()).unwrap();
    assert_eq!(animation.scheduler().pending(), 1);
    assert!(!animation.on_frame(stale, 0.0));
    assert!(animation.pump(0.0));
}

#[test]
fn skipped_tick_reaches_error_subscribers() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    let sink = Rc::clone(&errors);
    animation.subscribe_errors(move |err| sink.borrow_mut().push(err.clone()));

    animation.load(projectile_raw(10.0, 45.0, 9.8)).unwrap();
    animation.pump(0.0);
    animation.set_parameter("angle", f64::INFINITY).unwrap();
    animation.pump(0.0);

    assert_eq!(errors.borrow().len(), 1);
    assert!(animation.last_error().is_some());
    // still scheduled: the session survives a bad tick
    assert!(animation.is_scheduled());

    animation.set_parameter("angle", 45.0).unwrap();
    animation.pump(0.0);
    assert!(animation.last_error().is_none());
}

#[test]
fn invalid_scenario_leaves_loop_idle() {
    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    let mut raw = projectile_raw(10.0, 45.0, 9.8);
    raw.motion_family = Some("teleport".into());
    assert_eq!(
        animation.load(raw),
        Err(SimError::Validation(ValidationError::UnknownMotionFamily("teleport".into())))
    );
    assert!(!animation.stepper().is_running());
    assert!(!animation.is_scheduled());
}

// ==================================================================================
// Analyzer boundary
// ==================================================================================

#[test]
fn analyzer_output_is_validated() {
    let analyzer = |text: &str| -> Result<String, AnalysisError> {
        if text.contains("thrown") {
            Ok(r#"{
                "motionFamily": "projectile",
                "entities": [{ "id": "ball", "initialPosition": { "x": 0, "y": 0 } }],
                "parameters": { "velocity": 10, "angle": 90, "gravity": 9.8 },
                "adjustableParameters": ["velocity"]
            }"#
            .to_owned())
        } else {
            Err(AnalysisError("not a physics problem".into()))
        }
    };

    let mut animation = AnimationLoop::new(EngineConfig::default(), FrameQueue::new()).unwrap();
    animation
        .load_problem(&analyzer, "A ball is thrown straight up at 10 m/s")
        .unwrap();
    assert!(animation.stepper().is_running());

    animation.clear();
    let err = animation.load_problem(&analyzer, "What is love?").unwrap_err();
    assert!(matches!(err, SimError::Analysis(_)));
    assert!(!animation.stepper().is_running());
}

// ==================================================================================
// Bundled scenario files
// ==================================================================================

#[test]
fn bundled_scenarios_load_and_run() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let mut count = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let text = std::fs::read_to_string(&path).unwrap();
        let sim: SimulationFile = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text).unwrap(),
            _ => serde_yaml::from_str(&text).unwrap(),
        };
        let mut stepper = Stepper::new(sim.engine).unwrap();
        stepper
            .load(sim.scenario)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        for _ in 0..600 {
            stepper.tick(0.0).unwrap();
        }
        count += 1;
    }
    assert!(count >= 6);
}

#[test]
fn incline_halts_at_end_of_slope() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/incline.yaml");
    let sim: SimulationFile = serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let start = sim.scenario.entities[0].initial_position;
    let mut stepper = stepper_with(TerminalPolicy::Halt, sim.scenario);

    for _ in 0..600 {
        stepper.tick(0.0).unwrap();
    }
    assert!(stepper.is_finished());
    let block = &stepper.last_frame().unwrap().entities[0];
    let travelled = ((block.position.x - start.x).powi(2) + (block.position.y - start.y).powi(2)).sqrt();
    assert_relative_eq!(travelled, 5.0, epsilon = 1e-9);
}
