use std::time::Instant;

use serde_json::json;

use crate::configuration::config::{RawEntity, RawScenario, RawVector2, ViewportConfig};
use crate::simulation::engine::Stepper;
use crate::simulation::params::ParameterSet;
use crate::simulation::scenario::{validate, Scenario};
use crate::visualization::render::{CommandRenderer, SceneRenderer};

/// One representative scenario per motion family
fn bench_scenarios() -> Vec<RawScenario> {
    let scenario = |family: &str, params: &[(&str, f64)], bodies: usize| RawScenario {
        motion_family: Some(family.to_owned()),
        // a few scenery entities so every tick touches more than the movers
        entities: (0..bodies + 4)
            .map(|i| RawEntity {
                id: Some(format!("e{i}")),
                initial_position: RawVector2 { x: i as f64, y: 0.0 },
                ..Default::default()
            })
            .collect(),
        parameters: params.iter().map(|(k, v)| ((*k).to_owned(), json!(v))).collect(),
        ..Default::default()
    };

    vec![
        scenario("projectile", &[("velocity", 20.0), ("angle", 60.0)], 1),
        scenario("linear", &[("velocity", 2.0), ("acceleration", 0.5)], 1),
        scenario("collision", &[("m1", 2.0), ("m2", 1.0), ("v1", 3.0), ("v2", -1.0)], 2),
        scenario("pendulum", &[("length", 2.0), ("angle", 15.0)], 1),
        scenario("incline", &[("angle", 30.0), ("friction", 0.1)], 1),
        scenario("circular", &[("radius", 3.0), ("velocity", 4.0)], 1),
    ]
}

pub fn bench_tick() {
    let ticks = 100_000;

    for raw in bench_scenarios() {
        let mut stepper = Stepper::default();
        if let Err(err) = stepper.load(raw) {
            println!("skipping scenario: {err}");
            continue;
        }
        let family = stepper.scenario().map(|s| s.motion_family.to_string()).unwrap_or_default();

        // Warm up
        let mut failed = (0..1_000).filter(|_| stepper.tick(0.0).is_err()).count();
        if let Err(err) = stepper.tick(0.0) {
            println!("{family:>10}: skipped, tick fails: {err}");
            continue;
        }

        let t0 = Instant::now();
        for _ in 0..ticks {
            if stepper.tick(0.0).is_err() {
                failed += 1;
            }
        }
        let dt = t0.elapsed().as_secs_f64();
        if failed > 0 {
            println!("{family:>10}: {failed} ticks failed");
        }

        println!(
            "{family:>10}: {ticks} ticks in {dt:8.6} s ({:10.0} ticks/s)",
            ticks as f64 / dt
        );
    }
}

pub fn bench_trajectory() {
    let raw = bench_scenarios().swap_remove(0);
    let scenario: Scenario = match validate(raw) {
        Ok(s) => s,
        Err(err) => {
            println!("invalid benchmark scenario: {err}");
            return;
        }
    };
    let params: ParameterSet = scenario.parameters.iter().map(|(k, v)| (k.clone(), *v)).collect();
    let mut stepper = Stepper::default();
    stepper.load_scenario(scenario.clone());
    let frame = match stepper.seek(1.5) {
        Ok(f) => f,
        Err(err) => {
            println!("seek failed: {err}");
            return;
        }
    };

    let draws = 2_000;
    for samples in [60, 240, 960, 3840] {
        let mut renderer = CommandRenderer::new(ViewportConfig {
            trail_samples: samples,
            ..Default::default()
        });

        let t0 = Instant::now();
        for _ in 0..draws {
            let _ = renderer.render(&frame, &scenario, &params);
        }
        let dt = t0.elapsed().as_secs_f64();

        println!("samples = {samples:5}, {draws} draws in {dt:8.6} s ({:8.2} us/draw)", dt * 1e6 / draws as f64);
    }
}
