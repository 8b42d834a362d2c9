use bevy::color::Srgba;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use log::{info, trace, warn};

use crate::configuration::config::ViewportConfig;
use crate::simulation::scheduler::{AnimationLoop, FrameQueue};
use crate::visualization::render::{CommandRenderer, DrawCommand, SceneRenderer, ScreenPoint};

const VELOCITY_NUDGE: f64 = 0.5; // m/s per key press
const ANGLE_NUDGE: f64 = 5.0; // degrees per key press
const POINT_RADIUS: f32 = 2.0;

#[derive(Resource)]
struct Viewer {
    renderer: CommandRenderer,
}

/// Open a window and drive `animation` from bevy's frame loop.
///
/// Keys: Up/Down velocity, Left/Right angle, R restart, D default parameters.
pub fn run_2d(animation: AnimationLoop<FrameQueue>, viewport: ViewportConfig) {
    if let Some(scenario) = animation.stepper().scenario() {
        info!(
            "starting 2D viewer: {} with {} entities",
            scenario.motion_family,
            scenario.entities.len()
        );
    }
    let (width, height) = (viewport.width as f32, viewport.height as f32);

    App::new()
        .insert_non_send_resource(animation)
        .insert_resource(Viewer {
            renderer: CommandRenderer::new(viewport),
        })
        .insert_resource(ClearColor(Color::WHITE))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "kinesim".into(),
                        resolution: (width, height).into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .add_systems(Startup, setup_camera_system)
        .add_systems(Update, (keyboard_system, step_and_draw_system).chain())
        .run();
}

fn setup_camera_system(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn nudge(animation: &mut AnimationLoop<FrameQueue>, name: &str, delta: f64) {
    let Some(current) = animation.stepper().parameter(name) else {
        return;
    };
    if let Err(err) = animation.set_parameter(name, current + delta) {
        warn!("{err}");
    }
}

fn keyboard_system(keys: Res<ButtonInput<KeyCode>>, mut animation: NonSendMut<AnimationLoop<FrameQueue>>) {
    let animation = &mut *animation;
    if keys.just_pressed(KeyCode::ArrowUp) {
        nudge(animation, "velocity", VELOCITY_NUDGE);
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        nudge(animation, "velocity", -VELOCITY_NUDGE);
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        nudge(animation, "angle", ANGLE_NUDGE);
    }
    if keys.just_pressed(KeyCode::ArrowLeft) {
        nudge(animation, "angle", -ANGLE_NUDGE);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        animation.reset();
    }
    if keys.just_pressed(KeyCode::KeyD) {
        if let Err(err) = animation.reset_to_defaults() {
            warn!("{err}");
        }
    }
}

fn step_and_draw_system(
    time: Res<Time>,
    mut animation: NonSendMut<AnimationLoop<FrameQueue>>,
    mut viewer: ResMut<Viewer>,
    mut clear: ResMut<ClearColor>,
    mut gizmos: Gizmos,
) {
    animation.pump(time.delta_seconds() as f64);

    let stepper = animation.stepper();
    let (Some(frame), Some(scenario), Some(params)) = (stepper.last_frame(), stepper.scenario(), stepper.snapshot()) else {
        return;
    };
    let commands = viewer.renderer.render(frame, scenario, &params);
    let vp = &viewer.renderer.viewport;

    // screen space (y down, origin top-left) -> bevy world (y up, origin centre)
    let to_world = |p: ScreenPoint| Vec2::new((p.x - vp.width / 2.0) as f32, (vp.height / 2.0 - p.y) as f32);

    for command in commands {
        match command {
            DrawCommand::Clear { color, .. } => clear.0 = parse_color(&color),
            DrawCommand::Line { from, to, color } => {
                gizmos.line_2d(to_world(from), to_world(to), parse_color(&color));
            }
            DrawCommand::Polyline { points, color } => {
                gizmos.linestrip_2d(points.into_iter().map(to_world), parse_color(&color));
            }
            DrawCommand::Circle { center, radius, color } => {
                gizmos.circle_2d(to_world(center), radius as f32, parse_color(&color));
            }
            DrawCommand::Rect {
                center,
                width,
                height,
                color,
            } => {
                gizmos.rect_2d(
                    to_world(center),
                    0.0,
                    Vec2::new(width as f32, height as f32),
                    parse_color(&color),
                );
            }
            DrawCommand::Point { at, color } => {
                gizmos.circle_2d(to_world(at), POINT_RADIUS, parse_color(&color));
            }
            DrawCommand::Arrow { from, to, color } => {
                gizmos.arrow_2d(to_world(from), to_world(to), parse_color(&color));
            }
            DrawCommand::Label { text, .. } => trace!("label {text} not drawn by gizmos"),
        }
    }
}

fn parse_color(hex: &str) -> Color {
    Srgba::hex(hex).map(Color::from).unwrap_or(Color::BLACK)
}
