/*
 * Application Module
 *
 * This module defines the viewer's Model and its update loop. The viewer owns
 * a Simulation over a boundary box of walls and drives it with a fixed
 * timestep: wall time accumulates and whole steps of `1 / steps_per_second`
 * are taken out of it, so the flock advances at the same rate regardless of
 * the display's frame rate.
 */

use std::time::{Duration, Instant};

use glam::DVec3;
use nannou::prelude::*;
use nannou_egui::Egui;
use tracing::{error, info};

use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::error::ConfigError;
use crate::input::{mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event};
use crate::obstacle::ShapeField;
use crate::params::SimulationConfig;
use crate::renderer::view;
use crate::simulation::Simulation;
use crate::ui;
use crate::wander::SimplexNoise;

// Upper bound on catch-up steps per frame after a stall
const MAX_STEPS_PER_FRAME: usize = 8;

/// Viewer-only settings that never reach the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub paused: bool,
    pub show_debug: bool,
    pub steps_per_second: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            paused: false,
            show_debug: true,
            steps_per_second: 60.0,
        }
    }
}

pub struct Model {
    pub simulation: Simulation<ShapeField>,
    /// Working copy edited by the UI.
    pub config: SimulationConfig,
    pub settings: ViewSettings,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub accumulator: Duration,
    pub last_update_time: Instant,
}

/// Loads the config named on the command line, falling back to defaults.
fn load_config() -> SimulationConfig {
    match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::from_json_file(&path) {
            Ok(config) => {
                info!(%path, "loaded configuration");
                config
            }
            Err(err) => {
                error!(%path, %err, "invalid configuration, using defaults");
                SimulationConfig::default()
            }
        },
        None => SimulationConfig::default(),
    }
}

pub fn build_simulation(config: &SimulationConfig) -> Result<Simulation<ShapeField>, ConfigError> {
    let field = ShapeField::default_box(config.max_range);
    Simulation::new(config.clone(), field, SimplexNoise::new(config.seed as u32))
}

pub fn model(app: &App) -> Model {
    let window_id = match app
        .new_window()
        .title("3D Flock Viewer")
        .size(1280, 800)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .raw_event(raw_window_event)
        .build()
    {
        Ok(id) => id,
        Err(err) => {
            error!(%err, "failed to open the viewer window");
            std::process::exit(1);
        }
    };
    let Some(window) = app.window(window_id) else {
        error!("viewer window vanished after creation");
        std::process::exit(1);
    };

    let egui = Egui::from_window(&window);
    let config = load_config();
    let simulation = match build_simulation(&config) {
        Ok(simulation) => simulation,
        Err(err) => {
            error!(%err, "failed to build the flock");
            std::process::exit(1);
        }
    };

    let mut camera = Camera::new();
    camera.fit(config.containment_radius(), window.rect());

    Model {
        config: simulation.config().clone(),
        simulation,
        settings: ViewSettings::default(),
        egui,
        debug_info: DebugInfo::default(),
        camera,
        mouse_position: Vec2::ZERO,
        accumulator: Duration::ZERO,
        last_update_time: Instant::now(),
    }
}

pub fn update(app: &App, model: &mut Model, update: Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;
    model.egui.set_elapsed_time(update.since_start);

    let response = ui::update_ui(
        &mut model.egui,
        &mut model.config,
        &mut model.settings,
        &mut model.camera,
        &model.debug_info,
    );

    if response.reset_requested || response.population_changed {
        match build_simulation(&model.config) {
            Ok(simulation) => {
                model.simulation = simulation;
                model.accumulator = Duration::ZERO;
            }
            Err(err) => {
                error!(%err, "rejected edited configuration");
                model.config = model.simulation.config().clone();
            }
        }
    } else if response.config_changed || model.config != *model.simulation.config() {
        if let Err(err) = model.simulation.reconfigure(model.config.clone()) {
            error!(%err, "rejected edited configuration");
            model.config = model.simulation.config().clone();
        }
    }
    if response.fit_camera {
        model.camera.fit(model.config.containment_radius(), app.window_rect());
    }

    let now = Instant::now();
    let frame_time = now.duration_since(model.last_update_time);
    model.last_update_time = now;

    if model.settings.paused {
        model.accumulator = Duration::ZERO;
        model.debug_info.steps_per_frame = 0;
        return;
    }

    let step = Duration::from_secs_f64(1.0 / model.settings.steps_per_second);
    model.accumulator += frame_time;

    let mut steps = 0;
    while model.accumulator >= step && steps < MAX_STEPS_PER_FRAME {
        let started = Instant::now();
        let before: Vec<DVec3> = model.simulation.poses().iter().map(|p| p.position).collect();
        model.simulation.step(step.as_secs_f64());
        model.debug_info.step_time = started.elapsed();
        model.debug_info.contained = count_contained(&before, model.simulation.poses());

        model.accumulator -= step;
        steps += 1;
    }
    // Drop the backlog rather than spiral after a long stall
    if steps == MAX_STEPS_PER_FRAME {
        model.accumulator = Duration::ZERO;
    }

    model.debug_info.steps_per_frame = steps;
    model.debug_info.agent_count = model.simulation.poses().len();
}

fn count_contained(before: &[DVec3], after: &[crate::agent::Pose]) -> usize {
    before
        .iter()
        .zip(after)
        .filter(|(old, pose)| pose.position == DVec3::ZERO && **old != DVec3::ZERO)
        .count()
}
