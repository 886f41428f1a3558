/*
 * UI Module
 *
 * Builds the viewer's egui control panel. Sliders edit a working copy of the
 * SimulationConfig; change detection against a Tunables snapshot decides
 * whether the flock has to be respawned or only reconfigured.
 */

use nannou_egui::{egui, Egui};

use crate::app::ViewSettings;
use crate::camera::{Camera, Projection};
use crate::debug::DebugInfo;
use crate::params::{SectorMode, SimulationConfig};

/// What the panel asked the app to do this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiResponse {
    pub reset_requested: bool,
    pub population_changed: bool,
    pub config_changed: bool,
    pub fit_camera: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    config: &mut SimulationConfig,
    settings: &mut ViewSettings,
    camera: &mut Camera,
    debug_info: &DebugInfo,
) -> UiResponse {
    let mut response = UiResponse::default();
    let snapshot = config.tunables();
    let sector_mode = config.sector_mode;

    let ctx = egui.begin_frame();

    egui::Window::new("Flock Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Population", |ui| {
                ui.add(egui::Slider::new(&mut config.agent_count, 1..=3000).text("Agents"));
                ui.add(egui::Slider::new(&mut config.agent.speed, 0.0..=10.0).text("Speed"));
                ui.add(egui::Slider::new(&mut config.agent.turn_fraction, 0.001..=1.0).text("Turn Fraction"));
                if ui.button("Respawn").clicked() {
                    response.reset_requested = true;
                }
            });

            ui.collapsing("Steering", |ui| {
                ui.add(egui::Slider::new(&mut config.weights.w_self, 0.0..=1.0).text("Self Weight"));
                ui.add(egui::Slider::new(&mut config.weights.w_avg, 0.0..=1.0).text("Neighbor Weight"));
                ui.add(egui::Slider::new(&mut config.repulsion_power, 0.0..=8.0).text("Repulsion Power"));
                ui.add(egui::Slider::new(&mut config.wander.amplitude, 0.0..=1.0).text("Wander Amplitude"));
                ui.horizontal(|ui| {
                    ui.radio_value(&mut config.sector_mode, SectorMode::Heading, "Heading cone");
                    ui.radio_value(&mut config.sector_mode, SectorMode::WorldAzimuth, "World azimuth");
                });
            });

            ui.collapsing("Camera", |ui| {
                ui.label("Zoom: mouse wheel. Pan: click and drag.");
                ui.horizontal(|ui| {
                    for projection in Projection::ALL {
                        ui.radio_value(&mut camera.projection, projection, projection.label());
                    }
                });
                if ui.button("Fit Flock").clicked() {
                    response.fit_camera = true;
                }
                ui.label(format!("Zoom Level: {:.2}x", camera.zoom));
            });

            ui.collapsing("Performance", |ui| {
                ui.checkbox(&mut config.parallel, "Parallel Compute");
                ui.checkbox(&mut config.use_spatial_grid, "Spatial Grid");
                ui.add(egui::Slider::new(&mut settings.steps_per_second, 10.0..=240.0).text("Steps per Second"));
                ui.separator();
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Step time: {:.2} ms", debug_info.step_time.as_secs_f64() * 1000.0));
                ui.label(format!("Steps this frame: {}", debug_info.steps_per_frame));
            });

            ui.checkbox(&mut settings.show_debug, "Show Debug Overlay");
            ui.checkbox(&mut settings.paused, "Pause");
        });

    // Sliders can push the pair of weights to zero; keep the config valid.
    if config.weights.w_self + config.weights.w_avg <= 0.0 {
        config.weights.w_self = snapshot.weights.w_self;
        config.weights.w_avg = snapshot.weights.w_avg;
    }

    let (population_changed, tunables_changed) = config.detect_changes(&snapshot);
    response.population_changed = population_changed;
    response.config_changed = tunables_changed || config.sector_mode != sector_mode;
    response
}

// Draw the text overlay in the top-right corner
pub fn draw_debug_info(draw: &nannou::Draw, debug_info: &DebugInfo, window_rect: nannou::geom::Rect, zoom: f32) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;

    let lines = [
        format!("FPS: {:.1}", debug_info.fps),
        format!("Agents: {}", debug_info.agent_count),
        format!("Contained last step: {}", debug_info.contained),
        format!("Steps/frame: {}", debug_info.steps_per_frame),
        format!("Zoom: {:.2}x", zoom),
    ];

    let panel_height = line_height * lines.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.right() - panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width + margin;
    let text_y = window_rect.top() - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(text_x + 80.0, text_y - i as f32 * line_height)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
