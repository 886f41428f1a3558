/*
 * Renderer Module
 *
 * Draws the flock projected onto the camera's axis plane:
 * - the containment sphere and the obstacle outlines
 * - one triangle per agent pointing along its projected heading
 * - in debug mode, the first agent's neighborhood and crowding radii
 */

use glam::DVec3;
use nannou::prelude::*;
use tracing::warn;

use crate::app::Model;
use crate::obstacle::Shape;
use crate::ui;

const AGENT_SIZE: f32 = 6.0;

pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let camera = &model.camera;
    let config = model.simulation.config();

    // Containment boundary
    let center = camera.project(DVec3::ZERO, window_rect);
    draw.ellipse()
        .xy(center)
        .radius(config.containment_radius() as f32 * camera.zoom)
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    draw_obstacles(&draw, model, window_rect);

    for pose in model.simulation.poses() {
        let screen = camera.project(pose.position, window_rect);
        let heading = camera.projection.flatten(pose.heading());
        // Agents heading straight at the viewer project to a point
        let direction = if heading.length_squared() > 1e-12 {
            heading.normalize()
        } else {
            Vec2::Y
        };
        // Depth cue: brighter when the heading lies in the view plane
        let brightness = 0.4 + 0.6 * heading.length().min(1.0);
        draw_agent(&draw, screen, direction, rgb(brightness, brightness, brightness));
    }

    if model.settings.show_debug {
        if let Some(first) = model.simulation.agents().first() {
            let screen = camera.project(first.position, window_rect);
            draw.ellipse()
                .xy(screen)
                .radius(first.crowding_radius as f32 * camera.zoom)
                .no_fill()
                .stroke(RED)
                .stroke_weight(1.0);
            draw.ellipse()
                .xy(screen)
                .radius(first.neighborhood_radius as f32 * camera.zoom)
                .no_fill()
                .stroke(GREEN)
                .stroke_weight(1.0);
            let heading = camera.projection.flatten(first.heading());
            draw.arrow()
                .start(screen)
                .end(screen + heading * 30.0)
                .color(YELLOW)
                .stroke_weight(2.0);
        }

        for attractor in model.simulation.attractors() {
            draw.ellipse()
                .xy(camera.project(attractor.position, window_rect))
                .radius(4.0)
                .color(ORANGE);
        }

        ui::draw_debug_info(&draw, &model.debug_info, window_rect, camera.zoom);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        warn!(?err, "failed to draw the flock");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        warn!(?err, "failed to draw the control panel");
    }
}

fn draw_agent(draw: &Draw, position: Vec2, direction: Vec2, color: Rgb) {
    let side = vec2(-direction.y, direction.x);
    let nose = position + direction * AGENT_SIZE * 1.5;
    let left = position - direction * AGENT_SIZE + side * AGENT_SIZE * 0.6;
    let right = position - direction * AGENT_SIZE - side * AGENT_SIZE * 0.6;
    draw.tri().points(nose, left, right).color(color);
}

fn draw_obstacles(draw: &Draw, model: &Model, window_rect: Rect) {
    let camera = &model.camera;
    for (_, shape) in model.simulation.field().shapes() {
        match *shape {
            Shape::Quad {
                center,
                normal,
                u_axis,
                half_extents,
            } => {
                let v_axis = normal.cross(u_axis);
                let u = u_axis * half_extents[0];
                let v = v_axis * half_extents[1];
                let corners = [center + u + v, center - u + v, center - u - v, center + u - v, center + u + v]
                    .map(|corner| camera.project(corner, window_rect));
                draw.polyline()
                    .weight(1.0)
                    .points(corners)
                    .color(rgba(0.2, 0.4, 0.8, 0.6));
            }
            Shape::Sphere { center, radius } => {
                draw.ellipse()
                    .xy(camera.project(center, window_rect))
                    .radius(radius as f32 * camera.zoom)
                    .no_fill()
                    .stroke(rgba(0.2, 0.4, 0.8, 0.6))
                    .stroke_weight(1.0);
            }
            Shape::Samples => {}
        }
    }
}
