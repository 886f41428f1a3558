/*
 * Input Module
 *
 * Mouse handlers for the viewer window: drag to pan, wheel to zoom. Events
 * over the egui panel are left to the UI.
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::app::Model;

pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    if model.camera.is_dragging {
        model.camera.drag(pos);
    }
    model.mouse_position = pos;
}

pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left && !model.egui.ctx().is_pointer_over_area() {
        model.camera.start_drag(model.mouse_position);
    }
}

pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.camera.end_drag();
    }
}

pub fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }
    let window_rect = app.window_rect();
    let scroll = match delta {
        MouseScrollDelta::LineDelta(x, y) => vec2(x, y),
        // Pixel deltas are roughly a hundred times larger than line deltas
        MouseScrollDelta::PixelDelta(pos) => vec2(pos.x as f32, pos.y as f32) * 0.01,
    };
    model.camera.zoom(scroll, model.mouse_position, window_rect);
}

pub fn raw_window_event(_app: &App, model: &mut Model, event: &WindowEvent) {
    model.egui.handle_raw_event(event);
}
