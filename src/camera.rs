/*
 * Camera Module
 *
 * This module defines the Camera struct the viewer uses to look at the flock.
 * Agents live in 3D; the camera flattens them onto one of the axis planes and
 * then applies a 2D pan and zoom to reach screen space.
 */

use glam::DVec3;
use nannou::prelude::*;

/// Axis plane the flock is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Looking down -Z: screen x = world x, screen y = world y.
    Top,
    /// Looking along +Y: screen x = world x, screen y = world z.
    Front,
    /// Looking along -X: screen x = world y, screen y = world z.
    Side,
}

impl Projection {
    pub const ALL: [Projection; 3] = [Projection::Top, Projection::Front, Projection::Side];

    pub fn label(self) -> &'static str {
        match self {
            Projection::Top => "Top (XY)",
            Projection::Front => "Front (XZ)",
            Projection::Side => "Side (YZ)",
        }
    }

    pub fn flatten(self, v: DVec3) -> Vec2 {
        match self {
            Projection::Top => vec2(v.x as f32, v.y as f32),
            Projection::Front => vec2(v.x as f32, v.z as f32),
            Projection::Side => vec2(v.y as f32, v.z as f32),
        }
    }
}

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub projection: Projection,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 10.0,
            projection: Projection::Top,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        }
    }

    /// Fits a sphere of `radius` around the origin into `window_rect`.
    pub fn fit(&mut self, radius: f64, window_rect: Rect) {
        let extent = window_rect.w().min(window_rect.h()) * 0.5;
        self.position = Vec2::ZERO;
        self.zoom = (extent / radius.max(1.0) as f32).clamp(self.min_zoom, self.max_zoom);
    }

    // Project a simulation point straight to screen space
    pub fn project(&self, point: DVec3, window_rect: Rect) -> Vec2 {
        self.world_to_screen(self.projection.flatten(point), window_rect)
    }

    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    // Zoom around the cursor so the world point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let before = self.screen_to_world(cursor_position, window_rect);
        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);
        let after = self.screen_to_world(cursor_position, window_rect);
        self.position += before - after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    pub fn drag(&mut self, position: Vec2) {
        if self.is_dragging {
            let delta = position - self.last_cursor_pos;
            if delta.length_squared() > 0.0 {
                self.position -= delta / self.zoom;
                self.last_cursor_pos = position;
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
