/*
 * 3D Flock Viewer
 *
 * Interactive viewer for the steering core. Each agent blends its heading
 * with its neighbors' (alignment), turns away from agents that crowd it
 * (separation) and from nearby walls (avoidance), and wanders with a little
 * coherent noise. The flock is shown projected onto an axis plane.
 *
 * Usage: boids3d-viewer [config.json]
 * Set RUST_LOG (e.g. RUST_LOG=boids3d=debug) to control log output.
 */

use boids3d::app::{model, update};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boids3d=info")))
        .init();

    nannou::app(model).update(update).run();
}
