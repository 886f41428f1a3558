/*
 * 3D Boid Steering Core - Module Definitions
 *
 * The simulation core (agents, behaviors, integration and the stepping
 * orchestrator) has no rendering dependencies. The nannou viewer modules are
 * compiled only with the `viewer` feature.
 */

// Re-export key components for easier access
pub use agent::{Agent, AgentId, Pose, FORWARD};
pub use attractor::Attractor;
pub use error::ConfigError;
pub use obstacle::{NoObstacles, Obstacle, ObstacleField, ObstacleId, RayHit, Shape, ShapeField};
pub use params::{AgentTemplate, BlendWeights, SectorMode, SimulationConfig, TurnScaling, WanderConfig};
pub use simulation::Simulation;
pub use spatial_grid::SpatialGrid;
pub use wander::{CoherentNoise, SimplexNoise};

// Simulation core
pub mod agent;
pub mod attractor;
pub mod error;
pub mod integrator;
pub mod neighbor;
pub mod obstacle;
pub mod params;
pub mod simulation;
pub mod spatial_grid;
pub mod steering;
pub mod wander;

// Viewer
#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod camera;
#[cfg(feature = "viewer")]
pub mod debug;
#[cfg(feature = "viewer")]
pub mod input;
#[cfg(feature = "viewer")]
pub mod renderer;
#[cfg(feature = "viewer")]
pub mod ui;
