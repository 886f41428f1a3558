/*
 * Simulation Parameters Module
 *
 * This module defines SimulationConfig, the plain configuration structure
 * supplied by the host, together with its nested sections and validation.
 * Every field has a default so partial JSON documents are accepted. The
 * viewer mutates a copy of the config through its UI and uses the change
 * detection helpers at the bottom of this file to decide what to rebuild.
 */

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attractor::Attractor;
use crate::error::ConfigError;

/// Positions farther than this multiple of `max_range` from the origin are reset.
pub const CONTAINMENT_FACTOR: f64 = 1.75;

/// Default scale applied to every obstacle's avoidance normal.
pub const DEFAULT_REPULSION_STRENGTH: f64 = 5.0;

/// Radii and speeds every spawned agent starts from before jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTemplate {
    pub neighborhood_radius: f64,
    /// Half-angle of the alignment/separation cone, radians.
    pub neighborhood_half_angle: f64,
    pub crowding_radius: f64,
    pub collision_radius: f64,
    /// Distance travelled per step.
    pub speed: f64,
    /// Slerp fraction applied per step.
    pub turn_fraction: f64,
    /// Relative +/- jitter applied to radii and speed at spawn, in [0, 1).
    pub jitter: f64,
}

impl Default for AgentTemplate {
    fn default() -> Self {
        Self {
            neighborhood_radius: 150.0,
            neighborhood_half_angle: 2.0 * std::f64::consts::FRAC_PI_3,
            crowding_radius: 30.0,
            collision_radius: 40.0,
            speed: 1.0,
            turn_fraction: 0.05,
            jitter: 0.1,
        }
    }
}

/// Weights used to blend the current heading with the neighbors' average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub w_self: f64,
    pub w_avg: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self { w_self: 0.5, w_avg: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Peak yaw/pitch offset in radians.
    pub amplitude: f64,
    /// Multiplier from elapsed seconds to noise input.
    pub time_scale: f64,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.15,
            time_scale: 0.25,
        }
    }
}

/// How the neighbor cone's angular test is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorMode {
    /// Angle between the observer's heading and the line of sight to the other agent.
    #[default]
    Heading,
    /// Polar angle of the un-rotated other-to-observer vector, ignoring heading.
    WorldAzimuth,
}

/// How turn fraction and displacement relate to the step's elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnScaling {
    /// Fixed fraction and displacement per call, regardless of `dt`.
    #[default]
    PerStep,
    /// Fraction and displacement normalized to `reference_hz` steps per second.
    PerSecond { reference_hz: f64 },
}

impl TurnScaling {
    /// Slerp fraction and displacement multiplier for one step of `dt` seconds.
    pub fn factors(&self, turn_fraction: f64, dt: f64) -> (f64, f64) {
        match *self {
            TurnScaling::PerStep => (turn_fraction, 1.0),
            TurnScaling::PerSecond { reference_hz } => {
                let steps = (dt * reference_hz).max(0.0);
                let fraction = 1.0 - (1.0 - turn_fraction).powf(steps);
                (fraction.clamp(0.0, 1.0), steps)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub agent_count: usize,
    /// Seed for population generation.
    pub seed: u64,
    /// Agents spawn uniformly inside [-spawn_range, spawn_range] per axis.
    pub spawn_range: f64,
    /// Spawn on the z = 0 plane and disable the pitch wander channel.
    pub planar: bool,
    pub agent: AgentTemplate,
    pub weights: BlendWeights,
    /// Exponent of the separation falloff.
    pub repulsion_power: f64,
    /// Soft bound; containment triggers beyond CONTAINMENT_FACTOR times this.
    pub max_range: f64,
    pub sector_mode: SectorMode,
    pub turn_scaling: TurnScaling,
    pub wander: WanderConfig,
    pub attractors: Vec<Attractor>,
    // Performance settings
    pub parallel: bool,
    pub use_spatial_grid: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 200,
            seed: 0x5EED_B01D,
            spawn_range: 200.0,
            planar: false,
            agent: AgentTemplate::default(),
            weights: BlendWeights::default(),
            repulsion_power: 4.0,
            max_range: 250.0,
            sector_mode: SectorMode::default(),
            turn_scaling: TurnScaling::default(),
            wander: WanderConfig::default(),
            attractors: Vec::new(),
            parallel: false,
            use_spatial_grid: false,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Distance from the origin past which agents are reset.
    pub fn containment_radius(&self) -> f64 {
        CONTAINMENT_FACTOR * self.max_range
    }

    /// Checks every simulation-wide value and the agent template.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.agent;
        ensure_positive("agent.neighborhood_radius", t.neighborhood_radius)?;
        ensure_range(
            "agent.neighborhood_half_angle",
            "(0, pi]",
            t.neighborhood_half_angle,
            |v| v > 0.0 && v <= std::f64::consts::PI,
        )?;
        ensure_positive("agent.crowding_radius", t.crowding_radius)?;
        if t.crowding_radius > t.neighborhood_radius {
            return Err(ConfigError::CrowdingExceedsNeighborhood {
                crowding: t.crowding_radius,
                neighborhood: t.neighborhood_radius,
            });
        }
        ensure_positive("agent.collision_radius", t.collision_radius)?;
        ensure_non_negative("agent.speed", t.speed)?;
        ensure_range("agent.turn_fraction", "(0, 1]", t.turn_fraction, |v| {
            v > 0.0 && v <= 1.0
        })?;
        ensure_range("agent.jitter", "[0, 1)", t.jitter, |v| (0.0..1.0).contains(&v))?;

        ensure_non_negative("weights.w_self", self.weights.w_self)?;
        ensure_non_negative("weights.w_avg", self.weights.w_avg)?;
        if self.weights.w_self + self.weights.w_avg <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }

        ensure_non_negative("repulsion_power", self.repulsion_power)?;
        ensure_positive("max_range", self.max_range)?;
        ensure_non_negative("spawn_range", self.spawn_range)?;
        ensure_non_negative("wander.amplitude", self.wander.amplitude)?;
        ensure_non_negative("wander.time_scale", self.wander.time_scale)?;
        if let TurnScaling::PerSecond { reference_hz } = self.turn_scaling {
            ensure_positive("turn_scaling.reference_hz", reference_hz)?;
        }
        for attractor in &self.attractors {
            attractor.validate()?;
        }
        Ok(())
    }

    // Take a snapshot of the tunables the viewer exposes, for change detection
    pub fn tunables(&self) -> Tunables {
        Tunables {
            agent_count: self.agent_count,
            weights: self.weights,
            repulsion_power: self.repulsion_power,
            speed: self.agent.speed,
            turn_fraction: self.agent.turn_fraction,
            wander_amplitude: self.wander.amplitude,
        }
    }

    // Returns (population_changed, any_changed) relative to a previous snapshot
    pub fn detect_changes(&self, previous: &Tunables) -> (bool, bool) {
        let current = self.tunables();
        let population_changed = current.agent_count != previous.agent_count
            || current.speed != previous.speed
            || current.turn_fraction != previous.turn_fraction;
        (population_changed, current != *previous)
    }
}

/// The subset of the configuration the viewer lets users edit live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub agent_count: usize,
    pub weights: BlendWeights,
    pub repulsion_power: f64,
    pub speed: f64,
    pub turn_fraction: f64,
    pub wander_amplitude: f64,
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    ensure_range(field, "[0, inf)", value, |v| v >= 0.0 && v.is_finite())
}

pub(crate) fn ensure_range(
    field: &'static str,
    range: &'static str,
    value: f64,
    accept: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if accept(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, range, value })
    }
}
