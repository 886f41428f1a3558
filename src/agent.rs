/*
 * Agent Module
 *
 * This module defines the Agent struct: the per-boid state read by the
 * steering behaviors and rewritten once per step by the simulation.
 * Agents have no behavior of their own beyond deriving their heading.
 */

use std::fmt;

use glam::{DQuat, DVec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::{ensure_non_negative, ensure_positive, ensure_range, AgentTemplate};

// Quaternions shorter than this are treated as degenerate.
const MIN_ORIENTATION_LENGTH: f64 = 1e-9;

/// Local axis an agent travels along.
pub const FORWARD: DVec3 = DVec3::Y;

/// Opaque, unique agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Published pose of one agent after a committed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub id: AgentId,
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Pose {
    pub fn heading(&self) -> DVec3 {
        heading_of(self.orientation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: DVec3,
    pub orientation: DQuat,
    pub neighborhood_radius: f64,
    pub neighborhood_half_angle: f64,
    pub crowding_radius: f64,
    pub collision_radius: f64,
    pub speed: f64,
    pub turn_fraction: f64,
    pub noise_seed: u64,
}

impl Agent {
    /// Creates an agent at `position` facing `orientation` with the template's
    /// radii and speeds, unjittered.
    pub fn new(id: AgentId, position: DVec3, orientation: DQuat, template: &AgentTemplate) -> Self {
        Self {
            id,
            position,
            orientation: orientation.normalize(),
            neighborhood_radius: template.neighborhood_radius,
            neighborhood_half_angle: template.neighborhood_half_angle,
            crowding_radius: template.crowding_radius,
            collision_radius: template.collision_radius,
            speed: template.speed,
            turn_fraction: template.turn_fraction,
            noise_seed: 0,
        }
    }

    /// Spawns an agent with a random position, orientation and jittered radii.
    ///
    /// In planar mode agents start on the z = 0 plane and only rotate about Z,
    /// like the flat flocks this core grew out of.
    pub fn spawn<R: Rng>(
        id: AgentId,
        template: &AgentTemplate,
        spawn_range: f64,
        planar: bool,
        rng: &mut R,
    ) -> Self {
        let x = rng.gen_range(-spawn_range..=spawn_range);
        let y = rng.gen_range(-spawn_range..=spawn_range);
        let z = if planar { 0.0 } else { rng.gen_range(-spawn_range..=spawn_range) };

        let orientation = if planar {
            DQuat::from_rotation_z(rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI))
        } else {
            random_orientation(rng)
        };

        let jitter = template.jitter;
        let mut scale = || 1.0 + rng.gen_range(-jitter..=jitter);

        let neighborhood_radius = template.neighborhood_radius * scale();
        // Jitter must not push the crowding sector outside the neighborhood.
        let crowding_radius = (template.crowding_radius * scale()).min(neighborhood_radius);
        let collision_radius = template.collision_radius * scale();
        let speed = template.speed * scale();

        Self {
            id,
            position: DVec3::new(x, y, z),
            orientation,
            neighborhood_radius,
            neighborhood_half_angle: template.neighborhood_half_angle,
            crowding_radius,
            collision_radius,
            speed,
            turn_fraction: template.turn_fraction,
            noise_seed: rng.gen(),
        }
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }

    /// Unit forward direction derived from the orientation.
    pub fn heading(&self) -> DVec3 {
        heading_of(self.orientation)
    }

    pub fn pose(&self) -> Pose {
        Pose {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("neighborhood_radius", self.neighborhood_radius)?;
        ensure_range(
            "neighborhood_half_angle",
            "(0, pi]",
            self.neighborhood_half_angle,
            |v| v > 0.0 && v <= std::f64::consts::PI,
        )?;
        ensure_positive("crowding_radius", self.crowding_radius)?;
        if self.crowding_radius > self.neighborhood_radius {
            return Err(ConfigError::CrowdingExceedsNeighborhood {
                crowding: self.crowding_radius,
                neighborhood: self.neighborhood_radius,
            });
        }
        ensure_positive("collision_radius", self.collision_radius)?;
        ensure_non_negative("speed", self.speed)?;
        ensure_range("turn_fraction", "(0, 1]", self.turn_fraction, |v| v > 0.0 && v <= 1.0)?;
        for (field, value) in [
            ("position.x", self.position.x),
            ("position.y", self.position.y),
            ("position.z", self.position.z),
        ] {
            ensure_range(field, "finite", value, f64::is_finite)?;
        }
        // A zero or non-finite quaternion has no heading and cannot be normalized.
        let length = self.orientation.length();
        ensure_range(
            "orientation",
            "non-zero finite quaternion length",
            length,
            |v| v.is_finite() && v > MIN_ORIENTATION_LENGTH,
        )?;
        Ok(())
    }
}

/// Forward axis rotated by `orientation`, renormalized.
pub fn heading_of(orientation: DQuat) -> DVec3 {
    (orientation * FORWARD).normalize_or(FORWARD)
}

// Uniform random rotation (Shoemake's method).
fn random_orientation<R: Rng>(rng: &mut R) -> DQuat {
    use std::f64::consts::TAU;
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen::<f64>() * TAU;
    let u3: f64 = rng.gen::<f64>() * TAU;
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    DQuat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn heading_follows_orientation() {
        let agent = Agent::new(
            AgentId(1),
            DVec3::ZERO,
            DQuat::from_rotation_z(-std::f64::consts::FRAC_PI_2),
            &AgentTemplate::default(),
        );
        let heading = agent.heading();
        assert!((heading - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn spawned_agents_are_valid() {
        let template = AgentTemplate {
            jitter: 0.5,
            crowding_radius: 140.0,
            ..AgentTemplate::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..200 {
            let agent = Agent::spawn(AgentId(i), &template, 100.0, false, &mut rng);
            agent.validate().unwrap();
            assert!(agent.orientation.is_normalized());
        }
    }

    #[test]
    fn planar_spawn_stays_on_plane() {
        let mut rng = StdRng::seed_from_u64(3);
        let agent = Agent::spawn(AgentId(0), &AgentTemplate::default(), 50.0, true, &mut rng);
        assert_eq!(agent.position.z, 0.0);
        assert!(agent.heading().z.abs() < 1e-12);
    }

    #[test]
    fn degenerate_orientation_is_rejected() {
        let template = AgentTemplate::default();
        let zero = Agent::new(AgentId(0), DVec3::ZERO, DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0), &template);
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::OutOfRange { field: "orientation", .. })
        ));

        let mut tiny = Agent::new(AgentId(1), DVec3::ZERO, DQuat::IDENTITY, &template);
        tiny.orientation = DQuat::from_xyzw(0.0, 0.0, 0.0, 1e-12);
        assert!(tiny.validate().is_err());

        let mut scaled = Agent::new(AgentId(2), DVec3::ZERO, DQuat::IDENTITY, &template);
        scaled.orientation = DQuat::from_xyzw(0.0, 0.0, 0.0, 3.0);
        scaled.validate().unwrap();
    }

    #[test]
    fn non_finite_position_names_the_coordinate() {
        let mut agent = Agent::new(AgentId(0), DVec3::ZERO, DQuat::IDENTITY, &AgentTemplate::default());
        agent.position.y = f64::INFINITY;
        match agent.validate() {
            Err(ConfigError::OutOfRange { field, value, .. }) => {
                assert_eq!(field, "position.y");
                assert_eq!(value, f64::INFINITY);
            }
            other => panic!("expected an out-of-range position, got {other:?}"),
        }
    }

    #[test]
    fn crowding_larger_than_neighborhood_is_rejected() {
        let mut agent = Agent::new(AgentId(0), DVec3::ZERO, DQuat::IDENTITY, &AgentTemplate::default());
        agent.crowding_radius = agent.neighborhood_radius + 1.0;
        assert!(matches!(
            agent.validate(),
            Err(ConfigError::CrowdingExceedsNeighborhood { .. })
        ));
    }
}
