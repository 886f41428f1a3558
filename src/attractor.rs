/*
 * Attractor Module
 *
 * An attractor is a point that drifts through a cubic region driven by
 * coherent noise and pulls agents within its range toward itself. The flock
 * has none by default; hosts add them through the configuration.
 */

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::{ensure_non_negative, ensure_positive};
use crate::wander::CoherentNoise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attractor {
    pub position: DVec3,
    /// Magnitude of the pull added to an agent's heading.
    pub strength: f64,
    /// Agents closer than this are pulled.
    pub range: f64,
    /// Noise input advanced per elapsed second; zero keeps the attractor still.
    pub speed: f64,
    /// Half-size of the cube the attractor drifts in.
    pub bound: f64,
    pub seed: u64,
}

impl Default for Attractor {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            strength: 1.0,
            range: 100.0,
            speed: 0.0,
            bound: 200.0,
            seed: 0,
        }
    }
}

impl Attractor {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("attractor.strength", self.strength)?;
        ensure_positive("attractor.range", self.range)?;
        ensure_non_negative("attractor.speed", self.speed)?;
        ensure_non_negative("attractor.bound", self.bound)?;
        Ok(())
    }

    /// Moves the attractor to its noise-driven position at `elapsed` seconds.
    pub fn advance<N: CoherentNoise + ?Sized>(&mut self, elapsed: f64, noise: &N) {
        if self.speed == 0.0 {
            return;
        }
        let t = elapsed * self.speed;
        let span = 2.0 * self.bound;
        let axis = |channel: u64| {
            let value = noise.sample(self.seed.wrapping_add(channel), t).clamp(-1.0, 1.0);
            (value * 0.5 + 0.5) * span - self.bound
        };
        self.position = DVec3::new(axis(0), axis(1), axis(2));
    }

    /// Pull on an agent at `position`; zero outside the range or at the attractor itself.
    pub fn attraction(&self, position: DVec3) -> DVec3 {
        let offset = self.position - position;
        let distance = offset.length();
        if distance < self.range && distance > 0.0 {
            offset / distance * self.strength
        } else {
            DVec3::ZERO
        }
    }
}

/// Sum of the pulls of every attractor on `position`.
pub fn total_attraction(attractors: &[Attractor], position: DVec3) -> DVec3 {
    attractors
        .iter()
        .fold(DVec3::ZERO, |sum, attractor| sum + attractor.attraction(position))
}
