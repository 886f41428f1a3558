/*
 * Wander Module
 *
 * Bounded, time-continuous heading noise. Two coherent-noise channels keyed
 * by the agent's seed produce a yaw and a pitch offset which are composed
 * into a small rotation applied on top of the steering target.
 *
 * The noise source is a capability: anything implementing CoherentNoise,
 * including plain closures, can drive it. SimplexNoise is the default.
 */

use glam::DQuat;
use noise::{NoiseFn, OpenSimplex};

use crate::agent::Agent;
use crate::params::WanderConfig;

// Salt mixed into the agent seed for the pitch channel.
const PITCH_CHANNEL_SALT: u64 = 0x9E37_79B9_7F4A_7C15;
// Side of the square of lane offsets; each seed hashes to a point inside it.
const LANE_EXTENT: f64 = 65536.0;

// splitmix64 finalizer: every input bit affects every output bit.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic noise, continuous in `t`, with values in [-1, 1].
pub trait CoherentNoise {
    fn sample(&self, seed: u64, t: f64) -> f64;
}

impl<F> CoherentNoise for F
where
    F: Fn(u64, f64) -> f64,
{
    fn sample(&self, seed: u64, t: f64) -> f64 {
        self(seed, t)
    }
}

/// OpenSimplex noise where each seed selects its own lane, a line along `t`
/// through a 3D field offset by a hash of the full 64-bit seed.
#[derive(Clone)]
pub struct SimplexNoise {
    field: OpenSimplex,
}

impl SimplexNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            field: OpenSimplex::new(seed),
        }
    }
}

impl Default for SimplexNoise {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CoherentNoise for SimplexNoise {
    fn sample(&self, seed: u64, t: f64) -> f64 {
        let h = mix64(seed);
        let scale = LANE_EXTENT / (1u64 << 32) as f64;
        let a = (h >> 32) as f64 * scale;
        let b = (h & 0xFFFF_FFFF) as f64 * scale;
        self.field.get([t, a, b]).clamp(-1.0, 1.0)
    }
}

/// Seed of the second, independent wander channel.
pub fn pitch_seed(seed: u64) -> u64 {
    mix64(seed.wrapping_add(PITCH_CHANNEL_SALT))
}

/// Small rotation to compose onto an agent's target orientation at `elapsed` seconds.
pub fn wander_perturbation<N: CoherentNoise + ?Sized>(
    agent: &Agent,
    elapsed: f64,
    noise: &N,
    wander: &WanderConfig,
    planar: bool,
) -> DQuat {
    if wander.amplitude == 0.0 {
        return DQuat::IDENTITY;
    }
    let t = elapsed * wander.time_scale;
    let yaw = wander.amplitude * noise.sample(agent.noise_seed, t).clamp(-1.0, 1.0);
    let pitch = if planar {
        0.0
    } else {
        wander.amplitude * noise.sample(pitch_seed(agent.noise_seed), t).clamp(-1.0, 1.0)
    };
    (DQuat::from_rotation_z(yaw) * DQuat::from_rotation_x(pitch)).normalize()
}
