/*
 * Integrator Module
 *
 * Turns a steering target into the agent's next pose:
 * - builds a target orientation whose forward axis follows the target heading
 * - composes the wander rotation on top of it
 * - slerps the current orientation toward it by a bounded fraction
 * - advances along the post-interpolation heading
 * - resets agents that escaped the containment radius to the origin
 */

use glam::{DQuat, DVec3};

use crate::agent::{heading_of, Agent, Pose};
use crate::steering::normalize_or_fallback;

/// Per-step turn and travel amounts, already scaled for the step's elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Slerp fraction in [0, 1].
    pub turn_fraction: f64,
    /// Distance travelled along the new heading.
    pub displacement: f64,
}

/// Orientation whose forward axis points along `target_heading`, reached from
/// `current` by the shortest arc so roll is carried over.
///
/// A degenerate target keeps the current orientation.
pub fn target_orientation(current: DQuat, target_heading: DVec3) -> DQuat {
    let forward = heading_of(current);
    let direction = normalize_or_fallback(target_heading, forward);
    (DQuat::from_rotation_arc(forward, direction) * current).normalize()
}

/// Next pose of `agent` steering toward `target_heading`.
pub fn integrate(agent: &Agent, target_heading: DVec3, wander: DQuat, motion: Motion, containment_radius: f64) -> Pose {
    let current = agent.orientation;
    let target = (target_orientation(current, target_heading) * wander).normalize();

    let orientation = current.slerp(target, motion.turn_fraction.clamp(0.0, 1.0)).normalize();
    let orientation = if orientation.is_finite() { orientation } else { current };

    let heading = heading_of(orientation);
    let position = contain(agent.position + heading * motion.displacement, containment_radius);

    Pose {
        id: agent.id,
        position,
        orientation,
    }
}

/// Resets positions farther than `radius` from the origin back to it.
pub fn contain(position: DVec3, radius: f64) -> DVec3 {
    if position.length() > radius {
        DVec3::ZERO
    } else {
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentId, FORWARD};
    use crate::params::AgentTemplate;
    use std::f64::consts::FRAC_PI_2;

    fn agent_at(position: DVec3) -> Agent {
        Agent::new(AgentId(0), position, DQuat::IDENTITY, &AgentTemplate::default())
    }

    #[test]
    fn target_orientation_points_forward_along_heading() {
        let q = target_orientation(DQuat::IDENTITY, DVec3::new(3.0, 0.0, 4.0));
        assert!((q * FORWARD - DVec3::new(0.6, 0.0, 0.8)).length() < 1e-12);
    }

    #[test]
    fn zero_target_keeps_orientation() {
        let current = DQuat::from_rotation_x(0.4);
        let q = target_orientation(current, DVec3::ZERO);
        assert!(q.abs_diff_eq(current, 1e-12));
        let q = target_orientation(current, DVec3::splat(f64::NAN));
        assert!(q.abs_diff_eq(current, 1e-12));
    }

    #[test]
    fn full_turn_reaches_target_and_moves_along_it() {
        let agent = agent_at(DVec3::ZERO);
        let motion = Motion {
            turn_fraction: 1.0,
            displacement: 2.0,
        };
        let pose = integrate(&agent, DVec3::X, DQuat::IDENTITY, motion, 1000.0);
        assert!((pose.heading() - DVec3::X).length() < 1e-12);
        assert!((pose.position - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn partial_turn_moves_along_interpolated_heading() {
        let agent = agent_at(DVec3::ZERO);
        let motion = Motion {
            turn_fraction: 0.5,
            displacement: 1.0,
        };
        let pose = integrate(&agent, DVec3::X, DQuat::IDENTITY, motion, 1000.0);
        let expected = DVec3::new(1.0, 1.0, 0.0).normalize();
        assert!((pose.heading() - expected).length() < 1e-9);
        // Position follows the new heading, not the raw target.
        assert!((pose.position - expected).length() < 1e-9);
        assert!(pose.orientation.is_normalized());
    }

    #[test]
    fn wander_rotation_is_applied_on_top_of_target() {
        let agent = agent_at(DVec3::ZERO);
        let motion = Motion {
            turn_fraction: 1.0,
            displacement: 0.0,
        };
        let pose = integrate(&agent, DVec3::Y, DQuat::from_rotation_z(-FRAC_PI_2), motion, 1000.0);
        assert!((pose.heading() - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn containment_resets_only_past_the_radius() {
        assert_eq!(contain(DVec3::new(10.0, 0.0, 0.0), 10.0), DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(contain(DVec3::new(10.0 + 1e-9, 0.0, 0.0), 10.0), DVec3::ZERO);
    }
}
