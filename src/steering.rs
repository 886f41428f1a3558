/*
 * Steering Module
 *
 * The heading adjustments that drive each agent, applied in sequence:
 * 1. Alignment: blend the current heading with the neighbors' average heading
 * 2. Separation: push away from agents inside the crowding sector
 * 3. Avoidance: push along obstacle normals when a surface is close
 *
 * All behaviors are pure functions over a frame snapshot. Alignment and
 * separation always return unit vectors; avoidance adds unnormalized
 * repulsion, which the integrator normalizes when it builds the target.
 */

use glam::DVec3;

use crate::agent::Agent;
use crate::neighbor::Neighborhood;
use crate::obstacle::{Obstacle, ObstacleField};
use crate::params::{BlendWeights, SectorMode};

/// Squared length under which a heading is treated as degenerate.
pub const DEGENERATE_LENGTH_SQUARED: f64 = 1e-24;

/// Normalizes `v`, or returns `fallback` when `v` is degenerate or not finite.
pub fn normalize_or_fallback(v: DVec3, fallback: DVec3) -> DVec3 {
    if v.is_finite() && v.length_squared() > DEGENERATE_LENGTH_SQUARED {
        v.normalize()
    } else {
        fallback
    }
}

/// Heading blended toward the average heading of the observer's neighborhood sector.
///
/// With no neighbors the observer's current heading is returned unchanged.
pub fn alignment_heading(
    observer: &Agent,
    neighborhood: &Neighborhood<'_>,
    weights: BlendWeights,
    mode: SectorMode,
) -> DVec3 {
    let current = observer.heading();

    let mut heading_sum = DVec3::ZERO;
    let mut count = 0usize;
    for other in neighborhood.in_sector_of(
        observer,
        observer.neighborhood_radius,
        observer.neighborhood_half_angle,
        mode,
    ) {
        heading_sum += other.heading();
        count += 1;
    }
    if count == 0 {
        return current;
    }

    let average = heading_sum / count as f64;
    let blended = (current * weights.w_self + average * weights.w_avg) / (weights.w_self + weights.w_avg);
    normalize_or_fallback(blended, current)
}

/// `incoming` pushed away from every agent inside the crowding sector, normalized.
///
/// Each neighbor contributes `diff / (d / crowding_radius)^power`; coincident
/// neighbors contribute nothing.
pub fn separation_heading(
    observer: &Agent,
    neighborhood: &Neighborhood<'_>,
    incoming: DVec3,
    repulsion_power: f64,
    mode: SectorMode,
) -> DVec3 {
    let mut repulsion = DVec3::ZERO;
    for other in neighborhood.in_sector_of(
        observer,
        observer.crowding_radius,
        observer.neighborhood_half_angle,
        mode,
    ) {
        let away = observer.position - other.position;
        let distance = away.length();
        if distance > 0.0 {
            repulsion += away / (distance / observer.crowding_radius).powf(repulsion_power);
        }
    }

    let fallback = normalize_or_fallback(incoming, observer.heading());
    normalize_or_fallback(incoming + repulsion, fallback)
}

/// Closest surface sample of an obstacle and its distance; infinite when there are none.
pub fn nearest_sample(position: DVec3, samples: &[DVec3]) -> (f64, Option<DVec3>) {
    samples
        .iter()
        .map(|&point| (position.distance(point), Some(point)))
        .fold((f64::INFINITY, None), |best, candidate| {
            if candidate.0 < best.0 {
                candidate
            } else {
                best
            }
        })
}

/// Repulsion from one obstacle, or zero when it is at least `collision_radius` away.
pub fn obstacle_repulsion<F: ObstacleField + ?Sized>(observer: &Agent, field: &F, obstacle: &Obstacle) -> DVec3 {
    let (distance, nearest) = nearest_sample(observer.position, field.surface_samples(obstacle.id));
    let Some(nearest) = nearest else {
        return DVec3::ZERO;
    };
    if !(distance < observer.collision_radius) {
        return DVec3::ZERO;
    }

    let direction = normalize_or_fallback(nearest - observer.position, observer.heading());
    let Some(hit) = field.raycast(observer.position, direction) else {
        return DVec3::ZERO;
    };
    let normal = normalize_or_fallback(hit.normal, DVec3::ZERO);

    let scale = 1.0 - distance / observer.collision_radius;
    normal * obstacle.repulsion_strength * scale
}

/// `incoming` plus the repulsion of every obstacle within collision range. Not renormalized.
pub fn avoidance_heading<F: ObstacleField + ?Sized>(observer: &Agent, field: &F, incoming: DVec3) -> DVec3 {
    field
        .obstacles()
        .iter()
        .fold(incoming, |heading, obstacle| heading + obstacle_repulsion(observer, field, obstacle))
}
