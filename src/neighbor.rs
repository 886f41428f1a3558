/*
 * Neighbor Query Module
 *
 * Decides which agents of a snapshot fall inside an observer's sector: a
 * cone of a given radius and half-angle around the observer's heading.
 * Alignment queries the wide neighborhood sector, separation the tight
 * crowding sector.
 */

use glam::DVec3;

use crate::agent::Agent;
use crate::params::SectorMode;

/// Returns true when `other` lies inside `observer`'s sector.
///
/// The radius test is exclusive: an agent exactly `radius` away is outside.
pub fn in_sector(observer: &Agent, other: DVec3, radius: f64, half_angle: f64, mode: SectorMode) -> bool {
    let distance = observer.position.distance(other);
    if !(distance < radius) {
        return false;
    }

    // Vector from the other agent to the observer.
    let relative = observer.position - other;
    let deviation = match mode {
        SectorMode::Heading => {
            if distance == 0.0 {
                return true;
            }
            // The other agent is ahead when `relative` points against the heading.
            let line_of_sight = -relative / distance;
            line_of_sight.dot(observer.heading()).clamp(-1.0, 1.0).acos()
        }
        SectorMode::WorldAzimuth => relative.x.atan2(relative.z),
    };

    half_angle >= std::f64::consts::PI || deviation.abs() < half_angle
}

/// A frame snapshot plus an optional pre-filtered candidate list.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood<'a> {
    population: &'a [Agent],
    candidates: Option<&'a [usize]>,
}

impl<'a> Neighborhood<'a> {
    /// Every agent of the snapshot is a candidate.
    pub fn all(population: &'a [Agent]) -> Self {
        Self {
            population,
            candidates: None,
        }
    }

    /// Only `candidates` (ascending indices into `population`) are considered.
    pub fn with_candidates(population: &'a [Agent], candidates: &'a [usize]) -> Self {
        Self {
            population,
            candidates: Some(candidates),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Agent> + 'a {
        let population = self.population;
        let candidates = self.candidates;
        let (all, some) = match candidates {
            None => (Some(population.iter()), None),
            Some(indices) => (None, Some(indices.iter().map(move |&i| &population[i]))),
        };
        all.into_iter().flatten().chain(some.into_iter().flatten())
    }

    /// Agents other than `observer` inside its sector.
    pub fn in_sector_of<'b>(
        &'b self,
        observer: &'b Agent,
        radius: f64,
        half_angle: f64,
        mode: SectorMode,
    ) -> impl Iterator<Item = &'a Agent> + 'b
    where
        'a: 'b,
    {
        self.iter()
            .filter(move |other| other.id != observer.id)
            .filter(move |other| in_sector(observer, other.position, radius, half_angle, mode))
    }
}
