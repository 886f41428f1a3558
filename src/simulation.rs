/*
 * Simulation Module
 *
 * This module defines the Simulation struct that owns a flock and advances
 * it one frame per `step` call. A step reads only the committed snapshot of
 * the previous frame:
 * 1. Attractors move to their positions for the new elapsed time
 * 2. Every agent's next pose is computed from the snapshot into a back buffer
 *    (optionally in parallel, optionally with a spatial grid broad phase)
 * 3. The back buffer is committed to the agents and swapped in as the
 *    published poses
 *
 * No agent ever observes a partially updated neighbor, so the result does
 * not depend on iteration order or on how the compute phase is scheduled.
 */

use std::collections::HashSet;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::agent::{Agent, AgentId, Pose};
use crate::attractor::{total_attraction, Attractor};
use crate::error::ConfigError;
use crate::integrator::{integrate, Motion};
use crate::neighbor::Neighborhood;
use crate::obstacle::{NoObstacles, ObstacleField, ObstacleId};
use crate::params::SimulationConfig;
use crate::spatial_grid::SpatialGrid;
use crate::steering::{alignment_heading, avoidance_heading, separation_heading};
use crate::wander::{wander_perturbation, CoherentNoise, SimplexNoise};

/// Read-only inputs shared by every agent's compute phase within one step.
struct StepContext<'a, F: ?Sized, N: ?Sized> {
    config: &'a SimulationConfig,
    field: &'a F,
    noise: &'a N,
    attractors: &'a [Attractor],
    grid: Option<&'a SpatialGrid>,
    elapsed: f64,
    dt: f64,
}

pub struct Simulation<F = NoObstacles, N = SimplexNoise> {
    config: SimulationConfig,
    agents: Vec<Agent>,
    poses: Vec<Pose>,
    back: Vec<Pose>,
    field: F,
    noise: N,
    attractors: Vec<Attractor>,
    // Broad phase, refilled every step while `use_spatial_grid` is on.
    grid: Option<SpatialGrid>,
    missing_samples: HashSet<ObstacleId>,
    frame: u64,
    elapsed: f64,
}

impl Simulation {
    /// Random flock from `config` with no obstacles and the default noise.
    pub fn from_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        Self::new(config, NoObstacles, SimplexNoise::default())
    }
}

impl<F, N> Simulation<F, N>
where
    F: ObstacleField + Sync,
    N: CoherentNoise + Sync,
{
    /// Validates `config` and spawns `config.agent_count` agents from its seed.
    pub fn new(config: SimulationConfig, field: F, noise: N) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let agents = (0..config.agent_count as u64)
            .map(|i| Agent::spawn(AgentId(i), &config.agent, config.spawn_range, config.planar, &mut rng))
            .collect();
        Self::from_agents(config, agents, field, noise)
    }

    /// Builds a simulation over an explicit population. `config.agent_count`,
    /// `seed` and `agent` are ignored; every agent is validated individually.
    pub fn from_agents(config: SimulationConfig, mut agents: Vec<Agent>, field: F, noise: N) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut ids = HashSet::with_capacity(agents.len());
        for agent in &mut agents {
            agent.validate()?;
            if !ids.insert(agent.id) {
                return Err(ConfigError::DuplicateAgentId(agent.id));
            }
            agent.orientation = agent.orientation.normalize();
        }

        info!(
            agents = agents.len(),
            obstacles = field.obstacles().len(),
            attractors = config.attractors.len(),
            "flock created"
        );

        let poses: Vec<Pose> = agents.iter().map(Agent::pose).collect();
        let attractors = config.attractors.clone();
        Ok(Self {
            back: Vec::with_capacity(poses.len()),
            poses,
            agents,
            field,
            noise,
            attractors,
            grid: None,
            missing_samples: HashSet::new(),
            frame: 0,
            elapsed: 0.0,
            config,
        })
    }

    /// Advances the flock by one frame of `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.elapsed += dt;
        self.frame += 1;
        self.report_missing_samples();

        for attractor in &mut self.attractors {
            attractor.advance(self.elapsed, &self.noise);
        }

        if self.config.use_spatial_grid {
            self.refresh_grid();
        }

        let snapshot = &self.agents;
        let ctx = StepContext {
            config: &self.config,
            field: &self.field,
            noise: &self.noise,
            attractors: &self.attractors,
            grid: self.grid.as_ref().filter(|_| self.config.use_spatial_grid),
            elapsed: self.elapsed,
            dt,
        };

        // Compute phase: reads the snapshot only.
        if self.config.parallel {
            snapshot
                .par_iter()
                .map(|agent| plan(agent, snapshot, &ctx))
                .collect_into_vec(&mut self.back);
        } else {
            self.back.clear();
            self.back.extend(snapshot.iter().map(|agent| plan(agent, snapshot, &ctx)));
        }

        // Commit phase.
        for (agent, pose) in self.agents.iter_mut().zip(&self.back) {
            agent.position = pose.position;
            agent.orientation = pose.orientation;
        }
        std::mem::swap(&mut self.poses, &mut self.back);

        trace!(frame = self.frame, elapsed = self.elapsed, "step committed");
    }

    /// Swaps in new simulation-wide settings without respawning the flock.
    ///
    /// Per-agent values (radii, speed, turn fraction) stay as spawned and the
    /// attractors keep their current positions when the count is unchanged.
    pub fn reconfigure(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.attractors.len() != self.attractors.len() {
            self.attractors = config.attractors.clone();
        }
        debug!(
            weights = ?config.weights,
            repulsion_power = config.repulsion_power,
            "simulation reconfigured"
        );
        self.config = config;
        Ok(())
    }

    // Cells must be at least as wide as the widest neighborhood; the layout is
    // rebuilt only when that or the containment radius changes.
    fn refresh_grid(&mut self) {
        let cell = self
            .agents
            .iter()
            .map(|a| a.neighborhood_radius)
            .fold(0.0, f64::max);
        let half_extent = self.config.containment_radius();
        let positions = self.agents.iter().map(|a| a.position);
        match self.grid.as_mut() {
            Some(grid) if grid.has_layout(cell, half_extent) => grid.refill(positions),
            _ => self.grid = Some(SpatialGrid::build(cell, half_extent, positions)),
        }
    }

    // Obstacles without samples never steer anyone; say so once per obstacle per run.
    fn report_missing_samples(&mut self) {
        for obstacle in self.field.obstacles() {
            if self.field.surface_samples(obstacle.id).is_empty() && self.missing_samples.insert(obstacle.id) {
                warn!(obstacle = obstacle.id.0, "obstacle has no surface samples; avoidance skipped");
            }
        }
    }

    /// Poses committed by the last step.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    /// Number of committed steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of every `dt` passed to `step`.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

// Next pose of one agent against the frame snapshot.
fn plan<F, N>(agent: &Agent, snapshot: &[Agent], ctx: &StepContext<'_, F, N>) -> Pose
where
    F: ObstacleField + ?Sized,
    N: CoherentNoise + ?Sized,
{
    let config = ctx.config;

    let candidates;
    let neighborhood = match ctx.grid {
        Some(grid) => {
            candidates = grid.nearby_indices(agent.position);
            Neighborhood::with_candidates(snapshot, &candidates)
        }
        None => Neighborhood::all(snapshot),
    };

    let aligned = alignment_heading(agent, &neighborhood, config.weights, config.sector_mode);
    let separated = separation_heading(agent, &neighborhood, aligned, config.repulsion_power, config.sector_mode);
    let avoided = avoidance_heading(agent, ctx.field, separated);
    let target = avoided + attraction(ctx.attractors, agent.position);

    let wander = wander_perturbation(agent, ctx.elapsed, ctx.noise, &config.wander, config.planar);
    let (turn_fraction, steps) = config.turn_scaling.factors(agent.turn_fraction, ctx.dt);
    let motion = Motion {
        turn_fraction,
        displacement: agent.speed * steps,
    };

    integrate(agent, target, wander, motion, config.containment_radius())
}

fn attraction(attractors: &[Attractor], position: DVec3) -> DVec3 {
    if attractors.is_empty() {
        DVec3::ZERO
    } else {
        total_attraction(attractors, position)
    }
}
