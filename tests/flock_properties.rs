/*
 * Flock Property Tests
 *
 * Whole-step behavior of the steering core through its public API.
 */

use std::f64::consts::FRAC_PI_6;

use boids3d::neighbor::{in_sector, Neighborhood};
use boids3d::steering::{alignment_heading, avoidance_heading, separation_heading};
use boids3d::{
    Agent, AgentId, AgentTemplate, BlendWeights, ConfigError, NoObstacles, SectorMode, ShapeField, SimplexNoise,
    Simulation, SimulationConfig, TurnScaling, WanderConfig,
};
use glam::{DQuat, DVec3};

const EPSILON: f64 = 1e-9;

fn agent(id: u64, position: DVec3, orientation: DQuat) -> Agent {
    Agent::new(AgentId(id), position, orientation, &AgentTemplate::default())
}

fn flock_config(agent_count: usize) -> SimulationConfig {
    SimulationConfig {
        agent_count,
        spawn_range: 150.0,
        ..SimulationConfig::default()
    }
}

fn still_config() -> SimulationConfig {
    SimulationConfig {
        wander: WanderConfig {
            amplitude: 0.0,
            ..WanderConfig::default()
        },
        ..SimulationConfig::default()
    }
}

fn boxed_flock(config: SimulationConfig) -> Simulation<ShapeField> {
    let field = ShapeField::default_box(config.max_range);
    Simulation::new(config, field, SimplexNoise::default()).unwrap()
}

#[test]
fn orientations_and_headings_stay_unit_length() {
    let mut sim = boxed_flock(flock_config(80));
    for _ in 0..200 {
        sim.step(1.0 / 60.0);
        for pose in sim.poses() {
            assert!((pose.orientation.length() - 1.0).abs() < EPSILON, "{} orientation drifted", pose.id);
            assert!((pose.heading().length() - 1.0).abs() < EPSILON, "{} heading drifted", pose.id);
            assert!(pose.position.is_finite());
        }
    }
}

#[test]
fn alignment_without_neighbors_returns_current_heading() {
    let lone = agent(0, DVec3::ZERO, DQuat::from_rotation_y(0.7) * DQuat::from_rotation_x(0.2));
    let far = agent(1, DVec3::new(500.0, 0.0, 0.0), DQuat::IDENTITY);
    let population = [lone.clone(), far];
    let heading = alignment_heading(
        &lone,
        &Neighborhood::all(&population),
        BlendWeights::default(),
        SectorMode::Heading,
    );
    assert_eq!(heading, lone.heading());
}

#[test]
fn sector_radius_is_exclusive() {
    let observer = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let radius = observer.neighborhood_radius;
    let half_angle = observer.neighborhood_half_angle;

    let at_radius = DVec3::new(0.0, radius, 0.0);
    let inside = DVec3::new(0.0, radius - 1e-9, 0.0);
    for mode in [SectorMode::Heading, SectorMode::WorldAzimuth] {
        assert!(!in_sector(&observer, at_radius, radius, half_angle, mode));
    }
    assert!(in_sector(&observer, inside, radius, half_angle, SectorMode::Heading));
}

#[test]
fn heading_sector_excludes_agents_behind() {
    let observer = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let behind = DVec3::new(0.0, -10.0, 0.0);
    let beside = DVec3::new(10.0, 0.0, 0.0);
    let radius = observer.neighborhood_radius;
    let half_angle = observer.neighborhood_half_angle;
    assert!(!in_sector(&observer, behind, radius, half_angle, SectorMode::Heading));
    assert!(in_sector(&observer, beside, radius, half_angle, SectorMode::Heading));
}

#[test]
fn world_azimuth_sector_ignores_heading() {
    let radius = 150.0;
    let half_angle = 2.0 * std::f64::consts::FRAC_PI_3;
    // The other agent sits at -Z, so the other-to-observer vector points along +Z.
    let other = DVec3::new(0.0, 0.0, -10.0);
    for orientation in [DQuat::IDENTITY, DQuat::from_rotation_z(2.5), DQuat::from_rotation_x(-1.0)] {
        let observer = agent(0, DVec3::ZERO, orientation);
        assert!(in_sector(&observer, other, radius, half_angle, SectorMode::WorldAzimuth));
        assert!(!in_sector(&observer, -other, radius, half_angle, SectorMode::WorldAzimuth));
    }
}

#[test]
fn coincident_agents_do_not_produce_nan() {
    let observer = agent(0, DVec3::new(5.0, 5.0, 5.0), DQuat::IDENTITY);
    let twin = agent(1, DVec3::new(5.0, 5.0, 5.0), DQuat::from_rotation_z(1.0));
    let population = [observer.clone(), twin];
    let heading = separation_heading(
        &observer,
        &Neighborhood::all(&population),
        observer.heading(),
        4.0,
        SectorMode::Heading,
    );
    assert!(heading.is_finite());
    assert!((heading.length() - 1.0).abs() < EPSILON);

    let mut sim = Simulation::from_agents(flock_config(0), population.to_vec(), NoObstacles, SimplexNoise::default())
        .unwrap();
    for _ in 0..10 {
        sim.step(0.1);
    }
    assert!(sim.poses().iter().all(|p| p.position.is_finite() && p.orientation.is_finite()));
}

fn wall_ahead(distance: f64) -> ShapeField {
    let mut field = ShapeField::new();
    field.add_quad(
        DVec3::new(0.0, distance, 0.0),
        DVec3::NEG_Y,
        DVec3::X,
        [10.0, 10.0],
        1.0,
        5.0,
    );
    field
}

#[test]
fn obstacle_at_collision_radius_is_ignored() {
    let observer = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let field = wall_ahead(observer.collision_radius);
    assert_eq!(avoidance_heading(&observer, &field, DVec3::ZERO), DVec3::ZERO);
}

#[test]
fn obstacle_inside_collision_radius_pushes_along_normal() {
    let observer = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let field = wall_ahead(observer.collision_radius - 1e-6);
    let push = avoidance_heading(&observer, &field, DVec3::ZERO);
    assert!(push.y < 0.0, "expected a push away from the wall, got {push}");
    assert!(push.x.abs() < EPSILON && push.z.abs() < EPSILON);
}

#[test]
fn containment_resets_only_after_crossing_the_bound() {
    let config = still_config();
    let bound = config.containment_radius();
    let runner = agent(0, DVec3::new(0.0, bound - 1.5, 0.0), DQuat::IDENTITY);
    let mut sim = Simulation::from_agents(config, vec![runner], NoObstacles, SimplexNoise::default()).unwrap();

    sim.step(0.1);
    assert_eq!(sim.poses()[0].position, DVec3::new(0.0, bound - 0.5, 0.0));

    sim.step(0.1);
    assert_eq!(sim.poses()[0].position, DVec3::ZERO);
}

#[test]
fn identical_runs_are_identical() {
    let run = || {
        let mut sim = boxed_flock(flock_config(60));
        let mut history = Vec::new();
        for i in 0..100 {
            sim.step(if i % 2 == 0 { 1.0 / 60.0 } else { 1.0 / 30.0 });
            history.push(sim.poses().to_vec());
        }
        history
    };
    assert_eq!(run(), run());
}

#[test]
fn parallel_compute_matches_sequential() {
    let mut sequential = boxed_flock(flock_config(150));
    let mut parallel = boxed_flock(SimulationConfig {
        parallel: true,
        ..flock_config(150)
    });
    for _ in 0..50 {
        sequential.step(1.0 / 60.0);
        parallel.step(1.0 / 60.0);
        assert_eq!(sequential.poses(), parallel.poses());
    }
}

#[test]
fn spatial_grid_matches_brute_force() {
    let mut brute = boxed_flock(flock_config(150));
    let mut gridded = boxed_flock(SimulationConfig {
        use_spatial_grid: true,
        ..flock_config(150)
    });
    for _ in 0..50 {
        brute.step(1.0 / 60.0);
        gridded.step(1.0 / 60.0);
        assert_eq!(brute.poses(), gridded.poses());
    }
}

#[test]
fn leader_ahead_steers_follower_but_not_the_reverse() {
    let template = AgentTemplate::default();
    let follower = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    // Ahead of the follower at half the neighborhood radius, heading 30 degrees off +Y.
    let leader = agent(
        1,
        DVec3::new(0.0, template.neighborhood_radius / 2.0, 0.0),
        DQuat::from_rotation_z(-FRAC_PI_6),
    );
    let population = [follower.clone(), leader.clone()];
    let neighborhood = Neighborhood::all(&population);

    let followed = alignment_heading(&follower, &neighborhood, BlendWeights::default(), SectorMode::Heading);
    assert!(followed.x > 0.0);
    assert!(followed.angle_between(leader.heading()) < follower.heading().angle_between(leader.heading()));

    let led = alignment_heading(&leader, &neighborhood, BlendWeights::default(), SectorMode::Heading);
    assert_eq!(led, leader.heading());
}

#[test]
fn lone_agent_wanders_smoothly_at_constant_speed() {
    let config = SimulationConfig {
        wander: WanderConfig {
            amplitude: 0.3,
            time_scale: 1.0,
        },
        ..SimulationConfig::default()
    };
    let lone = agent(0, DVec3::ZERO, DQuat::IDENTITY).with_noise_seed(77);
    let speed = lone.speed;
    let mut sim = Simulation::from_agents(config, vec![lone], NoObstacles, SimplexNoise::new(3)).unwrap();

    let mut previous = sim.poses()[0];
    let mut turned = 0.0;
    for _ in 0..300 {
        sim.step(1.0 / 60.0);
        let pose = sim.poses()[0];
        assert!(pose.position.is_finite() && pose.orientation.is_finite());
        assert!((pose.position.distance(previous.position) - speed).abs() < EPSILON);
        let step_turn = pose.heading().angle_between(previous.heading());
        assert!(step_turn < 0.05, "heading jumped by {step_turn} rad");
        turned += step_turn;
        previous = pose;
    }
    assert!(turned > 0.0, "wander never turned the agent");
}

#[test]
fn per_second_scaling_travels_by_elapsed_time() {
    let config = SimulationConfig {
        turn_scaling: TurnScaling::PerSecond { reference_hz: 60.0 },
        ..still_config()
    };
    let lone = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let mut sim = Simulation::from_agents(config, vec![lone], NoObstacles, SimplexNoise::default()).unwrap();
    sim.step(1.0 / 30.0);
    assert!((sim.poses()[0].position - DVec3::new(0.0, 2.0, 0.0)).length() < EPSILON);
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut config = flock_config(10);
    config.agent.crowding_radius = config.agent.neighborhood_radius * 2.0;
    assert!(matches!(
        Simulation::from_config(config),
        Err(ConfigError::CrowdingExceedsNeighborhood { .. })
    ));

    let mut config = flock_config(10);
    config.max_range = 0.0;
    assert!(Simulation::from_config(config).is_err());

    let mut bad = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    bad.collision_radius = -1.0;
    assert!(Simulation::from_agents(flock_config(0), vec![bad], NoObstacles, SimplexNoise::default()).is_err());
}

#[test]
fn degenerate_orientation_is_rejected() {
    let zero = agent(0, DVec3::ZERO, DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0));
    assert!(matches!(
        Simulation::from_agents(still_config(), vec![zero], NoObstacles, SimplexNoise::default()),
        Err(ConfigError::OutOfRange { field: "orientation", .. })
    ));

    let mut zeroed = agent(1, DVec3::ZERO, DQuat::IDENTITY);
    zeroed.orientation = DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0);
    assert!(Simulation::from_agents(still_config(), vec![zeroed], NoObstacles, SimplexNoise::default()).is_err());
}

#[test]
fn scaled_orientation_is_published_as_unit() {
    let mut scaled = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    scaled.orientation = DQuat::from_xyzw(0.0, 0.0, 0.0, 2.0);
    let mut sim = Simulation::from_agents(still_config(), vec![scaled], NoObstacles, SimplexNoise::default()).unwrap();
    assert!(sim.poses()[0].orientation.is_normalized());
    sim.step(1.0 / 60.0);
    let pose = sim.poses()[0];
    assert!(pose.orientation.is_normalized());
    assert!((pose.position - DVec3::new(0.0, sim.agents()[0].speed, 0.0)).length() < EPSILON);
}

#[test]
fn obstacle_without_samples_is_skipped() {
    let mut field = ShapeField::new();
    field.add_samples(Vec::new(), 5.0);
    let near = agent(0, DVec3::ZERO, DQuat::IDENTITY);
    let mut sim = Simulation::from_agents(still_config(), vec![near], field, SimplexNoise::default()).unwrap();
    for _ in 0..5 {
        sim.step(0.1);
    }
    assert_eq!(sim.poses()[0].position, DVec3::new(0.0, 5.0, 0.0));
}

#[test]
fn config_round_trips_through_json_file() {
    let path = std::env::temp_dir().join(format!("boids3d-config-{}.json", std::process::id()));
    let config = SimulationConfig {
        agent_count: 42,
        sector_mode: SectorMode::WorldAzimuth,
        ..SimulationConfig::default()
    };
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    let loaded = SimulationConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);

    assert!(matches!(
        SimulationConfig::from_json_file("/nonexistent/boids3d.json"),
        Err(ConfigError::Io(_))
    ));
}
