//! Tick loop scenarios

use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::clock::SystemClock;
use crate::sensors::{ScriptedSource, SensorReading};

fn config(duration_secs: f64, refresh_rate_hz: f64) -> SimulationConfig {
    let mut cfg = SimulationConfig::deterministic();
    cfg.duration_secs = duration_secs;
    cfg.refresh_rate_hz = refresh_rate_hz;
    cfg
}

fn single_obstacle_sim(cfg: SimulationConfig, range: f64) -> Simulation {
    Simulation::new(cfg).unwrap().with_obstacles(vec![Obstacle::new(0.0, range)]).unwrap()
}

// ========== End-to-end ==========

#[test]
fn test_five_second_run_without_respawn() {
    let mut sim = single_obstacle_sim(config(5.0, 1.0), -20.0);
    let summary = sim.replay();

    assert_eq!(summary.ticks, 5);
    assert_eq!(sim.obstacles()[0].range_along_path, -17.5);
    assert_eq!(summary.respawns, 0);
    assert_eq!(summary.collision_ticks, 0);
    assert_eq!(sim.state(), SimState::Stopped);
}

#[test]
fn test_long_run_forces_respawn() {
    let mut sim = single_obstacle_sim(config(60.0, 1.0), -20.0);
    let summary = sim.replay();

    assert_eq!(summary.ticks, 60);
    assert!(summary.respawns >= 1, "obstacle should have been recycled");
    // Ranges -1.5 ..= 1.5 are inside the 2 m collision distance
    assert_eq!(summary.collision_ticks, 7);
    let o = sim.obstacles()[0];
    assert!(o.range_along_path < -5.0, "recycled obstacle should be ahead again: {:?}", o);
    assert!(o.lateral_offset >= -2.0 && o.lateral_offset <= 2.0);
}

#[test]
fn test_tick_count_follows_refresh_rate() {
    let mut sim = Simulation::new(config(5.0, 4.0)).unwrap();
    let summary = sim.replay();
    assert_eq!(summary.ticks, 20);
    assert_eq!(summary.ticks, sim.config().expected_ticks());
}

#[test]
fn test_zero_duration_runs_no_ticks() {
    let mut sim = Simulation::new(config(0.0, 1.0)).unwrap();
    let summary = sim.replay();
    assert_eq!(summary.ticks, 0);
    assert_eq!(sim.state(), SimState::Stopped);
}

#[test]
fn test_same_seed_same_run() {
    let mut cfg = SimulationConfig::realistic();
    cfg.duration_secs = 40.0;
    let a = Simulation::new(cfg.clone()).unwrap().replay();
    let b = Simulation::new(cfg).unwrap().replay();
    assert_eq!(a, b);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let mut cfg = SimulationConfig::default();
    cfg.refresh_rate_hz = 0.0;
    assert!(matches!(Simulation::new(cfg), Err(FcaError::InvalidConfig(_))));
}

// ========== Decisions ==========

#[test]
fn test_deterministic_closing_brakes() {
    // Closing at 5 m/s once the speed filter settles; TTC < 2 s means < 10 m
    let mut sim = single_obstacle_sim(config(30.0, 1.0), -30.0);
    let mut saw_safe = false;
    let mut saw_brake = false;

    for _ in 0..30 {
        let result = sim.step();
        if result.decision == Decision::Collision {
            break;
        }
        assert!(result.ttc.is_finite());
        match result.decision {
            Decision::Safe => saw_safe = true,
            Decision::Brake => saw_brake = true,
            Decision::Collision => unreachable!(),
        }
    }
    assert!(saw_safe && saw_brake);
}

#[test]
fn test_collision_tick_freezes_filters() {
    let mut sim = single_obstacle_sim(config(10.0, 1.0), -2.5);

    // Tick 1: range -2.0, distance 2.0 is not below the threshold
    let first = sim.step();
    assert_ne!(first.decision, Decision::Collision);
    let range_before = (sim.range_estimator().estimate(), sim.range_estimator().uncertainty());
    let speed_before = (sim.speed_estimator().estimate(), sim.speed_estimator().uncertainty());

    // Tick 2: distance 1.5 -> collision, filters untouched
    let second = sim.step();
    assert_eq!(second.decision, Decision::Collision);
    assert_eq!(second.distance, 1.5);
    assert_eq!(second.ttc, 0.0);
    assert_eq!(second.filtered_distance, first.filtered_distance);
    assert_eq!((sim.range_estimator().estimate(), sim.range_estimator().uncertainty()), range_before);
    assert_eq!((sim.speed_estimator().estimate(), sim.speed_estimator().uncertainty()), speed_before);
}

#[test]
fn test_collision_tick_repeats_previous_closing_speed() {
    let readings = vec![
        SensorReading { lidar_range: 2.0, radar_speed: 10.0, gps_speed: 20.0 },
        SensorReading { lidar_range: 1.5, radar_speed: 10.0, gps_speed: 30.0 },
    ];
    let mut sim = single_obstacle_sim(config(10.0, 1.0), -2.5).with_source(ScriptedSource::new(readings));

    let first = sim.step();
    let second = sim.step();
    assert_eq!(second.decision, Decision::Collision);
    assert_eq!(second.filtered_relative_speed, first.filtered_relative_speed);
    assert_eq!(second.ego_speed, 30.0);
}

#[test]
fn test_collision_tick_updates_filters_when_enabled() {
    let mut cfg = config(10.0, 1.0);
    cfg.update_filters_on_collision = true;
    let mut sim = single_obstacle_sim(cfg, -1.5);

    let result = sim.step();
    assert_eq!(result.decision, Decision::Collision);
    assert!(sim.range_estimator().estimate() > 0.0);
}

#[test]
fn test_collision_regardless_of_filtered_values() {
    let reading = SensorReading { lidar_range: 80.0, radar_speed: 0.0, gps_speed: 0.0 };
    let mut sim = single_obstacle_sim(config(10.0, 1.0), -1.5).with_source(ScriptedSource::constant(reading));

    let result = sim.step();
    assert_eq!(result.decision, Decision::Collision);
    assert_eq!(sim.range_estimator().estimate(), 0.0);
    assert_eq!(sim.range_estimator().uncertainty(), 1.0);
}

// ========== Degenerate measurements ==========

#[test]
fn test_non_finite_range_reuses_previous_estimate() {
    let good = SensorReading { lidar_range: 18.0, radar_speed: 10.0, gps_speed: 20.0 };
    let bad = SensorReading { lidar_range: f64::NAN, radar_speed: 10.0, gps_speed: 20.0 };
    let source = ScriptedSource::new(vec![good, bad, good]);
    let mut sim = single_obstacle_sim(config(10.0, 1.0), -20.0).with_source(source);

    let first = sim.step();
    assert!(!first.degraded);
    let range_after_first = sim.range_estimator().estimate();
    let speed_after_first = sim.speed_estimator().estimate();

    let second = sim.step();
    assert!(second.degraded);
    assert_eq!(second.filtered_distance, range_after_first);
    assert!(second.ttc.is_finite());
    // The healthy channel still updates
    assert_ne!(sim.speed_estimator().estimate(), speed_after_first);

    let third = sim.step();
    assert!(!third.degraded);
    assert_ne!(third.filtered_distance, range_after_first);
    assert_eq!(sim.summary().degraded_ticks, 1);
}

#[test]
fn test_non_finite_gps_holds_last_ego_speed() {
    let good = SensorReading { lidar_range: 18.0, radar_speed: 10.0, gps_speed: 22.0 };
    let bad = SensorReading { lidar_range: 18.0, radar_speed: 10.0, gps_speed: f64::INFINITY };
    let mut sim =
        single_obstacle_sim(config(10.0, 1.0), -20.0).with_source(ScriptedSource::new(vec![good, bad]));

    sim.step();
    let result = sim.step();
    assert!(result.degraded);
    assert_eq!(result.ego_speed, 22.0);
    assert!(result.filtered_relative_speed.is_finite());
}

// ========== Publishing ==========

#[test]
fn test_snapshot_published_every_tick() {
    let mut sim = single_obstacle_sim(config(3.0, 1.0), -20.0);
    let reader = sim.reader();

    let initial = reader.latest().unwrap();
    assert_eq!(initial.tick, 0);
    assert_eq!(initial.obstacles[0].range_along_path, -20.0);

    let result = sim.step();
    let snap = reader.latest().unwrap();
    assert_eq!(snap.tick, 1);
    assert_eq!(snap.result, result);
    assert_eq!(snap.obstacles[0].range_along_path, -19.5);
    assert_eq!(snap.braking(), result.is_braking());

    sim.replay();
    let last = reader.latest().unwrap();
    assert_eq!(last.state, SimState::Stopped);
    assert_eq!(last.tick, sim.tick());
}

#[test]
fn test_stop_handle_ends_real_time_run() {
    let mut cfg = config(600.0, 10.0);
    cfg.seed = 5;
    let mut sim = Simulation::new(cfg).unwrap();
    let reader = sim.reader();
    let stop = StopHandle::new();
    let remote = stop.clone();

    let started = Instant::now();
    let worker = thread::spawn(move || {
        let summary = sim.run(&mut SystemClock::new(), &stop);
        (summary, sim.state())
    });

    thread::sleep(Duration::from_millis(150));
    remote.stop();
    let (summary, state) = worker.join().unwrap();

    assert_eq!(state, SimState::Stopped);
    assert!(summary.ticks >= 1);
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(reader.latest().unwrap().state, SimState::Stopped);
}

#[test]
fn test_step_after_stop_is_noop() {
    let mut sim = Simulation::new(config(3.0, 1.0)).unwrap();
    let reader = sim.reader();
    sim.replay();
    let last = *sim.last_result();
    let obstacles = sim.obstacles().to_vec();

    let result = sim.step();
    assert_eq!(result, last);
    assert_eq!(sim.tick(), 3);
    assert_eq!(sim.summary().ticks, 3);
    assert_eq!(sim.obstacles(), obstacles.as_slice());

    let snap = reader.latest().unwrap();
    assert_eq!(snap.state, SimState::Stopped);
    assert_eq!(snap.tick, 3);
}

#[test]
fn test_unschedulable_timing_rejected_at_construction() {
    for (duration, rate) in [(1e20, 1.0), (5.0, 1e-300)] {
        let result = Simulation::new(config(duration, rate));
        assert!(matches!(result, Err(FcaError::InvalidConfig(_))), "{} s at {} Hz", duration, rate);
    }
}

#[test]
fn test_with_obstacles_after_start_rejected() {
    let mut sim = Simulation::new(config(5.0, 1.0)).unwrap();
    sim.step();
    let result = sim.with_obstacles(vec![Obstacle::new(0.0, -20.0)]);
    assert!(matches!(result, Err(FcaError::InvalidConfig(_))));
}
