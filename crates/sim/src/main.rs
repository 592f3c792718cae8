use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use glam::{DVec3, Vec3};

use drift::coord::geodetic_to_geocentric;
use drift::{
    CoordinateConverter, DeadReckoningAlgorithm, DeadReckoningDriver, DeadReckoningState,
    DriverConfig, Ellipsoid, EntityId, EntityRegistry, GeoConfig, GroundClampStrategy,
    GroundClamper, TickContext, Transform, UpdateMode,
};

#[derive(Parser)]
#[command(name = "drift-sim")]
#[command(about = "Dead reckoning scenario runner")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 5.0, help = "Simulated seconds to run")]
    duration: f32,

    #[arg(short, long, default_value_t = 4)]
    entities: u32,

    #[arg(long, default_value_t = 1.0, help = "Seconds between synthetic network updates")]
    update_interval: f32,

    #[arg(long, default_value_t = 3.0, help = "Force ground clamp interval in seconds")]
    force_clamp_interval: f32,
}

struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(0.25);
    }

    fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
struct WorldRegistry {
    transforms: HashMap<EntityId, Transform>,
}

impl EntityRegistry for WorldRegistry {
    fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(&entity).copied()
    }

    fn apply_transform(&mut self, entity: EntityId, transform: &Transform) {
        self.transforms.insert(entity, *transform);
    }
}

/// Records clamp invocations so the force-clamp policy is visible in the
/// run summary. Performs no terrain correction.
#[derive(Default)]
struct RecordingClamper {
    clamps: usize,
}

impl GroundClamper for RecordingClamper {
    fn update_eye_point(&mut self) {}

    fn clamp_to_ground(
        &mut self,
        strategy: GroundClampStrategy,
        sim_time: f64,
        transform: &mut Transform,
        entity: EntityId,
    ) {
        self.clamps += 1;
        log::debug!(
            "clamp {entity:?} at t={sim_time:.2} ({strategy:?}), pose {:?}",
            transform.translation
        );
    }

    fn finish_up(&mut self) {}

    fn clear_references(&mut self) {}
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Local frame anchored near Oslo, incoming poses geocentric.
    let origin_lat = 59.91_f64.to_radians();
    let origin_lon = 10.75_f64.to_radians();
    let origin = geodetic_to_geocentric(&Ellipsoid::WGS84, origin_lat, origin_lon, 0.0);
    let converter = CoordinateConverter::new(GeoConfig {
        origin,
        ..GeoConfig::default()
    })?;

    let mut driver = DeadReckoningDriver::new(DriverConfig {
        force_clamp_interval_secs: args.force_clamp_interval,
        ..DriverConfig::default()
    });
    let mut registry = WorldRegistry::default();
    let mut clamper = RecordingClamper::default();

    for i in 0..args.entities {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_ground_clamp_strategy(GroundClampStrategy::Ranged);
        driver.register(EntityId(i), state, true, &mut registry)?;
    }
    log::info!(
        "registered {} remote entities, tick rate {} Hz",
        args.entities,
        args.tick_rate
    );

    let mut timestep = FixedTimestep::new(args.tick_rate);
    let dt = 1.0 / args.tick_rate as f32;
    let mut sim_time = 0.0_f64;
    let mut next_update = 0.0_f64;
    let mut last_frame = Instant::now();

    while sim_time < f64::from(args.duration) {
        let now = Instant::now();
        timestep.accumulate(now.duration_since(last_frame).as_secs_f32());
        last_frame = now;

        while timestep.consume_tick() && sim_time < f64::from(args.duration) {
            sim_time += f64::from(dt);

            // Periodic synthetic network updates: each entity travels along
            // local +x at its own speed. The truth pose goes out through the
            // converter as geocentric and comes back in, the way a network
            // payload would.
            if sim_time >= next_update {
                next_update += f64::from(args.update_interval);
                for i in 0..args.entities {
                    let speed = 5.0 * f64::from(i + 1);
                    let truth = DVec3::new(speed * sim_time, f64::from(i) * 10.0, 0.0);
                    let remote = converter.convert_to_remote_translation(truth)?;
                    let local = converter.convert_to_local_translation(remote)?;
                    if let Some(state) = driver.state_mut(EntityId(i)) {
                        state.set_last_known_translation(local.as_vec3());
                        state.set_last_known_velocity(Vec3::new(speed as f32, 0.0, 0.0));
                    }
                }
            }

            driver.tick(
                &TickContext {
                    sim_delta_secs: dt,
                    real_delta_secs: dt,
                    sim_time_secs: sim_time,
                },
                &mut registry,
                Some(&mut clamper),
                None,
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    for i in 0..args.entities {
        if let Some(transform) = registry.transform(EntityId(i)) {
            log::info!(
                "entity {i} final pose {:?} after {:.2} s",
                transform.translation,
                sim_time
            );
        }
    }
    log::info!("{} ground clamp invocations", clamper.clamps);

    Ok(())
}
