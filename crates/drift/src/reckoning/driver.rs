use std::collections::HashMap;

use glam::Vec3;
use thiserror::Error;

use super::clamp::{GroundClampStrategy, GroundClamper};
use super::state::{DeadReckoningState, EntityId, Transform, UpdateMode};

pub const DEFAULT_FORCE_CLAMP_INTERVAL_SECS: f32 = 3.0;
pub const DEFAULT_ARTICULATION_SMOOTHING_SECS: f32 = 1.0;

/// Driver-wide tuning, injected at construction.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Real-time interval after which a non-moving entity is re-clamped
    /// anyway, bounding drift against streamed-in terrain.
    pub force_clamp_interval_secs: f32,
    /// Smoothing window applied to every articulation chain segment.
    pub articulation_smoothing_secs: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            force_clamp_interval_secs: DEFAULT_FORCE_CLAMP_INTERVAL_SECS,
            articulation_smoothing_secs: DEFAULT_ARTICULATION_SMOOTHING_SECS,
        }
    }
}

/// Clock inputs for one tick. Simulated time drives the reckoning math;
/// real time drives the force-clamp countdown so a paused or slowed
/// simulation still re-clamps on schedule.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub sim_delta_secs: f32,
    pub real_delta_secs: f32,
    pub sim_time_secs: f64,
}

/// Actor-layer collaborator: the driver reads actual transforms at
/// registration and writes dead-reckoned ones each tick.
pub trait EntityRegistry {
    fn transform(&self, entity: EntityId) -> Option<Transform>;
    fn apply_transform(&mut self, entity: EntityId, transform: &Transform);
}

/// Articulated-part collaborator, addressed by entity and DOF node name.
/// Absence of a node is a valid configuration, not an error.
pub trait DofResolver {
    fn current_hpr(&self, entity: EntityId, node: &str) -> Option<Vec3>;
    fn update_hpr(&mut self, entity: EntityId, node: &str, hpr: Vec3);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("entity {0:?} is already registered for dead reckoning")]
    AlreadyRegistered(EntityId),
}

/// Per-tick orchestrator over every registered entity: advances the
/// reckoning math, applies moved transforms, runs the force-clamp policy,
/// and steps articulation chains.
pub struct DeadReckoningDriver {
    config: DriverConfig,
    states: HashMap<EntityId, DeadReckoningState>,
}

impl DeadReckoningDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, entity: EntityId) -> Option<&DeadReckoningState> {
        self.states.get(&entity)
    }

    pub fn state_mut(&mut self, entity: EntityId) -> Option<&mut DeadReckoningState> {
        self.states.get_mut(&entity)
    }

    /// Registers an entity for dead reckoning. The ownership flag is
    /// captured here once and resolves `Auto` mode for the entity's
    /// lifetime. For tracked-only entities the actor's live pose seeds the
    /// reckoning baseline; for driven entities with a pending network
    /// update the actor is snapped to the last known pose immediately.
    pub fn register(
        &mut self,
        entity: EntityId,
        mut state: DeadReckoningState,
        is_remote: bool,
        registry: &mut dyn EntityRegistry,
    ) -> Result<(), DriverError> {
        if self.states.contains_key(&entity) {
            return Err(DriverError::AlreadyRegistered(entity));
        }

        state.resolve_mode(is_remote);
        state.set_time_until_force_clamp(self.config.force_clamp_interval_secs);

        if state.effective_mode() == UpdateMode::CalculateOnly {
            if let Some(transform) = registry.transform(entity) {
                state.snapshot_from_actor(&transform);
            }
        } else if state.is_updated() {
            state.snap_current_to_last_known();
            registry.apply_transform(entity, &state.current_transform());
        }

        log::debug!(
            "registered entity {entity:?} for dead reckoning, mode {:?}",
            state.effective_mode()
        );
        self.states.insert(entity, state);
        Ok(())
    }

    /// Removes an entity, returning its state if it was registered.
    pub fn unregister(&mut self, entity: EntityId) -> Option<DeadReckoningState> {
        self.states.remove(&entity)
    }

    /// Drops all registered state and releases the clamper's terrain and
    /// eye-point references. Called on map unload.
    pub fn clear(&mut self, clamper: Option<&mut dyn GroundClamper>) {
        self.states.clear();
        if let Some(clamper) = clamper {
            clamper.clear_references();
        }
    }

    /// Advances every registered entity by one tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        registry: &mut dyn EntityRegistry,
        mut clamper: Option<&mut dyn GroundClamper>,
        mut resolver: Option<&mut dyn DofResolver>,
    ) {
        if let Some(clamper) = clamper.as_deref_mut() {
            clamper.update_eye_point();
        }

        for (&entity, state) in &mut self.states {
            let outcome = state.do_dr(ctx.sim_delta_secs, ctx.sim_time_secs);

            // Rebuild the working transform from the dead-reckoned pose,
            // never the live actor pose, so clamp corrections do not feed
            // back into the extrapolation baseline.
            let mut working = state.current_transform();

            // Force-clamp countdown runs on real time and resets whenever
            // the entity actually moves.
            let mut force_clamp = false;
            if outcome.changed {
                state.set_time_until_force_clamp(self.config.force_clamp_interval_secs);
            } else {
                let remaining = state.time_until_force_clamp() - ctx.real_delta_secs;
                if remaining <= 0.0 {
                    force_clamp = true;
                    state.set_time_until_force_clamp(self.config.force_clamp_interval_secs);
                } else {
                    state.set_time_until_force_clamp(remaining);
                }
            }

            if state.effective_mode() == UpdateMode::CalculateAndMoveActor {
                let wants_clamp = outcome.strategy != GroundClampStrategy::None
                    && (outcome.changed
                        || outcome.strategy == GroundClampStrategy::IntermittentSaveOffset
                        || force_clamp);
                if wants_clamp {
                    if let Some(clamper) = clamper.as_deref_mut() {
                        clamper.clamp_to_ground(
                            outcome.strategy,
                            ctx.sim_time_secs,
                            &mut working,
                            entity,
                        );
                    }
                    registry.apply_transform(entity, &working);
                } else if outcome.changed {
                    registry.apply_transform(entity, &working);
                }
            }

            if let Some(resolver) = resolver.as_deref_mut() {
                state.advance_articulation(
                    entity,
                    ctx.sim_delta_secs,
                    self.config.articulation_smoothing_secs,
                    resolver,
                );
            }

            state.clear_updated();
        }

        if let Some(clamper) = clamper {
            clamper.finish_up();
        }
    }
}

impl Default for DeadReckoningDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}
