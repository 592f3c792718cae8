use glam::{Quat, Vec3};

use super::articulation::DofChain;
use super::clamp::GroundClampStrategy;
use super::driver::DofResolver;

pub const DEFAULT_TRANSLATION_SMOOTHING_SECS: f32 = 1.0;
pub const DEFAULT_ROTATION_SMOOTHING_SECS: f32 = 1.0;

// Thresholds below which a tick's pose delta does not count as a material
// transform change.
const TRANSLATION_CHANGE_EPSILON: f32 = 1e-4;
const ROTATION_CHANGE_EPSILON: f32 = 1e-6;

/// Networked entity identifier, assigned by the surrounding actor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Local-frame pose, the unit the driver exchanges with the actor registry
/// and the ground clamper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Resolve against entity ownership at registration time.
    #[default]
    Auto,
    /// Track the pose but never move the actor (locally owned entities).
    CalculateOnly,
    /// Compute and drive the actor's transform (remote entities).
    CalculateAndMoveActor,
}

impl UpdateMode {
    /// Resolves `Auto` against the ownership capability flag captured at
    /// registration. Remote entities are driven; locally owned entities are
    /// only tracked.
    pub fn resolve(self, is_remote: bool) -> UpdateMode {
        match self {
            UpdateMode::Auto => {
                if is_remote {
                    UpdateMode::CalculateAndMoveActor
                } else {
                    UpdateMode::CalculateOnly
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadReckoningAlgorithm {
    /// Snap to the last known pose, no prediction.
    #[default]
    Static,
    /// Extrapolate with last known linear/angular velocity.
    Velocity,
    /// Extrapolate with velocity and acceleration.
    VelocityAcceleration,
}

/// Result of one dead-reckoning step for one entity.
#[derive(Debug, Clone, Copy)]
pub struct DrOutcome {
    /// The current pose moved materially this tick.
    pub changed: bool,
    /// Ground clamping strategy to use for this entity this tick.
    pub strategy: GroundClampStrategy,
}

/// Per-entity dead reckoning record: last-known network state, the pose
/// currently being shown, smoothing timers, and the articulation chains.
#[derive(Debug, Clone)]
pub struct DeadReckoningState {
    algorithm: DeadReckoningAlgorithm,
    requested_mode: UpdateMode,
    effective_mode: UpdateMode,
    is_remote: bool,

    last_known_translation: Vec3,
    last_known_rotation: Quat,
    last_known_velocity: Vec3,
    last_known_acceleration: Vec3,
    last_known_angular_velocity: Vec3,

    translation_before_update: Vec3,
    rotation_before_update: Quat,

    current_translation: Vec3,
    current_rotation: Quat,

    translation_elapsed: f32,
    rotation_elapsed: f32,
    translation_smoothing: f32,
    rotation_smoothing: f32,
    translation_updated_at: f64,
    rotation_updated_at: f64,

    translation_updated: bool,
    rotation_updated: bool,

    time_until_force_clamp: f32,
    ground_clamp: GroundClampStrategy,

    chains: Vec<DofChain>,
}

impl DeadReckoningState {
    pub fn new(algorithm: DeadReckoningAlgorithm, mode: UpdateMode) -> Self {
        Self {
            algorithm,
            requested_mode: mode,
            effective_mode: mode,
            is_remote: false,
            last_known_translation: Vec3::ZERO,
            last_known_rotation: Quat::IDENTITY,
            last_known_velocity: Vec3::ZERO,
            last_known_acceleration: Vec3::ZERO,
            last_known_angular_velocity: Vec3::ZERO,
            translation_before_update: Vec3::ZERO,
            rotation_before_update: Quat::IDENTITY,
            current_translation: Vec3::ZERO,
            current_rotation: Quat::IDENTITY,
            translation_elapsed: 0.0,
            rotation_elapsed: 0.0,
            translation_smoothing: DEFAULT_TRANSLATION_SMOOTHING_SECS,
            rotation_smoothing: DEFAULT_ROTATION_SMOOTHING_SECS,
            translation_updated_at: 0.0,
            rotation_updated_at: 0.0,
            translation_updated: false,
            rotation_updated: false,
            time_until_force_clamp: 0.0,
            ground_clamp: GroundClampStrategy::default(),
            chains: Vec::new(),
        }
    }

    pub fn algorithm(&self) -> DeadReckoningAlgorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: DeadReckoningAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.requested_mode
    }

    /// The resolved mode; never `Auto` once the state is registered.
    pub fn effective_mode(&self) -> UpdateMode {
        self.effective_mode
    }

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        self.requested_mode = mode;
        self.effective_mode = mode.resolve(self.is_remote);
    }

    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Captures the ownership flag and resolves `Auto` once. Called by the
    /// driver at registration; modes are never re-derived per tick.
    pub(crate) fn resolve_mode(&mut self, is_remote: bool) {
        self.is_remote = is_remote;
        self.effective_mode = self.requested_mode.resolve(is_remote);
    }

    pub fn set_last_known_translation(&mut self, translation: Vec3) {
        self.translation_before_update = self.current_translation;
        self.last_known_translation = translation;
        self.translation_updated = true;
    }

    pub fn set_last_known_rotation(&mut self, rotation: Quat) {
        self.rotation_before_update = self.current_rotation;
        self.last_known_rotation = rotation;
        self.rotation_updated = true;
    }

    pub fn set_last_known_velocity(&mut self, velocity: Vec3) {
        self.last_known_velocity = velocity;
    }

    pub fn set_last_known_acceleration(&mut self, acceleration: Vec3) {
        self.last_known_acceleration = acceleration;
    }

    pub fn set_last_known_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.last_known_angular_velocity = angular_velocity;
    }

    pub fn last_known_translation(&self) -> Vec3 {
        self.last_known_translation
    }

    pub fn last_known_rotation(&self) -> Quat {
        self.last_known_rotation
    }

    pub fn translation_before_update(&self) -> Vec3 {
        self.translation_before_update
    }

    pub fn rotation_before_update(&self) -> Quat {
        self.rotation_before_update
    }

    pub fn current_translation(&self) -> Vec3 {
        self.current_translation
    }

    pub fn current_rotation(&self) -> Quat {
        self.current_rotation
    }

    pub fn current_transform(&self) -> Transform {
        Transform::new(self.current_translation, self.current_rotation)
    }

    pub fn translation_smoothing(&self) -> f32 {
        self.translation_smoothing
    }

    pub fn set_max_translation_smoothing_time(&mut self, secs: f32) {
        self.translation_smoothing = secs.max(0.0);
    }

    pub fn rotation_smoothing(&self) -> f32 {
        self.rotation_smoothing
    }

    pub fn set_max_rotation_smoothing_time(&mut self, secs: f32) {
        self.rotation_smoothing = secs.max(0.0);
    }

    pub fn translation_updated_at(&self) -> f64 {
        self.translation_updated_at
    }

    pub fn rotation_updated_at(&self) -> f64 {
        self.rotation_updated_at
    }

    /// A network update arrived since the previous tick.
    pub fn is_updated(&self) -> bool {
        self.translation_updated || self.rotation_updated
    }

    pub(crate) fn clear_updated(&mut self) {
        self.translation_updated = false;
        self.rotation_updated = false;
    }

    pub fn ground_clamp_strategy(&self) -> GroundClampStrategy {
        self.ground_clamp
    }

    pub fn set_ground_clamp_strategy(&mut self, strategy: GroundClampStrategy) {
        self.ground_clamp = strategy;
    }

    pub(crate) fn time_until_force_clamp(&self) -> f32 {
        self.time_until_force_clamp
    }

    pub(crate) fn set_time_until_force_clamp(&mut self, secs: f32) {
        self.time_until_force_clamp = secs;
    }

    /// Seeds every pose field from the actor's current transform so dead
    /// reckoning starts from a consistent baseline with no extrapolation
    /// jump. Used when registering locally owned entities.
    pub(crate) fn snapshot_from_actor(&mut self, transform: &Transform) {
        self.last_known_translation = transform.translation;
        self.last_known_rotation = transform.rotation;
        self.translation_before_update = transform.translation;
        self.rotation_before_update = transform.rotation;
        self.current_translation = transform.translation;
        self.current_rotation = transform.rotation;
    }

    /// Snaps the current pose to the last known network values. Used when a
    /// pending update exists at registration so the first tick does not
    /// smooth from a stale pose.
    pub(crate) fn snap_current_to_last_known(&mut self) {
        self.current_translation = self.last_known_translation;
        self.current_rotation = self.last_known_rotation;
        self.translation_before_update = self.last_known_translation;
        self.rotation_before_update = self.last_known_rotation;
    }

    /// Advances the extrapolation/smoothing math by one simulated tick and
    /// reports whether the pose moved materially plus the clamping strategy
    /// to use.
    pub fn do_dr(&mut self, sim_delta: f32, sim_time: f64) -> DrOutcome {
        // A fresh update restarts smoothing; the update time is back-dated
        // by one simulated delta so the first smoothing step below has a
        // well-defined nonzero time base.
        if self.translation_updated {
            self.translation_elapsed = 0.0;
            self.translation_updated_at = sim_time - f64::from(sim_delta);
        }
        if self.rotation_updated {
            self.rotation_elapsed = 0.0;
            self.rotation_updated_at = sim_time - f64::from(sim_delta);
        }

        // Accumulators only grow; an externally adjusted simulation clock
        // moving backward is floored at zero.
        self.translation_elapsed = (self.translation_elapsed + sim_delta).max(0.0);
        self.rotation_elapsed = (self.rotation_elapsed + sim_delta).max(0.0);

        let previous_translation = self.current_translation;
        let previous_rotation = self.current_rotation;

        match self.algorithm {
            DeadReckoningAlgorithm::Static => {
                self.current_translation = self.last_known_translation;
                self.current_rotation = self.last_known_rotation;
            }
            DeadReckoningAlgorithm::Velocity | DeadReckoningAlgorithm::VelocityAcceleration => {
                self.step_translation();
                self.step_rotation();
            }
        }

        let changed = (self.current_translation - previous_translation).length_squared()
            > TRANSLATION_CHANGE_EPSILON * TRANSLATION_CHANGE_EPSILON
            || 1.0 - self.current_rotation.dot(previous_rotation).abs() > ROTATION_CHANGE_EPSILON;

        DrOutcome {
            changed,
            strategy: self.ground_clamp,
        }
    }

    fn step_translation(&mut self) {
        let t = self.translation_elapsed;
        let mut predicted = self.last_known_translation + self.last_known_velocity * t;
        if self.algorithm == DeadReckoningAlgorithm::VelocityAcceleration {
            predicted += self.last_known_acceleration * (0.5 * t * t);
        }
        self.current_translation = if t < self.translation_smoothing {
            let ratio = t / self.translation_smoothing;
            self.translation_before_update.lerp(predicted, ratio)
        } else {
            predicted
        };
    }

    fn step_rotation(&mut self) {
        let t = self.rotation_elapsed;
        let predicted = if self.last_known_angular_velocity == Vec3::ZERO {
            self.last_known_rotation
        } else {
            self.last_known_rotation * Quat::from_scaled_axis(self.last_known_angular_velocity * t)
        };
        self.current_rotation = if t < self.rotation_smoothing {
            let ratio = t / self.rotation_smoothing;
            slerp_shortest(self.rotation_before_update, predicted, ratio)
        } else {
            predicted
        };
    }

    /// Adds a network-supplied articulation target for a named DOF node.
    /// At most one chain exists per node name.
    pub fn add_articulation_target(&mut self, node: &str, hpr: Vec3, rate: Vec3) {
        if let Some(chain) = self.chains.iter_mut().find(|c| c.node() == node) {
            chain.push_target(hpr, rate);
        } else {
            let mut chain = DofChain::new(node);
            chain.push_target(hpr, rate);
            self.chains.push(chain);
        }
    }

    pub fn dof_chain(&self, node: &str) -> Option<&DofChain> {
        self.chains.iter().find(|c| c.node() == node)
    }

    pub fn dof_chains(&self) -> &[DofChain] {
        &self.chains
    }

    /// Advances every articulation chain and applies the resulting
    /// orientations through the resolver.
    pub(crate) fn advance_articulation(
        &mut self,
        entity: EntityId,
        sim_delta: f32,
        window: f32,
        resolver: &mut dyn DofResolver,
    ) {
        for chain in &mut self.chains {
            let actual = resolver.current_hpr(entity, chain.node());
            if let Some(hpr) = chain.advance(sim_delta, window, actual) {
                resolver.update_hpr(entity, chain.node(), hpr);
            }
        }
    }
}

fn slerp_shortest(from: Quat, to: Quat, t: f32) -> Quat {
    if from.dot(to) < 0.0 {
        from.slerp(-to, t)
    } else {
        from.slerp(to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_by_ownership() {
        assert_eq!(
            UpdateMode::Auto.resolve(true),
            UpdateMode::CalculateAndMoveActor
        );
        assert_eq!(UpdateMode::Auto.resolve(false), UpdateMode::CalculateOnly);
        // Explicit modes pass through untouched.
        assert_eq!(
            UpdateMode::CalculateOnly.resolve(true),
            UpdateMode::CalculateOnly
        );
        assert_eq!(
            UpdateMode::CalculateAndMoveActor.resolve(false),
            UpdateMode::CalculateAndMoveActor
        );
    }

    #[test]
    fn smoothing_reaches_target_exactly() {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_max_translation_smoothing_time(1.0);
        state.set_last_known_translation(Vec3::new(10.0, 0.0, 0.0));

        state.do_dr(0.5, 0.5);
        assert!((state.current_translation().x - 5.0).abs() < 1e-4);

        state.clear_updated();
        state.do_dr(0.5, 1.0);
        assert!((state.current_translation().x - 10.0).abs() < 1e-4);

        let outcome = state.do_dr(0.5, 1.5);
        assert!((state.current_translation().x - 10.0).abs() < 1e-4);
        assert!(!outcome.changed);
    }

    #[test]
    fn smoothing_is_monotonic() {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_max_translation_smoothing_time(1.0);
        state.set_last_known_translation(Vec3::new(10.0, 0.0, 0.0));

        let mut previous = 0.0_f32;
        let mut sim_time = 0.0_f64;
        for _ in 0..20 {
            sim_time += 0.1;
            state.do_dr(0.1, sim_time);
            state.clear_updated();
            let x = state.current_translation().x;
            assert!(x >= previous - 1e-5, "x went backward: {previous} -> {x}");
            assert!(x <= 10.0 + 1e-4, "overshoot: {x}");
            previous = x;
        }
        assert!((previous - 10.0).abs() < 1e-4);
    }

    #[test]
    fn velocity_extrapolation_continues_past_window() {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_max_translation_smoothing_time(0.5);
        state.set_last_known_translation(Vec3::ZERO);
        state.set_last_known_velocity(Vec3::new(2.0, 0.0, 0.0));

        state.do_dr(1.0, 1.0);
        // One second at 2 m/s, smoothing long since finished.
        assert!((state.current_translation().x - 2.0).abs() < 1e-4);

        state.clear_updated();
        state.do_dr(1.0, 2.0);
        assert!((state.current_translation().x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn acceleration_term_applies() {
        let mut state = DeadReckoningState::new(
            DeadReckoningAlgorithm::VelocityAcceleration,
            UpdateMode::Auto,
        );
        state.set_max_translation_smoothing_time(0.0);
        state.set_last_known_translation(Vec3::ZERO);
        state.set_last_known_velocity(Vec3::new(1.0, 0.0, 0.0));
        state.set_last_known_acceleration(Vec3::new(2.0, 0.0, 0.0));

        state.do_dr(2.0, 2.0);
        // x = v*t + a*t^2/2 = 2 + 4.
        assert!((state.current_translation().x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn negative_delta_does_not_rewind() {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_last_known_translation(Vec3::new(1.0, 0.0, 0.0));
        state.do_dr(0.5, 0.5);
        state.clear_updated();
        state.do_dr(-2.0, -1.5);
        // The accumulator floors at zero rather than going negative.
        let x = state.current_translation().x;
        assert!(x >= 0.0 && x <= 1.0 + 1e-5);
    }

    #[test]
    fn static_algorithm_snaps() {
        let mut state = DeadReckoningState::new(DeadReckoningAlgorithm::Static, UpdateMode::Auto);
        state.set_last_known_translation(Vec3::new(3.0, 4.0, 5.0));
        let outcome = state.do_dr(0.1, 0.1);
        assert!(outcome.changed);
        assert_eq!(state.current_translation(), Vec3::new(3.0, 4.0, 5.0));

        state.clear_updated();
        let outcome = state.do_dr(0.1, 0.2);
        assert!(!outcome.changed);
    }

    #[test]
    fn rotation_smooths_toward_last_known() {
        let mut state =
            DeadReckoningState::new(DeadReckoningAlgorithm::Velocity, UpdateMode::Auto);
        state.set_max_rotation_smoothing_time(1.0);
        let target = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        state.set_last_known_rotation(target);

        state.do_dr(0.5, 0.5);
        let halfway = state.current_rotation();
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(halfway.dot(expected).abs() > 0.9999);

        state.clear_updated();
        state.do_dr(0.5, 1.0);
        assert!(state.current_rotation().dot(target).abs() > 0.9999);
    }

    #[test]
    fn one_chain_per_node_name() {
        let mut state = DeadReckoningState::new(DeadReckoningAlgorithm::Static, UpdateMode::Auto);
        state.add_articulation_target("turret", Vec3::ZERO, Vec3::ZERO);
        state.add_articulation_target("turret", Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        state.add_articulation_target("barrel", Vec3::ZERO, Vec3::ZERO);
        assert_eq!(state.dof_chains().len(), 2);
        assert_eq!(state.dof_chain("turret").map(|c| c.len()), Some(2));
    }
}
