use super::state::{EntityId, Transform};

/// Per-entity ground clamping strategy, chosen by the entity's owner based
/// on its type and motion profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundClampStrategy {
    /// Never clamp (airborne or free-flying entities).
    #[default]
    None,
    /// Clamp whenever the dead-reckoned pose moves.
    Ranged,
    /// Clamp intermittently, carrying the last vertical offset between
    /// full clamps.
    IntermittentSaveOffset,
}

/// Terrain height/orientation correction collaborator. The driver invokes
/// it, never implements it; an absent clamper is a valid configuration and
/// the driver no-ops around it.
pub trait GroundClamper {
    /// Refreshes the cached eye point used for clamp LOD/priority decisions.
    fn update_eye_point(&mut self);

    /// Corrects the working transform against terrain. The clamper is the
    /// sole writer of the final height/orientation correction.
    fn clamp_to_ground(
        &mut self,
        strategy: GroundClampStrategy,
        sim_time: f64,
        transform: &mut Transform,
        entity: EntityId,
    );

    /// Batch-finalize hook, called once per tick after all entities.
    fn finish_up(&mut self);

    /// Drops terrain and eye-point actor references (map unload).
    fn clear_references(&mut self);
}
