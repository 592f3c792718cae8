mod articulation;
mod clamp;
mod driver;
mod state;

pub use articulation::{shortest_delta, wrap_two_pi, DofChain, DofStop};
pub use clamp::{GroundClampStrategy, GroundClamper};
pub use driver::{
    DeadReckoningDriver, DofResolver, DriverConfig, DriverError, EntityRegistry, TickContext,
    DEFAULT_ARTICULATION_SMOOTHING_SECS, DEFAULT_FORCE_CLAMP_INTERVAL_SECS,
};
pub use state::{
    DeadReckoningAlgorithm, DeadReckoningState, DrOutcome, EntityId, Transform, UpdateMode,
};
