pub mod coord;
pub mod reckoning;

pub use coord::{
    ConversionError, CoordinateConverter, Ellipsoid, GeoConfig, Hemisphere,
    IncomingCoordinateType, LocalCoordinateType, ProjectionError, TransverseMercator,
    TransverseMercatorParams, UtmCoord,
};
pub use reckoning::{
    DeadReckoningAlgorithm, DeadReckoningDriver, DeadReckoningState, DofChain, DofResolver,
    DofStop, DrOutcome, DriverConfig, DriverError, EntityId, EntityRegistry, GroundClampStrategy,
    GroundClamper, TickContext, Transform, UpdateMode,
};
