mod converter;
mod ellipsoid;
mod geocentric;
mod rotation;
mod tranmerc;

pub use converter::{
    ConversionError, CoordinateConverter, GeoConfig, Hemisphere, IncomingCoordinateType,
    LocalCoordinateType, UtmCoord, MAX_EASTING, MAX_NORTHING, MIN_EASTING, MIN_NORTHING,
    UTM_SCALE_FACTOR,
};
pub use ellipsoid::{Ellipsoid, ProjectionError, TransverseMercatorParams};
pub use geocentric::{geocentric_to_geodetic, geodetic_to_geocentric, safe_asin};
pub use rotation::{eulers_to_matrix, hpr_to_matrix, matrix_to_eulers, matrix_to_hpr, zflop};
pub use tranmerc::TransverseMercator;
