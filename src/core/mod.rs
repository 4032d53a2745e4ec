pub mod error;
pub mod geo;
pub mod route;
pub mod waypoint;

pub use error::LoadError;
pub use geo::{distance_meters, lerp, lerp_instant, Coordinate};
pub use route::{Route, Segment, SegmentTiming};
pub use waypoint::{parse_timestamp, Waypoint};
