pub mod config;
pub mod error;
pub mod geo;
pub mod types;

pub use config::Config;
pub use error::NagarnetraError;
pub use geo::{
    distance_meters, haversine_meters, within_duplicate_radius, DUPLICATE_RADIUS_METERS,
};
pub use types::{
    BoundingBox, Detection, InsightBundle, Issue, IssueStatus, SeverityLevel,
};
