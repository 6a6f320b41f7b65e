pub mod error;
pub mod models;
pub mod normalize;
pub mod planner;
pub mod scoring;

pub use error::ItineraryShapeError;
pub use models::*;
pub use normalize::normalize;
pub use planner::{mock_itinerary, validate_itinerary};
