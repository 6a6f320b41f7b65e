use thiserror::Error;

/// Reasons a generated document is rejected by the structural check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItineraryShapeError {
    #[error("itinerary document is not a JSON object")]
    NotAnObject,
    #[error("itinerary document has no `itinerary` field")]
    MissingItinerary,
    #[error("`itinerary` field is not an array")]
    ItineraryNotArray,
}
