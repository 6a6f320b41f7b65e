use serde_json::Value;

use crate::error::ItineraryShapeError;
use crate::models::{Activity, Day, ItineraryRequest, NormalizedItinerary, FALLBACK_MATCH_TAG};

/// Static single-activity itinerary served when neither the dataset nor the
/// generative model produced one.
pub fn mock_itinerary(request: &ItineraryRequest) -> NormalizedItinerary {
    NormalizedItinerary {
        destination: request.destination.clone(),
        duration: request.duration,
        match_tag: Some(FALLBACK_MATCH_TAG.to_string()),
        itinerary: vec![Day {
            day: 1,
            activities: vec![Activity {
                time: "10:00".to_string(),
                activity: "Mock Visit (Gemini Unavailable)".to_string(),
                location: "Central Park".to_string(),
                accessibility_score: 90,
                notes: "Using mock data because Gemini key is missing or invalid.".to_string(),
                features: vec!["Wheelchair Access".to_string()],
            }],
        }],
    }
}

/// Shallow structural check for generated itineraries: an object carrying an
/// `itinerary` array. Day and activity contents are deliberately not inspected.
pub fn validate_itinerary(document: &Value) -> Result<(), ItineraryShapeError> {
    let object = document.as_object().ok_or(ItineraryShapeError::NotAnObject)?;
    let itinerary = object
        .get("itinerary")
        .filter(|value| !value.is_null())
        .ok_or(ItineraryShapeError::MissingItinerary)?;

    if itinerary.is_array() {
        Ok(())
    } else {
        Err(ItineraryShapeError::ItineraryNotArray)
    }
}
