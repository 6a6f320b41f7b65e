use guide_core::ItineraryRequest;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?").expect("code fence pattern compiles"));

pub fn itinerary_prompt(request: &ItineraryRequest) -> String {
    let ItineraryRequest {
        destination,
        duration,
        accessibility_needs,
        mobility_details,
        vision_details,
        hearing_details,
        cognitive_details,
    } = request;

    format!(
        r#"You are Knight Guide, an AI travel assistant specializing in accessibility.
Create a {duration}-day travel itinerary for {destination} specifically tailored for a traveler with the following needs: {needs}.

Mobility: {mobility_details}
Vision: {vision_details}
Hearing: {hearing_details}
Cognitive: {cognitive_details}

For each activity, provide an accessibility score (0-100) and specific accessibility features.
Focus on venues known for being inclusive.

IMPORTANT: Return the response in ONLY valid JSON format with the following structure. Do not use Markdown formatting (no ```json blocks).

{{
    "destination": "{destination}",
    "duration": {duration},
    "itinerary": [
        {{
            "day": 1,
            "activities": [
                {{
                    "time": "HH:MM",
                    "activity": "Activity Name",
                    "location": "Location Name",
                    "accessibilityScore": 90,
                    "notes": "Specific accessibility details...",
                    "features": ["Ramp Access", "Braille", etc]
                }}
            ]
        }}
    ]
}}"#,
        needs = accessibility_needs.join(", "),
    )
}

pub fn sign_explanation_prompt(text: &str) -> String {
    format!(
        r#"You are an ASL interpreter helper.
Describe how to sign the following text in ASL (American Sign Language).
Provide a clear, step-by-step description of the handshapes and movements.
Keep it concise (max 150 words).

Text: "{text}""#
    )
}

/// Removes markdown code fences a model may wrap around a JSON answer.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}
