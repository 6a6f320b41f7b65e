use crate::models::{AccessibilityBreakdown, DimensionScore, Location, RankedLocation};

const BASE_SCORE: i32 = 50;

/// Feature tags that satisfy each need understood by `filter_by_needs`.
fn tags_for_need(need: &str) -> &'static [&'static str] {
    match need {
        "wheelchair" | "walker" | "limited-walking" => &["wheelchair", "accessible-paths"],
        "blind" | "color-blind" => &["vision", "audio-guide"],
        "deaf" | "hearing-aid" => &["hearing"],
        "cognitive" | "anxiety" => &["cognitive"],
        _ => &[],
    }
}

/// Derives a 0-100 accessibility score from a location's feature tags and
/// category. Deterministic for identical inputs.
pub fn score(location: &Location) -> u8 {
    let has = |tag: &str| location.has_feature(tag);
    let mut total = BASE_SCORE;

    if has("wheelchair") {
        total += 15;
    } else if has("accessible-paths") {
        total += 8;
    }

    if has("vision") {
        total += 10;
    }
    if has("audio-guide") {
        total += 5;
    }
    if has("braille-menu") || has("braille") {
        total += 5;
    }

    if has("hearing") {
        total += 10;
    }
    if has("hearing-loop") {
        total += 5;
    }

    if has("cognitive") {
        total += 8;
    }
    if has("elevators") {
        total += 5;
    }

    if location.category == "Museum" {
        total += 5;
    }
    if location.category == "Park" && has("accessible-paths") {
        total += 3;
    }

    total.clamp(0, 100) as u8
}

pub fn breakdown(location: &Location) -> AccessibilityBreakdown {
    let has = |tag: &str| location.has_feature(tag);
    let dimension = |score: u8, details: &str| DimensionScore {
        score,
        details: details.to_string(),
    };

    AccessibilityBreakdown {
        mobility: if has("wheelchair") {
            dimension(100, "Full wheelchair accessibility")
        } else if has("accessible-paths") {
            dimension(60, "Partially accessible paths")
        } else {
            dimension(20, "Limited mobility access")
        },
        vision: if has("vision") {
            dimension(100, "Vision accommodations available")
        } else if has("audio-guide") {
            dimension(70, "Audio guides available")
        } else {
            dimension(30, "Limited vision accommodations")
        },
        hearing: if has("hearing") {
            dimension(100, "Hearing accommodations available")
        } else {
            dimension(40, "Limited hearing accommodations")
        },
        cognitive: if has("cognitive") {
            dimension(100, "Cognitive accommodations available")
        } else {
            dimension(50, "Standard environment")
        },
    }
}

/// Keeps locations that satisfy at least one requested need.
pub fn filter_by_needs(locations: &[Location], needs: &[String]) -> Vec<Location> {
    if needs.is_empty() {
        return locations.to_vec();
    }

    locations
        .iter()
        .filter(|location| {
            needs.iter().any(|need| {
                tags_for_need(need)
                    .iter()
                    .any(|tag| location.has_feature(tag))
            })
        })
        .cloned()
        .collect()
}

/// Scores every location and orders those matching all needs first, then by
/// score. A location matches only when every need string is one of its
/// feature tags, which is stricter than `filter_by_needs`.
pub fn rank(locations: &[Location], needs: &[String]) -> Vec<RankedLocation> {
    let mut ranked = locations
        .iter()
        .map(|location| {
            let mut location = location.clone();
            location.accessibility_score = Some(score(&location));
            let matches_needs = needs.is_empty() || needs.iter().all(|need| location.has_feature(need));
            RankedLocation {
                location,
                matches_needs,
            }
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| {
        b.matches_needs
            .cmp(&a.matches_needs)
            .then_with(|| b.location.accessibility_score.cmp(&a.location.accessibility_score))
    });

    ranked
}
