use rand::Rng;

use crate::models::{
    Activity, DatasetRecord, Day, DayPlan, NormalizedItinerary, DATASET_MATCH_TAG,
};

const BREAKFAST_TIME: &str = "09:00";
const LUNCH_TIME: &str = "13:00";
const DINNER_TIME: &str = "19:00";
const ACCOMMODATION_TIME: &str = "21:00";
const FIRST_ATTRACTION_MINUTES: u32 = 10 * 60 + 30;
const ATTRACTION_SLOT_MINUTES: u32 = 30;
const DATASET_FEATURES: [&str; 2] = ["Accessible Access", "Verified Location"];

/// Converts a matched dataset record into the application itinerary shape.
///
/// At most `requested_duration` admissible days are used and the result is
/// never padded, so `duration` reflects the days actually produced. Scores
/// are drawn from `rng` in `80..100`. Returns `None` when no day yields an
/// activity.
pub fn normalize<R: Rng + ?Sized>(
    record: &DatasetRecord,
    destination: &str,
    requested_duration: u32,
    rng: &mut R,
) -> Option<NormalizedItinerary> {
    let plan = record.plan.as_ref()?;

    let days = plan
        .days
        .iter()
        .filter(|day| day.is_admissible())
        .take(requested_duration as usize)
        .map(|day| day_activities(day, destination, rng))
        .filter(|activities| !activities.is_empty())
        .enumerate()
        .map(|(index, activities)| Day {
            day: index as u32 + 1,
            activities,
        })
        .collect::<Vec<_>>();

    if days.is_empty() {
        return None;
    }

    Some(NormalizedItinerary {
        destination: destination.to_string(),
        duration: days.len() as u32,
        match_tag: Some(DATASET_MATCH_TAG.to_string()),
        itinerary: days,
    })
}

fn day_activities<R: Rng + ?Sized>(day: &DayPlan, destination: &str, rng: &mut R) -> Vec<Activity> {
    let mut builder = DayBuilder {
        location: day
            .current_city
            .clone()
            .unwrap_or_else(|| format!("{destination} Area")),
        activities: Vec::new(),
        rng,
    };

    builder.add(BREAKFAST_TIME.to_string(), day.breakfast.as_deref(), "Breakfast");

    if let Some(attractions) = day.attraction.as_deref().filter(|text| is_present(text)) {
        let entries = attractions
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty());
        for (slot, entry) in entries.enumerate() {
            builder.add(attraction_time(slot as u32), Some(entry), "Attraction");
        }
    }

    builder.add(LUNCH_TIME.to_string(), day.lunch.as_deref(), "Lunch");
    builder.add(DINNER_TIME.to_string(), day.dinner.as_deref(), "Dinner");
    builder.add(
        ACCOMMODATION_TIME.to_string(),
        day.accommodation.as_deref(),
        "Accommodation",
    );

    let mut activities = builder.activities;
    activities.sort_by(|a, b| a.time.cmp(&b.time));
    activities
}

struct DayBuilder<'a, R: ?Sized> {
    location: String,
    activities: Vec<Activity>,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> DayBuilder<'_, R> {
    fn add(&mut self, time: String, source: Option<&str>, kind: &str) {
        let Some(text) = source.filter(|text| is_present(text)) else {
            return;
        };

        let title = text.split(',').next().unwrap_or(text);
        self.activities.push(Activity {
            time,
            activity: title.to_string(),
            location: self.location.clone(),
            accessibility_score: self.rng.random_range(80..100),
            notes: format!("Suggested {kind} from TravelPlanner dataset."),
            features: DATASET_FEATURES.iter().map(|f| f.to_string()).collect(),
        });
    }
}

fn is_present(text: &str) -> bool {
    !text.is_empty() && text != "-" && text != "None"
}

fn attraction_time(slot: u32) -> String {
    let minutes = FIRST_ATTRACTION_MINUTES + slot * ATTRACTION_SLOT_MINUTES;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
