use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DATASET_MATCH_TAG: &str = "Hugging Face Dataset (osunlp/TravelPlanner)";
pub const FALLBACK_MATCH_TAG: &str = "Fallback/Mock";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub accessibility_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Location {
    pub fn has_feature(&self, tag: &str) -> bool {
        self.accessibility_features.iter().any(|feature| feature == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLocation {
    #[serde(flatten)]
    pub location: Location,
    pub matches_needs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u8,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityBreakdown {
    pub mobility: DimensionScore,
    pub vision: DimensionScore,
    pub hearing: DimensionScore,
    pub cognitive: DimensionScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub time: String,
    pub activity: String,
    pub location: String,
    pub accessibility_score: u8,
    pub notes: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub day: u32,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItinerary {
    pub destination: String,
    pub duration: u32,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_tag: Option<String>,
    pub itinerary: Vec<Day>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    pub destination: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub accessibility_needs: Vec<String>,
    #[serde(default)]
    pub mobility_details: String,
    #[serde(default)]
    pub vision_details: String,
    #[serde(default)]
    pub hearing_details: String,
    #[serde(default)]
    pub cognitive_details: String,
}

impl ItineraryRequest {
    pub fn new(destination: impl Into<String>, duration: u32) -> Self {
        Self {
            destination: destination.into(),
            duration,
            accessibility_needs: Vec::new(),
            mobility_details: String::new(),
            vision_details: String::new(),
            hearing_details: String::new(),
            cognitive_details: String::new(),
        }
    }
}

fn default_duration() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Dataset,
    Model,
    Fallback,
}

/// Result of one orchestration call. Serializes as the bare itinerary object
/// whichever stage produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Itinerary {
    Dataset(NormalizedItinerary),
    Generated(Value),
    Fallback(NormalizedItinerary),
}

impl Itinerary {
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::Dataset(_) => Provenance::Dataset,
            Self::Generated(_) => Provenance::Model,
            Self::Fallback(_) => Provenance::Fallback,
        }
    }

    pub fn match_tag(&self) -> Option<&str> {
        match self {
            Self::Dataset(itinerary) | Self::Fallback(itinerary) => itinerary.match_tag.as_deref(),
            Self::Generated(value) => value.get("match").and_then(Value::as_str),
        }
    }

    pub fn day_count(&self) -> usize {
        match self {
            Self::Dataset(itinerary) | Self::Fallback(itinerary) => itinerary.itinerary.len(),
            Self::Generated(value) => value
                .get("itinerary")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        }
    }
}

/// One entry of the cleaned TravelPlanner corpus, already converted to its
/// typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    pub destination: String,
    pub plan: Option<RawPlan>,
    pub row_index: i64,
}

impl DatasetRecord {
    pub fn from_parts(destination: impl Into<String>, parsed_plan: &Value, row_index: i64) -> Self {
        let plan = if parsed_plan.is_null() {
            None
        } else {
            Some(RawPlan::from_value(parsed_plan))
        };

        Self {
            destination: destination.into(),
            plan,
            row_index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPlan {
    pub days: Vec<DayPlan>,
}

impl RawPlan {
    /// The corpus stores plans as `[metadata, [day, day, ...]]`; a bare list
    /// of days is accepted too. Anything else carries no days.
    pub fn from_value(value: &Value) -> Self {
        let day_values = match value.as_array() {
            Some(items) if items.len() > 1 && items[1].is_array() => {
                items[1].as_array().map(Vec::as_slice).unwrap_or_default()
            }
            Some(items) => items.as_slice(),
            None => &[],
        };

        Self {
            days: day_values.iter().filter_map(DayPlan::from_value).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPlan {
    pub days: Option<Value>,
    pub current_city: Option<String>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub attraction: Option<String>,
    pub accommodation: Option<String>,
}

impl DayPlan {
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            days: object.get("days").filter(|v| is_truthy(v)).cloned(),
            current_city: text("current_city").filter(|city| !city.is_empty()),
            breakfast: text("breakfast"),
            lunch: text("lunch"),
            dinner: text("dinner"),
            attraction: text("attraction"),
            accommodation: text("accommodation"),
        })
    }

    pub fn is_admissible(&self) -> bool {
        self.days.is_some() && self.current_city.is_some()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_plan_prefers_second_element_list() {
        let plan = RawPlan::from_value(&json!([
            { "org": "Sarasota", "dest": "Chicago" },
            [
                { "days": 1, "current_city": "from Sarasota to Chicago" },
                { "days": 2, "current_city": "Chicago" }
            ]
        ]));

        assert_eq!(plan.days.len(), 2);
        assert!(plan.days.iter().all(DayPlan::is_admissible));
    }

    #[test]
    fn raw_plan_accepts_flat_list_and_rejects_scalars() {
        let flat = RawPlan::from_value(&json!([{ "days": 1, "current_city": "Rockford" }]));
        assert_eq!(flat.days.len(), 1);

        let scalar = RawPlan::from_value(&json!("not a plan"));
        assert!(scalar.days.is_empty());
    }

    #[test]
    fn falsy_markers_make_a_day_inadmissible() {
        let zero_day = DayPlan::from_value(&json!({ "days": 0, "current_city": "Rockford" }))
            .expect("object converts");
        let blank_city = DayPlan::from_value(&json!({ "days": 2, "current_city": "" }))
            .expect("object converts");

        assert!(!zero_day.is_admissible());
        assert!(!blank_city.is_admissible());
    }

    #[test]
    fn null_plan_is_absent() {
        let record = DatasetRecord::from_parts("Rockford", &Value::Null, 3);
        assert!(record.plan.is_none());
    }

    #[test]
    fn fallback_serializes_match_key() {
        let itinerary = Itinerary::Fallback(NormalizedItinerary {
            destination: "Paris".to_string(),
            duration: 1,
            match_tag: Some(FALLBACK_MATCH_TAG.to_string()),
            itinerary: Vec::new(),
        });

        let value = serde_json::to_value(&itinerary).expect("serializes");
        assert_eq!(value["match"], json!("Fallback/Mock"));
        assert_eq!(itinerary.provenance(), Provenance::Fallback);
    }
}
