use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::future::BoxFuture;
use guide_api::{build_app_with_models, ApiConfig};
use guide_ml::{GenerationError, GenerativeStack, TextGenerator};
use serde_json::{json, Value};
use tower::ServiceExt;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/travel_planner_sample.json")
}

fn config() -> ApiConfig {
    ApiConfig {
        dataset_path: fixture_path(),
        score_seed: Some(7),
        ..ApiConfig::default()
    }
}

fn app() -> Router {
    build_app_with_models(config(), GenerativeStack::disabled())
}

struct CannedGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl TextGenerator for CannedGenerator {
    fn model_name(&self) -> &str {
        "canned"
    }

    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn activity_times(day: &Value) -> Vec<String> {
    day["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|activity| activity["time"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_dataset_and_model_capabilities() {
    let response = app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["capabilities"]["datasetRecords"], 4);
    assert_eq!(body["capabilities"]["generativeModel"], false);
    assert!(body["metrics"]["requestsTotal"].is_u64());
}

#[tokio::test]
async fn rockford_itinerary_comes_from_the_dataset() {
    let response = app()
        .oneshot(post(
            "/api/itinerary/generate",
            json!({ "destination": "  Rockford ", "duration": 3, "accessibilityNeeds": ["wheelchair"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["match"], "Hugging Face Dataset (osunlp/TravelPlanner)");
    assert_eq!(body["destination"], "Rockford");
    assert_eq!(body["duration"], 3);

    let days = body["itinerary"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    for (index, day) in days.iter().enumerate() {
        assert_eq!(day["day"], index as u64 + 1);
    }

    assert_eq!(activity_times(&days[0]), vec!["19:00", "21:00"]);
    assert_eq!(
        activity_times(&days[1]),
        vec!["09:00", "10:30", "11:00", "11:30", "13:00", "19:00", "21:00"]
    );
    assert_eq!(days[1]["activities"][4]["activity"], "Grappa - Shangri-La's - Eros Hotel");
    assert_eq!(days[1]["activities"][0]["location"], "Rockford");

    for day in days {
        for activity in day["activities"].as_array().unwrap() {
            let score = activity["accessibilityScore"].as_u64().unwrap();
            assert!((80..100).contains(&score));
        }
    }
}

#[tokio::test]
async fn dataset_duration_caps_days() {
    let response = app()
        .oneshot(post(
            "/api/itinerary/generate",
            json!({ "destination": "rockford", "duration": 1 }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["duration"], 1);
    assert_eq!(body["itinerary"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn null_plan_rows_are_skipped_during_lookup() {
    let response = app()
        .oneshot(post(
            "/api/itinerary/generate",
            json!({ "destination": "Sarasota", "duration": 2 }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["match"], "Hugging Face Dataset (osunlp/TravelPlanner)");
    let days = body["itinerary"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(activity_times(&days[0]), vec!["10:30", "19:00", "21:00"]);
    assert_eq!(days[0]["activities"][0]["activity"], "Marie Selby Botanical Gardens");
}

#[tokio::test]
async fn seeded_scores_are_reproducible_across_requests() {
    let app = app();
    let request = || post("/api/itinerary/generate", json!({ "destination": "Rockford", "duration": 2 }));

    let first = body_json(app.clone().oneshot(request()).await.unwrap()).await;
    let second = body_json(app.oneshot(request()).await.unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_destination_without_model_gets_the_mock() {
    let response = app()
        .oneshot(post(
            "/api/itinerary/generate",
            json!({ "destination": "Atlantis", "duration": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["match"], "Fallback/Mock");
    assert_eq!(body["duration"], 4);
    assert_eq!(body["itinerary"][0]["activities"][0]["time"], "10:00");
    assert_eq!(
        body["itinerary"][0]["activities"][0]["activity"],
        "Mock Visit (Gemini Unavailable)"
    );
}

#[tokio::test]
async fn empty_dataset_plan_uses_the_model_document() {
    let generator = Arc::new(CannedGenerator {
        reply: "```json\n{\"destination\":\"Empty Plans\",\"duration\":1,\"itinerary\":[{\"day\":1,\"activities\":[]}]}\n```"
            .to_string(),
        calls: AtomicUsize::new(0),
    });
    let app = build_app_with_models(config(), GenerativeStack::with_generator(generator.clone()));

    let response = app
        .oneshot(post(
            "/api/itinerary/generate",
            json!({ "destination": "Empty Plans", "duration": 1 }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(body["destination"], "Empty Plans");
    assert!(body.get("match").is_none());
    assert_eq!(body["itinerary"][0]["day"], 1);
}

#[tokio::test]
async fn itinerary_validation_errors() {
    let app = app();

    let missing = app
        .clone()
        .oneshot(post("/api/itinerary/generate", json!({ "duration": 2 })))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body = body_json(missing).await;
    assert_eq!(body["error"], "Destination is required");
    assert_eq!(body["code"], "MISSING_DESTINATION");

    let not_a_string = app
        .clone()
        .oneshot(post("/api/itinerary/generate", json!({ "destination": 42 })))
        .await
        .unwrap();
    assert_eq!(body_json(not_a_string).await["code"], "MISSING_DESTINATION");

    for duration in [json!(0), json!(15)] {
        let response = app
            .clone()
            .oneshot(post(
                "/api/itinerary/generate",
                json!({ "destination": "Rockford", "duration": duration }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_DURATION");
    }
}

fn sample_locations() -> Value {
    json!([
        {
            "id": "park",
            "name": "Riverside Park",
            "category": "Park",
            "latitude": 42.27,
            "longitude": -89.09,
            "accessibilityFeatures": ["accessible-paths"]
        },
        {
            "id": "museum",
            "name": "Discovery Center Museum",
            "category": "Museum",
            "latitude": 42.28,
            "longitude": -89.08,
            "accessibilityFeatures": ["wheelchair", "vision", "elevators"]
        },
        {
            "id": "cafe",
            "name": "Quiet Cafe",
            "category": "Cafe",
            "latitude": 42.26,
            "longitude": -89.10,
            "accessibilityFeatures": ["cognitive"]
        }
    ])
}

#[tokio::test]
async fn rank_puts_need_matches_first() {
    let response = app()
        .oneshot(post(
            "/api/map/rank",
            json!({ "locations": sample_locations(), "needs": ["wheelchair"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    let locations = body["locations"].as_array().unwrap();
    assert_eq!(locations[0]["id"], "museum");
    assert_eq!(locations[0]["matchesNeeds"], true);
    assert_eq!(locations[0]["accessibilityScore"], 85);
    assert!(locations[1..].iter().all(|l| l["matchesNeeds"] == false));
}

#[tokio::test]
async fn filter_uses_need_tag_groups() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post(
            "/api/map/filter",
            json!({ "locations": sample_locations(), "needs": ["walker"] }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let ids: Vec<&str> = body["locations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["park", "museum"]);

    let unfiltered = app
        .oneshot(post("/api/map/filter", json!({ "locations": sample_locations() })))
        .await
        .unwrap();
    assert_eq!(body_json(unfiltered).await["count"], 3);
}

#[tokio::test]
async fn score_returns_total_and_breakdown() {
    let location = sample_locations()[1].clone();
    let response = app()
        .oneshot(post("/api/map/score", json!({ "location": location })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["accessibilityScore"], 85);
    assert_eq!(body["breakdown"]["mobility"]["score"], 100);
    assert_eq!(body["breakdown"]["vision"]["score"], 100);
}

#[tokio::test]
async fn sign_language_routes() {
    let app = app();

    let translated = app
        .clone()
        .oneshot(post("/api/sign-language/translate", json!({ "text": "thank you" })))
        .await
        .unwrap();
    assert_eq!(translated.status(), StatusCode::OK);
    let body = body_json(translated).await;
    assert_eq!(body["original"], "thank you");
    assert_eq!(body["explanation"], "Mock translation for: thank you");
    assert_eq!(body["message"], "Translation processed successfully");

    let missing = app
        .clone()
        .oneshot(post("/api/sign-language/translate", json!({ "text": "" })))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "Text is required");

    let centers = app.oneshot(get("/api/sign-language/centers")).await.unwrap();
    let body = body_json(centers).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["name"], "Deaf Community Services");
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let response = app().oneshot(get("/api/nowhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Endpoint not found");
}
