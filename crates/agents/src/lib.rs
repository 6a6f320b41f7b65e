use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use guide_core::{
    mock_itinerary, normalize, validate_itinerary, Itinerary, ItineraryRequest, NormalizedItinerary,
};
use guide_dataset::DatasetIndex;
use guide_ml::{itinerary_prompt, sign_explanation_prompt, strip_code_fences, GenerativeStack, TextGenerator};
use guide_observability::AppMetrics;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Entry point for itinerary generation and the other model-backed helpers.
///
/// Itineraries come from the dataset when it has a usable plan for the
/// destination, otherwise from the generative model, otherwise from a static
/// mock. `generate_itinerary` never fails.
#[derive(Clone)]
pub struct GuideAgent {
    dataset: Arc<DatasetIndex>,
    models: GenerativeStack,
    metrics: Arc<AppMetrics>,
    score_seed: Option<u64>,
}

impl GuideAgent {
    pub fn new(dataset: Arc<DatasetIndex>, models: GenerativeStack, metrics: Arc<AppMetrics>) -> Self {
        Self {
            dataset,
            models,
            metrics,
            score_seed: None,
        }
    }

    /// Seeds the dataset score synthesis so repeated calls produce identical
    /// itineraries.
    pub fn with_score_seed(mut self, seed: Option<u64>) -> Self {
        self.score_seed = seed;
        self
    }

    pub fn dataset(&self) -> &DatasetIndex {
        &self.dataset
    }

    pub fn model_enabled(&self) -> bool {
        self.models.is_enabled()
    }

    #[instrument(skip(self, request), fields(destination = %request.destination, duration = request.duration))]
    pub async fn generate_itinerary(&self, request: &ItineraryRequest) -> Itinerary {
        let started = Instant::now();
        self.metrics.inc_request();

        let itinerary = self.resolve_itinerary(request).await;

        self.metrics.observe_latency(started.elapsed());
        info!(
            provenance = ?itinerary.provenance(),
            days = itinerary.day_count(),
            "itinerary generated"
        );
        itinerary
    }

    /// Describes how to sign `text` in ASL. Falls back to a fixed message when
    /// no model is configured or the call fails.
    #[instrument(skip(self, text))]
    pub async fn explain_sign(&self, text: &str) -> String {
        self.metrics.inc_request();

        let Some(generator) = self.models.generator.as_ref() else {
            self.metrics.inc_fallback();
            return format!("Mock translation for: {text}");
        };

        self.metrics.inc_model_call();
        match generator.generate(&sign_explanation_prompt(text)).await {
            Ok(explanation) => explanation,
            Err(err) => {
                warn!(error = %err, model = generator.model_name(), "sign explanation failed");
                self.metrics.inc_model_failure();
                format!("Error generating translation for: {text}")
            }
        }
    }

    async fn resolve_itinerary(&self, request: &ItineraryRequest) -> Itinerary {
        if let Some(itinerary) = self.from_dataset(request) {
            self.metrics.inc_dataset_hit();
            return Itinerary::Dataset(itinerary);
        }

        let Some(generator) = self.models.generator.as_ref() else {
            self.metrics.inc_fallback();
            return Itinerary::Fallback(mock_itinerary(request));
        };

        self.metrics.inc_model_call();
        match from_model(generator.as_ref(), request).await {
            Ok(document) => Itinerary::Generated(document),
            Err(err) => {
                warn!(
                    error = ?err,
                    model = generator.model_name(),
                    "model itinerary rejected; serving mock"
                );
                self.metrics.inc_model_failure();
                self.metrics.inc_fallback();
                Itinerary::Fallback(mock_itinerary(request))
            }
        }
    }

    fn from_dataset(&self, request: &ItineraryRequest) -> Option<NormalizedItinerary> {
        let record = self.dataset.lookup(&request.destination)?;
        let destination = request.destination.as_str();

        let itinerary = match self.score_seed {
            Some(seed) => normalize(record, destination, request.duration, &mut StdRng::seed_from_u64(seed)),
            None => normalize(record, destination, request.duration, &mut rand::rng()),
        };

        if itinerary.is_none() {
            info!(row = record.row_index, "dataset match produced no activities");
        }
        itinerary
    }
}

async fn from_model(generator: &dyn TextGenerator, request: &ItineraryRequest) -> Result<Value> {
    let completion = generator
        .generate(&itinerary_prompt(request))
        .await
        .context("model call failed")?;

    let cleaned = strip_code_fences(&completion);
    let document: Value =
        serde_json::from_str(&cleaned).context("model completion is not valid JSON")?;
    validate_itinerary(&document).context("model completion has no itinerary array")?;

    Ok(document)
}
