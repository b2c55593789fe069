//! Remote NER client
//!
//! Talks to a spaCy-compatible NER service over HTTP:
//!
//! - `POST {base}/ner` with `{"model": ..., "text": ...}` returns
//!   `{"ents": [{"start": .., "end": .., "label": .., "text": ..}]}`
//!   with character offsets
//! - `GET {base}/health` answers 2xx when the service is up
//!
//! Author: hephaex@gmail.com

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use entilens_core::{slice_chars, EntilensError, EntityRecognizer, NerConfig, RawEntity, Result};

/// Hint shown when a model is not installed on the service
pub fn install_hint(model: &str) -> String {
    format!("Install with `python -m spacy download {model}`.")
}

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NerResponse {
    ents: Vec<NerSpan>,
}

#[derive(Debug, Deserialize)]
struct NerSpan {
    start: usize,
    end: usize,
    label: String,
    #[serde(default)]
    text: Option<String>,
}

/// Recognizer backed by one model of a remote NER service
pub struct RemoteNer {
    client: Client,
    base_url: String,
    model: String,
}

impl RemoteNer {
    /// Create a client for `model` served at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EntilensError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Create from config
    pub fn from_config(config: &NerConfig, model: impl Into<String>) -> Result<Self> {
        let base_url = config
            .service_url
            .as_ref()
            .ok_or_else(|| EntilensError::ConfigError("NER service URL required".to_string()))?;

        Self::new(base_url.clone(), model, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unavailable(&self, reason: impl Into<String>) -> EntilensError {
        EntilensError::ModelUnavailable {
            model: self.model.clone(),
            reason: reason.into(),
        }
    }

    /// Convert service spans, filling in text the service left out
    fn into_entities(&self, text: &str, spans: Vec<NerSpan>) -> Vec<RawEntity> {
        spans
            .into_iter()
            .filter_map(|span| {
                let surface = match span.text {
                    Some(surface) => surface,
                    None => match slice_chars(text, span.start, span.end) {
                        Some(surface) => surface.to_string(),
                        None => {
                            tracing::warn!(
                                model = %self.model,
                                start = span.start,
                                end = span.end,
                                "NER service returned a span outside the text"
                            );
                            return None;
                        }
                    },
                };
                Some(RawEntity::new(surface, span.start, span.end, span.label))
            })
            .collect()
    }
}

#[async_trait]
impl EntityRecognizer for RemoteNer {
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>> {
        let request = NerRequest {
            model: &self.model,
            text,
        };

        let response = self
            .client
            .post(format!("{}/ner", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    self.unavailable(format!("NER service unreachable: {e}"))
                } else {
                    EntilensError::RecognitionError(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(self.unavailable(install_hint(&self.model)));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EntilensError::RecognitionError(format!(
                "NER service error ({status}): {error_text}"
            )));
        }

        let result: NerResponse = response
            .json()
            .await
            .map_err(|e| EntilensError::RecognitionError(format!("Failed to parse response: {e}")))?;

        tracing::debug!(model = %self.model, spans = result.ents.len(), "NER service responded");

        Ok(self.into_entities(text, result.ents))
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(model = %self.model, error = %e, "NER service health check failed");
                false
            }
        }
    }
}
