//! Image classifiers used by the fallback image analysis

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use truthchain_core::{ClassLabel, ImageData};

/// Primary classifier model
pub const VIT_MODEL: &str = "google/vit-base-patch16-224";

/// Secondary classifier model, compared against the primary
pub const SWIN_MODEL: &str = "microsoft/swin-tiny-patch4-window7-224";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Classifier API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model is loading, retry later")]
    Loading,

    #[error("Unexpected classifier response: {0}")]
    Parse(String),
}

/// Ranks labels for an image
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Labels sorted by descending score
    async fn classify(&self, image: &ImageData) -> Result<Vec<ClassLabel>, ClassifierError>;

    fn model_name(&self) -> &str;
}

pub type SharedClassifier = Arc<dyn ImageClassifier>;

/// Hugging Face Inference API settings
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: env::var("HF_API_TOKEN").ok(),
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: VIT_MODEL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HuggingFaceConfig {
    pub fn for_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Image classification over the Hugging Face Inference API
pub struct HuggingFaceClassifier {
    client: Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceClassifier {
    pub fn new(config: HuggingFaceConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ImageClassifier for HuggingFaceClassifier {
    async fn classify(&self, image: &ImageData) -> Result<Vec<ClassLabel>, ClassifierError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("content-type", &image.mime)
            .body(image.bytes.clone());

        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClassifierError::Loading);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;
        let labels = parse_labels(&body)?;
        debug!("{} returned {} labels", self.config.model, labels.len());
        Ok(labels)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Parse an inference response into labels sorted by score
pub fn parse_labels(body: &str) -> Result<Vec<ClassLabel>, ClassifierError> {
    let raw: Vec<LabelScore> =
        serde_json::from_str(body).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let mut labels: Vec<ClassLabel> = raw
        .into_iter()
        .map(|l| ClassLabel::new(&l.label, l.score))
        .collect();
    labels.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(labels)
}

/// Create the primary and secondary classifiers
pub fn create_default_classifiers() -> Result<(SharedClassifier, SharedClassifier), ClassifierError> {
    let primary = HuggingFaceClassifier::new(HuggingFaceConfig::for_model(VIT_MODEL))?;
    let secondary = HuggingFaceClassifier::new(HuggingFaceConfig::for_model(SWIN_MODEL))?;
    Ok((Arc::new(primary), Arc::new(secondary)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_sorted() {
        let body = r#"[{"label": "tabby, tabby cat", "score": 0.31}, {"label": "Egyptian cat", "score": 0.52}]"#;
        let labels = parse_labels(body).unwrap();
        assert_eq!(labels[0].label, "Egyptian cat");
        assert_eq!(labels[1].score, 0.31);
    }

    #[test]
    fn test_parse_labels_error_payload() {
        let body = r#"{"error": "Model is currently loading", "estimated_time": 20.0}"#;
        assert!(matches!(parse_labels(body), Err(ClassifierError::Parse(_))));
    }

    #[test]
    fn test_endpoint() {
        let classifier = HuggingFaceClassifier::new(HuggingFaceConfig {
            base_url: "https://example.test/models/".to_string(),
            ..HuggingFaceConfig::for_model(SWIN_MODEL)
        })
        .unwrap();
        assert_eq!(
            classifier.endpoint(),
            "https://example.test/models/microsoft/swin-tiny-patch4-window7-224"
        );
        assert_eq!(classifier.model_name(), SWIN_MODEL);
    }
}
