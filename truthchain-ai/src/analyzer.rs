//! Content analysis: remote model first, local heuristics on failure
//!
//! `ContentAnalyzer::analyze` never fails. Every remote error is logged and
//! answered by the matching heuristic scorer from `truthchain-core`.

use tracing::{debug, info, warn};

use truthchain_core::{
    extract_domain, image_result, invalid_url_result, score_image, score_text, score_url,
    sniff_dimensions, Content, ContentType, ImageData, VerificationResult, IMAGE_FALLBACK_MODEL,
};

use crate::backend::{LlmError, SharedBackend};
use crate::classifier::{ClassifierError, SharedClassifier};
use crate::prompts::PromptRegistry;
use crate::verdict::parse_verdict;

/// Model name reported when image analysis fails outright
pub const IMAGE_ERROR_MODEL: &str = "Error in processing";

/// Explanation reported when image analysis fails outright
pub const IMAGE_ERROR_EXPLANATION: &str = "An error occurred during image verification.";

/// Runs remote analysis with heuristic fallbacks
#[derive(Clone)]
pub struct ContentAnalyzer {
    backend: Option<SharedBackend>,
    prompts: PromptRegistry,
    classifiers: Option<(SharedClassifier, SharedClassifier)>,
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentAnalyzer {
    /// Heuristics only, with the embedded prompts ready for a backend
    pub fn new() -> Self {
        Self {
            backend: None,
            prompts: PromptRegistry::load_embedded(),
            classifiers: None,
        }
    }

    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptRegistry) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the primary and secondary image classifiers
    pub fn with_classifiers(mut self, primary: SharedClassifier, secondary: SharedClassifier) -> Self {
        self.classifiers = Some((primary, secondary));
        self
    }

    pub fn backend_name(&self) -> Option<String> {
        self.backend.as_ref().map(|b| b.display_name())
    }

    pub fn classifier_names(&self) -> Option<(String, String)> {
        self.classifiers
            .as_ref()
            .map(|(a, b)| (a.model_name().to_string(), b.model_name().to_string()))
    }

    /// Produce a verdict for the content
    pub async fn analyze(&self, content: &Content) -> VerificationResult {
        match content {
            Content::Text(text) => self.analyze_text(text).await,
            Content::Url(url) => self.analyze_url(url).await,
            Content::Image(image) => self.analyze_image(image).await,
        }
    }

    async fn analyze_text(&self, text: &str) -> VerificationResult {
        match self.ask_backend(ContentType::Text, text, None).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Remote text analysis unavailable, using pattern analysis: {}", e);
                score_text(text)
            }
        }
    }

    async fn analyze_url(&self, url: &str) -> VerificationResult {
        if extract_domain(url).is_none() {
            debug!("Rejecting unparsable URL without remote call");
            return invalid_url_result();
        }

        match self.ask_backend(ContentType::Url, url, None).await {
            Ok(result) => result.with_source_url(url),
            Err(e) => {
                warn!("Remote URL analysis unavailable, using domain analysis: {}", e);
                score_url(url)
            }
        }
    }

    async fn analyze_image(&self, image: &ImageData) -> VerificationResult {
        let description = format!("{}, {} bytes", image.mime, image.bytes.len());
        match self
            .ask_backend(ContentType::Image, &description, Some(image))
            .await
        {
            Ok(result) => return result,
            Err(e) => warn!("Remote image analysis unavailable, using classifiers: {}", e),
        }

        match self.classify_image(image).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Image classification failed: {}", e);
                VerificationResult::rejected(IMAGE_ERROR_MODEL, IMAGE_ERROR_EXPLANATION)
            }
        }
    }

    async fn ask_backend(
        &self,
        content_type: ContentType,
        content: &str,
        image: Option<&ImageData>,
    ) -> Result<VerificationResult, LlmError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| LlmError::Config("no remote backend configured".to_string()))?;
        let prompt = self
            .prompts
            .render(content_type, content)
            .ok_or_else(|| LlmError::Config(format!("no prompt for {} content", content_type)))?;

        let response = match image {
            Some(image) => {
                backend
                    .generate_with_image(&prompt.system, &prompt.user, image)
                    .await?
            }
            None => backend.generate(&prompt.system, &prompt.user).await?,
        };

        let verdict = parse_verdict(&response)?;
        info!(
            "{} verdict from {}: {}",
            content_type.label(),
            backend.model_name(),
            verdict.score()
        );
        Ok(verdict.into_result(backend.display_name()))
    }

    async fn classify_image(&self, image: &ImageData) -> Result<VerificationResult, ClassifierError> {
        let (primary, secondary) = self
            .classifiers
            .as_ref()
            .ok_or_else(|| ClassifierError::Network("no image classifiers configured".to_string()))?;

        let (classification, manipulation) =
            futures::try_join!(primary.classify(image), secondary.classify(image))?;

        let verdict = score_image(&classification, &manipulation, sniff_dimensions(&image.bytes));
        debug!(
            "Image factors: confidence {:.1}, agreement {:.1}, quality {:.1}",
            verdict.classification_confidence, verdict.model_agreement, verdict.image_quality
        );
        Ok(image_result(&verdict, IMAGE_FALLBACK_MODEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LlmBackend;
    use crate::classifier::ImageClassifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use truthchain_core::{ClassLabel, TEXT_FALLBACK_MODEL, URL_FALLBACK_MODEL, URL_INVALID_MODEL};

    struct ScriptedBackend {
        reply: Result<String, ()>,
        vision: bool,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                vision: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                vision: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn respond(&self) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::RateLimited)
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.respond()
        }

        async fn generate_with_image(
            &self,
            _system: &str,
            _user: &str,
            _image: &ImageData,
        ) -> Result<String, LlmError> {
            if !self.vision {
                return Err(LlmError::Unsupported("scripted".to_string()));
            }
            self.respond()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        fn display_name(&self) -> String {
            "Scripted Model".to_string()
        }
    }

    struct FixedClassifier(Result<Vec<ClassLabel>, ()>);

    #[async_trait]
    impl ImageClassifier for FixedClassifier {
        async fn classify(&self, _image: &ImageData) -> Result<Vec<ClassLabel>, ClassifierError> {
            self.0
                .clone()
                .map_err(|_| ClassifierError::Api { status: 500, message: "boom".to_string() })
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn labels(items: &[(&str, f64)]) -> Vec<ClassLabel> {
        items.iter().map(|(l, s)| ClassLabel::new(l, *s)).collect()
    }

    fn png_1000() -> ImageData {
        let mut bytes = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        ImageData::new("image/png", bytes)
    }

    const VERDICT: &str = r#"Result: {"isVerified": true, "confidenceScore": 92, "explanation": "Consistent with sources."}"#;

    #[tokio::test]
    async fn test_text_uses_backend() {
        let backend = ScriptedBackend::replying(VERDICT);
        let analyzer = ContentAnalyzer::new().with_backend(backend.clone());

        let result = analyzer.analyze(&Content::Text("Water boils at 100C".to_string())).await;
        assert!(result.is_verified);
        assert_eq!(result.confidence_score, 92);
        assert_eq!(result.ai_model_used, "Scripted Model");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_text_falls_back_on_error() {
        let analyzer = ContentAnalyzer::new().with_backend(ScriptedBackend::failing());
        let result = analyzer.analyze(&Content::Text("Just a sentence".to_string())).await;
        assert_eq!(result.ai_model_used, TEXT_FALLBACK_MODEL);
        assert_eq!(result.confidence_score, 65);
    }

    #[tokio::test]
    async fn test_text_falls_back_on_malformed_reply() {
        let analyzer =
            ContentAnalyzer::new().with_backend(ScriptedBackend::replying("I am not sure."));
        let result = analyzer.analyze(&Content::Text("Just a sentence".to_string())).await;
        assert_eq!(result.ai_model_used, TEXT_FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn test_no_backend_uses_heuristics() {
        let analyzer = ContentAnalyzer::new();
        let result = analyzer
            .analyze(&Content::Url("https://en.wikipedia.org/wiki/Rust".to_string()))
            .await;
        assert_eq!(result.ai_model_used, URL_FALLBACK_MODEL);
        assert_eq!(result.confidence_score, 95);
        assert_eq!(
            result.source_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust")
        );
    }

    #[tokio::test]
    async fn test_invalid_url_skips_backend() {
        let backend = ScriptedBackend::replying(VERDICT);
        let analyzer = ContentAnalyzer::new().with_backend(backend.clone());

        let result = analyzer.analyze(&Content::Url("not a url".to_string())).await;
        assert!(!result.is_verified);
        assert_eq!(result.confidence_score, 0);
        assert_eq!(result.ai_model_used, URL_INVALID_MODEL);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_url_backend_sets_source() {
        let analyzer = ContentAnalyzer::new().with_backend(ScriptedBackend::replying(VERDICT));
        let result = analyzer
            .analyze(&Content::Url("https://example.com/a".to_string()))
            .await;
        assert_eq!(result.confidence_score, 92);
        assert_eq!(result.source_url.as_deref(), Some("https://example.com/a"));
    }

    #[tokio::test]
    async fn test_image_uses_vision_backend() {
        let analyzer = ContentAnalyzer::new().with_backend(ScriptedBackend::replying(VERDICT));
        let result = analyzer.analyze(&Content::Image(png_1000())).await;
        assert_eq!(result.ai_model_used, "Scripted Model");
    }

    #[tokio::test]
    async fn test_image_falls_back_to_classifiers() {
        let primary = Arc::new(FixedClassifier(Ok(labels(&[
            ("cat", 0.9),
            ("tabby", 0.05),
            ("lynx", 0.02),
        ]))));
        let secondary = Arc::new(FixedClassifier(Ok(labels(&[
            ("cat", 0.8),
            ("dog", 0.1),
            ("fox", 0.05),
        ]))));
        let analyzer = ContentAnalyzer::new()
            .with_backend(ScriptedBackend::failing())
            .with_classifiers(primary, secondary);

        let result = analyzer.analyze(&Content::Image(png_1000())).await;
        assert_eq!(result.ai_model_used, IMAGE_FALLBACK_MODEL);
        assert_eq!(result.confidence_score, 79);
        assert!(result.is_verified);
    }

    #[tokio::test]
    async fn test_image_error_when_classifier_fails() {
        let analyzer = ContentAnalyzer::new().with_classifiers(
            Arc::new(FixedClassifier(Ok(labels(&[("cat", 0.9)])))),
            Arc::new(FixedClassifier(Err(()))),
        );
        let result = analyzer.analyze(&Content::Image(png_1000())).await;
        assert_eq!(
            result,
            VerificationResult::rejected(IMAGE_ERROR_MODEL, IMAGE_ERROR_EXPLANATION)
        );
    }

    #[tokio::test]
    async fn test_image_error_without_classifiers() {
        let result = ContentAnalyzer::new()
            .analyze(&Content::Image(png_1000()))
            .await;
        assert_eq!(result.ai_model_used, IMAGE_ERROR_MODEL);
        assert_eq!(result.confidence_score, 0);
    }
}
