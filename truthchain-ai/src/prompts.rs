//! Prompt management for remote verification
//!
//! Loads prompt definitions from TOML files, one per content type. The
//! defaults ship embedded in the crate; a directory of TOML files can
//! override them.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use truthchain_core::ContentType;

/// Placeholder substituted with the submitted content
const CONTENT_PLACEHOLDER: &str = "{content}";

/// Errors from prompt loading
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid prompt file {path}: {message}")]
    Parse { path: String, message: String },
}

/// A prompt definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationPrompt {
    pub prompt: PromptMetadata,
    pub template: PromptTemplate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub content_type: ContentType,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

fn default_enabled() -> bool {
    true
}

/// System and user messages ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl VerificationPrompt {
    pub fn render(&self, content: &str) -> RenderedPrompt {
        RenderedPrompt {
            system: self.template.system.trim().to_string(),
            user: self
                .template
                .user
                .trim()
                .replace(CONTENT_PLACEHOLDER, content),
        }
    }
}

/// Registry of prompts keyed by content type
#[derive(Debug, Default, Clone)]
pub struct PromptRegistry {
    prompts: HashMap<ContentType, VerificationPrompt>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the prompts shipped with the crate
    pub fn load_embedded() -> Self {
        let mut registry = Self::new();

        let embedded = [
            ("text.toml", include_str!("../prompts/text.toml")),
            ("url.toml", include_str!("../prompts/url.toml")),
            ("image.toml", include_str!("../prompts/image.toml")),
        ];

        for (name, toml_str) in embedded {
            match toml::from_str::<VerificationPrompt>(toml_str) {
                Ok(prompt) if prompt.prompt.enabled => registry.register(prompt),
                Ok(_) => {}
                Err(e) => warn!("Skipping embedded prompt {}: {}", name, e),
            }
        }

        registry
    }

    /// Overlay prompts from a directory of TOML files
    pub fn load_from_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self, PromptError> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.extension().is_some_and(|ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)?;
                let prompt = toml::from_str::<VerificationPrompt>(&content).map_err(|e| {
                    PromptError::Parse {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                })?;
                if prompt.prompt.enabled {
                    debug!("Loaded prompt '{}' from {}", prompt.prompt.id, path.display());
                    self.register(prompt);
                }
            }
        }

        Ok(self)
    }

    /// Register a prompt, replacing any prompt for the same content type
    pub fn register(&mut self, prompt: VerificationPrompt) {
        self.prompts.insert(prompt.prompt.content_type, prompt);
    }

    pub fn get(&self, content_type: ContentType) -> Option<&VerificationPrompt> {
        self.prompts.get(&content_type)
    }

    /// Render the prompt for a content type
    pub fn render(&self, content_type: ContentType, content: &str) -> Option<RenderedPrompt> {
        self.get(content_type).map(|p| p.render(content))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_prompts() {
        let registry = PromptRegistry::load_embedded();
        assert_eq!(registry.len(), 3);

        let rendered = registry
            .render(ContentType::Text, "The moon is made of cheese")
            .unwrap();
        assert!(rendered.system.contains("fact-checking"));
        assert_eq!(rendered.user, "Statement to verify: \"The moon is made of cheese\"");
    }

    #[test]
    fn test_url_prompt_mentions_url() {
        let registry = PromptRegistry::load_embedded();
        let rendered = registry
            .render(ContentType::Url, "https://example.com")
            .unwrap();
        assert!(rendered.user.contains("https://example.com"));
        assert!(rendered.system.contains("\"isVerified\""));
    }

    #[test]
    fn test_load_from_dir_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.toml"),
            r#"
[prompt]
id = "strict-text"
content_type = "text"
name = "Strict"

[template]
system = "Be strict."
user = "Check: {content}"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = PromptRegistry::load_embedded()
            .load_from_dir(dir.path())
            .unwrap();
        let prompt = registry.get(ContentType::Text).unwrap();
        assert_eq!(prompt.prompt.id, "strict-text");
        assert_eq!(
            registry.render(ContentType::Text, "x").unwrap().user,
            "Check: x"
        );
        // Untouched types keep the embedded prompt
        assert_eq!(registry.get(ContentType::Url).unwrap().prompt.id, "url");
    }

    #[test]
    fn test_load_from_dir_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[prompt]\nid = 3").unwrap();
        let result = PromptRegistry::new().load_from_dir(dir.path());
        assert!(matches!(result, Err(PromptError::Parse { .. })));
    }
}
