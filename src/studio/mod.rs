// Generative service seam
//
// The generators and the controller only see these traits:
// - TextGenerator: schema-constrained text generation (Gemini)
// - VideoService: long-running video jobs and media retrieval (Veo)
// - ServiceFactory: builds both for a credential
//
// gemini.rs holds the REST implementation, wire.rs its request/response types.

pub mod gemini;
pub mod wire;

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::config::{AspectRatio, GeminiConfig};
use crate::error::Result;
use crate::media::ReferenceImage;

/// Response shape requested from the text model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `["...", "..."]`
    StringList,
    /// `[{"id": 1, "prompt": "..."}]`
    ScenePrompts,
}

impl ResponseShape {
    /// OpenAPI-style schema understood by `generationConfig.responseSchema`
    pub fn schema(&self) -> serde_json::Value {
        match self {
            Self::StringList => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }),
            Self::ScenePrompts => json!({
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "NUMBER" },
                        "prompt": { "type": "STRING" }
                    },
                    "required": ["id", "prompt"]
                }
            }),
        }
    }
}

/// Strip a surrounding Markdown code fence (```json ... ``` or ``` ... ```)
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.trim_end().strip_suffix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with(['[', '{']) => {
            inner[newline + 1..].trim()
        }
        _ => inner.trim(),
    }
}

/// Text generation with a structured response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the raw generated text, expected to be JSON of the given shape
    async fn generate_structured(&self, prompt: &str, shape: ResponseShape) -> Result<String>;
}

/// One video job submission
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: Arc<ReferenceImage>,
    pub aspect_ratio: AspectRatio,
    pub resolution: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobStatus {
    pub done: bool,
    pub result: Option<VideoResult>,
}

/// References to finished media; both need the credential to download
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoResult {
    pub video_uri: Option<String>,
    pub thumbnail_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Long-running video generation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Create a job; rejected submissions are errors
    async fn submit(&self, request: &VideoRequest) -> Result<JobHandle>;

    /// Query a job; a job that finished with an error is reported as an error
    async fn status(&self, job: &JobHandle) -> Result<JobStatus>;

    /// Download media referenced by a job result
    async fn fetch(&self, uri: &str) -> Result<FetchedMedia>;
}

/// Service handles bound to one credential
#[derive(Clone)]
pub struct Services {
    pub text: Arc<dyn TextGenerator>,
    pub video: Arc<dyn VideoService>,
}

/// Builds service handles whenever the credential changes
pub trait ServiceFactory: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Services>;
}

/// Factory for the Gemini/Veo REST client
pub struct GeminiServiceFactory {
    config: GeminiConfig,
}

impl GeminiServiceFactory {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }
}

impl ServiceFactory for GeminiServiceFactory {
    fn connect(&self, api_key: &str) -> Result<Services> {
        let client = Arc::new(gemini::GeminiClient::new(self.config.clone(), api_key)?);
        Ok(Services {
            text: client.clone(),
            video: client,
        })
    }
}
