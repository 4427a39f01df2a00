use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::wire::*;
use super::{
    FetchedMedia, JobHandle, JobStatus, ResponseShape, TextGenerator, VideoRequest, VideoResult,
    VideoService,
};
use crate::config::GeminiConfig;
use crate::error::{Result, ScripterError};

/// Header carrying the credential on every request
const API_KEY_HEADER: &str = "x-goog-api-key";

/// REST client for the Generative Language API
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("veo-scripter/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key: api_key.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into a service error carrying the API message
    async fn check_status(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        Err(ScripterError::Service(format!(
            "{} failed with {}: {}",
            context, status, message
        )))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_structured(&self, prompt: &str, shape: ResponseShape) -> Result<String> {
        let url = self.api_url(&format!("models/{}:generateContent", self.config.text_model));
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: shape.schema(),
            },
        };

        debug!("Sending generateContent request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScripterError::Service(format!("HTTP request failed: {}", e)))?;
        let response = Self::check_status(response, "Text generation").await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScripterError::Service(format!("Failed to parse response: {}", e)))?;

        match body.text() {
            Some(text) => {
                debug!("Raw generateContent text: {}", text);
                Ok(text)
            }
            None => {
                let reason = body
                    .prompt_feedback
                    .and_then(|feedback| feedback.block_reason)
                    .unwrap_or_else(|| "no candidates returned".to_string());
                Err(ScripterError::Service(format!(
                    "Text generation returned no content ({})",
                    reason
                )))
            }
        }
    }
}

#[async_trait]
impl VideoService for GeminiClient {
    async fn submit(&self, request: &VideoRequest) -> Result<JobHandle> {
        let url = self.api_url(&format!("models/{}:predictLongRunning", self.config.video_model));
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: &request.prompt,
                image: InlineImage {
                    bytes_base64_encoded: &request.image.encoded,
                    mime_type: &request.image.mime_type,
                },
            }],
            parameters: VideoParameters {
                sample_count: request.count,
                resolution: &request.resolution,
                aspect_ratio: request.aspect_ratio.as_str(),
            },
        };

        debug!("Submitting video job to: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScripterError::Service(format!("HTTP request failed: {}", e)))?;
        let response = Self::check_status(response, "Video submission").await?;

        let operation: LongRunningOperation = response
            .json()
            .await
            .map_err(|e| ScripterError::Service(format!("Failed to parse response: {}", e)))?;

        info!("Video job submitted: {}", operation.name);
        Ok(JobHandle {
            name: operation.name,
        })
    }

    async fn status(&self, job: &JobHandle) -> Result<JobStatus> {
        let url = self.api_url(&job.name);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ScripterError::Service(format!("HTTP request failed: {}", e)))?;
        let response = Self::check_status(response, "Job status query").await?;

        let status: OperationStatus = response
            .json()
            .await
            .map_err(|e| ScripterError::Service(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = status.error {
            return Err(ScripterError::Service(format!(
                "Operation finished with an error: (Code {}) {}",
                error.code.unwrap_or_default(),
                error.message
            )));
        }

        let done = status.done.unwrap_or(false);
        let result = status
            .response
            .and_then(|response| response.generate_video_response)
            .and_then(|response| response.generated_samples)
            .and_then(|samples| samples.into_iter().next())
            .map(|sample| VideoResult {
                video_uri: sample.video.and_then(|media| media.uri),
                thumbnail_uri: sample.thumbnail.and_then(|media| media.uri),
            });

        if done && result.is_none() {
            warn!("Job {} finished without generated samples", job.name);
        }

        Ok(JobStatus { done, result })
    }

    async fn fetch(&self, uri: &str) -> Result<FetchedMedia> {
        debug!("Fetching media: {}", uri);

        let response = self
            .client
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ScripterError::Service(format!("HTTP request failed: {}", e)))?;
        let response = Self::check_status(response, "Media download").await?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScripterError::Service(format!("Failed to read media: {}", e)))?;

        Ok(FetchedMedia {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let mut config = Config::default().gemini;
        config.endpoint = "http://localhost:9000/".to_string();
        let client = GeminiClient::new(config, "key").unwrap();

        assert_eq!(
            client.api_url("models/gemini-2.5-pro:generateContent"),
            "http://localhost:9000/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(
            client.api_url("models/veo/operations/abc"),
            "http://localhost:9000/v1beta/models/veo/operations/abc"
        );
    }
}
