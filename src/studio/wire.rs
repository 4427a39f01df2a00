//! Generative Language API request and response bodies.

use serde::{Deserialize, Serialize};

// --- generateContent ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'a str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

// --- predictLongRunning ---

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub instances: Vec<VideoInstance<'a>>,
    pub parameters: VideoParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance<'a> {
    pub prompt: &'a str,
    pub image: InlineImage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage<'a> {
    pub bytes_base64_encoded: &'a str,
    pub mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters<'a> {
    pub sample_count: u32,
    pub resolution: &'a str,
    pub aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LongRunningOperation {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    pub done: Option<bool>,
    pub response: Option<OperationResponse>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    pub generated_samples: Option<Vec<GeneratedSample>>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<MediaRef>,
    pub thumbnail: Option<MediaRef>,
}

#[derive(Debug, Deserialize)]
pub struct MediaRef {
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: String,
}

// --- errors ---

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_field_names() {
        let request = PredictRequest {
            instances: vec![VideoInstance {
                prompt: "a robot paints",
                image: InlineImage {
                    bytes_base64_encoded: "AAAA",
                    mime_type: "image/png",
                },
            }],
            parameters: VideoParameters {
                sample_count: 1,
                resolution: "720p",
                aspect_ratio: "9:16",
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["instances"][0]["image"]["bytesBase64Encoded"], "AAAA");
        assert_eq!(value["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(value["parameters"]["sampleCount"], 1);
        assert_eq!(value["parameters"]["aspectRatio"], "9:16");
    }

    #[test]
    fn test_generate_content_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[\"a\","},{"text":"\"b\"]"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_generate_content_without_candidates() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(response.text().is_none());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_operation_status_with_samples() {
        let body = r#"{
            "name": "models/veo/operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [
                        {"video": {"uri": "https://example.com/v?alt=media"}}
                    ]
                }
            }
        }"#;
        let status: OperationStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.done, Some(true));
        let samples = status
            .response
            .unwrap()
            .generate_video_response
            .unwrap()
            .generated_samples
            .unwrap();
        assert_eq!(
            samples[0].video.as_ref().unwrap().uri.as_deref(),
            Some("https://example.com/v?alt=media")
        );
        assert!(samples[0].thumbnail.is_none());
    }
}
