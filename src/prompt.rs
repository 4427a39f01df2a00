use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, ScripterError};
use crate::media::CharacterProfile;
use crate::scene::{Scene, SceneId};
use crate::studio::{strip_code_fences, ResponseShape, TextGenerator};

#[derive(Debug, Deserialize)]
struct GeneratedPrompt {
    /// Scene id echoed back by the model; JSON numbers may arrive as floats
    id: f64,
    prompt: String,
}

/// Expands scene descriptions into detailed, character-consistent video prompts
pub struct PromptGenerator {
    text: Arc<dyn TextGenerator>,
}

impl PromptGenerator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Generate one prompt per scene, keyed by scene id
    ///
    /// Fails with a validation error before any request when the character
    /// description, the reference image or any scene description is missing.
    /// Ids in the response that match no scene are dropped.
    pub async fn generate_prompts(
        &self,
        character: &CharacterProfile,
        scenes: &[Scene],
        duration_minutes: u32,
    ) -> Result<HashMap<SceneId, String>> {
        validate_inputs(character, scenes)?;

        info!("Generating prompts for {} scenes", scenes.len());

        let prompt = build_prompt_request(&character.description, scenes, duration_minutes);
        let raw = self
            .text
            .generate_structured(&prompt, ResponseShape::ScenePrompts)
            .await?;

        let prompts = correlate(parse_prompt_response(&raw)?, scenes);
        info!("Received prompts for {} of {} scenes", prompts.len(), scenes.len());
        Ok(prompts)
    }
}

pub fn validate_inputs(character: &CharacterProfile, scenes: &[Scene]) -> Result<()> {
    if character.description.trim().is_empty() {
        return Err(ScripterError::Validation("character description is empty".to_string()));
    }
    if character.image.is_none() {
        return Err(ScripterError::Validation("reference image is missing".to_string()));
    }
    if let Some(scene) = scenes.iter().find(|s| s.description.trim().is_empty()) {
        return Err(ScripterError::Validation(format!(
            "scene {} has no description",
            scene.id
        )));
    }
    Ok(())
}

fn build_prompt_request(character_description: &str, scenes: &[Scene], duration_minutes: u32) -> String {
    let scene_descriptions = scenes
        .iter()
        .map(|s| format!("Scene ID {}: {}", s.id, s.description.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a creative assistant for video production. Your task is to generate video prompts for the Veo 3.1 model based on a character description, a reference image, and a series of scene descriptions. The most important goal is to maintain character consistency across all scenes. The final combined video from all scenes should be approximately {} minute(s) long, so pace the prompts for each scene accordingly.

Character Description: "{}"
(A reference image of the character will be provided to the video model.)

Scene Descriptions:
{}

Generate a detailed, high-quality video prompt for each scene. The prompt should incorporate the character description seamlessly. The output must be a valid JSON array of objects, where each object has "id" (the original scene ID as a number) and "prompt" (the generated string prompt)."#,
        duration_minutes,
        character_description.trim(),
        scene_descriptions
    )
}

fn parse_prompt_response(raw: &str) -> Result<Vec<GeneratedPrompt>> {
    let text = strip_code_fences(raw);
    debug!("Parsing prompt response: {}", text);

    serde_json::from_str(text)
        .map_err(|e| ScripterError::Service(format!("Failed to parse prompt response: {}", e)))
}

fn correlate(generated: Vec<GeneratedPrompt>, scenes: &[Scene]) -> HashMap<SceneId, String> {
    let mut prompts = HashMap::new();
    for item in generated {
        let matched = scenes
            .iter()
            .map(|s| s.id)
            .find(|id| id.0 as f64 == item.id);
        match matched {
            Some(id) => {
                prompts.insert(id, item.prompt);
            }
            None => warn!("Ignoring prompt for unknown scene id {}", item.id),
        }
    }
    prompts
}
