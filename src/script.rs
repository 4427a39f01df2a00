use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, ScripterError};
use crate::studio::{strip_code_fences, ResponseShape, TextGenerator};

/// Turns a free-text story idea into an ordered list of scene descriptions
pub struct ScriptGenerator {
    text: Arc<dyn TextGenerator>,
}

impl ScriptGenerator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    pub async fn generate_script(&self, story_idea: &str, duration_minutes: u32) -> Result<Vec<String>> {
        info!("Generating script for a {} minute video", duration_minutes);

        let prompt = build_script_prompt(story_idea, duration_minutes);
        let raw = self
            .text
            .generate_structured(&prompt, ResponseShape::StringList)
            .await?;

        let scenes = parse_script_response(&raw)?;
        if scenes.is_empty() {
            return Err(ScripterError::EmptyResult);
        }

        info!("Script generated with {} scenes", scenes.len());
        Ok(scenes)
    }
}

fn build_script_prompt(story_idea: &str, duration_minutes: u32) -> String {
    format!(
        r#"You are a scriptwriter for short videos. Your task is to take a story idea and a target duration and break it down into a series of distinct scenes.

Story Idea: "{}"
Target Video Duration: {} minutes.

Based on the duration, decide on an appropriate number of scenes (e.g., 2-4 scenes per minute). For each scene, write a concise one or two-sentence description of the action involving the main character.

The output must be a valid JSON array of strings, where each string is a scene description."#,
        story_idea.trim(),
        duration_minutes
    )
}

/// Parse a JSON array of strings, dropping blank entries
fn parse_script_response(raw: &str) -> Result<Vec<String>> {
    let text = strip_code_fences(raw);
    debug!("Parsing script response: {}", text);

    let descriptions: Vec<String> = serde_json::from_str(text).map_err(|e| {
        ScripterError::Service(format!("Failed to parse script response: {}", e))
    })?;

    Ok(descriptions
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::MockTextGenerator;
    use mockall::predicate::*;

    fn generator_returning(response: Result<String>) -> ScriptGenerator {
        let mut text = MockTextGenerator::new();
        text.expect_generate_structured()
            .with(always(), eq(ResponseShape::StringList))
            .times(1)
            .return_once(move |_, _| response);
        ScriptGenerator::new(Arc::new(text))
    }

    #[test]
    fn test_prompt_embeds_idea_and_duration() {
        let prompt = build_script_prompt("  A robot learns to paint ", 2);
        assert!(prompt.contains("Story Idea: \"A robot learns to paint\""));
        assert!(prompt.contains("Target Video Duration: 2 minutes."));
        assert!(prompt.contains("2-4 scenes per minute"));
    }

    #[tokio::test]
    async fn test_generate_script_returns_ordered_scenes() {
        let generator = generator_returning(Ok(
            r#"["The robot finds a brush.", "It paints a sunrise.", "A gallery opens."]"#.to_string(),
        ));

        let scenes = generator.generate_script("A robot learns to paint", 1).await.unwrap();
        assert_eq!(
            scenes,
            ["The robot finds a brush.", "It paints a sunrise.", "A gallery opens."]
        );
    }

    #[tokio::test]
    async fn test_fenced_response_is_accepted() {
        let generator = generator_returning(Ok("```json\n[\"one\"]\n```".to_string()));
        let scenes = generator.generate_script("idea", 1).await.unwrap();
        assert_eq!(scenes, ["one"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_error() {
        let generator = generator_returning(Ok("[]".to_string()));
        let result = generator.generate_script("idea", 1).await;
        assert!(matches!(result, Err(ScripterError::EmptyResult)));

        let generator = generator_returning(Ok(r#"["  ", ""]"#.to_string()));
        let result = generator.generate_script("idea", 1).await;
        assert!(matches!(result, Err(ScripterError::EmptyResult)));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_service_error() {
        let generator = generator_returning(Ok(r#"{"scenes": ["a"]}"#.to_string()));
        let result = generator.generate_script("idea", 1).await;
        assert!(matches!(result, Err(ScripterError::Service(_))));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let generator = generator_returning(Err(ScripterError::Service(
            "Text generation failed with 403 Forbidden: API key not valid".to_string(),
        )));
        let error = generator.generate_script("idea", 1).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Text generation failed with 403 Forbidden: API key not valid"
        );
    }
}
