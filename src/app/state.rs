use crate::config::{AspectRatio, SessionConfig};
use crate::i18n::{Language, Translator};
use crate::media::CharacterProfile;
use crate::prompt;
use crate::scene::SceneList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Gates everything else until a key is saved
    CredentialEntry,
    Editor,
}

/// Session-wide operation; at most one runs at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    ScriptGeneration,
    PromptGeneration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub duration_minutes: u32,
    pub aspect_ratio: AspectRatio,
    pub language: Language,
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            duration_minutes: config.duration_minutes.max(1),
            aspect_ratio: config.aspect_ratio,
            language: config.language,
        }
    }
}

/// Everything the session knows, owned by the controller
#[derive(Debug)]
pub struct AppState {
    pub credential: Option<String>,
    pub screen: Screen,
    pub character: CharacterProfile,
    pub story_idea: String,
    pub scenes: SceneList,
    pub settings: SessionSettings,
    pub busy: Option<GlobalAction>,
}

impl AppState {
    pub fn new(settings: SessionSettings, credential: Option<String>) -> Self {
        let screen = if credential.is_some() {
            Screen::Editor
        } else {
            Screen::CredentialEntry
        };

        Self {
            credential,
            screen,
            character: CharacterProfile::default(),
            story_idea: String::new(),
            scenes: SceneList::new(),
            settings,
            busy: None,
        }
    }

    pub fn translator(&self) -> Translator {
        Translator::new(self.settings.language)
    }

    pub fn any_video_loading(&self) -> bool {
        self.scenes.any_loading()
    }

    /// Form inputs lock while prompts are generating or any video job runs
    pub fn is_form_disabled(&self) -> bool {
        self.busy == Some(GlobalAction::PromptGeneration) || self.any_video_loading()
    }

    pub fn is_generating(&self, action: GlobalAction) -> bool {
        self.busy == Some(action)
    }

    /// Script generation is available, ignoring the story idea itself
    pub fn script_generation_enabled(&self) -> bool {
        !self.is_form_disabled() && self.busy.is_none()
    }

    pub fn can_generate_script(&self) -> bool {
        self.script_generation_enabled() && !self.story_idea.trim().is_empty()
    }

    /// Prompt generation is available, ignoring input completeness
    pub fn prompt_generation_enabled(&self) -> bool {
        !self.is_form_disabled() && self.busy.is_none()
    }

    pub fn can_generate_prompts(&self) -> bool {
        self.prompt_generation_enabled()
            && prompt::validate_inputs(&self.character, self.scenes.as_slice()).is_ok()
    }

    pub fn can_remove_scene(&self) -> bool {
        !self.is_form_disabled() && self.scenes.len() > 1
    }

    pub fn can_reorder(&self) -> bool {
        !self.any_video_loading()
    }

    pub fn can_edit_prompts(&self) -> bool {
        !self.any_video_loading()
    }

    /// A finished script replaces every scene, so no job may start meanwhile
    pub fn video_generation_enabled(&self) -> bool {
        !self.is_generating(GlobalAction::ScriptGeneration)
    }

    pub fn set_duration(&mut self, minutes: u32) {
        self.settings.duration_minutes = minutes.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ReferenceImage;
    use crate::scene::VideoPhase;
    use std::sync::Arc;

    fn settings() -> SessionSettings {
        SessionSettings {
            duration_minutes: 1,
            aspect_ratio: AspectRatio::Landscape,
            language: Language::En,
        }
    }

    fn ready_state() -> AppState {
        let mut state = AppState::new(settings(), Some("key".to_string()));
        state.character.description = "A robot".to_string();
        state.character.image = Some(Arc::new(ReferenceImage {
            file_name: "robot.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1],
            encoded: "AQ==".to_string(),
        }));
        let id = state.scenes.id_at(0).unwrap();
        state.scenes.update_description(id, "The robot wakes up");
        state
    }

    #[test]
    fn test_screen_follows_credential() {
        assert_eq!(AppState::new(settings(), None).screen, Screen::CredentialEntry);
        assert_eq!(AppState::new(settings(), Some("k".into())).screen, Screen::Editor);
    }

    #[test]
    fn test_duration_floor() {
        let mut state = AppState::new(settings(), None);
        state.set_duration(0);
        assert_eq!(state.settings.duration_minutes, 1);
        state.set_duration(4);
        assert_eq!(state.settings.duration_minutes, 4);
    }

    #[test]
    fn test_prompt_generation_requires_complete_inputs() {
        let mut state = ready_state();
        assert!(state.can_generate_prompts());

        state.scenes.add();
        assert!(!state.can_generate_prompts());
        assert!(state.prompt_generation_enabled());
    }

    #[test]
    fn test_video_loading_locks_form() {
        let mut state = ready_state();
        state.scenes.add();
        assert!(state.can_remove_scene());

        let id = state.scenes.id_at(0).unwrap();
        state.scenes.set_phase(id, VideoPhase::Submitting);
        assert!(state.is_form_disabled());
        assert!(!state.can_remove_scene());
        assert!(!state.can_reorder());
        assert!(!state.can_edit_prompts());
        assert!(!state.script_generation_enabled());
    }

    #[test]
    fn test_busy_flag_is_exclusive() {
        let mut state = ready_state();
        state.story_idea = "A robot learns to paint".to_string();

        state.busy = Some(GlobalAction::ScriptGeneration);
        assert!(!state.can_generate_script());
        assert!(!state.can_generate_prompts());
        assert!(!state.is_form_disabled());

        state.busy = Some(GlobalAction::PromptGeneration);
        assert!(state.is_form_disabled());
        assert!(state.can_reorder());
    }

    #[test]
    fn test_script_generation_blocks_video_jobs() {
        let mut state = ready_state();
        assert!(state.video_generation_enabled());

        state.busy = Some(GlobalAction::ScriptGeneration);
        assert!(!state.video_generation_enabled());

        state.busy = Some(GlobalAction::PromptGeneration);
        assert!(state.video_generation_enabled());
    }

    #[test]
    fn test_single_scene_cannot_be_removed() {
        let state = ready_state();
        assert_eq!(state.scenes.len(), 1);
        assert!(!state.can_remove_scene());
    }
}
