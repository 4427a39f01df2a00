use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use super::command::{Command, ParseError, VideoTarget};
use super::render;
use super::state::{AppState, GlobalAction, Screen, SessionSettings};
use crate::config::{AspectRatio, Config};
use crate::credential::CredentialStore;
use crate::error::{Result, ScripterError};
use crate::i18n::Language;
use crate::media;
use crate::prompt::{self, PromptGenerator};
use crate::scene::{SceneId, VideoPhase};
use crate::script::ScriptGenerator;
use crate::studio::{ServiceFactory, Services};
use crate::video::{VideoArtifacts, VideoGenerator, VideoJob};

/// Results delivered by background tasks
#[derive(Debug)]
pub enum AppEvent {
    ScriptFinished(Result<Vec<String>>),
    PromptsFinished(Result<HashMap<SceneId, String>>),
    VideoPhaseChanged {
        scene_id: SceneId,
        phase: VideoPhase,
    },
    VideoFinished {
        scene_id: SceneId,
        result: Result<VideoArtifacts>,
    },
}

/// Message for the user produced while handling input or events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    /// Blocking problem the user has to act on
    Alert(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the session state and applies commands and background events to it
///
/// Network work is spawned onto the runtime; the tasks never touch the state
/// and only report back through the event channel.
pub struct AppController {
    state: AppState,
    config: Config,
    factory: Arc<dyn ServiceFactory>,
    services: Option<Services>,
    credentials: Option<CredentialStore>,
    output_dir: PathBuf,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    notices: Vec<Notice>,
}

impl AppController {
    pub fn new(
        config: Config,
        factory: Arc<dyn ServiceFactory>,
        credentials: Option<CredentialStore>,
        credential: Option<String>,
        output_dir: PathBuf,
    ) -> Result<Self> {
        let services = match credential.as_deref() {
            Some(key) => Some(factory.connect(key)?),
            None => None,
        };
        let settings = SessionSettings::from(&config.session);
        let (events_tx, events_rx) = unbounded_channel();

        Ok(Self {
            state: AppState::new(settings, credential),
            config,
            factory,
            services,
            credentials,
            output_dir,
            events_tx,
            events_rx,
            notices: Vec::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render(&self) -> String {
        render::render(&self.state)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether a global action or any video job is still running
    pub fn has_pending_work(&self) -> bool {
        self.state.busy.is_some() || self.state.any_video_loading()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    fn info(&mut self, key: &str, params: &[(&str, &dyn std::fmt::Display)]) {
        let text = self.state.translator().t_with(key, params);
        self.notices.push(Notice::Info(text));
    }

    fn alert(&mut self, key: &str, params: &[(&str, &dyn std::fmt::Display)]) {
        let text = self.state.translator().t_with(key, params);
        self.notices.push(Notice::Alert(text));
    }

    /// `"{message} {hint}"` as shown for every service failure
    fn failure_message(&self, error: &ScripterError) -> String {
        format!("{} {}", error, self.state.translator().t("apiKeyErrorHint"))
    }

    fn alert_failure(&mut self, error: &ScripterError) {
        let message = self.failure_message(error);
        self.alert("genericError", &[("message", &message)]);
    }

    fn guard(&mut self, allowed: bool) -> bool {
        if !allowed {
            self.alert("actionUnavailable", &[]);
        }
        allowed
    }

    /// Services for a generation action, or a redirect to the credential screen
    fn require_services(&mut self) -> Option<Services> {
        match &self.services {
            Some(services) => Some(services.clone()),
            None => {
                self.alert("apiKeyRequiredError", &[]);
                self.state.screen = Screen::CredentialEntry;
                None
            }
        }
    }

    fn scene_at(&mut self, position: usize) -> Option<SceneId> {
        let id = position.checked_sub(1).and_then(|index| self.state.scenes.id_at(index));
        if id.is_none() {
            self.alert("unknownScene", &[("index", &position)]);
        }
        id
    }

    fn display_index(&self, id: SceneId) -> usize {
        self.state.scenes.position(id).map(|p| p + 1).unwrap_or_default()
    }

    // --- input ---

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let parsed = line.parse::<Command>();

        if self.state.screen == Screen::CredentialEntry {
            return match parsed {
                Ok(Command::Quit) => Flow::Quit,
                Ok(Command::Language(language)) => {
                    self.set_language(language);
                    Flow::Continue
                }
                Ok(Command::Key(key)) => {
                    self.save_credential(&key);
                    Flow::Continue
                }
                Ok(_) => {
                    self.alert("apiKeyRequiredError", &[]);
                    Flow::Continue
                }
                Err(_) => {
                    self.save_credential(line);
                    Flow::Continue
                }
            };
        }

        match parsed {
            Ok(command) => self.execute(command).await,
            Err(ParseError::Empty) => Flow::Continue,
            Err(ParseError::Unknown(command)) => {
                self.alert("unknownCommand", &[("command", &command)]);
                Flow::Continue
            }
            Err(ParseError::Invalid { command, value }) => {
                self.alert("invalidArgument", &[("command", &command), ("value", &value)]);
                Flow::Continue
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        debug!("Executing {:?}", command);

        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => {
                self.info("helpText", &[]);
            }
            Command::Show => {}
            Command::ChangeKey => self.state.screen = Screen::CredentialEntry,
            Command::Key(key) => self.save_credential(&key),
            Command::Character(text) => self.set_character(&text),
            Command::Image(path) => self.load_image(&path).await,
            Command::Duration(minutes) => self.set_duration(minutes),
            Command::Aspect(aspect_ratio) => self.set_aspect_ratio(aspect_ratio),
            Command::Language(language) => self.set_language(language),
            Command::Idea(text) => self.set_story_idea(&text),
            Command::Script => self.start_script_generation(),
            Command::AddScene => self.add_scene(),
            Command::RemoveScene(position) => self.remove_scene(position),
            Command::DescribeScene(position, text) => self.describe_scene(position, &text),
            Command::EditPrompt(position, text) => self.edit_prompt(position, &text),
            Command::MoveScene(from, to) => self.move_scene(from, to),
            Command::Prompts => self.start_prompt_generation(),
            Command::Video(VideoTarget::Scene(position)) => self.start_video(position),
            Command::Video(VideoTarget::All) => self.start_all_videos(),
        }

        Flow::Continue
    }

    // --- credential ---

    pub fn save_credential(&mut self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            self.alert("apiKeyRequiredError", &[]);
            return;
        }

        match self.factory.connect(key) {
            Ok(services) => {
                self.services = Some(services);
                self.state.credential = Some(key.to_string());
                self.state.screen = Screen::Editor;

                if let Some(store) = &self.credentials {
                    if let Err(e) = store.save(key) {
                        warn!("Could not persist API key: {}", e);
                    }
                }
                self.info("apiKeySaved", &[]);
            }
            Err(e) => {
                error!("Failed to set up API client: {}", e);
                self.alert_failure(&e);
            }
        }
    }

    // --- left panel ---

    pub fn set_character(&mut self, text: &str) {
        if self.guard(!self.state.is_form_disabled()) {
            self.state.character.description = text.to_string();
        }
    }

    /// A failed read leaves the session without a reference image
    pub async fn load_image(&mut self, path: &Path) {
        if !self.guard(!self.state.is_form_disabled()) {
            return;
        }

        match media::encode_image(path).await {
            Ok(image) => {
                let name = image.file_name.clone();
                self.state.character.image = Some(Arc::new(image));
                self.info("imageLoaded", &[("name", &name)]);
            }
            Err(e) => {
                error!("Error encoding reference image: {}", e);
                self.state.character.image = None;
                self.alert("imageReadError", &[("message", &e)]);
            }
        }
    }

    pub fn set_duration(&mut self, minutes: u32) {
        if self.guard(!self.state.is_form_disabled()) {
            self.state.set_duration(minutes);
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        if self.guard(!self.state.is_form_disabled()) {
            self.state.settings.aspect_ratio = aspect_ratio;
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.state.settings.language = language;
    }

    pub fn set_story_idea(&mut self, text: &str) {
        let locked = self.state.is_form_disabled()
            || self.state.is_generating(GlobalAction::ScriptGeneration);
        if self.guard(!locked) {
            self.state.story_idea = text.to_string();
        }
    }

    // --- scenes ---

    pub fn add_scene(&mut self) {
        if self.guard(!self.state.is_form_disabled()) {
            self.state.scenes.add();
        }
    }

    pub fn remove_scene(&mut self, position: usize) {
        if self.state.scenes.len() <= 1 {
            self.alert("minimumSceneError", &[]);
            return;
        }
        if !self.guard(self.state.can_remove_scene()) {
            return;
        }
        if let Some(id) = self.scene_at(position) {
            self.state.scenes.remove(id);
        }
    }

    pub fn describe_scene(&mut self, position: usize, text: &str) {
        if !self.guard(!self.state.is_form_disabled()) {
            return;
        }
        if let Some(id) = self.scene_at(position) {
            self.state.scenes.update_description(id, text);
        }
    }

    pub fn edit_prompt(&mut self, position: usize, text: &str) {
        if !self.guard(self.state.can_edit_prompts()) {
            return;
        }
        if let Some(id) = self.scene_at(position) {
            self.state.scenes.update_prompt(id, text);
        }
    }

    pub fn move_scene(&mut self, from: usize, to: usize) {
        if !self.guard(self.state.can_reorder()) {
            return;
        }
        let Some(dragged) = self.scene_at(from) else {
            return;
        };
        let Some(target) = self.scene_at(to) else {
            return;
        };
        self.state.scenes.reorder(dragged, target);
    }

    // --- generation ---

    pub fn start_script_generation(&mut self) {
        if !self.guard(self.state.script_generation_enabled()) {
            return;
        }
        if self.state.story_idea.trim().is_empty() {
            self.alert("storyIdeaRequiredError", &[]);
            return;
        }
        let Some(services) = self.require_services() else {
            return;
        };

        self.state.busy = Some(GlobalAction::ScriptGeneration);
        let idea = self.state.story_idea.clone();
        let duration = self.state.settings.duration_minutes;
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let generator = ScriptGenerator::new(services.text);
            let result = generator.generate_script(&idea, duration).await;
            let _ = tx.send(AppEvent::ScriptFinished(result));
        });
    }

    pub fn start_prompt_generation(&mut self) {
        if !self.guard(self.state.prompt_generation_enabled()) {
            return;
        }
        if prompt::validate_inputs(&self.state.character, self.state.scenes.as_slice()).is_err() {
            self.alert("formValidationError", &[]);
            return;
        }
        let Some(services) = self.require_services() else {
            return;
        };

        self.state.busy = Some(GlobalAction::PromptGeneration);
        let character = self.state.character.clone();
        let scenes = self.state.scenes.as_slice().to_vec();
        let duration = self.state.settings.duration_minutes;
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let generator = PromptGenerator::new(services.text);
            let result = generator.generate_prompts(&character, &scenes, duration).await;
            let _ = tx.send(AppEvent::PromptsFinished(result));
        });
    }

    pub fn start_video(&mut self, position: usize) {
        let Some(id) = self.scene_at(position) else {
            return;
        };
        let Some(scene) = self.state.scenes.get(id) else {
            return;
        };
        if scene.is_loading() || !self.state.video_generation_enabled() {
            self.alert("actionUnavailable", &[]);
            return;
        }
        let prompt = scene.generated_prompt.clone();
        let (Some(image), false) = (self.state.character.image.clone(), prompt.trim().is_empty())
        else {
            self.alert("videoPromptRequiredError", &[("index", &position)]);
            return;
        };
        let Some(services) = self.require_services() else {
            return;
        };

        // Entering Submitting clears any previous failure
        self.state.scenes.set_phase(id, VideoPhase::Submitting);

        let job = VideoJob {
            scene_id: id,
            prompt,
            image,
            aspect_ratio: self.state.settings.aspect_ratio,
        };
        let generator = VideoGenerator::new(
            services.video,
            self.config.video.clone(),
            self.output_dir.clone(),
        );
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let phase_tx = tx.clone();
            let result = generator
                .generate(&job, |phase| {
                    let _ = phase_tx.send(AppEvent::VideoPhaseChanged {
                        scene_id: job.scene_id,
                        phase,
                    });
                })
                .await;
            let _ = tx.send(AppEvent::VideoFinished {
                scene_id: job.scene_id,
                result,
            });
        });

        self.info("videoStarted", &[("index", &position)]);
    }

    /// Start every scene that has a prompt and no job in flight
    pub fn start_all_videos(&mut self) {
        if !self.guard(self.state.video_generation_enabled()) {
            return;
        }
        let ready: Vec<usize> = self
            .state
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, scene)| !scene.is_loading() && !scene.generated_prompt.trim().is_empty())
            .map(|(index, _)| index + 1)
            .collect();

        if ready.is_empty() || self.state.character.image.is_none() {
            self.alert("videoPromptRequiredError", &[("index", &1)]);
            return;
        }
        if self.require_services().is_none() {
            return;
        }

        for position in ready {
            self.start_video(position);
        }
    }

    // --- events ---

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScriptFinished(result) => {
                self.state.busy = None;
                match result {
                    Ok(descriptions) => {
                        let count = descriptions.len();
                        self.state.scenes.replace_all(descriptions);
                        info!("Scene list replaced with {} generated scenes", count);
                        self.info("scriptGenerated", &[("count", &count)]);
                    }
                    Err(e) => {
                        error!("An error occurred during script generation: {}", e);
                        self.alert_failure(&e);
                    }
                }
            }
            AppEvent::PromptsFinished(result) => {
                self.state.busy = None;
                match result {
                    Ok(prompts) => {
                        let updated = self.state.scenes.apply_prompts(&prompts);
                        info!("Applied prompts to {} scenes", updated);
                        self.info("promptsGenerated", &[]);
                    }
                    Err(ScripterError::Validation(reason)) => {
                        warn!("Prompt generation rejected: {}", reason);
                        self.alert("formValidationError", &[]);
                    }
                    Err(e) => {
                        error!("An error occurred during prompt generation: {}", e);
                        self.alert_failure(&e);
                    }
                }
            }
            AppEvent::VideoPhaseChanged { scene_id, phase } => {
                self.state.scenes.set_phase(scene_id, phase);
            }
            AppEvent::VideoFinished { scene_id, result } => {
                let index = self.display_index(scene_id);
                match result {
                    Ok(artifacts) => {
                        let path = artifacts.video.display().to_string();
                        self.state.scenes.set_phase(scene_id, artifacts.into());
                        self.info("videoReady", &[("index", &index), ("path", &path)]);
                    }
                    Err(e) => {
                        error!("Error generating video for scene {}: {}", scene_id, e);
                        let message = self.failure_message(&e);
                        self.state.scenes.set_phase(
                            scene_id,
                            VideoPhase::Failed {
                                error: message.clone(),
                            },
                        );
                        self.alert("videoJobFailed", &[("index", &index), ("message", &message)]);
                    }
                }
            }
        }
    }
}
