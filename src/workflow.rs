use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::render::render_summary;
use crate::app::{AppController, AppState, Command, Notice, VideoTarget};
use crate::error::{Result, ScripterError};
use crate::i18n::Translator;
use crate::scene::{SceneId, VideoPhase};

/// Inputs for a non-interactive run
#[derive(Debug, Clone)]
pub struct StoryboardRequest {
    pub character: String,
    pub image: PathBuf,
    /// Generate the scene list from this idea
    pub idea: Option<String>,
    /// Used as-is when no idea is given
    pub scenes: Vec<String>,
    pub skip_videos: bool,
}

/// Batch driver: feeds the controller the same commands a user would type
pub struct Workflow {
    controller: AppController,
    progress: MultiProgress,
}

impl Workflow {
    pub fn new(controller: AppController) -> Self {
        Self {
            controller,
            progress: MultiProgress::new(),
        }
    }

    /// Run every step and return the rendered storyboard summary
    ///
    /// Script and prompt failures abort the run. Failed video jobs only show
    /// up in the summary.
    pub async fn run(&mut self, request: &StoryboardRequest) -> Result<String> {
        info!("Starting storyboard workflow");

        self.step(Command::Character(request.character.clone())).await?;
        self.step(Command::Image(request.image.clone())).await?;

        match &request.idea {
            Some(idea) => {
                self.step(Command::Idea(idea.clone())).await?;
                self.step(Command::Script).await?;
                let spinner = self.spinner("Generating script...");
                self.wait_for_global_action().await?;
                spinner.finish_and_clear();
            }
            None => self.load_scenes(&request.scenes).await?,
        }

        self.step(Command::Prompts).await?;
        let spinner = self.spinner("Generating prompts...");
        self.wait_for_global_action().await?;
        spinner.finish_and_clear();

        if request.skip_videos {
            info!("Skipping video generation");
        } else {
            self.step(Command::Video(VideoTarget::All)).await?;
            self.wait_for_videos().await;
        }

        info!("Storyboard workflow completed");
        Ok(render_summary(self.controller.state()))
    }

    pub fn state(&self) -> &AppState {
        self.controller.state()
    }

    async fn load_scenes(&mut self, scenes: &[String]) -> Result<()> {
        if scenes.is_empty() {
            return Err(ScripterError::Validation(
                "Provide either a story idea or at least one scene description".to_string(),
            ));
        }

        for (index, description) in scenes.iter().enumerate() {
            if index > 0 {
                self.step(Command::AddScene).await?;
            }
            self.step(Command::DescribeScene(index + 1, description.clone()))
                .await?;
        }
        Ok(())
    }

    /// Execute one command; any alert it raises ends the run
    async fn step(&mut self, command: Command) -> Result<()> {
        self.controller.execute(command).await;
        self.check_notices()
    }

    fn check_notices(&mut self) -> Result<()> {
        for notice in self.controller.take_notices() {
            match notice {
                Notice::Info(text) => info!("{}", text),
                Notice::Alert(text) => return Err(ScripterError::Service(text)),
            }
        }
        Ok(())
    }

    async fn wait_for_global_action(&mut self) -> Result<()> {
        while self.controller.state().busy.is_some() {
            let Some(event) = self.controller.next_event().await else {
                break;
            };
            self.controller.handle_event(event);
        }
        self.check_notices()
    }

    async fn wait_for_videos(&mut self) {
        let translator = self.controller.state().translator();
        let mut bars: HashMap<SceneId, ProgressBar> = HashMap::new();
        for (index, scene) in self.controller.state().scenes.iter().enumerate() {
            if scene.is_loading() {
                let label = translator.t_with("sceneTitle", &[("index", &(index + 1))]);
                bars.insert(scene.id, self.spinner(&label));
            }
        }

        while self.controller.state().any_video_loading() {
            let Some(event) = self.controller.next_event().await else {
                break;
            };
            self.controller.handle_event(event);

            for scene in self.controller.state().scenes.iter() {
                if let Some(bar) = bars.get(&scene.id) {
                    bar.set_message(phase_message(&translator, &scene.video));
                }
            }
        }

        for bar in bars.values() {
            bar.finish();
        }
        for notice in self.controller.take_notices() {
            match notice {
                Notice::Info(text) => info!("{}", text),
                Notice::Alert(text) => warn!("{}", text),
            }
        }
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed}] {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_prefix(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

fn phase_message(translator: &Translator, phase: &VideoPhase) -> String {
    match phase {
        VideoPhase::Idle => String::new(),
        VideoPhase::Submitting => translator.t("videoPhaseSubmitting"),
        VideoPhase::Polling { attempts } => {
            format!("{} ({})", translator.t("videoPhasePolling"), attempts)
        }
        VideoPhase::Fetching => translator.t("videoPhaseFetching"),
        VideoPhase::Done { video, .. } => video.display().to_string(),
        VideoPhase::Failed { .. } => translator.t("videoFailed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::i18n::Language;
    use crate::studio::{
        FetchedMedia, JobHandle, JobStatus, MockTextGenerator, MockVideoService, ResponseShape,
        ServiceFactory, Services, VideoResult,
    };
    use assert_fs::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedFactory(Services);

    impl ServiceFactory for FixedFactory {
        fn connect(&self, _api_key: &str) -> Result<Services> {
            Ok(self.0.clone())
        }
    }

    fn workflow(text: MockTextGenerator, video: MockVideoService, dir: &assert_fs::TempDir) -> Workflow {
        let mut config = Config::default();
        config.session.language = Language::En;
        config.video.poll_interval_secs = 0;
        let services = Services {
            text: Arc::new(text),
            video: Arc::new(video),
        };
        let controller = AppController::new(
            config,
            Arc::new(FixedFactory(services)),
            None,
            Some("key".to_string()),
            dir.path().join("output"),
        )
        .unwrap();
        Workflow::new(controller)
    }

    fn request(dir: &assert_fs::TempDir) -> StoryboardRequest {
        let image = dir.child("robot.jpg");
        image.write_binary(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        StoryboardRequest {
            character: "A small robot with a red scarf".to_string(),
            image: image.path().to_path_buf(),
            idea: None,
            scenes: vec!["The robot wakes up".to_string(), "The robot paints".to_string()],
            skip_videos: false,
        }
    }

    /// Answers the prompt request by echoing every scene id found in it
    fn prompt_echo() -> MockTextGenerator {
        let mut text = MockTextGenerator::new();
        text.expect_generate_structured()
            .withf(|_, shape| *shape == ResponseShape::ScenePrompts)
            .returning(|prompt, _| {
                let entries: Vec<serde_json::Value> = prompt
                    .lines()
                    .filter_map(|line| line.strip_prefix("Scene ID "))
                    .filter_map(|rest| rest.split(':').next())
                    .map(|id| serde_json::json!({"id": id.parse::<u64>().unwrap(), "prompt": format!("prompt {}", id)}))
                    .collect();
                Ok(serde_json::to_string(&entries).unwrap())
            });
        text
    }

    #[tokio::test]
    async fn test_scenes_to_prompts_without_videos() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut video = MockVideoService::new();
        video.expect_submit().never();
        let mut workflow = workflow(prompt_echo(), video, &dir);
        let mut request = request(&dir);
        request.skip_videos = true;

        let summary = workflow.run(&request).await.unwrap();
        assert!(summary.contains("Scene 2\n  The robot paints"));
        assert!(workflow
            .state()
            .scenes
            .iter()
            .all(|scene| scene.generated_prompt.starts_with("prompt ")));
    }

    #[tokio::test]
    async fn test_video_failures_do_not_abort_the_run() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut video = MockVideoService::new();
        video.expect_submit().times(2).returning(|request| {
            Ok(JobHandle {
                name: request.prompt.clone(),
            })
        });
        // The first finished job comes back without a video
        let checks = AtomicU32::new(0);
        video.expect_status().returning(move |handle| {
            let first = checks.fetch_add(1, Ordering::SeqCst) == 0;
            Ok(JobStatus {
                done: true,
                result: Some(VideoResult {
                    video_uri: (!first).then(|| format!("https://media/{}", handle.name)),
                    thumbnail_uri: None,
                }),
            })
        });
        video.expect_fetch().returning(|_| {
            Ok(FetchedMedia {
                bytes: b"mp4".to_vec(),
                mime_type: Some("video/mp4".to_string()),
            })
        });

        let mut workflow = workflow(prompt_echo(), video, &dir);
        let summary = workflow.run(&request(&dir)).await.unwrap();

        assert!(summary.contains("Video: "));
        assert!(summary.contains("Video Generation Failed: "));
        let state = workflow.state();
        assert!(!state.any_video_loading());
        assert_eq!(state.scenes.iter().filter(|s| s.video_url().is_some()).count(), 1);
        assert_eq!(state.scenes.iter().filter(|s| s.error().is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_missing_scenes_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut text = MockTextGenerator::new();
        text.expect_generate_structured().never();
        let mut workflow = workflow(text, MockVideoService::new(), &dir);
        let mut request = request(&dir);
        request.scenes.clear();

        let result = workflow.run(&request).await;
        assert!(matches!(result, Err(ScripterError::Validation(_))));
    }

    #[tokio::test]
    async fn test_script_failure_aborts() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut text = MockTextGenerator::new();
        text.expect_generate_structured()
            .withf(|_, shape| *shape == ResponseShape::StringList)
            .returning(|_, _| Err(ScripterError::Service("quota exceeded".to_string())));
        let mut workflow = workflow(text, MockVideoService::new(), &dir);
        let mut request = request(&dir);
        request.idea = Some("A robot learns to paint".to_string());

        let error = workflow.run(&request).await.unwrap_err();
        assert!(error.to_string().contains("quota exceeded"));
    }
}
