use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{AspectRatio, VideoConfig};
use crate::error::{Result, ScripterError};
use crate::media::{extension_for_mime, ReferenceImage};
use crate::scene::{SceneId, VideoPhase};
use crate::studio::{FetchedMedia, JobHandle, JobStatus, VideoRequest, VideoService};

/// Everything needed to render one scene
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub scene_id: SceneId,
    pub prompt: String,
    pub image: Arc<ReferenceImage>,
    pub aspect_ratio: AspectRatio,
}

/// Local files produced by a finished job
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifacts {
    pub video: PathBuf,
    pub thumbnail: Option<PathBuf>,
}

impl From<VideoArtifacts> for VideoPhase {
    fn from(artifacts: VideoArtifacts) -> Self {
        VideoPhase::Done {
            video: artifacts.video,
            thumbnail: artifacts.thumbnail,
        }
    }
}

/// Drives submit, poll-until-done and fetch for one scene at a time
///
/// A generator holds no per-job state, so one instance can run any number of
/// jobs concurrently.
pub struct VideoGenerator {
    service: Arc<dyn VideoService>,
    config: VideoConfig,
    output_dir: PathBuf,
}

impl VideoGenerator {
    pub fn new(service: Arc<dyn VideoService>, config: VideoConfig, output_dir: PathBuf) -> Self {
        Self {
            service,
            config,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run a job to completion, reporting each intermediate phase
    pub async fn generate<F>(&self, job: &VideoJob, on_phase: F) -> Result<VideoArtifacts>
    where
        F: Fn(VideoPhase) + Send + Sync,
    {
        info!("Starting video generation for scene {}", job.scene_id);

        on_phase(VideoPhase::Submitting);
        let request = VideoRequest {
            prompt: job.prompt.clone(),
            image: Arc::clone(&job.image),
            aspect_ratio: job.aspect_ratio,
            resolution: self.config.resolution.clone(),
            count: 1,
        };
        let handle = self.service.submit(&request).await?;

        let status = self.poll_until_done(job.scene_id, &handle, &on_phase).await?;

        on_phase(VideoPhase::Fetching);
        let result = status.result.unwrap_or_default();
        let video_uri = result.video_uri.ok_or(ScripterError::MissingResult)?;

        let thumbnail = match result.thumbnail_uri {
            Some(uri) => match self.fetch_thumbnail(job.scene_id, &uri).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not fetch thumbnail for scene {}: {}", job.scene_id, e);
                    None
                }
            },
            None => None,
        };

        let media = self.service.fetch(&video_uri).await?;
        let video = self
            .save(&format!("scene-{}.mp4", job.scene_id), &media)
            .await?;

        info!("Video for scene {} saved to {}", job.scene_id, video.display());
        Ok(VideoArtifacts { video, thumbnail })
    }

    async fn poll_until_done<F>(
        &self,
        scene_id: SceneId,
        handle: &JobHandle,
        on_phase: &F,
    ) -> Result<JobStatus>
    where
        F: Fn(VideoPhase) + Send + Sync,
    {
        let mut attempts = 0;
        loop {
            on_phase(VideoPhase::Polling { attempts });
            if self.config.max_poll_attempts > 0 && attempts >= self.config.max_poll_attempts {
                return Err(ScripterError::Service(format!(
                    "Video generation timed out after {} status checks",
                    attempts
                )));
            }

            sleep(self.config.poll_interval()).await;
            let status = self.service.status(handle).await?;
            attempts += 1;

            if status.done {
                debug!("Job for scene {} done after {} status checks", scene_id, attempts);
                return Ok(status);
            }
            debug!("Job for scene {} still running ({} checks)", scene_id, attempts);
        }
    }

    async fn fetch_thumbnail(&self, scene_id: SceneId, uri: &str) -> Result<PathBuf> {
        let media = self.service.fetch(uri).await?;
        let extension = media
            .mime_type
            .as_deref()
            .map(extension_for_mime)
            .filter(|ext| *ext != "bin")
            .unwrap_or("jpg");
        self.save(&format!("scene-{}-thumbnail.{}", scene_id, extension), &media)
            .await
    }

    /// Write through a temporary file so a partial download never looks finished
    async fn save(&self, file_name: &str, media: &FetchedMedia) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).await?;

        let path = self.output_dir.join(file_name);
        let temp_path = path.with_extension("part");
        fs::write(&temp_path, &media.bytes).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::studio::{MockVideoService, VideoResult};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn job() -> VideoJob {
        VideoJob {
            scene_id: SceneId(7),
            prompt: "A robot paints a sunrise".to_string(),
            image: Arc::new(ReferenceImage {
                file_name: "robot.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
                encoded: "AQID".to_string(),
            }),
            aspect_ratio: AspectRatio::Portrait,
        }
    }

    fn video_config(max_poll_attempts: u32) -> VideoConfig {
        let mut config = Config::default().video;
        config.poll_interval_secs = 0;
        config.max_poll_attempts = max_poll_attempts;
        config
    }

    fn media(bytes: &[u8], mime: &str) -> FetchedMedia {
        FetchedMedia {
            bytes: bytes.to_vec(),
            mime_type: Some(mime.to_string()),
        }
    }

    /// Service that reports done on the given status check
    fn service_done_after(checks: u32, result: VideoResult) -> MockVideoService {
        let mut service = MockVideoService::new();
        service
            .expect_submit()
            .withf(|request| {
                request.count == 1
                    && request.resolution == "720p"
                    && request.aspect_ratio == AspectRatio::Portrait
                    && request.image.mime_type == "image/png"
            })
            .times(1)
            .returning(|_| {
                Ok(JobHandle {
                    name: "models/veo/operations/op-7".to_string(),
                })
            });

        let counter = AtomicU32::new(0);
        service.expect_status().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(JobStatus {
                done: n >= checks,
                result: (n >= checks).then(|| result.clone()),
            })
        });
        service
    }

    #[tokio::test]
    async fn test_job_completes_with_video_and_thumbnail() {
        let temp = tempfile::tempdir().unwrap();
        let mut service = service_done_after(
            3,
            VideoResult {
                video_uri: Some("https://media/video".to_string()),
                thumbnail_uri: Some("https://media/thumb".to_string()),
            },
        );
        service
            .expect_fetch()
            .returning(|uri| match uri {
                "https://media/thumb" => Ok(media(b"png", "image/png")),
                _ => Ok(media(b"mp4 bytes", "video/mp4")),
            });

        let generator = VideoGenerator::new(Arc::new(service), video_config(0), temp.path().to_path_buf());
        let phases = Mutex::new(Vec::new());
        let artifacts = generator
            .generate(&job(), |phase| phases.lock().unwrap().push(phase))
            .await
            .unwrap();

        assert_eq!(artifacts.video, temp.path().join("scene-7.mp4"));
        assert_eq!(std::fs::read(&artifacts.video).unwrap(), b"mp4 bytes");
        let thumbnail = artifacts.thumbnail.unwrap();
        assert_eq!(thumbnail, temp.path().join("scene-7-thumbnail.png"));

        let phases = phases.into_inner().unwrap();
        assert_eq!(phases.first(), Some(&VideoPhase::Submitting));
        assert_eq!(phases.last(), Some(&VideoPhase::Fetching));
        assert!(phases.contains(&VideoPhase::Polling { attempts: 2 }));
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let mut service = service_done_after(
            1,
            VideoResult {
                video_uri: Some("https://media/video".to_string()),
                thumbnail_uri: Some("https://media/thumb".to_string()),
            },
        );
        service.expect_fetch().returning(|uri| match uri {
            "https://media/thumb" => Err(ScripterError::Service("404".to_string())),
            _ => Ok(media(b"mp4", "video/mp4")),
        });

        let generator = VideoGenerator::new(Arc::new(service), video_config(0), temp.path().to_path_buf());
        let artifacts = generator.generate(&job(), |_| {}).await.unwrap();
        assert!(artifacts.thumbnail.is_none());
        assert!(artifacts.video.exists());
    }

    #[tokio::test]
    async fn test_done_without_video_is_missing_result() {
        let temp = tempfile::tempdir().unwrap();
        let mut service = service_done_after(1, VideoResult::default());
        service.expect_fetch().never();

        let generator = VideoGenerator::new(Arc::new(service), video_config(0), temp.path().to_path_buf());
        let result = generator.generate(&job(), |_| {}).await;
        assert!(matches!(result, Err(ScripterError::MissingResult)));
    }

    #[tokio::test]
    async fn test_rejected_submission_fails_without_polling() {
        let temp = tempfile::tempdir().unwrap();
        let mut service = MockVideoService::new();
        service
            .expect_submit()
            .returning(|_| Err(ScripterError::Service("400 Bad Request".to_string())));
        service.expect_status().never();

        let generator = VideoGenerator::new(Arc::new(service), video_config(0), temp.path().to_path_buf());
        let result = generator.generate(&job(), |_| {}).await;
        assert!(matches!(result, Err(ScripterError::Service(_))));
    }

    #[tokio::test]
    async fn test_poll_cap_times_out() {
        let temp = tempfile::tempdir().unwrap();
        let mut service = MockVideoService::new();
        service.expect_submit().returning(|_| {
            Ok(JobHandle {
                name: "op".to_string(),
            })
        });
        service
            .expect_status()
            .times(3)
            .returning(|_| Ok(JobStatus::default()));

        let generator = VideoGenerator::new(Arc::new(service), video_config(3), temp.path().to_path_buf());
        let error = generator.generate(&job(), |_| {}).await.unwrap_err();
        assert!(error.to_string().contains("timed out after 3 status checks"));
    }
}
