use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable scene identity, the only key used to correlate asynchronous results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of the video job attached to a scene
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VideoPhase {
    #[default]
    Idle,
    Submitting,
    Polling {
        attempts: u32,
    },
    Fetching,
    Done {
        video: PathBuf,
        thumbnail: Option<PathBuf>,
    },
    Failed {
        error: String,
    },
}

impl VideoPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling { .. } | Self::Fetching)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    pub description: String,
    pub generated_prompt: String,
    pub video: VideoPhase,
}

impl Scene {
    fn blank(id: SceneId) -> Self {
        Self {
            id,
            description: String::new(),
            generated_prompt: String::new(),
            video: VideoPhase::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.video.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.video {
            VideoPhase::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn video_url(&self) -> Option<&Path> {
        match &self.video {
            VideoPhase::Done { video, .. } => Some(video),
            _ => None,
        }
    }

    pub fn thumbnail_url(&self) -> Option<&Path> {
        match &self.video {
            VideoPhase::Done { thumbnail, .. } => thumbnail.as_deref(),
            _ => None,
        }
    }

    /// Whether the storyboard has anything to show for this scene
    pub fn has_output(&self) -> bool {
        !self.generated_prompt.is_empty() || self.video_url().is_some() || self.is_loading()
    }
}

/// Time-based id source that never hands out the same value twice
#[derive(Debug, Default)]
struct IdMinter {
    last: u64,
}

impl IdMinter {
    fn mint(&mut self) -> SceneId {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let next = now.max(self.last + 1);
        self.last = next;
        SceneId(next)
    }
}

/// Ordered scene collection owned by the session
#[derive(Debug)]
pub struct SceneList {
    scenes: Vec<Scene>,
    ids: IdMinter,
}

impl Default for SceneList {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneList {
    /// A list holding one blank scene, the state of a fresh session
    pub fn new() -> Self {
        let mut list = Self {
            scenes: Vec::new(),
            ids: IdMinter::default(),
        };
        list.add();
        list
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn as_slice(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn get(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    pub fn position(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// Id of the scene at a zero-based position
    pub fn id_at(&self, index: usize) -> Option<SceneId> {
        self.scenes.get(index).map(|s| s.id)
    }

    pub fn any_loading(&self) -> bool {
        self.scenes.iter().any(Scene::is_loading)
    }

    /// Append a blank scene and return its id
    pub fn add(&mut self) -> SceneId {
        let id = self.ids.mint();
        self.scenes.push(Scene::blank(id));
        id
    }

    /// Remove a scene; unknown ids leave the list untouched
    pub fn remove(&mut self, id: SceneId) -> bool {
        let before = self.scenes.len();
        self.scenes.retain(|s| s.id != id);
        self.scenes.len() != before
    }

    pub fn update_description(&mut self, id: SceneId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(scene) => {
                scene.description = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn update_prompt(&mut self, id: SceneId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(scene) => {
                scene.generated_prompt = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_phase(&mut self, id: SceneId, phase: VideoPhase) -> bool {
        match self.get_mut(id) {
            Some(scene) => {
                scene.video = phase;
                true
            }
            None => false,
        }
    }

    /// Take the dragged scene out and insert it at the index the target held
    pub fn reorder(&mut self, dragged: SceneId, target: SceneId) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(dragged), self.position(target)) else {
            return false;
        };

        let scene = self.scenes.remove(from);
        self.scenes.insert(to, scene);
        true
    }

    /// Replace every scene with fresh ones built from generated descriptions
    pub fn replace_all<I, S>(&mut self, descriptions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scenes = Vec::new();
        for description in descriptions {
            let mut scene = Scene::blank(self.ids.mint());
            scene.description = description.into();
            scenes.push(scene);
        }
        self.scenes = scenes;
    }

    /// Set prompts for every listed scene; ids not in the list are ignored
    pub fn apply_prompts(&mut self, prompts: &HashMap<SceneId, String>) -> usize {
        let mut updated = 0;
        for scene in &mut self.scenes {
            if let Some(prompt) = prompts.get(&scene.id) {
                scene.generated_prompt = prompt.clone();
                updated += 1;
            }
        }
        updated
    }
}
