//! Veo Scripter - character-consistent video storyboards
//!
//! Turns a character description, a reference image and a story idea into a
//! scene-by-scene storyboard: Gemini writes the script and the per-scene video
//! prompts, Veo renders one clip per scene.

pub mod app;
pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod i18n;
pub mod media;
pub mod prompt;
pub mod scene;
pub mod script;
pub mod studio;
pub mod video;
pub mod workflow;
