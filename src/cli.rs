use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Defaults to an interactive session
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive storyboard session
    Session,

    /// Build a storyboard in one run without prompting
    Generate {
        /// Story idea to turn into scenes
        #[arg(short, long, conflicts_with = "scenes")]
        idea: Option<String>,

        /// Scene descriptions, used instead of generating a script
        #[arg(short, long, num_args = 1..)]
        scenes: Vec<String>,

        /// Character description
        #[arg(short = 'C', long)]
        character: String,

        /// Character reference image (PNG or JPEG)
        #[arg(short = 'I', long)]
        image: PathBuf,

        /// Target video duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,

        /// Aspect ratio: 16:9 (landscape) or 9:16 (portrait)
        #[arg(short, long)]
        aspect: Option<String>,

        /// Language for messages and the summary (en, vi)
        #[arg(short, long)]
        language: Option<String>,

        /// Directory for downloaded videos
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Stop after prompt generation
        #[arg(long)]
        skip_videos: bool,
    },

    /// Store the API key for later sessions
    Login {
        /// Google AI Studio API key
        #[arg(short, long)]
        key: String,
    },

    /// Remove the stored API key
    Logout,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination (default: ./veo-scripter.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
