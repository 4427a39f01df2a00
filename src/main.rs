//! Veo Scripter - character-consistent video storyboards
//!
//! Entry point: parses arguments, sets up logging, loads configuration and
//! runs either the interactive session or one of the one-shot commands.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use veo_scripter::app::{AppController, AppEvent, Flow, Notice};
use veo_scripter::cli::{Args, Commands, ConfigAction};
use veo_scripter::config::Config;
use veo_scripter::credential::{resolve_startup_key, CredentialStore, API_KEY_ENV};
use veo_scripter::i18n::Translator;
use veo_scripter::studio::GeminiServiceFactory;
use veo_scripter::workflow::{StoryboardRequest, Workflow};

const DEFAULT_CONFIG_FILE: &str = "veo-scripter.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;
    let store = CredentialStore::new(CredentialStore::default_location());

    match args.command.unwrap_or(Commands::Session) {
        Commands::Session => run_session(config, store).await?,
        Commands::Generate {
            idea,
            scenes,
            character,
            image,
            duration,
            aspect,
            language,
            output_dir,
            skip_videos,
        } => {
            apply_session_overrides(
                &mut config,
                SessionOverrides {
                    duration,
                    aspect,
                    language,
                    output_dir,
                },
            )?;

            let credential = resolve_startup_key(&store)?.ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key found. Run `veo-scripter login --key <KEY>` or set {}",
                    API_KEY_ENV
                )
            })?;

            let output_dir = session_output_dir(&config);
            info!("Writing videos to {}", output_dir.display());
            let factory = Arc::new(GeminiServiceFactory::new(config.gemini.clone()));
            let controller = AppController::new(config, factory, None, Some(credential), output_dir)?;

            let request = StoryboardRequest {
                character,
                image,
                idea,
                scenes,
                skip_videos,
            };
            let summary = Workflow::new(controller).run(&request).await?;
            println!("{}", summary);
        }
        Commands::Login { key } => {
            let translator = Translator::new(config.session.language);
            if key.trim().is_empty() {
                anyhow::bail!(translator.t("apiKeyRequiredError"));
            }
            store.save(&key)?;
            println!("{}", translator.t("apiKeySaved"));
        }
        Commands::Logout => {
            let translator = Translator::new(config.session.language);
            if store.clear()? {
                println!("{}", translator.t("credentialCleared"));
            } else {
                println!("No stored API key at {}", store.path().display());
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { output, force } => {
                let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, pass --force to overwrite it",
                        path.display()
                    );
                }
                Config::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
struct SessionOverrides {
    duration: Option<u32>,
    aspect: Option<String>,
    language: Option<String>,
    output_dir: Option<PathBuf>,
}

fn apply_session_overrides(config: &mut Config, overrides: SessionOverrides) -> Result<()> {
    if let Some(duration) = overrides.duration {
        config.session.duration_minutes = duration.max(1);
    }
    if let Some(aspect) = overrides.aspect {
        config.session.aspect_ratio = aspect.parse()?;
    }
    if let Some(language) = overrides.language {
        config.session.language = language.parse()?;
    }
    if let Some(output_dir) = overrides.output_dir {
        config.video.output_dir = output_dir;
    }
    Ok(())
}

/// Every session gets its own directory so reruns never overwrite earlier clips
fn session_output_dir(config: &Config) -> PathBuf {
    config.video.output_dir.join(Uuid::new_v4().to_string())
}

async fn run_session(config: Config, store: CredentialStore) -> Result<()> {
    let credential = match resolve_startup_key(&store) {
        Ok(credential) => credential,
        Err(e) => {
            warn!("Ignoring stored credential: {}", e);
            None
        }
    };

    let output_dir = session_output_dir(&config);
    info!("Session output directory: {}", output_dir.display());
    let factory = Arc::new(GeminiServiceFactory::new(config.gemini.clone()));
    let mut controller = AppController::new(config, factory, Some(store), credential, output_dir)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", controller.render());

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let redraw = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if controller.handle_line(&line).await == Flow::Quit {
                    break;
                }
                true
            }
            Some(event) = controller.next_event() => {
                // Phase ticks only change the storyboard status line
                let settled = !matches!(event, AppEvent::VideoPhaseChanged { .. });
                controller.handle_event(event);
                println!();
                settled
            }
        };

        for notice in controller.take_notices() {
            match notice {
                Notice::Info(text) => println!("{}", text),
                Notice::Alert(text) => println!("! {}", text),
            }
        }
        if redraw {
            println!("{}", controller.render());
        }
    }

    println!("{}", controller.state().translator().t("goodbye"));
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".veo-scripter").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "veo-scripter.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so it never mixes with rendered views
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("veo-scripter.log").display()
    );

    Ok(())
}
