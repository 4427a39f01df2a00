use std::fmt::Write;

use super::state::{AppState, GlobalAction, Screen};
use crate::config::AspectRatio;
use crate::i18n::Translator;
use crate::scene::{Scene, VideoPhase};

const BILLING_URL: &str = "https://ai.google.dev/gemini-api/docs/billing";
const RULE_WIDTH: usize = 72;

/// Plain-text view of whichever screen is active
pub fn render(state: &AppState) -> String {
    match state.screen {
        Screen::CredentialEntry => render_credential_screen(state),
        Screen::Editor => render_editor(state),
    }
}

fn header(out: &mut String, t: &Translator) {
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", t.t("title"));
    let _ = writeln!(out, "{}", t.t("subtitle"));
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "-- {} --", title);
}

/// Marks a control the user cannot use right now
fn control(t: &Translator, label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{}]", label)
    } else {
        format!("[{}] {}", label, t.t("disabled"))
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() { placeholder } else { value }
}

pub fn render_credential_screen(state: &AppState) -> String {
    let t = state.translator();
    let mut out = String::new();
    header(&mut out, &t);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", t.t("welcome"));
    let _ = writeln!(out, "{}", t.t("apiKeyPrompt"));
    let _ = writeln!(out, "{} {}", t.t("billingInfo"), BILLING_URL);
    let _ = writeln!(out);
    let _ = writeln!(out, "{} -> {}", t.t("apiKeyPlaceholder"), t.t("selectApiKey"));
    out
}

pub fn render_editor(state: &AppState) -> String {
    let t = state.translator();
    let mut out = String::new();
    header(&mut out, &t);
    let _ = writeln!(out, "change-key: {}", t.t("changeApiKey"));

    render_left_panel(&mut out, state, &t);
    render_storyboard(&mut out, state, &t);
    out
}

fn aspect_label(t: &Translator, aspect_ratio: AspectRatio) -> String {
    format!("{} ({})", t.t(aspect_ratio.label_key()), aspect_ratio.as_str())
}

fn render_left_panel(out: &mut String, state: &AppState, t: &Translator) {
    let form_disabled = state.is_form_disabled();
    let lock = |text: String| {
        if form_disabled {
            format!("{} {}", text, t.t("disabled"))
        } else {
            text
        }
    };

    // 1. Character and settings
    section(out, &t.t("defineCharacterTitle"));
    let _ = writeln!(
        out,
        "  {}",
        lock(or_placeholder(&state.character.description, &t.t("characterDescriptionPlaceholder")).to_string())
    );
    let image = match &state.character.image {
        Some(image) => format!("{} ({})", image.file_name, image.mime_type),
        None => format!("{} ({})", t.t("uploadImage"), t.t("imageFormatInfo")),
    };
    let _ = writeln!(out, "  {}: {}", t.t("characterReferenceImageTitle"), lock(image));
    let _ = writeln!(
        out,
        "  {}: {}",
        t.t("videoDurationTitle"),
        lock(state.settings.duration_minutes.to_string())
    );
    let _ = writeln!(
        out,
        "  {}: {}",
        t.t("aspectRatioTitle"),
        lock(aspect_label(t, state.settings.aspect_ratio))
    );
    let _ = writeln!(out, "  {}: {}", t.t("languageTitle"), state.settings.language);

    // 2. Story idea
    section(out, &t.t("generateScriptTitle"));
    let idea_locked = form_disabled || state.is_generating(GlobalAction::ScriptGeneration);
    let idea = or_placeholder(&state.story_idea, &t.t("storyIdeaPlaceholder")).to_string();
    if idea_locked {
        let _ = writeln!(out, "  {} {}", idea, t.t("disabled"));
    } else {
        let _ = writeln!(out, "  {}", idea);
    }
    let script_label = if state.is_generating(GlobalAction::ScriptGeneration) {
        t.t("generatingScriptButton")
    } else {
        t.t("generateScriptButton")
    };
    let _ = writeln!(out, "  {}", control(t, &script_label, state.can_generate_script()));

    // 3. Scenes
    section(out, &t.t("editScenesTitle"));
    for (index, scene) in state.scenes.iter().enumerate() {
        let placeholder = t.t_with("scenePlaceholder", &[("index", &(index + 1))]);
        let _ = writeln!(
            out,
            "  {:>2}. {}",
            index + 1,
            lock(or_placeholder(&scene.description, &placeholder).to_string())
        );
    }
    let prompts_label = if state.is_generating(GlobalAction::PromptGeneration) {
        t.t("generatingPromptsButton")
    } else {
        t.t("generatePromptsButton")
    };
    let _ = writeln!(
        out,
        "  {}  {}",
        control(t, &t.t("addScene"), !form_disabled),
        control(t, &prompts_label, state.can_generate_prompts())
    );
}

fn render_storyboard(out: &mut String, state: &AppState, t: &Translator) {
    section(out, &t.t("storyboardTitle"));

    if !state.scenes.iter().any(Scene::has_output) {
        let _ = writeln!(out, "  {}", t.t("storyboardPlaceholder"));
        return;
    }

    let has_image = state.character.image.is_some();
    for (index, scene) in state.scenes.iter().enumerate() {
        if !scene.has_output() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", t.t_with("sceneTitle", &[("index", &(index + 1))]));
        let _ = writeln!(out, "    {}", t.t("generatedPromptTitle"));
        let _ = writeln!(out, "    {}", scene.generated_prompt);
        render_video_status(out, scene, t);

        if !scene.is_loading() {
            let enabled = has_image && !scene.generated_prompt.trim().is_empty();
            let _ = writeln!(out, "    {}", control(t, &t.t("generateVideoButton"), enabled));
        }
    }
}

fn render_video_status(out: &mut String, scene: &Scene, t: &Translator) {
    match &scene.video {
        VideoPhase::Idle => {
            let _ = writeln!(out, "    {}", t.t("videoPlaceholder"));
        }
        VideoPhase::Submitting | VideoPhase::Polling { .. } | VideoPhase::Fetching => {
            let _ = writeln!(
                out,
                "    {} ({}) {}",
                t.t("generatingVideo"),
                phase_label(&scene.video, t),
                t.t("generatingVideoSubtext")
            );
        }
        VideoPhase::Done { video, thumbnail } => {
            let _ = writeln!(out, "    {} {}", t.t("videoLabel"), video.display());
            if let Some(thumbnail) = thumbnail {
                let _ = writeln!(out, "    {} {}", t.t("thumbnailLabel"), thumbnail.display());
            }
        }
        VideoPhase::Failed { error } => {
            let _ = writeln!(out, "    {}: {}", t.t("videoFailed"), error);
        }
    }
}

fn phase_label(phase: &VideoPhase, t: &Translator) -> String {
    match phase {
        VideoPhase::Submitting => t.t("videoPhaseSubmitting"),
        VideoPhase::Polling { attempts } => format!("{}, {}", t.t("videoPhasePolling"), attempts),
        VideoPhase::Fetching => t.t("videoPhaseFetching"),
        _ => String::new(),
    }
}

/// Final storyboard listing for batch runs
pub fn render_summary(state: &AppState) -> String {
    let t = state.translator();
    let mut out = String::new();
    let _ = writeln!(out, "{}", t.t("summaryTitle"));
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for (index, scene) in state.scenes.iter().enumerate() {
        let _ = writeln!(out, "{}", t.t_with("sceneTitle", &[("index", &(index + 1))]));
        let _ = writeln!(out, "  {}", scene.description);
        if !scene.generated_prompt.is_empty() {
            let _ = writeln!(out, "  {} {}", t.t("generatedPromptTitle"), scene.generated_prompt);
        }
        match &scene.video {
            VideoPhase::Idle => {}
            VideoPhase::Done { .. } | VideoPhase::Failed { .. } => render_video_status(&mut out, scene, &t),
            phase => {
                let _ = writeln!(out, "    {} ({})", t.t("generatingVideo"), phase_label(phase, &t));
            }
        }
    }
    out
}
