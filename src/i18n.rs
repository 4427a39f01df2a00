//! Display strings for the two supported UI languages.
//!
//! Lookups never fail: a key missing from the active table is returned as-is,
//! which makes untranslated strings visible without interrupting the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScripterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Vi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
        }
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::En => EN,
            Self::Vi => VI,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ScripterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "vi" | "vietnamese" => Ok(Self::Vi),
            other => Err(ScripterError::Config(format!("Unsupported language: {}", other))),
        }
    }
}

/// Look up `key` for `language` and substitute every `{name}` placeholder
///
/// Substitution is a single left-to-right pass, so braces inside a value are
/// copied through as-is. Unknown placeholders are left in place.
pub fn translate(language: Language, key: &str, params: &[(&str, &dyn fmt::Display)]) -> String {
    let template = language
        .table()
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(key);

    let mut text = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| (value.to_string(), close))
        });
        match value {
            Some((value, close)) => {
                text.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                text.push('{');
                rest = after;
            }
        }
    }
    text.push_str(rest);
    text
}

/// Translator bound to the active session language
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn t(&self, key: &str) -> String {
        translate(self.language, key, &[])
    }

    pub fn t_with(&self, key: &str, params: &[(&str, &dyn fmt::Display)]) -> String {
        translate(self.language, key, params)
    }
}

static EN: &[(&str, &str)] = &[
    // Header
    ("title", "Veo Character Scripter"),
    ("subtitle", "Create consistent character video scripts with AI."),
    ("changeApiKey", "Change API Key"),
    // API key screen
    ("welcome", "Welcome!"),
    ("apiKeyPrompt", "This application requires a Google AI Studio API key to generate videos. Please enter your key below to continue."),
    ("billingInfo", "For information about billing, please visit"),
    ("selectApiKey", "Save & Continue"),
    ("apiKeyPlaceholder", "Enter your API Key here"),
    ("apiKeySaved", "API key saved."),
    ("credentialCleared", "Stored API key removed."),
    // Left panel
    ("defineCharacterTitle", "1. Define Your Character"),
    ("characterDescriptionPlaceholder", "e.g., A cheerful young astronaut named Alex with a bright blue suit and a curious, adventurous personality."),
    ("videoDurationTitle", "Desired Video Duration (minutes)"),
    ("aspectRatioTitle", "Aspect Ratio"),
    ("landscape", "Landscape"),
    ("portrait", "Portrait"),
    ("languageTitle", "Language"),
    ("characterReferenceImageTitle", "Character Reference Image"),
    ("uploadImage", "Upload an image"),
    ("imageFormatInfo", "PNG, JPG up to 10MB"),
    ("imageLoaded", "Reference image loaded: {name}"),
    ("imageReadError", "Could not read the image: {message}"),
    ("generateScriptTitle", "2. Generate Script from an Idea (Optional)"),
    ("storyIdeaPlaceholder", "e.g., Alex the astronaut discovers a glowing plant that communicates with music."),
    ("generateScriptButton", "Generate Script"),
    ("generatingScriptButton", "Generating..."),
    ("editScenesTitle", "3. Review & Edit Scenes"),
    ("addScene", "Add Scene"),
    ("scenePlaceholder", "Describe scene {index}..."),
    ("generatePromptsButton", "Generate Prompts"),
    ("generatingPromptsButton", "Generating Prompts..."),
    ("generateVideoButton", "Generate Video"),
    ("disabled", "(disabled)"),
    // Right panel
    ("storyboardTitle", "4. Generated Storyboard"),
    ("storyboardPlaceholder", "Your generated prompts and videos will appear here."),
    ("sceneTitle", "Scene {index}"),
    ("generatedPromptTitle", "Generated Prompt:"),
    ("videoPlaceholder", "Video will appear here"),
    ("generatingVideo", "Generating video..."),
    ("generatingVideoSubtext", "This may take a few minutes."),
    ("videoPhaseSubmitting", "submitting job"),
    ("videoPhasePolling", "waiting for the video model"),
    ("videoPhaseFetching", "downloading result"),
    ("videoFailed", "Video Generation Failed"),
    ("videoLabel", "Video:"),
    ("thumbnailLabel", "Thumbnail:"),
    // Notices
    ("scriptGenerated", "Generated {count} scenes."),
    ("promptsGenerated", "Prompts generated."),
    ("videoStarted", "Started video generation for scene {index}."),
    ("videoReady", "Video for scene {index} is ready: {path}"),
    ("videoJobFailed", "Video for scene {index} failed: {message}"),
    ("summaryTitle", "Storyboard summary"),
    // Loading & alerts
    ("apiKeyRequiredError", "An API key is required to proceed."),
    ("apiKeyErrorHint", "(This may be due to an invalid API key.)"),
    ("genericError", "An error occurred: {message}"),
    ("formValidationError", "Please provide a character description, a reference image, and a description for every scene."),
    ("storyIdeaRequiredError", "Please enter a story idea to generate a script."),
    ("videoPromptRequiredError", "Scene {index} needs a generated prompt and a reference image before a video can be made."),
    ("actionUnavailable", "This action is unavailable while generation is in progress."),
    ("minimumSceneError", "At least one scene is required."),
    ("unknownScene", "There is no scene {index}."),
    ("unknownCommand", "Unknown command: {command}. Type 'help' for a list of commands."),
    ("invalidArgument", "Invalid value for {command}: {value}"),
    ("goodbye", "Goodbye."),
    (
        "helpText",
        "Commands:
  character <text>        set the character description
  image <path>            load the character reference image
  duration <minutes>      set the target video duration
  aspect <16:9|9:16>      set the aspect ratio
  lang <en|vi>            switch the interface language
  idea <text>             set the story idea
  script                  generate scenes from the story idea
  add                     add a blank scene
  remove <n>              remove scene n
  scene <n> <text>        edit the description of scene n
  move <n> <m>            move scene n to the position of scene m
  prompts                 generate video prompts for every scene
  prompt <n> <text>       edit the generated prompt of scene n
  video <n|all>           generate the video for scene n (or every scene)
  show                    redraw the editor
  change-key              enter a different API key
  quit                    leave the session",
    ),
];

static VI: &[(&str, &str)] = &[
    // Header
    ("title", "Tạo Kịch Bản Nhân Vật Veo"),
    ("subtitle", "Tạo kịch bản video với nhân vật nhất quán bằng AI."),
    ("changeApiKey", "Đổi Khóa API"),
    // API key screen
    ("welcome", "Chào mừng!"),
    ("apiKeyPrompt", "Ứng dụng này yêu cầu khóa API của Google AI Studio để tạo video. Vui lòng nhập khóa của bạn vào bên dưới để tiếp tục."),
    ("billingInfo", "Để biết thông tin về thanh toán, vui lòng truy cập"),
    ("selectApiKey", "Lưu & Tiếp tục"),
    ("apiKeyPlaceholder", "Nhập Khóa API của bạn tại đây"),
    ("apiKeySaved", "Đã lưu khóa API."),
    ("credentialCleared", "Đã xóa khóa API đã lưu."),
    // Left panel
    ("defineCharacterTitle", "1. Xác định Nhân vật của bạn"),
    ("characterDescriptionPlaceholder", "VD: Một phi hành gia trẻ vui vẻ tên Alex trong bộ đồ màu xanh dương sáng, có tính cách tò mò và thích phiêu lưu."),
    ("videoDurationTitle", "Thời lượng Video mong muốn (phút)"),
    ("aspectRatioTitle", "Tỷ lệ khung hình"),
    ("landscape", "Ngang"),
    ("portrait", "Dọc"),
    ("languageTitle", "Ngôn ngữ"),
    ("characterReferenceImageTitle", "Hình ảnh tham chiếu nhân vật"),
    ("uploadImage", "Tải ảnh lên"),
    ("imageFormatInfo", "PNG, JPG tối đa 10MB"),
    ("imageLoaded", "Đã tải ảnh tham chiếu: {name}"),
    ("imageReadError", "Không thể đọc ảnh: {message}"),
    ("generateScriptTitle", "2. Tạo Kịch Bản từ Ý Tưởng (Tùy chọn)"),
    ("storyIdeaPlaceholder", "VD: Phi hành gia Alex phát hiện một loài cây phát sáng có thể giao tiếp bằng âm nhạc."),
    ("generateScriptButton", "Tạo Kịch Bản"),
    ("generatingScriptButton", "Đang tạo..."),
    ("editScenesTitle", "3. Xem lại & Chỉnh sửa Cảnh"),
    ("addScene", "Thêm cảnh"),
    ("scenePlaceholder", "Mô tả cảnh {index}..."),
    ("generatePromptsButton", "Tạo Gợi Ý"),
    ("generatingPromptsButton", "Đang tạo Gợi Ý..."),
    ("generateVideoButton", "Tạo Video"),
    ("disabled", "(không khả dụng)"),
    // Right panel
    ("storyboardTitle", "4. Kịch bản đã tạo"),
    ("storyboardPlaceholder", "Các gợi ý và video đã tạo của bạn sẽ xuất hiện ở đây."),
    ("sceneTitle", "Cảnh {index}"),
    ("generatedPromptTitle", "Gợi ý đã tạo:"),
    ("videoPlaceholder", "Video sẽ xuất hiện ở đây"),
    ("generatingVideo", "Đang tạo video..."),
    ("generatingVideoSubtext", "Quá trình này có thể mất vài phút."),
    ("videoPhaseSubmitting", "đang gửi yêu cầu"),
    ("videoPhasePolling", "đang chờ mô hình video"),
    ("videoPhaseFetching", "đang tải kết quả"),
    ("videoFailed", "Tạo Video Thất bại"),
    ("videoLabel", "Video:"),
    ("thumbnailLabel", "Ảnh thu nhỏ:"),
    // Notices
    ("scriptGenerated", "Đã tạo {count} cảnh."),
    ("promptsGenerated", "Đã tạo gợi ý."),
    ("videoStarted", "Bắt đầu tạo video cho cảnh {index}."),
    ("videoReady", "Video cho cảnh {index} đã sẵn sàng: {path}"),
    ("videoJobFailed", "Tạo video cho cảnh {index} thất bại: {message}"),
    ("summaryTitle", "Tóm tắt kịch bản"),
    // Loading & alerts
    ("apiKeyRequiredError", "Vui lòng nhập khóa API để tiếp tục."),
    ("apiKeyErrorHint", "(Lỗi này có thể do khóa API không hợp lệ.)"),
    ("genericError", "Đã xảy ra lỗi: {message}"),
    ("formValidationError", "Vui lòng cung cấp mô tả nhân vật, hình ảnh tham chiếu và mô tả cho mọi cảnh."),
    ("storyIdeaRequiredError", "Vui lòng nhập ý tưởng câu chuyện để tạo kịch bản."),
    ("videoPromptRequiredError", "Cảnh {index} cần có gợi ý đã tạo và hình ảnh tham chiếu trước khi tạo video."),
    ("actionUnavailable", "Không thể thực hiện thao tác này khi đang tạo."),
    ("minimumSceneError", "Cần có ít nhất một cảnh."),
    ("unknownScene", "Không có cảnh {index}."),
    ("unknownCommand", "Lệnh không xác định: {command}. Gõ 'help' để xem danh sách lệnh."),
    ("invalidArgument", "Giá trị không hợp lệ cho {command}: {value}"),
    ("goodbye", "Tạm biệt."),
    (
        "helpText",
        "Các lệnh:
  character <nội dung>    đặt mô tả nhân vật
  image <đường dẫn>       tải ảnh tham chiếu nhân vật
  duration <phút>         đặt thời lượng video mong muốn
  aspect <16:9|9:16>      đặt tỷ lệ khung hình
  lang <en|vi>            đổi ngôn ngữ giao diện
  idea <nội dung>         đặt ý tưởng câu chuyện
  script                  tạo cảnh từ ý tưởng câu chuyện
  add                     thêm một cảnh trống
  remove <n>              xóa cảnh n
  scene <n> <nội dung>    sửa mô tả cảnh n
  move <n> <m>            chuyển cảnh n đến vị trí của cảnh m
  prompts                 tạo gợi ý video cho mọi cảnh
  prompt <n> <nội dung>   sửa gợi ý đã tạo của cảnh n
  video <n|all>           tạo video cho cảnh n (hoặc mọi cảnh)
  show                    hiển thị lại trình chỉnh sửa
  change-key              nhập khóa API khác
  quit                    thoát phiên làm việc",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_substitution() {
        assert_eq!(translate(Language::En, "sceneTitle", &[("index", &3)]), "Scene 3");
        assert_eq!(translate(Language::Vi, "sceneTitle", &[("index", &3)]), "Cảnh 3");
    }

    #[test]
    fn test_missing_key_returns_key() {
        assert_eq!(translate(Language::En, "noSuchKey", &[]), "noSuchKey");
        assert_eq!(
            translate(Language::En, "noSuchKey", &[("index", &1)]),
            "noSuchKey"
        );
    }

    #[test]
    fn test_every_placeholder_occurrence_is_replaced() {
        // Untranslated keys still go through substitution
        assert_eq!(translate(Language::En, "{a} and {a}", &[("a", &"x")]), "x and x");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let text = translate(
            Language::En,
            "genericError",
            &[("message", &"{index}"), ("index", &3)],
        );
        assert_eq!(text, "An error occurred: {index}");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(
            translate(Language::En, "{unknown} {a} {", &[("a", &1)]),
            "{unknown} 1 {"
        );
    }

    #[test]
    fn test_tables_have_matching_keys() {
        for (key, _) in EN {
            assert!(VI.iter().any(|(k, _)| k == key), "missing vi entry for {}", key);
        }
        assert_eq!(EN.len(), VI.len());
    }

    #[test]
    fn test_translator_follows_language() {
        let translator = Translator::new(Language::En);
        assert_eq!(translator.t("landscape"), "Landscape");
        assert_eq!(
            translator.t_with("genericError", &[("message", &"boom")]),
            "An error occurred: boom"
        );
        assert_eq!(Translator::new(Language::Vi).t("landscape"), "Ngang");
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("vietnamese".parse::<Language>().unwrap(), Language::Vi);
        assert!("fr".parse::<Language>().is_err());
    }
}
