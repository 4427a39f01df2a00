use std::path::PathBuf;
use std::str::FromStr;

use crate::config::AspectRatio;
use crate::i18n::Language;

/// Which scenes a `video` command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoTarget {
    /// 1-based display position
    Scene(usize),
    All,
}

/// One line of user input; scene positions are 1-based as displayed
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Show,
    Quit,
    ChangeKey,
    Key(String),
    Character(String),
    Image(PathBuf),
    Duration(u32),
    Aspect(AspectRatio),
    Language(Language),
    Idea(String),
    Script,
    AddScene,
    RemoveScene(usize),
    DescribeScene(usize, String),
    EditPrompt(usize, String),
    MoveScene(usize, usize),
    Prompts,
    Video(VideoTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    Invalid { command: String, value: String },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let name = name.to_lowercase();
        let invalid = || ParseError::Invalid {
            command: name.clone(),
            value: rest.to_string(),
        };

        let command = match name.as_str() {
            "help" | "?" => Command::Help,
            "show" => Command::Show,
            "quit" | "exit" => Command::Quit,
            "change-key" => Command::ChangeKey,
            "key" => Command::Key(rest.to_string()),
            "character" => Command::Character(rest.to_string()),
            "image" => {
                if rest.is_empty() {
                    return Err(invalid());
                }
                Command::Image(PathBuf::from(rest))
            }
            "duration" => Command::Duration(rest.parse().map_err(|_| invalid())?),
            "aspect" => Command::Aspect(rest.parse().map_err(|_| invalid())?),
            "lang" | "language" => Command::Language(rest.parse().map_err(|_| invalid())?),
            "idea" => Command::Idea(rest.to_string()),
            "script" => Command::Script,
            "add" => Command::AddScene,
            "remove" => Command::RemoveScene(parse_position(rest).ok_or_else(invalid)?),
            "scene" => {
                let (position, text) = split_position(rest).ok_or_else(invalid)?;
                Command::DescribeScene(position, text.to_string())
            }
            "prompt" => {
                let (position, text) = split_position(rest).ok_or_else(invalid)?;
                Command::EditPrompt(position, text.to_string())
            }
            "move" => {
                let mut parts = rest.split_whitespace();
                let from = parts.next().and_then(parse_position).ok_or_else(invalid)?;
                let to = parts.next().and_then(parse_position).ok_or_else(invalid)?;
                if parts.next().is_some() {
                    return Err(invalid());
                }
                Command::MoveScene(from, to)
            }
            "prompts" => Command::Prompts,
            "video" => match rest.to_lowercase().as_str() {
                "all" => Command::Video(VideoTarget::All),
                other => Command::Video(VideoTarget::Scene(parse_position(other).ok_or_else(invalid)?)),
            },
            _ => return Err(ParseError::Unknown(name.clone())),
        };

        Ok(command)
    }
}

fn parse_position(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|n| *n >= 1)
}

/// Split `"<n> <text>"`; the text may be empty
fn split_position(rest: &str) -> Option<(usize, &str)> {
    let (number, text) = match rest.split_once(char::is_whitespace) {
        Some((number, text)) => (number, text.trim()),
        None => (rest, ""),
    };
    Some((parse_position(number)?, text))
}
