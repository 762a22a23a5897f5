use std::str::FromStr;

use thiserror::Error;

/// Everything the operator can ask of the aligner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Begin,
    Advance,
    Retreat,
    ResetViewport,
    ZoomIn,
    ZoomOut,
    LookLeft,
    LookRight,
    ShiftLeft,
    ShiftRight,
    FineShiftLeft,
    FineShiftRight,
    ScaleUp,
    ScaleDown,
    AutoRescale,
    ToggleGeneralWarning,
    ToggleShiftWarning,
    ToggleDataMissing,
    SetComment(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

/// Accepts the key names of the original key map (`z`, `shift-left`,
/// `enter`, ...) as well as the long command names (`zoom-in`, ...).
/// `comment <text>` sets the comment; a bare `comment` clears it.
impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };
        let word = word.to_ascii_lowercase();

        if word == "comment" {
            return Ok(Command::SetComment(rest.to_string()));
        }
        if !rest.is_empty() {
            return Err(UnknownCommand(trimmed.to_string()));
        }

        let command = match word.as_str() {
            "begin" => Command::Begin,
            "enter" | "return" | "advance" | "next" => Command::Advance,
            "backspace" | "retreat" | "prev" => Command::Retreat,
            "delete" | "reset" | "reset-viewport" => Command::ResetViewport,
            "z" | "zoom-in" => Command::ZoomIn,
            "x" | "zoom-out" => Command::ZoomOut,
            "left" | "look-left" => Command::LookLeft,
            "right" | "look-right" => Command::LookRight,
            "shift-left" => Command::ShiftLeft,
            "shift-right" => Command::ShiftRight,
            "ctrl-shift-left" | "fine-shift-left" => Command::FineShiftLeft,
            "ctrl-shift-right" | "fine-shift-right" => Command::FineShiftRight,
            "up" | "scale-up" => Command::ScaleUp,
            "down" | "scale-down" => Command::ScaleDown,
            "a" | "auto-rescale" => Command::AutoRescale,
            "f" | "general-warning" => Command::ToggleGeneralWarning,
            "s" | "shift-warning" => Command::ToggleShiftWarning,
            "d" | "data-missing" => Command::ToggleDataMissing,
            _ => return Err(UnknownCommand(trimmed.to_string())),
        };
        Ok(command)
    }
}
