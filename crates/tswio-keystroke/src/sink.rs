//! Keystroke sinks.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;
use tswio_errors::KeystrokeError;

use crate::KeyCombo;

/// What to do with a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    /// Press and hold
    Down,
    /// Release
    Up,
    /// Press and release
    Tap,
}

impl KeyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAction::Down => "down",
            KeyAction::Up => "up",
            KeyAction::Tap => "tap",
        }
    }
}

/// Somewhere key events go.
///
/// Implementations press modifiers before the main key and release them in
/// reverse order.
#[async_trait]
pub trait KeystrokeSink: Send + Sync {
    async fn send(&self, action: KeyAction, combo: &KeyCombo) -> Result<(), KeystrokeError>;

    async fn key_down(&self, combo: &KeyCombo) -> Result<(), KeystrokeError> {
        self.send(KeyAction::Down, combo).await
    }

    async fn key_up(&self, combo: &KeyCombo) -> Result<(), KeystrokeError> {
        self.send(KeyAction::Up, combo).await
    }

    async fn tap(&self, combo: &KeyCombo) -> Result<(), KeystrokeError> {
        self.send(KeyAction::Tap, combo).await
    }
}

/// Runs `<program> down|up|tap <combo>` for every event.
#[derive(Debug, Clone)]
pub struct ProcessKeystrokeSink {
    program: PathBuf,
}

impl ProcessKeystrokeSink {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

#[async_trait]
impl KeystrokeSink for ProcessKeystrokeSink {
    async fn send(&self, action: KeyAction, combo: &KeyCombo) -> Result<(), KeystrokeError> {
        let combo = combo.to_string();
        debug!(program = %self.program.display(), action = action.as_str(), %combo, "Running keystroke helper");

        let status = Command::new(&self.program)
            .arg(action.as_str())
            .arg(&combo)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| KeystrokeError::Spawn {
                program: self.program.display().to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(KeystrokeError::Failed {
                program: self.program.display().to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Sink used when no helper is configured. Every call fails with
/// [`KeystrokeError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledKeystrokeSink;

#[async_trait]
impl KeystrokeSink for DisabledKeystrokeSink {
    async fn send(&self, _action: KeyAction, _combo: &KeyCombo) -> Result<(), KeystrokeError> {
        Err(KeystrokeError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_sink_refuses() -> Result<(), KeystrokeError> {
        let combo = KeyCombo::parse("F5")?;
        let result = DisabledKeystrokeSink.tap(&combo).await;
        assert_eq!(result, Err(KeystrokeError::Disabled));
        Ok(())
    }

    #[test]
    fn action_names_match_helper_cli() {
        assert_eq!(KeyAction::Down.as_str(), "down");
        assert_eq!(KeyAction::Up.as_str(), "up");
        assert_eq!(KeyAction::Tap.as_str(), "tap");
    }
}
