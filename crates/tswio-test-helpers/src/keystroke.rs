//! Keystroke sink that records events.

use async_trait::async_trait;
use parking_lot::Mutex;
use tswio_errors::KeystrokeError;
use tswio_keystroke::{KeyAction, KeyCombo, KeystrokeSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub combo: String,
}

#[derive(Debug, Default)]
pub struct RecordingKeystrokeSink {
    events: Mutex<Vec<KeyEvent>>,
}

impl RecordingKeystrokeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().clone()
    }

    /// Events as `"down CTRL+S"` strings.
    pub fn log(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| format!("{} {}", e.action.as_str(), e.combo))
            .collect()
    }
}

#[async_trait]
impl KeystrokeSink for RecordingKeystrokeSink {
    async fn send(&self, action: KeyAction, combo: &KeyCombo) -> Result<(), KeystrokeError> {
        self.events.lock().push(KeyEvent {
            action,
            combo: combo.to_string(),
        });
        Ok(())
    }
}
