//! Key combo model and parser.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tswio_errors::KeystrokeError;

/// Modifier keys, held for the duration of the main key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "CTRL" | "CONTROL" => Some(Modifier::Ctrl),
            "SHIFT" => Some(Modifier::Shift),
            "ALT" => Some(Modifier::Alt),
            "META" | "WIN" | "SUPER" => Some(Modifier::Meta),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Ctrl => "CTRL",
            Modifier::Shift => "SHIFT",
            Modifier::Alt => "ALT",
            Modifier::Meta => "META",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The non-modifier key of a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Function key F1 to F12
    F(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Numpad digit 0 to 9
    Numpad(u8),
    /// A single printable character, stored lowercase
    Char(char),
}

impl Key {
    fn parse(name: &str) -> Option<Self> {
        let named = match name {
            "SPACE" => Some(Key::Space),
            "ENTER" | "RETURN" => Some(Key::Enter),
            "TAB" => Some(Key::Tab),
            "ESC" | "ESCAPE" => Some(Key::Escape),
            "BACKSPACE" => Some(Key::Backspace),
            "DEL" | "DELETE" => Some(Key::Delete),
            "INS" | "INSERT" => Some(Key::Insert),
            "HOME" => Some(Key::Home),
            "END" => Some(Key::End),
            "PGUP" | "PAGEUP" => Some(Key::PageUp),
            "PGDN" | "PAGEDOWN" => Some(Key::PageDown),
            "UP" | "ARROWUP" => Some(Key::Up),
            "DOWN" | "ARROWDOWN" => Some(Key::Down),
            "LEFT" | "ARROWLEFT" => Some(Key::Left),
            "RIGHT" | "ARROWRIGHT" => Some(Key::Right),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        if let Some(digit) = name.strip_prefix("NUMPAD") {
            return match digit.parse::<u8>() {
                Ok(n) if n <= 9 && digit.len() == 1 => Some(Key::Numpad(n)),
                _ => None,
            };
        }

        if let Some(number) = name.strip_prefix('F') {
            if let Ok(n) = number.parse::<u8>() {
                return (1..=12).contains(&n).then_some(Key::F(n));
            }
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() && !c.is_control() => {
                Some(Key::Char(c.to_ascii_lowercase()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::F(n) => write!(f, "F{n}"),
            Key::Numpad(n) => write!(f, "NUMPAD{n}"),
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Key::Space => f.write_str("SPACE"),
            Key::Enter => f.write_str("ENTER"),
            Key::Tab => f.write_str("TAB"),
            Key::Escape => f.write_str("ESC"),
            Key::Backspace => f.write_str("BACKSPACE"),
            Key::Delete => f.write_str("DELETE"),
            Key::Insert => f.write_str("INSERT"),
            Key::Home => f.write_str("HOME"),
            Key::End => f.write_str("END"),
            Key::PageUp => f.write_str("PAGEUP"),
            Key::PageDown => f.write_str("PAGEDOWN"),
            Key::Up => f.write_str("UP"),
            Key::Down => f.write_str("DOWN"),
            Key::Left => f.write_str("LEFT"),
            Key::Right => f.write_str("RIGHT"),
        }
    }
}

/// Modifiers plus exactly one main key, e.g. `CTRL+SHIFT+F1`.
///
/// Modifiers keep the order they were written in: they are pressed in that
/// order and released in reverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    modifiers: Vec<Modifier>,
    key: Key,
}

impl KeyCombo {
    pub fn new(modifiers: Vec<Modifier>, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse a `+`-separated combo. Names are case-insensitive.
    pub fn parse(input: &str) -> Result<Self, KeystrokeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(KeystrokeError::invalid_combo(input, "empty combo"));
        }

        let mut modifiers = Vec::new();
        let mut key = None;

        for part in trimmed.split('+') {
            let name = part.trim().to_uppercase();
            if name.is_empty() {
                return Err(KeystrokeError::invalid_combo(input, "empty key name"));
            }

            if let Some(modifier) = Modifier::parse(&name) {
                if modifiers.contains(&modifier) {
                    return Err(KeystrokeError::invalid_combo(
                        input,
                        format!("modifier {modifier} repeated"),
                    ));
                }
                modifiers.push(modifier);
                continue;
            }

            let Some(parsed) = Key::parse(&name) else {
                return Err(KeystrokeError::invalid_combo(
                    input,
                    format!("unknown key {name:?}"),
                ));
            };
            if key.replace(parsed).is_some() {
                return Err(KeystrokeError::invalid_combo(input, "more than one main key"));
            }
        }

        match key {
            Some(key) => Ok(Self { modifiers, key }),
            None => Err(KeystrokeError::invalid_combo(input, "missing main key")),
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn key(&self) -> Key {
        self.key
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier}+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = KeystrokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = KeystrokeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        combo.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_in_order() -> Result<(), KeystrokeError> {
        let combo = KeyCombo::parse("shift+ctrl+f1")?;
        assert_eq!(combo.modifiers(), &[Modifier::Shift, Modifier::Ctrl]);
        assert_eq!(combo.key(), Key::F(1));
        assert_eq!(combo.to_string(), "SHIFT+CTRL+F1");
        Ok(())
    }

    #[test]
    fn aliases_resolve_to_canonical_names() -> Result<(), KeystrokeError> {
        assert_eq!(KeyCombo::parse("control+return")?.to_string(), "CTRL+ENTER");
        assert_eq!(KeyCombo::parse("win+pgdn")?.to_string(), "META+PAGEDOWN");
        assert_eq!(KeyCombo::parse("ArrowUp")?.key(), Key::Up);
        assert_eq!(KeyCombo::parse("numpad7")?.key(), Key::Numpad(7));
        assert_eq!(KeyCombo::parse(" w ")?.key(), Key::Char('w'));
        Ok(())
    }

    #[test]
    fn rejects_malformed_combos() {
        for bad in ["", "CTRL", "CTRL+", "A+B", "F13", "NUMPAD10", "CTRL+CTRL+A", "HYPER+A"] {
            assert!(KeyCombo::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn serde_uses_the_string_form() -> Result<(), serde_json::Error> {
        let combo: KeyCombo = serde_json::from_str("\"alt+tab\"")?;
        assert_eq!(serde_json::to_string(&combo)?, "\"ALT+TAB\"");
        assert!(serde_json::from_str::<KeyCombo>("\"ALT+\"").is_err());
        Ok(())
    }
}
