//! Keyboard-to-controller mapping.
//!
//! The config file speaks in key names; winit speaks in [`KeyCode`]s.
//! This module owns the name table and builds the reverse map the
//! presenter consults on every key event.

use std::collections::HashMap;

use ferricom_core::Button;
use winit::keyboard::KeyCode;

use crate::config::Config;

/// Parse a config key name into a winit key code. Letters, digits, the
/// arrow cluster and the usual modifier/space keys are accepted.
#[must_use]
pub fn keycode_from_name(name: &str) -> Option<KeyCode> {
    let code = match name.to_ascii_lowercase().as_str() {
        "a" => KeyCode::KeyA,
        "b" => KeyCode::KeyB,
        "c" => KeyCode::KeyC,
        "d" => KeyCode::KeyD,
        "e" => KeyCode::KeyE,
        "f" => KeyCode::KeyF,
        "g" => KeyCode::KeyG,
        "h" => KeyCode::KeyH,
        "i" => KeyCode::KeyI,
        "j" => KeyCode::KeyJ,
        "k" => KeyCode::KeyK,
        "l" => KeyCode::KeyL,
        "m" => KeyCode::KeyM,
        "n" => KeyCode::KeyN,
        "o" => KeyCode::KeyO,
        "p" => KeyCode::KeyP,
        "q" => KeyCode::KeyQ,
        "r" => KeyCode::KeyR,
        "s" => KeyCode::KeyS,
        "t" => KeyCode::KeyT,
        "u" => KeyCode::KeyU,
        "v" => KeyCode::KeyV,
        "w" => KeyCode::KeyW,
        "x" => KeyCode::KeyX,
        "y" => KeyCode::KeyY,
        "z" => KeyCode::KeyZ,
        "0" => KeyCode::Digit0,
        "1" => KeyCode::Digit1,
        "2" => KeyCode::Digit2,
        "3" => KeyCode::Digit3,
        "4" => KeyCode::Digit4,
        "5" => KeyCode::Digit5,
        "6" => KeyCode::Digit6,
        "7" => KeyCode::Digit7,
        "8" => KeyCode::Digit8,
        "9" => KeyCode::Digit9,
        "up" => KeyCode::ArrowUp,
        "down" => KeyCode::ArrowDown,
        "left" => KeyCode::ArrowLeft,
        "right" => KeyCode::ArrowRight,
        "enter" | "return" => KeyCode::Enter,
        "space" => KeyCode::Space,
        "tab" => KeyCode::Tab,
        "lshift" | "shift" => KeyCode::ShiftLeft,
        "rshift" => KeyCode::ShiftRight,
        "lctrl" | "ctrl" => KeyCode::ControlLeft,
        "rctrl" => KeyCode::ControlRight,
        "lalt" | "alt" => KeyCode::AltLeft,
        "ralt" => KeyCode::AltRight,
        "backspace" => KeyCode::Backspace,
        "comma" => KeyCode::Comma,
        "period" => KeyCode::Period,
        _ => return None,
    };
    Some(code)
}

/// Key-code to button map built from the config.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    map: HashMap<KeyCode, Button>,
}

impl KeyMap {
    /// Build from a config, falling back to defaults for unbound buttons
    /// and warning about names that do not parse.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut map = HashMap::new();
        for button in Button::ALL {
            let Some(key_name) = config.key_for(button.name()) else {
                continue;
            };
            match keycode_from_name(key_name) {
                Some(code) => {
                    map.insert(code, button);
                }
                None => {
                    tracing::warn!("unknown key name {key_name:?} for button {}", button.name());
                }
            }
        }
        Self { map }
    }

    /// Button bound to a key, if any.
    #[must_use]
    pub fn button_for(&self, code: KeyCode) -> Option<Button> {
        self.map.get(&code).copied()
    }
}
