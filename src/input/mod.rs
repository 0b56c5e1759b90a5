//! Keyboard input that bypasses the focused window

pub mod hotkeys;

pub use hotkeys::{GlobalHotkey, HotkeyError, PIN_HOTKEY_ID};
