//! Keyboard shortcut configuration (`shortcuts.txt`)
//!
//! Recognised keys:
//! - `ToggleInvertKey`, `ToggleGrayscaleKey`, `CycleWhiteLevelKey`,
//!   `GlobalHotkeyKey`: single character, only the first one is used
//! - `GlobalHotkeyModifiers`: any of `CTRL`, `SHIFT`, `ALT`, `WIN`, e.g.
//!   `CTRL+SHIFT`
//!
//! Anything else in the file is ignored. Configured keys are not checked
//! against each other or against the digit keys.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::split_key_value;

/// Modifier keys for the global hotkey, with their Win32 `MOD_*` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyModifier {
    Alt = 1,
    Control = 2,
    Shift = 4,
    Windows = 8,
}

impl HotkeyModifier {
    /// Display order used in window titles
    pub const ALL: [HotkeyModifier; 4] = [
        HotkeyModifier::Control,
        HotkeyModifier::Shift,
        HotkeyModifier::Alt,
        HotkeyModifier::Windows,
    ];

    /// Token recognised in `GlobalHotkeyModifiers`
    pub fn token(self) -> &'static str {
        match self {
            HotkeyModifier::Alt => "ALT",
            HotkeyModifier::Control => "CTRL",
            HotkeyModifier::Shift => "SHIFT",
            HotkeyModifier::Windows => "WIN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HotkeyModifier::Alt => "Alt",
            HotkeyModifier::Control => "Ctrl",
            HotkeyModifier::Shift => "Shift",
            HotkeyModifier::Windows => "Win",
        }
    }
}

/// Bitwise OR of [`HotkeyModifier`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ModifierMask(u32);

impl ModifierMask {
    pub fn from_modifiers(modifiers: &[HotkeyModifier]) -> Self {
        Self(modifiers.iter().fold(0u32, |acc, &modifier| acc | modifier as u32))
    }

    /// Parses a modifier string by looking for each token as a substring
    ///
    /// Separators and unknown text are ignored, so `CTRL+SHIFT`,
    /// `SHIFT CTRL` and `CTRLSHIFT` are equivalent.
    pub fn parse(text: &str) -> Self {
        let modifiers: Vec<HotkeyModifier> = HotkeyModifier::ALL
            .into_iter()
            .filter(|modifier| text.contains(modifier.token()))
            .collect();
        Self::from_modifiers(&modifiers)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, modifier: HotkeyModifier) -> bool {
        self.0 & modifier as u32 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Modifiers in display order
    pub fn modifiers(self) -> impl Iterator<Item = HotkeyModifier> {
        HotkeyModifier::ALL
            .into_iter()
            .filter(move |modifier| self.contains(*modifier))
    }
}

/// Errors reading or writing the shortcut file
#[derive(Debug, thiserror::Error)]
pub enum ShortcutError {
    #[error("Failed to read shortcut file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write shortcut file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl ShortcutError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShortcutError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

const DEFAULT_FILE_CONTENTS: &str = "\
# Screen Filter Shortcut Configuration
# Edit these values to customize keyboard shortcuts
# Use single characters for keys (letters are matched case-insensitively)

# Toggle color inversion on/off
ToggleInvertKey=I

# Toggle between grayscale and color
ToggleGrayscaleKey=C

# Cycle through white/brightness levels
CycleWhiteLevelKey=W

# Global hotkey to toggle pin/click-through mode
GlobalHotkeyKey=P
# Modifier keys: CTRL, SHIFT, ALT, WIN (combine with +)
GlobalHotkeyModifiers=CTRL+SHIFT

# Note: Restart the application after changing these settings
# Rectangle Save/Load: 0=cycle through saved, 1-9=load saved, Ctrl+1-9=save current (Ctrl+0 disabled)
";

/// Key bindings, stored as Win32 virtual-key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutConfig {
    pub toggle_invert_key: u32,
    pub toggle_grayscale_key: u32,
    pub cycle_white_level_key: u32,
    pub global_hotkey_key: u32,
    pub global_hotkey_modifiers: ModifierMask,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            toggle_invert_key: 'I' as u32,
            toggle_grayscale_key: 'C' as u32,
            cycle_white_level_key: 'W' as u32,
            global_hotkey_key: 'P' as u32,
            global_hotkey_modifiers: ModifierMask::from_modifiers(&[
                HotkeyModifier::Control,
                HotkeyModifier::Shift,
            ]),
        }
    }
}

impl ShortcutConfig {
    /// Loads the shortcut file, writing a default one if it does not exist
    ///
    /// Never fails: unreadable files fall back to the built-in bindings.
    pub fn load_or_create(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded shortcut configuration");
                config
            }
            Err(err) if err.is_not_found() => {
                info!(path = %path.display(), "No shortcut file, writing defaults");
                if let Err(err) = Self::save_default(path) {
                    warn!("{err}");
                }
                Self::default()
            }
            Err(err) => {
                warn!("{err}; using default shortcuts");
                Self::default()
            }
        }
    }

    /// Reads and parses the shortcut file
    pub fn load(path: &Path) -> Result<Self, ShortcutError> {
        let bytes = fs::read(path).map_err(|source| ShortcutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Applies the recognised keys in `contents` on top of the defaults
    pub fn parse(contents: &str) -> Self {
        let values: HashMap<&str, &str> = contents.lines().filter_map(split_key_value).collect();

        let mut config = Self::default();
        let keys = [
            ("ToggleInvertKey", &mut config.toggle_invert_key),
            ("ToggleGrayscaleKey", &mut config.toggle_grayscale_key),
            ("CycleWhiteLevelKey", &mut config.cycle_white_level_key),
            ("GlobalHotkeyKey", &mut config.global_hotkey_key),
        ];
        for (name, slot) in keys {
            if let Some(code) = values.get(name).and_then(|value| key_code(value)) {
                *slot = code;
            }
        }

        if let Some(modifiers) = values.get("GlobalHotkeyModifiers") {
            config.global_hotkey_modifiers = ModifierMask::parse(modifiers);
        }

        debug!(?config, "Parsed shortcut configuration");
        config
    }

    /// Writes the commented default configuration
    pub fn save_default(path: &Path) -> Result<(), ShortcutError> {
        fs::write(path, DEFAULT_FILE_CONTENTS).map_err(|source| ShortcutError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Human-readable global hotkey, e.g. `Ctrl+Shift+P`
    pub fn describe_hotkey(&self) -> String {
        let mut text = String::new();
        for modifier in self.global_hotkey_modifiers.modifiers() {
            text.push_str(modifier.label());
            text.push('+');
        }
        text.push(key_label(self.global_hotkey_key));
        text
    }
}

/// Virtual-key code for the first character of a config value
///
/// Letters map to their upper-case code since that is what key-down
/// messages report. Empty values yield None so the default is kept.
fn key_code(value: &str) -> Option<u32> {
    value
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase() as u32)
}

/// Character shown for a virtual-key code in titles
pub fn key_label(code: u32) -> char {
    char::from_u32(code).unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_bindings() {
        let config = ShortcutConfig::default();
        assert_eq!(config.toggle_invert_key, 'I' as u32);
        assert_eq!(config.toggle_grayscale_key, 'C' as u32);
        assert_eq!(config.cycle_white_level_key, 'W' as u32);
        assert_eq!(config.global_hotkey_key, 'P' as u32);
        assert_eq!(config.global_hotkey_modifiers.bits(), 2 | 4);
    }

    #[test]
    fn configured_key_overrides_default() {
        let config = ShortcutConfig::parse("ToggleInvertKey=X\n");
        assert_eq!(config.toggle_invert_key, 'X' as u32);
        assert_eq!(config.toggle_grayscale_key, 'C' as u32);
    }

    #[test]
    fn absent_key_keeps_default() {
        let config = ShortcutConfig::parse("# nothing here\nUnknownKey=Z\n");
        assert_eq!(config, ShortcutConfig::default());
    }

    #[test]
    fn only_first_character_is_used() {
        let config = ShortcutConfig::parse("CycleWhiteLevelKey=Brightness\n");
        assert_eq!(config.cycle_white_level_key, 'B' as u32);
    }

    #[test]
    fn lowercase_letters_use_key_codes() {
        let config = ShortcutConfig::parse("ToggleGrayscaleKey=g\n");
        assert_eq!(config.toggle_grayscale_key, 'G' as u32);
    }

    #[test]
    fn empty_value_keeps_default() {
        let config = ShortcutConfig::parse("GlobalHotkeyKey=\n");
        assert_eq!(config.global_hotkey_key, 'P' as u32);
    }

    #[test]
    fn last_duplicate_wins() {
        let config = ShortcutConfig::parse("ToggleInvertKey=A\nToggleInvertKey=B\n");
        assert_eq!(config.toggle_invert_key, 'B' as u32);
    }

    #[test]
    fn modifiers_are_parsed_as_substrings() {
        let config = ShortcutConfig::parse("GlobalHotkeyModifiers=ALT+WIN+BOGUS\n");
        let mask = config.global_hotkey_modifiers;
        assert!(mask.contains(HotkeyModifier::Alt));
        assert!(mask.contains(HotkeyModifier::Windows));
        assert!(!mask.contains(HotkeyModifier::Control));
        assert!(!mask.contains(HotkeyModifier::Shift));
        assert_eq!(mask.bits(), 1 | 8);
    }

    #[test]
    fn unrecognized_modifiers_clear_mask() {
        let config = ShortcutConfig::parse("GlobalHotkeyModifiers=HYPER\n");
        assert!(config.global_hotkey_modifiers.is_empty());
    }

    #[test]
    fn describe_hotkey_lists_modifiers_in_order() {
        let config = ShortcutConfig::parse("GlobalHotkeyModifiers=SHIFT+CTRL+ALT\nGlobalHotkeyKey=F\n");
        assert_eq!(config.describe_hotkey(), "Ctrl+Shift+Alt+F");
        assert_eq!(ShortcutConfig::default().describe_hotkey(), "Ctrl+Shift+P");
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shortcuts.txt");

        let config = ShortcutConfig::load_or_create(&path);
        assert_eq!(config, ShortcutConfig::default());
        assert!(path.exists());

        // The generated file parses back to the same bindings
        let reloaded = ShortcutConfig::load(&path).expect("load generated file");
        assert_eq!(reloaded, ShortcutConfig::default());
    }

    #[test]
    fn existing_file_is_loaded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shortcuts.txt");
        fs::write(&path, "ToggleInvertKey=X\nGlobalHotkeyModifiers=ALT\n").expect("write");

        let config = ShortcutConfig::load_or_create(&path);
        assert_eq!(config.toggle_invert_key, 'X' as u32);
        assert_eq!(config.toggle_grayscale_key, 'C' as u32);
        assert_eq!(config.global_hotkey_modifiers.bits(), 1);
    }

    #[test]
    fn non_utf8_comment_keeps_user_bindings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shortcuts.txt");
        fs::write(&path, b"# Touche \xe9dit\xe9e\nToggleInvertKey=X\n").expect("write");

        let config = ShortcutConfig::load(&path).expect("load");
        assert_eq!(config.toggle_invert_key, 'X' as u32);
        assert_eq!(ShortcutConfig::load_or_create(&path).toggle_invert_key, 'X' as u32);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ShortcutConfig::load(&dir.path().join("absent.txt")).unwrap_err();
        assert!(err.is_not_found());
    }
}
