//! Configuration files for the screen filter
//!
//! Two line-oriented `key=value` text files live side by side: the keyboard
//! shortcut bindings and the saved rectangle presets. Both are forgiving on
//! read; a missing or malformed file never stops the application.

pub mod saved_rects;
pub mod shortcuts;

use std::path::{Path, PathBuf};

pub use saved_rects::{NUM_SAVED_RECTS, SavedRectEntry, SavedRectStore, StoreError};
pub use shortcuts::{HotkeyModifier, ModifierMask, ShortcutConfig, ShortcutError};

pub const SHORTCUTS_FILE: &str = "shortcuts.txt";
pub const SAVED_RECTS_FILE: &str = "saved_rects.txt";

/// Overrides the directory both files are read from and written to
pub const CONFIG_DIR_ENV: &str = "SCREEN_FILTER_CONFIG_DIR";

/// Locations of the configuration files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub shortcuts: PathBuf,
    pub saved_rects: PathBuf,
}

impl ConfigPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            shortcuts: dir.join(SHORTCUTS_FILE),
            saved_rects: dir.join(SAVED_RECTS_FILE),
        }
    }

    /// Working directory, unless [`CONFIG_DIR_ENV`] names another one
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::in_dir(PathBuf::from(dir)),
            _ => Self::in_dir(""),
        }
    }
}

/// Splits a config line into trimmed key and value
///
/// Returns None for blank lines, comments (`#` or `;` in the first column)
/// and lines without an `=`.
pub(crate) fn split_key_value(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    Some((trim_blanks(key), trim_blanks(value)))
}

fn trim_blanks(text: &str) -> &str {
    text.trim_matches(|c| c == ' ' || c == '\t')
}
