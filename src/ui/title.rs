//! Window title text
//!
//! The host window has no other chrome, so the title bar carries all status:
//! selection prompts, the active color settings with their key bindings, and
//! short-lived confirmations for slot operations.

use crate::config::shortcuts::{ShortcutConfig, key_label};
use crate::domain::color::ColorSettings;

pub const INITIAL_TITLE: &str =
    "Screen Filter - Click two points to select area (0=cycle saved, 1-9=load saved)";

pub const SECOND_POINT_TITLE: &str = "Screen Filter - Click second point";

pub const NO_SAVED_RECTS_TITLE: &str =
    "Screen Filter - No saved rectangles found (Use Ctrl+1-9 to save)";

/// Title right after the second click
pub fn area_selected(shortcuts: &ShortcutConfig) -> String {
    area_title("Selected", shortcuts)
}

/// Title right after a slot was loaded with a digit key
pub fn area_loaded(shortcuts: &ShortcutConfig) -> String {
    area_title("Loaded", shortcuts)
}

fn area_title(verb: &str, shortcuts: &ShortcutConfig) -> String {
    format!(
        "Screen Filter - Area {} ({}=Invert, {}=Grayscale, {}=White Level, Ctrl+1-9=Save)",
        verb,
        key_label(shortcuts.toggle_invert_key),
        key_label(shortcuts.toggle_grayscale_key),
        key_label(shortcuts.cycle_white_level_key)
    )
}

/// Status line once a selection is active
pub fn status(colors: &ColorSettings, pinned: bool, shortcuts: &ShortcutConfig) -> String {
    if pinned {
        return format!("Filter - {} to unpin window", shortcuts.describe_hotkey());
    }

    format!(
        "Filter - {}{}Gray:{}% ({}=Invert, {}=Colour, {}=White level, Ctrl+1-9=Save)",
        if colors.inversion { "Inverted " } else { "" },
        if colors.grayscale { "Grayscale " } else { "Color " },
        colors.gray_level.percent(),
        key_label(shortcuts.toggle_invert_key),
        key_label(shortcuts.toggle_grayscale_key),
        key_label(shortcuts.cycle_white_level_key)
    )
}

pub fn slot_empty(slot: usize) -> String {
    format!("Screen Filter - Slot {slot} is empty")
}

pub fn slot_saved(slot: usize) -> String {
    format!("Screen Filter - Rectangle saved to slot {slot}")
}

pub fn slot_loaded(slot: usize) -> String {
    format!("Screen Filter - Loaded Slot {slot} (Press 0 to cycle)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::GrayLevel;

    #[test]
    fn status_lists_effects_and_keys() {
        let colors = ColorSettings {
            inversion: true,
            grayscale: false,
            gray_level: GrayLevel::new(1).unwrap(),
        };
        assert_eq!(
            status(&colors, false, &ShortcutConfig::default()),
            "Filter - Inverted Color Gray:80% (I=Invert, C=Colour, W=White level, Ctrl+1-9=Save)"
        );
    }

    #[test]
    fn status_without_inversion() {
        let colors = ColorSettings {
            inversion: false,
            grayscale: true,
            gray_level: GrayLevel::new(3).unwrap(),
        };
        assert_eq!(
            status(&colors, false, &ShortcutConfig::default()),
            "Filter - Grayscale Gray:40% (I=Invert, C=Colour, W=White level, Ctrl+1-9=Save)"
        );
    }

    #[test]
    fn pinned_status_shows_unpin_hotkey() {
        let shortcuts = ShortcutConfig::parse("GlobalHotkeyModifiers=ALT\nGlobalHotkeyKey=U\n");
        assert_eq!(
            status(&ColorSettings::default(), true, &shortcuts),
            "Filter - Alt+U to unpin window"
        );
    }

    #[test]
    fn area_titles_use_configured_keys() {
        let shortcuts = ShortcutConfig::parse("ToggleInvertKey=X\n");
        assert_eq!(
            area_selected(&shortcuts),
            "Screen Filter - Area Selected (X=Invert, C=Grayscale, W=White Level, Ctrl+1-9=Save)"
        );
        assert!(area_loaded(&shortcuts).starts_with("Screen Filter - Area Loaded (X=Invert"));
    }

    #[test]
    fn slot_messages() {
        assert_eq!(slot_empty(4), "Screen Filter - Slot 4 is empty");
        assert_eq!(slot_saved(2), "Screen Filter - Rectangle saved to slot 2");
        assert_eq!(slot_loaded(9), "Screen Filter - Loaded Slot 9 (Press 0 to cycle)");
    }
}
