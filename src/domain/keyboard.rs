//! Keyboard mapping for the host window
//!
//! Turns a virtual-key code plus the Ctrl state into a [`KeyCommand`]. The
//! mapping is pure; whether a command is allowed in the current selection
//! state is decided by the state machine.

use crate::config::shortcuts::ShortcutConfig;

/// Virtual-key code for Escape
pub const VK_ESCAPE: u32 = 0x1B;

const VK_0: u32 = b'0' as u32;
const VK_9: u32 = b'9' as u32;

/// Action requested from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Leave full-screen mode
    ExitFullScreen,
    /// Load the next valid saved slot (key `0`)
    CycleSavedSlot,
    /// Load slot 1-9
    LoadSlot(usize),
    /// Save the current rectangle to slot 1-9 (Ctrl + digit)
    SaveSlot(usize),
    ToggleInversion,
    ToggleGrayscale,
    CycleGrayLevel,
}

impl KeyCommand {
    /// Maps a key press to a command
    ///
    /// Escape and the digit keys take precedence over the configurable
    /// toggles, so a toggle bound to a digit never fires.
    pub fn from_key(code: u32, ctrl: bool, shortcuts: &ShortcutConfig) -> Option<Self> {
        if code == VK_ESCAPE {
            return Some(KeyCommand::ExitFullScreen);
        }

        if code == VK_0 {
            return Some(KeyCommand::CycleSavedSlot);
        }

        if (VK_0 + 1..=VK_9).contains(&code) {
            let slot = (code - VK_0) as usize;
            return Some(if ctrl {
                KeyCommand::SaveSlot(slot)
            } else {
                KeyCommand::LoadSlot(slot)
            });
        }

        if code == shortcuts.toggle_invert_key {
            Some(KeyCommand::ToggleInversion)
        } else if code == shortcuts.toggle_grayscale_key {
            Some(KeyCommand::ToggleGrayscale)
        } else if code == shortcuts.cycle_white_level_key {
            Some(KeyCommand::CycleGrayLevel)
        } else {
            None
        }
    }
}
