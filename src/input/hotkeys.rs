//! Global hotkey registration
//!
//! The pin hotkey is registered against the host window so `WM_HOTKEY`
//! arrives through the normal message loop. [`GlobalHotkey`] follows the RAII
//! pattern and unregisters on drop.

use tracing::{debug, warn};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, MOD_NOREPEAT, RegisterHotKey, UnregisterHotKey,
};

use crate::config::shortcuts::{ModifierMask, ShortcutConfig};

/// Identifier of the pin hotkey in `WM_HOTKEY`
pub const PIN_HOTKEY_ID: i32 = 1;

/// Hotkey registration errors
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("Failed to register hotkey {description}: {source}")]
    HotkeyRegistrationFailed {
        description: String,
        #[source]
        source: windows::core::Error,
    },

    #[error("Failed to unregister hotkey: {id}")]
    HotkeyUnregistrationFailed { id: i32 },
}

/// A system-wide hotkey bound to a window
pub struct GlobalHotkey {
    hwnd: HWND,
    id: i32,
}

impl GlobalHotkey {
    /// Register `key` with `modifiers` for `hwnd`
    ///
    /// # Arguments
    /// * `hwnd` - Window that receives `WM_HOTKEY`
    /// * `id` - Value reported in `WM_HOTKEY`'s wparam
    /// * `modifiers` - Modifier keys that must be held
    /// * `key` - Virtual key code
    ///
    /// # Returns
    /// A guard that keeps the hotkey registered until dropped
    pub fn register(
        hwnd: HWND,
        id: i32,
        modifiers: ModifierMask,
        key: u32,
        description: &str,
    ) -> Result<Self, HotkeyError> {
        let flags = HOT_KEY_MODIFIERS(modifiers.bits()) | MOD_NOREPEAT;
        unsafe { RegisterHotKey(hwnd, id, flags, key) }.map_err(|source| {
            HotkeyError::HotkeyRegistrationFailed {
                description: description.to_string(),
                source,
            }
        })?;

        debug!(id, hotkey = description, "Registered global hotkey");
        Ok(Self { hwnd, id })
    }

    /// Register the configured pin hotkey
    pub fn register_pin(hwnd: HWND, shortcuts: &ShortcutConfig) -> Result<Self, HotkeyError> {
        Self::register(
            hwnd,
            PIN_HOTKEY_ID,
            shortcuts.global_hotkey_modifiers,
            shortcuts.global_hotkey_key,
            &shortcuts.describe_hotkey(),
        )
    }

    fn unregister(&self) -> Result<(), HotkeyError> {
        unsafe { UnregisterHotKey(self.hwnd, self.id) }
            .map_err(|_| HotkeyError::HotkeyUnregistrationFailed { id: self.id })
    }
}

impl Drop for GlobalHotkey {
    fn drop(&mut self) {
        if let Err(e) = self.unregister() {
            warn!("{e}");
        }
    }
}
