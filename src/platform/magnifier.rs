//! Magnification API wrapper
//!
//! The magnifier control is a child window that renders a live copy of a
//! screen rectangle through a 5x5 color matrix. The runtime must be
//! initialized once per process; [`MagnificationRuntime`] ties that to a scope.

use tracing::{debug, warn};
use windows::Win32::Foundation::{HMODULE, HWND, RECT};
use windows::Win32::Graphics::Gdi::InvalidateRect;
use windows::Win32::UI::Magnification::{
    MAGCOLOREFFECT, MAGTRANSFORM, MagInitialize, MagSetColorEffect, MagSetWindowSource,
    MagSetWindowTransform, MagUninitialize,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, SWP_NOACTIVATE, SWP_NOZORDER, SetWindowPos, WINDOW_EX_STYLE, WINDOW_STYLE,
    WS_CHILD, WS_VISIBLE,
};
use windows::core::w;

use crate::domain::color::ColorMatrix;
use crate::domain::core::Rect;

/// Draw the cursor inside the magnified image
const MS_SHOWMAGNIFIEDCURSOR: u32 = 0x0001;

/// Magnifier errors
#[derive(Debug, thiserror::Error)]
pub enum MagnifierError {
    #[error("Failed to initialize the magnification runtime")]
    InitializationFailed,

    #[error("Failed to create magnifier control: {0}")]
    ControlCreationFailed(windows::core::Error),

    #[error("Failed to set magnifier transform")]
    TransformFailed,

    #[error("Failed to set color effect")]
    ColorEffectFailed,

    #[error("Failed to set magnifier source {0:?}")]
    SourceFailed(Rect),
}

/// Keeps the magnification runtime initialized while alive
pub struct MagnificationRuntime {
    _private: (),
}

impl MagnificationRuntime {
    pub fn initialize() -> Result<Self, MagnifierError> {
        if !unsafe { MagInitialize() }.as_bool() {
            return Err(MagnifierError::InitializationFailed);
        }
        debug!("Magnification runtime initialized");
        Ok(Self { _private: () })
    }
}

impl Drop for MagnificationRuntime {
    fn drop(&mut self) {
        if !unsafe { MagUninitialize() }.as_bool() {
            warn!("MagUninitialize failed");
        }
    }
}

/// Magnifier child control filling the host's client area
pub struct Magnifier {
    hwnd: HWND,
}

impl Magnifier {
    /// Create the control at 1:1 scale
    ///
    /// # Arguments
    /// * `host` - Parent window
    /// * `instance` - Module handle of the process
    /// * `client` - Host client rectangle the control should fill
    pub fn create(host: HWND, instance: HMODULE, client: Rect) -> Result<Self, MagnifierError> {
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("Magnifier"),
                w!("ScreenFilterMagnifier"),
                WS_CHILD | WS_VISIBLE | WINDOW_STYLE(MS_SHOWMAGNIFIEDCURSOR),
                client.left,
                client.top,
                client.width(),
                client.height(),
                host,
                None,
                instance,
                None,
            )
        };

        if hwnd.0 == 0 {
            return Err(MagnifierError::ControlCreationFailed(
                windows::core::Error::from_win32(),
            ));
        }

        let magnifier = Self { hwnd };
        magnifier.set_unit_transform()?;
        Ok(magnifier)
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    fn set_unit_transform(&self) -> Result<(), MagnifierError> {
        let mut transform = MAGTRANSFORM {
            v: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        if unsafe { MagSetWindowTransform(self.hwnd, &mut transform) }.as_bool() {
            Ok(())
        } else {
            Err(MagnifierError::TransformFailed)
        }
    }

    pub fn set_color_effect(&self, matrix: &ColorMatrix) -> Result<(), MagnifierError> {
        let mut effect = MAGCOLOREFFECT {
            transform: matrix.to_flat(),
        };
        if unsafe { MagSetColorEffect(self.hwnd, &mut effect) }.as_bool() {
            Ok(())
        } else {
            Err(MagnifierError::ColorEffectFailed)
        }
    }

    /// Screen rectangle to render, in screen coordinates
    pub fn set_source(&self, source: Rect) -> Result<(), MagnifierError> {
        let rect = RECT {
            left: source.left,
            top: source.top,
            right: source.right,
            bottom: source.bottom,
        };
        if unsafe { MagSetWindowSource(self.hwnd, rect) }.as_bool() {
            Ok(())
        } else {
            Err(MagnifierError::SourceFailed(source))
        }
    }

    /// Stretch the control over `client`
    pub fn fit_to(hwnd: HWND, client: Rect) {
        let _ = unsafe {
            SetWindowPos(
                hwnd,
                HWND(0),
                client.left,
                client.top,
                client.width(),
                client.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
    }

    pub fn invalidate(&self) {
        unsafe {
            InvalidateRect(self.hwnd, None, true);
        }
    }
}
