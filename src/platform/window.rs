//! Host window management
//!
//! This module handles:
//! - Registering the host window class and creating the window
//! - Routing window messages to a [`HostEvents`] implementation
//! - Moving the window, switching between full screen and restored layouts
//! - Click-through mode and focus hand-off while pinned
//!
//! The window procedure keeps a heap-allocated [`WindowContext`] in
//! `GWLP_USERDATA`. Win32 calls made from inside a handler can re-enter the
//! procedure synchronously, so the handler is only ever borrowed with
//! `try_borrow_mut` and geometry messages are served from plain cells.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

use tracing::{debug, warn};
use windows::Win32::Foundation::{
    COLORREF, HMODULE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM,
};
use windows::Win32::Graphics::Dwm::{
    DWMWA_BORDER_COLOR, DWMWA_CAPTION_COLOR, DWMWA_USE_IMMERSIVE_DARK_MODE,
    DwmSetWindowAttribute,
};
use windows::Win32::Graphics::Gdi::{ClientToScreen, CreateSolidBrush};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyState, VK_CONTROL};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{HSTRING, w};

use crate::domain::core::{FrameMetrics, Point, Rect};
use crate::platform::magnifier::Magnifier;

pub const REFRESH_TIMER_ID: usize = 1;
pub const TITLE_TIMER_ID: usize = 2;

/// Magnifier refresh period
pub const REFRESH_INTERVAL_MS: u32 = 16;

/// How long a flashed title stays up
pub const TITLE_FLASH_MS: u32 = 2000;

const WINDOW_CLASS: windows::core::PCWSTR = w!("ScreenFilterHostWindow");

/// Window styles of the movable, resizable layout
const RESTORED_STYLES: WINDOW_STYLE = WINDOW_STYLE(
    WS_SIZEBOX.0 | WS_SYSMENU.0 | WS_CLIPCHILDREN.0 | WS_CAPTION.0 | WS_MAXIMIZEBOX.0,
);

/// Background and caption color, RGB(32, 32, 32)
const DARK_BACKGROUND: COLORREF = COLORREF(0x0020_2020);

/// Border color, RGB(64, 64, 64)
const DARK_BORDER: COLORREF = COLORREF(0x0040_4040);

/// Error types for window operations
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to get module handle: {0}")]
    ModuleHandle(windows::core::Error),

    #[error("Failed to register host window class: {0}")]
    ClassRegistrationFailed(windows::core::Error),

    #[error("Failed to create host window: {0}")]
    CreationFailed(windows::core::Error),

    #[error("Failed to query window {what}: {source}")]
    QueryFailed {
        what: &'static str,
        source: windows::core::Error,
    },

    #[error("Failed to position window at {rect:?}: {source}")]
    PositionFailed {
        rect: Rect,
        source: windows::core::Error,
    },

    #[error("Failed to set window title: {0}")]
    TitleFailed(windows::core::Error),
}

/// Callbacks from the host window procedure
pub trait HostEvents {
    /// Left click, in screen coordinates
    fn on_click(&mut self, point: Point);
    fn on_key(&mut self, code: u32, ctrl: bool);
    fn on_hotkey(&mut self, id: i32);
    /// The maximize button or system menu entry was used
    fn on_maximize(&mut self);
    fn on_timer(&mut self, id: usize);
    /// Whether client-area mouse input should fall through to other windows
    fn client_hits_pass_through(&self) -> bool;
    /// The window is being destroyed; release anything bound to it
    fn on_destroy(&mut self);
}

/// Per-window data reachable from the window procedure
struct WindowContext {
    handler: RefCell<Option<Box<dyn HostEvents>>>,
    magnifier: Cell<HWND>,
    /// Last foreground window other than the host, used when pinning
    previous_foreground: Cell<HWND>,
}

impl WindowContext {
    fn dispatch(&self, f: impl FnOnce(&mut dyn HostEvents)) {
        match self.handler.try_borrow_mut() {
            Ok(mut guard) => {
                if let Some(handler) = guard.as_mut() {
                    f(handler.as_mut());
                }
            }
            Err(_) => debug!("Skipping re-entrant window message"),
        }
    }

    fn query(&self, f: impl FnOnce(&dyn HostEvents) -> bool) -> bool {
        match self.handler.try_borrow() {
            Ok(guard) => guard.as_deref().is_some_and(f),
            Err(_) => false,
        }
    }
}

/// Title bar and border sizes of a sizable captioned window
pub fn frame_metrics() -> FrameMetrics {
    unsafe {
        FrameMetrics::new(
            GetSystemMetrics(SM_CYCAPTION),
            GetSystemMetrics(SM_CXSIZEFRAME),
            GetSystemMetrics(SM_CYSIZEFRAME),
        )
    }
}

/// Primary screen rectangle
pub fn screen_rect() -> Rect {
    unsafe {
        Rect::from_origin_size(
            0,
            0,
            GetSystemMetrics(SM_CXSCREEN),
            GetSystemMetrics(SM_CYSCREEN),
        )
    }
}

pub fn module_handle() -> Result<HMODULE, WindowError> {
    unsafe { GetModuleHandleW(None) }.map_err(WindowError::ModuleHandle)
}

fn to_rect(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

fn context_of(hwnd: HWND) -> Option<&'static WindowContext> {
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const WindowContext;
    // SAFETY: the pointer is set at creation and cleared in WM_NCDESTROY
    unsafe { ptr.as_ref() }
}

/// Copyable handle used to drive the host window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostHandle(HWND);

impl HostHandle {
    pub fn hwnd(&self) -> HWND {
        self.0
    }

    pub fn set_title(&self, title: &str) -> Result<(), WindowError> {
        unsafe { SetWindowTextW(self.0, &HSTRING::from(title)) }.map_err(WindowError::TitleFailed)
    }

    /// Window rectangle in screen coordinates
    pub fn window_rect(&self) -> Result<Rect, WindowError> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(self.0, &mut rect) }.map_err(|source| WindowError::QueryFailed {
            what: "rectangle",
            source,
        })?;
        Ok(to_rect(rect))
    }

    /// Client rectangle in client coordinates
    pub fn client_rect(&self) -> Result<Rect, WindowError> {
        let mut rect = RECT::default();
        unsafe { GetClientRect(self.0, &mut rect) }.map_err(|source| WindowError::QueryFailed {
            what: "client rectangle",
            source,
        })?;
        Ok(to_rect(rect))
    }

    /// Restore the window and move it to `rect`, keeping it topmost and opaque
    pub fn place(&self, rect: Rect) -> Result<(), WindowError> {
        unsafe {
            ShowWindow(self.0, SW_RESTORE);
            SetWindowPos(
                self.0,
                HWND_TOPMOST,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_SHOWWINDOW | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            )
            .map_err(|source| WindowError::PositionFailed { rect, source })?;

            let ex_style = GetWindowLongPtrW(self.0, GWL_EXSTYLE);
            SetWindowLongPtrW(self.0, GWL_EXSTYLE, ex_style | WS_EX_LAYERED.0 as isize);
        }
        self.make_opaque();
        Ok(())
    }

    /// Push the frame off screen so the client area covers the whole display
    ///
    /// The window becomes click-through so the desktop stays usable.
    pub fn enter_full_screen(&self, frame: FrameMetrics) -> Result<(), WindowError> {
        let rect = frame.window_for_client(&screen_rect());
        unsafe {
            SetWindowLongPtrW(
                self.0,
                GWL_EXSTYLE,
                (WS_EX_TOPMOST.0 | WS_EX_LAYERED.0 | WS_EX_TRANSPARENT.0) as isize,
            );
            SetWindowLongPtrW(self.0, GWL_STYLE, (WS_CAPTION.0 | WS_SYSMENU.0) as isize);
            SetWindowPos(
                self.0,
                HWND_TOPMOST,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_SHOWWINDOW | SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .map_err(|source| WindowError::PositionFailed { rect, source })?;
        }
        debug!(?rect, "Entered full screen");
        Ok(())
    }

    /// Back to the sizable layout at `rect`
    pub fn leave_full_screen(&self, rect: Rect) -> Result<(), WindowError> {
        unsafe {
            SetWindowLongPtrW(
                self.0,
                GWL_EXSTYLE,
                (WS_EX_TOPMOST.0 | WS_EX_LAYERED.0) as isize,
            );
            SetWindowLongPtrW(self.0, GWL_STYLE, RESTORED_STYLES.0 as isize);
            SetWindowPos(
                self.0,
                HWND_TOPMOST,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_SHOWWINDOW | SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .map_err(|source| WindowError::PositionFailed { rect, source })?;
        }
        self.apply_dark_mode();
        debug!(?rect, "Left full screen");
        Ok(())
    }

    /// Toggle `WS_EX_TRANSPARENT` so mouse input passes through the window
    pub fn set_click_through(&self, enabled: bool) {
        unsafe {
            let ex_style = GetWindowLongPtrW(self.0, GWL_EXSTYLE);
            let transparent = WS_EX_TRANSPARENT.0 as isize;
            let updated = if enabled {
                ex_style | transparent
            } else {
                ex_style & !transparent
            };
            SetWindowLongPtrW(self.0, GWL_EXSTYLE, updated);
        }
    }

    fn is_click_through(&self) -> bool {
        let ex_style = unsafe { GetWindowLongPtrW(self.0, GWL_EXSTYLE) };
        ex_style & WS_EX_TRANSPARENT.0 as isize != 0
    }

    fn make_opaque(&self) {
        if let Err(e) = unsafe { SetLayeredWindowAttributes(self.0, COLORREF(0), 255, LWA_ALPHA) } {
            warn!("Failed to set layered attributes: {e}");
        }
    }

    /// Keep the host above menus and popups that appeared since the last frame
    pub fn reclaim_topmost(&self) {
        let _ = unsafe {
            SetWindowPos(
                self.0,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOACTIVATE | SWP_NOMOVE | SWP_NOSIZE,
            )
        };
    }

    pub fn focus_self(&self) {
        unsafe {
            SetForegroundWindow(self.0);
        }
    }

    /// Give the foreground to the top-level window under the cursor
    ///
    /// Falls back to the window that had focus before the host did.
    pub fn focus_window_under_cursor(&self, magnifier: HWND) {
        let mut cursor = POINT::default();
        let under = if unsafe { GetCursorPos(&mut cursor) }.is_ok() {
            unsafe { WindowFromPoint(cursor) }
        } else {
            HWND(0)
        };

        if under.0 != 0 && under != self.0 && under != magnifier {
            let top = unsafe { GetAncestor(under, GA_ROOT) };
            if top.0 != 0 && top != self.0 {
                unsafe {
                    SetForegroundWindow(top);
                }
            }
            return;
        }

        if let Some(previous) = context_of(self.0).map(|ctx| ctx.previous_foreground.get()) {
            if previous.0 != 0 && unsafe { IsWindow(previous) }.as_bool() {
                unsafe {
                    SetForegroundWindow(previous);
                }
            }
        }
    }

    pub fn start_timer(&self, id: usize, interval_ms: u32) {
        if unsafe { SetTimer(self.0, id, interval_ms, None) } == 0 {
            warn!(id, "SetTimer failed");
        }
    }

    pub fn kill_timer(&self, id: usize) {
        let _ = unsafe { KillTimer(self.0, id) };
    }

    /// Dark caption and border, where the system supports it
    pub fn apply_dark_mode(&self) {
        let dark_mode: i32 = 1;
        unsafe {
            let _ = DwmSetWindowAttribute(
                self.0,
                DWMWA_USE_IMMERSIVE_DARK_MODE,
                &dark_mode as *const _ as *const c_void,
                std::mem::size_of::<i32>() as u32,
            );
            let _ = DwmSetWindowAttribute(
                self.0,
                DWMWA_CAPTION_COLOR,
                &DARK_BACKGROUND as *const _ as *const c_void,
                std::mem::size_of::<COLORREF>() as u32,
            );
            let _ = DwmSetWindowAttribute(
                self.0,
                DWMWA_BORDER_COLOR,
                &DARK_BORDER as *const _ as *const c_void,
                std::mem::size_of::<COLORREF>() as u32,
            );
        }
    }
}

/// Owns the host window; destroys it on drop if it is still alive
pub struct HostWindow {
    handle: HostHandle,
    instance: HMODULE,
}

impl HostWindow {
    /// Create the host window covering `rect`, hidden
    pub fn create(title: &str, rect: Rect) -> Result<Self, WindowError> {
        let instance = module_handle()?;
        Self::register_window_class(instance)?;

        let context = Box::new(WindowContext {
            handler: RefCell::new(None),
            magnifier: Cell::new(HWND(0)),
            previous_foreground: Cell::new(HWND(0)),
        });

        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_LAYERED,
                WINDOW_CLASS,
                &HSTRING::from(title),
                RESTORED_STYLES,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                None,
                None,
                instance,
                None,
            )
        };

        if hwnd.0 == 0 {
            return Err(WindowError::CreationFailed(windows::core::Error::from_win32()));
        }

        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(context) as isize);
        }

        let handle = HostHandle(hwnd);
        handle.make_opaque();
        debug!(?rect, "Host window created");

        Ok(Self { handle, instance })
    }

    fn register_window_class(instance: HMODULE) -> Result<(), WindowError> {
        let cursor = unsafe { LoadCursorW(None, IDC_CROSS) }
            .map_err(WindowError::ClassRegistrationFailed)?;
        let brush = unsafe { CreateSolidBrush(DARK_BACKGROUND) };

        let wc = WNDCLASSW {
            lpfnWndProc: Some(host_window_proc),
            hInstance: instance.into(),
            lpszClassName: WINDOW_CLASS,
            hCursor: cursor,
            hbrBackground: brush,
            ..Default::default()
        };

        if unsafe { RegisterClassW(&wc) } == 0 {
            return Err(WindowError::ClassRegistrationFailed(
                windows::core::Error::from_win32(),
            ));
        }
        Ok(())
    }

    pub fn handle(&self) -> HostHandle {
        self.handle
    }

    pub fn instance(&self) -> HMODULE {
        self.instance
    }

    /// Route window messages to `handler` from now on
    pub fn install_handler(&self, handler: Box<dyn HostEvents>) {
        if let Some(ctx) = context_of(self.handle.0) {
            *ctx.handler.borrow_mut() = Some(handler);
        }
    }

    /// Keep this magnifier control sized to the client area
    pub fn attach_magnifier(&self, magnifier: HWND) {
        if let Some(ctx) = context_of(self.handle.0) {
            ctx.magnifier.set(magnifier);
        }
    }

    pub fn show_maximized(&self) {
        unsafe {
            ShowWindow(self.handle.0, SW_MAXIMIZE);
            UpdateWindow(self.handle.0);
        }
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        unsafe {
            if IsWindow(self.handle.0).as_bool() {
                let _ = DestroyWindow(self.handle.0);
            }
        }
    }
}

/// Pump messages until `WM_QUIT`, returning its exit code
pub fn run_message_loop() -> i32 {
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, HWND(0), 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    msg.wParam.0 as i32
}

fn fit_magnifier(hwnd: HWND, ctx: &WindowContext) {
    let magnifier = ctx.magnifier.get();
    if magnifier.0 == 0 {
        return;
    }
    if let Ok(client) = HostHandle(hwnd).client_rect() {
        Magnifier::fit_to(magnifier, client);
    }
}

fn lparam_point(lparam: LPARAM) -> POINT {
    POINT {
        x: (lparam.0 & 0xFFFF) as u16 as i16 as i32,
        y: ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32,
    }
}

unsafe extern "system" fn host_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(ctx) = context_of(hwnd) else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };

    match msg {
        WM_NCHITTEST => {
            let hit = unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
            if hit.0 == HTCLIENT as isize && ctx.query(|h| h.client_hits_pass_through()) {
                LRESULT(HTTRANSPARENT as isize)
            } else {
                hit
            }
        }
        WM_LBUTTONDOWN => {
            let mut point = lparam_point(lparam);
            unsafe {
                ClientToScreen(hwnd, &mut point);
            }
            ctx.dispatch(|h| h.on_click(Point::new(point.x, point.y)));
            LRESULT(0)
        }
        WM_KEYDOWN => {
            let ctrl = unsafe { GetKeyState(VK_CONTROL.0 as i32) } < 0;
            ctx.dispatch(|h| h.on_key(wparam.0 as u32, ctrl));
            LRESULT(0)
        }
        WM_SETFOCUS => {
            if !HostHandle(hwnd).is_click_through() {
                let foreground = unsafe { GetForegroundWindow() };
                if foreground != hwnd {
                    ctx.previous_foreground.set(foreground);
                }
            }
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        WM_HOTKEY => {
            ctx.dispatch(|h| h.on_hotkey(wparam.0 as i32));
            LRESULT(0)
        }
        WM_SYSCOMMAND if (wparam.0 & 0xFFF0) == SC_MAXIMIZE as usize => {
            ctx.dispatch(|h| h.on_maximize());
            LRESULT(0)
        }
        WM_TIMER => {
            ctx.dispatch(|h| h.on_timer(wparam.0));
            LRESULT(0)
        }
        WM_SIZE | WM_WINDOWPOSCHANGED => {
            fit_magnifier(hwnd, ctx);
            LRESULT(0)
        }
        WM_DESTROY => {
            ctx.dispatch(|h| h.on_destroy());
            unsafe {
                PostQuitMessage(0);
            }
            LRESULT(0)
        }
        WM_NCDESTROY => {
            unsafe {
                let ptr = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut WindowContext;
                if !ptr.is_null() {
                    drop(Box::from_raw(ptr));
                }
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
