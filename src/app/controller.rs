//! Application controller and coordination layer
//!
//! The controller owns the pieces bound to the host window (magnifier,
//! configuration, saved rectangles, the pin hotkey) and turns the state
//! machine's effects into Win32 calls.

use tracing::{debug, error, info, warn};

use crate::app::state::{AppState, Effect, EventContext, StateEvent};
use crate::config::{ConfigPaths, SavedRectStore, ShortcutConfig};
use crate::domain::core::{FrameMetrics, Point, Rect};
use crate::input::{GlobalHotkey, PIN_HOTKEY_ID};
use crate::platform::magnifier::{MagnificationRuntime, Magnifier, MagnifierError};
use crate::platform::window::{
    self, HostEvents, HostHandle, HostWindow, REFRESH_INTERVAL_MS, REFRESH_TIMER_ID,
    TITLE_FLASH_MS, TITLE_TIMER_ID, WindowError,
};
use crate::ui::title;

/// Extra inset keeping the host's own frame out of the magnified image
const SOURCE_FUDGE: i32 = 4;

/// Application errors that can occur during startup
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Magnifier error: {0}")]
    Magnifier(#[from] MagnifierError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}

/// Drives one host window
pub struct AppController {
    host: HostHandle,
    magnifier: Magnifier,
    state: AppState,
    shortcuts: ShortcutConfig,
    store: SavedRectStore,
    frame: FrameMetrics,
    /// Window rectangle to return to when leaving full screen
    restored_rect: Rect,
    pin_hotkey: Option<GlobalHotkey>,
}

impl AppController {
    fn new(
        host: &HostWindow,
        shortcuts: ShortcutConfig,
        store: SavedRectStore,
        restored_rect: Rect,
    ) -> Result<Self, AppError> {
        let handle = host.handle();
        let magnifier = Magnifier::create(handle.hwnd(), host.instance(), handle.client_rect()?)?;

        // Registration failure only costs the pin feature
        let pin_hotkey = match GlobalHotkey::register_pin(handle.hwnd(), &shortcuts) {
            Ok(hotkey) => Some(hotkey),
            Err(e) => {
                warn!("{e}");
                None
            }
        };

        Ok(Self {
            host: handle,
            magnifier,
            state: AppState::default(),
            shortcuts,
            store,
            frame: window::frame_metrics(),
            restored_rect,
            pin_hotkey,
        })
    }

    fn send(&mut self, event: StateEvent) {
        let window_rect = match self.host.window_rect() {
            Ok(rect) => rect,
            Err(e) => {
                warn!("{e}");
                self.restored_rect
            }
        };

        let mut ctx = EventContext {
            shortcuts: &self.shortcuts,
            store: &mut self.store,
            window_rect,
            frame: self.frame,
        };
        let effects = self.state.handle_event(event, &mut ctx);

        for effect in effects {
            if let Err(e) = self.execute(effect) {
                warn!("{e}");
            }
        }
    }

    fn execute(&mut self, effect: Effect) -> Result<(), AppError> {
        match effect {
            Effect::SetTitle(text) => self.host.set_title(&text)?,
            Effect::FlashTitle(text) => {
                self.host.set_title(&text)?;
                self.host.start_timer(TITLE_TIMER_ID, TITLE_FLASH_MS);
            }
            Effect::PlaceOverSelection(client) => {
                self.place(self.frame.window_for_client(&client))?;
            }
            Effect::PlaceWindow(rect) => self.place(rect)?,
            Effect::ApplyColors { matrix, title } => {
                self.magnifier.set_color_effect(&matrix)?;
                self.host.set_title(&title)?;
            }
            Effect::PersistSavedRects => {
                if let Err(e) = self.store.save_preserving_existing() {
                    error!("{e}");
                }
            }
            Effect::SetClickThrough(enabled) => self.host.set_click_through(enabled),
            Effect::FocusUnderCursor => self.host.focus_window_under_cursor(self.magnifier.hwnd()),
            Effect::FocusHost => self.host.focus_self(),
            Effect::EnterFullScreen => self.host.enter_full_screen(self.frame)?,
            Effect::LeaveFullScreen => self.host.leave_full_screen(self.restored_rect)?,
        }
        Ok(())
    }

    fn place(&mut self, rect: Rect) -> Result<(), AppError> {
        self.restored_rect = rect;
        self.host.place(rect)?;
        debug!(?rect, "Host window placed");
        Ok(())
    }

    /// Point the magnifier at whatever is under the client area now
    fn refresh_magnifier(&self) {
        let (Ok(window_rect), Ok(client)) = (self.host.window_rect(), self.host.client_rect())
        else {
            return;
        };

        let source = self.frame.magnifier_source(
            &window_rect,
            Point::new(client.left, client.top),
            SOURCE_FUDGE,
        );
        if let Err(e) = self.magnifier.set_source(source) {
            debug!("{e}");
        }

        self.host.reclaim_topmost();
        self.magnifier.invalidate();
    }
}

impl HostEvents for AppController {
    fn on_click(&mut self, point: Point) {
        self.send(StateEvent::Click(point));
    }

    fn on_key(&mut self, code: u32, ctrl: bool) {
        self.send(StateEvent::Key { code, ctrl });
    }

    fn on_hotkey(&mut self, id: i32) {
        if id == PIN_HOTKEY_ID {
            self.send(StateEvent::PinHotkey);
        }
    }

    fn on_maximize(&mut self) {
        self.send(StateEvent::MaximizeRequested);
    }

    fn on_timer(&mut self, id: usize) {
        match id {
            REFRESH_TIMER_ID => self.refresh_magnifier(),
            TITLE_TIMER_ID => {
                self.host.kill_timer(TITLE_TIMER_ID);
                self.send(StateEvent::TitleTimerElapsed);
            }
            _ => {}
        }
    }

    fn client_hits_pass_through(&self) -> bool {
        self.state.client_hits_pass_through()
    }

    fn on_destroy(&mut self) {
        self.host.kill_timer(REFRESH_TIMER_ID);
        self.host.kill_timer(TITLE_TIMER_ID);
        self.pin_hotkey = None;
    }
}

/// Create the filter window and run until it is closed
///
/// # Returns
/// The exit code carried by `WM_QUIT`
pub fn run(paths: &ConfigPaths) -> Result<i32, AppError> {
    let _runtime = MagnificationRuntime::initialize()?;

    let shortcuts = ShortcutConfig::load_or_create(&paths.shortcuts);
    let mut store = SavedRectStore::new(&paths.saved_rects);
    if let Err(e) = store.load() {
        debug!("{e}");
    }

    let screen = window::screen_rect();
    let host = HostWindow::create(title::INITIAL_TITLE, screen)?;
    let controller = AppController::new(&host, shortcuts, store, screen)?;
    host.attach_magnifier(controller.magnifier.hwnd());
    host.install_handler(Box::new(controller));

    let handle = host.handle();
    handle.apply_dark_mode();
    host.show_maximized();
    handle.start_timer(REFRESH_TIMER_ID, REFRESH_INTERVAL_MS);
    info!(hotkey = %shortcuts.describe_hotkey(), "Screen filter running");

    let exit_code = window::run_message_loop();
    drop(host);
    Ok(exit_code)
}
