//! Application state management
//!
//! All state the host window procedure needs lives in [`AppState`]. Input
//! arrives as a [`StateEvent`]; handling it updates the state and returns the
//! [`Effect`]s the platform layer must carry out. Nothing in here touches
//! Win32, so every transition is unit tested.

use tracing::debug;

use crate::config::saved_rects::{SavedRectEntry, SavedRectStore};
use crate::config::shortcuts::ShortcutConfig;
use crate::domain::color::{ColorMatrix, ColorSettings};
use crate::domain::core::{FrameMetrics, Point, Rect};
use crate::domain::keyboard::KeyCommand;
use crate::domain::selection::Selection;
use crate::ui::title;

/// Slot the `0` key starts cycling from
const FIRST_CYCLE_SLOT: usize = 1;

/// Input delivered to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// Left click at a screen position
    Click(Point),
    /// Key press on the host window
    Key { code: u32, ctrl: bool },
    /// Global pin hotkey
    PinHotkey,
    /// The user asked the window to maximize
    MaximizeRequested,
    /// A temporary title has been shown long enough
    TitleTimerElapsed,
}

/// Work for the platform layer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetTitle(String),
    /// Show a temporary title and arm the timer that restores the status
    FlashTitle(String),
    /// Position the window so its client area covers this rectangle
    PlaceOverSelection(Rect),
    /// Position the window at this exact window rectangle
    PlaceWindow(Rect),
    /// Push a new color matrix; the title is only updated if that succeeds
    ApplyColors {
        matrix: ColorMatrix,
        title: String,
    },
    /// Write the saved rectangles, keeping slots owned by other instances
    PersistSavedRects,
    SetClickThrough(bool),
    /// Hand keyboard focus to the window under the cursor
    FocusUnderCursor,
    /// Take keyboard focus back
    FocusHost,
    EnterFullScreen,
    LeaveFullScreen,
}

/// Things an event handler may read or update besides the state itself
pub struct EventContext<'a> {
    pub shortcuts: &'a ShortcutConfig,
    pub store: &'a mut SavedRectStore,
    /// Current window rectangle of the host, in screen coordinates
    pub window_rect: Rect,
    pub frame: FrameMetrics,
}

/// Everything that used to be process-wide mutable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub selection: Selection,
    pub colors: ColorSettings,
    /// Click-through mode toggled by the global hotkey
    pub pinned: bool,
    pub full_screen: bool,
    /// Last slot loaded by the `0` key
    pub cycle_slot: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            selection: Selection::new(),
            colors: ColorSettings::default(),
            pinned: false,
            full_screen: false,
            cycle_slot: FIRST_CYCLE_SLOT,
        }
    }
}

impl AppState {
    /// Client-area mouse hits go to the windows underneath once the
    /// selection is complete
    pub fn client_hits_pass_through(&self) -> bool {
        self.selection.is_complete()
    }

    /// Title that belongs to the current state, without any flash message
    pub fn current_title(&self, shortcuts: &ShortcutConfig) -> String {
        if self.selection.is_complete() {
            title::status(&self.colors, self.pinned, shortcuts)
        } else if self.selection.is_in_progress() {
            title::SECOND_POINT_TITLE.to_string()
        } else {
            title::INITIAL_TITLE.to_string()
        }
    }

    /// Processes an event and returns the resulting platform effects
    pub fn handle_event(&mut self, event: StateEvent, ctx: &mut EventContext<'_>) -> Vec<Effect> {
        debug!(?event, "Handling event");
        match event {
            StateEvent::Click(point) => self.handle_click(point, ctx.shortcuts),
            StateEvent::Key { code, ctrl } => match KeyCommand::from_key(code, ctrl, ctx.shortcuts) {
                Some(command) => self.handle_command(command, ctx),
                None => Vec::new(),
            },
            StateEvent::PinHotkey => self.toggle_pin(ctx.shortcuts),
            StateEvent::MaximizeRequested => {
                self.full_screen = true;
                vec![Effect::EnterFullScreen]
            }
            StateEvent::TitleTimerElapsed => vec![Effect::SetTitle(self.current_title(ctx.shortcuts))],
        }
    }

    fn handle_click(&mut self, point: Point, shortcuts: &ShortcutConfig) -> Vec<Effect> {
        match self.selection.add_point(point) {
            Ok(None) => {
                debug!(x = point.x, y = point.y, "First selection point");
                vec![Effect::SetTitle(title::SECOND_POINT_TITLE.to_string())]
            }
            Ok(Some(rect)) => {
                debug!(?rect, "Selection complete");
                // A fresh selection always starts inverted
                self.colors.inversion = true;
                vec![
                    Effect::PlaceOverSelection(rect),
                    Effect::ApplyColors {
                        matrix: self.colors.matrix(),
                        title: title::area_selected(shortcuts),
                    },
                ]
            }
            Err(_) => Vec::new(),
        }
    }

    fn handle_command(&mut self, command: KeyCommand, ctx: &mut EventContext<'_>) -> Vec<Effect> {
        let complete = self.selection.is_complete();
        match command {
            KeyCommand::ExitFullScreen if self.full_screen => {
                self.full_screen = false;
                vec![Effect::LeaveFullScreen]
            }
            KeyCommand::CycleSavedSlot => self.cycle_saved_slot(ctx),
            KeyCommand::SaveSlot(slot) if complete => self.save_slot(slot, ctx),
            KeyCommand::LoadSlot(slot) if self.selection.is_empty() => self.load_slot(slot, ctx),
            KeyCommand::ToggleInversion if complete => {
                self.colors.inversion = !self.colors.inversion;
                self.apply_colors(ctx.shortcuts)
            }
            KeyCommand::ToggleGrayscale if complete => {
                self.colors.grayscale = !self.colors.grayscale;
                self.apply_colors(ctx.shortcuts)
            }
            KeyCommand::CycleGrayLevel if complete => {
                self.colors.gray_level = self.colors.gray_level.next();
                self.apply_colors(ctx.shortcuts)
            }
            _ => Vec::new(),
        }
    }

    fn apply_colors(&self, shortcuts: &ShortcutConfig) -> Vec<Effect> {
        vec![Effect::ApplyColors {
            matrix: self.colors.matrix(),
            title: title::status(&self.colors, self.pinned, shortcuts),
        }]
    }

    fn save_slot(&mut self, slot: usize, ctx: &mut EventContext<'_>) -> Vec<Effect> {
        // Slot 0 belongs to the cycle key
        if slot == 0 {
            return Vec::new();
        }

        // The window may have been moved or resized since the selection, so
        // the live window rectangle is what gets stored
        ctx.store
            .set_entry(slot, SavedRectEntry::new(ctx.window_rect, self.colors));
        debug!(slot, rect = ?ctx.window_rect, "Saved rectangle to slot");

        vec![
            Effect::PersistSavedRects,
            Effect::FlashTitle(title::slot_saved(slot)),
        ]
    }

    fn load_slot(&mut self, slot: usize, ctx: &mut EventContext<'_>) -> Vec<Effect> {
        let Some(entry) = ctx.store.entry(slot).copied() else {
            return vec![Effect::FlashTitle(title::slot_empty(slot))];
        };

        let mut effects = self.apply_entry(&entry, ctx.frame);
        effects.push(Effect::ApplyColors {
            matrix: self.colors.matrix(),
            title: title::area_loaded(ctx.shortcuts),
        });
        effects
    }

    fn cycle_saved_slot(&mut self, ctx: &mut EventContext<'_>) -> Vec<Effect> {
        let Some(slot) = ctx.store.next_valid_slot(self.cycle_slot) else {
            return vec![Effect::FlashTitle(title::NO_SAVED_RECTS_TITLE.to_string())];
        };
        let Some(entry) = ctx.store.entry(slot).copied() else {
            return Vec::new();
        };

        self.cycle_slot = slot;
        let mut effects = self.apply_entry(&entry, ctx.frame);
        effects.push(Effect::ApplyColors {
            matrix: self.colors.matrix(),
            title: title::status(&self.colors, self.pinned, ctx.shortcuts),
        });
        effects.push(Effect::FlashTitle(title::slot_loaded(slot)));
        effects
    }

    /// Restores a saved entry: its colors exactly, and the window at its
    /// stored position
    fn apply_entry(&mut self, entry: &SavedRectEntry, frame: FrameMetrics) -> Vec<Effect> {
        self.colors = entry.colors;
        self.selection = Selection::completed(frame.client_for_window(&entry.rect));
        vec![Effect::PlaceWindow(entry.rect)]
    }

    fn toggle_pin(&mut self, shortcuts: &ShortcutConfig) -> Vec<Effect> {
        if !self.selection.is_complete() {
            return Vec::new();
        }

        self.pinned = !self.pinned;
        debug!(pinned = self.pinned, "Pin toggled");

        let focus = if self.pinned {
            Effect::FocusUnderCursor
        } else {
            Effect::FocusHost
        };
        vec![
            Effect::SetClickThrough(self.pinned),
            focus,
            Effect::SetTitle(self.current_title(shortcuts)),
        ]
    }
}
