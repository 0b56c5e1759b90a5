//! Screen filter
//!
//! Recolors a user-selected region of the desktop live: inversion, grayscale
//! and dimming, applied by the Windows Magnification API to a window that
//! sits on top of the region. Everything outside `platform`, `input` and
//! `app::controller` is platform independent.

pub mod app;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ui;

#[cfg(windows)]
pub mod input;
#[cfg(windows)]
pub mod platform;
