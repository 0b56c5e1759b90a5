// No console window in release builds
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

use std::process::ExitCode;

use screen_filter::config::ConfigPaths;
use screen_filter::logging;

#[cfg(windows)]
fn main() -> ExitCode {
    logging::init();

    let paths = ConfigPaths::from_env();
    tracing::debug!(?paths, "Configuration paths");

    match screen_filter::app::controller::run(&paths) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code.clamp(1, 255) as u8),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(windows))]
fn main() -> ExitCode {
    logging::init();

    let paths = ConfigPaths::from_env();
    tracing::error!(
        shortcuts = %paths.shortcuts.display(),
        "The screen filter needs the Windows Magnification API"
    );
    ExitCode::FAILURE
}
