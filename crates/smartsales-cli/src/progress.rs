//! Spinner utilities for backend fetches

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for a fetch of unknown duration
///
/// Hidden when `quiet` so scripted output stays clean.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Format a duration in milliseconds as a short label
pub fn format_elapsed(millis: u128) -> String {
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", millis as f64 / 1000.0)
    }
}
