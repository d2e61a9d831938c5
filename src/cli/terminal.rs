//! Styling for text output.
//!
//! Colour is applied only when stdout supports it, so piped output and the
//! JSON format stay plain.

use std::fmt::Display;

use contextgit::{SyncStatus, domain::SyncLabels};
use owo_colors::{OwoColorize, colors::css};

/// Terminals narrower than this get one-line entries.
const NARROW_COLUMNS: u16 = 60;

/// The emphasis given to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Nothing needs attention.
    Good,
    /// Drift the user should review.
    Caution,
    /// Something could not be found.
    Bad,
    /// Requirement ids.
    Key,
    /// Secondary detail.
    Quiet,
}

impl From<SyncStatus> for Tone {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Ok => Self::Good,
            SyncStatus::Stale => Self::Caution,
            SyncStatus::Broken => Self::Bad,
        }
    }
}

/// Style `text`, or leave it plain when colour is unavailable.
pub fn paint(text: impl Display, tone: Tone) -> String {
    if colour_enabled() {
        styled(&text, tone)
    } else {
        text.to_string()
    }
}

/// A sync status under its configured label, coloured by health.
pub fn sync_status(status: SyncStatus, labels: &SyncLabels) -> String {
    paint(labels.label(status), status.into())
}

pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < NARROW_COLUMNS)
}

fn colour_enabled() -> bool {
    supports_color::on_cached(supports_color::Stream::Stdout).is_some()
}

fn styled(text: &impl Display, tone: Tone) -> String {
    match tone {
        Tone::Good => text.fg::<css::Green>().to_string(),
        Tone::Caution => text.fg::<css::Orange>().to_string(),
        Tone::Bad => text.fg::<css::Crimson>().to_string(),
        Tone::Key => text.fg::<css::LightBlue>().to_string(),
        Tone::Quiet => text.dimmed().to_string(),
    }
}
