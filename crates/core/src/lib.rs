//! Skipgate Core Library
//!
//! Fetches opening/ending skip times from AniSkip, derives skip windows, and
//! gates "skip" affordances on the current playback time of an injected
//! player.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod gate;
pub mod player;
pub mod types;
pub mod windows;

// Re-export commonly used items at crate root
pub use api::{AniSkipClient, SkipTimesSource};
pub use config::ApiConfig;
pub use controller::{FetchStatus, SkipController};
pub use error::{Result, SkipError};
pub use format::{format_chapters_vtt, format_timestamp, format_windows_readable};
pub use gate::{Visibility, VisibilityGate};
pub use player::{
    ChapterCue, ChapterTrack, PlaybackEngine, PlaybackSample, SampleListener, SimulatedPlayer,
    Subscription,
};
pub use types::{SkipEntry, SkipInterval, SkipRequest, SkipTimesResponse, SkipType};
pub use windows::{LabeledWindow, SkipWindows, WindowKind, derive_windows};
