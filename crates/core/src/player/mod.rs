//! The playback engine as seen by the skip controller.
//!
//! The controller never owns a player. It is handed an
//! `Arc<dyn PlaybackEngine>` and only subscribes to time updates, seeks, and
//! registers a chapter track.

pub mod simulated;

use std::fmt;

use serde::Serialize;

pub use simulated::SimulatedPlayer;

/// One time update from the engine, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSample {
    pub current_time: f64,
    pub duration: f64,
}

pub type SampleListener = Box<dyn Fn(PlaybackSample) + Send + Sync>;

/// Keeps a listener registered until dropped or released.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterCue {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterTrack {
    pub kind: String,
    pub label: String,
    pub language: String,
    pub default: bool,
    pub cues: Vec<ChapterCue>,
}

impl ChapterTrack {
    pub fn chapters(cues: Vec<ChapterCue>) -> Self {
        Self {
            kind: "chapters".to_string(),
            label: "English".to_string(),
            language: "en-US".to_string(),
            default: true,
            cues,
        }
    }
}

pub trait PlaybackEngine: Send + Sync {
    /// Register `listener` for every time update until the returned handle is dropped.
    fn subscribe(&self, listener: SampleListener) -> Subscription;

    fn seek(&self, position: f64);

    fn add_chapter_track(&self, track: ChapterTrack);

    /// Where playback stands now, if the engine can tell without waiting for
    /// the next time update.
    fn current_sample(&self) -> Option<PlaybackSample> {
        None
    }
}
