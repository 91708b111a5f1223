use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use uuid::Uuid;

use crate::player::{ChapterTrack, PlaybackEngine, PlaybackSample, SampleListener, Subscription};

type SharedListener = Arc<dyn Fn(PlaybackSample) + Send + Sync>;

/// In-process engine driven by hand: `set_time` plays the role of the
/// player's time-update event.
#[derive(Clone, Default)]
pub struct SimulatedPlayer {
    inner: Arc<SimulatedInner>,
}

#[derive(Default)]
struct SimulatedInner {
    sample: Mutex<PlaybackSample>,
    listeners: Mutex<HashMap<Uuid, SharedListener>>,
    seeks: Mutex<Vec<f64>>,
    tracks: Mutex<Vec<ChapterTrack>>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64) -> Self {
        let player = Self::default();
        player.lock_sample().duration = duration;
        player
    }

    /// Moves the playhead and notifies every listener.
    pub fn set_time(&self, current_time: f64) {
        let sample = {
            let mut sample = self.lock_sample();
            sample.current_time = current_time;
            *sample
        };
        self.emit(sample);
    }

    pub fn position(&self) -> f64 {
        self.lock_sample().current_time
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .expect("SimulatedPlayer listeners poisoned")
            .len()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.inner
            .seeks
            .lock()
            .expect("SimulatedPlayer seeks poisoned")
            .clone()
    }

    pub fn chapter_tracks(&self) -> Vec<ChapterTrack> {
        self.inner
            .tracks
            .lock()
            .expect("SimulatedPlayer tracks poisoned")
            .clone()
    }

    fn lock_sample(&self) -> std::sync::MutexGuard<'_, PlaybackSample> {
        self.inner
            .sample
            .lock()
            .expect("SimulatedPlayer sample poisoned")
    }

    fn emit(&self, sample: PlaybackSample) {
        // Listeners run outside the lock so they may seek or unsubscribe.
        let listeners: Vec<SharedListener> = self
            .inner
            .listeners
            .lock()
            .expect("SimulatedPlayer listeners poisoned")
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(sample);
        }
    }
}

impl PlaybackEngine for SimulatedPlayer {
    fn subscribe(&self, listener: SampleListener) -> Subscription {
        let id = Uuid::new_v4();
        self.inner
            .listeners
            .lock()
            .expect("SimulatedPlayer listeners poisoned")
            .insert(id, Arc::from(listener));

        let inner: Weak<SimulatedInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .listeners
                    .lock()
                    .expect("SimulatedPlayer listeners poisoned")
                    .remove(&id);
            }
        })
    }

    fn seek(&self, position: f64) {
        self.inner
            .seeks
            .lock()
            .expect("SimulatedPlayer seeks poisoned")
            .push(position);
        self.set_time(position);
    }

    fn add_chapter_track(&self, track: ChapterTrack) {
        self.inner
            .tracks
            .lock()
            .expect("SimulatedPlayer tracks poisoned")
            .push(track);
    }

    fn current_sample(&self) -> Option<PlaybackSample> {
        Some(*self.lock_sample())
    }
}
