use std::sync::{
    Arc, Mutex, MutexGuard, Weak,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{oneshot, watch};

use crate::{
    api::SkipTimesSource,
    gate::{Visibility, VisibilityGate},
    player::{ChapterTrack, PlaybackEngine, Subscription},
    types::{SkipRequest, SkipTimesResponse},
    windows::{SkipWindows, WindowKind, derive_windows},
};

/// Where the skip-times lookup for the current target stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    /// Windows are installed and the gate is subscribed.
    Ready,
    /// Failed or nothing found; no skip affordances for this target.
    Unavailable,
    /// The controller was unmounted. Final.
    Cancelled,
}

/// Fetches skip times for one episode and keeps the skip affordances in sync
/// with playback.
///
/// The lookup runs as a task owned by the controller. Dropping the controller
/// (or calling [`SkipController::unmount`]) cancels it and releases the
/// playback subscription.
pub struct SkipController {
    engine: Arc<dyn PlaybackEngine>,
    source: Arc<dyn SkipTimesSource>,
    shared: Arc<Shared>,
    /// Dropping the sender cancels the in-flight lookup.
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

struct Shared {
    state: Mutex<ControllerState>,
    /// Bumped under the state lock whenever the target changes or the
    /// controller unmounts. Listeners read it without the lock.
    generation: AtomicU64,
    visibility: watch::Sender<Visibility>,
    status: watch::Sender<FetchStatus>,
}

struct ControllerState {
    mounted: bool,
    request: SkipRequest,
    response: Option<SkipTimesResponse>,
    gate: Arc<VisibilityGate>,
    subscription: Option<Subscription>,
}

impl SkipController {
    /// Starts the skip-times lookup for `request`.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        engine: Arc<dyn PlaybackEngine>,
        source: Arc<dyn SkipTimesSource>,
        request: SkipRequest,
    ) -> Self {
        let (visibility, _) = watch::channel(Visibility::default());
        let (status, _) = watch::channel(FetchStatus::Pending);
        let generation = 1;

        let controller = Self {
            engine,
            source,
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    mounted: true,
                    request,
                    response: None,
                    gate: Arc::new(VisibilityGate::default()),
                    subscription: None,
                }),
                generation: AtomicU64::new(generation),
                visibility,
                status,
            }),
            cancel: Mutex::new(None),
        };

        controller.start_fetch(request, generation);
        controller
    }

    /// Points the controller at another episode: the in-flight lookup is
    /// cancelled, current windows are dropped, and a new lookup starts.
    pub fn retarget(&self, request: SkipRequest) {
        self.cancel_fetch();
        let (generation, previous) = {
            let mut state = self.shared.lock_state();
            if !state.mounted {
                return;
            }
            state.request = request;
            let generation = self.shared.advance();
            self.shared.status.send_replace(FetchStatus::Pending);
            (generation, self.shared.clear(&mut state))
        };
        release(previous);
        self.start_fetch(request, generation);
    }

    /// Cancels the lookup and releases the playback subscription. Idempotent.
    pub fn unmount(&self) {
        self.cancel_fetch();

        let previous = {
            let mut state = self.shared.lock_state();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            self.shared.advance();
            self.shared.status.send_replace(FetchStatus::Cancelled);
            tracing::debug!(
                mal_id = state.request.mal_id,
                episode = state.request.episode,
                "skip controller unmounted"
            );
            self.shared.clear(&mut state)
        };
        release(previous);
    }

    pub fn visibility(&self) -> Visibility {
        *self.shared.visibility.borrow()
    }

    /// Change notifications for the rendering layer.
    pub fn subscribe_visibility(&self) -> watch::Receiver<Visibility> {
        self.shared.visibility.subscribe()
    }

    pub fn status(&self) -> FetchStatus {
        *self.shared.status.borrow()
    }

    /// Resolves once the current lookup has settled.
    pub async fn settled(&self) -> FetchStatus {
        let mut status = self.shared.status.subscribe();
        match status.wait_for(|s| *s != FetchStatus::Pending).await {
            Ok(current) => *current,
            Err(_) => FetchStatus::Cancelled,
        }
    }

    pub fn request(&self) -> SkipRequest {
        self.shared.lock_state().request
    }

    pub fn response(&self) -> Option<SkipTimesResponse> {
        self.shared.lock_state().response.clone()
    }

    pub fn windows(&self) -> SkipWindows {
        self.shared.lock_state().gate.windows().clone()
    }

    /// Seeks past the opening. Does nothing unless the opening affordance is shown.
    pub fn skip_opening(&self) -> bool {
        self.skip(WindowKind::Opening)
    }

    /// Seeks past the ending. Does nothing unless the ending affordance is shown.
    pub fn skip_ending(&self) -> bool {
        self.skip(WindowKind::Ending)
    }

    fn skip(&self, kind: WindowKind) -> bool {
        let visibility = self.visibility();
        let target = self.shared.lock_state().gate.jump_target(kind, visibility);

        match target {
            Some(position) => {
                tracing::debug!(?kind, position, "skipping window");
                self.engine.seek(position);
                true
            }
            None => false,
        }
    }

    fn start_fetch(&self, request: SkipRequest, generation: u64) {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let source = Arc::clone(&self.source);
        let engine = Arc::clone(&self.engine);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel_rx => {
                    tracing::debug!(mal_id = request.mal_id, episode = request.episode, "skip-times lookup cancelled");
                }
                result = source.fetch(&request) => match result {
                    Ok(response) if response.found => {
                        shared.install(&engine, generation, response);
                    }
                    Ok(response) => {
                        tracing::info!(
                            mal_id = request.mal_id,
                            episode = request.episode,
                            message = %response.message,
                            "no skip times found"
                        );
                        shared.settle(generation, FetchStatus::Unavailable);
                    }
                    Err(e) => {
                        tracing::warn!(
                            mal_id = request.mal_id,
                            episode = request.episode,
                            error = %e,
                            "skip-times lookup failed, skip affordances disabled"
                        );
                        shared.settle(generation, FetchStatus::Unavailable);
                    }
                }
            }
        });

        *self.cancel.lock().expect("SkipController cancel poisoned") = Some(cancel_tx);
    }

    fn cancel_fetch(&self) {
        self.cancel
            .lock()
            .expect("SkipController cancel poisoned")
            .take();
    }
}

impl Drop for SkipController {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Releases outside the state lock; the engine may call back into the controller.
fn release(subscription: Option<Subscription>) {
    if let Some(subscription) = subscription {
        subscription.release();
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("SkipController state poisoned")
    }

    /// Call with the state lock held.
    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, state: &ControllerState, generation: u64) -> bool {
        state.mounted && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Drops windows and visibility for the current target and hands back the
    /// subscription for the caller to release once the lock is gone.
    fn clear(&self, state: &mut ControllerState) -> Option<Subscription> {
        state.response = None;
        state.gate = Arc::new(VisibilityGate::default());
        self.visibility.send_replace(Visibility::default());
        state.subscription.take()
    }

    fn settle(&self, generation: u64, status: FetchStatus) {
        let state = self.lock_state();
        if self.is_current(&state, generation) {
            self.status.send_replace(status);
        }
    }

    /// Publishes only while `generation` is current. The check runs inside the
    /// watch lock, so a reset by `clear` is never overwritten by a late sample.
    fn publish(&self, generation: u64, visibility: Visibility) {
        self.visibility.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    fn install(
        self: &Arc<Self>,
        engine: &Arc<dyn PlaybackEngine>,
        generation: u64,
        response: SkipTimesResponse,
    ) {
        let windows = derive_windows(&response);
        let gate = Arc::new(VisibilityGate::new(windows.clone()));

        let (request, previous) = {
            let mut state = self.lock_state();
            if !self.is_current(&state, generation) {
                tracing::debug!(generation, "discarding stale skip-times response");
                return;
            }
            state.response = Some(response);
            state.gate = Arc::clone(&gate);
            self.visibility.send_replace(Visibility::default());
            (state.request, state.subscription.take())
        };

        // Release before acquiring so the old gate never sees another sample.
        release(previous);
        engine.add_chapter_track(ChapterTrack::chapters(windows.cues()));

        let shared: Weak<Shared> = Arc::downgrade(self);
        let listener_gate = Arc::clone(&gate);
        let subscription = engine.subscribe(Box::new(move |sample| {
            if let Some(shared) = shared.upgrade() {
                shared.publish(generation, listener_gate.observe(sample));
            }
        }));

        // A paused player sends no samples; start from where it stands.
        if let Some(sample) = engine.current_sample() {
            self.publish(generation, gate.observe(sample));
        }

        {
            let mut state = self.lock_state();
            if !self.is_current(&state, generation) {
                drop(state);
                subscription.release();
                tracing::debug!(generation, "target changed during install");
                return;
            }
            state.subscription = Some(subscription);
            self.status.send_replace(FetchStatus::Ready);
        }

        tracing::info!(
            mal_id = request.mal_id,
            episode = request.episode,
            windows = windows.len(),
            "skip windows installed"
        );
    }
}
