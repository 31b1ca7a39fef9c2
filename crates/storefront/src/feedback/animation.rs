//! Self-removing, timer-driven animations.
//!
//! Each animation moves through `Created -> Animating -> Completed`:
//!
//! - **Created**: appended to the active set as soon as it is started, painted
//!   at its start position.
//! - **Animating**: a short start-delay timer flips the instance into its
//!   transition so the first paint happens at the start position.
//! - **Completed**: the completion timer removes the instance.
//!
//! Both timers belong to the instance and are aborted together when it is torn
//! down early (capacity eviction, stale sweep, [`AnimationLayer::unmount`], or
//! the layer being dropped). Cart mutations never wait on any of this.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use quickcart_core::Point;
use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Entries older than this are force-expired even if their timer never fired.
pub const DEFAULT_ANIMATION_CEILING: Duration = Duration::from_secs(10);

/// Unique id of an animation instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnimationId(String);

impl AnimationId {
    /// `"{prefix}-{unix_millis}-{random}"`.
    fn generate(prefix: &str) -> Self {
        Self(format!(
            "{prefix}-{}-{:016x}",
            chrono::Utc::now().timestamp_millis(),
            rand::random::<u64>()
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnimationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What is being animated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKind {
    /// Product image flying from the clicked button to the cart button.
    FlyingItem {
        start: Point,
        end: Point,
        product_image: Url,
    },
    /// "Added to cart" toast above the clicked button.
    Confirmation { position: Point },
}

impl AnimationKind {
    const fn id_prefix(&self) -> &'static str {
        match self {
            Self::FlyingItem { .. } => "flying",
            Self::Confirmation { .. } => "confirmation",
        }
    }

    /// Timing used by [`AnimationLayer::start`].
    #[must_use]
    pub const fn default_timing(&self) -> AnimationTiming {
        match self {
            Self::FlyingItem { .. } => AnimationTiming::FLYING_ITEM,
            Self::Confirmation { .. } => AnimationTiming::CONFIRMATION,
        }
    }
}

/// Timer settings of one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Delay before the transition starts.
    pub start_delay: Duration,
    /// Time from creation until the fade-out starts.
    pub visible_for: Duration,
    /// Fade-out length; zero when the transition itself fades.
    pub fade_out: Duration,
}

impl AnimationTiming {
    pub const FLYING_ITEM: Self = Self {
        start_delay: Duration::from_millis(50),
        visible_for: Duration::from_millis(1500),
        fade_out: Duration::ZERO,
    };

    pub const FLYING_ITEM_FAST: Self = Self {
        start_delay: Duration::from_millis(50),
        visible_for: Duration::from_millis(800),
        fade_out: Duration::ZERO,
    };

    pub const CONFIRMATION: Self = Self {
        start_delay: Duration::ZERO,
        visible_for: Duration::from_millis(1000),
        fade_out: Duration::from_millis(300),
    };

    /// Time from creation until removal.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.visible_for.saturating_add(self.fade_out)
    }
}

/// Visual phase of a live animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Created,
    Animating,
    FadingOut,
}

/// Render-ready copy of a live animation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationSnapshot {
    pub id: AnimationId,
    #[serde(flatten)]
    pub kind: AnimationKind,
    pub phase: AnimationPhase,
    /// Milliseconds until removal.
    pub remaining_ms: u64,
}

/// The start-delay and completion timers of one instance.
struct TimerPair {
    start: Option<AbortHandle>,
    complete: Option<AbortHandle>,
}

impl TimerPair {
    fn cancel(&self) {
        if let Some(start) = &self.start {
            start.abort();
        }
        if let Some(complete) = &self.complete {
            complete.abort();
        }
    }
}

struct ActiveAnimation {
    id: AnimationId,
    kind: AnimationKind,
    timing: AnimationTiming,
    created_at: Instant,
    animating: bool,
    timers: TimerPair,
}

impl ActiveAnimation {
    fn phase(&self, now: Instant) -> AnimationPhase {
        if !self.animating {
            AnimationPhase::Created
        } else if !self.timing.fade_out.is_zero()
            && now.duration_since(self.created_at) >= self.timing.visible_for
        {
            AnimationPhase::FadingOut
        } else {
            AnimationPhase::Animating
        }
    }

    fn snapshot(&self, now: Instant) -> AnimationSnapshot {
        let remaining = self
            .timing
            .total()
            .saturating_sub(now.duration_since(self.created_at));
        AnimationSnapshot {
            id: self.id.clone(),
            kind: self.kind.clone(),
            phase: self.phase(now),
            remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Default)]
struct LayerState {
    active: Vec<ActiveAnimation>,
}

impl LayerState {
    fn position(&self, id: &AnimationId) -> Option<usize> {
        self.active.iter().position(|a| &a.id == id)
    }

    fn remove(&mut self, id: &AnimationId) -> Option<ActiveAnimation> {
        let index = self.position(id)?;
        let animation = self.active.remove(index);
        animation.timers.cancel();
        Some(animation)
    }

    fn sweep(&mut self, now: Instant, ceiling: Duration) {
        self.active.retain(|a| {
            let stale = now.duration_since(a.created_at) > ceiling;
            if stale {
                warn!(id = %a.id, "Force-expiring stale animation");
                a.timers.cancel();
            }
            !stale
        });
    }
}

impl Drop for LayerState {
    fn drop(&mut self) {
        for animation in &self.active {
            animation.timers.cancel();
        }
    }
}

/// The set of live animations for one shopper.
///
/// Cheaply cloneable; clones share the same set. Timers hold only a weak
/// reference, so dropping the last clone tears everything down.
#[derive(Clone)]
pub struct AnimationLayer {
    state: Arc<Mutex<LayerState>>,
    max_active: usize,
    ceiling: Duration,
}

impl std::fmt::Debug for AnimationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationLayer")
            .field("active", &self.len())
            .field("max_active", &self.max_active)
            .field("ceiling", &self.ceiling)
            .finish()
    }
}

impl AnimationLayer {
    /// Create a layer holding at most `max_active` concurrent animations.
    #[must_use]
    pub fn new(max_active: usize) -> Self {
        Self::with_ceiling(max_active, DEFAULT_ANIMATION_CEILING)
    }

    /// Create a layer with a custom stale-entry ceiling.
    #[must_use]
    pub fn with_ceiling(max_active: usize, ceiling: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(LayerState::default())),
            max_active: max_active.max(1),
            ceiling,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LayerState> {
        lock_state(&self.state)
    }

    /// Start an animation with its kind's default timing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, kind: AnimationKind) -> AnimationId {
        let timing = kind.default_timing();
        self.start_with_timing(kind, timing)
    }

    /// Start an animation with explicit timing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_with_timing(&self, kind: AnimationKind, timing: AnimationTiming) -> AnimationId {
        let now = Instant::now();
        let mut state = self.lock();
        state.sweep(now, self.ceiling);

        while state.active.len() >= self.max_active {
            let oldest = state.active.remove(0);
            oldest.timers.cancel();
            warn!(id = %oldest.id, max_active = self.max_active, "Animation limit reached, expiring oldest");
        }

        let mut id = AnimationId::generate(kind.id_prefix());
        while state.position(&id).is_some() {
            id = AnimationId::generate(kind.id_prefix());
        }

        let animating = timing.start_delay.is_zero();
        let start = (!animating).then(|| self.spawn_start_timer(id.clone(), timing.start_delay));
        let complete = Some(self.spawn_completion_timer(id.clone(), timing.total()));

        state.active.push(ActiveAnimation {
            id: id.clone(),
            kind,
            timing,
            created_at: now,
            animating,
            timers: TimerPair { start, complete },
        });
        drop(state);

        debug!(id = %id, "Animation started");
        id
    }

    fn spawn_start_timer(&self, id: AnimationId, delay: Duration) -> AbortHandle {
        let weak = Arc::downgrade(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            with_state(&weak, |state| {
                if let Some(index) = state.position(&id)
                    && let Some(animation) = state.active.get_mut(index)
                {
                    animation.animating = true;
                }
            });
        })
        .abort_handle()
    }

    fn spawn_completion_timer(&self, id: AnimationId, after: Duration) -> AbortHandle {
        let weak = Arc::downgrade(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            with_state(&weak, |state| {
                // Take the entry out before cancelling so this task does not abort itself
                // while still holding the lock.
                if let Some(index) = state.position(&id) {
                    let animation = state.active.remove(index);
                    if let Some(start) = &animation.timers.start {
                        start.abort();
                    }
                    debug!(id = %id, "Animation completed");
                }
            });
        })
        .abort_handle()
    }

    /// Tear one animation down early. Returns whether it was live.
    pub fn cancel(&self, id: &AnimationId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Live animations, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<AnimationSnapshot> {
        let now = Instant::now();
        let mut state = self.lock();
        state.sweep(now, self.ceiling);
        state.active.iter().map(|a| a.snapshot(now)).collect()
    }

    /// Whether `id` is still live.
    #[must_use]
    pub fn contains(&self, id: &AnimationId) -> bool {
        self.lock().position(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every timer and drop every animation.
    pub fn unmount(&self) {
        let mut state = self.lock();
        for animation in state.active.drain(..) {
            animation.timers.cancel();
        }
    }
}

fn lock_state(state: &Mutex<LayerState>) -> MutexGuard<'_, LayerState> {
    // A panic while holding the lock cannot leave the set half-updated in a
    // way that matters for rendering, so keep serving it.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_state(weak: &Weak<Mutex<LayerState>>, f: impl FnOnce(&mut LayerState)) {
    if let Some(state) = weak.upgrade() {
        f(&mut lock_state(&state));
    }
}
