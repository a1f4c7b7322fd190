//! Frame-throttled inference coordination.
//!
//! Decouples a high-rate frame producer from a slow, latency-variable
//! vision-language backend. At most one inference call is in flight; only
//! every Kth frame is eligible for dispatch; and the hot frame path never
//! waits on inference, it reads the latest completed text, possibly several
//! sampling intervals old.
//!
//! The coordinator is a two-state machine. Idle: a frame whose index is a
//! multiple of the sampling interval dispatches a fire-and-forget call and
//! moves to Busy. Busy: frames are recorded but never dispatched, whatever
//! their index. Completion (success or failure) publishes the response pair
//! in a single swap and returns to Idle.

use crate::config::InferenceConfig;
use crate::error::Result;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A decoded RGB24 video frame.
///
/// Pixel data is reference-counted so clones on the hot path stay O(1).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Packed RGB24 pixels, row-major.
    pub data: Arc<[u8]>,
}

impl Frame {
    /// Wraps decoded pixel data.
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data: data.into() }
    }
}

/// Latest completed inference text plus the busy flag.
///
/// Always replaced as one unit, so readers see either the pre-call or the
/// post-call pair, never a torn value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferenceResponse {
    /// Latest completed text; possibly stale while a call is outstanding.
    pub text: String,
    /// True while an inference call is in flight.
    pub is_processing: bool,
}

/// Future type returned by [`InferenceBackend::infer`].
pub type InferFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// The network vision-language backend: takes an image and a prompt,
/// returns text. Assumed slow and intermittently failing; any error is
/// treated as "no new text".
pub trait InferenceBackend: Send + Sync {
    /// Describes one frame. The returned future runs as a detached task.
    fn infer(&self, frame: Frame, prompt: String) -> InferFuture;
}

/// Bounds the rate of inference calls while keeping the frame path hot.
///
/// Dispatch runs through `tokio::spawn`, so [`submit_frame`] must be called
/// from within a Tokio runtime. There is no mid-call cancellation: a hung
/// backend call keeps the coordinator Busy and simply delays the next
/// dispatch.
///
/// [`submit_frame`]: InferenceCoordinator::submit_frame
pub struct InferenceCoordinator {
    backend: Arc<dyn InferenceBackend>,
    prompt: String,
    sampling_interval: u64,
    /// Busy flag; the only gate for dispatch.
    in_flight: Arc<AtomicBool>,
    /// The published (text, busy) pair, swapped whole.
    response: Arc<Mutex<Arc<InferenceResponse>>>,
    /// Most recent raw frame, kept for reuse.
    last_frame: Mutex<Option<Frame>>,
    frames_seen: AtomicU64,
    dispatched: AtomicU64,
}

impl InferenceCoordinator {
    /// Builds a coordinator over an inference backend.
    #[must_use]
    pub fn new(backend: Arc<dyn InferenceBackend>, config: &InferenceConfig) -> Self {
        Self {
            backend,
            prompt: config.prompt.clone(),
            sampling_interval: config.sampling_interval_frames.max(1),
            in_flight: Arc::new(AtomicBool::new(false)),
            response: Arc::new(Mutex::new(Arc::new(InferenceResponse::default()))),
            last_frame: Mutex::new(None),
            frames_seen: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
        }
    }

    /// Producer entry point for the hot frame path.
    ///
    /// O(1) and non-suspending: it records the frame, decides
    /// dispatch-or-skip, and returns. It never waits on the backend.
    pub fn submit_frame(&self, frame: Frame, frame_index: u64) {
        if self.frames_seen.fetch_add(1, Ordering::Relaxed) == 0 {
            log::info!("first frame received: {}x{}", frame.width, frame.height);
        }
        *lock(&self.last_frame) = Some(frame.clone());

        if frame_index % self.sampling_interval != 0 {
            return;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Busy: the backend still owes us a result for an earlier frame.
            return;
        }

        // Publish the busy pair in one swap before the task starts.
        {
            let mut slot = lock(&self.response);
            *slot = Arc::new(InferenceResponse { text: slot.text.clone(), is_processing: true });
        }

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        log::debug!("dispatching frame {frame_index} for inference");

        let backend = Arc::clone(&self.backend);
        let prompt = self.prompt.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let response = Arc::clone(&self.response);

        tokio::spawn(async move {
            let outcome = backend.infer(frame, prompt).await;

            let mut slot = lock(&response);
            let text = match outcome {
                Ok(text) => text,
                Err(e) => {
                    // Keep serving the previous text; an error string must
                    // never overwrite a good description.
                    log::warn!("inference call failed, keeping previous text: {e}");
                    slot.text.clone()
                }
            };
            *slot = Arc::new(InferenceResponse { text, is_processing: false });
            in_flight.store(false, Ordering::Release);
        });
    }

    /// Latest completed text (possibly stale) and whether a call is
    /// outstanding. Returns immediately; never blocks on inference, never
    /// panics.
    #[must_use]
    pub fn get_current_response(&self) -> InferenceResponse {
        lock(&self.response).as_ref().clone()
    }

    /// Most recent raw frame, for late-joining consumers.
    #[must_use]
    pub fn last_frame(&self) -> Option<Frame> {
        lock(&self.last_frame).clone()
    }

    /// True while an inference call is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of inference calls dispatched so far.
    #[must_use]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Frames between two dispatched calls.
    #[must_use]
    pub fn sampling_interval(&self) -> u64 {
        self.sampling_interval
    }
}

impl std::fmt::Debug for InferenceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceCoordinator")
            .field("sampling_interval", &self.sampling_interval)
            .field("in_flight", &self.is_processing())
            .field("dispatched", &self.dispatched_count())
            .finish()
    }
}

/// A poisoned lock only means a panicking reader; the data is a whole
/// replaced pair and stays valid.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
