//! Tile loader contract
//!
//! Loading and decoding run outside the tile system; the tile only consumes
//! a small contract around them. Completion is delivered over a channel and
//! polled once per frame boundary, so the payload is always assigned at a
//! safe point relative to bounds reads, even when the decode work settles on
//! another thread. Cancellation is cooperative via a shared token.

use atlas_render::DecodedTile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Loader state machine.
///
/// `Loaded` is an intermediate marker between transfer and decode; the
/// settled states are `Ready`, `Canceled` and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Created, not started
    Initialized,

    /// Transfer in progress
    Loading,

    /// Transfer finished, decode not yet started
    Loaded,

    /// Decode in progress
    Decoding,

    /// Decode finished successfully
    Ready,

    /// Canceled before settling
    Canceled,

    /// Transfer or decode failed
    Failed,
}

impl LoaderState {
    /// Whether this is a terminal state
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Canceled | Self::Failed)
    }
}

/// Why a load did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The load was canceled; an ordinary outcome, not a fault
    #[error("tile load was canceled")]
    Canceled,

    /// The transfer or decode failed; an ordinary outcome, eligible for retry
    #[error("tile load failed: {0}")]
    Failed(String),

    /// The loader misbehaved (e.g. its worker exited without settling)
    #[error("loader terminated unexpectedly: {0}")]
    Unexpected(String),
}

/// Cancellation token for cooperative load cancellation.
///
/// All clones share the same underlying state. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and all clones
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether `cancel` has been called on this token or any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

enum LoaderMessage {
    State(LoaderState),
    Settled(Result<DecodedTile, LoaderError>),
}

/// Handle given to load work so it can report intermediate states and
/// observe cancellation.
pub struct LoaderProgress {
    tx: Sender<LoaderMessage>,
    token: CancellationToken,
}

impl LoaderProgress {
    /// Report that the transfer finished and decode is about to start
    pub fn mark_loaded(&self) {
        let _ = self.tx.send(LoaderMessage::State(LoaderState::Loaded));
    }

    /// Report that decode started
    pub fn mark_decoding(&self) {
        let _ = self.tx.send(LoaderMessage::State(LoaderState::Decoding));
    }

    /// Whether the load has been cancelled; work should return
    /// `Err(LoaderError::Canceled)` promptly when it observes this
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Contract between a tile and its loader.
///
/// Priority updates are fire-and-forget hints; a loader may reorder its own
/// queue on them but is not required to act immediately.
pub trait TileLoader: Send {
    /// Current state
    fn state(&self) -> LoaderState;

    /// Whether the loader has reached a terminal state
    fn is_finished(&self) -> bool {
        self.state().is_settled()
    }

    /// Begin loading and decoding. No-op if already started.
    fn start(&mut self);

    /// Non-blocking settlement check, called once per frame boundary.
    ///
    /// Returns `Some` exactly once, when the loader settles.
    fn poll(&mut self) -> Option<Result<DecodedTile, LoaderError>>;

    /// Hint the loader about the tile's estimated visible screen area
    fn update_priority(&mut self, area: f64);

    /// Request cancellation. Fire-and-forget; the loader settles as
    /// `Canceled` once the in-flight work observes the request.
    fn cancel(&mut self);
}

type LoadFn = Box<dyn FnOnce(&LoaderProgress) -> Result<DecodedTile, LoaderError> + Send>;

/// Loader that runs its load-and-decode work on a worker thread and
/// delivers the result over a channel.
pub struct ChannelTileLoader {
    state: LoaderState,
    work: Option<LoadFn>,
    rx: Option<Receiver<LoaderMessage>>,
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
    priority: f64,
}

impl ChannelTileLoader {
    /// Create a loader around a load-and-decode closure.
    ///
    /// The closure runs on a worker thread once `start` is called. It should
    /// check `LoaderProgress::is_cancelled` between phases.
    pub fn new(
        work: impl FnOnce(&LoaderProgress) -> Result<DecodedTile, LoaderError> + Send + 'static,
    ) -> Self {
        Self {
            state: LoaderState::Initialized,
            work: Some(Box::new(work)),
            rx: None,
            handle: None,
            token: CancellationToken::new(),
            priority: 0.0,
        }
    }

    /// Most recent priority hint
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Block until the loader settles, then return the result.
    ///
    /// Test and tooling convenience; frame drivers use `poll`.
    pub fn wait_settled(&mut self) -> Option<Result<DecodedTile, LoaderError>> {
        loop {
            let message = match self.rx.as_ref() {
                None => return None,
                Some(rx) => rx.recv(),
            };
            match message {
                Ok(message) => {
                    if let Some(result) = self.handle_message(message) {
                        return Some(result);
                    }
                }
                Err(_) => {
                    self.state = LoaderState::Failed;
                    self.rx = None;
                    return Some(Err(LoaderError::Unexpected(
                        "loader thread exited without settling".to_string(),
                    )));
                }
            }
        }
    }

    fn handle_message(
        &mut self,
        message: LoaderMessage,
    ) -> Option<Result<DecodedTile, LoaderError>> {
        match message {
            LoaderMessage::State(state) => {
                if !self.state.is_settled() {
                    self.state = state;
                }
                None
            }
            LoaderMessage::Settled(result) => {
                self.state = match &result {
                    Ok(_) => LoaderState::Ready,
                    Err(LoaderError::Canceled) => LoaderState::Canceled,
                    Err(_) => LoaderState::Failed,
                };
                self.rx = None;
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Some(result)
            }
        }
    }
}

impl TileLoader for ChannelTileLoader {
    fn state(&self) -> LoaderState {
        self.state
    }

    fn start(&mut self) {
        if self.state != LoaderState::Initialized {
            return;
        }
        let Some(work) = self.work.take() else {
            return;
        };

        let (tx, rx) = mpsc::channel();
        let progress = LoaderProgress {
            tx: tx.clone(),
            token: self.token.clone(),
        };
        self.state = LoaderState::Loading;
        self.rx = Some(rx);
        self.handle = Some(thread::spawn(move || {
            let result = if progress.is_cancelled() {
                Err(LoaderError::Canceled)
            } else {
                work(&progress)
            };
            let _ = tx.send(LoaderMessage::Settled(result));
        }));
    }

    fn poll(&mut self) -> Option<Result<DecodedTile, LoaderError>> {
        loop {
            let message = match self.rx.as_ref() {
                None => return None,
                Some(rx) => rx.try_recv(),
            };
            match message {
                Ok(message) => {
                    if let Some(result) = self.handle_message(message) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.state = LoaderState::Failed;
                    self.rx = None;
                    return Some(Err(LoaderError::Unexpected(
                        "loader thread exited without settling".to_string(),
                    )));
                }
            }
        }
    }

    fn update_priority(&mut self, area: f64) {
        self.priority = area;
        log::trace!("loader priority hint: {area}");
    }

    fn cancel(&mut self) {
        self.token.cancel();
        if self.state == LoaderState::Initialized {
            self.work = None;
            self.state = LoaderState::Canceled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_load() {
        let mut loader = ChannelTileLoader::new(|progress| {
            progress.mark_loaded();
            progress.mark_decoding();
            Ok(DecodedTile::new().with_payload_bytes(128))
        });
        assert_eq!(loader.state(), LoaderState::Initialized);
        assert!(!loader.is_finished());

        loader.start();
        let result = loader.wait_settled().expect("loader was started");
        let decoded = result.expect("load succeeds");

        assert_eq!(decoded.payload_bytes, Some(128));
        assert_eq!(loader.state(), LoaderState::Ready);
        assert!(loader.is_finished());

        // Settlement is delivered exactly once
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_failed_load() {
        let mut loader =
            ChannelTileLoader::new(|_| Err(LoaderError::Failed("404".to_string())));
        loader.start();

        let result = loader.wait_settled().unwrap();
        assert!(matches!(result, Err(LoaderError::Failed(ref reason)) if reason == "404"));
        assert_eq!(loader.state(), LoaderState::Failed);
    }

    #[test]
    fn test_cancel_before_start() {
        let mut loader = ChannelTileLoader::new(|_| Ok(DecodedTile::new()));
        loader.cancel();
        assert_eq!(loader.state(), LoaderState::Canceled);

        // Starting after cancellation does nothing
        loader.start();
        assert_eq!(loader.state(), LoaderState::Canceled);
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_cancel_in_flight() {
        use std::sync::mpsc::channel;
        let (release_tx, release_rx) = channel::<()>();

        let mut loader = ChannelTileLoader::new(move |progress| {
            // Hold until the test cancels, then observe the token
            let _ = release_rx.recv();
            if progress.is_cancelled() {
                return Err(LoaderError::Canceled);
            }
            Ok(DecodedTile::new())
        });
        loader.start();
        assert_eq!(loader.state(), LoaderState::Loading);

        loader.cancel();
        release_tx.send(()).unwrap();

        let result = loader.wait_settled().unwrap();
        assert!(matches!(result, Err(LoaderError::Canceled)));
        assert_eq!(loader.state(), LoaderState::Canceled);
    }

    #[test]
    fn test_intermediate_states_reported() {
        use std::sync::mpsc::channel;
        let (reached_tx, reached_rx) = channel::<()>();
        let (release_tx, release_rx) = channel::<()>();

        let mut loader = ChannelTileLoader::new(move |progress| {
            progress.mark_loaded();
            progress.mark_decoding();
            reached_tx.send(()).unwrap();
            let _ = release_rx.recv();
            Ok(DecodedTile::new())
        });
        loader.start();

        // Wait for the worker to report, then poll the state updates
        reached_rx.recv().unwrap();
        assert!(loader.poll().is_none());
        assert_eq!(loader.state(), LoaderState::Decoding);

        release_tx.send(()).unwrap();
        assert!(loader.wait_settled().unwrap().is_ok());
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[test]
    fn test_priority_hint_stored() {
        let mut loader = ChannelTileLoader::new(|_| Ok(DecodedTile::new()));
        loader.update_priority(42.5);
        assert_eq!(loader.priority(), 42.5);
    }
}
