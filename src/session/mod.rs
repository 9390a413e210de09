/*!
 * Playback sessions.
 *
 * A session owns one `SyncEngine`, one `NarrationStateMachine` and the
 * collaborators they drive. All mutation happens on a single task that
 * consumes `SessionEvent`s in order:
 * - clock ticks, seeks and offset nudges from the host
 * - speech timers and completions posted back by spawned tasks
 * - finished caption loads, tagged with a generation so stale ones are dropped
 *
 * `SessionHandle` is the cloneable front door to that task.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::{mpsc, oneshot, watch};

use crate::errors::{AppError, SpeechError, TransportError};
use crate::pipeline::{self, LoadSettings};
use crate::providers::TextFetcher;
use crate::sentence::Sentence;
use crate::sync::NarrationPhase;
use crate::youtube::TrackSelection;

pub mod clock;
pub mod loader;
pub mod player;

pub use clock::spawn_clock;
pub use loader::{CaptionLoader, CaptionPayloads};
pub use player::{PlaybackSession, SessionConfig};

/// Completion of a command that may touch the transport
pub type Reply = oneshot::Sender<Result<(), TransportError>>;

/// Everything a session reacts to
#[derive(Debug)]
pub enum SessionEvent {
    /// Transport clock report (seconds)
    Tick { time: f64, reply: Option<Reply> },
    /// The user jumped to `time`
    Seek { time: f64, reply: Option<Reply> },
    /// Nudge the caption offset
    AdjustOffset { delta: f64, reply: Option<Reply> },
    /// Jump to the start of a sentence and play
    SeekToSentence { index: usize, reply: Option<Reply> },
    /// Turn read-along on or off
    SetNarration { enabled: bool, reply: Option<Reply> },
    /// The pause before an utterance has elapsed
    SpeechDue { ticket: u64 },
    /// An utterance ended
    SpeechFinished { ticket: u64, result: Result<(), SpeechError> },
    /// A caption load finished
    Loaded { generation: u64, sentences: Vec<Sentence> },
    /// Report the current state
    Snapshot(oneshot::Sender<SessionSnapshot>),
    /// Stop the session task
    Shutdown,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Generation of the sentences in use, 0 before the first load
    pub generation: u64,
    pub sentence_count: usize,
    pub clock: f64,
    pub offset: f64,
    pub current_index: Option<usize>,
    pub last_narrated_index: Option<usize>,
    pub narration: NarrationPhase,
}

/// Sender side of a playback session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    latest_generation: Arc<AtomicU64>,
    current: watch::Receiver<Option<usize>>,
    loaded: watch::Receiver<u64>,
    load_settings: LoadSettings,
    offset_step_secs: f64,
}

fn session_closed() -> AppError {
    AppError::Unknown("playback session has stopped".to_string())
}

impl SessionHandle {
    pub(crate) fn new(
        events: mpsc::Sender<SessionEvent>,
        latest_generation: Arc<AtomicU64>,
        current: watch::Receiver<Option<usize>>,
        loaded: watch::Receiver<u64>,
        load_settings: LoadSettings,
        offset_step_secs: f64,
    ) -> Self {
        Self {
            events,
            latest_generation,
            current,
            loaded,
            load_settings,
            offset_step_secs,
        }
    }

    /// Report a transport clock value and wait until it is processed
    pub async fn tick(&self, time: f64) -> Result<(), AppError> {
        self.request(|reply| SessionEvent::Tick { time, reply: Some(reply) }).await
    }

    /// Report a transport clock value without waiting
    pub async fn post_tick(&self, time: f64) -> Result<(), AppError> {
        self.post(SessionEvent::Tick { time, reply: None }).await
    }

    pub async fn seek(&self, time: f64) -> Result<(), AppError> {
        self.request(|reply| SessionEvent::Seek { time, reply: Some(reply) }).await
    }

    pub async fn adjust_offset(&self, delta: f64) -> Result<(), AppError> {
        self.request(|reply| SessionEvent::AdjustOffset { delta, reply: Some(reply) }).await
    }

    /// Shift the offset by whole configured steps, negative steps move it back
    pub async fn nudge_offset(&self, steps: i32) -> Result<(), AppError> {
        self.adjust_offset(f64::from(steps) * self.offset_step_secs).await
    }

    pub async fn seek_to_sentence(&self, index: usize) -> Result<(), AppError> {
        self.request(|reply| SessionEvent::SeekToSentence { index, reply: Some(reply) }).await
    }

    pub async fn set_narration(&self, enabled: bool) -> Result<(), AppError> {
        self.request(|reply| SessionEvent::SetNarration { enabled, reply: Some(reply) }).await
    }

    /// Parse caption text off the session task and swap it in when done.
    /// Returns the generation of this load.
    pub async fn load_text(&self, source: String, target: Option<String>) -> Result<u64, AppError> {
        let generation = self.next_generation();
        let settings = self.load_settings.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let parsed = tokio::task::spawn_blocking(move || {
                pipeline::load_text(&settings, &source, target.as_deref())
            })
            .await;
            match parsed {
                Ok(sentences) => {
                    let _ = events.send(SessionEvent::Loaded { generation, sentences }).await;
                }
                Err(e) => error!("Caption parsing task failed: {}", e),
            }
        });
        Ok(generation)
    }

    /// Fetch a track pair and swap the result in when done.
    /// Returns the generation of this load.
    pub async fn load_tracks<F>(&self, loader: Arc<CaptionLoader<F>>, selection: TrackSelection) -> Result<u64, AppError>
    where
        F: TextFetcher + 'static,
    {
        let generation = self.next_generation();
        let settings = self.load_settings.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let sentences = loader.load_sentences(&selection, &settings).await;
            let _ = events.send(SessionEvent::Loaded { generation, sentences }).await;
        });
        Ok(generation)
    }

    /// Swap in an already built sentence sequence
    pub async fn load_sentences(&self, sentences: Vec<Sentence>) -> Result<u64, AppError> {
        let generation = self.next_generation();
        self.post(SessionEvent::Loaded { generation, sentences }).await?;
        Ok(generation)
    }

    /// Wait until `generation` or a newer load is in use
    pub async fn wait_until_loaded(&self, generation: u64) -> Result<(), AppError> {
        let mut loaded = self.loaded.clone();
        loaded.wait_for(|applied| *applied >= generation).await.map_err(|_| session_closed())?;
        Ok(())
    }

    /// Changes of the current sentence index
    pub fn subscribe(&self) -> watch::Receiver<Option<usize>> {
        self.current.clone()
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        let (tx, rx) = oneshot::channel();
        self.post(SessionEvent::Snapshot(tx)).await?;
        rx.await.map_err(|_| session_closed())
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.post(SessionEvent::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    fn next_generation(&self) -> u64 {
        let generation = self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Starting caption load generation {}", generation);
        generation
    }

    async fn post(&self, event: SessionEvent) -> Result<(), AppError> {
        self.events.send(event).await.map_err(|_| session_closed())
    }

    async fn request(&self, make: impl FnOnce(Reply) -> SessionEvent) -> Result<(), AppError> {
        let (tx, rx) = oneshot::channel();
        self.post(make(tx)).await?;
        rx.await.map_err(|_| session_closed())?.map_err(AppError::from)
    }
}
