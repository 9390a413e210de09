/*!
 * Playback synchronization.
 *
 * The `SyncEngine` maps the transport clock (plus a user offset) onto the
 * sentence sequence and publishes the current sentence index on a watch
 * channel. The read-along state machine in `narration` reacts to the same
 * ticks and shares the engine's "already narrated" guard.
 *
 * Neither type is thread-safe by itself; both are owned by one session task.
 */

use log::{debug, trace};
use tokio::sync::watch;

use crate::sentence::Sentence;

pub mod narration;

pub use narration::{NarrationCommand, NarrationPhase, NarrationSettings, NarrationStateMachine};

/// Mutable per-session synchronization state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// Seconds added to the transport clock before resolution
    pub offset: f64,
    /// Sentence containing the adjusted clock, if any
    pub current_index: Option<usize>,
    /// Last sentence handed to narration, guards against repeats
    pub last_narrated_index: Option<usize>,
}

/// Result of resolving one clock value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Clock value plus offset
    pub adjusted_time: f64,
    /// Resolved sentence index
    pub current_index: Option<usize>,
    /// Whether `current_index` differs from the previous resolution
    pub changed: bool,
}

/// Resolves the playback clock to the current sentence
#[derive(Debug)]
pub struct SyncEngine {
    sentences: Vec<Sentence>,
    state: SyncState,
    clock: f64,
    notifier: watch::Sender<Option<usize>>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SyncEngine {
    /// Create an engine over an immutable sentence sequence
    pub fn new(sentences: Vec<Sentence>) -> Self {
        let (notifier, _) = watch::channel(None);
        Self {
            sentences,
            state: SyncState::default(),
            clock: 0.0,
            notifier,
        }
    }

    /// Replace the sentence sequence in one step and reset all state
    pub fn load(&mut self, sentences: Vec<Sentence>) {
        debug!("Sync engine loaded {} sentences", sentences.len());
        self.sentences = sentences;
        self.state = SyncState::default();
        self.clock = 0.0;
        self.publish(None);
    }

    /// Resolve `time` (transport clock) to the current sentence
    pub fn on_tick(&mut self, time: f64) -> TickOutcome {
        self.clock = time;
        let adjusted_time = time + self.state.offset;

        // Last match wins so overlapping generated captions favour the newer one
        let current_index = self.sentences.iter().rposition(|s| s.contains(adjusted_time));
        if current_index.is_none() {
            self.state.last_narrated_index = None;
        }

        let changed = current_index != self.state.current_index;
        self.state.current_index = current_index;
        if changed {
            trace!("Current sentence -> {:?} at {:.3}s", current_index, adjusted_time);
            self.publish(current_index);
        }

        TickOutcome {
            adjusted_time,
            current_index,
            changed,
        }
    }

    /// Shift the offset and re-resolve with the last known clock value
    pub fn adjust_offset(&mut self, delta: f64) -> TickOutcome {
        self.state.offset += delta;
        debug!("Caption offset now {:+.2}s", self.state.offset);
        self.on_tick(self.clock)
    }

    /// Record a jump of the transport. Only the narration guard is reset here;
    /// the next tick reports the new position.
    pub fn seek(&mut self, time: f64) {
        debug!("Seek to {:.3}s clears narration guard", time);
        self.state.last_narrated_index = None;
    }

    /// Receiver of every change of the current sentence index
    pub fn subscribe(&self) -> watch::Receiver<Option<usize>> {
        self.notifier.subscribe()
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.state.current_index.and_then(|i| self.sentences.get(i))
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Last transport clock value seen
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn offset(&self) -> f64 {
        self.state.offset
    }

    pub fn last_narrated_index(&self) -> Option<usize> {
        self.state.last_narrated_index
    }

    pub fn mark_narrated(&mut self, index: usize) {
        self.state.last_narrated_index = Some(index);
    }

    pub fn clear_narration_guard(&mut self) {
        self.state.last_narrated_index = None;
    }

    fn publish(&self, index: Option<usize>) {
        self.notifier.send_if_modified(|value| {
            if *value == index {
                false
            } else {
                *value = index;
                true
            }
        });
    }
}
