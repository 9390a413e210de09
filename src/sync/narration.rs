/*!
 * Read-along narration state machine.
 *
 * Disabled -> Armed on enable. While armed, reaching the tail of a sentence
 * pauses playback and schedules the translated line to be spoken; completion
 * of the utterance resumes playback and re-arms.
 *
 * The machine performs no I/O. Every transition returns the side effects it
 * wants as `NarrationCommand`s which the owning session executes in order.
 * Scheduled work is tagged with a ticket so late callbacks from a cancelled
 * utterance are ignored.
 */

use std::time::Duration;

use log::{debug, info, warn};

use crate::errors::SpeechError;

use super::{SyncEngine, TickOutcome};

/// Default margin before a sentence end at which narration starts (seconds)
pub const DEFAULT_PRE_TRIGGER_SECS: f64 = 0.3;

/// Default pause-to-speech delay
pub const DEFAULT_SPEAK_DELAY: Duration = Duration::from_millis(100);

/// Default speech locale for the translation
pub const DEFAULT_SPEECH_LOCALE: &str = "zh-CN";

/// Tunables of the narration state machine
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    pub pre_trigger_secs: f64,
    pub speak_delay: Duration,
    pub locale: String,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            pre_trigger_secs: DEFAULT_PRE_TRIGGER_SECS,
            speak_delay: DEFAULT_SPEAK_DELAY,
            locale: DEFAULT_SPEECH_LOCALE.to_string(),
        }
    }
}

/// Narration phase
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationPhase {
    /// Read-along is off
    Disabled,
    /// Watching for the next sentence tail
    Armed,
    /// Transport paused, utterance scheduled or in flight
    Speaking {
        index: usize,
        ticket: u64,
        text: String,
    },
}

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationCommand {
    PauseTransport,
    /// Post `speech_due(ticket)` after `delay`
    ScheduleSpeech { ticket: u64, delay: Duration },
    /// Start speaking, then report `speech_finished(ticket, ..)`
    Speak { ticket: u64, text: String, locale: String },
    ResumeTransport,
    StopSpeaking,
}

/// The read-along controller
#[derive(Debug)]
pub struct NarrationStateMachine {
    settings: NarrationSettings,
    phase: NarrationPhase,
    next_ticket: u64,
}

impl NarrationStateMachine {
    pub fn new(settings: NarrationSettings) -> Self {
        Self {
            settings,
            phase: NarrationPhase::Disabled,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> &NarrationPhase {
        &self.phase
    }

    pub fn settings(&self) -> &NarrationSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != NarrationPhase::Disabled
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self.phase, NarrationPhase::Speaking { .. })
    }

    /// Turn read-along on. No effect when already on.
    pub fn enable(&mut self) -> Vec<NarrationCommand> {
        if self.phase == NarrationPhase::Disabled {
            info!("Narration enabled");
            self.phase = NarrationPhase::Armed;
        }
        Vec::new()
    }

    /// Turn read-along off, cancelling any utterance and clearing the guard
    pub fn disable(&mut self, engine: &mut SyncEngine) -> Vec<NarrationCommand> {
        engine.clear_narration_guard();
        let previous = std::mem::replace(&mut self.phase, NarrationPhase::Disabled);
        match previous {
            NarrationPhase::Disabled => Vec::new(),
            NarrationPhase::Armed => {
                info!("Narration disabled");
                Vec::new()
            }
            NarrationPhase::Speaking { index, .. } => {
                info!("Narration disabled while narrating sentence {}", index + 1);
                vec![NarrationCommand::StopSpeaking, NarrationCommand::ResumeTransport]
            }
        }
    }

    /// Drop an in-flight utterance before the sentence sequence is replaced,
    /// keeping the enabled/disabled choice
    pub fn reset(&mut self) -> Vec<NarrationCommand> {
        if self.is_speaking() {
            self.phase = NarrationPhase::Armed;
            return vec![NarrationCommand::StopSpeaking, NarrationCommand::ResumeTransport];
        }
        Vec::new()
    }

    /// React to a resolved tick
    pub fn on_tick(&mut self, engine: &mut SyncEngine, outcome: &TickOutcome) -> Vec<NarrationCommand> {
        if self.phase != NarrationPhase::Armed {
            return Vec::new();
        }
        let Some(index) = outcome.current_index else {
            return Vec::new();
        };
        let Some(sentence) = engine.sentence(index) else {
            return Vec::new();
        };
        if outcome.adjusted_time < sentence.end - self.settings.pre_trigger_secs
            || engine.last_narrated_index() == Some(index)
        {
            return Vec::new();
        }

        let text = sentence.target_text.clone();
        engine.mark_narrated(index);
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        debug!("Narrating sentence {} (ticket {})", index + 1, ticket);
        self.phase = NarrationPhase::Speaking { index, ticket, text };

        vec![
            NarrationCommand::PauseTransport,
            NarrationCommand::ScheduleSpeech {
                ticket,
                delay: self.settings.speak_delay,
            },
        ]
    }

    /// The pause has settled; speak, or resume straight away when there is nothing to say
    pub fn speech_due(&mut self, ticket: u64) -> Vec<NarrationCommand> {
        let text = match &self.phase {
            NarrationPhase::Speaking { ticket: current, text, .. } if *current == ticket => text.clone(),
            _ => {
                debug!("Ignoring stale speech ticket {}", ticket);
                return Vec::new();
            }
        };

        if text.trim().is_empty() {
            debug!("No translation to narrate, resuming");
            self.phase = NarrationPhase::Armed;
            return vec![NarrationCommand::ResumeTransport];
        }

        vec![NarrationCommand::Speak {
            ticket,
            text,
            locale: self.settings.locale.clone(),
        }]
    }

    /// The utterance ended. Failures count as completion so playback never stays paused.
    pub fn speech_finished(&mut self, ticket: u64, result: Result<(), SpeechError>) -> Vec<NarrationCommand> {
        match &self.phase {
            NarrationPhase::Speaking { ticket: current, .. } if *current == ticket => {}
            _ => {
                debug!("Ignoring completion of stale speech ticket {}", ticket);
                return Vec::new();
            }
        }

        if let Err(e) = result {
            warn!("Narration failed, resuming playback: {}", e);
        }
        self.phase = NarrationPhase::Armed;
        vec![NarrationCommand::ResumeTransport]
    }
}

impl Default for NarrationStateMachine {
    fn default() -> Self {
        Self::new(NarrationSettings::default())
    }
}
