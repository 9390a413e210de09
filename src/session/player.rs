use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};

use crate::app_config::Config;
use crate::errors::TransportError;
use crate::pipeline::LoadSettings;
use crate::providers::{SpeechSynthesizer, Transport};
use crate::sentence::Sentence;
use crate::sync::{NarrationCommand, NarrationSettings, NarrationStateMachine, SyncEngine};

use super::{Reply, SessionEvent, SessionHandle, SessionSnapshot};

const EVENT_QUEUE_CAPACITY: usize = 64;

/// Default size of one offset nudge (seconds)
pub const DEFAULT_OFFSET_STEP_SECS: f64 = 0.5;

/// Settings of one playback session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub load: LoadSettings,
    pub narration: NarrationSettings,
    /// Start with read-along on
    pub narration_enabled: bool,
    /// Seconds per `SessionHandle::nudge_offset` step
    pub offset_step_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            load: LoadSettings::default(),
            narration: NarrationSettings::default(),
            narration_enabled: false,
            offset_step_secs: DEFAULT_OFFSET_STEP_SECS,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            load: config.load_settings(),
            narration: NarrationSettings {
                pre_trigger_secs: config.narration.pre_trigger_secs,
                speak_delay: config.narration.speak_delay(),
                locale: config.narration.speech_locale.clone(),
            },
            narration_enabled: config.narration.enabled_by_default,
            offset_step_secs: config.sync.offset_step_secs,
        }
    }
}

/// The session task: sole owner of the sync and narration state
#[derive(Debug)]
pub struct PlaybackSession {
    engine: SyncEngine,
    narration: NarrationStateMachine,
    transport: Arc<dyn Transport>,
    speech: Arc<dyn SpeechSynthesizer>,
    // Weak so the task ends once every handle is gone
    events: mpsc::WeakSender<SessionEvent>,
    latest_generation: Arc<AtomicU64>,
    applied_generation: watch::Sender<u64>,
}

impl PlaybackSession {
    /// Start a session task and return its handle
    pub fn spawn(
        transport: Arc<dyn Transport>,
        speech: Arc<dyn SpeechSynthesizer>,
        config: SessionConfig,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (applied_generation, loaded) = watch::channel(0);
        let latest_generation = Arc::new(AtomicU64::new(0));

        let engine = SyncEngine::default();
        let current = engine.subscribe();
        let mut narration = NarrationStateMachine::new(config.narration);
        if config.narration_enabled {
            narration.enable();
        }

        let session = Self {
            engine,
            narration,
            transport,
            speech,
            events: tx.downgrade(),
            latest_generation: latest_generation.clone(),
            applied_generation,
        };
        tokio::spawn(session.run(rx));

        SessionHandle::new(tx, latest_generation, current, loaded, config.load, config.offset_step_secs)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<SessionEvent>) {
        debug!("Playback session started");
        while let Some(event) = rx.recv().await {
            if self.handle_event(event).is_break() {
                break;
            }
        }
        self.speech.stop_speaking();
        debug!("Playback session stopped");
    }

    fn handle_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Tick { time, reply } => {
                let result = self.process_tick(time);
                respond(reply, result);
            }
            SessionEvent::Seek { time, reply } => {
                let result = self.seek(time);
                respond(reply, result);
            }
            SessionEvent::AdjustOffset { delta, reply } => {
                let outcome = self.engine.adjust_offset(delta);
                let commands = self.narration.on_tick(&mut self.engine, &outcome);
                let result = self.execute(commands);
                respond(reply, result);
            }
            SessionEvent::SeekToSentence { index, reply } => {
                let result = self.seek_to_sentence(index);
                respond(reply, result);
            }
            SessionEvent::SetNarration { enabled, reply } => {
                let commands = if enabled {
                    self.narration.enable()
                } else {
                    self.narration.disable(&mut self.engine)
                };
                let result = self.execute(commands);
                respond(reply, result);
            }
            SessionEvent::SpeechDue { ticket } => {
                let commands = self.narration.speech_due(ticket);
                let _ = self.execute(commands);
            }
            SessionEvent::SpeechFinished { ticket, result } => {
                let commands = self.narration.speech_finished(ticket, result);
                let _ = self.execute(commands);
            }
            SessionEvent::Loaded { generation, sentences } => self.apply_load(generation, sentences),
            SessionEvent::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn process_tick(&mut self, time: f64) -> Result<(), TransportError> {
        let outcome = self.engine.on_tick(time);
        if outcome.changed {
            match self.engine.current_sentence() {
                Some(sentence) => debug!("Sentence {}: {}", sentence.index, sentence.source_text),
                None => debug!("No sentence at {:.2}s", outcome.adjusted_time),
            }
        }
        let commands = self.narration.on_tick(&mut self.engine, &outcome);
        self.execute(commands)
    }

    fn seek(&mut self, time: f64) -> Result<(), TransportError> {
        let seeked = self.transport.seek(time);
        if let Err(e) = &seeked {
            warn!("Transport seek to {:.2}s failed: {}", time, e);
        }
        self.engine.seek(time);
        let ticked = self.process_tick(time);
        seeked.and(ticked)
    }

    fn seek_to_sentence(&mut self, index: usize) -> Result<(), TransportError> {
        let Some(start) = self.engine.sentence(index).map(|s| s.start) else {
            warn!("No sentence at index {}", index);
            return Ok(());
        };
        // Land on the sentence as the engine sees it, offset included
        let time = (start - self.engine.offset()).max(0.0);
        let seeked = self.seek(time);

        let played = if self.transport.is_playing() || self.narration.is_speaking() {
            Ok(())
        } else {
            self.transport.play().inspect_err(|e| warn!("Transport play failed: {}", e))
        };
        seeked.and(played)
    }

    fn apply_load(&mut self, generation: u64, sentences: Vec<Sentence>) {
        let latest = self.latest_generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!("Discarding stale caption load {} (latest is {})", generation, latest);
            return;
        }

        let commands = self.narration.reset();
        let _ = self.execute(commands);
        info!("Session now has {} sentences (load {})", sentences.len(), generation);
        self.engine.load(sentences);
        self.applied_generation.send_replace(generation);
    }

    fn snapshot(&self) -> SessionSnapshot {
        let state = self.engine.state();
        SessionSnapshot {
            generation: *self.applied_generation.borrow(),
            sentence_count: self.engine.sentences().len(),
            clock: self.engine.clock(),
            offset: state.offset,
            current_index: state.current_index,
            last_narrated_index: state.last_narrated_index,
            narration: self.narration.phase().clone(),
        }
    }

    /// Run narration side effects in order. Transport failures are logged and
    /// the first one is returned; the remaining commands still run.
    fn execute(&self, commands: Vec<NarrationCommand>) -> Result<(), TransportError> {
        let mut first_error = None;
        for command in commands {
            let result = match command {
                NarrationCommand::PauseTransport => self.transport.pause(),
                NarrationCommand::ResumeTransport => self.transport.play(),
                NarrationCommand::StopSpeaking => {
                    self.speech.stop_speaking();
                    Ok(())
                }
                NarrationCommand::ScheduleSpeech { ticket, delay } => {
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(events) = events.upgrade() {
                            let _ = events.send(SessionEvent::SpeechDue { ticket }).await;
                        }
                    });
                    Ok(())
                }
                NarrationCommand::Speak { ticket, text, locale } => {
                    let events = self.events.clone();
                    let speech = self.speech.clone();
                    tokio::spawn(async move {
                        let result = speech.speak(&text, &locale).await;
                        if let Some(events) = events.upgrade() {
                            let _ = events.send(SessionEvent::SpeechFinished { ticket, result }).await;
                        }
                    });
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!("Transport command failed during narration: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn respond(reply: Option<Reply>, result: Result<(), TransportError>) {
    if let Some(reply) = reply {
        let _ = reply.send(result);
    }
}
