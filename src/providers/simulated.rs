/*!
 * In-process stand-ins for the player and the speech engine.
 *
 * - `SimulatedTransport` keeps a clock that advances while playing, at a
 *   configurable speed, and stops at the media duration
 * - `TimedSpeech` "speaks" for a time proportional to the text length and
 *   can be interrupted
 *
 * Both use `tokio::time`, so a paused test runtime drives them deterministically.
 */

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::errors::{SpeechError, TransportError};
use crate::providers::{SpeechSynthesizer, Transport};

#[derive(Debug)]
struct ClockState {
    /// Position at the last state change
    position: f64,
    /// Set while playing
    playing_since: Option<Instant>,
    ready: bool,
}

/// Simulated media player
#[derive(Debug)]
pub struct SimulatedTransport {
    state: Mutex<ClockState>,
    duration: f64,
    speed: f64,
}

impl SimulatedTransport {
    /// Create a paused transport at position zero
    pub fn new(duration: f64, speed: f64) -> Self {
        Self {
            state: Mutex::new(ClockState {
                position: 0.0,
                playing_since: None,
                ready: true,
            }),
            duration: duration.max(0.0),
            speed: if speed > 0.0 { speed } else { 1.0 },
        }
    }

    /// Make commands fail with `NotReady` until set back
    pub fn set_ready(&self, ready: bool) {
        self.state.lock().ready = ready;
    }

    /// Whether the clock has reached the end of the media
    pub fn is_finished(&self) -> bool {
        self.current_time() >= self.duration
    }

    fn position_of(&self, state: &ClockState) -> f64 {
        let elapsed = state
            .playing_since
            .map(|since| since.elapsed().as_secs_f64() * self.speed)
            .unwrap_or(0.0);
        (state.position + elapsed).min(self.duration)
    }
}

impl Transport for SimulatedTransport {
    fn play(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.ready {
            return Err(TransportError::NotReady);
        }
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
            debug!("Transport playing from {:.3}s", state.position);
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.ready {
            return Err(TransportError::NotReady);
        }
        if state.playing_since.is_some() {
            state.position = self.position_of(&state);
            state.playing_since = None;
            debug!("Transport paused at {:.3}s", state.position);
        }
        Ok(())
    }

    fn seek(&self, time: f64) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.ready {
            return Err(TransportError::NotReady);
        }
        if !time.is_finite() {
            return Err(TransportError::Failed(format!("cannot seek to {}", time)));
        }
        state.position = time.clamp(0.0, self.duration);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        let state = self.state.lock();
        self.position_of(&state)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing_since.is_some()
    }
}

/// Speech stand-in that logs what it says
#[derive(Debug)]
pub struct TimedSpeech {
    per_char: Duration,
    cancel: Notify,
    spoken: Mutex<Vec<(String, String)>>,
}

impl TimedSpeech {
    /// Each character takes `per_char` to say
    pub fn new(per_char: Duration) -> Self {
        Self {
            per_char,
            cancel: Notify::new(),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// Slower speech for a lower rate, 0.5 being a deliberate learner pace
    pub fn with_rate(rate: f32) -> Self {
        let rate = if rate > 0.0 { rate as f64 } else { 0.5 };
        Self::new(Duration::from_secs_f64(0.12 / rate))
    }

    /// Every `(text, locale)` passed to `speak`, in order
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }

    fn utterance_length(&self, text: &str) -> Duration {
        self.per_char * text.chars().count() as u32
    }
}

#[async_trait]
impl SpeechSynthesizer for TimedSpeech {
    async fn speak(&self, text: &str, locale: &str) -> Result<(), SpeechError> {
        if locale.trim().is_empty() {
            return Err(SpeechError::Unavailable(locale.to_string()));
        }

        let cancelled = self.cancel.notified();
        self.spoken.lock().push((text.to_string(), locale.to_string()));
        info!("[{}] {}", locale, text);

        tokio::select! {
            _ = tokio::time::sleep(self.utterance_length(text)) => Ok(()),
            _ = cancelled => Err(SpeechError::Cancelled),
        }
    }

    fn stop_speaking(&self) {
        self.cancel.notify_waiters();
    }
}
