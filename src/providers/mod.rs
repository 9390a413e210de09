/*!
 * Collaborators consumed by the playback core.
 *
 * The core never talks to a player, the network or a speech engine directly;
 * it goes through these traits so a host (or a test) can plug in its own:
 * - `Transport`: the media player being synchronised
 * - `TextFetcher`: retrieval of raw caption payloads
 * - `SpeechSynthesizer`: text-to-speech for narration
 *
 * Implementations shipped with the crate:
 * - `http::HttpFetcher`: reqwest-backed fetcher
 * - `simulated::SimulatedTransport`: in-process clock for the CLI and tests
 * - `simulated::TimedSpeech`: speech stand-in that takes time proportional to the text
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::{FetchError, SpeechError, TransportError};

/// Media transport driven by the session
///
/// Commands are synchronous and best-effort; the session logs and reports
/// failures but never waits on them.
pub trait Transport: Send + Sync + Debug {
    /// Start or resume playback
    fn play(&self) -> Result<(), TransportError>;

    /// Pause playback
    fn pause(&self) -> Result<(), TransportError>;

    /// Jump to `time` seconds
    fn seek(&self, time: f64) -> Result<(), TransportError>;

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Media length in seconds
    fn duration(&self) -> f64;

    /// Whether the media can accept commands
    fn is_ready(&self) -> bool;

    /// Whether the media is currently playing
    fn is_playing(&self) -> bool;
}

/// Retrieval of caption payloads
#[async_trait]
pub trait TextFetcher: Send + Sync + Debug {
    /// Fetch `url` and return its body as text
    ///
    /// # Arguments
    /// * `url` - Absolute URL of the caption payload
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - The decoded body or an error
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Text-to-speech used by narration
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Speak `text` in `locale`, resolving when the utterance ends or is stopped
    async fn speak(&self, text: &str, locale: &str) -> Result<(), SpeechError>;

    /// Stop the current utterance immediately
    fn stop_speaking(&self);
}

pub mod http;
pub mod simulated;
