/*!
 * Error types for the readalong library.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Parsing errors are always local: a parser that hits a `SubtitleError` drops the
 * offending block or fragment and keeps going. Only fetch, speech and transport
 * failures ever reach a caller, and none of them stops playback.
 */

use thiserror::Error;

/// Errors that can occur while parsing a single caption block or fragment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A timestamp did not match any of the supported notations
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A block was truncated or missing its index/time line
    #[error("Malformed caption block: {0}")]
    MalformedBlock(String),

    /// A track yielded no entries at all
    #[error("Caption track contains no entries")]
    EmptyTrack,
}

/// Errors that can occur when retrieving caption payloads
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be completed
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Server responded with status {status_code} for {url}")]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Requested URL
        url: String,
    },

    /// The payload could not be decoded as text
    #[error("Failed to decode caption payload: {0}")]
    Decode(String),
}

/// Errors reported by the speech synthesis collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeechError {
    /// No voice is available for the requested locale
    #[error("No voice available for locale {0}")]
    Unavailable(String),

    /// The utterance was stopped before it finished
    #[error("Speech was cancelled")]
    Cancelled,

    /// Synthesis failed for another reason
    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

/// Errors reported by the playback transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The media is not ready to accept commands
    #[error("Transport is not ready")]
    NotReady,

    /// The transport rejected the command
    #[error("Transport command failed: {0}")]
    Failed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from caption parsing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error while fetching captions
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from speech synthesis
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// Error from the playback transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::HttpStatus {
                status_code: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if error.is_decode() {
            return Self::Decode(error.to_string());
        }
        Self::Network(error.to_string())
    }
}
