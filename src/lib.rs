/*!
 * # readalong - bilingual caption read-along engine
 *
 * A Rust library that turns caption files into a timed bilingual sentence
 * sequence and keeps it synchronised with a playing video.
 *
 * ## Features
 *
 * - Parse SubRip, WebVTT and YouTube timed-text XML captions
 * - Coalesce autogenerated word fragments into sentence-like entries
 * - Pair a source-language track with a translation track by start time
 * - Split each sentence into evenly timed words
 * - Resolve the playback clock (plus a user offset) to the current sentence
 * - Read-along narration: pause at each sentence end, speak the translation,
 *   resume
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `formats`: format detection and the per-format parsers
 *   - `formats::srt`, `formats::vtt`, `formats::ttml`
 * - `timestamp`, `markup`: timestamp codec and caption markup stripping
 * - `alignment`: bilingual track pairing
 * - `sentence`: the final sentence model
 * - `pipeline`: bytes to sentences in one call
 * - `sync`: playback synchronization and the narration state machine
 * - `session`: the single-task playback session driving both
 * - `providers`: transport, fetch and speech collaborators
 * - `youtube`: video-id extraction and caption track selection
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities and the CJK heuristic
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod language_utils;
pub mod markup;
pub mod pipeline;
pub mod providers;
pub mod sentence;
pub mod session;
pub mod sync;
pub mod timestamp;
pub mod youtube;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, FetchError, SpeechError, SubtitleError, TransportError};
pub use formats::{CaptionFormat, RawEntry};
pub use pipeline::{load, load_with, LoadSettings};
pub use sentence::{Sentence, Word};
pub use session::{PlaybackSession, SessionConfig, SessionHandle};
pub use sync::{NarrationStateMachine, SyncEngine, SyncState};
pub use timestamp::{parse_srt_timestamp, parse_vtt_timestamp};
