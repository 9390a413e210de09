/*!
 * Caption loading pipeline.
 *
 * raw bytes -> text -> format detection -> parser (-> fragment merger)
 * -> bilingual alignment -> sentence model.
 *
 * Everything here is pure and may run off the playback context; the result is
 * handed over as one immutable `Vec<Sentence>`.
 */

use log::{debug, info};

use crate::alignment::{self, DEFAULT_ALIGNMENT_TOLERANCE_SECS};
use crate::errors::SubtitleError;
use crate::formats::{self, ParseSettings, RawEntry};
use crate::sentence::{self, Sentence};

/// Settings for a full load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    /// Parser tunables
    pub parse: ParseSettings,
    /// Start-time tolerance for bilingual pairing (seconds)
    pub alignment_tolerance_secs: f64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            parse: ParseSettings::default(),
            alignment_tolerance_secs: DEFAULT_ALIGNMENT_TOLERANCE_SECS,
        }
    }
}

/// Decode a caption payload as UTF-8, lossily, dropping a leading BOM
pub fn decode_payload(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text.into_owned(),
    }
}

/// Parse, align and model a source payload and an optional target payload
pub fn load(source_bytes: &[u8], target_bytes: Option<&[u8]>) -> Vec<Sentence> {
    load_with(&LoadSettings::default(), source_bytes, target_bytes)
}

/// Same as [`load`] with explicit settings
pub fn load_with(settings: &LoadSettings, source_bytes: &[u8], target_bytes: Option<&[u8]>) -> Vec<Sentence> {
    let source_text = decode_payload(source_bytes);
    let target_text = target_bytes.map(decode_payload);
    load_text(settings, &source_text, target_text.as_deref())
}

/// Same as [`load_with`] for already decoded text
pub fn load_text(settings: &LoadSettings, source_text: &str, target_text: Option<&str>) -> Vec<Sentence> {
    let source_entries = parse_track(settings, source_text);
    let target_entries = target_text.map(|text| parse_track(settings, text)).unwrap_or_default();
    build(settings, source_entries, target_entries)
}

/// Like [`load_text`] for callers that cannot go on without captions
pub fn require_sentences(
    settings: &LoadSettings,
    source_text: &str,
    target_text: Option<&str>,
) -> Result<Vec<Sentence>, SubtitleError> {
    let sentences = load_text(settings, source_text, target_text);
    if sentences.is_empty() {
        return Err(SubtitleError::EmptyTrack);
    }
    Ok(sentences)
}

/// Align already parsed tracks and build sentences
pub fn build(settings: &LoadSettings, source_entries: Vec<RawEntry>, target_entries: Vec<RawEntry>) -> Vec<Sentence> {
    let merged = alignment::align_tracks(source_entries, target_entries, settings.alignment_tolerance_secs);
    let sentences = sentence::build_sentences(merged);
    info!("Loaded {} sentences", sentences.len());
    sentences
}

/// Parse one track's text
pub fn parse_track(settings: &LoadSettings, text: &str) -> Vec<RawEntry> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let entries = formats::parse_captions(text, &settings.parse);
    debug!("Parsed {} raw entries", entries.len());
    entries
}
