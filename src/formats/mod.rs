/*!
 * Caption wire formats.
 *
 * A payload is classified by content markers and handed to exactly one parser:
 * - `srt`: numbered blocks, optionally with baked-in bilingual lines
 * - `vtt`: WebVTT cues with optional identifiers
 * - `ttml`: YouTube timed-text XML, coalesced by the fragment merger
 *
 * Every parser is total: malformed blocks are dropped and logged, a payload
 * never fails as a whole.
 */

use std::fmt;

use log::{debug, warn};

use crate::language_utils::{self, TextSide};

pub mod srt;
pub mod ttml;
pub mod vtt;

/// Default gap under which TTML fragments are merged (seconds)
pub const DEFAULT_FRAGMENT_GAP_SECS: f64 = 0.5;

/// Default accumulated length above which TTML fragments stop merging (characters)
pub const DEFAULT_FRAGMENT_MAX_CHARS: usize = 100;

/// Caption payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// WebVTT
    WebVtt,
    /// TTML / YouTube timed-text XML
    Ttml,
    /// SubRip
    Srt,
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WebVtt => "webvtt",
            Self::Ttml => "ttml",
            Self::Srt => "srt",
        };
        write!(f, "{}", name)
    }
}

/// Classify a payload before parsing. SRT is the fallback and never refuses input.
pub fn detect_format(content: &str) -> CaptionFormat {
    if content.contains("WEBVTT") || content.contains("Kind:") {
        CaptionFormat::WebVtt
    } else if content.contains("<?xml") || content.contains("<transcript") || content.contains("<timedtext") {
        CaptionFormat::Ttml
    } else {
        CaptionFormat::Srt
    }
}

/// A caption unit straight out of a format parser, before bilingual alignment
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Native or assigned 1-based index
    pub index: Option<u32>,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Source-language (non-CJK) text
    pub source_text: String,
    /// Target-language (CJK) text
    pub target_text: String,
}

impl RawEntry {
    /// Create an entry whose whole text goes to one side according to the CJK heuristic
    pub fn single_language(index: u32, start: f64, end: f64, text: String) -> Self {
        let (source_text, target_text) = match language_utils::classify_text(&text) {
            TextSide::Target => (String::new(), text),
            TextSide::Source => (text, String::new()),
        };
        Self {
            index: Some(index),
            start,
            end,
            source_text,
            target_text,
        }
    }

    /// Whether neither side carries any text
    pub fn is_blank(&self) -> bool {
        self.source_text.is_empty() && self.target_text.is_empty()
    }
}

/// Tunables for the parsers
#[derive(Debug, Clone, PartialEq)]
pub struct ParseSettings {
    /// Fragments closer than this are merged (seconds)
    pub fragment_gap_secs: f64,
    /// Accumulated text at or above this length is flushed (characters)
    pub fragment_max_chars: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            fragment_gap_secs: DEFAULT_FRAGMENT_GAP_SECS,
            fragment_max_chars: DEFAULT_FRAGMENT_MAX_CHARS,
        }
    }
}

/// Detect the payload format and parse it into start-ordered raw entries
pub fn parse_captions(content: &str, settings: &ParseSettings) -> Vec<RawEntry> {
    let format = detect_format(content);
    debug!("Detected {} caption payload ({} bytes)", format, content.len());

    let mut entries = match format {
        CaptionFormat::WebVtt => vtt::parse_vtt(content),
        CaptionFormat::Ttml => ttml::parse_ttml(content, settings),
        CaptionFormat::Srt => srt::parse_srt(content),
    };

    let already_sorted = entries.windows(2).all(|pair| pair[0].start <= pair[1].start);
    if !already_sorted {
        warn!("Caption entries out of order, sorting {} entries by start time", entries.len());
        // Stable, so entries sharing a start keep stream order
        entries.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    entries
}

/// Split text into blocks, a block being a maximal run of non-blank lines
pub(crate) fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
