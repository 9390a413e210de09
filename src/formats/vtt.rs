use log::debug;

use crate::errors::SubtitleError;
use crate::markup::strip_markup;
use crate::timestamp::{parse_time_range, parse_vtt_timestamp};

use super::{RawEntry, split_blocks};

// @module: WebVTT parser

// @const: Blocks opening with these carry no cue
const HEADER_KEYWORDS: [&str; 3] = ["WEBVTT", "STYLE", "NOTE"];

/// Parse WebVTT content into raw entries.
///
/// Cue identifiers are optional, so the time line is whichever of the first
/// two lines contains `-->`. Indices are assigned in emission order starting
/// at 1. Each cue is single-language.
pub fn parse_vtt(content: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();

    for block in split_blocks(content) {
        let first = block[0].trim_start_matches('\u{feff}').trim_start();
        if HEADER_KEYWORDS.iter().any(|kw| first.starts_with(kw)) {
            continue;
        }

        match parse_cue(&block) {
            Ok((start, end, text)) => {
                let index = entries.len() as u32 + 1;
                entries.push(RawEntry::single_language(index, start, end, text));
            }
            Err(e) => debug!("Dropping VTT block: {}", e),
        }
    }

    entries
}

fn parse_cue(lines: &[&str]) -> Result<(f64, f64, String), SubtitleError> {
    let time_pos = lines
        .iter()
        .take(2)
        .position(|line| line.contains("-->"))
        .ok_or_else(|| SubtitleError::MalformedBlock(format!("no cue timing in '{}'", lines[0].trim())))?;

    let (start, end) = parse_time_range(lines[time_pos].trim(), "-->", parse_vtt_timestamp)?;
    if end < start {
        return Err(SubtitleError::MalformedBlock(format!("end {} before start {}", end, start)));
    }

    let text = strip_markup(&lines[time_pos + 1..].join(" "));
    if text.is_empty() {
        return Err(SubtitleError::MalformedBlock("empty cue text".to_string()));
    }

    Ok((start, end, text))
}
