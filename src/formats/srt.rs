use log::debug;

use crate::errors::SubtitleError;
use crate::language_utils;
use crate::markup::strip_markup;
use crate::timestamp::{parse_srt_timestamp, parse_time_range};

use super::{RawEntry, split_blocks};

// @module: SubRip parser

// @separator: SRT time range
const SRT_RANGE_SEPARATOR: &str = " --> ";

/// Parse SRT content into raw entries.
///
/// Each text line is routed on its own: lines carrying CJK ideographs
/// accumulate into `target_text`, all others into `source_text`. A
/// single-language track therefore fills only one side.
pub fn parse_srt(content: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();

    for (block_num, block) in split_blocks(content).iter().enumerate() {
        match parse_block(block) {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!("Dropping SRT block {}: {}", block_num + 1, e),
        }
    }

    entries
}

fn parse_block(lines: &[&str]) -> Result<RawEntry, SubtitleError> {
    if lines.len() < 3 {
        return Err(SubtitleError::MalformedBlock(format!(
            "expected at least 3 lines, found {}",
            lines.len()
        )));
    }

    let index: u32 = lines[0]
        .trim()
        .trim_start_matches('\u{feff}')
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| SubtitleError::MalformedBlock(format!("invalid index '{}'", lines[0].trim())))?;

    let (start, end) = parse_time_range(lines[1].trim(), SRT_RANGE_SEPARATOR, parse_srt_timestamp)?;
    if end < start {
        return Err(SubtitleError::MalformedBlock(format!("end {} before start {}", end, start)));
    }

    let mut source_text = String::new();
    let mut target_text = String::new();
    for line in &lines[2..] {
        let cleaned = strip_markup(line);
        if cleaned.is_empty() {
            continue;
        }
        let side = if language_utils::contains_cjk(&cleaned) {
            &mut target_text
        } else {
            &mut source_text
        };
        if !side.is_empty() {
            side.push(' ');
        }
        side.push_str(&cleaned);
    }

    Ok(RawEntry {
        index: Some(index),
        start,
        end,
        source_text,
        target_text,
    })
}
