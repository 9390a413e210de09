/*!
 * Timestamp codec for caption time notations.
 *
 * Three notations are understood:
 * - `HH:MM:SS,mmm` (SRT, comma decimal separator)
 * - `HH:MM:SS.mmm` (WebVTT, dot decimal separator)
 * - `MM:SS.mmm`    (WebVTT short form)
 *
 * All values are seconds as `f64`.
 */

use crate::errors::SubtitleError;

// @parses: "HH:MM:SS,mmm" -> seconds
pub fn parse_srt_timestamp(s: &str) -> Option<f64> {
    // Some converters emit dots instead of commas, both are accepted
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours = parse_field(parts[0])?;
    let minutes = parse_field(parts[1])?;
    let seconds = parse_field(&parts[2].replace(',', "."))?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

// @parses: "HH:MM:SS.mmm" or "MM:SS.mmm" -> seconds
pub fn parse_vtt_timestamp(s: &str) -> Option<f64> {
    let cleaned = s.trim();
    if cleaned.contains(',') {
        return None;
    }
    let parts: Vec<&str> = cleaned.split(':').collect();

    match parts.as_slice() {
        [h, m, sec] => Some(parse_field(h)? * 3600.0 + parse_field(m)? * 60.0 + parse_field(sec)?),
        [m, sec] => Some(parse_field(m)? * 60.0 + parse_field(sec)?),
        _ => None,
    }
}

/// Parse a `"<start> --> <end>"` line with the given timestamp parser.
///
/// SRT ranges are split on the literal `" --> "`; WebVTT ranges may carry cue
/// settings after the end time (`00:01.000 --> 00:02.000 align:start`), so
/// only the first whitespace-delimited token of the right side is used there.
pub(crate) fn parse_time_range(
    line: &str,
    separator: &str,
    parse: fn(&str) -> Option<f64>,
) -> Result<(f64, f64), SubtitleError> {
    let mut sides = line.splitn(2, separator);
    let (Some(left), Some(right)) = (sides.next(), sides.next()) else {
        return Err(SubtitleError::MalformedBlock(format!("no time range in '{}'", line)));
    };

    let start = parse(left).ok_or_else(|| SubtitleError::InvalidTimestamp(left.trim().to_string()))?;
    let end_token = right.split_whitespace().next().unwrap_or_default();
    let end = parse(end_token).ok_or_else(|| SubtitleError::InvalidTimestamp(end_token.to_string()))?;

    Ok((start, end))
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format a playback position as MM:SS for display
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "00:00".to_string();
    }
    let whole = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

fn parse_field(field: &str) -> Option<f64> {
    let field = field.trim();
    // Rejects "inf", "nan", signs and exponents that f64::from_str would accept
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    field.parse::<f64>().ok()
}
