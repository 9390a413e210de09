/*!
 * Timed-text XML parser and fragment merger.
 *
 * Two element shapes are recognised, attribute order and extra attributes
 * being irrelevant:
 * - `<text start="S" dur="D">TEXT</text>` with seconds (transcript / TTML)
 * - `<p t="MS" d="MS">TEXT</p>` with milliseconds (timedtext format 3)
 *
 * Autogenerated tracks emit these at sub-word granularity, so the extracted
 * fragments are coalesced into sentence-like entries before they leave this
 * module.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::{decode_xml_entities, strip_markup};

use super::{ParseSettings, RawEntry};

// @const: <text ...>...</text> element, or a self-closing <text .../>
static TEXT_ELEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap());

// @const: <p ...>...</p> element (srv3), or a self-closing <p .../>
static PARAGRAPH_ELEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<p\b([^>]*?)(?:/>|>(.*?)</p>)").unwrap());

// @const: name="value" or name='value'
static ATTRIBUTE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// A timed piece of text smaller than a sentence
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Cleaned text
    pub text: String,
}

/// Parse timed-text XML into merged raw entries
pub fn parse_ttml(content: &str, settings: &ParseSettings) -> Vec<RawEntry> {
    let fragments = extract_fragments(content);
    debug!("Extracted {} timed-text fragments", fragments.len());
    merge_fragments(&fragments, settings)
}

/// Extract every timed fragment with non-empty cleaned text, in document order
pub fn extract_fragments(content: &str) -> Vec<TextFragment> {
    let mut fragments = Vec::new();

    for caps in TEXT_ELEMENT_REGEX.captures_iter(content) {
        let attrs = &caps[1];
        let start = attribute(attrs, "start").and_then(parse_seconds);
        let dur = attribute(attrs, "dur").and_then(parse_seconds).unwrap_or(0.0);
        push_fragment(&mut fragments, start, dur, element_body(&caps));
    }

    // Only fall back to srv3 paragraphs when the document has no <text> elements,
    // TTML bodies also use <p> for styling
    if fragments.is_empty() {
        for caps in PARAGRAPH_ELEMENT_REGEX.captures_iter(content) {
            let attrs = &caps[1];
            let start = attribute(attrs, "t").and_then(parse_seconds).map(|ms| ms / 1000.0);
            let dur = attribute(attrs, "d").and_then(parse_seconds).unwrap_or(0.0) / 1000.0;
            push_fragment(&mut fragments, start, dur, element_body(&caps));
        }
    }

    fragments
}

// Self-closing elements have no body
fn element_body<'a>(caps: &regex::Captures<'a>) -> &'a str {
    caps.get(2).map_or("", |m| m.as_str())
}

fn push_fragment(fragments: &mut Vec<TextFragment>, start: Option<f64>, dur: f64, raw_text: &str) {
    let Some(start) = start else {
        debug!("Dropping fragment without a usable start attribute");
        return;
    };
    let text = strip_markup(&decode_xml_entities(raw_text));
    if text.is_empty() {
        return;
    }
    fragments.push(TextFragment {
        start,
        end: start + dur.max(0.0),
        text,
    });
}

fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTRIBUTE_REGEX
        .captures_iter(attrs)
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
}

fn parse_seconds(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Coalesce fragments into sentence-like entries.
///
/// A fragment joins the running entry when it starts less than
/// `fragment_gap_secs` after the entry ends and the entry is still shorter
/// than `fragment_max_chars`. Otherwise the entry is flushed and a new one is
/// started. Entries are numbered from 1 and classified by the CJK rule.
pub fn merge_fragments(fragments: &[TextFragment], settings: &ParseSettings) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let Some((first, rest)) = fragments.split_first() else {
        return entries;
    };

    let mut acc = first.clone();
    let mut acc_chars = acc.text.chars().count();

    for fragment in rest {
        let gap = fragment.start - acc.end;
        if gap < settings.fragment_gap_secs && acc_chars < settings.fragment_max_chars {
            if needs_space(&acc.text, &fragment.text) {
                acc.text.push(' ');
                acc_chars += 1;
            }
            acc.text.push_str(&fragment.text);
            acc_chars += fragment.text.chars().count();
            acc.end = fragment.end;
        } else {
            flush(&mut entries, acc);
            acc = fragment.clone();
            acc_chars = acc.text.chars().count();
        }
    }
    flush(&mut entries, acc);

    entries
}

fn flush(entries: &mut Vec<RawEntry>, acc: TextFragment) {
    let index = entries.len() as u32 + 1;
    // Overlapping fragments can pull end before start when a later one is shorter
    let end = acc.end.max(acc.start);
    entries.push(RawEntry::single_language(index, acc.start, end, acc.text));
}

// Letters on both sides of a longer piece get a separator; short pieces and punctuation are glued
fn needs_space(acc_text: &str, fragment_text: &str) -> bool {
    if fragment_text.chars().count() <= 2 {
        return false;
    }
    let last = acc_text.chars().last();
    let first = fragment_text.chars().next();
    matches!((last, first), (Some(a), Some(b)) if a.is_alphabetic() && b.is_alphabetic())
}
