/*!
 * Inline markup removal for caption text.
 *
 * Caption payloads carry HTML-style tags (`<font>`, `<b>`, `<c.colorE5E5E5>`) and
 * ASS override blocks (`{\an8}`). Only the delimiters are removed, the text
 * between an opening and closing tag is kept.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: HTML-style tag, non-greedy
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+?>").unwrap());

// @const: ASS override block, non-greedy
static ASS_OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\\[^}]*?\}").unwrap());

// @const: Whitespace run, newlines included
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip inline markup and normalize whitespace.
///
/// The steps run in a fixed order: tags, ASS overrides, stray braces,
/// whitespace collapse, trim. The function is idempotent.
pub fn strip_markup(text: &str) -> String {
    let cleaned = TAG_REGEX.replace_all(text, "");
    let cleaned = ASS_OVERRIDE_REGEX.replace_all(&cleaned, "");
    let cleaned = cleaned.replace("{}", "").replace(['{', '}'], "");
    let cleaned = WHITESPACE_REGEX.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    match cleaned.strip_prefix("{}") {
        Some(rest) => rest.trim().to_string(),
        None => cleaned.to_string(),
    }
}

/// Decode the five predefined XML entities
pub fn decode_xml_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
