use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities
///
/// This module provides the CJK-vs-non-CJK heuristic used to route caption
/// text into the source or target side of a sentence, and ISO 639 helpers for
/// validating configured languages and matching caption track codes such as
/// `en`, `eng`, `en-US` or `zh-Hans`.
/// Which side of a bilingual sentence a piece of text belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSide {
    /// Learner-facing text (no CJK ideographs)
    Source,
    /// Translation text (contains CJK ideographs)
    Target,
}

// @range: CJK Unified Ideographs
const CJK_START: u32 = 0x4E00;
const CJK_END: u32 = 0x9FFF;

/// Check whether a character is a CJK Unified Ideograph
pub fn is_cjk_char(c: char) -> bool {
    (CJK_START..=CJK_END).contains(&(c as u32))
}

/// Check whether text contains at least one CJK Unified Ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

/// Classify text as source or target language
pub fn classify_text(text: &str) -> TextSide {
    if contains_cjk(text) {
        TextSide::Target
    } else {
        TextSide::Source
    }
}

// ISO 639-2/B codes that differ from their 639-2/T counterpart
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Primary language subtag of a BCP 47 style code ("zh-Hans" -> "zh", "en_US" -> "en")
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Resolve a language code (ISO 639-1, 639-2/T, 639-2/B, optionally with region/script)
pub fn resolve_language(code: &str) -> Result<Language> {
    let primary = primary_subtag(code);

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => {
            let terminology = bibliographic_to_terminology(&primary).unwrap_or(primary.as_str());
            Language::from_639_3(terminology)
        }
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve_language(code).map(|lang| lang.to_639_3().to_string())
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve_language(code1), resolve_language(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}
