/*!
 * Tests for caption parsing, alignment and the sentence model
 */

use readalong::formats::{self, CaptionFormat, ParseSettings};
use readalong::markup::strip_markup;
use readalong::pipeline::{self, LoadSettings};
use readalong::timestamp::{parse_srt_timestamp, parse_vtt_timestamp};

use crate::common::{BILINGUAL_SRT, CHINESE_VTT, ENGLISH_SRT, FRAGMENTED_XML};

#[test]
fn test_timestamps_withReferenceValues_shouldDecode() {
    assert_eq!(parse_srt_timestamp("00:00:21,000"), Some(21.0));
    assert_eq!(parse_vtt_timestamp("00:00:23.500"), Some(23.5));
    assert_eq!(parse_vtt_timestamp("01:02.250"), Some(62.25));
}

#[test]
fn test_strip_markup_shouldBeIdempotent() {
    let samples = [
        "<b>hi</b> {\\an8}there",
        "{}  {\\i1}italic{\\i0}  text {",
        "<font color=\"#fff\">white</font>\n<i>second</i>",
        "plain",
    ];
    for sample in samples {
        let once = strip_markup(sample);
        assert_eq!(strip_markup(&once), once, "not idempotent for {:?}", sample);
    }
    assert_eq!(strip_markup("<b>hi</b> {\\an8}there"), "hi there");
}

#[test]
fn test_all_formats_shouldYieldOrderedValidSentences() {
    for payload in [ENGLISH_SRT, CHINESE_VTT, BILINGUAL_SRT, FRAGMENTED_XML] {
        let sentences = pipeline::load(payload.as_bytes(), None);
        assert!(!sentences.is_empty(), "nothing parsed from {:?}", payload);
        for sentence in &sentences {
            assert!(sentence.start <= sentence.end);
        }
        for pair in sentences.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }
}

#[test]
fn test_parse_captions_withBilingualSrt_shouldSplitLanguages() {
    let entries = formats::parse_captions(BILINGUAL_SRT, &ParseSettings::default());

    assert_eq!(formats::detect_format(BILINGUAL_SRT), CaptionFormat::Srt);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source_text, "Good morning");
    assert_eq!(entries[0].target_text, "早上好");
    assert_eq!(entries[1].source_text, "How are you?");
    assert_eq!(entries[1].target_text, "你好吗？");
}

#[test]
fn test_parse_captions_withFragments_shouldMergeIntoSentences() {
    let entries = formats::parse_captions(FRAGMENTED_XML, &ParseSettings::default());

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source_text, "welcome back everyone");
    assert_eq!(entries[0].start, 0.0);
    assert!((entries[0].end - 1.3).abs() < 1e-9);
    assert_eq!(entries[1].source_text, "today we'll learn");
}

#[test]
fn test_parse_captions_withSmallerGap_shouldSplitMore() {
    let settings = ParseSettings {
        fragment_gap_secs: 0.0001,
        ..ParseSettings::default()
    };
    // Touching fragments (gap 0) still merge, the big gap never does
    let entries = formats::parse_captions(FRAGMENTED_XML, &settings);
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_load_withSeparateTracks_shouldPairByStartTime() {
    let sentences = pipeline::load(ENGLISH_SRT.as_bytes(), Some(CHINESE_VTT.as_bytes()));

    assert_eq!(sentences.len(), 3);
    assert_eq!(sentences[0].target_text, "这是一个测试字幕。");
    assert_eq!(sentences[1].target_text, "它包含多个条目。");
    assert_eq!(sentences[2].target_text, "用于测试。");
    assert_eq!(sentences[2].index, 3);
    assert_eq!(sentences[0].words.len(), 5);
    assert_eq!(sentences[0].words[0].start, 1.0);
    assert_eq!(sentences[0].words[4].end, 4.0);
}

#[test]
fn test_load_with_withTightTolerance_shouldDropLateTranslations() {
    let settings = LoadSettings {
        alignment_tolerance_secs: 0.25,
        ..LoadSettings::default()
    };
    let sentences = pipeline::load_with(&settings, ENGLISH_SRT.as_bytes(), Some(CHINESE_VTT.as_bytes()));

    // Offsets are 0.2, 0.3 and 0.1 seconds
    assert!(!sentences[0].target_text.is_empty());
    assert!(sentences[1].target_text.is_empty());
    assert!(!sentences[2].target_text.is_empty());
}

#[test]
fn test_load_withMalformedBlocks_shouldKeepTheRest() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\nbroken\nblock\n\n3\n00:00:xx,000 --> 00:00:04,000\nbad time\n\n4\n00:00:05,000 --> 00:00:06,000\nlast\n";
    let sentences = pipeline::load(content.as_bytes(), None);

    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].source_text, "first");
    assert_eq!(sentences[1].source_text, "last");
    assert_eq!(sentences[1].index, 2);
}
