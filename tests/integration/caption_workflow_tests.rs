/*!
 * End-to-end caption loading: files and fetched tracks into a session
 */

use anyhow::Result;
use std::sync::Arc;

use readalong::file_utils::FileManager;
use readalong::pipeline;
use readalong::session::{CaptionLoader, PlaybackSession, SessionConfig};
use readalong::youtube::{self, CaptionTrack};

use crate::common::mock_collaborators::{MockFetcher, RecordingSpeech, RecordingTransport};
use crate::common::{self, BILINGUAL_SRT, CHINESE_VTT, ENGLISH_SRT, FRAGMENTED_XML};

const SOURCE_URL: &str = "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en&fmt=vtt";

fn english_track() -> CaptionTrack {
    CaptionTrack {
        language: "en".to_string(),
        language_name: "English".to_string(),
        url: SOURCE_URL.to_string(),
        format: "vtt".to_string(),
    }
}

#[tokio::test]
async fn test_load_tracks_withoutChineseTrack_shouldUseMachineTranslation() -> Result<()> {
    common::init_test_logging();
    assert_eq!(
        youtube::extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
        Some("dQw4w9WgXcQ".to_string())
    );

    let translated = format!("{}&tlang=zh-Hans", SOURCE_URL);
    let fetcher = MockFetcher::default()
        .with_body(SOURCE_URL, ENGLISH_SRT)
        .with_body(&translated, CHINESE_VTT);
    let loader = Arc::new(CaptionLoader::new(fetcher));
    let selection = youtube::select_tracks(&[english_track()]);
    assert!(selection.target.is_none());

    let handle = PlaybackSession::spawn(
        Arc::new(RecordingTransport::working()),
        Arc::new(RecordingSpeech::working(100)),
        SessionConfig::default(),
    );
    let generation = handle.load_tracks(loader.clone(), selection).await?;
    handle.wait_until_loaded(generation).await?;

    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.generation, generation);
    assert_eq!(snapshot.sentence_count, 3);

    let mut requests = loader.fetcher().requests();
    requests.sort();
    assert_eq!(requests, vec![SOURCE_URL.to_string(), translated]);
    Ok(())
}

#[test]
fn test_load_sentences_withMissingTarget_shouldKeepSourceOnly() {
    let loader = CaptionLoader::new(MockFetcher::default().with_body(SOURCE_URL, ENGLISH_SRT));
    let selection = youtube::select_tracks(&[english_track()]);

    let sentences = tokio_test::block_on(loader.load_sentences(&selection, &Default::default()));
    assert_eq!(sentences.len(), 3);
    assert!(sentences.iter().all(|s| s.target_text.is_empty()));
    // The translated track was tried and missed
    assert_eq!(loader.fetcher().requests().len(), 2);
}

#[tokio::test]
async fn test_load_tracks_withEverythingFailing_shouldLoadEmptySession() -> Result<()> {
    let loader = Arc::new(CaptionLoader::new(MockFetcher::default()));
    let handle = PlaybackSession::spawn(
        Arc::new(RecordingTransport::working()),
        Arc::new(RecordingSpeech::working(100)),
        SessionConfig::default(),
    );

    let generation = handle.load_tracks(loader, youtube::select_tracks(&[english_track()])).await?;
    handle.wait_until_loaded(generation).await?;

    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.generation, generation);
    assert_eq!(snapshot.sentence_count, 0);
    // Ticks over an empty session are harmless
    handle.tick(3.0).await?;
    assert_eq!(handle.snapshot().await?.current_index, None);
    Ok(())
}

#[test]
fn test_file_pair_shouldAlignIntoSentences() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (source, target) = common::create_bilingual_pair(temp_dir.path())?;

    let sentences = pipeline::load(
        &FileManager::read_caption_file(&source)?,
        Some(&FileManager::read_caption_file(&target)?),
    );

    assert_eq!(sentences.len(), 3);
    assert_eq!(sentences[1].source_text, "It contains multiple entries.");
    assert_eq!(sentences[1].target_text, "它包含多个条目。");
    assert_eq!(sentences[1].start, 5.0);
    assert_eq!(sentences[2].index, 3);
    Ok(())
}

#[test]
fn test_bilingual_srt_shouldSplitLanguagesAndStripMarkup() {
    let sentences = pipeline::load(BILINGUAL_SRT.as_bytes(), None);

    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].source_text, "Good morning");
    assert_eq!(sentences[0].target_text, "早上好");
    assert_eq!(sentences[1].target_text, "你好吗？");
    assert_eq!(sentences[0].words.len(), 2);
}

#[test]
fn test_fragmented_timedtext_shouldMergeIntoPhrases() {
    let sentences = pipeline::load(FRAGMENTED_XML.as_bytes(), None);

    let texts: Vec<&str> = sentences.iter().map(|s| s.source_text.as_str()).collect();
    assert_eq!(texts, vec!["welcome back everyone", "today we'll learn"]);
    assert_eq!(sentences[0].start, 0.0);
    assert!((sentences[0].end - 1.3).abs() < 1e-9);
}
