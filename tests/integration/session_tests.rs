/*!
 * Integration tests for the playback session actor
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use readalong::errors::AppError;
use readalong::pipeline;
use readalong::session::{self, PlaybackSession, SessionConfig, SessionHandle};
use readalong::sync::NarrationPhase;

use crate::common::mock_collaborators::{RecordingSpeech, RecordingTransport, TransportCall};
use crate::common::{self, CHINESE_VTT, ENGLISH_SRT};

fn narrated() -> SessionConfig {
    SessionConfig {
        narration_enabled: true,
        ..SessionConfig::default()
    }
}

async fn start(transport: Arc<RecordingTransport>, speech: Arc<RecordingSpeech>, config: SessionConfig) -> Result<SessionHandle> {
    common::init_test_logging();
    let handle = PlaybackSession::spawn(transport, speech, config);
    let generation = handle
        .load_text(ENGLISH_SRT.to_string(), Some(CHINESE_VTT.to_string()))
        .await?;
    handle.wait_until_loaded(generation).await?;
    Ok(handle)
}

#[tokio::test(start_paused = true)]
async fn test_narration_shouldPauseSpeakThenResume() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(500));
    let handle = start(transport.clone(), speech.clone(), narrated()).await?;

    handle.tick(2.0).await?;
    assert!(transport.calls().is_empty());

    handle.tick(3.8).await?;
    assert_eq!(transport.calls(), vec![TransportCall::Pause]);
    assert!(speech.utterances().is_empty(), "speech waits for the pause delay");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        speech.utterances(),
        vec![("这是一个测试字幕。".to_string(), "zh-CN".to_string())]
    );
    assert!(matches!(handle.snapshot().await?.narration, NarrationPhase::Speaking { index: 0, .. }));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(transport.calls(), vec![TransportCall::Pause, TransportCall::Play]);
    assert_eq!(handle.snapshot().await?.narration, NarrationPhase::Armed);

    // Same tail again is guarded
    handle.tick(3.9).await?;
    assert_eq!(transport.calls().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_speech_failure_shouldStillResume() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::failing());
    let handle = start(transport.clone(), speech.clone(), narrated()).await?;

    handle.tick(3.8).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(speech.utterances().len(), 1);
    assert_eq!(transport.calls(), vec![TransportCall::Pause, TransportCall::Play]);
    assert_eq!(handle.snapshot().await?.narration, NarrationPhase::Armed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disable_whileSpeaking_shouldCancelUtterance() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(5_000));
    let handle = start(transport.clone(), speech.clone(), narrated()).await?;

    handle.tick(3.8).await?;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(speech.utterances().len(), 1);

    handle.set_narration(false).await?;
    assert!(speech.stop_count() >= 1);
    assert_eq!(transport.calls(), vec![TransportCall::Pause, TransportCall::Play]);

    // The cancelled utterance reports back late and is ignored
    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.narration, NarrationPhase::Disabled);
    assert_eq!(snapshot.last_narrated_index, None);
    assert_eq!(transport.calls().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_seek_shouldAllowReNarration() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = start(transport.clone(), speech.clone(), narrated()).await?;

    handle.tick(3.8).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.tick(3.9).await?;
    assert_eq!(speech.utterances().len(), 1);

    handle.seek(3.8).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(speech.utterances().len(), 2);
    assert_eq!(
        transport.calls(),
        vec![
            TransportCall::Pause,
            TransportCall::Play,
            TransportCall::Seek(3.8),
            TransportCall::Pause,
            TransportCall::Play,
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_shouldSurfaceButAdvance() -> Result<()> {
    let transport = Arc::new(RecordingTransport::failing());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = start(transport.clone(), speech.clone(), narrated()).await?;

    let result = handle.tick(3.8).await;
    assert!(matches!(result, Err(AppError::Transport(_))));

    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.last_narrated_index, Some(0));
    assert!(matches!(snapshot.narration, NarrationPhase::Speaking { .. }));

    // Narration carries on regardless
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(speech.utterances().len(), 1);
    assert_eq!(handle.snapshot().await?.narration, NarrationPhase::Armed);
    Ok(())
}

#[tokio::test]
async fn test_subscribe_and_offset_shouldPublishChanges() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = start(transport, speech, SessionConfig::default()).await?;
    let mut current = handle.subscribe();

    handle.tick(2.0).await?;
    assert!(current.has_changed()?);
    assert_eq!(*current.borrow_and_update(), Some(0));

    handle.tick(4.5).await?;
    assert_eq!(*current.borrow_and_update(), None);

    // 4.5 + 1.0 lands in the second sentence without a new tick
    handle.adjust_offset(1.0).await?;
    assert_eq!(*current.borrow_and_update(), Some(1));

    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.offset, 1.0);
    assert_eq!(snapshot.clock, 4.5);
    assert_eq!(snapshot.narration, NarrationPhase::Disabled);
    Ok(())
}

#[tokio::test]
async fn test_nudge_offset_shouldMoveByConfiguredSteps() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let config = SessionConfig {
        offset_step_secs: 0.25,
        ..SessionConfig::default()
    };
    let handle = start(transport, speech, config).await?;

    // 4.75 sits in the gap between the first two sentences
    handle.tick(4.75).await?;
    handle.nudge_offset(1).await?;
    assert_eq!(handle.snapshot().await?.current_index, Some(1));

    handle.nudge_offset(-4).await?;
    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.offset, -0.75);
    assert_eq!(snapshot.current_index, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_seek_to_sentence_shouldAccountForOffset() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = start(transport.clone(), speech, SessionConfig::default()).await?;

    handle.adjust_offset(0.5).await?;
    handle.seek_to_sentence(2).await?;

    assert_eq!(transport.calls(), vec![TransportCall::Seek(11.5)]);
    assert_eq!(handle.snapshot().await?.current_index, Some(2));

    // Out of range is ignored
    handle.seek_to_sentence(99).await?;
    assert_eq!(transport.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_stale_load_shouldBeDiscarded() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = PlaybackSession::spawn(transport, speech, SessionConfig::default());

    let full = pipeline::load(ENGLISH_SRT.as_bytes(), Some(CHINESE_VTT.as_bytes()));
    let partial = full[..1].to_vec();

    // Both are requested before the session sees either, so the first is already stale
    let older = handle.load_sentences(full).await?;
    let newer = handle.load_sentences(partial).await?;
    assert_eq!((older, newer), (1, 2));

    handle.wait_until_loaded(newer).await?;
    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.generation, newer);
    assert_eq!(snapshot.sentence_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_load_text_racingLoads_shouldKeepNewest() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = PlaybackSession::spawn(transport, speech, SessionConfig::default());

    let older = handle.load_text(ENGLISH_SRT.to_string(), None).await?;
    let newer = handle.load_sentences(Vec::new()).await?;
    assert!(newer > older);

    handle.wait_until_loaded(newer).await?;
    // Give the parse task time to deliver its now stale result
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = handle.snapshot().await?;
    assert_eq!(snapshot.generation, newer);
    assert_eq!(snapshot.sentence_count, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_clock_driver_shouldFeedTicks() -> Result<()> {
    let transport = Arc::new(RecordingTransport::working());
    let speech = Arc::new(RecordingSpeech::working(100));
    let handle = start(transport.clone(), speech, SessionConfig::default()).await?;

    transport.set_time(6.0);
    let clock = session::spawn_clock(transport.clone(), handle.clone(), Duration::from_millis(33));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.snapshot().await?.current_index, Some(1));

    handle.shutdown().await?;
    tokio::time::timeout(Duration::from_secs(1), clock).await??;
    assert!(handle.tick(1.0).await.is_err());
    Ok(())
}
