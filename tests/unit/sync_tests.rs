/*!
 * Tests for the sync engine and narration state machine over parsed captions
 */

use readalong::pipeline;
use readalong::sync::{NarrationCommand, NarrationPhase, NarrationStateMachine, SyncEngine};

use crate::common::{CHINESE_VTT, ENGLISH_SRT};

fn lesson_engine() -> SyncEngine {
    SyncEngine::new(pipeline::load(ENGLISH_SRT.as_bytes(), Some(CHINESE_VTT.as_bytes())))
}

/// Drive both machines the way a session does and collect the commands
fn play(engine: &mut SyncEngine, machine: &mut NarrationStateMachine, times: &[f64]) -> Vec<NarrationCommand> {
    let mut commands = Vec::new();
    for &time in times {
        let outcome = engine.on_tick(time);
        commands.extend(machine.on_tick(engine, &outcome));
        if let Some(NarrationCommand::ScheduleSpeech { ticket, .. }) = commands.last().cloned() {
            commands.extend(machine.speech_due(ticket));
            commands.extend(machine.speech_finished(ticket, Ok(())));
        }
    }
    commands
}

#[test]
fn test_playthrough_shouldNarrateEachSentenceOnce() {
    let mut engine = lesson_engine();
    let mut machine = NarrationStateMachine::default();
    machine.enable();

    // ~30 Hz clock over the whole lesson
    let times: Vec<f64> = (0..=450).map(|i| i as f64 / 30.0).collect();
    let commands = play(&mut engine, &mut machine, &times);

    let spoken: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            NarrationCommand::Speak { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(spoken, vec!["这是一个测试字幕。", "它包含多个条目。", "用于测试。"]);

    let pauses = commands.iter().filter(|c| **c == NarrationCommand::PauseTransport).count();
    let resumes = commands.iter().filter(|c| **c == NarrationCommand::ResumeTransport).count();
    assert_eq!(pauses, 3);
    assert_eq!(resumes, 3);
}

#[test]
fn test_offset_shouldShiftNarrationPoint() {
    let mut engine = lesson_engine();
    let mut machine = NarrationStateMachine::default();
    machine.enable();

    // With +0.5s, clock 3.3 is already at 3.8 adjusted, past the 3.7 trigger
    engine.adjust_offset(0.5);
    let commands = play(&mut engine, &mut machine, &[3.3]);
    assert_eq!(commands.first(), Some(&NarrationCommand::PauseTransport));
}

#[test]
fn test_narration_afterGap_shouldReTrigger() {
    let mut engine = lesson_engine();
    let mut machine = NarrationStateMachine::default();
    machine.enable();

    assert!(!play(&mut engine, &mut machine, &[3.8]).is_empty());
    assert!(play(&mut engine, &mut machine, &[3.9]).is_empty());

    // 4.5 is between sentences
    play(&mut engine, &mut machine, &[4.5]);
    assert_eq!(engine.last_narrated_index(), None);
    assert!(!play(&mut engine, &mut machine, &[3.8]).is_empty());
}

#[test]
fn test_disable_shouldStopWatching() {
    let mut engine = lesson_engine();
    let mut machine = NarrationStateMachine::default();
    machine.enable();
    machine.disable(&mut engine);

    assert_eq!(machine.phase(), &NarrationPhase::Disabled);
    assert!(play(&mut engine, &mut machine, &[3.8, 8.9, 13.9]).is_empty());
}

#[test]
fn test_subscribe_shouldTrackSentenceChanges() {
    let mut engine = lesson_engine();
    let mut rx = engine.subscribe();
    let mut seen = Vec::new();

    for time in [0.5, 1.0, 2.0, 4.5, 5.0, 10.0, 12.5] {
        engine.on_tick(time);
        if rx.has_changed().unwrap() {
            seen.push(*rx.borrow_and_update());
        }
    }

    assert_eq!(seen, vec![Some(0), None, Some(1), None, Some(2)]);
}
