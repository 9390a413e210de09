use std::fmt;

use serde::Serialize;

use crate::formats::RawEntry;
use crate::timestamp::format_srt_timestamp;

// @module: Final bilingual sentence model

// @struct: Word with a proportional time slice of its sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    // @field: Token text, punctuation included
    pub text: String,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,
}

// @struct: One timed bilingual caption unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    // @field: 1-based position in the sequence
    pub index: u32,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Source-language text
    pub source_text: String,

    // @field: Target-language text
    pub target_text: String,

    // @field: Words partitioning [start, end], empty when source_text is
    pub words: Vec<Word>,
}

impl Sentence {
    /// Build a sentence, splitting the source text into evenly timed words
    pub fn new(index: u32, start: f64, end: f64, source_text: String, target_text: String) -> Self {
        let end = end.max(start);
        let words = split_words(&source_text, start, end);
        Self {
            index,
            start,
            end,
            source_text,
            target_text,
            words,
        }
    }

    /// Whether `time` falls inside `[start, end]`, both ends inclusive
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Index of the word being spoken at `time`, if the sentence contains it
    pub fn current_word_index(&self, time: f64) -> Option<usize> {
        if !self.contains(time) {
            return None;
        }
        self.words.iter().position(|w| w.start <= time && time <= w.end)
    }

    /// Length of the sentence in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", format_srt_timestamp(self.start), format_srt_timestamp(self.end))?;
        if !self.source_text.is_empty() {
            writeln!(f, "{}", self.source_text)?;
        }
        if !self.target_text.is_empty() {
            writeln!(f, "{}", self.target_text)?;
        }
        writeln!(f)
    }
}

// Boundaries are computed from the sentence span so adjacent words share them exactly
fn split_words(source_text: &str, start: f64, end: f64) -> Vec<Word> {
    let tokens: Vec<&str> = source_text.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let count = tokens.len() as f64;
    let span = end - start;
    let boundary = |i: usize| {
        if i == tokens.len() {
            end
        } else {
            start + span * (i as f64) / count
        }
    };

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| Word {
            text: token.to_string(),
            start: boundary(i),
            end: boundary(i + 1),
        })
        .collect()
}

/// Turn merged entries into the final sentence sequence, numbered from 1
pub fn build_sentences(entries: Vec<RawEntry>) -> Vec<Sentence> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| Sentence::new(i as u32 + 1, entry.start, entry.end, entry.source_text, entry.target_text))
        .collect()
}
