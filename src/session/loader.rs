use log::{error, info, warn};
use std::sync::Arc;

use crate::pipeline::{self, LoadSettings};
use crate::providers::TextFetcher;
use crate::sentence::Sentence;
use crate::youtube::{translated_track_url, TrackSelection};

/// Default locale requested from machine-translated timedtext tracks
pub const DEFAULT_TRANSLATION_LOCALE: &str = "zh-Hans";

/// Raw payloads of a track pair, empty when unavailable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionPayloads {
    pub source: String,
    pub target: String,
}

/// Fetches the selected caption tracks of a video
#[derive(Debug)]
pub struct CaptionLoader<F: TextFetcher> {
    fetcher: Arc<F>,
    translation_locale: String,
}

impl<F: TextFetcher> CaptionLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_translation_locale(fetcher, DEFAULT_TRANSLATION_LOCALE)
    }

    pub fn with_translation_locale(fetcher: F, locale: impl Into<String>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            translation_locale: locale.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch source and target concurrently.
    ///
    /// Without a target track, a machine translation of the source is tried
    /// when the source is a timedtext URL. Any failure leaves that side empty.
    pub async fn load_tracks(&self, selection: &TrackSelection) -> CaptionPayloads {
        let source_url = selection.source.as_ref().map(|t| t.url.clone());
        let target_url = match &selection.target {
            Some(track) => Some(track.url.clone()),
            None => source_url
                .as_deref()
                .and_then(|url| translated_track_url(url, &self.translation_locale)),
        };

        let (source, target) = tokio::join!(
            self.fetch_optional(source_url.as_deref(), "source"),
            self.fetch_optional(target_url.as_deref(), "target"),
        );
        CaptionPayloads { source, target }
    }

    /// Fetch and build the sentence sequence for a track pair
    pub async fn load_sentences(&self, selection: &TrackSelection, settings: &LoadSettings) -> Vec<Sentence> {
        let CaptionPayloads { source, target } = self.load_tracks(selection).await;
        let settings = settings.clone();
        let parsed = tokio::task::spawn_blocking(move || pipeline::load_text(&settings, &source, Some(&target))).await;
        let sentences = match parsed {
            Ok(sentences) => sentences,
            Err(e) => {
                error!("Caption parsing task failed: {}", e);
                Vec::new()
            }
        };
        if sentences.is_empty() {
            warn!("No captions available for this video");
        }
        sentences
    }

    async fn fetch_optional(&self, url: Option<&str>, side: &str) -> String {
        let Some(url) = url else {
            return String::new();
        };
        match self.fetcher.fetch_text(url).await {
            Ok(text) => {
                info!("Fetched {} captions ({} bytes)", side, text.len());
                text
            }
            Err(e) => {
                warn!("Failed to fetch {} captions, continuing without them: {}", side, e);
                String::new()
            }
        }
    }
}
