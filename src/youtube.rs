/*!
 * YouTube helpers: video-id extraction and caption track selection.
 *
 * Supported link shapes:
 * - `https://youtu.be/ID`
 * - `https://www.youtube.com/watch?v=ID` (also `m.` and `music.` hosts)
 * - `https://www.youtube.com/embed/ID`
 * - `https://www.youtube.com/v/ID`
 * - `https://www.youtube.com/shorts/ID`
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

// @const: An 11 character video id
static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Extract the video id from a YouTube link
pub fn extract_video_id(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    let host = url.host_str()?.to_lowercase();
    let segments: Vec<&str> = url.path_segments().map(|s| s.filter(|p| !p.is_empty()).collect()).unwrap_or_default();

    let candidate = if host.ends_with("youtu.be") {
        segments.last().map(|s| s.to_string())
    } else if host.ends_with("youtube.com") {
        if segments.first() == Some(&"watch") {
            url.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned())
        } else {
            segments
                .windows(2)
                .find(|pair| matches!(pair[0], "embed" | "v" | "shorts"))
                .map(|pair| pair[1].to_string())
        }
    } else {
        None
    };

    let id = candidate.filter(|id| VIDEO_ID_REGEX.is_match(id));
    debug!("Video id of {}: {:?}", input, id);
    id
}

/// Whether `input` is a YouTube link with a usable video id
pub fn is_valid_youtube_url(input: &str) -> bool {
    extract_video_id(input).is_some()
}

/// A caption track offered for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code, e.g. "en", "zh-Hans"
    pub language: String,
    /// Human readable language name
    #[serde(default)]
    pub language_name: String,
    /// Payload URL
    pub url: String,
    /// Declared payload format ("vtt", "srv3", "json3", ...)
    #[serde(default)]
    pub format: String,
}

/// The tracks picked for a bilingual session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSelection {
    pub source: Option<CaptionTrack>,
    pub target: Option<CaptionTrack>,
}

/// Pick an English source track and a Chinese target track
pub fn select_tracks(tracks: &[CaptionTrack]) -> TrackSelection {
    let source = tracks.iter().find(|t| is_english(t)).cloned();
    let target = tracks.iter().find(|t| is_chinese(t)).cloned();
    debug!(
        "Selected source {:?}, target {:?} out of {} tracks",
        source.as_ref().map(|t| &t.language),
        target.as_ref().map(|t| &t.language),
        tracks.len()
    );
    TrackSelection { source, target }
}

fn is_english(track: &CaptionTrack) -> bool {
    track.language.to_lowercase().contains("en") || track.language_name.to_lowercase().contains("english")
}

fn is_chinese(track: &CaptionTrack) -> bool {
    let name = track.language_name.to_lowercase();
    track.language.to_lowercase().contains("zh") || name.contains("chinese") || name.contains("中文")
}

/// Machine-translated variant of a timedtext URL, or `None` for other URLs
pub fn translated_track_url(source_url: &str, locale: &str) -> Option<String> {
    if !source_url.contains("youtube.com/api/timedtext") {
        return None;
    }
    Some(format!("{}&tlang={}", source_url, locale))
}
