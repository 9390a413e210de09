/*!
 * Bilingual track alignment.
 *
 * Two independently timed tracks are merged into one sequence of dual-text
 * entries. The source track is the authoritative timeline; each source entry
 * borrows the text of the first target entry starting within the tolerance.
 */

use log::{debug, info};

use crate::formats::RawEntry;

/// Default start-time tolerance for pairing entries (seconds)
pub const DEFAULT_ALIGNMENT_TOLERANCE_SECS: f64 = 0.5;

/// Merge a source track and a target track into bilingual entries.
///
/// - both empty: empty result
/// - one side empty: the other side is returned unchanged
/// - otherwise: one output entry per source entry, renumbered from 1
///
/// Matching takes the *first* target entry (in target order) whose start is
/// strictly within `tolerance_secs` of the source start, not the closest one.
pub fn align_tracks(source_entries: Vec<RawEntry>, target_entries: Vec<RawEntry>, tolerance_secs: f64) -> Vec<RawEntry> {
    if source_entries.is_empty() {
        if !target_entries.is_empty() {
            debug!("Source track empty, using {} target entries as-is", target_entries.len());
        }
        return target_entries;
    }
    if target_entries.is_empty() {
        debug!("Target track empty, using {} source entries as-is", source_entries.len());
        return source_entries;
    }

    let mut matched = 0usize;
    let merged: Vec<RawEntry> = source_entries
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let target_text = target_entries
                .iter()
                .find(|target| (target.start - source.start).abs() < tolerance_secs)
                .map(|target| target.target_text.clone())
                .unwrap_or_default();
            if !target_text.is_empty() {
                matched += 1;
            }

            RawEntry {
                index: Some(i as u32 + 1),
                start: source.start,
                end: source.end,
                source_text: source.source_text,
                target_text,
            }
        })
        .collect();

    info!("Aligned {} entries, {} with a translation", merged.len(), matched);
    merged
}
