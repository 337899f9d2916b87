//! # Record Consolidation & Timeline
//!
//! Agents report every few seconds; charts want one point per minute.
//!
//! 1. Per image, walk the history in order and bucket entries by UTC minute.
//!    Consecutive entries in one bucket coalesce and the last one wins. A
//!    boundary is emitted whenever the bucket changes, plus the final bucket.
//! 2. Each boundary is projected onto the play-time axis (whole minutes).
//! 3. One shared axis spans the earliest to latest projection, one `HH:MM`
//!    label per minute, measured from the earliest.
//!
//! The builder is a pure function of its inputs.

use std::collections::HashMap;

use serde::Serialize;
use shared_types::{Image, ScoreEntry};

use crate::domain::errors::ScoreboardError;

/// Consolidated boundary records for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSeries {
    pub image: Image,
    pub records: Vec<ScoreEntry>,
    /// Selected record for display; `None` when the image has no records.
    pub index: Option<usize>,
}

impl ImageSeries {
    /// The selected record.
    pub fn selected(&self) -> Option<&ScoreEntry> {
        self.index.and_then(|i| self.records.get(i))
    }
}

/// Shared chart axis plus every image's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub series: Vec<ImageSeries>,
    pub labels: Vec<String>,
    /// Play-time minute of `labels[0]`.
    pub origin_minute: u64,
}

fn minute_bucket(entry: &ScoreEntry) -> i64 {
    entry.time.timestamp().div_euclid(60)
}

fn play_minute(entry: &ScoreEntry) -> u64 {
    entry.play_time.as_secs() / 60
}

/// Coalesce one image's entries into per-minute boundary records.
pub fn consolidate<'a>(history: impl IntoIterator<Item = &'a ScoreEntry>) -> Vec<ScoreEntry> {
    let mut boundaries = Vec::new();
    let mut current: Option<(i64, &ScoreEntry)> = None;

    for entry in history {
        let bucket = minute_bucket(entry);
        match current {
            Some((open, _)) if open == bucket => current = Some((bucket, entry)),
            Some((_, last)) => {
                boundaries.push(last.clone());
                current = Some((bucket, entry));
            }
            None => current = Some((bucket, entry)),
        }
    }
    if let Some((_, last)) = current {
        boundaries.push(last.clone());
    }
    boundaries
}

/// Minute labels `HH:MM` from `0` to `span` inclusive.
fn axis_labels(span: u64) -> Vec<String> {
    (0..=span)
        .map(|m| format!("{:02}:{:02}", m / 60, m % 60))
        .collect()
}

/// Build every image's series and the shared axis.
///
/// `history` must be chronological; entries for images not in `images` are
/// ignored. Each series selects its last record by default.
pub fn build_timeline(history: &[ScoreEntry], images: &[Image]) -> Timeline {
    let series: Vec<ImageSeries> = images
        .iter()
        .map(|image| {
            let records = consolidate(history.iter().filter(|e| e.image == image.name));
            let index = records.len().checked_sub(1);
            ImageSeries {
                image: image.clone(),
                records,
                index,
            }
        })
        .collect();

    let mut projected: Vec<u64> = series
        .iter()
        .flat_map(|s| s.records.iter().map(play_minute))
        .collect();
    projected.sort_unstable();

    let (labels, origin_minute) = match (projected.first(), projected.last()) {
        (Some(&first), Some(&last)) => (axis_labels(last - first), first),
        _ => (Vec::new(), 0),
    };

    Timeline {
        series,
        labels,
        origin_minute,
    }
}

/// Apply per-series record selections (`record<N>=<index>` query params).
pub fn select_records(
    series: &mut [ImageSeries],
    overrides: &HashMap<usize, usize>,
) -> Result<(), ScoreboardError> {
    for (&position, &index) in overrides {
        let Some(target) = series.get_mut(position) else {
            return Err(ScoreboardError::InvalidRecord(format!(
                "no chart at position {position}"
            )));
        };
        if index >= target.records.len() {
            return Err(ScoreboardError::InvalidRecord(format!(
                "record {index} out of range for {} ({} records)",
                target.image.name,
                target.records.len()
            )));
        }
        target.index = Some(index);
    }
    Ok(())
}
