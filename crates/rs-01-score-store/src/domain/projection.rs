//! History aggregation.
//!
//! Folds a chronological history into one row per (team, image): the
//! maximum time, with points, play time, elapsed time and ledger taken from
//! the last entry in history order.

use std::collections::HashMap;

use shared_types::ScoreEntry;

/// Fold `history` (append order) into one entry per (team, image).
///
/// Output order is the order in which each group first appears.
pub fn fold_history(history: &[ScoreEntry]) -> Vec<ScoreEntry> {
    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();
    let mut folded: Vec<ScoreEntry> = Vec::new();

    for entry in history {
        let key = (entry.team.as_str(), entry.image.as_str());
        match slots.get(&key) {
            Some(&slot) => {
                let max_time = folded[slot].time.max(entry.time);
                folded[slot] = entry.clone();
                folded[slot].time = max_time;
            }
            None => {
                slots.insert(key, folded.len());
                folded.push(entry.clone());
            }
        }
    }
    folded
}
