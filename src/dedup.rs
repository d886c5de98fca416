//! Primary-key deduplication that spans every chunk of one input file.
//!
//! First-wins and keep-all decide on the spot: the row is handed straight
//! back for streaming output and only its key is remembered. Last-wins
//! remembers the ordinal of each key's latest row; the caller replays the
//! input and writes the rows for which [`Deduplicator::is_last`] holds.
//! Max-wins holds one row per key and releases them from `finish`, ordered
//! by the key's first appearance.

use crate::config::RatingsKeep;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

pub enum DedupPolicy<R> {
    FirstWins,
    LastWins,
    /// Highest priority wins; on a tie the earlier row stays.
    MaxBy(fn(&R) -> usize),
    /// Every row passes; repeats are only counted.
    KeepAll,
}

impl<R> From<RatingsKeep> for DedupPolicy<R> {
    fn from(keep: RatingsKeep) -> Self {
        match keep {
            RatingsKeep::First => DedupPolicy::FirstWins,
            RatingsKeep::Last => DedupPolicy::LastWins,
            RatingsKeep::All => DedupPolicy::KeepAll,
        }
    }
}

pub struct Deduplicator<K, R> {
    policy: DedupPolicy<R>,
    // Per key: first ordinal (first/all), last ordinal (last), or the
    // position in `held` (max).
    index: HashMap<K, u64>,
    held: Vec<R>,
    offered: u64,
    duplicates: u64,
}

impl<K: Hash + Eq, R> Deduplicator<K, R> {
    pub fn new(policy: DedupPolicy<R>) -> Self {
        Self {
            policy,
            index: HashMap::new(),
            held: Vec::new(),
            offered: 0,
            duplicates: 0,
        }
    }

    pub fn keeps_duplicates(&self) -> bool {
        matches!(self.policy, DedupPolicy::KeepAll)
    }

    /// True when survivors are only known at end of file and must be
    /// written by a second pass over the same rows.
    pub fn replays_input(&self) -> bool {
        matches!(self.policy, DedupPolicy::LastWins)
    }

    /// Offers the next row of the file. Returns it if it can be written now.
    pub fn offer(&mut self, key: K, row: R) -> Option<R> {
        let ordinal = self.offered;
        self.offered += 1;

        match &self.policy {
            DedupPolicy::FirstWins => match self.index.entry(key) {
                Entry::Occupied(_) => {
                    self.duplicates += 1;
                    None
                }
                Entry::Vacant(slot) => {
                    slot.insert(ordinal);
                    Some(row)
                }
            },
            DedupPolicy::KeepAll => {
                match self.index.entry(key) {
                    Entry::Occupied(_) => self.duplicates += 1,
                    Entry::Vacant(slot) => {
                        slot.insert(ordinal);
                    }
                }
                Some(row)
            }
            DedupPolicy::LastWins => {
                if self.index.insert(key, ordinal).is_some() {
                    self.duplicates += 1;
                }
                None
            }
            DedupPolicy::MaxBy(priority) => {
                match self.index.entry(key) {
                    Entry::Occupied(slot) => {
                        self.duplicates += 1;
                        let held = &mut self.held[*slot.get() as usize];
                        if priority(&row) > priority(held) {
                            *held = row;
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(self.held.len() as u64);
                        self.held.push(row);
                    }
                }
                None
            }
        }
    }

    /// Whether the row offered as number `ordinal` (counting from zero) was
    /// the last one seen for `key`.
    pub fn is_last(&self, key: &K, ordinal: u64) -> bool {
        self.index.get(key) == Some(&ordinal)
    }

    /// Rows dropped (or, under keep-all, passed through) as repeats so far.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn unique_keys(&self) -> usize {
        self.index.len()
    }

    /// Rows currently kept in memory; zero except under max-wins.
    pub fn held_rows(&self) -> usize {
        self.held.len()
    }

    /// Releases held rows at end of file and discards the index.
    pub fn finish(self) -> Vec<R> {
        self.held
    }
}
