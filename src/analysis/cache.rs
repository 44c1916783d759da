use std::collections::{HashMap, VecDeque};

use super::fingerprint::Fingerprint;
use crate::models::AnalysisResult;

/// Bounded fingerprint -> result map with least-recently-used eviction.
///
/// Capacity is small (tens of entries per session) so recency is kept in a
/// plain deque and refreshed with a linear scan.
#[derive(Debug)]
pub struct FingerprintCache {
    capacity: usize,
    entries: HashMap<Fingerprint, AnalysisResult>,
    recency: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

impl FingerprintCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn lookup(&mut self, fingerprint: &Fingerprint) -> Option<AnalysisResult> {
        match self.entries.get(fingerprint) {
            Some(result) => {
                let result = result.clone();
                self.hits += 1;
                self.touch(fingerprint);
                Some(result)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Returns the fingerprint evicted to make room, if any.
    pub fn store(&mut self, fingerprint: Fingerprint, result: AnalysisResult) -> Option<Fingerprint> {
        if self.entries.insert(fingerprint.clone(), result).is_some() {
            self.touch(&fingerprint);
            return None;
        }

        self.recency.push_back(fingerprint);

        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
                return Some(oldest);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn touch(&mut self, fingerprint: &Fingerprint) {
        if let Some(position) = self.recency.iter().position(|f| f == fingerprint) {
            if let Some(entry) = self.recency.remove(position) {
                self.recency.push_back(entry);
            }
        }
    }
}
