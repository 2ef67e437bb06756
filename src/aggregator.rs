use std::collections::HashMap;
use std::hash::Hash;

use crate::classifier::Classification;
use crate::tables::{PortProtocol, Tag};

/// Occurrence counts per key.
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    counts: HashMap<K, u64>,
}

impl<K: Eq + Hash> PartialEq for FrequencyTable<K> {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl<K: Eq + Hash> Eq for FrequencyTable<K> {}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K> FrequencyTable<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &K) {
        self.add(key, 1);
    }

    fn add(&mut self, key: &K, count: u64) {
        // Look up by reference first so repeated keys do not allocate.
        if let Some(existing) = self.counts.get_mut(key) {
            *existing += count;
        } else {
            self.counts.insert(key.clone(), count);
        }
    }

    /// Adds every count of `other` into this table.
    pub fn merge(&mut self, other: FrequencyTable<K>) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(key, &count)| (key, count))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Accumulates the two report tables while flow records stream through.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Aggregator {
    tag_counts: FrequencyTable<Tag>,
    port_protocol_counts: FrequencyTable<PortProtocol>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classified flow: once for its port/protocol pair and once per tag.
    pub fn record(&mut self, classification: &Classification<'_>) {
        self.record_port_protocol(&classification.key);
        self.record_tags(classification.tags);
    }

    pub fn record_port_protocol(&mut self, key: &PortProtocol) {
        self.port_protocol_counts.increment(key);
    }

    pub fn record_tags(&mut self, tags: &[Tag]) {
        for tag in tags {
            self.tag_counts.increment(tag);
        }
    }

    /// Folds the counts of another aggregator, e.g. a finished shard, into this one.
    pub fn merge(&mut self, other: Aggregator) {
        self.tag_counts.merge(other.tag_counts);
        self.port_protocol_counts.merge(other.port_protocol_counts);
    }

    pub fn tag_counts(&self) -> &FrequencyTable<Tag> {
        &self.tag_counts
    }

    pub fn port_protocol_counts(&self) -> &FrequencyTable<PortProtocol> {
        &self.port_protocol_counts
    }
}
