//! record store: replace-on-reload snapshot plus optimistic overlay

use std::collections::HashMap;
use std::sync::RwLock;

use verdant_core::{derive_stats, CarbonRecord, EcoStats, RecordId};

/// point-in-time view of the ledger-backed collection
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub records: Vec<CarbonRecord>,
    pub stats: EcoStats,
}

/// session-owned record collection, fully replaced on every reload
///
/// stats are recomputed inside the same assignment, so readers never see
/// records and stats from different reloads. the lock is only held for
/// the swap, never across an await.
#[derive(Debug, Default)]
pub struct RecordStore {
    snapshot: RwLock<Snapshot>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// replace the collection and recompute stats in one assignment
    pub fn replace(&self, records: Vec<CarbonRecord>) -> Snapshot {
        let stats = derive_stats(&records);
        let snapshot = Snapshot { records, stats };
        *self.snapshot.write().unwrap() = snapshot.clone();
        snapshot
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().unwrap().clone()
    }

    pub fn records(&self) -> Vec<CarbonRecord> {
        self.snapshot().records
    }

    pub fn stats(&self) -> EcoStats {
        self.snapshot().stats
    }
}

/// optimistic plaintexts from completed verifications
///
/// bridges the window between a confirmed verification transaction and
/// the next ledger reload. the store's verified value always wins; the
/// overlay is cleared whenever the store is replaced.
#[derive(Debug, Default)]
pub struct DecryptedOverlay {
    values: RwLock<HashMap<RecordId, u64>>,
}

impl DecryptedOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: RecordId, value: u64) {
        self.values.write().unwrap().insert(id, value);
    }

    pub fn get(&self, id: &RecordId) -> Option<u64> {
        self.values.read().unwrap().get(id).copied()
    }

    pub fn clear(&self) {
        self.values.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::{Category, EcoLevel};

    fn record(id: &str, verified: bool, value: Option<u64>) -> CarbonRecord {
        CarbonRecord {
            id: RecordId::from(id),
            name: id.to_owned(),
            category: Category::Consumption,
            value_key: RecordId::from(id),
            timestamp: 0,
            creator: "0xabc".into(),
            public_value: value.unwrap_or(0),
            aux_value: 0,
            verified,
            decrypted_value: value,
            eco_level: EcoLevel::band(value.unwrap_or(0) as f64),
        }
    }

    #[test]
    fn replace_swaps_records_and_stats_together() {
        let store = RecordStore::new();
        assert_eq!(store.stats().eco_score, 100);

        let snapshot = store.replace(vec![record("a", true, Some(40))]);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.stats.eco_score, 20);
        assert_eq!(store.stats().eco_score, 20);

        // a later replace fully supersedes the previous collection
        store.replace(vec![]);
        assert!(store.records().is_empty());
        assert_eq!(store.stats().eco_score, 100);
    }

    #[test]
    fn overlay_clears_without_touching_the_store() {
        let store = RecordStore::new();
        let overlay = DecryptedOverlay::new();
        store.replace(vec![record("a", false, None)]);
        overlay.insert(RecordId::from("a"), 12);

        assert_eq!(overlay.get(&RecordId::from("a")), Some(12));
        overlay.clear();
        assert!(overlay.is_empty());
        assert_eq!(store.records().len(), 1);
    }
}
