//! eco-metrics derivation over verified records

use serde::{Deserialize, Serialize};

use crate::record::{CarbonRecord, EcoLevel};

/// achievement badges, accumulated in a fixed order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    DataEnthusiast,
    LowCarbonPioneer,
    EcoMaster,
    ConsistentLogger,
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Badge::DataEnthusiast => "data enthusiast",
            Badge::LowCarbonPioneer => "low-carbon pioneer",
            Badge::EcoMaster => "eco master",
            Badge::ConsistentLogger => "consistent logger",
        };
        f.write_str(label)
    }
}

/// aggregate stats over the verified subset of records
///
/// pure derived data: recomputed synchronously on every store replacement,
/// never cached across reloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcoStats {
    /// sum of decrypted values over verified records
    pub total_footprint: u64,
    pub verified_count: usize,
    /// 0-100, non-increasing in the average footprint
    pub eco_score: u8,
    pub level: EcoLevel,
    pub badges: Vec<Badge>,
    /// week-over-week estimate, never positive
    pub weekly_change: i64,
}

impl Default for EcoStats {
    fn default() -> Self {
        derive_stats(&[])
    }
}

/// derive aggregate stats from the verified subset of `records`
pub fn derive_stats(records: &[CarbonRecord]) -> EcoStats {
    let verified: Vec<&CarbonRecord> = records.iter().filter(|r| r.verified).collect();
    let count = verified.len();
    let total: u64 = verified.iter().map(|r| r.decrypted_value.unwrap_or(0)).sum();
    let average = if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    };

    EcoStats {
        total_footprint: total,
        verified_count: count,
        eco_score: eco_score(average),
        level: EcoLevel::band(average),
        badges: badges(count, average),
        weekly_change: weekly_change(average),
    }
}

/// round(clamp(100 - 2 * average, 0, 100))
fn eco_score(average: f64) -> u8 {
    (100.0 - 2.0 * average).clamp(0.0, 100.0).round() as u8
}

fn weekly_change(average: f64) -> i64 {
    -((average * 0.1).round() as i64)
}

fn badges(verified_count: usize, average: f64) -> Vec<Badge> {
    let mut badges = Vec::new();
    if verified_count >= 5 {
        badges.push(Badge::DataEnthusiast);
    }
    if average <= 20.0 {
        badges.push(Badge::LowCarbonPioneer);
    }
    if average <= 10.0 {
        badges.push(Badge::EcoMaster);
    }
    if verified_count >= 10 {
        badges.push(Badge::ConsistentLogger);
    }
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Category, RecordId};
    use proptest::prelude::*;

    fn record(n: u64, verified: bool, value: Option<u64>) -> CarbonRecord {
        CarbonRecord {
            id: RecordId::from_millis(n),
            name: format!("record {n}"),
            category: Category::Consumption,
            value_key: RecordId::from_millis(n),
            timestamp: n,
            creator: "0xabc".into(),
            public_value: value.unwrap_or(0),
            aux_value: 0,
            verified,
            decrypted_value: value,
            eco_level: EcoLevel::band(value.unwrap_or(0) as f64),
        }
    }

    #[test]
    fn empty_set_scores_perfect() {
        let stats = derive_stats(&[]);
        assert_eq!(stats.total_footprint, 0);
        assert_eq!(stats.verified_count, 0);
        assert_eq!(stats.eco_score, 100);
        assert_eq!(stats.level, EcoLevel::Pioneer);
        assert_eq!(stats.weekly_change, 0);
        // an average of zero carries the low-average badges
        assert_eq!(
            stats.badges,
            vec![Badge::LowCarbonPioneer, Badge::EcoMaster]
        );
    }

    #[test]
    fn unverified_records_are_ignored() {
        let records = vec![
            record(1, false, None),
            record(2, true, Some(10)),
            record(3, false, Some(500)),
        ];
        let stats = derive_stats(&records);
        assert_eq!(stats.verified_count, 1);
        assert_eq!(stats.total_footprint, 10);
        assert_eq!(stats.eco_score, 80);
    }

    #[test]
    fn low_average_small_count() {
        // avg 5 over 3 records: pioneer level, score 90, no count badges
        let records = vec![
            record(1, true, Some(5)),
            record(2, true, Some(5)),
            record(3, true, Some(5)),
        ];
        let stats = derive_stats(&records);
        assert_eq!(stats.eco_score, 90);
        assert_eq!(stats.level, EcoLevel::Pioneer);
        assert_eq!(stats.weekly_change, -1);
        assert_eq!(
            stats.badges,
            vec![Badge::LowCarbonPioneer, Badge::EcoMaster]
        );
    }

    #[test]
    fn count_badges_require_counts() {
        let five = (1..=5).map(|n| record(n, true, Some(20))).collect::<Vec<_>>();
        let stats = derive_stats(&five);
        assert_eq!(stats.eco_score, 60);
        assert_eq!(stats.badges, vec![Badge::DataEnthusiast, Badge::LowCarbonPioneer]);

        let ten = (1..=10).map(|n| record(n, true, Some(60))).collect::<Vec<_>>();
        let stats = derive_stats(&ten);
        assert_eq!(stats.eco_score, 0);
        assert_eq!(stats.level, EcoLevel::Medium);
        assert_eq!(stats.weekly_change, -6);
        assert_eq!(
            stats.badges,
            vec![Badge::DataEnthusiast, Badge::ConsistentLogger]
        );
    }

    #[test]
    fn high_average_floors_score() {
        let records = vec![record(1, true, Some(50))];
        assert_eq!(derive_stats(&records).eco_score, 0);

        let records = vec![record(1, true, Some(120))];
        let stats = derive_stats(&records);
        assert_eq!(stats.eco_score, 0);
        assert_eq!(stats.level, EcoLevel::HighEmitter);
        assert_eq!(stats.weekly_change, -12);
    }

    proptest! {
        #[test]
        fn score_stays_in_range(average in 0.0f64..10_000.0) {
            prop_assert!(eco_score(average) <= 100);
        }

        #[test]
        fn score_never_increases_with_average(a in 0.0f64..500.0, b in 0.0f64..500.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(eco_score(lo) >= eco_score(hi));
        }

        #[test]
        fn weekly_change_never_positive(average in 0.0f64..10_000.0) {
            prop_assert!(weekly_change(average) <= 0);
        }
    }
}
