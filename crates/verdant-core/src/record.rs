//! record model: ids, categories, eco-level banding, value sanitization

use serde::{Deserialize, Serialize};

/// unique record identifier, derived from creation time (`carbon-<millis>`)
///
/// also serves as the lookup key for the record's encrypted value on the
/// ledger, so records fetched from chain reuse it verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    const PREFIX: &'static str = "carbon-";

    /// id for a record created at the given unix-epoch milliseconds
    pub fn from_millis(millis: u64) -> Self {
        Self(format!("{}{millis}", Self::PREFIX))
    }

    /// millisecond component, when the id carries one
    pub fn millis(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// footprint category, stored on the ledger as a description string
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transport,
    Consumption,
}

impl Category {
    /// description string recorded on the ledger for this category
    pub fn description(&self) -> &'static str {
        match self {
            Category::Transport => "traffic emissions",
            Category::Consumption => "consumption emissions",
        }
    }

    /// recover the category from a ledger description
    ///
    /// descriptions that do not mention traffic count as consumption.
    pub fn from_description(description: &str) -> Self {
        if description.contains("traffic") {
            Category::Transport
        } else {
            Category::Consumption
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Transport => f.write_str("transport"),
            Category::Consumption => f.write_str("consumption"),
        }
    }
}

/// eco level bands over a footprint value (per record) or average (aggregate)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcoLevel {
    Pioneer,
    GreenPerformer,
    Medium,
    NeedsImprovement,
    HighEmitter,
}

impl EcoLevel {
    /// fixed banding thresholds: <=10 pioneer, <=30 green performer,
    /// <=60 medium, <=100 needs improvement, above that high emitter
    pub fn band(value: f64) -> Self {
        if value <= 10.0 {
            EcoLevel::Pioneer
        } else if value <= 30.0 {
            EcoLevel::GreenPerformer
        } else if value <= 60.0 {
            EcoLevel::Medium
        } else if value <= 100.0 {
            EcoLevel::NeedsImprovement
        } else {
            EcoLevel::HighEmitter
        }
    }
}

impl std::fmt::Display for EcoLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EcoLevel::Pioneer => "pioneer",
            EcoLevel::GreenPerformer => "green performer",
            EcoLevel::Medium => "medium",
            EcoLevel::NeedsImprovement => "needs improvement",
            EcoLevel::HighEmitter => "high emitter",
        };
        f.write_str(label)
    }
}

/// sanitize a raw carbon value to its leading decimal digits, so "12.9"
/// becomes 12. returns None when the trimmed input has no leading digit
/// or the digits overflow u64.
pub fn sanitize_carbon_value(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..end];
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// a carbon footprint record as known to this session
///
/// `decrypted_value` is authoritative only while `verified` is true. an
/// unverified record may still show an optimistic plaintext through the
/// session overlay, never through this field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CarbonRecord {
    pub id: RecordId,
    pub name: String,
    pub category: Category,
    /// lookup key for the encrypted value (equals `id` for records created here)
    pub value_key: RecordId,
    /// creation time, seconds since unix epoch
    pub timestamp: u64,
    pub creator: String,
    /// plaintext kept as public context next to the ciphertext
    pub public_value: u64,
    pub aux_value: u64,
    pub verified: bool,
    /// ledger-confirmed plaintext, present once verified
    pub decrypted_value: Option<u64>,
    /// band over the known value; advisory until verified
    pub eco_level: EcoLevel,
}

impl CarbonRecord {
    /// millisecond timestamp for display ordering: the id component when
    /// parseable, otherwise the ledger timestamp
    pub fn display_millis(&self) -> u64 {
        self.id
            .millis()
            .unwrap_or_else(|| self.timestamp.saturating_mul(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_round_trips_millis() {
        let id = RecordId::from_millis(1_700_000_000_123);
        assert_eq!(id.as_str(), "carbon-1700000000123");
        assert_eq!(id.millis(), Some(1_700_000_000_123));
    }

    #[test]
    fn record_id_without_millis_component() {
        assert_eq!(RecordId::from("legacy-7").millis(), None);
        assert_eq!(RecordId::from("carbon-xyz").millis(), None);
    }

    #[test]
    fn category_description_round_trips() {
        for category in [Category::Transport, Category::Consumption] {
            assert_eq!(Category::from_description(category.description()), category);
        }
        // unknown descriptions fall back to consumption
        assert_eq!(
            Category::from_description("something else"),
            Category::Consumption
        );
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(EcoLevel::band(0.0), EcoLevel::Pioneer);
        assert_eq!(EcoLevel::band(10.0), EcoLevel::Pioneer);
        assert_eq!(EcoLevel::band(10.1), EcoLevel::GreenPerformer);
        assert_eq!(EcoLevel::band(30.0), EcoLevel::GreenPerformer);
        assert_eq!(EcoLevel::band(60.0), EcoLevel::Medium);
        assert_eq!(EcoLevel::band(100.0), EcoLevel::NeedsImprovement);
        assert_eq!(EcoLevel::band(100.5), EcoLevel::HighEmitter);
    }

    #[test]
    fn sanitize_keeps_leading_digits() {
        assert_eq!(sanitize_carbon_value("12.9"), Some(12));
        assert_eq!(sanitize_carbon_value("42"), Some(42));
        assert_eq!(sanitize_carbon_value("  7kg "), Some(7));
        assert_eq!(sanitize_carbon_value("0"), Some(0));
    }

    #[test]
    fn sanitize_rejects_non_numeric() {
        assert_eq!(sanitize_carbon_value(""), None);
        assert_eq!(sanitize_carbon_value("abc"), None);
        assert_eq!(sanitize_carbon_value("-5"), None);
        assert_eq!(sanitize_carbon_value(".5"), None);
        // u64 overflow is invalid input, not a wrapped value
        assert_eq!(sanitize_carbon_value("99999999999999999999999"), None);
    }

    #[test]
    fn display_millis_falls_back_to_ledger_timestamp() {
        let record = CarbonRecord {
            id: RecordId::from("legacy-7"),
            name: "bus commute".into(),
            category: Category::Transport,
            value_key: RecordId::from("legacy-7"),
            timestamp: 1_700_000_000,
            creator: "0xabc".into(),
            public_value: 12,
            aux_value: 0,
            verified: false,
            decrypted_value: None,
            eco_level: EcoLevel::GreenPerformer,
        };
        assert_eq!(record.display_millis(), 1_700_000_000_000);

        let minted = CarbonRecord {
            id: RecordId::from_millis(99),
            ..record
        };
        assert_eq!(minted.display_millis(), 99);
    }
}
