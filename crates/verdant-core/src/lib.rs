//! verdant-core: carbon ledger data model and eco-metrics derivation
//!
//! pure types shared by the client workflows:
//! - records, categories, eco-level banding, raw-value sanitization
//! - aggregate eco stats (score, badges, weekly change)
//! - bounded operation history
//! - status notices and per-operation workflow state
//!
//! no async, no I/O; everything here is deterministic and unit-testable.

pub mod history;
pub mod metrics;
pub mod record;
pub mod status;

pub use history::{HistoryEntry, OperationHistory};
pub use metrics::{derive_stats, Badge, EcoStats};
pub use record::{sanitize_carbon_value, CarbonRecord, Category, EcoLevel, RecordId};
pub use status::{StatusKind, StatusNotice, WorkflowState};
