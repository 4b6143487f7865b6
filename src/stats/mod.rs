//! Read-only analysis over the activity log and body stats
//!
//! Features:
//! - Personal records derived from logged sets (`records`)
//! - Body-stat trend with linear regression (`trend`)

pub mod records;
pub mod trend;

pub use records::{PersonalRecord, RecordKind, personal_records};
pub use trend::{BodyTrend, TrendPrediction};
