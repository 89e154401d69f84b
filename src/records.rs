use serde::{Deserialize, Serialize};

/// One row of the license inventory. Extra columns in the source are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LicenseRecord {
    pub license_id: i64,
    pub license_name: String,
}

/// One assignment/billing observation tying a license to a user count and a cost.
/// Multiple rows may share a `license_id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UsageRecord {
    pub license_id: i64,
    pub assigned_users: u64,
    pub total_cost: f64,
}

/// Both input tables, loaded as a unit. A source either produces a full
/// snapshot or fails; there is no partial state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub licenses: Vec<LicenseRecord>,
    pub usage: Vec<UsageRecord>,
}

/// Per-license aggregate of usage, joined with license metadata.
/// Derived on every refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub license_id: i64,
    /// None when the usage id has no match in the license table.
    pub license_name: Option<String>,
    pub total_users: u64,
    pub total_cost: f64,
    /// Unweighted mean of per-row `assigned_users` within the group.
    pub average_users: f64,
}
