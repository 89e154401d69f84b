use std::collections::HashMap;

use serde::Serialize;

use crate::records::{LicenseRecord, SummaryRow, UsageRecord};

#[derive(Debug, Default)]
struct UsageAccumulator {
    users: u64,
    cost: f64,
    rows: u64,
}

impl UsageAccumulator {
    fn add(&mut self, row: &UsageRecord) {
        self.users += row.assigned_users;
        self.cost += row.total_cost;
        self.rows += 1;
    }

    fn average_users(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.users as f64 / self.rows as f64
        }
    }
}

/// Group usage rows by `license_id`, sum users and cost per group, and
/// left-join license names. Ids with no match in the license table keep
/// their row with `license_name: None`. Empty usage yields an empty summary.
///
/// Grouping is exact-match on the id; no normalization. Rows come back
/// sorted by id for stable display, but callers must not rely on order.
pub fn summarize(licenses: &[LicenseRecord], usage: &[UsageRecord]) -> Vec<SummaryRow> {
    let mut groups: HashMap<i64, UsageAccumulator> = HashMap::new();
    for row in usage {
        groups.entry(row.license_id).or_default().add(row);
    }

    let names: HashMap<i64, &str> = licenses
        .iter()
        .map(|l| (l.license_id, l.license_name.as_str()))
        .collect();

    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(id, acc)| SummaryRow {
            license_id: id,
            license_name: names.get(&id).map(|n| (*n).to_string()),
            total_users: acc.users,
            total_cost: acc.cost,
            average_users: acc.average_users(),
        })
        .collect();
    rows.sort_by_key(|r| r.license_id);
    rows
}

/// Scalar rollups across the summary table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_cost: f64,
    pub total_users: u64,
    /// Mean of per-license `total_users` across summary rows.
    pub mean_users_per_license: f64,
}

pub fn totals(summary: &[SummaryRow]) -> Totals {
    let total_users: u64 = summary.iter().map(|r| r.total_users).sum();
    let total_cost: f64 = summary.iter().map(|r| r.total_cost).sum();
    let mean_users_per_license = if summary.is_empty() {
        0.0
    } else {
        total_users as f64 / summary.len() as f64
    };
    Totals {
        total_cost,
        total_users,
        mean_users_per_license,
    }
}
