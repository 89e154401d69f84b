use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::records::{LicenseRecord, SummaryRow};
use crate::summary::Totals;
use crate::tui::DashboardView;

/// Plain-text rendering of one dashboard cycle, for `--headless`.
pub fn render(view: &DashboardView) -> String {
    let mut out = String::new();
    let name_width = name_column_width(view);

    let _ = writeln!(out, "License Information");
    let _ = writeln!(out, "{:>8}  {:<name_width$}", "ID", "License");
    for l in &view.licenses {
        let _ = writeln!(out, "{:>8}  {:<name_width$}", l.license_id, l.license_name);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Subscription Usage Summary");
    let _ = writeln!(
        out,
        "{:>8}  {:<name_width$}  {:>7}  {:>8}  {:>12}",
        "ID", "License", "Users", "Avg", "Cost"
    );
    for row in &view.summary {
        let name = row.license_name.as_deref().unwrap_or("(unknown)");
        let _ = writeln!(
            out,
            "{:>8}  {:<name_width$}  {:>7}  {:>8.2}  {:>12}",
            row.license_id,
            name,
            row.total_users,
            row.average_users,
            format!("${:.2}", row.total_cost),
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Total cost:         ${:.2}", view.totals.total_cost);
    let _ = writeln!(out, "Total users:        {}", view.totals.total_users);
    let _ = writeln!(
        out,
        "Avg users/license:  {:.2}",
        view.totals.mean_users_per_license
    );
    out
}

#[derive(Serialize)]
struct ReportDoc<'a> {
    generated_at: DateTime<Local>,
    licenses: &'a [LicenseRecord],
    summary: &'a [SummaryRow],
    totals: &'a Totals,
}

pub fn to_json(view: &DashboardView) -> Result<String> {
    let doc = ReportDoc {
        generated_at: view.refreshed_at,
        licenses: &view.licenses,
        summary: &view.summary,
        totals: &view.totals,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn name_column_width(view: &DashboardView) -> usize {
    view.licenses
        .iter()
        .map(|l| l.license_name.len())
        .chain(
            view.summary
                .iter()
                .map(|r| r.license_name.as_deref().unwrap_or("(unknown)").len()),
        )
        .chain(std::iter::once("License".len()))
        .max()
        .unwrap_or(7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Snapshot, UsageRecord};
    use crate::source::{DataSource, SourceError};

    #[derive(Debug)]
    struct FixtureSource;

    impl DataSource for FixtureSource {
        fn load(&self) -> Result<Snapshot, SourceError> {
            Ok(Snapshot {
                licenses: vec![
                    LicenseRecord {
                        license_id: 1,
                        license_name: "Office".to_string(),
                    },
                    LicenseRecord {
                        license_id: 2,
                        license_name: "Teams".to_string(),
                    },
                ],
                usage: vec![
                    UsageRecord {
                        license_id: 1,
                        assigned_users: 10,
                        total_cost: 100.0,
                    },
                    UsageRecord {
                        license_id: 1,
                        assigned_users: 5,
                        total_cost: 50.0,
                    },
                    UsageRecord {
                        license_id: 2,
                        assigned_users: 3,
                        total_cost: 30.0,
                    },
                ],
            })
        }

        fn describe(&self) -> String {
            "fixture".to_string()
        }
    }

    #[test]
    fn text_report_shows_rollups_to_two_decimal_places() {
        let view = DashboardView::build(&FixtureSource).unwrap();
        let text = render(&view);

        assert!(text.contains("Office"));
        assert!(text.contains("Total cost:         $180.00"));
        assert!(text.contains("Total users:        18"));
        assert!(text.contains("Avg users/license:  9.00"));
    }

    #[test]
    fn json_report_round_trips() {
        let view = DashboardView::build(&FixtureSource).unwrap();
        let json = to_json(&view).unwrap();

        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["totals"]["total_users"], 18);
        assert_eq!(doc["summary"].as_array().unwrap().len(), 2);
        assert_eq!(doc["licenses"][0]["license_name"], "Office");
    }
}
