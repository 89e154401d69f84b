use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::warn;

use crate::records::{LicenseRecord, SummaryRow};
use crate::source::{DataSource, SourceError};
use crate::summary::{summarize, totals, Totals};

/// Which bar series the chart panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSeries {
    TotalUsers,
    TotalCost,
    AverageUsers,
}

impl ChartSeries {
    pub fn next(self) -> Self {
        match self {
            Self::TotalUsers => Self::TotalCost,
            Self::TotalCost => Self::AverageUsers,
            Self::AverageUsers => Self::TotalUsers,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::TotalUsers => "Total Assigned Users per License",
            Self::TotalCost => "Total Cost per License",
            Self::AverageUsers => "Average Users per Usage Row",
        }
    }
}

/// One fully loaded render cycle: snapshot tables, summary, and rollups.
/// Built as a whole and swapped in with a single assignment, so the viewer
/// never sees a partially refreshed dashboard.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub licenses: Vec<LicenseRecord>,
    pub summary: Vec<SummaryRow>,
    pub totals: Totals,
    pub refreshed_at: DateTime<Local>,
}

impl DashboardView {
    pub fn build(source: &dyn DataSource) -> Result<Self, SourceError> {
        let snapshot = source.load()?;
        let summary = summarize(&snapshot.licenses, &snapshot.usage);
        let rollups = totals(&summary);
        Ok(Self {
            licenses: snapshot.licenses,
            summary,
            totals: rollups,
            refreshed_at: Local::now(),
        })
    }
}

pub struct App {
    pub view: Option<DashboardView>,
    pub error: Option<String>,
    pub chart: ChartSeries,
    pub source_label: String,
    pub should_quit: bool,
    clear_on_error: bool,
    refresh_every: Option<Duration>,
    last_refresh: Option<Instant>,
}

impl App {
    pub fn new(
        source_label: String,
        refresh_every: Option<Duration>,
        clear_on_error: bool,
    ) -> Self {
        Self {
            view: None,
            error: None,
            chart: ChartSeries::TotalUsers,
            source_label,
            should_quit: false,
            clear_on_error,
            refresh_every,
            last_refresh: None,
        }
    }

    /// Run one fetch-and-aggregate cycle. On success the whole view is
    /// replaced; on failure nothing new renders for this cycle and the prior
    /// view is kept (marked stale) or cleared, per configuration.
    pub fn refresh(&mut self, source: &dyn DataSource) {
        match DashboardView::build(source) {
            Ok(view) => {
                self.view = Some(view);
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, source = %self.source_label, "refresh failed");
                self.error = Some(e.to_string());
                if self.clear_on_error {
                    self.view = None;
                }
            }
        }
        self.last_refresh = Some(Instant::now());
    }

    /// The first tick always loads; after that the timer (if any) decides.
    pub fn refresh_due(&self) -> bool {
        match (self.last_refresh, self.refresh_every) {
            (None, _) => true,
            (Some(at), Some(every)) => at.elapsed() >= every,
            (Some(_), None) => false,
        }
    }

    pub fn on_tick(&mut self, source: &dyn DataSource) {
        if self.refresh_due() {
            self.refresh(source);
        }
    }

    pub fn next_chart(&mut self) {
        self.chart = self.chart.next();
    }

    pub fn set_chart(&mut self, chart: ChartSeries) {
        self.chart = chart;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// A stale view is one kept on screen after a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && self.view.is_some()
    }
}
