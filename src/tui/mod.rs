mod app;
mod event;
pub mod ui;

pub use app::{App, ChartSeries, DashboardView};
pub use event::{Event, EventHandler};
