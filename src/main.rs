mod config;
mod records;
mod report;
mod source;
mod summary;
mod tui;

use std::io::Stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use config::{DashboardConfig, SourceKind};
use source::DataSource;
use tui::{App, ChartSeries, DashboardView, Event, EventHandler};

#[derive(Parser)]
#[command(name = "license-dash")]
#[command(about = "License inventory and subscription cost dashboard")]
#[command(version)]
struct Cli {
    /// Configuration file (YAML). Defaults to ./license-dash.yaml, then the
    /// user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing licenses.csv and subscription_usage.csv
    /// (selects the CSV backend)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// SQLite database path (selects the SQLite backend)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Auto-refresh interval in seconds (0 disables the timer)
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Render one report to stdout and exit instead of starting the TUI
    #[arg(long)]
    headless: bool,

    /// With --headless, emit JSON instead of text tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = DashboardConfig::load(cli.config.as_deref())?;
    cfg.apply_overrides(|name| std::env::var(name).ok());
    if let Some(dir) = &cli.data_dir {
        cfg.source.kind = SourceKind::Csv;
        cfg.source.data_dir = dir.clone();
    }
    if let Some(db) = &cli.database {
        cfg.source.kind = SourceKind::Sqlite;
        cfg.source.database = Some(db.clone());
    }
    if let Some(secs) = cli.refresh_secs {
        cfg.refresh_secs = secs;
    }

    let source = source::build(&cfg)?;

    if cli.headless {
        // Subscriber writes to stderr so the report stays clean on stdout.
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
        run_headless(source.as_ref(), cli.json)
    } else {
        run_tui(source.as_ref(), &cfg).await
    }
}

fn run_headless(source: &dyn DataSource, json: bool) -> Result<()> {
    let view = DashboardView::build(source)
        .with_context(|| format!("failed to load {}", source.describe()))?;
    if json {
        println!("{}", report::to_json(&view)?);
    } else {
        print!("{}", report::render(&view));
    }
    Ok(())
}

async fn run_tui(source: &dyn DataSource, cfg: &DashboardConfig) -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        source.describe(),
        cfg.refresh_interval(),
        cfg.clear_on_error,
    );
    let mut events = EventHandler::new(Duration::from_millis(250));

    // The first tick performs the initial load, so the UI paints immediately.
    let result = event_loop(&mut terminal, &mut app, &mut events, source).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    source: &dyn DataSource,
) -> Result<()> {
    loop {
        terminal.draw(|frame| tui::ui::draw(frame, app))?;

        match events.next().await? {
            Event::Key(key) => match key.code {
                KeyCode::Char('q') => app.quit(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
                KeyCode::Char('r') => app.refresh(source),
                KeyCode::Tab => app.next_chart(),
                KeyCode::Char('1') => app.set_chart(ChartSeries::TotalUsers),
                KeyCode::Char('2') => app.set_chart(ChartSeries::TotalCost),
                KeyCode::Char('3') => app.set_chart(ChartSeries::AverageUsers),
                KeyCode::Esc => app.dismiss_error(),
                _ => {}
            },
            Event::Tick => app.on_tick(source),
            Event::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}
