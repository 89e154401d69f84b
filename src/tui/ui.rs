use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::records::SummaryRow;
use crate::tui::{App, ChartSeries};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Tables and chart
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_main(frame, app, chunks[1]);
    draw_footer(frame, chunks[2]);

    if let Some(error) = &app.error {
        draw_error_overlay(frame, error);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let refreshed = match &app.view {
        Some(view) => view.refreshed_at.format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    };
    let stale = if app.is_stale() { " (stale)" } else { "" };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " License Costs Dashboard ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!(" {} ", app.source_label),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(" refreshed: {}{} ", refreshed, stale),
            Style::default().fg(if app.is_stale() {
                Color::Yellow
            } else {
                Color::DarkGray
            }),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(header, area);
}

fn draw_main(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    draw_licenses(frame, app, tables[0]);
    draw_summary(frame, app, tables[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(34)])
        .split(rows[1]);

    draw_chart(frame, app, bottom[0]);
    draw_totals(frame, app, bottom[1]);
}

fn draw_licenses(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Licenses ")
        .border_style(Style::default().fg(Color::Blue));

    let Some(view) = &app.view else {
        draw_placeholder(frame, block, area);
        return;
    };

    let header = Row::new([Cell::from("ID"), Cell::from("License")])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .licenses
        .iter()
        .map(|l| {
            Row::new([
                Cell::from(l.license_id.to_string()),
                Cell::from(l.license_name.clone()),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(12)])
        .header(header)
        .block(block);
    frame.render_widget(table, area);
}

fn draw_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Usage Summary ")
        .border_style(Style::default().fg(Color::Green));

    let Some(view) = &app.view else {
        draw_placeholder(frame, block, area);
        return;
    };

    let header = Row::new([
        Cell::from("ID"),
        Cell::from("License"),
        Cell::from("Users"),
        Cell::from("Avg"),
        Cell::from("Cost"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view.summary.iter().map(summary_row).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn summary_row(row: &SummaryRow) -> Row<'static> {
    let name = match &row.license_name {
        Some(name) => Cell::from(name.clone()),
        None => Cell::from(Span::styled(
            "(unknown)",
            Style::default().fg(Color::DarkGray),
        )),
    };
    Row::new([
        Cell::from(row.license_id.to_string()),
        name,
        Cell::from(row.total_users.to_string()),
        Cell::from(format!("{:.2}", row.average_users)),
        Cell::from(format!("${:.2}", row.total_cost)),
    ])
}

fn draw_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.chart.title()))
        .border_style(Style::default().fg(Color::Magenta));

    let Some(view) = &app.view else {
        draw_placeholder(frame, block, area);
        return;
    };

    let bars: Vec<Bar> = view
        .summary
        .iter()
        .map(|row| {
            let label = row
                .license_name
                .clone()
                .unwrap_or_else(|| format!("#{}", row.license_id));
            // Bar values are u64, so fractional series carry cents/hundredths
            // and display the formatted value instead.
            let (value, text) = match app.chart {
                ChartSeries::TotalUsers => (row.total_users, row.total_users.to_string()),
                ChartSeries::TotalCost => (
                    (row.total_cost * 100.0).round() as u64,
                    format!("${:.2}", row.total_cost),
                ),
                ChartSeries::AverageUsers => (
                    (row.average_users * 100.0).round() as u64,
                    format!("{:.2}", row.average_users),
                ),
            };
            Bar::default()
                .value(value)
                .text_value(text)
                .label(Line::from(label))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_totals(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Totals ")
        .border_style(Style::default().fg(Color::Yellow));

    let Some(view) = &app.view else {
        draw_placeholder(frame, block, area);
        return;
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Total cost: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("${:.2}", view.totals.total_cost),
                Style::default().fg(Color::Green).bold(),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Total users: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                view.totals.total_users.to_string(),
                Style::default().fg(Color::Cyan).bold(),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Avg users/license: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:.2}", view.totals.mean_users_per_license),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Licenses in use: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                view.summary.len().to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_placeholder(frame: &mut Frame, block: Block, area: Rect) {
    let placeholder = Paragraph::new(Span::styled(
        "No data loaded",
        Style::default().fg(Color::DarkGray),
    ))
    .block(block);
    frame.render_widget(placeholder, area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let keys = Line::from(vec![
        Span::styled(" [r] ", Style::default().fg(Color::White)),
        Span::styled("refresh ", Style::default().fg(Color::DarkGray)),
        Span::styled(" [Tab/1/2/3] ", Style::default().fg(Color::White)),
        Span::styled("chart ", Style::default().fg(Color::DarkGray)),
        Span::styled(" [Esc] ", Style::default().fg(Color::White)),
        Span::styled("dismiss error ", Style::default().fg(Color::DarkGray)),
        Span::styled(" [q] ", Style::default().fg(Color::White)),
        Span::styled("quit", Style::default().fg(Color::DarkGray)),
    ]);

    let footer = Paragraph::new(keys).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(footer, area);
}

fn draw_error_overlay(frame: &mut Frame, error: &str) {
    let area = frame.area();

    let popup_width = ((f32::from(area.width) * 0.7) as u16).min(area.width);
    let popup_height = 7u16.min(area.height);
    let popup_x = area.width.saturating_sub(popup_width) / 2;
    let popup_y = area.height.saturating_sub(popup_height) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [r] ", Style::default().fg(Color::Green).bold()),
            Span::raw("Retry  "),
            Span::styled(" [Esc] ", Style::default().fg(Color::Yellow).bold()),
            Span::raw("Dismiss"),
        ]),
    ];

    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Refresh Failed ")
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(popup, popup_area);
}
