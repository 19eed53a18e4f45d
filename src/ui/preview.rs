use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, Focus};
use crate::filter::format_count;
use crate::map::MapMode;

/// Rows of the densest hexagons listed in hex mode.
const TOP_BINS: usize = 50;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.map_mode {
        MapMode::Points => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(6)])
                .split(area);
            render_points_table(frame, app, chunks[0]);
            render_tooltip(frame, app, chunks[1]);
        }
        MapMode::Hex => render_bins_table(frame, app, area),
    }
}

fn render_points_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Preview;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(format!(" Preview (first {} rows) ", app.preview_len()));

    let Some(ref sampled) = app.sampled else {
        frame.render_widget(Paragraph::new("No rows").block(block), area);
        return;
    };

    let rows: Vec<Row> = sampled
        .records()
        .take(app.preview_len())
        .map(|r| {
            Row::new(vec![
                Cell::from(r.id.as_str()),
                Cell::from(r.title.as_str()),
                Cell::from(r.tags.as_str()),
                Cell::from(r.taken_display()),
                Cell::from(r.url.as_str()),
            ])
        })
        .collect();

    let header = Row::new(vec!["id", "title", "tags", "taken_dt", "url"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Length(19),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::Cyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(app.selected_point.filter(|&i| i < app.preview_len()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_tooltip(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Selected ");

    let lines = match app.selected_map_point() {
        Some(point) => vec![
            Line::from(Span::styled(point.title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::raw(point.tags)),
            Line::from(Span::styled(point.taken_dt, Style::default().fg(Color::DarkGray))),
            Line::from(vec![
                Span::styled("Open on Flickr: ", Style::default().fg(Color::DarkGray)),
                Span::styled(point.url, Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "Click a point or pick a row",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_bins_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Densest hexagons ");

    let rows: Vec<Row> = app
        .bins
        .iter()
        .take(TOP_BINS)
        .map(|b| {
            Row::new(vec![
                Cell::from(format_count(b.count)),
                Cell::from(format!("{:.5}", b.latitude)),
                Cell::from(format!("{:.5}", b.longitude)),
                Cell::from(format!("{:.0}", b.elevation)),
            ])
        })
        .collect();

    let header = Row::new(vec!["photos", "lat", "lon", "elevation"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Min(9),
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, area);
}
