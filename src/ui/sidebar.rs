use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, DateBound, Focus};
use crate::filter::{format_count, NO_TAG_FILTER};
use crate::sample::{MAX_POINTS, MIN_POINTS};

fn control_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Controls ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let mut constraints = vec![
        Constraint::Length(3), // Path
        Constraint::Length(3), // Tag
    ];
    if app.has_date_control() {
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Length(3)); // Max points
    constraints.push(Constraint::Length(3)); // Mode
    constraints.push(Constraint::Min(0)); // Summary

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);
    let mut slot = chunks.iter().copied();

    if let Some(rect) = slot.next() {
        render_path(frame, app, rect);
    }
    if let Some(rect) = slot.next() {
        let style = if app.selected_tag == NO_TAG_FILTER {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
        } else {
            Style::default().fg(Color::Green)
        };
        let tag = Paragraph::new(Span::styled(app.selected_tag.as_str(), style))
            .block(control_block(" Filter by tag ", app.focus == Focus::Tag));
        frame.render_widget(tag, rect);
    }
    if app.has_date_control() {
        if let Some(rect) = slot.next() {
            render_dates(frame, app, rect);
        }
    }
    if let Some(rect) = slot.next() {
        let text = format!(
            "{} ({}-{})",
            format_count(app.max_points),
            format_count(MIN_POINTS),
            format_count(MAX_POINTS)
        );
        let points = Paragraph::new(text).block(control_block(
            " Max points (for URLs/clicks) ",
            app.focus == Focus::MaxPoints,
        ));
        frame.render_widget(points, rect);
    }
    if let Some(rect) = slot.next() {
        let mode = Paragraph::new(app.map_mode.label())
            .style(Style::default().fg(Color::Yellow))
            .block(control_block(" Map mode ", app.focus == Focus::MapMode));
        frame.render_widget(mode, rect);
    }
    if let Some(rect) = slot.next() {
        let summary = app.summary().unwrap_or_else(|| "No data loaded".to_string());
        let paragraph = Paragraph::new(summary)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rect);
    }
}

fn render_path(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Path;
    let line = if focused {
        let (before, after) = app.path_input.split_at_cursor();
        Line::from(vec![
            Span::raw(before),
            Span::styled("_", Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK)),
            Span::raw(after),
        ])
    } else {
        Line::from(app.path_input.value())
    };

    let paragraph = Paragraph::new(line).block(control_block(" CSV path ", focused));
    frame.render_widget(paragraph, area);
}

fn render_dates(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::DateRange;
    let bound_style = |bound: DateBound| {
        if focused && app.date_bound == bound {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let mut lines = Vec::new();
    match app.date_range {
        Some(range) => lines.push(Line::from(vec![
            Span::styled(range.start.format("%Y-%m-%d").to_string(), bound_style(DateBound::Start)),
            Span::raw(" → "),
            Span::styled(range.end.format("%Y-%m-%d").to_string(), bound_style(DateBound::End)),
        ])),
        None => lines.push(Line::from(Span::styled(
            "all dates (x cleared, r resets)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))),
    }
    if let Some((start, end)) = app.date_span {
        lines.push(Line::from(Span::styled(
            format!("data: {} → {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(control_block(" Taken date range ", focused));
    frame.render_widget(paragraph, area);
}
