use ratatui::{
    prelude::*,
    widgets::Paragraph,
};

use crate::app::App;
use crate::filter::format_count;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // Errors take precedence over everything else
    if let Some(ref error) = app.load_error {
        let line = Line::from(vec![Span::styled(
            format!(" Load error: {} ", error),
            Style::default().fg(Color::White).bg(Color::Red),
        )]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(ref message) = app.status_message {
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", message),
                Style::default().fg(Color::Yellow).bg(Color::DarkGray),
            ),
        ]);
        let paragraph = Paragraph::new(line);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut spans = Vec::new();

    // Left: dataset path
    let path = app
        .dataset
        .as_ref()
        .map(|d| d.path.to_string_lossy().to_string())
        .unwrap_or_else(|| "no dataset".to_string());
    spans.push(Span::styled(
        format!(" {} ", path),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    // Middle: rows drawn on the map
    if let (Some(payload), Some(sampled)) = (&app.payload, &app.sampled) {
        spans.push(Span::styled(
            format!(
                " {} | {} rows on map, {} sampled ",
                app.map_mode.label(),
                format_count(payload.view.len()),
                format_count(sampled.len())
            ),
            Style::default().fg(Color::Gray),
        ));
    }

    let content_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let help_text = " Tab:focus m:mode E:export ?:help q:quit ";
    let help_len = help_text.len();

    let available = area.width as usize;
    if available > content_len + help_len {
        spans.push(Span::raw(" ".repeat(available - content_len - help_len)));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
