use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)))
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let dialog_width = 62.min(area.width.saturating_sub(4));
    let dialog_height = 36.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let help_text = vec![
        heading("Controls"),
        Line::from(""),
        Line::from("  Tab / S-Tab  Next / previous control"),
        Line::from("  Enter        Load CSV (path field)"),
        Line::from("  Ctrl+u       Clear path field"),
        Line::from("  t            Search tags"),
        Line::from("  j / k        Cycle tag, step value, move selection"),
        Line::from(""),
        heading("Date range"),
        Line::from(""),
        Line::from("  h / l        Pick start or end"),
        Line::from("  [ / ]        Selected bound -1 / +1 day"),
        Line::from("  { / }        Selected bound -30 / +30 days"),
        Line::from("  x            Clear date filter"),
        Line::from("  r            Reset to full span"),
        Line::from(""),
        heading("Map"),
        Line::from(""),
        Line::from("  + / -        Max points +500 / -500"),
        Line::from("  m            Toggle hex / points"),
        Line::from("  click        Select nearest point (points mode)"),
        Line::from("  o / Enter    Open selected photo URL"),
        Line::from("  E            Export map (JSON, CSV, HTML)"),
        Line::from(""),
        Line::from("  ?            Show this help"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from(Span::styled("Press Esc or ? to close", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}
