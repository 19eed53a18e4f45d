use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::map::MapMode;

/// State for the export dialog
pub struct ExportDialog {
    /// Selected format
    pub format: ExportFormat,
    /// Output path
    pub output_path: PathBuf,
    /// Mode of the map being exported, for the title
    pub mode: MapMode,
    /// Selected format index
    selected_index: usize,
}

impl ExportDialog {
    pub fn new(default_dir: PathBuf, mode: MapMode) -> Self {
        Self {
            format: ExportFormat::Json,
            output_path: default_dir.join("flickmap_map.json"),
            mode,
            selected_index: 0,
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.update_format();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_index < ExportFormat::ALL.len() - 1 {
            self.selected_index += 1;
            self.update_format();
        }
    }

    fn update_format(&mut self) {
        self.format = ExportFormat::ALL[self.selected_index];
        // Keep the file extension in step with the format
        self.output_path.set_extension(self.format.extension());
    }

    pub fn selected_format(&self) -> ExportFormat {
        self.format
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }
}

pub fn render(frame: &mut Frame, dialog: &ExportDialog, area: Rect) {
    // Center the dialog
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 15.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    // Clear the area behind the dialog
    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(5), // Format selection
            Constraint::Length(3), // Output path
            Constraint::Length(2), // Footer
        ])
        .split(dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" Export Map: {} ", dialog.mode.label()))
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(block, dialog_area);

    let header = Paragraph::new("Select export format:")
        .style(Style::default().fg(Color::Green));
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = ExportFormat::ALL
        .iter()
        .map(|f| {
            let desc = match f {
                ExportFormat::Json => "JSON - deck.gl map spec",
                ExportFormat::Csv => "CSV  - Rows drawn on the map",
                ExportFormat::Html => "HTML - Interactive map page",
            };
            ListItem::new(desc)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Format "))
        .highlight_style(
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(dialog.selected_index));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let output = Paragraph::new(format!("Output: {}", dialog.output_path.display()))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Output File "));
    frame.render_widget(output, chunks[2]);

    let footer = Paragraph::new("j/k: select | Enter: export | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);
}
