mod dialogs;
pub mod export_dialog;
pub mod map_view;
mod preview;
mod sidebar;
mod status_bar;
pub mod tag_picker;
pub mod text_input;

use ratatui::prelude::*;

use crate::app::{App, AppMode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(40),  // Controls
            Constraint::Min(0),      // Map + preview
        ])
        .split(main_chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[1]);

    sidebar::render(frame, app, columns[0]);
    map_view::render(frame, app, right[0]);
    preview::render(frame, app, right[1]);

    status_bar::render(frame, app, main_chunks[1]);

    match app.mode {
        AppMode::Help => dialogs::render_help(frame, area),
        AppMode::TagPicking => {
            if let Some(ref picker) = app.tag_picker {
                tag_picker::render(frame, picker, area);
            }
        }
        AppMode::Exporting => {
            if let Some(ref dialog) = app.export_dialog {
                export_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Normal => {}
    }
}
