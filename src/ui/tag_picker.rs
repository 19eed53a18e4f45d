//! Searchable single-select over the tag filter options.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use super::text_input::TextInput;
use crate::filter::NO_TAG_FILTER;

/// Picker state. Options are `"(no filter)"` followed by the top tags.
pub struct TagPicker {
    options: Vec<String>,
    /// Indices into `options` matching the current input
    matches: Vec<usize>,
    pub input: TextInput,
    pub selected_index: usize,
}

impl TagPicker {
    pub fn new(top_tags: &[String], current: &str) -> Self {
        let mut options = Vec::with_capacity(top_tags.len() + 1);
        options.push(NO_TAG_FILTER.to_string());
        options.extend(top_tags.iter().cloned());

        let mut picker = Self {
            matches: (0..options.len()).collect(),
            options,
            input: TextInput::default(),
            selected_index: 0,
        };
        if let Some(pos) = picker.options.iter().position(|o| o == current) {
            picker.selected_index = pos;
        }
        picker
    }

    pub fn handle_char(&mut self, c: char) {
        self.input.handle_char(c);
        self.update_matches();
    }

    pub fn backspace(&mut self) {
        self.input.backspace();
        self.update_matches();
    }

    /// Filter options by substring; the no-filter entry always stays first.
    fn update_matches(&mut self) {
        let needle = self.input.value().trim().to_lowercase();
        self.matches = self
            .options
            .iter()
            .enumerate()
            .filter(|(i, o)| *i == 0 || needle.is_empty() || o.contains(&needle))
            .map(|(i, _)| i)
            .collect();

        // Jump to the first real match while typing
        self.selected_index = if needle.is_empty() || self.matches.len() == 1 { 0 } else { 1 };
    }

    pub fn move_down(&mut self) {
        if self.selected_index < self.matches.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn visible_options(&self) -> impl Iterator<Item = &str> + '_ {
        self.matches.iter().map(|&i| self.options[i].as_str())
    }

    pub fn selected(&self) -> Option<&str> {
        self.matches
            .get(self.selected_index)
            .map(|&i| self.options[i].as_str())
    }
}

pub fn render(frame: &mut Frame, picker: &TagPicker, area: Rect) {
    let dialog_width = 50.min(area.width.saturating_sub(4));
    let dialog_height = 24.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Filter by tag (optional) ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Min(5),    // Options
            Constraint::Length(1), // Help
        ])
        .split(dialog_area);

    let (before, after) = picker.input.split_at_cursor();
    let input = Paragraph::new(format!("> {}_{}", before, after))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(input, chunks[0]);

    let items: Vec<ListItem> = picker
        .visible_options()
        .enumerate()
        .map(|(i, option)| {
            let style = if i == 0 {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };
            ListItem::new(format!("  {} ", option)).style(style)
        })
        .collect();

    let title = format!(" Tags ({}) ", picker.matches.len().saturating_sub(1));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(picker.selected_index));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let help = Paragraph::new("type: search | ↑↓: select | Enter: apply | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<String> {
        vec!["lyon".to_string(), "france".to_string(), "lyonnais".to_string()]
    }

    #[test]
    fn test_starts_on_current_choice() {
        let picker = TagPicker::new(&tags(), "france");
        assert_eq!(picker.selected(), Some("france"));

        let picker = TagPicker::new(&tags(), NO_TAG_FILTER);
        assert_eq!(picker.selected(), Some(NO_TAG_FILTER));
    }

    #[test]
    fn test_typing_narrows_options() {
        let mut picker = TagPicker::new(&tags(), NO_TAG_FILTER);
        for c in "LYON".chars() {
            picker.handle_char(c);
        }

        let visible: Vec<&str> = picker.visible_options().collect();
        assert_eq!(visible, vec![NO_TAG_FILTER, "lyon", "lyonnais"]);
        assert_eq!(picker.selected(), Some("lyon"));

        picker.move_down();
        picker.move_down();
        assert_eq!(picker.selected(), Some("lyonnais"));
    }

    #[test]
    fn test_no_match_keeps_no_filter_entry() {
        let mut picker = TagPicker::new(&tags(), NO_TAG_FILTER);
        picker.handle_char('z');
        assert_eq!(picker.selected(), Some(NO_TAG_FILTER));

        picker.backspace();
        assert_eq!(picker.visible_options().count(), 4);
    }
}
