use anyhow::Result;
use chrono::{Days, NaiveDate};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::dataset::{Dataset, DatasetCache, LoadError, PhotoRecord, RecordView};
use crate::filter::{apply_filters, format_count, DateRange, FilterConfig, FilterOutcome, NO_TAG_FILTER};
use crate::map::{HexBin, MapMode, MapPayload, MapPoint};
use crate::sample::{clamp_max_points, sample_view, step_down, step_up};
use crate::tags::top_tags;
use crate::ui;
use crate::ui::export_dialog::ExportDialog;
use crate::ui::map_view::MapBounds;
use crate::ui::tag_picker::TagPicker;
use crate::ui::text_input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Help,
    TagPicking,
    Exporting,
}

/// Sidebar control (or the preview table) receiving keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Path,
    Tag,
    DateRange,
    MaxPoints,
    MapMode,
    Preview,
}

/// Which end of the date range the date keys move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

pub struct App {
    pub config: Config,
    pub cache: DatasetCache,
    pub dataset: Option<Arc<Dataset>>,
    pub load_error: Option<String>,
    pub mode: AppMode,
    pub focus: Focus,
    pub should_quit: bool,
    pub status_message: Option<String>,
    // Controls
    pub path_input: TextInput,
    pub top_tags: Vec<String>,
    pub selected_tag: String,
    /// Data min-max `taken_dt` dates; `None` hides the date control
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    pub date_range: Option<DateRange>,
    pub date_bound: DateBound,
    pub max_points: usize,
    pub map_mode: MapMode,
    // Derived views, recomputed by `refresh`
    pub outcome: Option<FilterOutcome>,
    pub sampled: Option<RecordView>,
    pub payload: Option<MapPayload>,
    pub bins: Vec<HexBin>,
    /// Index into the sampled view of the highlighted point
    pub selected_point: Option<usize>,
    // Dialogs
    pub tag_picker: Option<TagPicker>,
    pub export_dialog: Option<ExportDialog>,
    // Last drawn map geometry, for mouse picking
    pub map_area: Option<Rect>,
    pub map_bounds: Option<MapBounds>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let path_input = TextInput::new(&config.csv_path);
        let max_points = clamp_max_points(config.sampling.default_max_points);
        let map_mode = config.map.default_mode;

        Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            load_error: None,
            mode: AppMode::Normal,
            focus: Focus::Tag,
            should_quit: false,
            status_message: None,
            path_input,
            top_tags: Vec::new(),
            selected_tag: NO_TAG_FILTER.to_string(),
            date_span: None,
            date_range: None,
            date_bound: DateBound::Start,
            max_points,
            map_mode,
            outcome: None,
            sampled: None,
            payload: None,
            bins: Vec::new(),
            selected_point: None,
            tag_picker: None,
            export_dialog: None,
            map_area: None,
            map_bounds: None,
        }
    }

    /// Load the dataset named in the path field (through the cache) and reset
    /// the controls that depend on it. Errors are also shown in the UI.
    pub fn load_path(&mut self) -> Result<(), LoadError> {
        let path = self.path_input.value().trim().to_string();

        match self.cache.get_or_load(&path) {
            Ok(dataset) => {
                self.top_tags = top_tags(&dataset, self.config.tags.top_k);
                if !self.top_tags.contains(&self.selected_tag) {
                    self.selected_tag = NO_TAG_FILTER.to_string();
                }
                self.date_span = dataset.taken_span();
                self.date_range = self.date_span.map(|(start, end)| DateRange::new(start, end));
                self.load_error = None;
                self.status_message = Some(format!(
                    "Loaded {} rows from {}",
                    format_count(dataset.len()),
                    path
                ));
                self.dataset = Some(dataset);
                self.refresh();
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load dataset");
                self.dataset = None;
                self.top_tags.clear();
                self.date_span = None;
                self.date_range = None;
                self.load_error = Some(e.to_string());
                self.status_message = Some(format!("Load error: {}", e));
                self.refresh();
                Err(e)
            }
        }
    }

    /// Whether the date control is shown (the data has a `taken_dt` column).
    pub fn has_date_control(&self) -> bool {
        self.dataset.as_ref().is_some_and(|d| d.has_taken_dt)
    }

    pub fn filter_config(&self) -> FilterConfig {
        let range = if self.has_date_control() { self.date_range } else { None };
        FilterConfig::default()
            .with_tag_choice(&self.selected_tag)
            .with_date_range(range)
    }

    /// Recompute the filtered view, the sample and the map payload. The
    /// highlighted photo stays selected while it is still in the sample.
    pub fn refresh(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            self.clear_views();
            return;
        };

        let outcome = match apply_filters(&dataset, &self.filter_config()) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(tag = %self.selected_tag, error = %e, "Tag filter rejected");
                self.clear_views();
                self.status_message = Some(format!("Tag filter error: {}", e));
                return;
            }
        };
        let sampled = sample_view(&outcome.view, self.max_points, self.config.sampling.seed);
        let payload = MapPayload::build(self.map_mode, &outcome.view, &sampled, &self.config.map);

        // Dataset row of the current selection, if it belongs to this dataset
        let selected_row = self.selected_point.and_then(|idx| {
            let previous = self.sampled.as_ref()?;
            if !Arc::ptr_eq(previous.dataset(), &dataset) {
                return None;
            }
            previous.rows().get(idx).copied()
        });

        self.bins = payload.bins();
        self.selected_point = match selected_row.and_then(|row| sampled.rows().iter().position(|&r| r == row)) {
            Some(idx) => Some(idx),
            None if sampled.is_empty() => None,
            None => Some(0),
        };
        self.outcome = Some(outcome);
        self.sampled = Some(sampled);
        self.payload = Some(payload);
    }

    fn clear_views(&mut self) {
        self.outcome = None;
        self.sampled = None;
        self.payload = None;
        self.bins.clear();
        self.selected_point = None;
    }

    pub fn summary(&self) -> Option<String> {
        self.outcome.as_ref().map(|o| o.summary())
    }

    /// Rows listed in the point-mode preview table.
    pub fn preview_len(&self) -> usize {
        self.sampled
            .as_ref()
            .map(|s| s.len().min(self.config.preview.rows))
            .unwrap_or(0)
    }

    pub fn selected_record(&self) -> Option<&PhotoRecord> {
        let idx = self.selected_point?;
        self.sampled.as_ref()?.get(idx)
    }

    pub fn selected_map_point(&self) -> Option<MapPoint> {
        self.selected_record().and_then(MapPoint::from_record)
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Path, Focus::Tag];
        if self.has_date_control() {
            order.push(Focus::DateRange);
        }
        order.push(Focus::MaxPoints);
        order.push(Focus::MapMode);
        if self.map_mode == MapMode::Points {
            order.push(Focus::Preview);
        }
        order
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(pos + 1) % order.len()];
    }

    pub fn focus_prev(&mut self) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(pos + order.len() - 1) % order.len()];
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key)?,
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode {
            AppMode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                    self.mode = AppMode::Normal;
                }
                return Ok(());
            }
            AppMode::TagPicking => return self.handle_tag_picker_key(key),
            AppMode::Exporting => return self.handle_export_dialog_key(key),
            AppMode::Normal => {}
        }

        self.status_message = None;

        match key.code {
            KeyCode::Tab => {
                self.focus_next();
                return Ok(());
            }
            KeyCode::BackTab => {
                self.focus_prev();
                return Ok(());
            }
            _ => {}
        }

        if self.focus == Focus::Path {
            self.handle_path_key(key);
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Char('m') => self.toggle_map_mode(),
            KeyCode::Char('t') => self.open_tag_picker(),
            KeyCode::Char('E') => self.open_export_dialog()?,
            KeyCode::Char('+') | KeyCode::Char('=') => self.set_max_points(step_up(self.max_points)),
            KeyCode::Char('-') => self.set_max_points(step_down(self.max_points)),
            KeyCode::Char('[') => self.shift_date(-1),
            KeyCode::Char(']') => self.shift_date(1),
            KeyCode::Char('{') => self.shift_date(-30),
            KeyCode::Char('}') => self.shift_date(30),
            KeyCode::Char('x') => self.clear_date_range(),
            KeyCode::Char('r') => self.reset_date_range(),
            KeyCode::Char('o') => self.open_selected_url()?,
            _ => self.handle_focus_key(key)?,
        }

        Ok(())
    }

    fn handle_path_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                // Failure is already reported in the status bar
                let _ = self.load_path();
            }
            KeyCode::Esc => self.focus_next(),
            KeyCode::Left => self.path_input.move_cursor_left(),
            KeyCode::Right => self.path_input.move_cursor_right(),
            KeyCode::Backspace => self.path_input.backspace(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.path_input.clear();
            }
            KeyCode::Char(c) => self.path_input.handle_char(c),
            _ => {}
        }
    }

    fn handle_focus_key(&mut self, key: KeyEvent) -> Result<()> {
        match (self.focus, key.code) {
            (Focus::Tag, KeyCode::Enter) => self.open_tag_picker(),
            (Focus::Tag, KeyCode::Down | KeyCode::Char('j')) => self.cycle_tag(1),
            (Focus::Tag, KeyCode::Up | KeyCode::Char('k')) => self.cycle_tag(-1),

            (Focus::DateRange, KeyCode::Left | KeyCode::Char('h')) => self.date_bound = DateBound::Start,
            (Focus::DateRange, KeyCode::Right | KeyCode::Char('l')) => self.date_bound = DateBound::End,
            (Focus::DateRange, KeyCode::Up | KeyCode::Char('k')) => self.shift_date(1),
            (Focus::DateRange, KeyCode::Down | KeyCode::Char('j')) => self.shift_date(-1),
            (Focus::DateRange, KeyCode::PageUp) => self.shift_date(30),
            (Focus::DateRange, KeyCode::PageDown) => self.shift_date(-30),

            (Focus::MaxPoints, KeyCode::Up | KeyCode::Right | KeyCode::Char('k') | KeyCode::Char('l')) => {
                self.set_max_points(step_up(self.max_points))
            }
            (Focus::MaxPoints, KeyCode::Down | KeyCode::Left | KeyCode::Char('j') | KeyCode::Char('h')) => {
                self.set_max_points(step_down(self.max_points))
            }

            (Focus::MapMode, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
                self.toggle_map_mode()
            }

            (Focus::Preview, KeyCode::Down | KeyCode::Char('j')) => self.move_selection(1),
            (Focus::Preview, KeyCode::Up | KeyCode::Char('k')) => self.move_selection(-1),
            (Focus::Preview, KeyCode::Enter) => self.open_selected_url()?,
            _ => {}
        }
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (Some(area), Some(bounds)) = (self.map_area, self.map_bounds) else {
            return;
        };
        let inside = mouse.column >= area.x
            && mouse.column < area.right()
            && mouse.row >= area.y
            && mouse.row < area.bottom();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if inside && self.map_mode == MapMode::Points => {
                let (lat, lon) = bounds.cell_to_geo(area, mouse.column, mouse.row);
                self.select_nearest(lat, lon);
            }
            MouseEventKind::ScrollDown if self.focus == Focus::Preview => self.move_selection(1),
            MouseEventKind::ScrollUp if self.focus == Focus::Preview => self.move_selection(-1),
            _ => {}
        }
    }

    /// Highlight the sampled point closest to `(lat, lon)`.
    pub fn select_nearest(&mut self, lat: f64, lon: f64) {
        let Some(ref sampled) = self.sampled else {
            return;
        };
        let lon_scale = lat.to_radians().cos();

        let nearest = sampled
            .records()
            .enumerate()
            .filter_map(|(i, r)| r.position().map(|p| (i, p)))
            .map(|(i, (plat, plon))| {
                let dy = plat - lat;
                let dx = (plon - lon) * lon_scale;
                (i, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        if let Some(idx) = nearest {
            self.selected_point = Some(idx);
            self.focus = Focus::Preview;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.preview_len();
        if len == 0 {
            return;
        }
        let current = self.selected_point.unwrap_or(0).min(len - 1) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected_point = Some(next as usize);
    }

    fn cycle_tag(&mut self, delta: isize) {
        let count = self.top_tags.len() as isize + 1;
        let current = self
            .top_tags
            .iter()
            .position(|t| *t == self.selected_tag)
            .map(|p| p as isize + 1)
            .unwrap_or(0);
        let next = (current + delta).rem_euclid(count);
        self.set_tag(if next == 0 {
            NO_TAG_FILTER.to_string()
        } else {
            self.top_tags[next as usize - 1].clone()
        });
    }

    pub fn set_tag(&mut self, tag: String) {
        self.selected_tag = tag;
        self.refresh();
    }

    pub fn set_max_points(&mut self, max_points: usize) {
        let max_points = clamp_max_points(max_points);
        if max_points != self.max_points {
            self.max_points = max_points;
            self.refresh();
        }
    }

    pub fn toggle_map_mode(&mut self) {
        self.map_mode = self.map_mode.toggle();
        if self.map_mode == MapMode::Hex && self.focus == Focus::Preview {
            self.focus = Focus::MapMode;
        }
        self.refresh();
    }

    /// Move the selected bound of the date range by `days`. The start never
    /// passes the end and vice versa.
    pub fn shift_date(&mut self, days: i64) {
        if !self.has_date_control() {
            return;
        }
        let Some(range) = self.date_range.or_else(|| self.date_span.map(|(s, e)| DateRange::new(s, e))) else {
            return;
        };

        let shift = |date: NaiveDate| {
            let step = Days::new(days.unsigned_abs());
            let shifted = if days >= 0 {
                date.checked_add_days(step)
            } else {
                date.checked_sub_days(step)
            };
            shifted.unwrap_or(date)
        };

        let updated = match self.date_bound {
            DateBound::Start => DateRange::new(shift(range.start).min(range.end), range.end),
            DateBound::End => DateRange::new(range.start, shift(range.end).max(range.start)),
        };
        self.date_range = Some(updated);
        self.refresh();
    }

    pub fn clear_date_range(&mut self) {
        if self.date_range.take().is_some() {
            self.status_message = Some("Date filter cleared".to_string());
            self.refresh();
        }
    }

    pub fn reset_date_range(&mut self) {
        self.date_range = self.date_span.map(|(start, end)| DateRange::new(start, end));
        self.refresh();
    }

    fn open_tag_picker(&mut self) {
        if self.dataset.is_none() {
            return;
        }
        self.tag_picker = Some(TagPicker::new(&self.top_tags, &self.selected_tag));
        self.mode = AppMode::TagPicking;
    }

    fn handle_tag_picker_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(picker) = self.tag_picker.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.tag_picker = None;
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => {
                let choice = picker.selected().map(str::to_string);
                self.tag_picker = None;
                self.mode = AppMode::Normal;
                if let Some(tag) = choice {
                    self.set_tag(tag);
                }
            }
            KeyCode::Down | KeyCode::Tab => picker.move_down(),
            KeyCode::Up | KeyCode::BackTab => picker.move_up(),
            KeyCode::Backspace => picker.backspace(),
            KeyCode::Char(c) => picker.handle_char(c),
            _ => {}
        }

        Ok(())
    }

    fn open_export_dialog(&mut self) -> Result<()> {
        if self.payload.is_none() {
            self.status_message = Some("Nothing to export".to_string());
            return Ok(());
        }
        let dir = std::env::current_dir()?;
        self.export_dialog = Some(ExportDialog::new(dir, self.map_mode));
        self.mode = AppMode::Exporting;
        Ok(())
    }

    fn handle_export_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(dialog) = self.export_dialog.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.export_dialog = None;
                self.mode = AppMode::Normal;
                self.status_message = Some("Export cancelled".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => dialog.move_down(),
            KeyCode::Char('k') | KeyCode::Up => dialog.move_up(),
            KeyCode::Enter => {
                let format = dialog.selected_format();
                let output_path = dialog.output_path().clone();
                let Some(ref payload) = self.payload else {
                    return Ok(());
                };

                match crate::export::export_payload(payload, &output_path, format) {
                    Ok(count) => {
                        self.export_dialog = None;
                        self.mode = AppMode::Normal;
                        self.status_message = Some(format!(
                            "Exported {} points to {}",
                            format_count(count),
                            output_path.display()
                        ));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, path = %output_path.display(), "Export failed");
                        self.status_message = Some(format!("Export error: {}", e));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Open the highlighted photo's URL in the browser.
    fn open_selected_url(&mut self) -> Result<()> {
        if self.map_mode != MapMode::Points {
            return Ok(());
        }
        let Some(url) = self.selected_record().map(|r| r.url.clone()) else {
            return Ok(());
        };
        if url.is_empty() {
            self.status_message = Some("Selected photo has no URL".to_string());
            return Ok(());
        }

        let opener = if let Some(ref browser) = self.config.preview.external_browser {
            browser.as_str()
        } else {
            // Use system default
            #[cfg(target_os = "linux")]
            { "xdg-open" }
            #[cfg(target_os = "macos")]
            { "open" }
            #[cfg(target_os = "windows")]
            { "explorer" }
            #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
            { "xdg-open" }
        };

        match std::process::Command::new(opener).arg(&url).spawn() {
            Ok(_) => self.status_message = Some(format!("Opened {}", url)),
            Err(e) => {
                tracing::warn!(error = %e, opener, "Failed to open URL");
                self.status_message = Some(format!("Failed to open URL: {}", e));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const LYON_CSV: &str = "id,title,tags,url,lat,lon,taken_dt\n\
        1,Fourviere,\"lyon, basilique\",https://flickr.com/1,45.7622,4.8220,2019-05-01 10:00:00\n\
        2,Presqu'ile,lyon,https://flickr.com/2,45.7640,4.8357,2019-05-03 18:30:00\n\
        3,Tour Eiffel,paris,https://flickr.com/3,48.8584,2.2945,2019-06-10 12:00:00\n";

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(csv: &str) -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photos.csv");
        fs::write(&path, csv).unwrap();

        let mut config = Config::default();
        config.csv_path = path.to_string_lossy().to_string();
        let mut app = App::new(config);
        app.load_path().unwrap();
        (app, dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_initial_state_after_load() {
        let (app, _dir) = app_with(LYON_CSV);

        assert_eq!(app.top_tags, vec!["lyon", "basilique", "paris"]);
        assert_eq!(app.selected_tag, NO_TAG_FILTER);
        assert_eq!(app.date_span, Some((date(2019, 5, 1), date(2019, 6, 10))));
        assert_eq!(app.max_points, 5000);
        assert_eq!(app.map_mode, MapMode::Hex);
        assert_eq!(app.summary().unwrap(), "Rows after filters: 3 (from 3)");
    }

    #[test]
    fn test_lyon_filter_end_to_end() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.set_tag("lyon".to_string());

        assert_eq!(app.summary().unwrap(), "Rows after filters: 2 (from 3)");
        let payload = app.payload.as_ref().unwrap();
        assert_eq!(payload.view.len(), 2);
        assert!(payload.center.unwrap().latitude < 46.0);
    }

    #[test]
    fn test_tag_cycling_wraps_through_no_filter() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.focus = Focus::Tag;

        app.handle_key(key(KeyCode::Down)).unwrap();
        assert_eq!(app.selected_tag, "lyon");
        app.handle_key(key(KeyCode::Up)).unwrap();
        app.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(app.selected_tag, "paris");
        assert_eq!(app.outcome.as_ref().unwrap().filtered(), 1);
    }

    #[test]
    fn test_tag_picker_applies_choice() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.handle_key(key(KeyCode::Char('t'))).unwrap();
        assert_eq!(app.mode, AppMode::TagPicking);

        for c in "par".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.selected_tag, "paris");
    }

    #[test]
    fn test_date_shift_and_clear() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.focus = Focus::DateRange;
        app.date_bound = DateBound::End;

        // End moves back to 2019-05-02: only the first photo remains
        for _ in 0..39 {
            app.handle_key(key(KeyCode::Char('['))).unwrap();
        }
        assert_eq!(app.date_range.unwrap().end, date(2019, 5, 2));
        assert_eq!(app.outcome.as_ref().unwrap().filtered(), 1);

        app.handle_key(key(KeyCode::Char('x'))).unwrap();
        assert!(app.date_range.is_none());
        assert_eq!(app.outcome.as_ref().unwrap().filtered(), 3);

        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert_eq!(app.date_range.unwrap().start, date(2019, 5, 1));
    }

    #[test]
    fn test_start_cannot_pass_end() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.date_bound = DateBound::Start;
        app.shift_date(365);

        let range = app.date_range.unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.end, date(2019, 6, 10));
    }

    #[test]
    fn test_default_span_excludes_undated_rows() {
        let (app, _dir) = app_with(
            "id,title,tags,url,lat,lon,taken_dt\n1,a,x,u,45.0,4.0,2020-01-01\n2,b,x,u,45.0,4.0,\n",
        );
        assert_eq!(app.outcome.as_ref().unwrap().filtered(), 1);
    }

    #[test]
    fn test_focus_skips_date_without_column() {
        let (mut app, _dir) = app_with("id,title,tags,url,lat,lon\n1,a,x,u,45.0,4.0\n");
        assert!(!app.has_date_control());

        app.focus = Focus::Tag;
        app.focus_next();
        assert_eq!(app.focus, Focus::MaxPoints);
        app.focus_next();
        assert_eq!(app.focus, Focus::MapMode);
        app.focus_next();
        assert_eq!(app.focus, Focus::Path);
    }

    #[test]
    fn test_mode_toggle_and_preview_focus() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.handle_key(key(KeyCode::Char('m'))).unwrap();
        assert_eq!(app.map_mode, MapMode::Points);
        assert!(app.bins.is_empty());

        app.focus = Focus::MapMode;
        app.focus_next();
        assert_eq!(app.focus, Focus::Preview);

        app.handle_key(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.selected_point, Some(1));

        app.handle_key(key(KeyCode::Char('m'))).unwrap();
        assert_eq!(app.map_mode, MapMode::Hex);
        assert_eq!(app.focus, Focus::MapMode);
        assert!(!app.bins.is_empty());
    }

    #[test]
    fn test_max_points_control() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.handle_key(key(KeyCode::Char('+'))).unwrap();
        assert_eq!(app.max_points, 5500);

        app.set_max_points(0);
        assert_eq!(app.max_points, 500);
        app.handle_key(key(KeyCode::Char('-'))).unwrap();
        assert_eq!(app.max_points, 500);
    }

    #[test]
    fn test_select_nearest_point() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.toggle_map_mode();

        app.select_nearest(48.85, 2.30);
        assert_eq!(app.selected_record().unwrap().id, "3");
        assert_eq!(app.focus, Focus::Preview);

        let point = app.selected_map_point().unwrap();
        assert!(point.tooltip_html().contains("Tour Eiffel"));
    }

    #[test]
    fn test_selection_follows_photo_across_filters() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.toggle_map_mode();

        app.select_nearest(48.9, 2.4);
        assert_eq!(app.selected_record().unwrap().id, "3");

        // Still in the sample at a different position
        app.set_tag("paris".to_string());
        assert_eq!(app.selected_point, Some(0));
        assert_eq!(app.selected_record().unwrap().id, "3");

        // Filtered out: fall back to the first row
        app.set_tag("lyon".to_string());
        assert_eq!(app.selected_record().unwrap().id, "1");
    }

    #[test]
    fn test_rejected_tag_clears_map() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.set_tag("a".repeat(2_000_000));

        assert!(app.payload.is_none());
        assert!(app.selected_point.is_none());
        assert!(app.status_message.as_ref().unwrap().starts_with("Tag filter error"));
    }

    #[test]
    fn test_path_typing_does_not_trigger_shortcuts() {
        let (mut app, _dir) = app_with(LYON_CSV);
        app.focus = Focus::Path;
        app.handle_key(key(KeyCode::Char('q'))).unwrap();

        assert!(!app.should_quit);
        assert!(app.path_input.value().ends_with("photos.csvq"));
    }

    #[test]
    fn test_load_error_clears_map() {
        let (mut app, dir) = app_with(LYON_CSV);
        let missing = dir.path().join("missing.csv");
        app.path_input = TextInput::new(&missing.to_string_lossy());

        assert!(app.load_path().is_err());
        assert!(app.dataset.is_none());
        assert!(app.payload.is_none());
        assert!(app.load_error.is_some());
        assert!(app.status_message.as_ref().unwrap().starts_with("Load error"));
    }

    #[test]
    fn test_reload_hits_cache() {
        let (mut app, _dir) = app_with(LYON_CSV);
        let first = Arc::clone(app.dataset.as_ref().unwrap());

        app.load_path().unwrap();
        assert!(Arc::ptr_eq(&first, app.dataset.as_ref().unwrap()));
        assert_eq!(app.cache.len(), 1);
    }
}
