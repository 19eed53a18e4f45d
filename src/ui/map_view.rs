//! Terminal map: the payload drawn on a braille canvas in Web Mercator
//! coordinates, centered on the payload center at the payload zoom.

use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Paragraph,
    },
};

use crate::app::App;
use crate::filter::format_count;
use crate::map::hexbin::{
    inverse_mercator_lat, inverse_mercator_lon, mercator_x, mercator_y, EARTH_RADIUS_M,
};
use crate::map::{HexBin, MapMode, MapPayload, ViewCenter};

/// Width in pixels of the web viewport the zoom level is interpreted against.
const VIEWPORT_PX: f64 = 1024.0;

/// Default deck.gl hexagon color range, sparse to dense.
const HEX_COLORS: [(u8, u8, u8); 6] = [
    (1, 152, 189),
    (73, 227, 206),
    (216, 254, 181),
    (254, 237, 177),
    (254, 173, 84),
    (209, 55, 78),
];

/// Visible extent of the map in Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl MapBounds {
    /// Extent around `center` at web-map `zoom`, widened on one axis so the
    /// terminal cells (about twice as tall as wide) keep the map unstretched.
    pub fn fit(center: ViewCenter, zoom: f64, cols: u16, rows: u16) -> Self {
        let meters_per_px = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M / (256.0 * 2f64.powf(zoom));
        let mut half_w = VIEWPORT_PX / 2.0 * meters_per_px;
        let mut half_h = half_w;

        let cols = cols.max(1) as f64;
        let rows = rows.max(1) as f64;
        let aspect = (rows * 2.0) / cols;
        if aspect < 1.0 {
            half_w = half_h / aspect;
        } else {
            half_h = half_w * aspect;
        }

        let cx = mercator_x(center.longitude);
        let cy = mercator_y(center.latitude);
        Self {
            x: [cx - half_w, cx + half_w],
            y: [cy - half_h, cy + half_h],
        }
    }

    /// Geographic `(lat, lon)` under a terminal cell of the drawn `area`.
    pub fn cell_to_geo(&self, area: Rect, column: u16, row: u16) -> (f64, f64) {
        let fx = (column.saturating_sub(area.x) as f64 + 0.5) / area.width.max(1) as f64;
        let fy = (row.saturating_sub(area.y) as f64 + 0.5) / area.height.max(1) as f64;
        let x = self.x[0] + fx * (self.x[1] - self.x[0]);
        let y = self.y[1] - fy * (self.y[1] - self.y[0]);
        (inverse_mercator_lat(y), inverse_mercator_lon(x))
    }
}

/// Color bucket of a bin, quantized linearly on count.
fn hex_bucket(bin: &HexBin, max_count: usize) -> usize {
    let fraction = bin.count as f64 / max_count.max(1) as f64;
    ((fraction * HEX_COLORS.len() as f64).ceil() as usize).clamp(1, HEX_COLORS.len()) - 1
}

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match (&app.payload, app.map_mode) {
        (Some(_), MapMode::Hex) => format!(" Map: {} | {} hexagons ", app.map_mode.label(), format_count(app.bins.len())),
        (Some(p), MapMode::Points) => format!(" Map: {} | {} points ", app.map_mode.label(), format_count(p.view.len())),
        (None, _) => " Map ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = block.inner(area);

    let center = app.payload.as_ref().and_then(|p| p.center);
    let Some(center) = center else {
        app.map_area = None;
        app.map_bounds = None;
        let message = if app.dataset.is_some() { "No rows match the filters" } else { "No dataset loaded" };
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    };

    let Some(ref payload) = app.payload else {
        return;
    };
    let bounds = MapBounds::fit(center, payload.zoom, inner.width, inner.height);
    match payload.mode {
        MapMode::Hex => frame.render_widget(hex_canvas(&app.bins, bounds).block(block), area),
        MapMode::Points => {
            frame.render_widget(points_canvas(payload, app.selected_point, bounds).block(block), area)
        }
    }

    app.map_area = Some(inner);
    app.map_bounds = Some(bounds);
}

fn hex_canvas(bins: &[HexBin], bounds: MapBounds) -> Canvas<'_, impl Fn(&mut ratatui::widgets::canvas::Context) + '_> {
    let max_count = bins.first().map(|b| b.count).unwrap_or(1);

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(move |ctx| {
            // Sparse bins first so dense ones stay on top
            for idx in 0..HEX_COLORS.len() {
                let coords: Vec<(f64, f64)> = bins
                    .iter()
                    .filter(|b| hex_bucket(b, max_count) == idx)
                    .map(|b| (mercator_x(b.longitude), mercator_y(b.latitude)))
                    .collect();
                if !coords.is_empty() {
                    ctx.draw(&Points { coords: &coords, color: bucket_color(idx) });
                }
            }
        })
}

fn bucket_color(idx: usize) -> Color {
    let (r, g, b) = HEX_COLORS[idx];
    Color::Rgb(r, g, b)
}

fn points_canvas(
    payload: &MapPayload,
    selected: Option<usize>,
    bounds: MapBounds,
) -> Canvas<'_, impl Fn(&mut ratatui::widgets::canvas::Context) + '_> {
    let coords: Vec<(f64, f64)> = payload
        .view
        .records()
        .filter_map(|r| r.position())
        .map(|(lat, lon)| (mercator_x(lon), mercator_y(lat)))
        .collect();
    let highlight = selected
        .and_then(|idx| payload.view.get(idx))
        .and_then(|r| r.position())
        .map(|(lat, lon)| (mercator_x(lon), mercator_y(lat)));

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(move |ctx| {
            ctx.draw(&Points { coords: &coords, color: Color::Rgb(255, 140, 0) });
            if let Some((x, y)) = highlight {
                ctx.layer();
                ctx.print(x, y, Span::styled("◉", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyon() -> ViewCenter {
        ViewCenter { latitude: 45.764, longitude: 4.8357 }
    }

    #[test]
    fn test_center_cell_maps_back_to_center() {
        let area = Rect::new(10, 5, 81, 41);
        let bounds = MapBounds::fit(lyon(), 11.0, area.width, area.height);

        let (lat, lon) = bounds.cell_to_geo(area, area.x + 40, area.y + 20);
        assert!((lat - 45.764).abs() < 0.01);
        assert!((lon - 4.8357).abs() < 0.01);
    }

    #[test]
    fn test_higher_zoom_shows_less() {
        let wide = MapBounds::fit(lyon(), 11.0, 80, 40);
        let close = MapBounds::fit(lyon(), 12.0, 80, 40);

        let wide_w = wide.x[1] - wide.x[0];
        let close_w = close.x[1] - close.x[0];
        assert!((wide_w / close_w - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_keeps_cells_square() {
        // 100 columns by 25 rows: meters per row is twice meters per column
        let bounds = MapBounds::fit(lyon(), 11.0, 100, 25);
        let per_col = (bounds.x[1] - bounds.x[0]) / 100.0;
        let per_row = (bounds.y[1] - bounds.y[0]) / 25.0;
        assert!((per_row / per_col - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_hex_color_buckets() {
        let bin = |count| HexBin { q: 0, r: 0, latitude: 0.0, longitude: 0.0, count, elevation: 0.0 };
        assert_eq!(hex_bucket(&bin(60), 60), 5);
        assert_eq!(hex_bucket(&bin(1), 60), 0);
        assert_eq!(hex_bucket(&bin(30), 60), 2);
    }
}
