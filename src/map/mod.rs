//! Map payloads handed to the renderers.
//!
//! The pipeline ends here: given the filtered and sampled views, build what
//! a map renderer needs for the selected mode, namely the rows to draw, the
//! view center and the layer settings. The terminal canvas and the deck.gl
//! export both consume a [`MapPayload`].

pub mod deck;
pub mod hexbin;

use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::dataset::{PhotoRecord, RecordView};

pub use hexbin::{hex_bins, HexBin};

/// Tooltip shown for a picked point.
pub const TOOLTIP_HTML: &str =
    "<b>{title}</b><br/>{tags}<br/>{taken_dt}<br/><a href='{url}' target='_blank'>Open on Flickr</a>";

/// The two map presentations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    /// Density of the full filtered view aggregated into hexagons.
    #[default]
    Hex,
    /// Individually selectable points from the sampled view.
    Points,
}

impl MapMode {
    pub fn label(&self) -> &'static str {
        match self {
            MapMode::Hex => "Hex (fast overview)",
            MapMode::Points => "Points (click + URLs)",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            MapMode::Hex => MapMode::Points,
            MapMode::Points => MapMode::Hex,
        }
    }
}

impl std::str::FromStr for MapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hex" => Ok(MapMode::Hex),
            "points" | "point" => Ok(MapMode::Points),
            other => Err(format!("unknown map mode `{}` (expected hex or points)", other)),
        }
    }
}

/// Where the map view is centered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewCenter {
    pub latitude: f64,
    pub longitude: f64,
}

/// Median of the values, `None` when empty. Even counts average the two
/// middle values.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Median latitude and median longitude of a view, each taken over the
/// records that have that coordinate.
pub fn view_center(view: &RecordView) -> Option<ViewCenter> {
    let mut lats: Vec<f64> = view.records().filter_map(|r| r.lat).collect();
    let mut lons: Vec<f64> = view.records().filter_map(|r| r.lon).collect();
    Some(ViewCenter {
        latitude: median(&mut lats)?,
        longitude: median(&mut lons)?,
    })
}

/// One drawable row: the fields a tooltip or an export needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub id: String,
    pub title: String,
    pub tags: String,
    pub taken_dt: String,
    pub url: String,
    pub lat: f64,
    pub lon: f64,
}

impl MapPoint {
    /// `None` for records without usable coordinates.
    pub fn from_record(record: &PhotoRecord) -> Option<Self> {
        let (lat, lon) = record.position()?;
        Some(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            tags: record.tags.clone(),
            taken_dt: record.taken_display(),
            url: record.url.clone(),
            lat,
            lon,
        })
    }

    /// [`TOOLTIP_HTML`] with this point's fields substituted, HTML-escaped.
    pub fn tooltip_html(&self) -> String {
        TOOLTIP_HTML
            .replace("{title}", &html_escape(&self.title))
            .replace("{tags}", &html_escape(&self.tags))
            .replace("{taken_dt}", &html_escape(&self.taken_dt))
            .replace("{url}", &html_escape(&self.url))
    }
}

/// Escape text for use in HTML element content or a quoted attribute.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Layer settings for each mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    Hexagon {
        radius: f64,
        elevation_scale: f64,
        elevation_range: [f64; 2],
        extruded: bool,
        pickable: bool,
    },
    Scatterplot {
        radius: f64,
        opacity: f64,
        pickable: bool,
        tooltip: &'static str,
    },
}

/// Everything a renderer needs to draw one map.
#[derive(Debug, Clone)]
pub struct MapPayload {
    pub mode: MapMode,
    /// Rows handed to the layer: the full filtered view in hex mode, the
    /// sampled view in point mode.
    pub view: RecordView,
    pub center: Option<ViewCenter>,
    pub zoom: f64,
    pub pitch: f64,
    pub layer: LayerSpec,
}

impl MapPayload {
    /// Build the payload for `mode`.
    ///
    /// Hex mode centers on the filtered view; point mode centers on the
    /// sampled view, so the two modes can center differently when sampling
    /// kicks in.
    pub fn build(mode: MapMode, filtered: &RecordView, sampled: &RecordView, config: &MapConfig) -> Self {
        match mode {
            MapMode::Hex => Self {
                mode,
                view: filtered.clone(),
                center: view_center(filtered),
                zoom: config.hex_zoom,
                pitch: config.hex_pitch,
                layer: LayerSpec::Hexagon {
                    radius: config.hex_radius,
                    elevation_scale: config.elevation_scale,
                    elevation_range: config.elevation_range,
                    extruded: true,
                    pickable: true,
                },
            },
            MapMode::Points => Self {
                mode,
                view: sampled.clone(),
                center: view_center(sampled),
                zoom: config.points_zoom,
                pitch: 0.0,
                layer: LayerSpec::Scatterplot {
                    radius: config.point_radius,
                    opacity: config.point_opacity,
                    pickable: true,
                    tooltip: TOOLTIP_HTML,
                },
            },
        }
    }

    /// Drawable rows; records without coordinates are skipped.
    pub fn points(&self) -> Vec<MapPoint> {
        self.view.records().filter_map(MapPoint::from_record).collect()
    }

    /// Hexagon bins for hex mode, empty in point mode.
    pub fn bins(&self) -> Vec<HexBin> {
        let LayerSpec::Hexagon { radius, elevation_range, .. } = self.layer else {
            return Vec::new();
        };
        let positions: Vec<(f64, f64)> = self.view.records().filter_map(|r| r.position()).collect();
        let reference_lat = self.center.map(|c| c.latitude).unwrap_or(0.0);
        hex_bins(&positions, radius, reference_lat, elevation_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, PhotoRecord};
    use crate::sample::sample_view;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn record(id: usize, lat: Option<f64>, lon: Option<f64>) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            title: format!("Photo {}", id),
            tags: "lyon".to_string(),
            url: format!("https://flickr.com/photos/{}", id),
            lat,
            lon,
            taken_dt: None,
            upload_dt: None,
        }
    }

    fn dataset(records: Vec<PhotoRecord>) -> Arc<Dataset> {
        Arc::new(Dataset {
            path: PathBuf::from("memory"),
            records,
            has_taken_dt: false,
            has_upload_dt: false,
        })
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_view_center_skips_missing_coordinates() {
        let data = dataset(vec![
            record(1, Some(45.0), Some(4.0)),
            record(2, None, None),
            record(3, Some(46.0), Some(5.0)),
            record(4, Some(47.0), Some(6.0)),
        ]);
        let center = view_center(&RecordView::full(data)).unwrap();
        assert_eq!(center, ViewCenter { latitude: 46.0, longitude: 5.0 });
    }

    #[test]
    fn test_empty_view_has_no_center() {
        assert_eq!(view_center(&RecordView::full(dataset(vec![]))), None);
    }

    #[test]
    fn test_mode_toggle_and_parse() {
        assert_eq!(MapMode::Hex.toggle(), MapMode::Points);
        assert_eq!(MapMode::Points.toggle(), MapMode::Hex);
        assert_eq!("Points".parse::<MapMode>().unwrap(), MapMode::Points);
        assert!("heatmap".parse::<MapMode>().is_err());
    }

    #[test]
    fn test_hex_uses_filtered_view_and_points_use_sample() {
        let records = (0..2000)
            .map(|i| record(i, Some(45.0 + i as f64 * 1e-4), Some(4.0)))
            .collect();
        let filtered = RecordView::full(dataset(records));
        let sampled = sample_view(&filtered, 500, 0);
        let config = MapConfig::default();

        let hex = MapPayload::build(MapMode::Hex, &filtered, &sampled, &config);
        assert_eq!(hex.view.len(), 2000);
        assert_eq!(hex.center, view_center(&filtered));
        assert_eq!(hex.zoom, 11.0);
        assert_eq!(hex.pitch, 40.0);

        let points = MapPayload::build(MapMode::Points, &filtered, &sampled, &config);
        assert_eq!(points.view.len(), 500);
        assert_eq!(points.center, view_center(&sampled));
        assert_eq!(points.zoom, 12.0);
        assert!(points.bins().is_empty());
    }

    #[test]
    fn test_points_skip_unmappable_records() {
        let data = dataset(vec![record(1, Some(45.0), Some(4.0)), record(2, Some(45.0), None)]);
        let view = RecordView::full(data);
        let payload = MapPayload::build(MapMode::Points, &view, &view, &MapConfig::default());

        let points = payload.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "1");
    }

    #[test]
    fn test_tooltip_carries_link() {
        let point = MapPoint::from_record(&record(9, Some(45.0), Some(4.0))).unwrap();
        let html = point.tooltip_html();
        assert!(html.contains("<b>Photo 9</b>"));
        assert!(html.contains("href='https://flickr.com/photos/9'"));
    }

    #[test]
    fn test_tooltip_escapes_markup() {
        let mut photo = record(4, Some(45.0), Some(4.0));
        photo.title = "<img src=x onerror=alert(1)>".to_string();
        photo.url = "https://flickr.com/4' onmouseover='x".to_string();
        let html = MapPoint::from_record(&photo).unwrap().tooltip_html();

        assert!(html.contains("<b>&lt;img src=x onerror=alert(1)&gt;</b>"));
        assert!(html.contains("href='https://flickr.com/4&#39; onmouseover=&#39;x'"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_hex_bins_count_every_mappable_record() {
        let data = dataset(vec![
            record(1, Some(45.764), Some(4.8357)),
            record(2, Some(45.764), Some(4.8357)),
            record(3, None, Some(4.0)),
        ]);
        let view = RecordView::full(data);
        let payload = MapPayload::build(MapMode::Hex, &view, &view, &MapConfig::default());

        let bins = payload.bins();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}
