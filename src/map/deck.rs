//! deck.gl JSON description of a [`MapPayload`], the same shape pydeck
//! produces, so exported maps open in any deck.gl JSON renderer.

use serde::Serialize;

use super::{LayerSpec, MapPayload, MapPoint};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    #[serde(rename = "@@type")]
    pub layer_type: &'static str,
    pub id: &'static str,
    pub data: Vec<MapPoint>,
    pub get_position: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extruded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    pub pickable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipStyle {
    pub background_color: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Tooltip {
    pub html: &'static str,
    pub style: TooltipStyle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSpec {
    /// `None` when no record in the view has coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_view_state: Option<ViewState>,
    pub layers: Vec<Layer>,
    pub map_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Tooltip>,
}

impl DeckSpec {
    pub fn from_payload(payload: &MapPayload) -> Self {
        let initial_view_state = payload.center.map(|c| ViewState {
            latitude: c.latitude,
            longitude: c.longitude,
            zoom: payload.zoom,
            pitch: payload.pitch,
            bearing: 0.0,
        });

        let data = payload.points();
        let (layer, tooltip) = match payload.layer {
            LayerSpec::Hexagon {
                radius,
                elevation_scale,
                elevation_range,
                extruded,
                pickable,
            } => (
                Layer {
                    layer_type: "HexagonLayer",
                    id: "photo-density",
                    data,
                    get_position: "@@=[lon, lat]",
                    radius: Some(radius),
                    get_radius: None,
                    elevation_scale: Some(elevation_scale),
                    elevation_range: Some(elevation_range),
                    extruded: Some(extruded),
                    opacity: None,
                    pickable,
                },
                None,
            ),
            LayerSpec::Scatterplot {
                radius,
                opacity,
                pickable,
                tooltip,
            } => (
                Layer {
                    layer_type: "ScatterplotLayer",
                    id: "photo-points",
                    data,
                    get_position: "@@=[lon, lat]",
                    radius: None,
                    get_radius: Some(radius),
                    elevation_scale: None,
                    elevation_range: None,
                    extruded: None,
                    opacity: Some(opacity),
                    pickable,
                },
                Some(Tooltip {
                    html: tooltip,
                    style: TooltipStyle {
                        background_color: "white",
                        color: "black",
                    },
                }),
            ),
        };

        Self {
            initial_view_state,
            layers: vec![layer],
            map_style: None,
            tooltip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::dataset::load_from_reader;
    use crate::dataset::RecordView;
    use crate::map::MapMode;
    use std::sync::Arc;

    fn view() -> RecordView {
        let dataset = load_from_reader(
            "id,title,tags,url,lat,lon\n1,Fourviere,lyon,https://flickr.com/1,45.76,4.82\n".as_bytes(),
            "deck.csv",
        )
        .unwrap();
        RecordView::full(Arc::new(dataset))
    }

    #[test]
    fn test_hex_spec_shape() {
        let view = view();
        let payload = MapPayload::build(MapMode::Hex, &view, &view, &MapConfig::default());
        let json = serde_json::to_value(DeckSpec::from_payload(&payload)).unwrap();

        assert_eq!(json["initialViewState"]["zoom"], 11.0);
        assert_eq!(json["initialViewState"]["pitch"], 40.0);
        let layer = &json["layers"][0];
        assert_eq!(layer["@@type"], "HexagonLayer");
        assert_eq!(layer["radius"], 80.0);
        assert_eq!(layer["elevationRange"][1], 1500.0);
        assert_eq!(layer["extruded"], true);
        assert!(layer.get("opacity").is_none());
        assert!(json.get("tooltip").is_none());
        assert!(json["mapStyle"].is_null());
    }

    #[test]
    fn test_points_spec_has_tooltip_and_rows() {
        let view = view();
        let payload = MapPayload::build(MapMode::Points, &view, &view, &MapConfig::default());
        let json = serde_json::to_value(DeckSpec::from_payload(&payload)).unwrap();

        let layer = &json["layers"][0];
        assert_eq!(layer["@@type"], "ScatterplotLayer");
        assert_eq!(layer["getRadius"], 12.0);
        assert_eq!(layer["opacity"], 0.6);
        assert_eq!(layer["data"][0]["title"], "Fourviere");
        assert!(json["tooltip"]["html"].as_str().unwrap().contains("{url}"));
    }

    #[test]
    fn test_unmapped_view_omits_view_state() {
        let dataset = load_from_reader(
            "id,title,tags,url,lat,lon\n1,Nowhere,lyon,https://flickr.com/1,,\n".as_bytes(),
            "deck.csv",
        )
        .unwrap();
        let view = RecordView::full(Arc::new(dataset));
        let payload = MapPayload::build(MapMode::Points, &view, &view, &MapConfig::default());
        let json = serde_json::to_value(DeckSpec::from_payload(&payload)).unwrap();

        assert!(json.get("initialViewState").is_none());
        assert_eq!(json["layers"][0]["data"].as_array().unwrap().len(), 0);
    }
}
