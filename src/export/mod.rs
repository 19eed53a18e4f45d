use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::map::deck::DeckSpec;
use crate::map::{MapPayload, MapPoint};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Html];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
            ExportFormat::Html => "HTML",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format `{}` (expected json, csv or html)", other)),
        }
    }
}

/// Write the map payload to a file. Returns the number of rows written.
pub fn export_payload(payload: &MapPayload, output_path: &Path, format: ExportFormat) -> Result<usize> {
    let spec = DeckSpec::from_payload(payload);
    let count = spec.layers.iter().map(|l| l.data.len()).sum();

    match format {
        ExportFormat::Json => export_json(&spec, output_path)?,
        ExportFormat::Csv => export_csv(&payload.points(), output_path)?,
        ExportFormat::Html => export_html(&spec, output_path)?,
    }

    tracing::info!(path = %output_path.display(), format = format.name(), rows = count, "Map exported");
    Ok(count)
}

fn export_json(spec: &DeckSpec, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(spec)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv(points: &[MapPoint], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    // Header comes from the MapPoint field names
    for point in points {
        wtr.serialize(point)?;
    }

    if points.is_empty() {
        wtr.write_record(["id", "title", "tags", "taken_dt", "url", "lat", "lon"])?;
    }

    wtr.flush()?;
    Ok(())
}

fn export_html(spec: &DeckSpec, output_path: &Path) -> Result<()> {
    // "</" inside a <script> block would end it early
    let json = serde_json::to_string(spec)?.replace("</", "<\\/");

    let mut html = String::new();
    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Flickmap</title>
    <script src="https://unpkg.com/deck.gl@^9.0.0/dist.min.js"></script>
    <script src="https://unpkg.com/@deck.gl/json@^9.0.0/dist.min.js"></script>
    <style>
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #1a1a1a;
        }
        #map {
            position: absolute;
            width: 100vw;
            height: 100vh;
        }
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
"#,
    );

    html.push_str(&format!("        const spec = {};\n", json));

    html.push_str(
        r#"        const converter = new deck.JSONConverter({
            configuration: new deck.JSONConfiguration({ classes: deck })
        });
        const props = converter.convert(spec);
        if (!props.initialViewState) {
            props.initialViewState = { latitude: 0, longitude: 0, zoom: 1 };
        }
        const escapeHtml = (value) => String(value ?? '').replace(/[&<>"']/g, (c) => ({
            '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
        })[c]);
        const template = spec.tooltip;
        new deck.DeckGL({
            ...props,
            container: 'map',
            controller: true,
            getTooltip: template
                ? ({ object }) => object && {
                    html: template.html.replace(/\{(\w+)\}/g, (_, key) => escapeHtml(object[key])),
                    style: template.style
                }
                : null
        });
    </script>
</body>
</html>
"#,
    );

    let mut file = File::create(output_path)?;
    file.write_all(html.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::dataset::{load_from_reader, RecordView};
    use crate::map::MapMode;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn payload(mode: MapMode) -> MapPayload {
        let dataset = load_from_reader(
            "id,title,tags,url,lat,lon,taken_dt\n\
             1,Fourviere,\"lyon, basilique\",https://flickr.com/1,45.762,4.822,2019-05-01 10:00:00\n\
             2,</script>,lyon,https://flickr.com/2,45.767,4.834,\n\
             3,No coords,lyon,https://flickr.com/3,,,\n"
                .as_bytes(),
            "export.csv",
        )
        .unwrap();
        let view = RecordView::full(Arc::new(dataset));
        MapPayload::build(mode, &view, &view, &MapConfig::default())
    }

    #[test]
    fn test_export_json_counts_mappable_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");

        let count = export_payload(&payload(MapMode::Hex), &path, ExportFormat::Json).unwrap();
        assert_eq!(count, 2);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["layers"][0]["@@type"], "HexagonLayer");
        assert_eq!(json["layers"][0]["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_export_csv_has_preview_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.csv");

        export_payload(&payload(MapMode::Points), &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "id,title,tags,taken_dt,url,lat,lon");
        assert!(lines.next().unwrap().starts_with("1,Fourviere,\"lyon, basilique\",2019-05-01 10:00:00,"));
    }

    #[test]
    fn test_export_html_escapes_script_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.html");

        export_payload(&payload(MapMode::Points), &path, ExportFormat::Html).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("ScatterplotLayer"));
        assert!(html.contains("<\\/script>"));
        assert_eq!(html.matches("</script>").count(), 3);
    }

    #[test]
    fn test_export_html_tooltip_escapes_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.html");

        export_payload(&payload(MapMode::Points), &path, ExportFormat::Html).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("(_, key) => escapeHtml(object[key])"));
        assert!(html.contains("'<': '&lt;'"));
    }

    #[test]
    fn test_format_parse_and_extension() {
        assert_eq!("HTML".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }
}
