//! Photo record loading and normalization.
//!
//! A dataset is a CSV export with one geotagged photo per row. Loading
//! normalizes it once: text columns never hold missing values, timestamp
//! columns are parsed (bad values become `None`), and `long` is accepted as
//! an alias for `lon`.

pub mod cache;
pub mod timestamp;
pub mod view;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use cache::DatasetCache;
pub use timestamp::parse_timestamp;
pub use view::RecordView;

/// Columns parsed as timestamps when present.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["taken_dt", "upload_dt"];

/// Errors that make a dataset unusable. All of them are fatal for the load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: &'static str },

    #[error("{path} line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        path: String,
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// One photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoRecord {
    pub id: String,
    pub title: String,
    pub tags: String,
    pub url: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub taken_dt: Option<NaiveDateTime>,
    pub upload_dt: Option<NaiveDateTime>,
}

impl PhotoRecord {
    /// Coordinates as `(lat, lon)` when both are present and finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// `taken_dt` formatted the way the preview table and tooltips show it.
    pub fn taken_display(&self) -> String {
        self.taken_dt
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// A normalized, immutable table of photo records.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub records: Vec<PhotoRecord>,
    /// Whether the source had a `taken_dt` column at all.
    pub has_taken_dt: bool,
    pub has_upload_dt: bool,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest `taken_dt` dates, if any record has one.
    pub fn taken_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        if !self.has_taken_dt {
            return None;
        }

        let mut dates = self.records.iter().filter_map(|r| r.taken_dt);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(min, max), dt| (min.min(dt), max.max(dt)));
        Some((min.date(), max.date()))
    }
}

/// Column positions resolved from the header row.
struct Columns {
    id: usize,
    title: usize,
    tags: usize,
    url: usize,
    lat: usize,
    lon: usize,
    taken_dt: Option<usize>,
    upload_dt: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &str) -> Result<Self, LoadError> {
        let names: Vec<&str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if i == 0 {
                    h.trim_start_matches('\u{feff}')
                } else {
                    h
                }
            })
            .collect();

        let find = |name: &str| names.iter().position(|h| *h == name);
        let require = |name: &'static str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_string(),
                column: name,
            })
        };

        // `long` is only used when there is no proper `lon` column
        let lon = match find("lon").or_else(|| find("long")) {
            Some(idx) => idx,
            None => {
                return Err(LoadError::MissingColumn {
                    path: path.to_string(),
                    column: "lon",
                })
            }
        };

        Ok(Self {
            id: require("id")?,
            title: require("title")?,
            tags: require("tags")?,
            url: require("url")?,
            lat: require("lat")?,
            lon,
            taken_dt: find(TIMESTAMP_COLUMNS[0]),
            upload_dt: find(TIMESTAMP_COLUMNS[1]),
        })
    }
}

/// Load and normalize a dataset from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let mut dataset = load_from_reader(file, &display)?;
    dataset.path = path.to_path_buf();
    Ok(dataset)
}

/// Load and normalize a dataset from any CSV reader. `source` names the
/// input in errors and logs.
pub fn load_from_reader<R: Read>(reader: R, source: &str) -> Result<Dataset, LoadError> {
    let csv_error = |e: csv::Error| LoadError::Csv {
        path: source.to_string(),
        source: e,
    };

    // Short rows are padded with missing cells; long rows are rejected
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = Columns::resolve(&headers, source)?;

    let mut records = Vec::new();
    let mut bad_timestamps = 0usize;

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if row.len() > headers.len() {
            return Err(LoadError::TooManyFields {
                path: source.to_string(),
                line: row.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: row.len(),
            });
        }
        let text = |idx: usize| row.get(idx).unwrap_or("").to_string();
        let coordinate = |idx: usize| {
            row.get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let mut timestamp = |idx: Option<usize>| {
            let raw = idx.and_then(|i| row.get(i)).unwrap_or("");
            let parsed = parse_timestamp(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                bad_timestamps += 1;
            }
            parsed
        };

        let taken_dt = timestamp(columns.taken_dt);
        let upload_dt = timestamp(columns.upload_dt);

        records.push(PhotoRecord {
            id: text(columns.id),
            title: text(columns.title),
            tags: text(columns.tags),
            url: text(columns.url),
            lat: coordinate(columns.lat),
            lon: coordinate(columns.lon),
            taken_dt,
            upload_dt,
        });
    }

    if bad_timestamps > 0 {
        tracing::warn!(source = %source, count = bad_timestamps, "Unparseable timestamps set to null");
    }
    tracing::info!(source = %source, rows = records.len(), "Dataset loaded");

    Ok(Dataset {
        path: PathBuf::from(source),
        records,
        has_taken_dt: columns.taken_dt.is_some(),
        has_upload_dt: columns.upload_dt.is_some(),
    })
}
