//! Flickmap: a terminal dashboard over geotagged Flickr photo exports.
//!
//! A CSV of photos is loaded once per path, filtered by tag and taken date,
//! sampled to a bounded size and drawn as a hexagon density map or as
//! individually selectable points.

pub mod app;
pub mod config;
pub mod dataset;
pub mod export;
pub mod filter;
pub mod logging;
pub mod map;
pub mod sample;
pub mod tags;
pub mod ui;
