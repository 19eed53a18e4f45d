//! Hexagon aggregation of photo positions, the density behind the hex view.
//!
//! Points are projected to Web Mercator meters and binned on a pointy-top
//! hexagon grid. The grid radius is given in ground meters and scaled by the
//! Mercator stretch at a reference latitude (usually the view center), so the
//! grid only moves when the reference does.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

pub(crate) const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;
const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// One occupied hexagon.
#[derive(Debug, Clone, PartialEq)]
pub struct HexBin {
    /// Axial grid coordinates.
    pub q: i64,
    pub r: i64,
    /// Hexagon center.
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    /// `count` mapped linearly onto the elevation range, `max count -> hi`.
    pub elevation: f64,
}

pub(crate) fn mercator_x(lon_deg: f64) -> f64 {
    EARTH_RADIUS_M * lon_deg.to_radians()
}

pub(crate) fn mercator_y(lat_deg: f64) -> f64 {
    let lat = lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln()
}

pub(crate) fn inverse_mercator_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS_M).to_degrees()
}

pub(crate) fn inverse_mercator_lat(y: f64) -> f64 {
    (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees()
}

/// Round fractional axial coordinates to the containing hexagon.
fn axial_round(q: f64, r: f64) -> (i64, i64) {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

/// Aggregate `(lat, lon)` points into hexagons of `radius_m` ground meters
/// measured at `reference_lat`.
///
/// Bins come back densest first; ties are ordered by grid position so the
/// output is stable for identical input.
pub fn hex_bins(
    points: &[(f64, f64)],
    radius_m: f64,
    reference_lat: f64,
    elevation_range: [f64; 2],
) -> Vec<HexBin> {
    if points.is_empty() || radius_m <= 0.0 {
        return Vec::new();
    }

    let size = radius_m / reference_lat.to_radians().cos().max(1e-6);

    let mut counts: HashMap<(i64, i64), usize> = HashMap::new();
    for &(lat, lon) in points {
        let x = mercator_x(lon);
        let y = mercator_y(lat);
        let q = (SQRT_3 / 3.0 * x - y / 3.0) / size;
        let r = (2.0 / 3.0 * y) / size;
        *counts.entry(axial_round(q, r)).or_insert(0) += 1;
    }

    let max = counts.values().copied().max().unwrap_or(1) as f64;
    let [lo, hi] = elevation_range;

    let mut bins: Vec<HexBin> = counts
        .into_iter()
        .map(|((q, r), count)| {
            let x = size * SQRT_3 * (q as f64 + r as f64 / 2.0);
            let y = size * 1.5 * r as f64;
            HexBin {
                q,
                r,
                latitude: inverse_mercator_lat(y),
                longitude: inverse_mercator_lon(x),
                count,
                elevation: lo + (hi - lo) * count as f64 / max,
            }
        })
        .collect();

    bins.sort_by(|a, b| b.count.cmp(&a.count).then(a.q.cmp(&b.q)).then(a.r.cmp(&b.r)));
    bins
}
