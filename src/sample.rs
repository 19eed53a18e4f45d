//! Bounded, reproducible subsampling for the point view.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::RecordView;

pub const MIN_POINTS: usize = 500;
pub const MAX_POINTS: usize = 20_000;
pub const DEFAULT_MAX_POINTS: usize = 5_000;
pub const POINTS_STEP: usize = 500;

/// Seed used for every draw, so the same filtered view always yields the
/// same points.
pub const SAMPLE_SEED: u64 = 0;

/// Return `view` unchanged when it has at most `max` rows, otherwise exactly
/// `max` distinct rows drawn uniformly with a fixed seed.
///
/// Sampled rows keep their original order.
pub fn sample_view(view: &RecordView, max: usize, seed: u64) -> RecordView {
    if view.len() <= max {
        return view.clone();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, view.len(), max).into_vec();
    picked.sort_unstable();

    let rows = picked.into_iter().map(|i| view.rows()[i]).collect();
    tracing::debug!(from = view.len(), to = max, seed, "Sampled view");
    RecordView::from_rows(view.dataset().clone(), rows)
}

/// Snap a requested cap onto the control's grid: within
/// [`MIN_POINTS`, `MAX_POINTS`] and a multiple of [`POINTS_STEP`].
pub fn clamp_max_points(requested: usize) -> usize {
    let clamped = requested.clamp(MIN_POINTS, MAX_POINTS);
    let snapped = (clamped + POINTS_STEP / 2) / POINTS_STEP * POINTS_STEP;
    snapped.clamp(MIN_POINTS, MAX_POINTS)
}

pub fn step_up(current: usize) -> usize {
    clamp_max_points(current.saturating_add(POINTS_STEP))
}

pub fn step_down(current: usize) -> usize {
    clamp_max_points(current.saturating_sub(POINTS_STEP))
}
