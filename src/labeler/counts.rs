use crate::rules::Bounds;

/// Check `count` against every specified bound.
///
/// Only positive thresholds are meaningful; zero or negative values are
/// treated as unset. With no bounds set every count matches.
pub fn within_bounds(count: u64, bounds: &Bounds) -> bool {
    let gt = threshold(bounds.greater_than).map_or(true, |t| count > t);
    let gte = threshold(bounds.greater_than_or_equal).map_or(true, |t| count >= t);
    let lt = threshold(bounds.less_than).map_or(true, |t| count < t);
    let lte = threshold(bounds.less_than_or_equal).map_or(true, |t| count <= t);
    gt && gte && lt && lte
}

fn threshold(bound: Option<i64>) -> Option<u64> {
    bound.and_then(|value| u64::try_from(value).ok()).filter(|&value| value > 0)
}
