//! Score helpers for the preflight report.

/// Clamp into `[0.0, 1.0]`.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

/// Sum of `weight * confidence` over the weighted components. A component
/// missing from `present` contributes nothing.
pub fn weighted_score(weights: &[(&str, f64)], present: &[(&str, f64)]) -> f64 {
    weights
        .iter()
        .map(|(name, weight)| {
            let confidence = present
                .iter()
                .find(|(p, _)| p == name)
                .map_or(0.0, |(_, c)| *c);
            weight * confidence
        })
        .sum()
}
