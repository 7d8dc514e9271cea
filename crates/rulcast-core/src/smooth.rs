//! Health-score noise smoothing.
//!
//! A centered moving average over a plain numeric sequence. The smoother has
//! no notion of units, SMR, or time — callers apply it per unit on a
//! sequence already ordered by SMR.

/// Centered moving average with the given window size.
///
/// Output has the same length and order as the input. At the edges the
/// window clamps to the available samples instead of padding with external
/// data, so the first and last points average over a shrinking neighborhood.
///
/// `window_size` is expected odd; an even value is widened to the next odd
/// so the window stays centered. `window_size <= 1` is the identity.
pub fn smooth(values: &[f64], window_size: usize) -> Vec<f64> {
    if window_size <= 1 || values.len() <= 1 {
        return values.to_vec();
    }
    let half = window_size / 2;

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(values.len() - 1);
            let window = &values[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}
