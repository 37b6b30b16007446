/// Cross-sectional z-score with the population standard deviation.
///
/// Operates on the complete universe for one snapshot date; results for a single instrument
/// depend on every other value, so never call this on a partial table. A zero or undefined
/// spread (fewer than two values, all values identical) maps every entry to `0.0`.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 || values.iter().all(|v| *v == values[0]) {
        return vec![0.0; n];
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let std = var.sqrt();
    if !std.is_finite() || std == 0.0 {
        return vec![0.0; n];
    }

    values.iter().map(|v| (v - mean) / std).collect()
}
