//! Small reductions shared by the analyses. Callers reject empty input
//! themselves, so these return `None` rather than an error.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with divisor N (every bike is counted, not sampled).
pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let centre = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - centre) * (v - centre)).sum();
    Some((sum_sq / values.len() as f64).sqrt())
}

/// Median of integer samples; even lengths average the two middle values.
/// Returns `None` for empty input.
pub fn median(mut values: Vec<u32>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mid = values.len() / 2;
    let (_, upper, _) = values.select_nth_unstable(mid);
    let upper = *upper as f64;
    if values.len() % 2 == 1 {
        return Some(upper);
    }
    // After selection everything left of `mid` is <= the pivot.
    let lower = values[..mid].iter().copied().max().unwrap_or_default() as f64;
    Some((lower + upper) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_population_stddev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        assert_eq!(population_stddev(&v), Some(2.0));
        assert_eq!(population_stddev(&[3.0]), Some(0.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_stddev(&[]), None);
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(vec![9, 1, 5]), Some(5.0));
        assert_eq!(median(vec![4, 1, 3, 2]), Some(2.5));
        assert_eq!(median(vec![7]), Some(7.0));
        assert_eq!(median(vec![10, 10, 1, 10]), Some(10.0));
    }
}
