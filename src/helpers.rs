use std::cmp::Ordering;

/// Helper for safe float comparison with NaN handling
pub fn compare_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Calculate average from a slice of numeric values
pub fn calculate_average<T>(values: &[T]) -> f64
where
    T: Into<f64> + Copy,
{
    if values.is_empty() {
        return 0.0;
    }

    let sum: f64 = values.iter().map(|&v| v.into()).sum();
    sum / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_floats() {
        assert_eq!(compare_floats(1.0, 2.0), Ordering::Less);
        assert_eq!(compare_floats(2.0, 1.0), Ordering::Greater);
        assert_eq!(compare_floats(1.0, 1.0), Ordering::Equal);
        assert_eq!(compare_floats(f64::NAN, 1.0), Ordering::Equal);
    }

    #[test]
    fn test_calculate_average() {
        assert_eq!(calculate_average(&[1, 2, 3, 4, 5]), 3.0);
        assert_eq!(calculate_average(&[250.0, 280.0, 320.0]), 850.0 / 3.0);
        assert_eq!(calculate_average::<f64>(&[]), 0.0);
    }
}
