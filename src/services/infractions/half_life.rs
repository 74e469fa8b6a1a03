use chrono::Duration;

/// Exponentially decayed weight after `age`.
///
/// A half-life of zero (or anything not positive) disables decay. Negative
/// ages are treated as zero so a clock skew never inflates a weight.
pub fn decay(age: Duration, half_life_days: f64, weight: f64) -> f64 {
    if half_life_days.is_nan() || half_life_days <= 0.0 {
        return weight;
    }

    let age_hours = age.num_milliseconds().max(0) as f64 / 3_600_000.0;
    weight * 0.5_f64.powf(age_hours / (half_life_days * 24.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_zero_half_life_is_identity() {
        assert_eq!(decay(Duration::days(365), 0.0, 3.5), 3.5);
    }

    #[test]
    fn test_one_half_life_halves() {
        assert!((decay(Duration::hours(48), 2.0, 4.0) - 2.0).abs() < EPSILON);
        assert!((decay(Duration::hours(36), 1.5, 0.7) - 0.35).abs() < EPSILON);
    }

    #[test]
    fn test_two_half_lives_quarter() {
        assert!((decay(Duration::hours(96), 2.0, 4.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_monotone_in_age() {
        let mut previous = f64::MAX;
        for hours in 0..500 {
            let value = decay(Duration::hours(hours), 3.0, 2.5);
            assert!(value <= previous);
            previous = value;
        }
    }

    #[test]
    fn test_negative_age_is_clamped() {
        assert_eq!(decay(Duration::hours(-5), 2.0, 1.0), 1.0);
    }
}
