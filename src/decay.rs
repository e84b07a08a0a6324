/// Remaining activity after `elapsed_hours`, following
/// `A_t = A_0 * e^(-lambda * t)` with `lambda = ln(2) / half_life`.
///
/// Panics on a non-positive half-life or negative elapsed time; both are
/// programmer errors, not runtime conditions.
pub fn remaining_activity(initial_activity: f64, elapsed_hours: f64, half_life_hours: f64) -> f64 {
    assert!(half_life_hours > 0.0, "half-life must be greater than 0");
    assert!(elapsed_hours >= 0.0, "elapsed time cannot be negative");

    let decay_constant = std::f64::consts::LN_2 / half_life_hours;
    initial_activity * (-decay_constant * elapsed_hours).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_at_time_zero() {
        assert_eq!(remaining_activity(100.0, 0.0, 6.0), 100.0);
    }

    #[test]
    fn halves_after_one_half_life() {
        let a = remaining_activity(100.0, 6.0, 6.0);
        assert!((a - 50.0).abs() < 1e-9, "got {a}");
    }

    #[test]
    fn quarters_after_two_half_lives() {
        let a = remaining_activity(100.0, 12.0, 6.0);
        assert!((a - 25.0).abs() < 1e-9, "got {a}");
    }

    #[test]
    fn custom_half_life() {
        let a = remaining_activity(100.0, 1.0, 1.0);
        assert!((a - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_initial_activity_stays_zero() {
        assert_eq!(remaining_activity(0.0, 5.0, 6.0), 0.0);
    }

    #[test]
    fn monotone_and_never_negative() {
        let mut prev = remaining_activity(100.0, 0.0, 6.0);
        for h in 1..48 {
            let a = remaining_activity(100.0, h as f64, 6.0);
            assert!(a <= prev);
            assert!(a >= 0.0);
            prev = a;
        }
    }

    #[test]
    #[should_panic(expected = "half-life")]
    fn zero_half_life_panics() {
        remaining_activity(100.0, 5.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "elapsed")]
    fn negative_time_panics() {
        remaining_activity(100.0, -1.0, 6.0);
    }
}
