use crate::core::Flag;

/// 成本旗標：計畫成本嚴格大於門檻時為 `H`
pub fn cost_flag(total_cost: f64, threshold: f64) -> Flag {
    if total_cost > threshold {
        Flag::High
    } else {
        Flag::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_above_threshold_is_high() {
        assert_eq!(cost_flag(50_000.0, 10_000.0), Flag::High);
        assert_eq!(cost_flag(10_000.01, 10_000.0), Flag::High);
    }

    #[test]
    fn test_boundary_is_low() {
        assert_eq!(cost_flag(10_000.0, 10_000.0), Flag::Low);
    }

    #[test]
    fn test_below_threshold_and_missing_cost_are_low() {
        assert_eq!(cost_flag(9_999.0, 10_000.0), Flag::Low);
        assert_eq!(cost_flag(0.0, 10_000.0), Flag::Low);
        assert_eq!(cost_flag(f64::NAN, 10_000.0), Flag::Low);
    }

    #[test]
    fn test_matches_strict_comparison_across_grid() {
        let values = [0.0, 1.0, 999.5, 1_000.0, 1_000.5, 1e9];
        for &cost in &values {
            for &threshold in &values[1..] {
                let expected = if cost > threshold { Flag::High } else { Flag::Low };
                assert_eq!(cost_flag(cost, threshold), expected, "{cost} vs {threshold}");
            }
        }
    }
}
