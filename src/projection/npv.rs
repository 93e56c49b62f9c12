//! Present value of projected cash flows

/// Net present value of a yearly series whose first element falls at year 1
///
/// `rate` is the annual discount rate as a decimal (0.10 for 10%).
pub fn npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_year_discounting() {
        assert!((npv(0.10, &[110.0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_year_series() {
        // 137.5 / 1.1 + 121 / 1.21
        let pv = npv(0.10, &[137.5, 121.0]);
        assert!((pv - 225.0).abs() < 1e-9, "got {}", pv);
    }

    #[test]
    fn test_zero_rate_is_plain_sum() {
        assert!((npv(0.0, &[1.0, 2.0, 3.0]) - 6.0).abs() < 1e-12);
        assert_eq!(npv(0.10, &[]), 0.0);
    }
}
