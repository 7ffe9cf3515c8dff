//! Utility functions and helpers

use rust_decimal::Decimal;

use crate::shared::types::{Money, Ratio};

/// Relative change `|new - old| / old`.
///
/// Returns `None` when `old` is not positive, since the ratio is undefined,
/// or when the ratio does not fit in a `Decimal`.
pub fn relative_change(old_value: Money, new_value: Money) -> Option<Ratio> {
    if old_value <= Decimal::ZERO {
        return None;
    }
    new_value.checked_sub(old_value)?.abs().checked_div(old_value)
}

/// Format a ratio as a percentage string
pub fn format_ratio(ratio: Ratio) -> String {
    match ratio.checked_mul(Decimal::ONE_HUNDRED) {
        Some(percent) => format!("{:.2}%", percent),
        None => format!("{}x", ratio),
    }
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_relative_change() {
        assert_eq!(relative_change(dec!(100), dec!(90)), Some(dec!(0.1)));
        assert_eq!(relative_change(dec!(100), dec!(130)), Some(dec!(0.3)));
        assert_eq!(relative_change(dec!(0), dec!(10)), None);
        assert_eq!(relative_change(dec!(-5), dec!(10)), None);
        assert_eq!(relative_change(dec!(0.0001), Decimal::MAX), None);
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(dec!(0.1)), "10.00%");
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
