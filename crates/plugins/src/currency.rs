//! Decimal currency display: the host stores money as integer cents, shop
//! and menu windows show dollars with grouped thousands.

/// Formats integer cents as a dollars-and-cents string, e.g. `123456` ->
/// `"1,234.56"`. Negative amounts carry a single leading sign.
pub fn format_decimal(cents: i64) -> String {
    let dollars = (cents / 100).unsigned_abs();
    let remainder = (cents % 100).unsigned_abs();
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}{}.{remainder:02}", group_digits(dollars))
}

/// Inserts a comma every three digits from the right.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && index % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero_dollars() {
        assert_eq!(format_decimal(0), "0.00");
    }

    #[test]
    fn cents_are_always_two_digits() {
        assert_eq!(format_decimal(9), "0.09");
        assert_eq!(format_decimal(90), "0.90");
        assert_eq!(format_decimal(109), "1.09");
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(format_decimal(123_456), "1,234.56");
        assert_eq!(format_decimal(100_000_000), "1,000,000.00");
    }

    #[test]
    fn negative_amounts_keep_one_sign() {
        assert_eq!(format_decimal(-1234), "-12.34");
        assert_eq!(format_decimal(-9), "-0.09");
    }

    #[test]
    fn grouping_handles_short_and_exact_groups() {
        assert_eq!(group_digits(7), "7");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(123_456_789), "123,456,789");
    }
}
