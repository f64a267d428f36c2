//! Display formatting for cost figures.

/// Format a number with thousands separators and a fixed number of decimals.
///
/// ```
/// use cogm_calculator::format::format_number;
///
/// assert_eq!(format_number(1234.5, 2), "1,234.50");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.decimals$}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + formatted.len() / 3 + 1);
    // "-0.00" reads badly; only show a sign when something non-zero survives
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// `$1,234.56`
pub fn format_currency(amount: f64) -> String {
    with_dollar_sign(format_number(amount, 2))
}

/// Millions of dollars: `$2.50M`
pub fn format_millions(amount: f64) -> String {
    format!("{}M", format_currency(amount))
}

/// Counts show decimals only when they have any: `4`, `2.50`.
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format_number(value, 0)
    } else {
        format_number(value, 2)
    }
}

fn with_dollar_sign(number: String) -> String {
    match number.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${number}"),
    }
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(20_000.0, 2), "20,000.00");
        assert_eq!(format_number(1_234_567.891, 2), "1,234,567.89");
    }

    #[test]
    fn test_format_number_negative_zero_has_no_sign() {
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_234.5), "$1,234.50");
        assert_eq!(format_currency(-9.99), "-$9.99");
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(2.0), "$2.00M");
        assert_eq!(format_millions(1_500.25), "$1,500.25M");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(4.0), "4");
        assert_eq!(format_count(12_000.0), "12,000");
        assert_eq!(format_count(2.5), "2.50");
    }
}
