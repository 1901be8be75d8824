//! Amounts are stored as integer cents; formatting is display-only.

/// Render cents as a dollar string, e.g. `45700` -> `"$457.00"`.
pub fn format_usd(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::format_usd;

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(95), "$0.95");
        assert_eq!(format_usd(250), "$2.50");
        assert_eq!(format_usd(45700), "$457.00");
    }
}
