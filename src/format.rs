use chrono::NaiveDate;

/// Default truncation length for card descriptions
pub const CARD_TEXT_LEN: usize = 150;

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole-dollar price with thousands separators, e.g. `$485,000`
pub fn format_price(price: i64) -> String {
    if price < 0 {
        return format!("-${}", thousands(price.unsigned_abs()));
    }
    format!("${}", thousands(price as u64))
}

/// Square footage with thousands separators, e.g. `1,150`
pub fn format_square_feet(sqft: u32) -> String {
    thousands(u64::from(sqft))
}

/// Short listing date, e.g. `Jun 12, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Trim text to `max_len` characters with a trailing ellipsis
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_render_as_whole_dollars() {
        assert_eq!(format_price(0), "$0");
        assert_eq!(format_price(950), "$950");
        assert_eq!(format_price(485_000), "$485,000");
        assert_eq!(format_price(1_250_000), "$1,250,000");
    }

    #[test]
    fn square_feet_get_separators() {
        assert_eq!(format_square_feet(720), "720");
        assert_eq!(format_square_feet(4200), "4,200");
    }

    #[test]
    fn dates_render_short_form() {
        let date: NaiveDate = "2024-06-12".parse().unwrap();
        assert_eq!(format_date(date), "Jun 12, 2024");
        let single_digit: NaiveDate = "2024-03-02".parse().unwrap();
        assert_eq!(format_date(single_digit), "Mar 2, 2024");
    }

    #[test]
    fn short_text_passes_through_untruncated() {
        assert_eq!(truncate_text("cozy", 150), "cozy");
    }

    #[test]
    fn long_text_is_trimmed_before_the_ellipsis() {
        let text = "a".repeat(10) + "   " + &"b".repeat(200);
        let out = truncate_text(&text, 12);
        assert_eq!(out, format!("{}...", "a".repeat(10)));
    }
}
