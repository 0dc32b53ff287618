//! Display helpers shared by the chart and chat embeds

/// Singularize a chart unit ("hours" -> "hour")
pub fn singularize(word: &str) -> &str {
    match word {
        "hours" => "hour",
        "days" => "day",
        "weeks" => "week",
        "months" => "month",
        _ => word,
    }
}

/// Format a gold amount with thousands separators ("123456" -> "123,456")
pub fn format_gold(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
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
    fn test_singularize() {
        assert_eq!(singularize("hours"), "hour");
        assert_eq!(singularize("months"), "month");
        assert_eq!(singularize("gold"), "gold");
    }

    #[test]
    fn test_format_gold() {
        assert_eq!(format_gold(0), "0");
        assert_eq!(format_gold(999), "999");
        assert_eq!(format_gold(1000), "1,000");
        assert_eq!(format_gold(254_321), "254,321");
        assert_eq!(format_gold(1_234_567), "1,234,567");
        assert_eq!(format_gold(-4500), "-4,500");
    }
}
