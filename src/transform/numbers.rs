use std::sync::LazyLock;

use regex::Regex;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9.,]+").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9.]+").unwrap());
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// First run of digits, dots and thousands separators, commas dropped.
/// `"$1,299.99"` → 1299.99. `None` when there is no run or it does not parse.
pub fn extract_first_amount(text: &str) -> Option<f64> {
    let m = AMOUNT_RE.find(text)?;
    m.as_str().replace(',', "").parse().ok()
}

/// First run of digits and dots. Only the first run is tried: `"x . 5"` is `None`.
pub fn extract_first_number(text: &str) -> Option<f64> {
    NUMBER_RE.find(text)?.as_str().parse().ok()
}

/// First run of ASCII digits; `None` on overflow.
pub fn extract_first_integer(text: &str) -> Option<u32> {
    INTEGER_RE.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_plain_and_grouped() {
        assert_eq!(extract_first_amount("$29.99"), Some(29.99));
        assert_eq!(extract_first_amount("$1,299.99"), Some(1299.99));
        assert_eq!(extract_first_amount("USD 100"), Some(100.0));
    }

    #[test]
    fn amount_none() {
        assert_eq!(extract_first_amount(""), None);
        assert_eq!(extract_first_amount("free"), None);
        assert_eq!(extract_first_amount("$."), None);
        assert_eq!(extract_first_amount("1.2.3"), None);
    }

    #[test]
    fn number_takes_first_run() {
        assert_eq!(extract_first_number("4.8 / 5"), Some(4.8));
        assert_eq!(extract_first_number("⭐ 3.9 / 5"), Some(3.9));
        assert_eq!(extract_first_number("/ 5"), Some(5.0));
    }

    #[test]
    fn number_ignores_commas() {
        assert_eq!(extract_first_number("4,5"), Some(4.0));
    }

    #[test]
    fn number_none() {
        assert_eq!(extract_first_number(""), None);
        assert_eq!(extract_first_number("Not Rated"), None);
        // a bare dot is the first run and fails to parse
        assert_eq!(extract_first_number(". 5"), None);
    }

    #[test]
    fn integer() {
        assert_eq!(extract_first_integer("3 Colors"), Some(3));
        assert_eq!(extract_first_integer("Colors: 12 / 20"), Some(12));
        assert_eq!(extract_first_integer("Many Colors Available"), None);
        assert_eq!(extract_first_integer(""), None);
        assert_eq!(extract_first_integer("99999999999 Colors"), None);
    }
}
