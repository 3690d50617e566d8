/// A descriptive line inside a listing block, classified by keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Text with the `Rating:` label removed.
    Rating(String),
    Colors(String),
    Size(String),
    Gender(String),
    Other,
}

const RATING_LABEL: &str = "Rating:";

/// Keywords are checked in a fixed order; the first hit wins for a given line.
pub fn classify(text: &str) -> Fragment {
    let text = text.trim();
    if text.contains(RATING_LABEL) {
        Fragment::Rating(text.replace(RATING_LABEL, "").trim().to_string())
    } else if text.contains("Colors") {
        Fragment::Colors(text.to_string())
    } else if text.contains("Size:") {
        Fragment::Size(text.to_string())
    } else if text.contains("Gender:") {
        Fragment::Gender(text.to_string())
    } else {
        Fragment::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_label_removed() {
        assert_eq!(classify("Rating: ⭐ 4.8 / 5"), Fragment::Rating("⭐ 4.8 / 5".into()));
        assert_eq!(classify("  Rating: / 5 "), Fragment::Rating("/ 5".into()));
        assert_eq!(classify("Rating:"), Fragment::Rating(String::new()));
    }

    #[test]
    fn keywords() {
        assert_eq!(classify("3 Colors"), Fragment::Colors("3 Colors".into()));
        assert_eq!(classify("Size: XL"), Fragment::Size("Size: XL".into()));
        assert_eq!(classify("Gender: Women"), Fragment::Gender("Gender: Women".into()));
        assert_eq!(classify("Free shipping"), Fragment::Other);
    }

    #[test]
    fn keyword_order() {
        // "Colors" outranks "Size:" when both appear
        assert!(matches!(classify("Size: M, 2 Colors"), Fragment::Colors(_)));
        assert!(matches!(classify("Rating: 4 | Size: M"), Fragment::Rating(_)));
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(classify("size: m"), Fragment::Other);
    }
}
