use serde::Serialize;

pub const UNKNOWN_TITLE: &str = "Unknown Product";
pub const PRICE_UNAVAILABLE: &str = "Price Unavailable";
pub const INVALID_RATING: &str = "Invalid Rating";
pub const NO_COLORS: &str = "0 Colors";
pub const NO_SIZE: &str = "Size: N/A";
pub const NO_GENDER: &str = "Gender: N/A";

/// Format of `captured_at`, local time.
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const RAW_HEADER: [&str; 7] = ["title", "price", "rating", "colors", "size", "gender", "captured_at"];

/// One scraped listing before validation. `None` means the parser found no
/// element for that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub colors: Option<String>,
    pub size: Option<String>,
    pub gender: Option<String>,
    pub captured_at: String,
}

impl RawRecord {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.price.is_none()
            && self.rating.is_none()
            && self.colors.is_none()
            && self.size.is_none()
            && self.gender.is_none()
    }

    /// Render as text cells, filling missing fields with their placeholder text.
    pub fn to_row(&self) -> [String; 7] {
        let or = |v: &Option<String>, fallback: &str| v.clone().unwrap_or_else(|| fallback.to_string());
        [
            or(&self.title, UNKNOWN_TITLE),
            or(&self.price, PRICE_UNAVAILABLE),
            or(&self.rating, INVALID_RATING),
            or(&self.colors, NO_COLORS),
            or(&self.size, NO_SIZE),
            or(&self.gender, NO_GENDER),
            self.captured_at.clone(),
        ]
    }
}

/// Validated output row. Field names double as the CSV header and column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub price_local: f64,
    pub rating: f64,
    pub color_count: u32,
    pub size: String,
    pub gender: String,
    pub captured_at: String,
}

impl NormalizedRecord {
    pub const HEADER: [&'static str; 7] = [
        "title",
        "price_local",
        "rating",
        "color_count",
        "size",
        "gender",
        "captured_at",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_only_timestamp() {
        let r = RawRecord { captured_at: "2024-01-01 00:00:00".into(), ..Default::default() };
        assert!(r.is_empty());
        let r = RawRecord { gender: Some("Gender: Men".into()), ..r };
        assert!(!r.is_empty());
    }

    #[test]
    fn row_fills_placeholders() {
        let r = RawRecord {
            title: Some("Hoodie".into()),
            captured_at: "2024-01-01 00:00:00".into(),
            ..Default::default()
        };
        let row = r.to_row();
        assert_eq!(row[0], "Hoodie");
        assert_eq!(row[1], PRICE_UNAVAILABLE);
        assert_eq!(row[2], INVALID_RATING);
        assert_eq!(row[3], NO_COLORS);
        assert_eq!(row[4], NO_SIZE);
        assert_eq!(row[5], NO_GENDER);
        assert_eq!(row[6], "2024-01-01 00:00:00");
    }
}
