pub mod numbers;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::NormalizeConfig;
use crate::models::{NormalizedRecord, RawRecord, INVALID_RATING, PRICE_UNAVAILABLE, UNKNOWN_TITLE};
use numbers::{extract_first_amount, extract_first_integer, extract_first_number};

const NOT_RATED: &str = "Not Rated";
const SIZE_PREFIX: &str = "Size: ";
const GENDER_PREFIX: &str = "Gender: ";

/// Why a raw record was dropped. Only the identity/value fields can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum Rejection {
    #[error("record has no fields")]
    EmptyRecord,
    #[error("title missing or empty")]
    MissingTitle,
    #[error("title is a placeholder")]
    UnknownTitle,
    #[error("price missing")]
    MissingPrice,
    #[error("price unavailable")]
    PriceUnavailable,
    #[error("price has no parseable amount")]
    UnparsablePrice,
    #[error("rating missing or empty")]
    MissingRating,
    #[error("rating marked invalid")]
    InvalidRating,
    #[error("rating has no parseable number")]
    UnparsableRating,
}

/// Validate and type every raw record, keeping input order, capped at `max_rows`.
pub fn normalize(raw: Vec<RawRecord>, config: &NormalizeConfig) -> Vec<NormalizedRecord> {
    let total = raw.len();
    let mut rejected: BTreeMap<Rejection, usize> = BTreeMap::new();
    let mut rows = Vec::with_capacity(total.min(config.max_rows));

    for record in &raw {
        match normalize_record(record, config) {
            Ok(row) => rows.push(row),
            Err(reason) => *rejected.entry(reason).or_default() += 1,
        }
    }

    for (reason, count) in &rejected {
        debug!(%reason, count, "rejected raw records");
    }

    rows.truncate(config.max_rows);
    info!("Transformation complete: {} valid of {} raw records", rows.len(), total);
    rows
}

pub fn normalize_record(
    record: &RawRecord,
    config: &NormalizeConfig,
) -> Result<NormalizedRecord, Rejection> {
    if record.is_empty() {
        return Err(Rejection::EmptyRecord);
    }

    let title = match record.title.as_deref() {
        None | Some("") => return Err(Rejection::MissingTitle),
        Some(t) if t.contains(UNKNOWN_TITLE) => return Err(Rejection::UnknownTitle),
        Some(t) => t.to_string(),
    };

    let amount = match record.price.as_deref() {
        None => return Err(Rejection::MissingPrice),
        Some(PRICE_UNAVAILABLE) => return Err(Rejection::PriceUnavailable),
        Some(p) => extract_first_amount(p).ok_or(Rejection::UnparsablePrice)?,
    };

    let rating = match record.rating.as_deref() {
        None | Some("") => return Err(Rejection::MissingRating),
        Some(r) if r.contains(INVALID_RATING) || r == NOT_RATED => {
            return Err(Rejection::InvalidRating)
        }
        Some(r) => extract_first_number(r).ok_or(Rejection::UnparsableRating)?,
    };

    let color_count = record
        .colors
        .as_deref()
        .and_then(extract_first_integer)
        .unwrap_or(0);

    Ok(NormalizedRecord {
        title,
        price_local: amount * config.exchange_rate,
        rating,
        color_count,
        size: strip_label(record.size.as_deref(), SIZE_PREFIX),
        gender: strip_label(record.gender.as_deref(), GENDER_PREFIX),
        captured_at: record.captured_at.clone(),
    })
}

fn strip_label(value: Option<&str>, prefix: &str) -> String {
    match value {
        Some(v) => v.strip_prefix(prefix).unwrap_or(v).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2023-01-01 12:00:00";

    fn raw(title: &str, price: &str, rating: &str) -> RawRecord {
        RawRecord {
            title: Some(title.into()),
            price: Some(price.into()),
            rating: Some(rating.into()),
            colors: Some("3 Colors".into()),
            size: Some("Size: M".into()),
            gender: Some("Gender: Unisex".into()),
            captured_at: TS.into(),
        }
    }

    fn one(record: RawRecord) -> Result<NormalizedRecord, Rejection> {
        normalize_record(&record, &NormalizeConfig::default())
    }

    #[test]
    fn valid_record() {
        let r = one(raw("Stylish T-Shirt", "$29.99", "4.5 / 5")).unwrap();
        assert_eq!(r.title, "Stylish T-Shirt");
        assert!((r.price_local - 29.99 * 16000.0).abs() < 1e-6);
        assert_eq!(r.rating, 4.5);
        assert_eq!(r.color_count, 3);
        assert_eq!(r.size, "M");
        assert_eq!(r.gender, "Unisex");
        assert_eq!(r.captured_at, TS);
    }

    #[test]
    fn grouped_price() {
        let r = one(raw("Coat", "$1,299.99", "4.8 / 5")).unwrap();
        assert!((r.price_local - 1299.99 * 16000.0).abs() < 1e-6);
        assert_eq!(r.rating, 4.8);
    }

    #[test]
    fn custom_exchange_rate() {
        let cfg = NormalizeConfig { exchange_rate: 2.0, ..Default::default() };
        let r = normalize_record(&raw("Coat", "$10", "4 / 5"), &cfg).unwrap();
        assert_eq!(r.price_local, 20.0);
    }

    #[test]
    fn title_rejections() {
        assert_eq!(one(raw("Unknown Product", "$1", "4")), Err(Rejection::UnknownTitle));
        assert_eq!(one(raw("Unknown Product 7", "$1", "4")), Err(Rejection::UnknownTitle));
        assert_eq!(one(raw("", "$1", "4")), Err(Rejection::MissingTitle));
        let r = RawRecord { title: None, ..raw("x", "$1", "4") };
        assert_eq!(one(r), Err(Rejection::MissingTitle));
    }

    #[test]
    fn empty_record() {
        let r = RawRecord { captured_at: TS.into(), ..Default::default() };
        assert_eq!(one(r), Err(Rejection::EmptyRecord));
    }

    #[test]
    fn price_rejections() {
        assert_eq!(one(raw("Hat", "Price Unavailable", "4")), Err(Rejection::PriceUnavailable));
        assert_eq!(one(raw("Hat", "call us", "4")), Err(Rejection::UnparsablePrice));
        let r = RawRecord { price: None, ..raw("Hat", "$1", "4") };
        assert_eq!(one(r), Err(Rejection::MissingPrice));
    }

    #[test]
    fn rating_rejections() {
        assert_eq!(one(raw("Hat", "$1", "Invalid Rating")), Err(Rejection::InvalidRating));
        assert_eq!(one(raw("Hat", "$1", "⭐ Invalid Rating / 5")), Err(Rejection::InvalidRating));
        assert_eq!(one(raw("Hat", "$1", "Not Rated")), Err(Rejection::InvalidRating));
        assert_eq!(one(raw("Hat", "$1", "")), Err(Rejection::MissingRating));
        assert_eq!(one(raw("Hat", "$1", "no stars")), Err(Rejection::UnparsableRating));
        let r = RawRecord { rating: None, ..raw("Hat", "$1", "4") };
        assert_eq!(one(r), Err(Rejection::MissingRating));
    }

    // Known quirk: an empty rating label still carries the scale, and the
    // first-number rule reads the scale as the rating.
    #[test]
    fn quirk_rating_scale_read_as_value() {
        let r = one(raw("Hat", "$1", "/ 5")).unwrap();
        assert_eq!(r.rating, 5.0);
    }

    #[test]
    fn colors_default_to_zero() {
        let r = RawRecord { colors: Some("Many Colors Available".into()), ..raw("Hat", "$1", "4") };
        assert_eq!(one(r).unwrap().color_count, 0);
        let r = RawRecord { colors: None, ..raw("Hat", "$1", "4") };
        assert_eq!(one(r).unwrap().color_count, 0);
    }

    #[test]
    fn size_gender_defaults() {
        let r = RawRecord { size: None, gender: None, ..raw("Hat", "$1", "4") };
        let n = one(r).unwrap();
        assert_eq!(n.size, "");
        assert_eq!(n.gender, "");

        let r = RawRecord {
            size: Some("XL".into()),
            gender: Some("Gender: N/A".into()),
            ..raw("Hat", "$1", "4")
        };
        let n = one(r).unwrap();
        assert_eq!(n.size, "XL");
        assert_eq!(n.gender, "N/A");
    }

    #[test]
    fn mixed_batch_keeps_order() {
        let input = vec![
            raw("A", "$1", "4"),
            raw("Unknown Product", "$1", "4"),
            raw("B", "Price Unavailable", "4"),
            raw("C", "$3", "Invalid Rating"),
            raw("D", "$4", "3.5 / 5"),
        ];
        let out = normalize(input, &NormalizeConfig::default());
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "D"]);
    }

    #[test]
    fn only_unknown_titles_yield_nothing() {
        let input = vec![raw("Unknown Product", "$1", "4"); 10];
        assert!(normalize(input, &NormalizeConfig::default()).is_empty());
    }

    #[test]
    fn caps_at_max_rows() {
        let input: Vec<_> = (0..1500).map(|i| raw(&format!("Item {i}"), "$10", "4")).collect();
        let out = normalize(input, &NormalizeConfig::default());
        assert_eq!(out.len(), 1000);
        assert_eq!(out[0].title, "Item 0");
        assert_eq!(out[999].title, "Item 999");
    }

    #[test]
    fn cap_counts_accepted_rows_only() {
        let mut input = vec![raw("Unknown Product", "$1", "4"); 5];
        input.extend((0..5).map(|i| raw(&format!("Item {i}"), "$10", "4")));
        let cfg = NormalizeConfig { max_rows: 3, ..Default::default() };
        let out = normalize(input, &cfg);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 0", "Item 1", "Item 2"]);
    }
}
