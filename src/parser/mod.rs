pub mod fragments;

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::models::RawRecord;
use fragments::Fragment;

struct ListingSelectors {
    card: Selector,
    details: Selector,
    title: Selector,
    price_span: Selector,
    price_p: Selector,
    fragment: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector("div.collection-card")?,
            details: parse_selector("div.product-details")?,
            title: parse_selector("h3.product-title")?,
            price_span: parse_selector("span.price")?,
            price_p: parse_selector("p.price")?,
            fragment: parse_selector("p[style]")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{}`: {}", css, e))
}

/// One record per `div.collection-card`, every field falling back to `None`.
///
/// Fields are read from the card's `div.product-details` when present,
/// otherwise from the card itself. An empty page is `Ok(vec![])`.
pub fn parse_listings(markup: &str, captured_at: &str) -> Result<Vec<RawRecord>> {
    let document = Html::parse_document(markup);
    let sel = ListingSelectors::new()?;

    let records: Vec<RawRecord> = document
        .select(&sel.card)
        .map(|card| {
            let scope = card.select(&sel.details).next().unwrap_or(card);
            parse_block(&sel, scope, captured_at)
        })
        .collect();

    if records.is_empty() {
        info!("No listing blocks found");
    } else {
        debug!(count = records.len(), "parsed listing blocks");
    }
    Ok(records)
}

fn parse_block(sel: &ListingSelectors, block: ElementRef<'_>, captured_at: &str) -> RawRecord {
    let title = first_text(block, &sel.title);
    let price = first_text(block, &sel.price_span).or_else(|| first_text(block, &sel.price_p));

    let mut record = RawRecord {
        title,
        price,
        captured_at: captured_at.to_string(),
        ..Default::default()
    };

    for p in block.select(&sel.fragment) {
        match fragments::classify(&text_content(&p)) {
            Fragment::Rating(t) => record.rating = Some(t),
            Fragment::Colors(t) => record.colors = Some(t),
            Fragment::Size(t) => record.size = Some(t),
            Fragment::Gender(t) => record.gender = Some(t),
            Fragment::Other => {}
        }
    }

    record
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(|el| text_content(&el))
}

fn text_content(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

// ── Tests ──
