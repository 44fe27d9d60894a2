//! Feed items and the vendor feed dialect
//!
//! The external feed is a JSON export, either a bare array of articles or an
//! object wrapping them under `articles`. Vendor payloads are messy: prices
//! arrive as numbers or formatted strings, availability as booleans or 0/1,
//! and category paths as a single `Main/Sub` string. Decoding is tolerant at
//! the item level (a bad item is dropped and counted) but strict at the
//! document level (an undecodable body fails the whole pull).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::product::FeedFields;

/// Errors raised while pulling or decoding the external feed.
///
/// All of these are fatal for the operation that triggered the pull: the
/// catalog is never mutated based on a partial or failed fetch.
#[derive(Error, Debug, Clone)]
pub enum FeedError {
    #[error("feed URL is not valid: {0}")]
    InvalidUrl(String),

    #[error("feed endpoint returned HTTP {status}: {url}")]
    Unreachable { status: u16, url: String },

    #[error("network error while fetching feed: {0}")]
    Network(String),

    #[error("feed body could not be decoded: {0}")]
    Decode(String),
}

/// One product entry of the external feed, normalized.
///
/// Ephemeral: parsed fresh on every pull and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub available: bool,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub product_url: Option<String>,
}

/// Result of decoding one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Items in feed order. Duplicate skus are kept as-is; sequential
    /// reconciliation makes the last occurrence win.
    pub items: Vec<FeedItem>,
    /// Entries skipped because they carried no usable identity key.
    pub dropped: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFeed {
    Wrapped { articles: Vec<Value> },
    Bare(Vec<Value>),
}

static PRICE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9,.\-]").unwrap());

/// Decode a feed body into normalized items.
pub fn parse_feed(body: &str) -> Result<ParsedFeed, FeedError> {
    let raw: RawFeed =
        serde_json::from_str(body).map_err(|e| FeedError::Decode(e.to_string()))?;
    let values = match raw {
        RawFeed::Wrapped { articles } => articles,
        RawFeed::Bare(values) => values,
    };

    let mut feed = ParsedFeed::default();
    for value in &values {
        match parse_item(value) {
            Some(item) => feed.items.push(item),
            None => {
                feed.dropped += 1;
                warn!("⚠️ Dropping feed entry without article id: {}", summarize(value));
            }
        }
    }
    Ok(feed)
}

fn parse_item(value: &Value) -> Option<FeedItem> {
    let sku = non_blank_str(value, "articleId")?;
    let name = non_blank_str(value, "title").unwrap_or_else(|| sku.clone());
    let (category, subcategory) = split_category(value.get("categoryPath"));

    Some(FeedItem {
        sku,
        name,
        description: non_blank_str(value, "shortDescription"),
        image_url: non_blank_str(value, "imageUrl"),
        price: parse_price(value.get("price")),
        available: parse_available(value.get("available")),
        brand: non_blank_str(value, "manufacturer"),
        category,
        subcategory,
        product_url: non_blank_str(value, "deeplink"),
    })
}

fn non_blank_str(value: &Value, key: &str) -> Option<String> {
    let s = value.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Accepts `12.99`, `"12.99"`, `"12,99 €"` and `"1.299,00"`.
fn parse_price(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = PRICE_NOISE.replace_all(s, "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }
            let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
                // Decimal comma, possibly with dot thousands separators.
                (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
                (Some(_), Some(_)) => cleaned.replace(',', ""),
                (Some(_), None) => cleaned.replace(',', "."),
                _ => cleaned.to_string(),
            };
            normalized.parse().ok()
        }
        _ => None,
    }
}

/// Availability defaults to true: presence in the feed implies the article
/// is listed for sale unless the vendor says otherwise.
fn parse_available(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|i| i != 0),
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => true,
    }
}

fn split_category(value: Option<&Value>) -> (Option<String>, Option<String>) {
    let Some(path) = value.and_then(Value::as_str) else {
        return (None, None);
    };
    let path = path.trim();
    if path.is_empty() {
        return (None, None);
    }
    match path.split_once('/') {
        Some((main, sub)) => {
            let main = main.trim();
            let sub = sub.trim();
            (
                (!main.is_empty()).then(|| main.to_string()),
                (!sub.is_empty()).then(|| sub.to_string()),
            )
        }
        None => (Some(path.to_string()), None),
    }
}

fn summarize(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 120 {
        let cut: String = text.chars().take(120).collect();
        format!("{cut}...")
    } else {
        text
    }
}

impl From<FeedItem> for FeedFields {
    fn from(item: FeedItem) -> Self {
        Self {
            sku: Some(item.sku),
            name: item.name,
            description: item.description,
            image_url: item.image_url,
            price: item.price,
            available: item.available,
            brand: item.brand,
            category: item.category,
            subcategory: item.subcategory,
            product_url: item.product_url,
            synced_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wrapped_and_bare_documents() {
        let wrapped = json!({
            "articles": [
                { "articleId": "A-1", "title": "Espresso Cup" }
            ]
        })
        .to_string();
        let bare = json!([
            { "articleId": "A-1", "title": "Espresso Cup" }
        ])
        .to_string();

        let from_wrapped = parse_feed(&wrapped).unwrap();
        let from_bare = parse_feed(&bare).unwrap();
        assert_eq!(from_wrapped.items, from_bare.items);
        assert_eq!(from_wrapped.items.len(), 1);
        assert_eq!(from_wrapped.items[0].sku, "A-1");
    }

    #[test]
    fn entries_without_article_id_are_dropped_and_counted() {
        let body = json!({
            "articles": [
                { "articleId": "A-1", "title": "Keeps" },
                { "title": "No id at all" },
                { "articleId": "  ", "title": "Blank id" },
                { "articleId": "A-2" }
            ]
        })
        .to_string();

        let feed = parse_feed(&body).unwrap();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.dropped, 2);
        assert_eq!(feed.items[1].sku, "A-2");
        // Missing title falls back to the article id.
        assert_eq!(feed.items[1].name, "A-2");
    }

    #[test]
    fn long_non_ascii_entries_are_summarized_without_panicking() {
        // Multi-byte text straddling the truncation point must not split a
        // character.
        let entry = json!({ "title": "é".repeat(200) });
        let summary = summarize(&entry);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 123);

        let body = json!({
            "articles": [
                { "articleId": "A-1", "title": "Keeps" },
                { "title": "æøå".repeat(80) }
            ]
        })
        .to_string();
        let feed = parse_feed(&body).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.dropped, 1);
    }

    #[test]
    fn undecodable_body_is_a_decode_error() {
        let err = parse_feed("<html>maintenance page</html>").unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));

        let wrong_shape = parse_feed(r#"{"status": "ok"}"#).unwrap_err();
        assert!(matches!(wrong_shape, FeedError::Decode(_)));
    }

    #[test]
    fn price_variants_are_normalized() {
        assert_eq!(parse_price(Some(&json!(12.99))), Some(12.99));
        assert_eq!(parse_price(Some(&json!("12.99"))), Some(12.99));
        assert_eq!(parse_price(Some(&json!("12,99 \u{20ac}"))), Some(12.99));
        assert_eq!(parse_price(Some(&json!("1.299,00"))), Some(1299.0));
        assert_eq!(parse_price(Some(&json!("1,299.00"))), Some(1299.0));
        assert_eq!(parse_price(Some(&json!("n/a"))), None);
        assert_eq!(parse_price(None), None);
    }

    #[test]
    fn availability_variants_are_normalized() {
        assert!(parse_available(Some(&json!(true))));
        assert!(!parse_available(Some(&json!(false))));
        assert!(parse_available(Some(&json!(1))));
        assert!(!parse_available(Some(&json!(0))));
        assert!(parse_available(Some(&json!("true"))));
        assert!(!parse_available(Some(&json!("no"))));
        assert!(parse_available(None));
    }

    #[test]
    fn category_path_splits_on_first_slash() {
        let item = json!({
            "articleId": "A-1",
            "categoryPath": "Kitchen/Cups & Mugs"
        });
        let parsed = parse_item(&item).unwrap();
        assert_eq!(parsed.category.as_deref(), Some("Kitchen"));
        assert_eq!(parsed.subcategory.as_deref(), Some("Cups & Mugs"));

        let flat = json!({ "articleId": "A-2", "categoryPath": "Outdoor" });
        let parsed = parse_item(&flat).unwrap();
        assert_eq!(parsed.category.as_deref(), Some("Outdoor"));
        assert_eq!(parsed.subcategory, None);
    }

    #[test]
    fn feed_fields_inherit_item_values() {
        let item = FeedItem {
            sku: "A-9".to_string(),
            name: "Trekking Pole".to_string(),
            description: Some("Light".to_string()),
            image_url: None,
            price: Some(49.9),
            available: true,
            brand: Some("Alpin".to_string()),
            category: Some("Outdoor".to_string()),
            subcategory: Some("Hiking".to_string()),
            product_url: Some("https://shop.example/a-9".to_string()),
        };

        let fields = FeedFields::from(item);
        assert_eq!(fields.sku.as_deref(), Some("A-9"));
        assert_eq!(fields.name, "Trekking Pole");
        assert_eq!(fields.price, Some(49.9));
        assert!(fields.synced_at.is_none());
    }
}
