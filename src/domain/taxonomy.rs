//! Category taxonomy derived from the feed
//!
//! The taxonomy is a pure projection of the current feed pull: the sorted
//! set of main categories and, per main category, the sorted set of
//! subcategories. It is cached for fast navigation menus but is never a
//! source of truth; every sync replaces it wholesale.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::feed::FeedItem;

/// The category tree extracted from one feed pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Taxonomy {
    /// Main category to sorted, deduplicated subcategories. BTree keeps the
    /// whole structure in stable sorted order.
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Main categories in sorted order.
    pub fn main_categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

/// Extract the taxonomy from feed items.
///
/// Items without a category are ignored; a main category seen only without
/// subcategories still appears with an empty subcategory set.
pub fn extract_taxonomy(items: &[FeedItem]) -> Taxonomy {
    let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for item in items {
        let Some(main) = item.category.as_deref() else {
            continue;
        };
        let entry = categories.entry(main.to_string()).or_default();
        if let Some(sub) = item.subcategory.as_deref() {
            entry.insert(sub.to_string());
        }
    }
    Taxonomy { categories }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, category: Option<&str>, subcategory: Option<&str>) -> FeedItem {
        FeedItem {
            sku: sku.to_string(),
            name: sku.to_string(),
            description: None,
            image_url: None,
            price: None,
            available: true,
            brand: None,
            category: category.map(str::to_string),
            subcategory: subcategory.map(str::to_string),
            product_url: None,
        }
    }

    #[test]
    fn builds_sorted_deduplicated_tree() {
        let items = vec![
            item("1", Some("Outdoor"), Some("Hiking")),
            item("2", Some("Kitchen"), Some("Cups")),
            item("3", Some("Outdoor"), Some("Camping")),
            item("4", Some("Outdoor"), Some("Hiking")),
            item("5", Some("Kitchen"), None),
        ];

        let taxonomy = extract_taxonomy(&items);
        assert_eq!(taxonomy.main_categories(), vec!["Kitchen", "Outdoor"]);

        let outdoor: Vec<&String> = taxonomy.categories["Outdoor"].iter().collect();
        assert_eq!(outdoor, vec!["Camping", "Hiking"]);
        assert_eq!(taxonomy.categories["Kitchen"].len(), 1);
    }

    #[test]
    fn items_without_category_are_ignored() {
        let items = vec![item("1", None, None), item("2", None, Some("ghost"))];
        let taxonomy = extract_taxonomy(&items);
        assert!(taxonomy.is_empty());
    }
}
