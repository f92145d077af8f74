use std::collections::HashMap;

use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_price: Decimal,
}

/// Static product-name-to-price table. Built once at startup and shared
/// read-only across all pipeline invocations; lookups are case-insensitive.
#[derive(Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (normalize_name(&entry.name), entry))
            .collect();
        Self { entries }
    }

    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
