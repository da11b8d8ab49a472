use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

use super::core::{GridLayout, SupportedSizes};

/// Authored panel layout as it appears in host configuration.
///
/// Dictionary keys are symbol strings so the definition survives formats
/// that have no char type. Only the first character of each key is matched
/// against the rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    #[serde(default)]
    pub name: String,
    pub rows: Vec<String>,
    pub dictionary: BTreeMap<String, String>,
}

impl LayoutDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            dictionary: BTreeMap::new(),
        }
    }

    pub fn row(mut self, row: impl Into<String>) -> Self {
        self.rows.push(row.into());
        self
    }

    pub fn symbol(mut self, symbol: char, key: impl Into<String>) -> Self {
        self.dictionary.insert(symbol.to_string(), key.into());
        self
    }

    pub fn resolve(&self, supported: &SupportedSizes) -> Result<GridLayout, LayoutError> {
        let mut symbols = Vec::with_capacity(self.dictionary.len());
        for (symbol, key) in &self.dictionary {
            let Some(ch) = symbol.chars().next() else {
                return Err(LayoutError::BadDictionary(
                    "dictionary symbol is empty".to_string(),
                ));
            };
            symbols.push((ch, key.clone()));
        }
        GridLayout::resolve(&self.rows, symbols, supported)
    }
}
