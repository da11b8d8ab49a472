//! Symbol grid resolution - turns authored ASCII rows into a slot map
//!
//! A grid definition is a list of equal-length rows where every character is
//! a symbol. The dictionary maps symbols to semantic content keys; symbols
//! missing from the dictionary resolve to empty slots, so sparse layouts are
//! legal.
//!
//! # Example
//! ```
//! use slotboard::layout::{GridLayout, SupportedSizes};
//!
//! let layout = GridLayout::resolve(
//!     &["AAA", "ABA", "AAA"],
//!     [('A', "border"), ('B', "button")],
//!     &SupportedSizes::new([9]),
//! )?;
//!
//! assert_eq!(layout.size(), 9);
//! assert_eq!(layout.key_at(4), Some("button"));
//! assert_eq!(layout.count_symbol("button"), 1);
//! # Ok::<(), slotboard::LayoutError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::LayoutError;
use crate::geometry::{GridShape, SlotPosition};

/// Grid capacities the host surface can display.
///
/// Supplied by the host integration so the resolver can serve surfaces with
/// different geometries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupportedSizes {
    sizes: BTreeSet<usize>,
}

impl SupportedSizes {
    pub fn new(sizes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            sizes: sizes.into_iter().collect(),
        }
    }

    /// Chest-style surfaces: one to six rows of nine slots.
    pub fn chest() -> Self {
        Self::new((1..=6).map(|rows| rows * 9))
    }

    pub fn contains(&self, size: usize) -> bool {
        self.sizes.contains(&size)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.sizes.iter().copied()
    }

    fn to_vec(&self) -> Vec<usize> {
        self.sizes.iter().copied().collect()
    }
}

impl Default for SupportedSizes {
    fn default() -> Self {
        Self::chest()
    }
}

/// Resolved, immutable slot layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    rows: Vec<String>,
    dictionary: BTreeMap<char, String>,
    shape: GridShape,
    slot_keys: Vec<Option<String>>,
}

impl GridLayout {
    /// Resolve rows and a symbol dictionary into a slot map.
    ///
    /// Checks run in order: empty grid, ragged rows, unsupported size,
    /// dictionary shape. A repeated symbol keeps its last key.
    pub fn resolve<R, K>(
        rows: &[R],
        dictionary: impl IntoIterator<Item = (char, K)>,
        supported: &SupportedSizes,
    ) -> Result<Self, LayoutError>
    where
        R: AsRef<str>,
        K: Into<String>,
    {
        let rows: Vec<String> = rows.iter().map(|row| row.as_ref().to_string()).collect();
        let width = match rows.first() {
            Some(first) => first.chars().count(),
            None => return Err(LayoutError::EmptyGrid),
        };
        if width == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        for (idx, row) in rows.iter().enumerate().skip(1) {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRows {
                    row: idx,
                    expected: width,
                    found,
                });
            }
        }

        let shape = GridShape::new(width, rows.len());
        if !supported.contains(shape.size()) {
            return Err(LayoutError::UnsupportedSize {
                size: shape.size(),
                supported: supported.to_vec(),
            });
        }

        let dictionary: BTreeMap<char, String> = dictionary
            .into_iter()
            .map(|(symbol, key)| (symbol, key.into()))
            .collect();
        if dictionary.len() < 2 {
            return Err(LayoutError::BadDictionary(format!(
                "expected at least 2 entries, found {}",
                dictionary.len()
            )));
        }
        if let Some((symbol, _)) = dictionary.iter().find(|(_, key)| key.is_empty()) {
            return Err(LayoutError::BadDictionary(format!(
                "symbol `{symbol}` maps to an empty key"
            )));
        }

        let slot_keys = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|symbol| dictionary.get(&symbol).cloned())
            .collect();

        Ok(Self {
            rows,
            dictionary,
            shape,
            slot_keys,
        })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn dictionary(&self) -> &BTreeMap<char, String> {
        &self.dictionary
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Slot keys in linear slot order (`row * width + column`).
    pub fn slot_keys(&self) -> &[Option<String>] {
        &self.slot_keys
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.slot_keys.get(index).and_then(|key| key.as_deref())
    }

    pub fn position(&self, index: usize) -> Option<SlotPosition> {
        SlotPosition::from_index(self.shape, index)
    }

    /// Number of slots carrying `key`; zero for keys the layout never uses.
    pub fn count_symbol(&self, key: &str) -> usize {
        self.slot_keys
            .iter()
            .filter(|slot| slot.as_deref() == Some(key))
            .count()
    }

    /// Ascending slot indices carrying `key`.
    pub fn slots_for(&self, key: &str) -> Vec<usize> {
        self.slot_keys
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_deref() == Some(key))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Distinct keys in first-appearance slot order.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.slot_keys
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|key| seen.insert(*key))
            .collect()
    }
}
