use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use blake3::Hash;

use crate::error::LayoutError;
use crate::logging::{LogLevel, Logger, TARGET_LAYOUT, emit, json_kv};

use super::core::{GridLayout, SupportedSizes};
use super::definition::LayoutDefinition;

/// Interns resolved layouts so identical definitions share one `Arc`.
///
/// Entries are keyed by a blake3 fingerprint of the rows, the dictionary,
/// and the supported size set. The definition name is not part of the
/// fingerprint. Failed resolutions are not cached.
#[derive(Default)]
pub struct LayoutCache {
    entries: Mutex<HashMap<Hash, Arc<GridLayout>>>,
    logger: Option<Logger>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn intern(
        &self,
        definition: &LayoutDefinition,
        supported: &SupportedSizes,
    ) -> Result<Arc<GridLayout>, LayoutError> {
        let key = fingerprint(definition, supported);
        if let Some(layout) = self.lock().get(&key) {
            return Ok(Arc::clone(layout));
        }

        let layout = match definition.resolve(supported) {
            Ok(layout) => Arc::new(layout),
            Err(err) => {
                emit(
                    self.logger.as_ref(),
                    LogLevel::Warn,
                    TARGET_LAYOUT,
                    "layout_rejected",
                    [
                        json_kv("name", definition.name.as_str()),
                        json_kv("error", err.to_string()),
                    ],
                );
                return Err(err);
            }
        };
        emit(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_LAYOUT,
            "layout_resolved",
            [
                json_kv("name", definition.name.as_str()),
                json_kv("width", layout.width()),
                json_kv("height", layout.height()),
                json_kv("fingerprint", key.to_hex().to_string()),
            ],
        );
        let mut guard = self.lock();
        Ok(Arc::clone(guard.entry(key).or_insert(layout)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Hash, Arc<GridLayout>>> {
        // Only fully built layouts are ever inserted.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCache")
            .field("entries", &self.len())
            .field("logging", &self.logger.is_some())
            .finish()
    }
}

fn fingerprint(definition: &LayoutDefinition, supported: &SupportedSizes) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for row in &definition.rows {
        hasher.update(&(row.len() as u64).to_le_bytes());
        hasher.update(row.as_bytes());
    }
    hasher.update(b"\x00dictionary");
    for (symbol, key) in &definition.dictionary {
        hasher.update(&(symbol.len() as u64).to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
    }
    hasher.update(b"\x00sizes");
    for size in supported.iter() {
        hasher.update(&(size as u64).to_le_bytes());
    }
    hasher.finalize()
}
