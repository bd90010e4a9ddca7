//! Immutable hunt catalog and its loader.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hasher;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::HUNT_SIZE;

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/catalog.json");

/// Stable identifier for a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single hunt item as authored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ItemId,
    pub name: String,
    pub clue: String,
    pub business_name: String,
    pub business_type: String,
}

/// Errors raised when catalog data violates the hunt's shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog must contain exactly {expected} items (got {actual})")]
    WrongSize { expected: usize, actual: usize },
    #[error("duplicate catalog item id `{0}`")]
    DuplicateId(ItemId),
    #[error("catalog item `{id}` has a blank {field}")]
    BlankField { id: ItemId, field: &'static str },
    #[error("catalog data could not be parsed: {0}")]
    Parse(String),
}

/// Ordered, validated list of every item in the hunt.
///
/// Deserializing goes through [`Catalog::from_entries`], so every instance
/// holds the full hunt with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogData")]
pub struct Catalog {
    items: Vec<CatalogEntry>,
}

/// Unchecked on-disk shape of a catalog.
#[derive(Deserialize)]
struct CatalogData {
    items: Vec<CatalogEntry>,
}

impl TryFrom<CatalogData> for Catalog {
    type Error = CatalogError;

    fn try_from(data: CatalogData) -> Result<Self, Self::Error> {
        Self::from_entries(data.items)
    }
}

impl Catalog {
    /// Build a catalog from entries, checking size, id uniqueness and text fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries do not form a valid hunt.
    pub fn from_entries(items: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let catalog = Self { items };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON document of the form `{"items": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the catalog is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData =
            serde_json::from_str(json).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::from_entries(data.items)
    }

    /// Load the catalog shipped with the game.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Check the hunt invariants: exact size, unique ids, no blank text.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.items.len() != HUNT_SIZE {
            return Err(CatalogError::WrongSize {
                expected: HUNT_SIZE,
                actual: self.items.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        for entry in &self.items {
            if !seen.insert(&entry.id) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
            let fields = [
                ("id", entry.id.as_str()),
                ("name", entry.name.as_str()),
                ("clue", entry.clue.as_str()),
                ("business name", entry.business_name.as_str()),
                ("business type", entry.business_type.as_str()),
            ];
            if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
                return Err(CatalogError::BlankField {
                    id: entry.id.clone(),
                    field: *field,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&CatalogEntry> {
        self.items.iter().find(|entry| &entry.id == id)
    }

    /// Content hash identifying this catalog revision in reports.
    #[must_use]
    pub fn revision(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for entry in &self.items {
            for field in [
                entry.id.as_str(),
                entry.name.as_str(),
                entry.clue.as_str(),
                entry.business_name.as_str(),
                entry.business_type.as_str(),
            ] {
                hasher.write(field.as_bytes());
                hasher.write_u8(0xFF);
            }
        }
        hasher.finish()
    }
}

/// Process-wide builtin catalog, parsed once and shared by every session.
///
/// # Errors
///
/// Returns an error if the embedded asset is malformed.
pub fn builtin() -> Result<Arc<Catalog>, CatalogError> {
    static CATALOG: OnceLock<Result<Arc<Catalog>, CatalogError>> = OnceLock::new();
    CATALOG
        .get_or_init(|| Catalog::load_from_static().map(Arc::new))
        .clone()
}
