use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, ItemId};
use crate::photo::Photo;

/// A hunt item tracked by a session.
///
/// The found flag is derived from the attached photo, so an item can never be
/// found without evidence or carry evidence while unfound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    entry: CatalogEntry,
    #[serde(default)]
    photo: Option<Photo>,
}

impl Item {
    #[must_use]
    pub const fn new(entry: CatalogEntry) -> Self {
        Self { entry, photo: None }
    }

    #[must_use]
    pub const fn id(&self) -> &ItemId {
        &self.entry.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    #[must_use]
    pub fn clue(&self) -> &str {
        &self.entry.clue
    }

    #[must_use]
    pub fn business_name(&self) -> &str {
        &self.entry.business_name
    }

    #[must_use]
    pub fn business_type(&self) -> &str {
        &self.entry.business_type
    }

    #[must_use]
    pub const fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.photo.is_some()
    }

    #[must_use]
    pub const fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    /// Raw bytes of the attached photo, if any.
    #[must_use]
    pub fn photo_data(&self) -> Option<&[u8]> {
        self.photo.as_ref().map(Photo::bytes)
    }

    /// Status line shown next to the item.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.is_found() {
            "Found!"
        } else {
            "Not found yet"
        }
    }

    /// Attach evidence. Returns `false` and leaves the item untouched when it
    /// is already found.
    pub(crate) fn attach_photo(&mut self, photo: Photo) -> bool {
        if self.photo.is_some() {
            return false;
        }
        self.photo = Some(photo);
        true
    }
}

impl From<CatalogEntry> for Item {
    fn from(entry: CatalogEntry) -> Self {
        Self::new(entry)
    }
}
