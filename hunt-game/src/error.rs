use thiserror::Error;

use crate::catalog::{CatalogError, ItemId};

/// Errors surfaced by the hunt controller.
///
/// Cancelled or malformed photos are not errors; they are reported through
/// [`crate::session::CommitStatus`] and leave the session untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HuntError {
    #[error("no item `{0}` in this hunt")]
    UnknownItem(ItemId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
