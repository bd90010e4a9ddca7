//! Scavenger Hunt Game Engine
//!
//! Platform-agnostic core logic for the scavenger hunt: the item catalog, the
//! session controller that tracks found items and their photos, milestone
//! detection and reward tiers. No UI or platform-specific dependencies.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod item;
pub mod milestone;
#[cfg(feature = "async")]
pub mod picker;
pub mod photo;
pub mod progress;
pub mod reward;
pub mod session;

use std::sync::Arc;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, CatalogError, ItemId};
pub use constants::HUNT_SIZE;
pub use error::HuntError;
pub use item::Item;
pub use milestone::{Milestone, MilestoneEvent, MilestoneEvents, evaluate_milestones};
pub use photo::{Photo, PhotoError, PhotoFormat, normalize_photo};
#[cfg(feature = "async")]
pub use picker::{PhotoDelivery, PhotoRequest, PhotoSource};
pub use progress::{CallToAction, ProgressSummary};
pub use reward::{RewardRow, RewardTier, reward_rows};
pub use session::{
    CommitOutcome, CommitStatus, HuntSession, ImportOutcome, ItemSnapshot, SessionObserver,
    SessionSnapshot, SessionUpdate, UpdateKind,
};

/// Trait for abstracting catalog loading
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the hunt catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader serving the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl CatalogLoader for StaticCatalogLoader {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        catalog::builtin().map(|catalog| Catalog::clone(&catalog))
    }
}

/// Main game engine for creating hunt sessions
#[derive(Debug)]
pub struct HuntEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
}

impl<L> HuntEngine<L>
where
    L: CatalogLoader,
{
    /// Create a new engine with the provided catalog loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails or the catalog is not a valid hunt.
    pub fn load_catalog(&self) -> anyhow::Result<Catalog> {
        let catalog = self.loader.load_catalog()?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Start a fresh hunt session
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn create_session(&self) -> anyhow::Result<HuntSession> {
        let catalog = self.load_catalog()?;
        Ok(HuntSession::new(Arc::new(catalog)))
    }
}

impl Default for HuntEngine<StaticCatalogLoader> {
    fn default() -> Self {
        Self::new(StaticCatalogLoader)
    }
}
