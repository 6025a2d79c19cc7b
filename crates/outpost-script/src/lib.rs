//! Outpost Script - RON content loader
//!
//! Loads colony content from RON files:
//! - Resource kinds with caps, starting stock and sale prices
//! - Transport ship types
//! - Building types with per-level stats and placement rules
//! - Catalog and colony settings
//!
//! Every section of a content file is optional, so content can be split
//! across as many files as convenient and loaded with
//! [`Loader::load_directory`]. A standard content pack is bundled:
//!
//! ```
//! let content = outpost_script::standard().unwrap();
//! assert!(content.catalog.ship_type(&"small".into()).is_ok());
//! ```

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{Content, Loader};
pub use schema::{BuildingDef, ResourceDef, Settings};

/// RON source of the bundled content pack
pub const STANDARD_CONTENT: &str = include_str!("../data/standard.ron");

/// Load the bundled content pack
pub fn standard() -> Result<Content> {
    let mut loader = Loader::new();
    loader.load_str(STANDARD_CONTENT)?;
    loader.finish()
}
