//! Schema definitions for RON content files

pub mod building;
pub mod resource;
pub mod settings;

pub use building::BuildingDef;
pub use resource::ResourceDef;
pub use settings::Settings;
