//! Data types module - typed records produced by the format decoders

mod level;
mod scene;
mod tile;

// Re-export all types
pub use level::*;
pub use scene::*;
pub use tile::*;
