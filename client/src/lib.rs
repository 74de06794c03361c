//! Level assembly and rendering for scene viewer levels.

pub mod animation;
pub mod assets;
pub mod level;
pub mod map;
pub mod render_cache;
pub mod settings;
pub mod surface;
