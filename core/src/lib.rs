//! Decoders and typed records for scene viewer level assets.

pub mod ani;
pub mod byte_operations;
pub mod constants;
pub mod csx;
pub mod decoded;
pub mod encrypt;
pub mod engine_object;
pub mod error;
pub mod lao;
pub mod logging;
pub mod lvl;
pub mod sdb;
pub mod sef;
pub mod string_operations;
pub mod types;

pub use decoded::{DecodeStatus, Decoded};
pub use error::DecodeError;
pub use logging::initialize_logger;
