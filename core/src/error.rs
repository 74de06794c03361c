use thiserror::Error;

/// Hard format violations. Everything else the decoders meet is handled by
/// degrading (see [`crate::decoded::Decoded`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid cursor container: missing RIFF header (found {found:?})")]
    MissingRiff { found: [u8; 4] },

    #[error("invalid cursor container: not an ACON form (found {found:?})")]
    NotAcon { found: [u8; 4] },

    #[error("truncated {context}: need {need} bytes, have {have}")]
    Truncated {
        context: &'static str,
        need: usize,
        have: usize,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
