//! Partial-success marker for the lenient decoders.

use serde::Serialize;

/// Whether a decoder consumed its input cleanly or had to fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DecodeStatus {
    #[default]
    Complete,
    /// The input was truncated or malformed; the value holds defaults or a
    /// prefix of the records.
    Degraded,
}

impl DecodeStatus {
    /// Combines two statuses; degraded wins.
    pub fn and(self, other: DecodeStatus) -> DecodeStatus {
        if self == DecodeStatus::Degraded || other == DecodeStatus::Degraded {
            DecodeStatus::Degraded
        } else {
            DecodeStatus::Complete
        }
    }
}

/// A decoded value together with its [`DecodeStatus`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub status: DecodeStatus,
}

impl<T> Decoded<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            status: DecodeStatus::Complete,
        }
    }

    pub fn degraded(value: T) -> Self {
        Self {
            value,
            status: DecodeStatus::Degraded,
        }
    }

    pub fn with_status(value: T, status: DecodeStatus) -> Self {
        Self { value, status }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.status == DecodeStatus::Complete
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            status: self.status,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Decoded<T> {
    /// The documented default for a payload too short to decode.
    pub fn fallback() -> Self {
        Self::degraded(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_wins_when_combining() {
        use DecodeStatus::*;
        assert_eq!(Complete.and(Complete), Complete);
        assert_eq!(Complete.and(Degraded), Degraded);
        assert_eq!(Degraded.and(Complete), Degraded);
    }

    #[test]
    fn map_keeps_status() {
        let d = Decoded::degraded(2).map(|v| v * 10);
        assert_eq!(d.value, 20);
        assert!(!d.is_complete());
        assert!(Decoded::complete(()).is_complete());
    }

    #[test]
    fn fallback_is_degraded_default() {
        let d: Decoded<Vec<u8>> = Decoded::fallback();
        assert!(d.value.is_empty());
        assert_eq!(d.status, DecodeStatus::Degraded);
    }
}
