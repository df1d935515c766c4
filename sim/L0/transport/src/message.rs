//! Message payloads and the codec between them and Rust values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single message as carried on the bus.
///
/// The control surface only needs standard scalar messages, so the payload
/// is a closed set of kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Payload {
    /// 32-bit float message.
    Float32(f32),
    /// Boolean message.
    Bool(bool),
}

impl Payload {
    /// The kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Float32(_) => PayloadKind::Float32,
            Self::Bool(_) => PayloadKind::Bool,
        }
    }
}

/// Discriminant of a [`Payload`], used to type-check topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PayloadKind {
    /// 32-bit float.
    Float32,
    /// Boolean.
    Bool,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// A Rust type that can travel on the bus.
pub trait Message: Sized + Send + 'static {
    /// Payload kind this type encodes to.
    const KIND: PayloadKind;

    /// Decode from a payload; `None` if the payload has another kind.
    fn from_payload(payload: &Payload) -> Option<Self>;

    /// Encode into a payload.
    fn into_payload(self) -> Payload;
}

impl Message for f32 {
    const KIND: PayloadKind = PayloadKind::Float32;

    fn from_payload(payload: &Payload) -> Option<Self> {
        match *payload {
            Payload::Float32(value) => Some(value),
            Payload::Bool(_) => None,
        }
    }

    fn into_payload(self) -> Payload {
        Payload::Float32(self)
    }
}

impl Message for bool {
    const KIND: PayloadKind = PayloadKind::Bool;

    fn from_payload(payload: &Payload) -> Option<Self> {
        match *payload {
            Payload::Bool(value) => Some(value),
            Payload::Float32(_) => None,
        }
    }

    fn into_payload(self) -> Payload {
        Payload::Bool(self)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Payload::Float32(1.0).kind(), PayloadKind::Float32);
        assert_eq!(Payload::Bool(true).kind(), PayloadKind::Bool);
        assert_eq!(<f32 as Message>::KIND, PayloadKind::Float32);
        assert_eq!(<bool as Message>::KIND, PayloadKind::Bool);
    }

    #[test]
    fn test_decode_rejects_other_kind() {
        assert_eq!(f32::from_payload(&Payload::Float32(2.5)), Some(2.5));
        assert_eq!(f32::from_payload(&Payload::Bool(true)), None);
        assert_eq!(bool::from_payload(&Payload::Bool(false)), Some(false));
        assert_eq!(bool::from_payload(&Payload::Float32(0.0)), None);
    }
}
