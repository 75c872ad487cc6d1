//! Projection slot enumeration.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the fixed nightly projection slots.
///
/// Stored as a `smallint` column and serialized as its number, never as
/// a variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[repr(i16)]
pub enum SlotNumber {
    /// First slot of the evening.
    One = 1,
    /// Second slot.
    Two = 2,
    /// Third slot.
    Three = 3,
    /// Fourth and last slot.
    Four = 4,
}

impl SlotNumber {
    /// All slots, in order.
    pub fn all() -> [SlotNumber; 4] {
        [Self::One, Self::Two, Self::Three, Self::Four]
    }

    /// Return the slot as its wire/database number.
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }
}

impl TryFrom<i16> for SlotNumber {
    type Error = screenbook_core::AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            _ => Err(screenbook_core::AppError::validation(format!(
                "Invalid slot number: {value}. Expected 1-4"
            ))),
        }
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

impl Serialize for SlotNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_i16())
    }
}

impl<'de> Deserialize<'de> for SlotNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i16::deserialize(deserializer)?;
        SlotNumber::try_from(value).map_err(|e| D::Error::custom(e.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for slot in SlotNumber::all() {
            assert_eq!(SlotNumber::try_from(slot.as_i16()).unwrap(), slot);
        }
        assert!(SlotNumber::try_from(0).is_err());
        assert!(SlotNumber::try_from(5).is_err());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&SlotNumber::Three).unwrap();
        assert_eq!(json, "3");
        let slot: SlotNumber = serde_json::from_str("2").unwrap();
        assert_eq!(slot, SlotNumber::Two);
        assert!(serde_json::from_str::<SlotNumber>("7").is_err());
    }
}
