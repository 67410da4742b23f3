//! Room taxonomy for property images.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Room a property image was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Room {
    Exterior,
    Entry,
    Living,
    Kitchen,
    Bedroom,
    Bathroom,
    Backyard,
    /// Label missing or not recognized
    #[default]
    Unknown,
}

impl Room {
    /// Walk-through order used when grouping images into scenes.
    pub const CANONICAL_ORDER: [Room; 7] = [
        Room::Exterior,
        Room::Entry,
        Room::Living,
        Room::Kitchen,
        Room::Bedroom,
        Room::Bathroom,
        Room::Backyard,
    ];

    /// Order in which rooms claim the limited AI-synthesis slots.
    pub const PRIORITY_ORDER: [Room; 7] = [
        Room::Exterior,
        Room::Living,
        Room::Kitchen,
        Room::Bedroom,
        Room::Entry,
        Room::Bathroom,
        Room::Backyard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Room::Exterior => "exterior",
            Room::Entry => "entry",
            Room::Living => "living",
            Room::Kitchen => "kitchen",
            Room::Bedroom => "bedroom",
            Room::Bathroom => "bathroom",
            Room::Backyard => "backyard",
            Room::Unknown => "unknown",
        }
    }

    /// Human-readable label for overlays and prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Room::Exterior => "Exterior",
            Room::Entry => "Entryway",
            Room::Living => "Living Room",
            Room::Kitchen => "Kitchen",
            Room::Bedroom => "Bedroom",
            Room::Bathroom => "Bathroom",
            Room::Backyard => "Backyard",
            Room::Unknown => "Interior",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Room::Unknown)
    }

    /// Position in [`Room::CANONICAL_ORDER`], `None` for unknown rooms.
    pub fn canonical_index(&self) -> Option<usize> {
        Self::CANONICAL_ORDER.iter().position(|r| r == self)
    }

    /// Rank in [`Room::PRIORITY_ORDER`]; unranked rooms sort last.
    pub fn priority_rank(&self) -> usize {
        Self::PRIORITY_ORDER
            .iter()
            .position(|r| r == self)
            .unwrap_or(Self::PRIORITY_ORDER.len())
    }

    /// Lenient parse of a free-form room label (filename fragment, metadata tag).
    ///
    /// Never fails: anything unrecognized maps to [`Room::Unknown`].
    pub fn from_label(label: &str) -> Room {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        if let Ok(room) = normalized.parse::<Room>() {
            return room;
        }

        let matches_any = |needles: &[&str]| needles.iter().any(|n| normalized.contains(n));

        if matches_any(&["exterior", "front", "facade", "street", "curb", "outside"]) {
            Room::Exterior
        } else if matches_any(&["backyard", "back_yard", "yard", "garden", "patio", "pool", "deck"]) {
            Room::Backyard
        } else if matches_any(&["entry", "foyer", "hallway", "hall", "entrance"]) {
            Room::Entry
        } else if matches_any(&["kitchen", "pantry"]) {
            Room::Kitchen
        } else if matches_any(&["bath", "ensuite", "powder", "shower"]) {
            Room::Bathroom
        } else if matches_any(&["bedroom", "bed_room", "master", "nursery", "guest_room"]) {
            Room::Bedroom
        } else if matches_any(&["living", "family", "lounge", "den", "great_room"]) {
            Room::Living
        } else {
            Room::Unknown
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Room {
    type Err = RoomParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exterior" => Ok(Room::Exterior),
            "entry" => Ok(Room::Entry),
            "living" => Ok(Room::Living),
            "kitchen" => Ok(Room::Kitchen),
            "bedroom" => Ok(Room::Bedroom),
            "bathroom" => Ok(Room::Bathroom),
            "backyard" => Ok(Room::Backyard),
            "unknown" => Ok(Room::Unknown),
            _ => Err(RoomParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown room: {0}")]
pub struct RoomParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse() {
        assert_eq!("kitchen".parse::<Room>().unwrap(), Room::Kitchen);
        assert_eq!("BATHROOM".parse::<Room>().unwrap(), Room::Bathroom);
        assert!("garage".parse::<Room>().is_err());
    }

    #[test]
    fn test_label_aliases() {
        assert_eq!(Room::from_label("Front Facade"), Room::Exterior);
        assert_eq!(Room::from_label("living-room"), Room::Living);
        assert_eq!(Room::from_label("master_bedroom_2"), Room::Bedroom);
        assert_eq!(Room::from_label("ensuite"), Room::Bathroom);
        assert_eq!(Room::from_label("pool"), Room::Backyard);
        assert_eq!(Room::from_label("foyer"), Room::Entry);
        assert_eq!(Room::from_label("garage"), Room::Unknown);
        assert_eq!(Room::from_label(""), Room::Unknown);
    }

    #[test]
    fn test_orders() {
        assert_eq!(Room::Exterior.canonical_index(), Some(0));
        assert_eq!(Room::Backyard.canonical_index(), Some(6));
        assert_eq!(Room::Unknown.canonical_index(), None);

        assert!(Room::Living.priority_rank() < Room::Entry.priority_rank());
        assert_eq!(Room::Unknown.priority_rank(), Room::PRIORITY_ORDER.len());
    }
}
