//! Image descriptors handed over by the image collection stage.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Room;

/// A still image of the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDescriptor {
    /// Local path to the image file
    pub path: PathBuf,

    /// Room the image was classified as, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,

    /// Capture timestamp from image metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_time: Option<DateTime<Utc>>,
}

impl ImageDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            room: None,
            capture_time: None,
        }
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_capture_time(mut self, capture_time: DateTime<Utc>) -> Self {
        self.capture_time = Some(capture_time);
        self
    }

    /// The room, treating a missing label as [`Room::Unknown`].
    pub fn room_or_unknown(&self) -> Room {
        self.room.unwrap_or(Room::Unknown)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
