//! Room bucketing and sub-scene splitting.

use tourgen_models::{ImageDescriptor, Room};
use tracing::debug;

/// Buckets with more images than this are split into sub-scenes.
pub const SPLIT_THRESHOLD: usize = 4;

/// Target number of images per sub-scene when splitting.
pub const IMAGES_PER_SUB_SCENE: usize = 3;

/// Images of one room, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBucket {
    pub room: Room,
    pub images: Vec<ImageDescriptor>,
}

impl RoomBucket {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Exterior shots always stay together as one scene.
    pub fn is_splittable(&self) -> bool {
        self.room != Room::Exterior
    }

    /// Number of sub-scenes this bucket becomes.
    pub fn default_parts(&self) -> usize {
        if self.is_splittable() && self.len() > SPLIT_THRESHOLD {
            self.len().div_ceil(IMAGES_PER_SUB_SCENE)
        } else {
            1
        }
    }

    /// Split into `parts` chunks whose sizes differ by at most one, larger chunks first.
    pub fn split(&self, parts: usize) -> Vec<Vec<ImageDescriptor>> {
        let parts = parts.clamp(1, self.len().max(1));
        let base = self.len() / parts;
        let extra = self.len() % parts;

        let mut chunks = Vec::with_capacity(parts);
        let mut images = self.images.iter().cloned();
        for i in 0..parts {
            let size = base + usize::from(i < extra);
            chunks.push(images.by_ref().take(size).collect());
        }
        chunks
    }
}

/// Bucket images by room in canonical walk-through order.
///
/// Known rooms are bucketed first. Each unlabelled image then joins the
/// smallest bucket at the time it is placed (earliest-seen bucket on ties),
/// or seeds a `living` bucket when nothing is labelled.
pub fn group_by_room(images: &[ImageDescriptor]) -> Vec<RoomBucket> {
    let mut buckets: Vec<RoomBucket> = Vec::new();
    let mut unlabelled = Vec::new();

    for image in images {
        let room = image.room_or_unknown();
        if !room.is_known() {
            unlabelled.push(image);
            continue;
        }
        match buckets.iter_mut().find(|b| b.room == room) {
            Some(bucket) => bucket.images.push(image.clone()),
            None => buckets.push(RoomBucket {
                room,
                images: vec![image.clone()],
            }),
        }
    }

    for image in unlabelled {
        match buckets.iter_mut().min_by_key(|b| b.len()) {
            Some(bucket) => {
                debug!(room = %bucket.room, path = %image.path.display(), "Merged unlabelled image");
                bucket.images.push(image.clone());
            }
            None => buckets.push(RoomBucket {
                room: Room::Living,
                images: vec![image.clone()],
            }),
        }
    }

    buckets.sort_by_key(|b| b.room.canonical_index());
    buckets
}
