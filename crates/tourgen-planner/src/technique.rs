//! Technique assignment by room priority.

use tourgen_models::{Scene, Technique};

use crate::options::PlannerOptions;

/// Give the highest-priority scenes AI synthesis, demote the rest to pan-zoom.
///
/// Ranking is stable and only decides the assignment; scene order is untouched.
pub fn assign_techniques(scenes: &mut [Scene], options: &PlannerOptions) {
    let mut ranked: Vec<usize> = (0..scenes.len()).collect();
    ranked.sort_by_key(|&i| scenes[i].room.priority_rank());

    for (rank, idx) in ranked.into_iter().enumerate() {
        let scene = &mut scenes[idx];
        if rank < options.max_ai_segments {
            scene.technique = Technique::AiSynthesis;
        } else {
            scene.technique = Technique::PanZoom;
            scene.duration = scene.duration.min(options.pan_zoom_cap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourgen_models::{ImageDescriptor, Room, SceneId};

    fn scene(room: Room, n: usize) -> Scene {
        Scene {
            id: SceneId::for_room(room, n),
            room,
            images: vec![ImageDescriptor::new("x.jpg")],
            duration: 8.0,
            technique: Technique::PanZoom,
            description: String::new(),
            focus_points: Vec::new(),
            is_filler: false,
        }
    }

    #[test]
    fn test_priority_wins_ai_slots() {
        let mut scenes: Vec<Scene> = Room::CANONICAL_ORDER.iter().map(|r| scene(*r, 1)).collect();
        let options = PlannerOptions::default().with_max_ai_segments(3);

        assign_techniques(&mut scenes, &options);

        let ai_rooms: Vec<Room> = scenes.iter().filter(|s| s.is_ai()).map(|s| s.room).collect();
        assert_eq!(ai_rooms, vec![Room::Exterior, Room::Living, Room::Kitchen]);

        let entry = scenes.iter().find(|s| s.room == Room::Entry).unwrap();
        assert_eq!(entry.technique, Technique::PanZoom);
        assert_eq!(entry.duration, 6.0);

        // Canonical order preserved
        assert_eq!(scenes[1].room, Room::Entry);
    }

    #[test]
    fn test_sub_scenes_of_same_room_keep_order() {
        let mut scenes = vec![scene(Room::Bedroom, 1), scene(Room::Bedroom, 2), scene(Room::Bedroom, 3)];
        let options = PlannerOptions::default().with_max_ai_segments(2);

        assign_techniques(&mut scenes, &options);

        assert!(scenes[0].is_ai());
        assert!(scenes[1].is_ai());
        assert!(!scenes[2].is_ai());
    }

    #[test]
    fn test_zero_ai_budget() {
        let mut scenes = vec![scene(Room::Exterior, 1)];
        assign_techniques(&mut scenes, &PlannerOptions::default().with_max_ai_segments(0));
        assert_eq!(scenes[0].technique, Technique::PanZoom);
    }
}
