//! Duration reconciliation and filler insertion.

use std::collections::HashSet;
use std::path::PathBuf;

use tourgen_models::{Scene, SceneId, Technique};
use tracing::debug;

use crate::descriptions::{filler_description, focus_points};
use crate::options::PlannerOptions;

/// Residual below which durations are considered settled.
const SETTLE_EPSILON: f64 = 1e-3;

/// Fraction of the content budget the plan must reach before fillers stop.
const FILLER_COVERAGE: f64 = 0.95;

fn total(scenes: &[Scene]) -> f64 {
    scenes.iter().map(|s| s.duration).sum()
}

/// Scale every duration towards `available`, then re-clamp per technique.
pub fn scale_to(scenes: &mut [Scene], available: f64, options: &PlannerOptions) {
    let sum = total(scenes);
    if sum <= 0.0 || (sum - available).abs() < SETTLE_EPSILON {
        return;
    }

    let factor = available / sum;
    for scene in scenes.iter_mut() {
        scene.duration = options.bounds_for(scene.technique).clamp(scene.duration * factor);
    }
    debug!(factor, total = total(scenes), available, "Scaled scene durations");
}

/// Spread the remaining residual over scenes that still have headroom.
///
/// Each round shares the residual equally; scenes hitting a bound drop out of
/// the next round.
pub fn settle(scenes: &mut [Scene], available: f64, options: &PlannerOptions) {
    for _ in 0..=scenes.len() {
        let residual = available - total(scenes);
        if residual.abs() < SETTLE_EPSILON {
            return;
        }

        let open: Vec<usize> = scenes
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                let bounds = options.bounds_for(s.technique);
                if residual > 0.0 {
                    s.duration < bounds.max - 1e-9
                } else {
                    s.duration > bounds.min + 1e-9
                }
            })
            .map(|(i, _)| i)
            .collect();
        if open.is_empty() {
            return;
        }

        let share = residual / open.len() as f64;
        for idx in open {
            let scene = &mut scenes[idx];
            scene.duration = options.bounds_for(scene.technique).clamp(scene.duration + share);
        }
    }
}

/// Append pan-zoom filler scenes while the plan falls short of its content budget.
///
/// Returns the number of fillers added.
pub fn insert_fillers(scenes: &mut Vec<Scene>, available: f64, options: &PlannerOptions) -> usize {
    let threshold = options.filler_min_shortfall.min(available * (1.0 - FILLER_COVERAGE));
    let min_duration = options.pan_zoom_bounds.min;

    let mut first = first_filler_source(scenes);
    let mut cycle = cycled_sources(scenes);
    let mut added = 0;

    loop {
        let shortfall = available - total(scenes);
        if total(scenes) >= available * FILLER_COVERAGE || shortfall <= threshold {
            break;
        }
        let Some(source) = first.take().or_else(|| cycle.next()) else {
            break;
        };
        let Some(origin) = scenes.iter().find(|s| s.last_image().map(|i| &i.path) == Some(&source)) else {
            break;
        };
        let Some(image) = origin.last_image().cloned() else {
            break;
        };

        added += 1;
        let duration = shortfall.min(options.filler_max_duration).max(min_duration);
        let room = origin.room;
        debug!(room = %room, duration, shortfall, "Inserting filler scene");

        scenes.push(Scene {
            id: SceneId::filler(added),
            room,
            images: vec![image],
            duration,
            technique: Technique::PanZoom,
            description: filler_description(room),
            focus_points: focus_points(room),
            is_filler: true,
        });
    }

    added
}

/// The first filler reuses the last image of the first multi-image scene.
fn first_filler_source(scenes: &[Scene]) -> Option<PathBuf> {
    scenes
        .iter()
        .find(|s| !s.is_filler && s.images.len() > 1)
        .and_then(|s| s.last_image())
        .map(|i| i.path.clone())
}

/// Later fillers cycle through each scene's last image, skipping repeated paths.
fn cycled_sources(scenes: &[Scene]) -> impl Iterator<Item = PathBuf> {
    let mut seen = HashSet::new();
    let paths: Vec<PathBuf> = scenes
        .iter()
        .filter(|s| !s.is_filler)
        .filter_map(|s| s.last_image())
        .map(|i| i.path.clone())
        .filter(|p| seen.insert(p.clone()))
        .collect();
    paths.into_iter().cycle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourgen_models::{ImageDescriptor, Room};

    fn scene(room: Room, technique: Technique, duration: f64, images: &[&str]) -> Scene {
        Scene {
            id: SceneId::for_room(room, 1),
            room,
            images: images.iter().map(|p| ImageDescriptor::new(*p)).collect(),
            duration,
            technique,
            description: String::new(),
            focus_points: Vec::new(),
            is_filler: false,
        }
    }

    #[test]
    fn test_scale_respects_bounds() {
        let options = PlannerOptions::default();
        let mut scenes = vec![
            scene(Room::Exterior, Technique::AiSynthesis, 8.0, &["a"]),
            scene(Room::Entry, Technique::PanZoom, 6.0, &["b"]),
        ];
        scale_to(&mut scenes, 28.0, &options);

        assert_eq!(scenes[0].duration, 8.0);
        assert!((scenes[1].duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_settle_fills_headroom() {
        let options = PlannerOptions::default();
        let mut scenes = vec![
            scene(Room::Exterior, Technique::AiSynthesis, 8.0, &["a"]),
            scene(Room::Entry, Technique::PanZoom, 5.0, &["b"]),
            scene(Room::Living, Technique::PanZoom, 9.0, &["c"]),
        ];
        settle(&mut scenes, 25.0, &options);

        assert_eq!(scenes[0].duration, 8.0);
        assert!((total(&scenes) - 25.0).abs() < SETTLE_EPSILON);
        assert!(scenes.iter().all(|s| options.bounds_for(s.technique).contains(s.duration)));
    }

    #[test]
    fn test_settle_shrinks_overshoot() {
        let options = PlannerOptions::default();
        let mut scenes = vec![
            scene(Room::Exterior, Technique::AiSynthesis, 4.0, &["a"]),
            scene(Room::Entry, Technique::PanZoom, 6.0, &["b"]),
        ];
        settle(&mut scenes, 8.0, &options);

        assert_eq!(scenes[0].duration, 4.0);
        assert!((scenes[1].duration - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_fillers_cover_shortfall() {
        let options = PlannerOptions::default();
        let mut scenes = vec![
            scene(Room::Exterior, Technique::AiSynthesis, 8.0, &["x1"]),
            scene(Room::Kitchen, Technique::AiSynthesis, 8.0, &["k1", "k2"]),
        ];
        let added = insert_fillers(&mut scenes, 30.0, &options);

        // 16s of content: 6s from the multi-image scene, then 6s and a 3s minimum from the cycle
        assert_eq!(added, 3);
        let fillers: Vec<&Scene> = scenes.iter().filter(|s| s.is_filler).collect();
        assert_eq!(fillers[0].images[0].path, PathBuf::from("k2"));
        assert_eq!(fillers[0].duration, 6.0);
        assert_eq!(fillers[0].technique, Technique::PanZoom);
        assert_eq!(fillers[1].images[0].path, PathBuf::from("x1"));
        assert_eq!(fillers[2].images[0].path, PathBuf::from("k2"));
        assert_eq!(fillers[2].duration, 3.0);
        assert_eq!(fillers[2].id.as_str(), "filler-3");
        assert!(total(&scenes) >= 30.0 * FILLER_COVERAGE);
    }

    #[test]
    fn test_no_filler_for_small_shortfall() {
        let options = PlannerOptions::default();
        let mut scenes = vec![scene(Room::Exterior, Technique::AiSynthesis, 8.0, &["x1"])];
        assert_eq!(insert_fillers(&mut scenes, 8.3, &options), 0);
        assert_eq!(scenes.len(), 1);
    }
}
