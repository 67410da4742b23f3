//! Scene planning for property tours.
//!
//! Turns an unordered set of property images into an ordered [`ScenePlan`]:
//! - Images are bucketed by room in walk-through order
//! - Large rooms are split into sub-scenes
//! - A content budget is derived from the target length
//! - The highest-priority scenes get AI synthesis, the rest pan-zoom
//! - Durations are reconciled to the budget, padding with fillers when short
//!
//! Planning is a pure function of its inputs.

pub mod budget;
pub mod descriptions;
pub mod error;
pub mod grouping;
pub mod options;
pub mod reconcile;
pub mod technique;
pub mod validate;

pub use budget::Budget;
pub use error::{PlanError, PlanResult};
pub use options::{DurationBounds, PlannerOptions};
pub use validate::{validate_plan, PlanWarning};

use tourgen_models::{ImageDescriptor, Scene, SceneId, ScenePlan, Technique};
use tracing::{debug, info};

use crate::descriptions::{focus_points, scene_description};
use crate::grouping::{group_by_room, RoomBucket};

/// Plan a tour from a set of images.
pub fn plan_tour(images: &[ImageDescriptor], options: &PlannerOptions) -> PlanResult<ScenePlan> {
    if images.is_empty() {
        return Err(PlanError::insufficient_input("at least one image is required"));
    }
    options.validate()?;

    let buckets = group_by_room(images);
    let budget = Budget::compute(buckets.len(), options);
    debug!(
        rooms = buckets.len(),
        available = budget.available,
        reserve = budget.transition_reserve,
        initial = budget.initial_duration,
        "Computed timing budget"
    );

    let mut scenes = Vec::with_capacity(buckets.iter().map(RoomBucket::default_parts).sum());
    for bucket in &buckets {
        for (i, chunk) in bucket.split(bucket.default_parts()).into_iter().enumerate() {
            scenes.push(Scene {
                id: SceneId::for_room(bucket.room, i + 1),
                room: bucket.room,
                images: chunk,
                duration: budget.initial_duration,
                technique: Technique::PanZoom,
                description: scene_description(bucket.room, i).to_string(),
                focus_points: focus_points(bucket.room),
                is_filler: false,
            });
        }
    }

    technique::assign_techniques(&mut scenes, options);
    reconcile::scale_to(&mut scenes, budget.available, options);
    reconcile::settle(&mut scenes, budget.available, options);

    let fillers = reconcile::insert_fillers(&mut scenes, budget.available, options);
    if fillers > 0 {
        reconcile::settle(&mut scenes, budget.available, options);
    }

    let plan = ScenePlan::from_scenes(scenes, options.target_seconds, budget.available);
    info!(
        scenes = plan.len(),
        total_duration = plan.total_duration,
        ai = plan.ai_synthesis_count,
        pan_zoom = plan.pan_zoom_count,
        fillers,
        "Scene plan ready"
    );

    Ok(plan)
}
