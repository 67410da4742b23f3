//! Quality warnings for finished plans.

use std::fmt;

use tourgen_models::{Room, SceneId, ScenePlan, Technique};

use crate::options::PlannerOptions;

/// Allowed deviation of the plan total from the target.
pub const TOTAL_TOLERANCE: f64 = 0.10;

/// A non-fatal problem with a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanWarning {
    TotalOutOfTolerance { total: f64, target: f64 },
    TooManyAiScenes { count: u32, cap: usize },
    DurationOutOfBounds {
        scene_id: SceneId,
        technique: Technique,
        duration: f64,
    },
    FillersPresent { count: usize },
    NoExterior,
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::TotalOutOfTolerance { total, target } => write!(
                f,
                "total duration {:.1}s is outside ±{:.0}% of the {:.1}s target",
                total,
                TOTAL_TOLERANCE * 100.0,
                target
            ),
            PlanWarning::TooManyAiScenes { count, cap } => {
                write!(f, "{} AI scenes exceed the cap of {}", count, cap)
            }
            PlanWarning::DurationOutOfBounds {
                scene_id,
                technique,
                duration,
            } => write!(
                f,
                "scene {} lasts {:.2}s, outside the {} bounds",
                scene_id, duration, technique
            ),
            PlanWarning::FillersPresent { count } => {
                write!(f, "{} filler scene(s) were added to reach the target", count)
            }
            PlanWarning::NoExterior => write!(f, "plan has no exterior scene"),
        }
    }
}

/// Inspect a plan and report quality issues.
pub fn validate_plan(plan: &ScenePlan, options: &PlannerOptions) -> Vec<PlanWarning> {
    let mut warnings = Vec::new();

    if (plan.total_duration - plan.target_seconds).abs() > plan.target_seconds * TOTAL_TOLERANCE {
        warnings.push(PlanWarning::TotalOutOfTolerance {
            total: plan.total_duration,
            target: plan.target_seconds,
        });
    }

    if plan.ai_synthesis_count as usize > options.max_ai_segments {
        warnings.push(PlanWarning::TooManyAiScenes {
            count: plan.ai_synthesis_count,
            cap: options.max_ai_segments,
        });
    }

    for scene in &plan.scenes {
        if !options.bounds_for(scene.technique).contains(scene.duration) {
            warnings.push(PlanWarning::DurationOutOfBounds {
                scene_id: scene.id.clone(),
                technique: scene.technique,
                duration: scene.duration,
            });
        }
    }

    let fillers = plan.filler_count();
    if fillers > 0 {
        warnings.push(PlanWarning::FillersPresent { count: fillers });
    }

    if !plan.scenes.iter().any(|s| s.room == Room::Exterior) {
        warnings.push(PlanWarning::NoExterior);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourgen_models::{ImageDescriptor, Scene};

    fn scene(room: Room, technique: Technique, duration: f64, is_filler: bool) -> Scene {
        Scene {
            id: SceneId::for_room(room, 1),
            room,
            images: vec![ImageDescriptor::new("a.jpg")],
            duration,
            technique,
            description: String::new(),
            focus_points: Vec::new(),
            is_filler,
        }
    }

    #[test]
    fn test_clean_plan() {
        let plan = ScenePlan::from_scenes(
            vec![
                scene(Room::Exterior, Technique::AiSynthesis, 6.0, false),
                scene(Room::Kitchen, Technique::PanZoom, 5.0, false),
            ],
            11.5,
            11.0,
        );
        assert!(validate_plan(&plan, &PlannerOptions::default()).is_empty());
    }

    #[test]
    fn test_reports_each_issue() {
        let plan = ScenePlan::from_scenes(
            vec![
                scene(Room::Kitchen, Technique::AiSynthesis, 9.5, false),
                scene(Room::Kitchen, Technique::PanZoom, 3.0, true),
            ],
            30.0,
            29.0,
        );
        let options = PlannerOptions::default().with_max_ai_segments(0);
        let warnings = validate_plan(&plan, &options);

        assert!(warnings.iter().any(|w| matches!(w, PlanWarning::TotalOutOfTolerance { .. })));
        assert!(warnings.iter().any(|w| matches!(w, PlanWarning::TooManyAiScenes { count: 1, cap: 0 })));
        assert!(warnings.iter().any(|w| matches!(w, PlanWarning::DurationOutOfBounds { .. })));
        assert!(warnings.contains(&PlanWarning::FillersPresent { count: 1 }));
        assert!(warnings.contains(&PlanWarning::NoExterior));
    }

    #[test]
    fn test_warning_display() {
        let warning = PlanWarning::TooManyAiScenes { count: 16, cap: 15 };
        assert_eq!(warning.to_string(), "16 AI scenes exceed the cap of 15");
    }
}
