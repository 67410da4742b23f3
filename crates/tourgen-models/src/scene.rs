//! Scenes and scene plans.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{ImageDescriptor, Room};

/// Stable identifier of a scene within a plan (e.g. `kitchen-2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    /// Identifier for the `index`-th (1-based) scene of a room.
    pub fn for_room(room: Room, index: usize) -> Self {
        Self(format!("{}-{}", room.as_str(), index))
    }

    /// Identifier for the `index`-th (1-based) filler scene.
    pub fn filler(index: usize) -> Self {
        Self(format!("filler-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a scene's video segment is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Camera motion synthesized by the external video model
    AiSynthesis,
    /// Local Ken Burns style zoom and pan over the still
    #[default]
    PanZoom,
}

impl Technique {
    pub const ALL: &'static [Technique] = &[Technique::AiSynthesis, Technique::PanZoom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::AiSynthesis => "ai_synthesis",
            Technique::PanZoom => "pan_zoom",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Technique {
    type Err = TechniqueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ai_synthesis" => Ok(Technique::AiSynthesis),
            "pan_zoom" => Ok(Technique::PanZoom),
            _ => Err(TechniqueParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown technique: {0}")]
pub struct TechniqueParseError(String);

/// A contiguous stretch of the tour showing one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub id: SceneId,

    pub room: Room,

    /// Images in display order; never empty
    pub images: Vec<ImageDescriptor>,

    /// Planned duration in seconds
    pub duration: f64,

    pub technique: Technique,

    /// Short narration-friendly description of the shot
    pub description: String,

    /// Tags describing what the camera should dwell on
    #[serde(default)]
    pub focus_points: Vec<String>,

    /// Added to pad a short plan rather than derived from a room bucket
    #[serde(default)]
    pub is_filler: bool,
}

impl Scene {
    /// First image of the scene, used as the render source.
    pub fn primary_image(&self) -> Option<&ImageDescriptor> {
        self.images.first()
    }

    pub fn last_image(&self) -> Option<&ImageDescriptor> {
        self.images.last()
    }

    pub fn is_ai(&self) -> bool {
        self.technique == Technique::AiSynthesis
    }
}

/// The ordered output of scene planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenePlan {
    pub scenes: Vec<Scene>,

    /// Sum of scene durations in seconds
    pub total_duration: f64,

    pub ai_synthesis_count: u32,

    pub pan_zoom_count: u32,

    /// Requested tour length in seconds
    pub target_seconds: f64,

    /// Content time left after reserving transition overlap
    pub available_seconds: f64,
}

impl ScenePlan {
    /// Build a plan, deriving the aggregates from the scenes.
    pub fn from_scenes(scenes: Vec<Scene>, target_seconds: f64, available_seconds: f64) -> Self {
        let total_duration = scenes.iter().map(|s| s.duration).sum();
        let ai_synthesis_count = scenes.iter().filter(|s| s.is_ai()).count() as u32;
        let pan_zoom_count = scenes.len() as u32 - ai_synthesis_count;

        Self {
            scenes,
            total_duration,
            ai_synthesis_count,
            pan_zoom_count,
            target_seconds,
            available_seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn filler_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.is_filler).count()
    }

    /// Images across all non-filler scenes, in plan order.
    pub fn source_images(&self) -> impl Iterator<Item = &ImageDescriptor> {
        self.scenes
            .iter()
            .filter(|s| !s.is_filler)
            .flat_map(|s| s.images.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, technique: Technique, duration: f64, is_filler: bool) -> Scene {
        Scene {
            id: SceneId(id.to_string()),
            room: Room::Living,
            images: vec![ImageDescriptor::new(format!("{}.jpg", id))],
            duration,
            technique,
            description: String::new(),
            focus_points: Vec::new(),
            is_filler,
        }
    }

    #[test]
    fn test_technique_parse() {
        assert_eq!("pan_zoom".parse::<Technique>().unwrap(), Technique::PanZoom);
        assert_eq!(
            "AI_SYNTHESIS".parse::<Technique>().unwrap(),
            Technique::AiSynthesis
        );
        assert!("morph".parse::<Technique>().is_err());
    }

    #[test]
    fn test_scene_id_format() {
        assert_eq!(SceneId::for_room(Room::Kitchen, 2).as_str(), "kitchen-2");
        assert_eq!(SceneId::filler(1).to_string(), "filler-1");
    }

    #[test]
    fn test_plan_aggregates() {
        let plan = ScenePlan::from_scenes(
            vec![
                scene("a", Technique::AiSynthesis, 6.0, false),
                scene("b", Technique::PanZoom, 4.5, false),
                scene("c", Technique::PanZoom, 3.0, true),
            ],
            15.0,
            13.5,
        );

        assert_eq!(plan.len(), 3);
        assert!((plan.total_duration - 13.5).abs() < 1e-9);
        assert_eq!(plan.ai_synthesis_count, 1);
        assert_eq!(plan.pan_zoom_count, 2);
        assert_eq!(plan.filler_count(), 1);
        assert_eq!(plan.source_images().count(), 2);
    }
}
