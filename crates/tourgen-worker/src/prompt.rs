//! Camera-motion prompts for AI-synthesized scenes.

use tourgen_models::{Room, Scene};

/// Appended to every prompt.
const STYLE_SUFFIX: &str = "Photorealistic real estate walkthrough, smooth stabilized camera, \
natural lighting, no people, no text or watermarks, keep the architecture unchanged.";

/// Camera move that suits a room.
pub fn camera_motion(room: Room) -> &'static str {
    match room {
        Room::Exterior => "Slow cinematic drone-style push toward the front of the house",
        Room::Entry => "Gentle forward glide through the entryway, as if stepping inside",
        Room::Living => "Smooth lateral dolly across the living room revealing the seating area",
        Room::Kitchen => "Slow push-in across the kitchen, drifting past the counters",
        Room::Bedroom => "Soft pull-back from the bed revealing the whole bedroom",
        Room::Bathroom => "Gentle tilt up from the vanity to the ceiling",
        Room::Backyard => "Wide slow pan across the backyard toward the house",
        Room::Unknown => "Slow steady push-in through the room",
    }
}

/// Build the prompt for a scene.
///
/// `continuing` asks the model to pick up from the previous clip's final frame.
pub fn motion_prompt(scene: &Scene, continuing: bool) -> String {
    let mut prompt = String::new();
    if continuing {
        prompt.push_str("Continue seamlessly from the opening frame. ");
    }
    prompt.push_str(camera_motion(scene.room));
    prompt.push_str(". ");

    let description = scene.description.trim().trim_end_matches('.');
    if !description.is_empty() {
        prompt.push_str(description);
        prompt.push_str(". ");
    }

    if !scene.focus_points.is_empty() {
        prompt.push_str("Highlight ");
        prompt.push_str(&scene.focus_points.join(", "));
        prompt.push_str(". ");
    }

    prompt.push_str(STYLE_SUFFIX);
    prompt
}
