//! Static per-room shot descriptions and focus tags.

use tourgen_models::Room;

/// Description for the `index`-th (0-based) sub-scene of a room, cycling through the table.
pub fn scene_description(room: Room, index: usize) -> &'static str {
    let table = descriptions(room);
    table[index % table.len()]
}

/// What the camera should dwell on in a room.
pub fn focus_points(room: Room) -> Vec<String> {
    let tags: &[&str] = match room {
        Room::Exterior => &["facade", "entrance", "landscaping"],
        Room::Entry => &["doorway", "flooring", "sightlines"],
        Room::Living => &["seating", "windows", "natural_light"],
        Room::Kitchen => &["countertops", "appliances", "island"],
        Room::Bedroom => &["bed", "windows", "closet"],
        Room::Bathroom => &["vanity", "shower", "fixtures"],
        Room::Backyard => &["lawn", "patio", "outdoor_living"],
        Room::Unknown => &["layout", "natural_light"],
    };
    tags.iter().map(|t| t.to_string()).collect()
}

/// Description for a filler scene revisiting a room.
pub fn filler_description(room: Room) -> String {
    format!("Another look at the {}", room.display_name().to_lowercase())
}

fn descriptions(room: Room) -> &'static [&'static str] {
    match room {
        Room::Exterior => &[
            "Curb appeal and front facade",
            "Approach to the front entrance",
            "Exterior architecture and landscaping",
        ],
        Room::Entry => &[
            "Welcoming entryway",
            "Foyer leading into the home",
            "Hallway connecting the main rooms",
        ],
        Room::Living => &[
            "Spacious living area",
            "Light-filled seating area",
            "Open living space flowing through the home",
        ],
        Room::Kitchen => &[
            "Modern kitchen with ample counter space",
            "Kitchen appliances and cabinetry",
            "Dining nook and kitchen island",
        ],
        Room::Bedroom => &[
            "Comfortable bedroom retreat",
            "Bedroom with generous natural light",
            "Additional bedroom space",
        ],
        Room::Bathroom => &[
            "Well-appointed bathroom",
            "Vanity and bathroom fixtures",
            "Shower and bath area",
        ],
        Room::Backyard => &[
            "Private backyard",
            "Outdoor living and entertaining space",
            "Garden and yard views",
        ],
        Room::Unknown => &["Interior view", "Additional interior space"],
    }
}
