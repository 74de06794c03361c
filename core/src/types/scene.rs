//! Typed scene records mapped from the engine object grammar.

use indexmap::IndexMap;
use serde::Serialize;

/// Position in tile units as written in the scene file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

/// Facing directions the engine is known to use.
///
/// Scene records keep the raw string; use [`Direction::parse`] to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LEFT" => Some(Direction::Left),
            "RIGHT" => Some(Direction::Right),
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            "UP_LEFT" => Some(Direction::UpLeft),
            "UP_RIGHT" => Some(Direction::UpRight),
            "DOWN_LEFT" => Some(Direction::DownLeft),
            "DOWN_RIGHT" => Some(Direction::DownRight),
            _ => None,
        }
    }
}

/// NPC route behaviours seen in scene files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteType {
    Stay,
    RandomRadius,
    StayRotate,
    MovedFlip,
    Moved,
    Random,
}

impl RouteType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "STAY" => Some(RouteType::Stay),
            "RANDOM_RADIUS" => Some(RouteType::RandomRadius),
            "STAY_ROTATE" => Some(RouteType::StayRotate),
            "MOVED_FLIP" => Some(RouteType::MovedFlip),
            "MOVED" => Some(RouteType::Moved),
            "RANDOM" => Some(RouteType::Random),
            _ => None,
        }
    }
}

pub const DEFAULT_DIRECTION: &str = "DOWN";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub position: TilePosition,
    /// Raw facing direction, `"DOWN"` when absent.
    pub direction: String,
    pub literary_name: Option<i32>,
    pub route_type: Option<String>,
    pub route: Option<String>,
    pub radius: Option<f64>,
    pub delay_min: Option<f64>,
    pub delay_max: Option<f64>,
    pub tribe: Option<String>,
    pub script_dialog: Option<String>,
    pub script_inventory: Option<String>,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            position: TilePosition::default(),
            direction: DEFAULT_DIRECTION.to_string(),
            literary_name: None,
            route_type: None,
            route: None,
            radius: None,
            delay_min: None,
            delay_max: None,
            tribe: None,
            script_dialog: None,
            script_inventory: None,
        }
    }
}

impl Person {
    pub fn facing(&self) -> Option<Direction> {
        Direction::parse(&self.direction)
    }

    pub fn route_kind(&self) -> Option<RouteType> {
        self.route_type.as_deref().and_then(RouteType::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrancePoint {
    pub direction: String,
    pub position: TilePosition,
}

impl Default for EntrancePoint {
    fn default() -> Self {
        Self {
            direction: DEFAULT_DIRECTION.to_string(),
            position: TilePosition::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneDoor {
    pub cells_name: String,
    /// String table id, -1 when absent.
    pub literary_name_closed: i32,
    pub literary_name_opened: i32,
    pub is_opened: Option<bool>,
}

impl Default for SceneDoor {
    fn default() -> Self {
        Self {
            cells_name: String::new(),
            literary_name_closed: -1,
            literary_name_opened: -1,
            is_opened: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trigger {
    pub literary_name: Option<i32>,
    pub cursor_name: Option<String>,
    pub script_name: Option<String>,
    pub inventory_name: Option<String>,
    pub cells_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_visible: Option<bool>,
    pub is_transition: Option<bool>,
}

/// Per-level placement data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneDescriptor {
    pub version: Option<f64>,
    /// Lower-cased level pack name.
    pub pack: String,
    pub internal_location: bool,
    pub exit_to_global_map: bool,
    pub weather: Option<f64>,
    pub persons: IndexMap<String, Person>,
    pub doors: IndexMap<String, SceneDoor>,
    pub entrance_points: IndexMap<String, EntrancePoint>,
    pub cell_groups: IndexMap<String, Vec<TilePosition>>,
    pub triggers: IndexMap<String, Trigger>,
}
