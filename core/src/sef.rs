//! Scene descriptor (.sef) mapping.
//!
//! Fields are taken from the [`EngineObject`] tree only when they hold the
//! expected variant; anything else is left at its default. Direction and route
//! strings are kept as written.

use indexmap::IndexMap;

use crate::engine_object::{parse_engine_object, EngineObject, Value};
use crate::types::{EntrancePoint, Person, SceneDescriptor, SceneDoor, TilePosition, Trigger};

/// Parses scene text and maps it in one go.
pub fn parse_scene(text: &str) -> SceneDescriptor {
    map_scene(&parse_engine_object(text))
}

pub fn map_scene(raw: &EngineObject) -> SceneDescriptor {
    let scene = SceneDescriptor {
        version: number(raw, "version"),
        pack: text(raw, "pack").map(str::to_lowercase).unwrap_or_default(),
        internal_location: number(raw, "internal_location") == Some(1.0),
        exit_to_global_map: number(raw, "exit_to_globalmap") == Some(1.0),
        weather: number(raw, "weather"),
        persons: map_entries(raw, "persons", map_person),
        doors: map_entries(raw, "doors", map_door),
        entrance_points: map_entries(raw, "points_entrance", map_entrance_point),
        cell_groups: map_entries(raw, "cell_groups", map_cell_group),
        triggers: map_entries(raw, "triggers", map_trigger),
    };

    log::debug!(
        "scene for pack '{}': {} persons, {} doors, {} entrance points, {} cell groups, {} triggers",
        scene.pack,
        scene.persons.len(),
        scene.doors.len(),
        scene.entrance_points.len(),
        scene.cell_groups.len(),
        scene.triggers.len()
    );
    scene
}

fn number(raw: &EngineObject, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_number)
}

fn text<'a>(raw: &'a EngineObject, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_text)
}

fn owned_text(raw: &EngineObject, key: &str) -> Option<String> {
    text(raw, key).map(str::to_string)
}

fn id(raw: &EngineObject, key: &str) -> Option<i32> {
    number(raw, key).map(|n| n as i32)
}

fn flag(raw: &EngineObject, key: &str) -> Option<bool> {
    number(raw, key).map(|n| n != 0.0)
}

fn pair(value: &Value) -> Option<TilePosition> {
    match value.as_numbers()? {
        [x, y] => Some(TilePosition {
            x: *x as i32,
            y: *y as i32,
        }),
        _ => None,
    }
}

fn position(raw: &EngineObject) -> Option<TilePosition> {
    raw.get("position").and_then(pair)
}

/// Maps every map-valued entry of the sub-mapping `key`.
fn map_entries<T>(
    raw: &EngineObject,
    key: &str,
    map: impl Fn(&EngineObject) -> T,
) -> IndexMap<String, T> {
    let Some(entries) = raw.get(key).and_then(Value::as_map) else {
        return IndexMap::new();
    };
    entries
        .iter()
        .filter_map(|(name, value)| value.as_map().map(|entry| (name.clone(), map(entry))))
        .collect()
}

fn map_person(raw: &EngineObject) -> Person {
    let mut person = Person::default();
    if let Some(position) = position(raw) {
        person.position = position;
    }
    if let Some(direction) = text(raw, "direction") {
        person.direction = direction.to_string();
    }
    person.literary_name = id(raw, "literary_name");
    person.route_type = owned_text(raw, "route_type");
    person.route = owned_text(raw, "route");
    person.radius = number(raw, "radius");
    person.delay_min = number(raw, "delay_min");
    person.delay_max = number(raw, "delay_max");
    person.tribe = owned_text(raw, "tribe");
    person.script_dialog = owned_text(raw, "scr_dialog");
    person.script_inventory = owned_text(raw, "scr_inv");
    person
}

fn map_entrance_point(raw: &EngineObject) -> EntrancePoint {
    let mut point = EntrancePoint::default();
    if let Some(position) = position(raw) {
        point.position = position;
    }
    if let Some(direction) = text(raw, "direction") {
        point.direction = direction.to_string();
    }
    point
}

/// Cells are stored as `cell_NN: x y` entries; order follows the file.
fn map_cell_group(raw: &EngineObject) -> Vec<TilePosition> {
    raw.values().filter_map(pair).collect()
}

fn map_trigger(raw: &EngineObject) -> Trigger {
    Trigger {
        literary_name: id(raw, "literary_name"),
        cursor_name: owned_text(raw, "cursor_name"),
        script_name: owned_text(raw, "script_name"),
        inventory_name: owned_text(raw, "inv_name"),
        cells_name: owned_text(raw, "cells_name"),
        is_active: flag(raw, "is_active"),
        is_visible: flag(raw, "is_visible"),
        is_transition: flag(raw, "is_transition"),
    }
}

fn map_door(raw: &EngineObject) -> SceneDoor {
    let mut door = SceneDoor::default();
    if let Some(name) = id(raw, "literary_name_close") {
        door.literary_name_closed = name;
    }
    if let Some(name) = id(raw, "literary_name_open") {
        door.literary_name_opened = name;
    }
    if let Some(cells) = text(raw, "cells_name") {
        door.cells_name = cells.to_string();
    }
    door.is_opened = flag(raw, "is_opened");
    door
}
