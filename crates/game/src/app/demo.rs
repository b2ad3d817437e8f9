use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tick_engine::app::collision::is_colliding_list;
use tick_engine::{
    BoxCollider, Color, Engine2D, Entity, EntityId, HandlerError, KeyCode, MouseDownEvent,
    Rectangle, Scene, ScenePreset, ScenePresetError, UpdateEvent, Vec2, World,
};
use tracing::{debug, info};

const PLAYER_SPEED_PX_PER_SECOND: f32 = 240.0;
const PLAYER_SPAWN: Vec2 = Vec2::new(100.0, 440.0);
const PLAYER_SIZE: Vec2 = Vec2::new(24.0, 24.0);
const PLAYER_COLOR: Color = Color([220, 40, 40, 255]);
const CRATE_SIZE: f32 = 16.0;
const CRATE_COLOR: Color = Color([140, 90, 40, 255]);
const MAX_CRATES: usize = 32;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error("failed to read scene preset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scene preset {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Preset(#[from] ScenePresetError),
}

pub(crate) fn load_arena(path: &Path) -> Result<Scene<Vec2>, DemoError> {
    let raw = fs::read_to_string(path).map_err(|source| DemoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let preset = parse_preset(path, &raw)?;
    Ok(preset.into_scene_2d()?)
}

fn parse_preset(path: &Path, raw: &str) -> Result<ScenePreset, DemoError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let location = match error.path().to_string() {
            path if path.is_empty() || path == "." => "<root>".to_string(),
            path => path,
        };
        DemoError::Parse {
            path: path.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}

/// Loads the arena, spawns the player and wires the steering and crate
/// dropping handlers.
pub(crate) fn install(engine: &mut Engine2D, arena: Scene<Vec2>) -> EntityId {
    let world = engine.world_mut();
    world.set_scene(arena, true);
    let player = world.registry.add(Box::new(
        Rectangle::new(PLAYER_SPAWN, PLAYER_SIZE).with_color(PLAYER_COLOR),
    ));
    world.registry.set_collision(player, BoxCollider::new());

    engine.register_handler(move |event: &UpdateEvent, world: &mut World<Vec2>| {
        steer_player(player, event, world)
    });
    let mut crates = Vec::new();
    engine.register_handler(move |event: &MouseDownEvent, world: &mut World<Vec2>| {
        drop_crate(event.position, world, &mut crates)
    });

    info!(
        player = %player,
        entity_count = engine.world().registry.len(),
        "demo_installed"
    );
    player
}

fn steer_player(
    player: EntityId,
    event: &UpdateEvent,
    world: &mut World<Vec2>,
) -> Result<(), HandlerError> {
    let direction = input_direction(world);
    if direction == Vec2::default() {
        return Ok(());
    }

    let distance = PLAYER_SPEED_PX_PER_SECOND * event.delta_time.as_secs_f32();
    let entity = world
        .registry
        .get_mut(player)
        .ok_or_else(|| HandlerError::new(format!("player {player} is no longer registered")))?;
    entity.translate_by(Vec2::new(direction.x * distance, direction.y * distance));
    Ok(())
}

fn input_direction(world: &World<Vec2>) -> Vec2 {
    let axis = |negative: KeyCode, positive: KeyCode| {
        match (world.is_key_down(negative), world.is_key_down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    };
    Vec2::new(
        axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
        axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
    )
}

/// Spawns a collidable crate centred on the click. The oldest crate is
/// removed once the cap is reached. Clicks that would place a crate on top
/// of another collidable are ignored; a crate spawned inside the player
/// would roll back every later step.
fn drop_crate(
    position: Vec2,
    world: &mut World<Vec2>,
    crates: &mut Vec<EntityId>,
) -> Result<(), HandlerError> {
    let half = CRATE_SIZE / 2.0;
    let origin = Vec2::new(position.x - half, position.y - half);
    let candidate =
        Rectangle::new(origin, Vec2::new(CRATE_SIZE, CRATE_SIZE)).with_color(CRATE_COLOR);
    let collidables: Vec<&dyn Entity<Vec2>> = world
        .registry
        .entities()
        .iter()
        .filter(|slot| slot.has_collision())
        .map(|slot| slot.entity())
        .collect();
    if is_colliding_list(&candidate, &collidables) {
        debug!(x = position.x, y = position.y, "crate_blocked");
        return Ok(());
    }

    if crates.len() >= MAX_CRATES {
        let oldest = crates.remove(0);
        world.registry.remove(oldest);
    }
    let id = world.registry.add(Box::new(candidate));
    world.registry.set_collision(id, BoxCollider::new());
    crates.push(id);
    debug!(entity = %id, x = position.x, y = position.y, "crate_dropped");
    Ok(())
}
