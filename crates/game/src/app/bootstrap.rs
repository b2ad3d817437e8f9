use std::env;
use std::path::{Path, PathBuf};

use tick_engine::{LoopConfig, Scene, Vec2};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo::{self, DemoError};

const SCENE_ENV_VAR: &str = "TICK_DEMO_SCENE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) arena: Scene<Vec2>,
}

pub(crate) fn build_app() -> Result<AppWiring, DemoError> {
    init_tracing();
    info!("=== Tick Engine Demo ===");

    let scene_path = resolve_scene_path();
    let arena = demo::load_arena(&scene_path)?;
    info!(
        path = %scene_path.display(),
        scene = arena.name(),
        members = arena.len(),
        "scene_preset_loaded"
    );

    let config = LoopConfig {
        window_title: "Tick Engine Demo".to_string(),
        ..LoopConfig::default()
    };

    Ok(AppWiring { config, arena })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_scene_path() -> PathBuf {
    env::var_os(SCENE_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(default_scene_path)
}

pub(crate) fn default_scene_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("scenes")
        .join("arena.json")
}
