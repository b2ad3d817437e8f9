use std::time::Duration;

use winit::keyboard::KeyCode;

use super::input::KeyState;
use super::registry::EntityRegistry;
use super::rendering::{Camera, Viewport};
use super::scene::{Scene, SceneManager, SceneSwapReport};
use crate::math::Vector;

/// Everything event handlers may touch: one instance per running engine.
#[derive(Debug)]
pub struct World<V: Vector> {
    pub registry: EntityRegistry<V>,
    pub scenes: SceneManager<V>,
    pub camera: Camera<V>,
    keys: KeyState,
    viewport: Viewport,
    delta_time: Duration,
}

impl<V: Vector> World<V> {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            registry: EntityRegistry::default(),
            scenes: SceneManager::default(),
            camera: Camera::default(),
            keys: KeyState::default(),
            viewport,
            delta_time: Duration::ZERO,
        }
    }

    pub fn set_scene(&mut self, scene: Scene<V>, reset: bool) -> SceneSwapReport {
        self.scenes.set_scene(&mut self.registry, scene, reset)
    }

    pub fn reload_scene(&mut self, reset: bool) -> Option<SceneSwapReport> {
        self.scenes.reload_scene(&mut self.registry, reset)
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.is_down(key)
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub(crate) fn keys_mut(&mut self) -> &mut KeyState {
        &mut self.keys
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Elapsed time of the previous tick.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    pub(crate) fn set_delta_time(&mut self, delta_time: Duration) {
        self.delta_time = delta_time;
    }
}
