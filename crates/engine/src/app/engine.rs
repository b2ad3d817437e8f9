use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use winit::keyboard::KeyCode;

use super::collision::{resolve_collisions, CollisionReport, Space};
use super::entity::Entity;
use super::events::{
    Event, EventBus, EventError, HandlerError, HandlerId, MouseDownEvent, MouseMoveEvent,
    UpdateEvent,
};
use super::input::clip_pointer;
use super::render_graph::{reconcile, ReconcileReport};
use super::rendering::{Color, RenderBackend, RenderError, RenderPass, Viewport};
use super::shapes::Rectangle;
use super::world::World;
use crate::math::{Vec2, Vec3};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// How ticks are scheduled by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    FixedInterval(Duration),
    /// One tick per presented frame.
    PerFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub tick_mode: TickMode,
    pub viewport: Viewport,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_mode: TickMode::FixedInterval(DEFAULT_TICK_INTERVAL),
            viewport: Viewport::default(),
        }
    }
}

impl EngineConfig {
    pub fn per_frame(viewport: Viewport) -> Self {
        Self {
            tick_mode: TickMode::PerFrame,
            viewport,
        }
    }
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("tick aborted: {0}")]
    Handler(#[from] EventError),
    #[error("tick aborted: {0}")]
    Present(#[from] RenderError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub drawn: usize,
    pub draw_failures: usize,
    pub reconciled: ReconcileReport,
    pub collisions: CollisionReport,
}

/// The tick driver. Owns the world, the event bus and the render backend;
/// one instance per running game.
pub struct Engine<V: Space> {
    config: EngineConfig,
    bus: EventBus<V>,
    world: World<V>,
    backend: Box<dyn RenderBackend<V>>,
    background: Option<Box<dyn Entity<V>>>,
    alive: bool,
    last_tick: Instant,
}

pub type Engine2D = Engine<Vec2>;
pub type Engine3D = Engine<Vec3>;

impl Engine<Vec2> {
    /// Flat engine with a white background covering the viewport.
    pub fn new(config: EngineConfig, backend: Box<dyn RenderBackend<Vec2>>) -> Self {
        let background =
            Rectangle::new(Vec2::new(0.0, 0.0), config.viewport.size()).with_color(Color::WHITE);
        let mut engine = Self::with_backend(config, backend);
        engine.set_background(Some(Box::new(background)));
        engine
    }
}

impl Engine<Vec3> {
    pub fn new(config: EngineConfig, backend: Box<dyn RenderBackend<Vec3>>) -> Self {
        Self::with_backend(config, backend)
    }
}

impl<V: Space> Engine<V> {
    pub fn with_backend(config: EngineConfig, backend: Box<dyn RenderBackend<V>>) -> Self {
        Self {
            config,
            bus: EventBus::default(),
            world: World::new(config.viewport),
            backend,
            background: None,
            alive: true,
            last_tick: Instant::now(),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn world(&self) -> &World<V> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<V> {
        &mut self.world
    }

    pub fn backend(&self) -> &dyn RenderBackend<V> {
        self.backend.as_ref()
    }

    pub fn register_handler<E, F>(&mut self, handler: F) -> HandlerId
    where
        E: Event,
        F: FnMut(&E, &mut World<V>) -> Result<(), HandlerError> + 'static,
    {
        self.bus.register_handler(handler)
    }

    pub fn unregister(&mut self, id: HandlerId) -> bool {
        self.bus.unregister(id)
    }

    pub fn fire_event<E: Event>(&mut self, event: &E) -> Result<(), EventError> {
        self.bus.fire_event(event, &mut self.world)
    }

    /// Drawn before every entity each tick.
    pub fn set_background(&mut self, background: Option<Box<dyn Entity<V>>>) {
        self.background = background;
    }

    /// Restarts elapsed-time measurement at `now`. The run loop calls this
    /// right before the first tick so setup time is not counted.
    pub fn start_clock(&mut self, now: Instant) {
        self.last_tick = now;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn stop(&mut self) {
        if self.alive {
            self.alive = false;
            info!("engine_stopped");
        }
    }

    /// Drops every handler and stops ticking; optionally blanks the screen.
    pub fn disable(&mut self, clear_screen: bool) -> Result<(), RenderError> {
        self.bus.clear();
        self.alive = false;
        info!(clear_screen, "engine_disabled");
        if clear_screen {
            self.backend.canvas().clear();
            self.backend.present(RenderPass::Canvas, &self.world.camera)?;
        }
        Ok(())
    }

    pub fn key_down(&mut self, key: KeyCode) {
        self.world.keys_mut().press(key);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.world.keys_mut().release(key);
    }

    /// Fires immediately. Returns `false` when the point lies outside the
    /// viewport and was dropped.
    pub fn mouse_down(&mut self, x: f32, y: f32) -> Result<bool, EventError> {
        let Some(position) = clip_pointer(self.world.viewport(), x, y) else {
            return Ok(false);
        };
        self.fire_event(&MouseDownEvent { position })?;
        Ok(true)
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) -> Result<bool, EventError> {
        let Some(position) = clip_pointer(self.world.viewport(), x, y) else {
            return Ok(false);
        };
        self.fire_event(&MouseMoveEvent { position })?;
        Ok(true)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.backend.resize(width, height)?;
        self.world.set_viewport(Viewport::new(width, height));
        Ok(())
    }

    pub fn tick(&mut self) -> Result<TickReport, TickError> {
        self.tick_at(Instant::now())
    }

    /// Update, draw, reconcile, present, resolve collisions, stamp elapsed
    /// time. A failing handler aborts the rest of the tick. Ticks after
    /// `stop` do nothing.
    pub fn tick_at(&mut self, now: Instant) -> Result<TickReport, TickError> {
        if !self.alive {
            debug!("tick_skipped");
            return Ok(TickReport::default());
        }

        let update = UpdateEvent {
            delta_time: self.world.delta_time(),
        };
        self.bus.fire_event(&update, &mut self.world)?;

        let mut report = TickReport::default();
        let canvas = self.backend.canvas();
        canvas.clear();
        if let Some(background) = &self.background {
            if let Err(error) = background.draw(canvas) {
                warn!(error = %error, "background_draw_failed");
            }
        }
        for (index, slot) in self.world.registry.entities().iter().enumerate() {
            match slot.entity().draw(canvas) {
                Ok(()) => report.drawn += 1,
                Err(error) => {
                    report.draw_failures += 1;
                    warn!(
                        index,
                        entity = %slot.id(),
                        kind = %slot.entity().kind(),
                        error = %error,
                        "entity_draw_failed"
                    );
                }
            }
        }

        let graph = self.backend.render_graph();
        let layered = graph.is_some();
        report.reconciled = reconcile(&mut self.world.registry, graph);
        if layered {
            self.backend.present(RenderPass::World, &self.world.camera)?;
        }
        self.backend.present(RenderPass::Canvas, &self.world.camera)?;

        report.collisions = resolve_collisions(&mut self.world.registry);

        self.world.set_delta_time(now.saturating_duration_since(self.last_tick));
        self.last_tick = now;
        Ok(report)
    }
}
