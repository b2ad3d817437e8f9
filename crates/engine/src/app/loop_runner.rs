use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::engine::{Engine2D, EngineConfig, TickError, TickMode};
use super::rendering::Renderer;

pub const TICK_ENV_VAR: &str = "TICK_ENGINE_TICK_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub engine: EngineConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tick Engine".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens a window sized to the configured viewport, lets `setup` register
/// handlers and the first scene, then drives ticks until the window closes
/// or the engine is stopped.
pub fn run_app<F>(config: LoopConfig, setup: F) -> Result<(), AppError>
where
    F: FnOnce(&mut Engine2D),
{
    let viewport = config.engine.viewport;
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(PhysicalSize::new(viewport.width, viewport.height))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    let tick_mode = resolve_tick_mode(config.engine.tick_mode);
    let engine_config = EngineConfig {
        tick_mode,
        viewport: renderer.viewport(),
    };
    let mut engine = Engine2D::new(engine_config, Box::new(renderer));
    setup(&mut engine);

    info!(
        title = config.window_title.as_str(),
        width = engine_config.viewport.width,
        height = engine_config.viewport.height,
        tick_mode = ?tick_mode,
        entity_count = engine.world().registry.len(),
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut next_tick = Instant::now();
    engine.start_clock(next_tick);
    let mut ticks: u64 = 0;
    event_loop.set_control_flow(ControlFlow::WaitUntil(next_tick));

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = engine.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let (x, y) = (position.x as f32, position.y as f32);
                    input_collector.set_cursor_position_px(x, y);
                    if let Err(error) = engine.mouse_move(x, y) {
                        warn!(error = %error, "mouse_move_failed");
                    }
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some((x, y)) = input_collector.handle_mouse_input(button, state) {
                        if let Err(error) = engine.mouse_down(x, y) {
                            warn!(error = %error, "mouse_down_failed");
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    match input_collector.handle_keyboard_input(&event) {
                        Some(KeyTransition::Down(code)) => engine.key_down(code),
                        Some(KeyTransition::Up(code)) => engine.key_up(code),
                        None => {}
                    }
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if tick_mode == TickMode::PerFrame {
                        run_tick(&mut engine, window_target);
                        ticks = ticks.saturating_add(1);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !engine.is_alive() {
                    info!(reason = "engine_stopped", "shutdown_requested");
                    window_target.exit();
                    return;
                }
                match tick_mode {
                    TickMode::FixedInterval(interval) => {
                        let now = Instant::now();
                        if now >= next_tick {
                            run_tick(&mut engine, window_target);
                            ticks = ticks.saturating_add(1);
                            let schedule = schedule_next_tick(next_tick, now, interval);
                            if schedule.skipped > 0 {
                                warn!(skipped = schedule.skipped, "tick_backlog_dropped");
                            }
                            next_tick = schedule.next;
                        }
                        window_target.set_control_flow(ControlFlow::WaitUntil(next_tick));
                    }
                    TickMode::PerFrame => {
                        window_target.set_control_flow(ControlFlow::Poll);
                        window.request_redraw();
                    }
                }
            }
            Event::LoopExiting => {
                info!(ticks, "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn run_tick(engine: &mut Engine2D, window_target: &EventLoopWindowTarget<()>) {
    match engine.tick() {
        Ok(_) => {}
        Err(TickError::Handler(error)) => {
            warn!(error = %error, "tick_failed");
        }
        Err(TickError::Present(error)) => {
            warn!(error = %error, "renderer_draw_failed");
            window_target.exit();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickSchedule {
    next: Instant,
    skipped: u32,
}

/// Keeps ticks on a fixed cadence from `scheduled`. When the loop fell more
/// than one interval behind, the missed slots are dropped instead of replayed.
fn schedule_next_tick(scheduled: Instant, now: Instant, interval: Duration) -> TickSchedule {
    let interval = if interval.is_zero() {
        Duration::from_millis(1)
    } else {
        interval
    };
    let mut next = scheduled + interval;
    let mut skipped = 0u32;
    while next <= now {
        next += interval;
        skipped = skipped.saturating_add(1);
    }
    TickSchedule { next, skipped }
}

fn resolve_tick_mode(configured: TickMode) -> TickMode {
    tick_mode_from_env(configured, env::var(TICK_ENV_VAR))
}

fn tick_mode_from_env(configured: TickMode, value: Result<String, env::VarError>) -> TickMode {
    match value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => TickMode::FixedInterval(Duration::from_millis(ms)),
            Ok(_) => {
                warn!(
                    env_var = TICK_ENV_VAR,
                    value = value.as_str(),
                    "tick interval must be positive; falling back to config"
                );
                configured
            }
            Err(_) => {
                warn!(
                    env_var = TICK_ENV_VAR,
                    value = value.as_str(),
                    "invalid tick interval env var value; falling back to config"
                );
                configured
            }
        },
        Err(env::VarError::NotPresent) => configured,
        Err(err) => {
            warn!(
                env_var = TICK_ENV_VAR,
                error = %err,
                "unable to read tick interval env var; falling back to config"
            );
            configured
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyTransition {
    Down(KeyCode),
    Up(KeyCode),
}

/// Window-side input bookkeeping: the last cursor position and quit
/// requests. Key and pointer changes are forwarded to the engine as they
/// arrive.
#[derive(Debug, Default)]
struct InputCollector {
    cursor_position_px: Option<(f32, f32)>,
    quit_requested: bool,
}

impl InputCollector {
    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some((x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Returns the press position for a left click with a known cursor.
    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) -> Option<(f32, f32)> {
        if button != MouseButton::Left || state != ElementState::Pressed {
            return None;
        }
        self.cursor_position_px
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) -> Option<KeyTransition> {
        self.handle_physical_key(key_event.physical_key, key_event.state, key_event.repeat)
    }

    fn handle_physical_key(
        &mut self,
        key: PhysicalKey,
        state: ElementState,
        repeat: bool,
    ) -> Option<KeyTransition> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        if code == KeyCode::Escape && state == ElementState::Pressed {
            self.quit_requested = true;
        }
        match state {
            ElementState::Pressed if repeat => None,
            ElementState::Pressed => Some(KeyTransition::Down(code)),
            ElementState::Released => Some(KeyTransition::Up(code)),
        }
    }
}
