pub mod app;
pub mod math;

pub use app::{
    reconcile, run_app, AppError, BoxCollider, Camera, Canvas, Collider, CollisionReport, Color,
    Cuboid, DrawError, Ellipse, Engine, Engine2D, Engine3D, EngineConfig, Entity, EntityId,
    EntityKind, EntityRegistry, Event, EventBus, EventError, FrameCanvas, HandlerError, HandlerId,
    HeadlessBackend, Line, LoopConfig, MouseDownEvent, MouseMoveEvent, Prefab, PresentProbe,
    RayMeshCollider, Rectangle, RenderBackend, RenderError, RenderGraph, RenderPass, Renderer,
    Scene, SceneGraph, ScenePreset, ScenePresetError, SceneSwapReport, Space, TickError, TickMode,
    TickReport, UpdateEvent, Viewport, World, DEFAULT_TICK_INTERVAL, TICK_ENV_VAR,
};
pub use math::{Vec2, Vec3, Vector};

/// Keyboard codes used by [`World::is_key_down`].
pub use winit::keyboard::KeyCode;
