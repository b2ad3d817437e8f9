pub mod collision;
mod engine;
mod entity;
mod events;
mod input;
mod loop_runner;
mod registry;
mod render_graph;
mod rendering;
mod scene;
mod shapes;
mod world;

pub use collision::{resolve_collisions, BoxCollider, Collider, CollisionReport, RayMeshCollider, Space};
pub use engine::{
    Engine, Engine2D, Engine3D, EngineConfig, TickError, TickMode, TickReport,
    DEFAULT_TICK_INTERVAL,
};
pub use entity::{DrawError, Entity, EntityId, EntityKind};
pub use events::{
    Event, EventBus, EventError, HandlerError, HandlerId, MouseDownEvent, MouseMoveEvent,
    UpdateEvent,
};
pub use input::{clip_pointer, KeyState};
pub use loop_runner::{run_app, AppError, LoopConfig, TICK_ENV_VAR};
pub use registry::{EntityIdAllocator, EntityRegistry, EntitySlot};
pub use render_graph::{reconcile, ReconcileReport, RenderGraph, RenderLedger, SceneGraph, SceneNode};
pub use rendering::{
    Camera, Canvas, Color, FrameCanvas, HeadlessBackend, PresentProbe, RenderBackend, RenderError,
    RenderPass, Renderer, Viewport,
};
pub use scene::{
    PresetEntity, PresetShape, Scene, SceneManager, SceneMember, ScenePreset, ScenePresetError,
    SceneSwapReport,
};
pub use shapes::{Cuboid, Ellipse, Line, Prefab, Rectangle};
pub use world::World;
