mod canvas;
mod renderer;

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use super::entity::EntityId;
use super::render_graph::{RenderGraph, SceneGraph};
use crate::math::{Vec2, Vector};

pub use canvas::{Canvas, Color, FrameCanvas};
pub use renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bounds are inclusive: a point on the far edge is still inside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.width as f32 && y <= self.height as f32
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1000, 500)
    }
}

/// Position and orientation handed to the renderer with every present.
/// Rotation is in radians per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera<V> {
    position: V,
    rotation: V,
}

impl<V: Vector> Default for Camera<V> {
    fn default() -> Self {
        Self {
            position: V::ZERO,
            rotation: V::ZERO,
        }
    }
}

impl<V: Vector> Camera<V> {
    pub fn position(&self) -> V {
        self.position
    }

    pub fn set_position(&mut self, position: V) {
        self.position = position;
    }

    pub fn translate_by(&mut self, delta: V) {
        self.position = self.position + delta;
    }

    pub fn rotation(&self) -> V {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: V) {
        self.rotation = rotation;
    }

    pub fn rotate_by(&mut self, delta: V) {
        self.rotation = self.rotation + delta;
    }
}

/// What a present call draws: the render graph seen through the camera, or
/// the immediate-mode canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    World,
    Canvas,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
    #[error("failed to resize surface: {0}")]
    Resize(#[source] pixels::Error),
    #[error("backend failure: {0}")]
    Backend(String),
}

/// The drawing target the tick driver talks to.
pub trait RenderBackend<V: Vector> {
    /// Full frame for the flat variant, UI overlay for the layered one.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// `None` when the backend redraws from the registry every tick.
    fn render_graph(&mut self) -> Option<&mut dyn RenderGraph<V>>;

    fn present(&mut self, pass: RenderPass, camera: &Camera<V>) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let _ = (width, height);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PresentLog {
    passes: Vec<RenderPass>,
    last_frame: Option<FrameCanvas>,
    graph_members: Vec<EntityId>,
    fail: bool,
}

/// Read side of a [`HeadlessBackend`]: what has been presented so far.
#[derive(Debug, Clone)]
pub struct PresentProbe(Rc<RefCell<PresentLog>>);

impl PresentProbe {
    pub fn presents(&self) -> Vec<RenderPass> {
        self.0.borrow().passes.clone()
    }

    /// Pixel of the most recently presented canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.0.borrow().last_frame.as_ref()?.pixel(x, y)
    }

    /// Render graph members as of the most recent world present.
    pub fn graph_members(&self) -> Vec<EntityId> {
        self.0.borrow().graph_members.clone()
    }

    /// Makes every following present fail.
    pub fn fail_presents(&self) {
        self.0.borrow_mut().fail = true;
    }
}

/// Window-less backend. Keeps the canvas and, for the layered variant, an
/// in-memory render graph; every present is recorded for its probe.
#[derive(Debug)]
pub struct HeadlessBackend {
    canvas: FrameCanvas,
    graph: Option<SceneGraph>,
    log: Rc<RefCell<PresentLog>>,
}

impl HeadlessBackend {
    pub fn flat(viewport: Viewport) -> Self {
        Self {
            canvas: FrameCanvas::new(viewport.width, viewport.height),
            graph: None,
            log: Rc::default(),
        }
    }

    pub fn layered(viewport: Viewport) -> Self {
        Self {
            graph: Some(SceneGraph::default()),
            ..Self::flat(viewport)
        }
    }

    pub fn probe(&self) -> PresentProbe {
        PresentProbe(Rc::clone(&self.log))
    }

    pub fn frame(&self) -> &FrameCanvas {
        &self.canvas
    }

    pub fn scene_graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }
}

impl<V: Vector> RenderBackend<V> for HeadlessBackend {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn render_graph(&mut self) -> Option<&mut dyn RenderGraph<V>> {
        self.graph
            .as_mut()
            .map(|graph| graph as &mut dyn RenderGraph<V>)
    }

    fn present(&mut self, pass: RenderPass, _camera: &Camera<V>) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            return Err(RenderError::Backend("present disabled".to_string()));
        }
        log.passes.push(pass);
        match pass {
            RenderPass::Canvas => log.last_frame = Some(self.canvas.clone()),
            RenderPass::World => {
                log.graph_members = self
                    .graph
                    .as_ref()
                    .map(|graph| RenderGraph::<V>::members(graph))
                    .unwrap_or_default();
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.canvas.resize(width, height);
        Ok(())
    }
}
