use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::debug;
use winit::window::Window;

use super::{Camera, Canvas, FrameCanvas, RenderBackend, RenderError, RenderPass, Viewport};
use crate::app::render_graph::RenderGraph;
use crate::math::Vec2;

/// Window-backed flat renderer: entities paint into a software canvas that
/// is blitted to a `pixels` surface on present.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    canvas: FrameCanvas,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            canvas: FrameCanvas::new(size.width, size.height),
            viewport: Viewport::new(size.width, size.height),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}

impl RenderBackend<Vec2> for Renderer {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn render_graph(&mut self) -> Option<&mut dyn RenderGraph<Vec2>> {
        None
    }

    fn present(&mut self, pass: RenderPass, _camera: &Camera<Vec2>) -> Result<(), RenderError> {
        if pass == RenderPass::World {
            return Ok(());
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let frame = self.pixels.frame_mut();
        let source = self.canvas.pixels();
        let len = frame.len().min(source.len());
        frame[..len].copy_from_slice(&source[..len]);
        self.pixels.render().map_err(RenderError::Present)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)
            .map_err(RenderError::Resize)?;
        self.canvas.resize(width, height);
        self.viewport = Viewport::new(width, height);
        debug!(width, height, "renderer_resized");
        Ok(())
    }
}
