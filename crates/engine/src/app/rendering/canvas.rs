use serde::{Deserialize, Serialize};

use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const RED: Color = Color([255, 0, 0, 255]);
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const BLUE: Color = Color([0, 0, 255, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub fn rgba(self) -> [u8; 4] {
        self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

/// Immediate-mode 2D drawing target. Used as the whole frame by the flat
/// variant and as the UI overlay by the layered variant.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color);
    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color);
}

/// Software RGBA canvas, row-major, 4 bytes per pixel.
#[derive(Debug, Clone)]
pub struct FrameCanvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.rgba = vec![0; width as usize * height as usize * 4];
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    fn write_pixel_clipped(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let [_, _, _, alpha] = color.rgba();
        if alpha == 0 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset..offset + 4].copy_from_slice(&color.rgba());
    }
}

impl Canvas for FrameCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.rgba.fill(0);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        let left = origin.x.round() as i32;
        let top = origin.y.round() as i32;
        let right = (origin.x + size.x).round() as i32;
        let bottom = (origin.y + size.y).round() as i32;
        for y in top.max(0)..bottom.min(self.height as i32) {
            for x in left.max(0)..right.min(self.width as i32) {
                self.write_pixel_clipped(x, y, color);
            }
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        let top = (center.y - radii.y).floor() as i32;
        let bottom = (center.y + radii.y).ceil() as i32;
        let left = (center.x - radii.x).floor() as i32;
        let right = (center.x + radii.x).ceil() as i32;
        for y in top.max(0)..=bottom.min(self.height as i32 - 1) {
            for x in left.max(0)..=right.min(self.width as i32 - 1) {
                let dx = (x as f32 + 0.5 - center.x) / radii.x;
                let dy = (y as f32 + 0.5 - center.y) / radii.y;
                if dx * dx + dy * dy <= 1.0 {
                    self.write_pixel_clipped(x, y, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let max = (f64::from(self.width - 1), f64::from(self.height - 1));
        let Some((start, end)) = clip_segment(from, to, max) else {
            return;
        };

        let (mut x0, mut y0) = (start.0.round() as i64, start.1.round() as i64);
        let (x1, y1) = (end.0.round() as i64, end.1.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            // Clipped endpoints keep every step inside the canvas.
            self.write_pixel_clipped(x0 as i32, y0 as i32, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x0 += step_x;
            }
            if doubled <= dx {
                error += dx;
                y0 += step_y;
            }
        }
    }
}

/// Liang-Barsky clip of `from -> to` against `[0, max.0] x [0, max.1]`.
/// Returns `None` when no part of the segment is visible.
fn clip_segment(from: Vec2, to: Vec2, max: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (x1, y1) = (f64::from(to.x), f64::from(to.y));
    if ![x0, y0, x1, y1].iter().all(|value| value.is_finite()) {
        return None;
    }

    let (dx, dy) = (x1 - x0, y1 - y0);
    let edges = [(-dx, x0), (dx, max.0 - x0), (-dy, y0), (dy, max.1 - y0)];
    let (mut enter, mut leave) = (0.0_f64, 1.0_f64);
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            leave = leave.min(t);
        }
        if enter > leave {
            return None;
        }
    }

    let clamp = |value: f64, limit: f64| value.clamp(0.0, limit);
    Some((
        (clamp(x0 + enter * dx, max.0), clamp(y0 + enter * dy, max.1)),
        (clamp(x0 + leave * dx, max.0), clamp(y0 + leave * dy, max.1)),
    ))
}
