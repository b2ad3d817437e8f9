//! Drawable primitives. Flat shapes paint straight onto the canvas; the
//! cuboid contributes a mesh to the render graph and nothing to the overlay.

use super::collision::Mesh;
use super::entity::{DrawError, Entity, EntityKind};
use super::rendering::{Canvas, Color};
use crate::math::{Vec2, Vec3, Vector};

fn require_finite<V: Vector>(kind: EntityKind, field: &'static str, value: V) -> Result<(), DrawError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DrawError::Malformed { kind, field })
    }
}

/// Filled axis-aligned rectangle; `position` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    position: Vec2,
    size: Vec2,
    color: Color,
}

impl Rectangle {
    pub const KIND: EntityKind = EntityKind::new("rectangle");

    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            color: Color::RED,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

impl Entity<Vec2> for Rectangle {
    fn kind(&self) -> EntityKind {
        Self::KIND
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn extent(&self) -> Option<Vec2> {
        Some(self.size)
    }

    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), DrawError> {
        require_finite(Self::KIND, "scale", self.size)?;
        require_finite(Self::KIND, "position", self.position)?;
        canvas.fill_rect(self.position, self.size, self.color);
        Ok(())
    }

    fn clone_entity(&self) -> Box<dyn Entity<Vec2>> {
        Box::new(self.clone())
    }
}

/// Filled ellipse; `position` is the centre. Box collision uses the radii
/// as width and height.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    center: Vec2,
    radii: Vec2,
    color: Color,
}

impl Ellipse {
    pub const KIND: EntityKind = EntityKind::new("ellipse");

    pub fn new(center: Vec2, radii: Vec2) -> Self {
        Self {
            center,
            radii,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn radii(&self) -> Vec2 {
        self.radii
    }

    pub fn set_radii(&mut self, radii: Vec2) {
        self.radii = radii;
    }
}

impl Entity<Vec2> for Ellipse {
    fn kind(&self) -> EntityKind {
        Self::KIND
    }

    fn position(&self) -> Vec2 {
        self.center
    }

    fn set_position(&mut self, position: Vec2) {
        self.center = position;
    }

    fn extent(&self) -> Option<Vec2> {
        Some(self.radii)
    }

    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), DrawError> {
        require_finite(Self::KIND, "radius", self.radii)?;
        require_finite(Self::KIND, "position", self.center)?;
        canvas.fill_ellipse(self.center, self.radii, self.color);
        Ok(())
    }

    fn clone_entity(&self) -> Box<dyn Entity<Vec2>> {
        Box::new(self.clone())
    }
}

/// Segment between two points. Moving it moves both ends; it has no box.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    from: Vec2,
    to: Vec2,
    color: Color,
}

impl Line {
    pub const KIND: EntityKind = EntityKind::new("line");

    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            from,
            to,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn end(&self) -> Vec2 {
        self.to
    }
}

impl Entity<Vec2> for Line {
    fn kind(&self) -> EntityKind {
        Self::KIND
    }

    fn position(&self) -> Vec2 {
        self.from
    }

    fn set_position(&mut self, position: Vec2) {
        let offset = self.to - self.from;
        self.from = position;
        self.to = position + offset;
    }

    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), DrawError> {
        require_finite(Self::KIND, "start", self.from)?;
        require_finite(Self::KIND, "end", self.to)?;
        canvas.stroke_line(self.from, self.to, self.color);
        Ok(())
    }

    fn clone_entity(&self) -> Box<dyn Entity<Vec2>> {
        Box::new(self.clone())
    }
}

/// Group of flat entities drawn relative to a shared origin, collided as a
/// single box of `collision_box` size.
#[derive(Debug)]
pub struct Prefab {
    position: Vec2,
    collision_box: Vec2,
    children: Vec<Box<dyn Entity<Vec2>>>,
}

impl Prefab {
    pub const KIND: EntityKind = EntityKind::new("prefab");

    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            collision_box: Vec2::new(10.0, 10.0),
            children: Vec::new(),
        }
    }

    pub fn with_collision_box(mut self, size: Vec2) -> Self {
        self.collision_box = size;
        self
    }

    /// `child` is positioned relative to the prefab origin.
    pub fn with_child(mut self, child: Box<dyn Entity<Vec2>>) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[Box<dyn Entity<Vec2>>] {
        &self.children
    }
}

impl Entity<Vec2> for Prefab {
    fn kind(&self) -> EntityKind {
        Self::KIND
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn extent(&self) -> Option<Vec2> {
        Some(self.collision_box)
    }

    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), DrawError> {
        require_finite(Self::KIND, "position", self.position)?;
        for child in &self.children {
            let mut placed = child.clone_entity();
            placed.translate_by(self.position);
            placed.draw(canvas)?;
        }
        Ok(())
    }

    fn clone_entity(&self) -> Box<dyn Entity<Vec2>> {
        Box::new(Prefab {
            position: self.position,
            collision_box: self.collision_box,
            children: self.children.iter().map(|child| child.clone_entity()).collect(),
        })
    }
}

/// Box mesh for the layered variant; `position` is the centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    position: Vec3,
    size: Vec3,
    color: Color,
    mesh: Mesh,
}

impl Cuboid {
    pub const KIND: EntityKind = EntityKind::new("cuboid");

    pub fn new(size: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            size,
            color: Color::WHITE,
            mesh: Mesh::cuboid(size),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.mesh.rotation = rotation;
        self
    }

    pub fn rotation(&self) -> Vec3 {
        self.mesh.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.mesh.rotation = rotation;
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

impl Entity<Vec3> for Cuboid {
    fn kind(&self) -> EntityKind {
        Self::KIND
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn extent(&self) -> Option<Vec3> {
        Some(self.size)
    }

    fn mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }

    fn draw(&self, _overlay: &mut dyn Canvas) -> Result<(), DrawError> {
        require_finite(Self::KIND, "size", self.size)?;
        require_finite(Self::KIND, "position", self.position)
    }

    fn clone_entity(&self) -> Box<dyn Entity<Vec3>> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::FrameCanvas;

    #[test]
    fn rectangle_paints_its_box() {
        let mut canvas = FrameCanvas::new(20, 20);
        let rect =
            Rectangle::new(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0)).with_color(Color::GREEN);

        rect.draw(&mut canvas).expect("draw");

        assert_eq!(canvas.pixel(3, 3), Some(Color::GREEN.rgba()));
        assert_eq!(canvas.pixel(7, 7), Some([0, 0, 0, 0]));
    }

    #[test]
    fn rectangle_with_undefined_scale_fails_to_draw() {
        let mut canvas = FrameCanvas::new(20, 20);
        let rect = Rectangle::new(Vec2::new(0.0, 0.0), Vec2::new(f32::NAN, 4.0));

        let error = rect.draw(&mut canvas).expect_err("malformed");

        assert_eq!(
            error,
            DrawError::Malformed {
                kind: Rectangle::KIND,
                field: "scale",
            }
        );
        assert_eq!(error.to_string(), "rectangle scale is not defined");
    }

    #[test]
    fn line_moves_both_endpoints() {
        let mut line = Line::new(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        line.translate_by(Vec2::new(1.0, 1.0));

        assert_eq!(line.position(), Vec2::new(1.0, 1.0));
        assert_eq!(line.end(), Vec2::new(4.0, 5.0));
        assert_eq!(line.extent(), None);
    }

    #[test]
    fn prefab_draws_children_relative_to_origin() {
        let mut canvas = FrameCanvas::new(20, 20);
        let prefab = Prefab::new(Vec2::new(10.0, 10.0)).with_child(Box::new(
            Rectangle::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)).with_color(Color::BLUE),
        ));

        prefab.draw(&mut canvas).expect("draw");

        assert_eq!(canvas.pixel(10, 10), Some(Color::BLUE.rgba()));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(prefab.children()[0].position(), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn cloned_entities_are_independent() {
        let original = Rectangle::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0));
        let mut copy = original.clone_entity();
        copy.translate_by(Vec2::new(5.0, 0.0));

        assert_eq!(original.position(), Vec2::new(1.0, 1.0));
        assert_eq!(copy.position(), Vec2::new(6.0, 1.0));
    }

    #[test]
    fn cuboid_exposes_mesh_and_skips_overlay() {
        let mut overlay = FrameCanvas::new(4, 4);
        let cube = Cuboid::new(Vec3::new(1.0, 1.0, 1.0));

        cube.draw(&mut overlay).expect("draw");

        assert_eq!(cube.mesh().map(|mesh| mesh.vertices.len()), Some(8));
        assert!(overlay.pixels().iter().all(|byte| *byte == 0));
    }
}
