use std::fmt;

use thiserror::Error;

use super::collision::Mesh;
use super::rendering::Canvas;
use crate::math::Vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability tag used for bulk removal. Entities of the same primitive
/// share a kind; application types pick their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind(pub &'static str);

impl EntityKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("{kind} {field} is not defined")]
    Malformed {
        kind: EntityKind,
        field: &'static str,
    },
    #[error("{kind} failed to draw: {message}")]
    Backend { kind: EntityKind, message: String },
}

/// A positioned, drawable object managed by the registry.
///
/// `draw` must not touch the registry; it only sees the canvas.
pub trait Entity<V: Vector> {
    fn kind(&self) -> EntityKind;

    fn position(&self) -> V;

    fn set_position(&mut self, position: V);

    fn translate_by(&mut self, delta: V) {
        let position = self.position();
        self.set_position(position + delta);
    }

    /// Width/height (or size in 3D) used by box collision. `None` opts out.
    fn extent(&self) -> Option<V> {
        None
    }

    /// Local-space geometry used by ray collision.
    fn mesh(&self) -> Option<&Mesh> {
        None
    }

    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), DrawError>;

    fn clone_entity(&self) -> Box<dyn Entity<V>>;
}

impl<V: Vector> fmt::Debug for dyn Entity<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind())
            .field("position", &self.position())
            .finish()
    }
}
