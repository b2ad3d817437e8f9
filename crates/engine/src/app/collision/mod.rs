//! Per-entity delta tracking and overlap rollback.
//!
//! Each tick every collidable entity measures how far it moved since the
//! previous evaluation. If it now overlaps another collidable entity, that
//! displacement is undone in full. There is no sliding, no separation along a
//! normal and no velocity model.
//!
//! The pass works on a snapshot: all overlap decisions are taken against the
//! positions entities hold when the pass starts, and rollbacks are applied
//! afterwards. The result does not depend on registry order. Two movers that
//! step into each other are both rolled back; a mover that steps into an
//! entity that was itself rolled back in the same pass is still judged
//! against that entity's pre-rollback position.

mod aabb;
mod ray_mesh;

use tracing::debug;

use super::entity::{Entity, EntityId};
use super::registry::EntityRegistry;
use crate::math::Vector;

pub use aabb::{
    colliding_entities, is_colliding, is_colliding_list, is_colliding_on_bottom,
    is_colliding_on_left, is_colliding_on_right, is_colliding_on_top, is_point_colliding,
};
pub use ray_mesh::{colliding_entities_3d, is_colliding_3d, Mesh, Ray, Triangle};

/// Dimension-specific narrow phase. `Vec2` uses axis-aligned boxes and
/// `Vec3` casts rays against meshes.
pub trait Space: Vector {
    fn overlaps(subject: &dyn Entity<Self>, candidate: &dyn Entity<Self>) -> bool;

    fn overlaps_any(subject: &dyn Entity<Self>, candidates: &[&dyn Entity<Self>]) -> bool {
        candidates
            .iter()
            .any(|candidate| Self::overlaps(subject, *candidate))
    }
}

/// Movement tracking state attached to a collidable entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider<V> {
    last_movement: V,
    delta_movement: V,
    owner: Option<EntityId>,
}

/// Box collider of the flat variant.
pub type BoxCollider = Collider<crate::math::Vec2>;
/// Ray-vs-mesh collider of the layered variant.
pub type RayMeshCollider = Collider<crate::math::Vec3>;

impl<V: Vector> Default for Collider<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vector> Collider<V> {
    pub fn new() -> Self {
        Self {
            last_movement: V::ZERO,
            delta_movement: V::ZERO,
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn last_movement(&self) -> V {
        self.last_movement
    }

    pub fn delta_movement(&self) -> V {
        self.delta_movement
    }

    /// Binds the collider to its entity. The owner is set once; binding to a
    /// different entity afterwards is refused.
    pub(crate) fn on_register(&mut self, owner: EntityId, position: V) -> bool {
        match self.owner {
            Some(existing) if existing != owner => false,
            Some(_) => true,
            None => {
                self.owner = Some(owner);
                self.last_movement = position;
                self.delta_movement = V::ZERO;
                true
            }
        }
    }

    /// Records `current` and returns the position seen at the previous
    /// evaluation.
    fn evaluate(&mut self, current: V) -> V {
        let previous = self.last_movement;
        self.delta_movement = current - previous;
        self.last_movement = current;
        previous
    }

    fn rolled_back_to(&mut self, position: V) {
        self.last_movement = position;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub evaluated: usize,
    pub rolled_back: Vec<EntityId>,
}

pub fn resolve_collisions<V: Space>(registry: &mut EntityRegistry<V>) -> CollisionReport {
    let mut previous_positions: Vec<(usize, V)> = Vec::new();
    for (index, slot) in registry.entities_mut().iter_mut().enumerate() {
        let current = slot.entity().position();
        if let Some(collider) = slot.collider_mut() {
            previous_positions.push((index, collider.evaluate(current)));
        }
    }

    let mut report = CollisionReport {
        evaluated: previous_positions.len(),
        rolled_back: Vec::new(),
    };
    if previous_positions.len() < 2 {
        return report;
    }

    let slots = registry.entities();
    let mut to_roll_back: Vec<(usize, V)> = Vec::new();
    for (subject_index, previous) in &previous_positions {
        let candidates: Vec<&dyn Entity<V>> = previous_positions
            .iter()
            .filter(|(index, _)| index != subject_index)
            .map(|(index, _)| slots[*index].entity())
            .collect();
        if V::overlaps_any(slots[*subject_index].entity(), &candidates) {
            to_roll_back.push((*subject_index, *previous));
        }
    }

    let slots = registry.entities_mut();
    for (index, previous) in to_roll_back {
        let slot = &mut slots[index];
        let id = slot.id();
        slot.entity_mut().set_position(previous);
        if let Some(collider) = slot.collider_mut() {
            debug!(
                entity = %id,
                delta = ?collider.delta_movement(),
                "collision_rollback"
            );
            collider.rolled_back_to(previous);
        }
        report.rolled_back.push(id);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::shapes::{Cuboid, Rectangle};
    use crate::math::{Vec2, Vec3};

    fn collidable_rect(registry: &mut EntityRegistry<Vec2>, x: f32, y: f32) -> EntityId {
        let id = registry.add(Box::new(Rectangle::new(
            Vec2::new(x, y),
            Vec2::new(10.0, 10.0),
        )));
        registry.set_collision(id, Collider::new());
        id
    }

    fn position(registry: &EntityRegistry<Vec2>, id: EntityId) -> Vec2 {
        registry.get(id).expect("entity").position()
    }

    #[test]
    fn moving_into_overlap_rolls_back_exactly() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mover = collidable_rect(&mut registry, 0.1, 0.3);
        let wall = collidable_rect(&mut registry, 30.0, 0.0);
        resolve_collisions(&mut registry);

        registry
            .get_mut(mover)
            .expect("mover")
            .translate_by(Vec2::new(24.7, 0.0));
        let report = resolve_collisions(&mut registry);

        assert_eq!(report.rolled_back, vec![mover, wall]);
        assert_eq!(position(&registry, mover), Vec2::new(0.1, 0.3));
        assert_eq!(position(&registry, wall), Vec2::new(30.0, 0.0));
        assert_eq!(
            registry.collider(mover).expect("collider").last_movement(),
            Vec2::new(0.1, 0.3)
        );
    }

    #[test]
    fn delta_and_last_movement_track_position() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mover = collidable_rect(&mut registry, 0.0, 0.0);
        collidable_rect(&mut registry, 100.0, 100.0);

        registry
            .get_mut(mover)
            .expect("mover")
            .translate_by(Vec2::new(3.0, 4.0));
        resolve_collisions(&mut registry);

        let collider = registry.collider(mover).expect("collider");
        assert_eq!(collider.delta_movement(), Vec2::new(3.0, 4.0));
        assert_eq!(collider.last_movement(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn lone_collidable_is_never_rolled_back() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mover = collidable_rect(&mut registry, 0.0, 0.0);
        registry.add(Box::new(Rectangle::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 50.0),
        )));

        registry
            .get_mut(mover)
            .expect("mover")
            .translate_by(Vec2::new(1.0, 1.0));
        let report = resolve_collisions(&mut registry);

        assert_eq!(report.evaluated, 1);
        assert!(report.rolled_back.is_empty());
        assert_eq!(position(&registry, mover), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let mut registry = EntityRegistry::<Vec2>::default();
        assert_eq!(resolve_collisions(&mut registry), CollisionReport::default());
    }

    #[test]
    fn simultaneous_movers_resolve_independently_of_order() {
        let mut forward = EntityRegistry::<Vec2>::default();
        let a = collidable_rect(&mut forward, 0.0, 0.0);
        let b = collidable_rect(&mut forward, 40.0, 0.0);
        resolve_collisions(&mut forward);
        forward.get_mut(a).expect("a").translate_by(Vec2::new(15.0, 0.0));
        forward.get_mut(b).expect("b").translate_by(Vec2::new(-15.0, 0.0));
        resolve_collisions(&mut forward);

        let mut reversed = EntityRegistry::<Vec2>::default();
        let b2 = collidable_rect(&mut reversed, 40.0, 0.0);
        let a2 = collidable_rect(&mut reversed, 0.0, 0.0);
        resolve_collisions(&mut reversed);
        reversed.get_mut(a2).expect("a").translate_by(Vec2::new(15.0, 0.0));
        reversed.get_mut(b2).expect("b").translate_by(Vec2::new(-15.0, 0.0));
        resolve_collisions(&mut reversed);

        assert_eq!(position(&forward, a), Vec2::new(0.0, 0.0));
        assert_eq!(position(&forward, b), Vec2::new(40.0, 0.0));
        assert_eq!(position(&reversed, a2), position(&forward, a));
        assert_eq!(position(&reversed, b2), position(&forward, b));
    }

    #[test]
    fn stationary_overlap_rolls_back_by_zero() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let a = collidable_rect(&mut registry, 0.0, 0.0);
        let b = collidable_rect(&mut registry, 5.0, 5.0);

        let report = resolve_collisions(&mut registry);

        assert_eq!(report.rolled_back.len(), 2);
        assert_eq!(position(&registry, a), Vec2::new(0.0, 0.0));
        assert_eq!(position(&registry, b), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn cuboid_moving_into_cuboid_rolls_back() {
        let mut registry = EntityRegistry::<Vec3>::default();
        let mover = registry.add(Box::new(Cuboid::new(Vec3::new(2.0, 2.0, 2.0))));
        let wall = registry.add(Box::new(
            Cuboid::new(Vec3::new(2.0, 2.0, 2.0)).with_position(Vec3::new(6.0, 0.0, 0.0)),
        ));
        registry.set_collision(mover, Collider::new());
        registry.set_collision(wall, Collider::new());

        registry
            .get_mut(mover)
            .expect("mover")
            .translate_by(Vec3::new(4.5, 0.0, 0.0));
        let report = resolve_collisions(&mut registry);

        assert!(report.rolled_back.contains(&mover));
        assert_eq!(
            registry.get(wall).expect("wall").position(),
            Vec3::new(6.0, 0.0, 0.0)
        );
        assert_eq!(
            registry.get(mover).expect("mover").position(),
            Vec3::new(0.0, 0.0, 0.0)
        );
    }
}
