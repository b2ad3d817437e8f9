use tracing::debug;

use super::collision::Collider;
use super::entity::{Entity, EntityId, EntityKind};
use super::render_graph::RenderLedger;
use crate::math::Vector;

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug)]
pub struct EntitySlot<V: Vector> {
    id: EntityId,
    entity: Box<dyn Entity<V>>,
    collider: Option<Collider<V>>,
}

impl<V: Vector> EntitySlot<V> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity(&self) -> &dyn Entity<V> {
        self.entity.as_ref()
    }

    pub fn entity_mut(&mut self) -> &mut dyn Entity<V> {
        self.entity.as_mut()
    }

    pub fn collider(&self) -> Option<&Collider<V>> {
        self.collider.as_ref()
    }

    pub fn has_collision(&self) -> bool {
        self.collider.is_some()
    }

    pub(crate) fn collider_mut(&mut self) -> Option<&mut Collider<V>> {
        self.collider.as_mut()
    }
}

/// Authoritative, insertion-ordered list of active entities.
///
/// Every add/remove is also noted in the render ledger so the render graph
/// can catch up on the next reconcile step.
#[derive(Debug)]
pub struct EntityRegistry<V: Vector> {
    allocator: EntityIdAllocator,
    slots: Vec<EntitySlot<V>>,
    ledger: RenderLedger,
}

impl<V: Vector> Default for EntityRegistry<V> {
    fn default() -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            slots: Vec::new(),
            ledger: RenderLedger::default(),
        }
    }
}

impl<V: Vector> EntityRegistry<V> {
    pub fn add(&mut self, entity: Box<dyn Entity<V>>) -> EntityId {
        let id = self.allocator.allocate();
        self.slots.push(EntitySlot {
            id,
            entity,
            collider: None,
        });
        self.ledger.note_added(id);
        id
    }

    /// Returns the removed entity, or `None` when `id` was not active.
    pub fn remove(&mut self, id: EntityId) -> Option<Box<dyn Entity<V>>> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(index);
        self.ledger.note_removed(id);
        Some(slot.entity)
    }

    pub fn remove_all(&mut self, kind: EntityKind) -> usize {
        let ledger = &mut self.ledger;
        let before = self.slots.len();
        self.slots.retain(|slot| {
            let keep = slot.entity.kind() != kind;
            if !keep {
                ledger.note_removed(slot.id);
            }
            keep
        });
        let removed = before - self.slots.len();
        debug!(kind = %kind, removed, "entities_removed_by_kind");
        removed
    }

    pub fn clear(&mut self) {
        for slot in self.slots.drain(..) {
            self.ledger.note_removed(slot.id);
        }
    }

    pub fn set_collision(&mut self, id: EntityId, mut collider: Collider<V>) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) else {
            return false;
        };
        if !collider.on_register(id, slot.entity.position()) {
            return false;
        }
        slot.collider = Some(collider);
        true
    }

    pub fn has_collision(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(EntitySlot::has_collision)
    }

    pub fn collider(&self, id: EntityId) -> Option<&Collider<V>> {
        self.slot(id).and_then(EntitySlot::collider)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity<V>> {
        self.slot(id).map(EntitySlot::entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity<V>> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(EntitySlot::entity_mut)
    }

    /// The live ordered sequence. Order is insertion order of the survivors.
    pub fn entities(&self) -> &[EntitySlot<V>] {
        &self.slots
    }

    pub fn entities_mut(&mut self) -> &mut [EntitySlot<V>] {
        &mut self.slots
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn take_ledger(&mut self) -> RenderLedger {
        std::mem::take(&mut self.ledger)
    }

    fn slot(&self, id: EntityId) -> Option<&EntitySlot<V>> {
        self.slots.iter().find(|slot| slot.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::shapes::{Ellipse, Rectangle};
    use crate::math::Vec2;

    fn rect_at(x: f32, y: f32) -> Box<dyn Entity<Vec2>> {
        Box::new(Rectangle::new(Vec2::new(x, y), Vec2::new(10.0, 10.0)))
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let first = registry.add(rect_at(0.0, 0.0));
        registry.remove(first);
        let second = registry.add(rect_at(0.0, 0.0));

        assert_ne!(first, second);
    }

    #[test]
    fn added_entities_appear_exactly_once_in_insertion_order() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let a = registry.add(rect_at(0.0, 0.0));
        let b = registry.add(rect_at(1.0, 0.0));
        let c = registry.add(rect_at(2.0, 0.0));

        assert_eq!(registry.ids(), vec![a, b, c]);
        assert_eq!(registry.ids().iter().filter(|id| **id == b).count(), 1);
    }

    #[test]
    fn remove_of_absent_entity_is_a_no_op() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let a = registry.add(rect_at(0.0, 0.0));
        assert!(registry.remove(a).is_some());

        assert!(registry.remove(a).is_none());
        assert!(registry.remove(EntityId(999)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_all_only_touches_matching_kind() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let rect_a = registry.add(rect_at(0.0, 0.0));
        let ellipse = registry.add(Box::new(Ellipse::new(
            Vec2::new(5.0, 5.0),
            Vec2::new(2.0, 2.0),
        )));
        let rect_b = registry.add(rect_at(3.0, 0.0));

        let removed = registry.remove_all(Rectangle::KIND);

        assert_eq!(removed, 2);
        assert!(!registry.contains(rect_a));
        assert!(!registry.contains(rect_b));
        assert!(registry.contains(ellipse));
    }

    #[test]
    fn clear_empties_registry_and_notes_removals() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let a = registry.add(rect_at(0.0, 0.0));
        let b = registry.add(rect_at(1.0, 0.0));
        registry.take_ledger();

        registry.clear();
        let ledger = registry.take_ledger();

        assert!(registry.is_empty());
        assert_eq!(ledger.pending_removals(), &[a, b]);
    }

    #[test]
    fn set_collision_registers_owner_and_starting_position() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let id = registry.add(rect_at(4.0, 6.0));

        assert!(!registry.has_collision(id));
        assert!(registry.set_collision(id, Collider::new()));

        let collider = registry.collider(id).expect("collider");
        assert_eq!(collider.owner(), Some(id));
        assert_eq!(collider.last_movement(), Vec2::new(4.0, 6.0));
        assert!(registry.has_collision(id));
    }

    #[test]
    fn collider_owner_is_never_reassigned() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let a = registry.add(rect_at(0.0, 0.0));
        let b = registry.add(rect_at(20.0, 0.0));
        registry.set_collision(a, Collider::new());
        let owned = *registry.collider(a).expect("collider");

        assert!(!registry.set_collision(b, owned));
        assert!(!registry.has_collision(b));
    }

    #[test]
    fn set_collision_on_missing_entity_fails() {
        let mut registry = EntityRegistry::<Vec2>::default();
        assert!(!registry.set_collision(EntityId(3), Collider::new()));
    }

    #[test]
    fn get_mut_moves_entity_in_place() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let id = registry.add(rect_at(0.0, 0.0));

        registry
            .get_mut(id)
            .expect("entity")
            .translate_by(Vec2::new(2.0, 3.0));

        assert_eq!(registry.get(id).expect("entity").position(), Vec2::new(2.0, 3.0));
    }
}
