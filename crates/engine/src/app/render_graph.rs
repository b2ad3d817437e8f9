use std::collections::BTreeMap;

use super::entity::{Entity, EntityId, EntityKind};
use super::registry::EntityRegistry;
use crate::math::Vector;

/// The renderer's own scene representation.
pub trait RenderGraph<V: Vector> {
    fn contains(&self, id: EntityId) -> bool;
    fn insert(&mut self, id: EntityId, entity: &dyn Entity<V>);
    fn remove(&mut self, id: EntityId) -> bool;
    fn members(&self) -> Vec<EntityId>;
}

/// Adds and removals the render graph has not seen yet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderLedger {
    pending_additions: Vec<EntityId>,
    pending_removals: Vec<EntityId>,
}

impl RenderLedger {
    pub(crate) fn note_added(&mut self, id: EntityId) {
        self.pending_additions.push(id);
    }

    pub(crate) fn note_removed(&mut self, id: EntityId) {
        self.pending_additions.retain(|pending| *pending != id);
        self.pending_removals.push(id);
    }

    pub fn pending_additions(&self) -> &[EntityId] {
        &self.pending_additions
    }

    pub fn pending_removals(&self) -> &[EntityId] {
        &self.pending_removals
    }

    pub fn is_empty(&self) -> bool {
        self.pending_additions.is_empty() && self.pending_removals.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub removed: usize,
}

/// Drains the registry's ledger into `graph`: mirror pending additions that
/// are still active, then drop pending removals.
///
/// Without a graph (flat variant, which redraws the registry every tick) the
/// ledger is drained and discarded.
pub fn reconcile<V: Vector>(
    registry: &mut EntityRegistry<V>,
    graph: Option<&mut dyn RenderGraph<V>>,
) -> ReconcileReport {
    let ledger = registry.take_ledger();
    let Some(graph) = graph else {
        return ReconcileReport::default();
    };

    let mut report = ReconcileReport::default();
    for id in ledger.pending_additions() {
        if graph.contains(*id) {
            continue;
        }
        if let Some(entity) = registry.get(*id) {
            graph.insert(*id, entity);
            report.inserted += 1;
        }
    }
    for id in ledger.pending_removals() {
        if graph.remove(*id) {
            report.removed += 1;
        }
    }
    report
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub kind: EntityKind,
}

/// In-memory render graph keyed by entity id.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<EntityId, SceneNode>,
}

impl SceneGraph {
    pub fn node(&self, id: EntityId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<V: Vector> RenderGraph<V> for SceneGraph {
    fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn insert(&mut self, id: EntityId, entity: &dyn Entity<V>) {
        self.nodes.insert(
            id,
            SceneNode {
                kind: entity.kind(),
            },
        );
    }

    fn remove(&mut self, id: EntityId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    fn members(&self) -> Vec<EntityId> {
        self.nodes.keys().copied().collect()
    }
}
