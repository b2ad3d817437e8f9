use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::collision::Collider;
use super::entity::{Entity, EntityId};
use super::registry::EntityRegistry;
use super::rendering::Color;
use super::shapes::{Cuboid, Ellipse, Line, Rectangle};
use crate::math::{Vec2, Vec3, Vector};

pub struct SceneMember<V: Vector> {
    entity: Box<dyn Entity<V>>,
    collidable: bool,
}

impl<V: Vector> SceneMember<V> {
    pub fn entity(&self) -> &dyn Entity<V> {
        self.entity.as_ref()
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable
    }
}

impl<V: Vector> Clone for SceneMember<V> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone_entity(),
            collidable: self.collidable,
        }
    }
}

impl<V: Vector> fmt::Debug for SceneMember<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneMember")
            .field("entity", &self.entity)
            .field("collidable", &self.collidable)
            .finish()
    }
}

/// Named, ordered preset of entities. Setting a scene instantiates copies of
/// its members into the registry; the scene itself is never mutated by play.
#[derive(Debug, Clone)]
pub struct Scene<V: Vector> {
    name: String,
    members: Vec<SceneMember<V>>,
}

impl<V: Vector> Scene<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: Box<dyn Entity<V>>) -> Self {
        self.add(entity, false);
        self
    }

    pub fn with_collidable(mut self, entity: Box<dyn Entity<V>>) -> Self {
        self.add(entity, true);
        self
    }

    pub fn add(&mut self, entity: Box<dyn Entity<V>>, collidable: bool) {
        self.members.push(SceneMember { entity, collidable });
    }

    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Entity<V>>> {
        (index < self.members.len()).then(|| self.members.remove(index).entity)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[SceneMember<V>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneSwapReport {
    pub removed: usize,
    pub added: usize,
}

/// Tracks the active scene and which registry entries it spawned, so a swap
/// can remove exactly those and leave everything else alone.
#[derive(Debug)]
pub struct SceneManager<V: Vector> {
    current: Option<Scene<V>>,
    spawned: Vec<EntityId>,
}

impl<V: Vector> Default for SceneManager<V> {
    fn default() -> Self {
        Self {
            current: None,
            spawned: Vec::new(),
        }
    }
}

impl<V: Vector> SceneManager<V> {
    pub fn current(&self) -> Option<&Scene<V>> {
        self.current.as_ref()
    }

    pub fn spawned(&self) -> &[EntityId] {
        &self.spawned
    }

    /// `reset` clears the whole registry first; otherwise only the previous
    /// scene's members are removed.
    pub fn set_scene(
        &mut self,
        registry: &mut EntityRegistry<V>,
        scene: Scene<V>,
        reset: bool,
    ) -> SceneSwapReport {
        let removed = if reset {
            let count = registry.len();
            registry.clear();
            count
        } else {
            self.spawned
                .drain(..)
                .filter(|id| registry.remove(*id).is_some())
                .count()
        };
        self.spawned.clear();

        for member in &scene.members {
            let id = registry.add(member.entity.clone_entity());
            if member.collidable {
                registry.set_collision(id, Collider::new());
            }
            self.spawned.push(id);
        }

        let report = SceneSwapReport {
            removed,
            added: self.spawned.len(),
        };
        info!(
            scene = scene.name(),
            reset,
            removed = report.removed,
            added = report.added,
            entity_count = registry.len(),
            "scene_set"
        );
        self.current = Some(scene);
        report
    }

    /// Re-instantiates the current scene. `None` when no scene was set.
    pub fn reload_scene(
        &mut self,
        registry: &mut EntityRegistry<V>,
        reset: bool,
    ) -> Option<SceneSwapReport> {
        let scene = self.current.take()?;
        Some(self.set_scene(registry, scene, reset))
    }
}

#[derive(Debug, Error)]
pub enum ScenePresetError {
    #[error("failed to read scene preset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write scene preset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scene preset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("entity {index} ({shape}) cannot be placed in a {expected} scene")]
    DimensionMismatch {
        index: usize,
        shape: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PresetShape {
    Rectangle {
        position: Vec2,
        size: Vec2,
    },
    Ellipse {
        center: Vec2,
        radii: Vec2,
    },
    Line {
        from: Vec2,
        to: Vec2,
    },
    Cuboid {
        position: Vec3,
        size: Vec3,
        #[serde(default)]
        rotation: Vec3,
    },
}

impl PresetShape {
    fn name(&self) -> &'static str {
        match self {
            PresetShape::Rectangle { .. } => "rectangle",
            PresetShape::Ellipse { .. } => "ellipse",
            PresetShape::Line { .. } => "line",
            PresetShape::Cuboid { .. } => "cuboid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetEntity {
    #[serde(flatten)]
    pub shape: PresetShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub collidable: bool,
}

/// On-disk scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePreset {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<PresetEntity>,
}

impl ScenePreset {
    pub fn from_json_str(text: &str) -> Result<Self, ScenePresetError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenePresetError> {
        let text = fs::read_to_string(path).map_err(|source| ScenePresetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScenePresetError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ScenePresetError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_scene_2d(self) -> Result<Scene<Vec2>, ScenePresetError> {
        let mut scene = Scene::new(self.name);
        for (index, entry) in self.entities.into_iter().enumerate() {
            let color = entry.color;
            let entity: Box<dyn Entity<Vec2>> = match entry.shape {
                PresetShape::Rectangle { position, size } => {
                    let rect = Rectangle::new(position, size);
                    Box::new(match color {
                        Some(color) => rect.with_color(color),
                        None => rect,
                    })
                }
                PresetShape::Ellipse { center, radii } => {
                    let ellipse = Ellipse::new(center, radii);
                    Box::new(match color {
                        Some(color) => ellipse.with_color(color),
                        None => ellipse,
                    })
                }
                PresetShape::Line { from, to } => {
                    let line = Line::new(from, to);
                    Box::new(match color {
                        Some(color) => line.with_color(color),
                        None => line,
                    })
                }
                other => {
                    return Err(ScenePresetError::DimensionMismatch {
                        index,
                        shape: other.name(),
                        expected: "2d",
                    })
                }
            };
            scene.add(entity, entry.collidable);
        }
        Ok(scene)
    }

    pub fn into_scene_3d(self) -> Result<Scene<Vec3>, ScenePresetError> {
        let mut scene = Scene::new(self.name);
        for (index, entry) in self.entities.into_iter().enumerate() {
            let PresetShape::Cuboid {
                position,
                size,
                rotation,
            } = entry.shape
            else {
                return Err(ScenePresetError::DimensionMismatch {
                    index,
                    shape: entry.shape.name(),
                    expected: "3d",
                });
            };
            let mut cuboid = Cuboid::new(size)
                .with_position(position)
                .with_rotation(rotation);
            if let Some(color) = entry.color {
                cuboid = cuboid.with_color(color);
            }
            scene.add(Box::new(cuboid), entry.collidable);
        }
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32) -> Box<dyn Entity<Vec2>> {
        Box::new(Rectangle::new(Vec2::new(x, 0.0), Vec2::new(5.0, 5.0)))
    }

    #[test]
    fn swap_without_reset_preserves_unmanaged_entities() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mut scenes = SceneManager::default();
        let outsider = registry.add(rect(500.0));

        scenes.set_scene(
            &mut registry,
            Scene::new("first").with_entity(rect(0.0)).with_entity(rect(10.0)),
            false,
        );
        let first_members = scenes.spawned().to_vec();
        let report = scenes.set_scene(
            &mut registry,
            Scene::new("second").with_collidable(rect(20.0)),
            false,
        );

        assert_eq!(report, SceneSwapReport { removed: 2, added: 1 });
        assert!(registry.contains(outsider));
        assert!(first_members.iter().all(|id| !registry.contains(*id)));
        assert_eq!(registry.len(), 2);
        let second_member = scenes.spawned()[0];
        assert!(registry.has_collision(second_member));
        assert_eq!(scenes.current().map(Scene::name), Some("second"));
    }

    #[test]
    fn swap_with_reset_clears_everything() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mut scenes = SceneManager::default();
        let outsider = registry.add(rect(500.0));

        let report = scenes.set_scene(&mut registry, Scene::new("only").with_entity(rect(0.0)), true);

        assert_eq!(report, SceneSwapReport { removed: 1, added: 1 });
        assert!(!registry.contains(outsider));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn already_removed_members_are_not_counted() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mut scenes = SceneManager::default();
        scenes.set_scene(
            &mut registry,
            Scene::new("first").with_entity(rect(0.0)).with_entity(rect(1.0)),
            false,
        );
        registry.remove(scenes.spawned()[0]);

        let report = scenes.set_scene(&mut registry, Scene::new("empty"), false);

        assert_eq!(report.removed, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn reload_restores_scene_positions() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mut scenes = SceneManager::default();
        scenes.set_scene(&mut registry, Scene::new("level").with_entity(rect(3.0)), false);
        let moved = scenes.spawned()[0];
        registry
            .get_mut(moved)
            .expect("member")
            .translate_by(Vec2::new(40.0, 0.0));

        let report = scenes.reload_scene(&mut registry, false).expect("scene set");

        assert_eq!(report, SceneSwapReport { removed: 1, added: 1 });
        let fresh = scenes.spawned()[0];
        assert_ne!(fresh, moved);
        assert_eq!(
            registry.get(fresh).expect("member").position(),
            Vec2::new(3.0, 0.0)
        );
    }

    #[test]
    fn reload_without_scene_is_none() {
        let mut registry = EntityRegistry::<Vec2>::default();
        let mut scenes = SceneManager::default();
        assert!(scenes.reload_scene(&mut registry, true).is_none());
    }

    #[test]
    fn scene_editing_does_not_touch_registry() {
        let mut scene = Scene::new("draft").with_entity(rect(0.0));
        scene.add(rect(1.0), true);
        assert_eq!(scene.len(), 2);
        assert!(scene.remove(0).is_some());
        assert!(scene.remove(5).is_none());
        assert!(scene.members()[0].is_collidable());
        scene.clear();
        assert!(scene.is_empty());
    }

    const PRESET_JSON: &str = r#"{
        "name": "arena",
        "entities": [
            { "shape": "rectangle", "position": { "x": 0.0, "y": 0.0 }, "size": { "x": 50.0, "y": 10.0 }, "collidable": true },
            { "shape": "ellipse", "center": { "x": 20.0, "y": 20.0 }, "radii": { "x": 4.0, "y": 4.0 }, "color": [0, 0, 255, 255] }
        ]
    }"#;

    #[test]
    fn preset_builds_flat_scene() {
        let preset = ScenePreset::from_json_str(PRESET_JSON).expect("parse");

        let scene = preset.into_scene_2d().expect("2d scene");

        assert_eq!(scene.name(), "arena");
        assert_eq!(scene.len(), 2);
        assert!(scene.members()[0].is_collidable());
        assert_eq!(scene.members()[1].entity().kind(), Ellipse::KIND);
    }

    #[test]
    fn flat_preset_rejects_layered_shapes() {
        let preset = ScenePreset {
            name: "mixed".to_string(),
            entities: vec![PresetEntity {
                shape: PresetShape::Cuboid {
                    position: Vec3::ZERO,
                    size: Vec3::new(1.0, 1.0, 1.0),
                    rotation: Vec3::ZERO,
                },
                color: None,
                collidable: false,
            }],
        };

        let error = preset.clone().into_scene_2d().expect_err("cuboid in 2d");
        assert!(matches!(
            error,
            ScenePresetError::DimensionMismatch { index: 0, shape: "cuboid", expected: "2d" }
        ));
        assert_eq!(preset.into_scene_3d().expect("3d scene").len(), 1);
    }

    #[test]
    fn unknown_shape_is_a_parse_error() {
        let error = ScenePreset::from_json_str(r#"{ "name": "x", "entities": [{ "shape": "sprite" }] }"#)
            .expect_err("unknown shape");
        assert!(matches!(error, ScenePresetError::Parse(_)));
    }

    #[test]
    fn preset_survives_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arena.json");
        let preset = ScenePreset::from_json_str(PRESET_JSON).expect("parse");

        preset.save(&path).expect("save");
        let loaded = ScenePreset::load(&path).expect("load");

        assert_eq!(loaded, preset);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");

        let error = ScenePreset::load(&path).expect_err("missing");

        assert!(error.to_string().contains("missing.json"));
    }
}
