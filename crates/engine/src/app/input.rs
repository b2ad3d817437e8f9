use std::collections::HashSet;

use winit::keyboard::KeyCode;

use super::rendering::Viewport;
use crate::math::Vec2;

/// Keys currently held. Updated the moment a key event arrives and polled by
/// handlers on demand; key changes never go through the event bus.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    down: HashSet<KeyCode>,
}

impl KeyState {
    pub fn press(&mut self, key: KeyCode) {
        self.down.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.down.remove(&key);
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.down.contains(&key)
    }

    pub fn held_count(&self) -> usize {
        self.down.len()
    }

    pub fn clear(&mut self) {
        self.down.clear();
    }
}

/// Pointer position in canvas pixels, or `None` when it lies outside the
/// viewport and must not reach subscribers.
pub fn clip_pointer(viewport: Viewport, x: f32, y: f32) -> Option<Vec2> {
    viewport.contains(x, y).then(|| Vec2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_clears_pressed_key() {
        let mut keys = KeyState::default();
        keys.press(KeyCode::ArrowLeft);
        keys.press(KeyCode::ArrowLeft);

        assert!(keys.is_down(KeyCode::ArrowLeft));
        assert_eq!(keys.held_count(), 1);

        keys.release(KeyCode::ArrowLeft);
        assert!(!keys.is_down(KeyCode::ArrowLeft));
    }

    #[test]
    fn release_of_unheld_key_is_ignored() {
        let mut keys = KeyState::default();
        keys.release(KeyCode::Space);
        assert_eq!(keys.held_count(), 0);
    }

    #[test]
    fn pointer_outside_viewport_is_dropped() {
        let viewport = Viewport::new(1000, 500);

        assert_eq!(clip_pointer(viewport, 10.0, 20.0), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(clip_pointer(viewport, 1000.0, 500.0), Some(Vec2::new(1000.0, 500.0)));
        assert_eq!(clip_pointer(viewport, -1.0, 20.0), None);
        assert_eq!(clip_pointer(viewport, 10.0, 501.0), None);
    }
}
