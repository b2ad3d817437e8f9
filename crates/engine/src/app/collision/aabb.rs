use super::Space;
use crate::app::entity::Entity;
use crate::math::{Vec2, Vector};

/// Screen-space box, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl Bounds {
    fn of(entity: &dyn Entity<Vec2>) -> Option<Self> {
        let extent = entity.extent()?;
        let position = entity.position();
        if !position.is_finite() || !extent.is_finite() {
            return None;
        }
        let far = position + extent;
        Some(Self {
            left: position.x.min(far.x),
            right: position.x.max(far.x),
            top: position.y.min(far.y),
            bottom: position.y.max(far.y),
        })
    }

    /// Closed-interval overlap on both axes; shared edges count.
    fn overlaps(self, other: Bounds) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    fn contains(self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

impl Space for Vec2 {
    fn overlaps(subject: &dyn Entity<Self>, candidate: &dyn Entity<Self>) -> bool {
        is_colliding(subject, candidate)
    }
}

/// Entities without an extent never collide.
pub fn is_colliding(a: &dyn Entity<Vec2>, b: &dyn Entity<Vec2>) -> bool {
    match (Bounds::of(a), Bounds::of(b)) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => false,
    }
}

pub fn is_point_colliding(entity: &dyn Entity<Vec2>, point: Vec2) -> bool {
    Bounds::of(entity).is_some_and(|bounds| bounds.contains(point))
}

pub fn colliding_entities<'a>(
    subject: &dyn Entity<Vec2>,
    others: &[&'a dyn Entity<Vec2>],
) -> Vec<&'a dyn Entity<Vec2>> {
    others
        .iter()
        .copied()
        .filter(|other| is_colliding(subject, *other))
        .collect()
}

pub fn is_colliding_list(subject: &dyn Entity<Vec2>, others: &[&dyn Entity<Vec2>]) -> bool {
    others.iter().any(|other| is_colliding(subject, *other))
}

// The side tests are strict: touching edges do not count.

/// `subject` straddles the left edge of `other`.
pub fn is_colliding_on_left(subject: &dyn Entity<Vec2>, other: &dyn Entity<Vec2>) -> bool {
    side_test(subject, other, |s, o| s.left < o.left && s.right > o.left)
}

/// `subject` straddles the right edge of `other`.
pub fn is_colliding_on_right(subject: &dyn Entity<Vec2>, other: &dyn Entity<Vec2>) -> bool {
    side_test(subject, other, |s, o| s.right > o.right && s.left < o.right)
}

/// `subject` straddles the top edge of `other`.
pub fn is_colliding_on_top(subject: &dyn Entity<Vec2>, other: &dyn Entity<Vec2>) -> bool {
    side_test(subject, other, |s, o| s.top < o.top && s.bottom > o.top)
}

/// `subject` straddles the bottom edge of `other`.
pub fn is_colliding_on_bottom(subject: &dyn Entity<Vec2>, other: &dyn Entity<Vec2>) -> bool {
    side_test(subject, other, |s, o| s.bottom > o.bottom && s.top < o.bottom)
}

fn side_test(
    subject: &dyn Entity<Vec2>,
    other: &dyn Entity<Vec2>,
    edge: impl Fn(Bounds, Bounds) -> bool,
) -> bool {
    match (Bounds::of(subject), Bounds::of(other)) {
        (Some(s), Some(o)) => s.overlaps(o) && edge(s, o),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::shapes::{Line, Rectangle};

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rectangle {
        Rectangle::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn overlapping_boxes_collide_symmetrically() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 5.0, 10.0, 10.0);

        assert!(is_colliding(&a, &b));
        assert!(is_colliding(&b, &a));
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 20.0, 10.0, 10.0);

        assert!(!is_colliding(&a, &b));
        assert!(!is_colliding(&b, &a));
    }

    #[test]
    fn contained_box_collides() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        let inner = rect(40.0, 40.0, 5.0, 5.0);

        assert!(is_colliding(&outer, &inner));
        assert!(is_colliding(&inner, &outer));
    }

    #[test]
    fn shared_edge_counts_as_collision() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);

        assert!(is_colliding(&a, &b));
    }

    #[test]
    fn point_test_is_inclusive_of_boundary() {
        let a = rect(0.0, 0.0, 10.0, 10.0);

        assert!(is_point_colliding(&a, Vec2::new(10.0, 10.0)));
        assert!(is_point_colliding(&a, Vec2::new(0.0, 5.0)));
        assert!(!is_point_colliding(&a, Vec2::new(10.5, 5.0)));
    }

    #[test]
    fn entity_without_extent_never_collides() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let dot = Line::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));

        assert!(!is_colliding(&a, &dot));
        assert!(!is_point_colliding(&dot, Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn list_queries_return_every_overlap() {
        let subject = rect(0.0, 0.0, 10.0, 10.0);
        let near = rect(5.0, 0.0, 10.0, 10.0);
        let far = rect(50.0, 0.0, 10.0, 10.0);
        let also_near = rect(0.0, 8.0, 4.0, 4.0);
        let others: [&dyn Entity<Vec2>; 3] = [&near, &far, &also_near];

        assert_eq!(colliding_entities(&subject, &others).len(), 2);
        assert!(is_colliding_list(&subject, &others));
        assert!(!is_colliding_list(&far, &[&near as &dyn Entity<Vec2>]));
    }

    #[test]
    fn side_tests_report_which_edge_is_crossed() {
        let target = rect(10.0, 10.0, 10.0, 10.0);
        let from_left = rect(5.0, 12.0, 10.0, 4.0);
        let from_above = rect(12.0, 5.0, 4.0, 10.0);

        assert!(is_colliding_on_left(&from_left, &target));
        assert!(!is_colliding_on_right(&from_left, &target));
        assert!(is_colliding_on_right(&target, &from_left));
        assert!(is_colliding_on_top(&from_above, &target));
        assert!(!is_colliding_on_bottom(&from_above, &target));
        assert!(is_colliding_on_bottom(&target, &from_above));
    }

    #[test]
    fn touching_edge_is_not_a_side_collision() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);

        assert!(!is_colliding_on_left(&a, &b));
    }
}
