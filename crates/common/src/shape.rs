//! Hitbox geometry in pixel space.
//!
//! Rectangles are half-open: a rectangle at `x` with width `w` covers the
//! pixels `x..x + w`. Two shapes touch only when they share a positive area;
//! meeting along an edge or a corner is not an overlap.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle without area. Used as "no hitbox".
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty()
            && x >= self.x
            && y >= self.y
            && (x as i64) < self.right()
            && (y as i64) < self.bottom()
    }

    pub fn contains_point(&self, p: IVec2) -> bool {
        self.contains(p.x, p.y)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x as i64) < other.right()
            && (other.x as i64) < self.right()
            && (self.y as i64) < other.bottom()
            && (other.y as i64) < self.bottom()
    }

    /// The overlapping region, if the two rectangles share any area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, (right - x as i64) as i32, (bottom - y as i64) as i32))
    }

    /// Squared distance from a point to the closest point of the rectangle.
    fn distance_sq_to(&self, px: f64, py: f64) -> f64 {
        let cx = px.clamp(self.x as f64, self.right() as f64);
        let cy = py.clamp(self.y as f64, self.bottom() as f64);
        (px - cx).powi(2) + (py - cy).powi(2)
    }
}

/// Hitbox of an entity. Rectangles cover sprites; circles cover round
/// pickups and area queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect(Rect),
    Circle { center: IVec2, radius: i32 },
}

impl Shape {
    pub fn circle(x: i32, y: i32, radius: i32) -> Self {
        Self::Circle {
            center: IVec2::new(x, y),
            radius,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Rect(r) => r.is_empty(),
            Shape::Circle { radius, .. } => *radius <= 0,
        }
    }

    /// Smallest rectangle enclosing the shape.
    pub fn bounds(&self) -> Rect {
        match *self {
            Shape::Rect(r) => r,
            Shape::Circle { center, radius } => Rect::new(
                center.x.saturating_sub(radius),
                center.y.saturating_sub(radius),
                radius.saturating_mul(2),
                radius.saturating_mul(2),
            ),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        match *self {
            Shape::Rect(r) => r.contains(x, y),
            Shape::Circle { center, radius } => {
                let dx = (x - center.x) as f64;
                let dy = (y - center.y) as f64;
                radius > 0 && dx * dx + dy * dy < (radius as f64).powi(2)
            }
        }
    }

    /// True when the two shapes share a positive area.
    pub fn intersects(&self, other: &Shape) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        match (self, other) {
            (Shape::Rect(a), Shape::Rect(b)) => a.intersects(b),
            (Shape::Rect(r), Shape::Circle { center, radius })
            | (Shape::Circle { center, radius }, Shape::Rect(r)) => {
                r.distance_sq_to(center.x as f64, center.y as f64) < (*radius as f64).powi(2)
            }
            (
                Shape::Circle {
                    center: c1,
                    radius: r1,
                },
                Shape::Circle {
                    center: c2,
                    radius: r2,
                },
            ) => {
                let d = (*c1 - *c2).as_dvec2().length();
                d < (*r1 as f64) + (*r2 as f64)
            }
        }
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_rect_has_no_area() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(0, 0, 5, 0).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
        assert!(!Rect::default().contains(0, 0));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(10, 10, 16, 16);
        assert!(r.contains(10, 10));
        assert!(r.contains(25, 25));
        assert!(!r.contains(26, 10));
        assert!(!r.contains(9, 10));
    }

    #[test]
    fn edge_contact_is_not_intersection() {
        let a = Rect::new(0, 0, 16, 16);
        let b = Rect::new(16, 0, 16, 16);
        assert!(!a.intersects(&b));
        let c = Rect::new(15, 15, 16, 16);
        assert!(a.intersects(&c));
        assert_eq!(a.intersection(&c), Some(Rect::new(15, 15, 1, 1)));
    }

    #[test]
    fn degenerate_rect_never_touches() {
        let a = Rect::new(0, 0, 16, 16);
        let b = Rect::new(4, 4, 0, 0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn circle_against_rect() {
        let rect = Shape::Rect(Rect::new(0, 0, 10, 10));
        assert!(rect.intersects(&Shape::circle(15, 5, 6)));
        assert!(!rect.intersects(&Shape::circle(15, 5, 5)));
        assert!(Shape::circle(15, 5, 6).intersects(&rect));
    }

    #[test]
    fn circle_against_circle() {
        let a = Shape::circle(0, 0, 5);
        assert!(a.intersects(&Shape::circle(9, 0, 5)));
        assert!(!a.intersects(&Shape::circle(10, 0, 5)));
        assert!(a.contains(3, 3));
        assert!(!a.contains(5, 0));
        assert_eq!(a.bounds(), Rect::new(-5, -5, 10, 10));
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (-100i32..100, -100i32..100, 0i32..40, 0i32..40)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        }

        #[test]
        fn intersection_lies_inside_both(a in rect_strategy(), b in rect_strategy()) {
            if let Some(i) = a.intersection(&b) {
                prop_assert!(!i.is_empty());
                prop_assert!(a.contains(i.x, i.y) && b.contains(i.x, i.y));
            }
        }
    }
}
