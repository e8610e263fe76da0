//! Largest inscribed circle of a polygon ring (pole of inaccessibility).
//!
//! Grid refinement over the bounding box with a best-first queue ordered by
//! the upper bound each square could still reach. Holes count as outside,
//! and their edges bound the circle like the outer ring's.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::schema::{Point, distance_to_segment};

/// Upper bound on refinement steps for pathological rings.
const MAX_REFINEMENTS: usize = 10_000;

struct Square {
    center: Point,
    half: f64,
    distance: f64,
    potential: f64,
}

impl Square {
    fn new(center: Point, half: f64, rings: &[&[Point]]) -> Self {
        let distance = signed_distance(center, rings);
        Self {
            center,
            half,
            distance,
            potential: distance + half * std::f64::consts::SQRT_2,
        }
    }
}

impl PartialEq for Square {
    fn eq(&self, other: &Self) -> bool {
        self.potential.total_cmp(&other.potential) == Ordering::Equal
    }
}

impl Eq for Square {}

impl PartialOrd for Square {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Square {
    fn cmp(&self, other: &Self) -> Ordering {
        self.potential.total_cmp(&other.potential)
    }
}

/// Even-odd point in ring test. Points on the ring may land either way.
pub(super) fn ring_contains(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x) {
            inside = !inside;
        }
    }
    inside
}

/// Distance to the nearest ring edge, positive inside the region and
/// negative outside. The first ring is the outer boundary, the rest holes.
fn signed_distance(p: Point, rings: &[&[Point]]) -> f64 {
    let mut inside = false;
    let mut min_dist = f64::INFINITY;
    for ring in rings {
        if ring_contains(ring, p) {
            inside = !inside;
        }
        let n = ring.len();
        for i in 0..n {
            min_dist = min_dist.min(distance_to_segment(p, ring[i], ring[(i + 1) % n]));
        }
    }
    if inside { min_dist } else { -min_dist }
}

/// Area centroid of the ring, falling back to the vertex mean.
fn centroid(ring: &[Point]) -> Point {
    let n = ring.len();
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let f = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * f;
        cy += (a.y + b.y) * f;
        area += f * 3.0;
    }
    if area.abs() < 1e-12 {
        let sx: f64 = ring.iter().map(|p| p.x).sum();
        let sy: f64 = ring.iter().map(|p| p.y).sum();
        return Point::new(sx / n as f64, sy / n as f64);
    }
    Point::new(cx / area, cy / area)
}

/// Radius of the largest circle that fits inside the ring.
///
/// Returns 0.0 for rings with fewer than three vertices or no extent.
pub fn incircle_radius(ring: &[Point]) -> f64 {
    incircle_radius_with_holes(ring, &[])
}

/// Radius of the largest circle inside `ring` that avoids every hole.
pub fn incircle_radius_with_holes(ring: &[Point], holes: &[Vec<Point>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let rings: Vec<&[Point]> = std::iter::once(ring)
        .chain(holes.iter().map(Vec::as_slice).filter(|h| h.len() >= 3))
        .collect();

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in ring {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let width = max_x - min_x;
    let height = max_y - min_y;
    let cell_size = width.min(height);
    if cell_size <= 0.0 {
        return 0.0;
    }
    let precision = (cell_size * 1e-3).max(1e-4);
    let half = cell_size / 2.0;

    let mut queue = BinaryHeap::new();
    let mut y = min_y;
    while y < max_y {
        let mut x = min_x;
        while x < max_x {
            queue.push(Square::new(Point::new(x + half, y + half), half, &rings));
            x += cell_size;
        }
        y += cell_size;
    }

    let mut best = Square::new(centroid(ring), 0.0, &rings);
    let bbox_center = Square::new(
        Point::new(min_x + width / 2.0, min_y + height / 2.0),
        0.0,
        &rings,
    );
    if bbox_center.distance > best.distance {
        best = bbox_center;
    }

    let mut refinements = 0;
    while let Some(square) = queue.pop() {
        if square.distance > best.distance {
            best = Square::new(square.center, 0.0, &rings);
        }
        if square.potential - best.distance <= precision {
            // Ordered by potential, nothing left can improve enough.
            break;
        }
        refinements += 1;
        if refinements >= MAX_REFINEMENTS {
            break;
        }
        let h = square.half / 2.0;
        for (dx, dy) in [(-h, -h), (h, -h), (-h, h), (h, h)] {
            let center = Point::new(square.center.x + dx, square.center.y + dy);
            queue.push(Square::new(center, h, &rings));
        }
    }

    best.distance.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_incircle() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        assert!((incircle_radius(&ring) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_rectangle_incircle_limited_by_short_side() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(200.0, 40.0),
            Point::new(0.0, 40.0),
        ];
        assert!((incircle_radius(&ring) - 20.0).abs() < 0.1);
    }

    #[test]
    fn test_right_triangle_incircle() {
        // Legs 30 and 40, hypotenuse 50: r = (a + b - c) / 2 = 10.
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(0.0, 30.0),
        ];
        assert!((incircle_radius(&ring) - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_hole_pushes_circle_into_corner() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let hole = vec![
            Point::new(40.0, 40.0),
            Point::new(40.0, 60.0),
            Point::new(60.0, 60.0),
            Point::new(60.0, 40.0),
        ];
        // Tangent to two walls and the hole corner: r = 40 * sqrt(2) / (1 + sqrt(2)).
        let expected = 40.0 * std::f64::consts::SQRT_2 / (1.0 + std::f64::consts::SQRT_2);
        let radius = incircle_radius_with_holes(&ring, &[hole]);
        assert!((radius - expected).abs() < 0.2);
        assert!(!ring_contains(&ring, Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_degenerate_ring() {
        let ring = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(incircle_radius(&ring), 0.0);
    }
}
