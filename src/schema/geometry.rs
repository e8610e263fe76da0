//! Planar geometry primitives: points, rods and boundary polygons.
//!
//! All coordinates are in centimeters. Values are validated at construction,
//! so downstream code can assume finite coordinates, non-degenerate rods and
//! simple counter-clockwise polygons.

use serde::{Deserialize, Serialize};

/// Tolerance for "on or within the boundary" checks (cm).
pub const BOUNDARY_TOLERANCE_CM: f64 = 0.1;

/// Length below which two points are considered coincident (cm).
pub const COINCIDENT_CM: f64 = 1e-6;

const PARALLEL_EPSILON: f64 = 1e-12;

/// A 2D point in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation, `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Z component of `(b - a) x (c - a)`.
pub(crate) fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(a.lerp(b, t))
}

/// Parameter of the projection of `p` onto the line through `a`-`b`.
pub(crate) fn project_parameter(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 0.0 {
        0.0
    } else {
        ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq
    }
}

/// Intersection between two segments `a0-a1` and `b0-b1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SegmentIntersection {
    None,
    /// Single shared point with its parameter on each segment.
    Point { point: Point, t: f64, u: f64 },
    /// Collinear overlap, given as the parameter range on the first segment.
    Overlap { t0: f64, t1: f64 },
}

pub(crate) fn segment_intersection(
    a0: Point,
    a1: Point,
    b0: Point,
    b1: Point,
) -> SegmentIntersection {
    let r = (a1.x - a0.x, a1.y - a0.y);
    let s = (b1.x - b0.x, b1.y - b0.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    let qp = (b0.x - a0.x, b0.y - a0.y);
    let r_len = r.0.hypot(r.1);
    let s_len = s.0.hypot(s.1);
    if r_len <= 0.0 || s_len <= 0.0 {
        return SegmentIntersection::None;
    }

    // Relative tolerance in parameter space.
    let t_eps = COINCIDENT_CM / r_len;
    let u_eps = COINCIDENT_CM / s_len;

    if denom.abs() <= PARALLEL_EPSILON * r_len * s_len {
        // Parallel: only collinear segments can meet.
        let off_line = (qp.0 * r.1 - qp.1 * r.0).abs() / r_len;
        if off_line > COINCIDENT_CM {
            return SegmentIntersection::None;
        }
        let tb0 = project_parameter(b0, a0, a1);
        let tb1 = project_parameter(b1, a0, a1);
        let lo = tb0.min(tb1).max(0.0);
        let hi = tb0.max(tb1).min(1.0);
        if hi < lo - t_eps {
            return SegmentIntersection::None;
        }
        if (hi - lo).abs() <= t_eps {
            let t = lo.clamp(0.0, 1.0);
            let point = a0.lerp(a1, t);
            let u = project_parameter(point, b0, b1).clamp(0.0, 1.0);
            return SegmentIntersection::Point { point, t, u };
        }
        return SegmentIntersection::Overlap { t0: lo, t1: hi };
    }

    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if t < -t_eps || t > 1.0 + t_eps || u < -u_eps || u > 1.0 + u_eps {
        return SegmentIntersection::None;
    }
    let t = t.clamp(0.0, 1.0);
    let u = u.clamp(0.0, 1.0);
    SegmentIntersection::Point {
        point: a0.lerp(a1, t),
        t,
        u,
    }
}

/// A straight structural member.
///
/// Layer 0 rods form the frame, layers 1 and above are infill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RodRecord", into = "RodRecord")]
pub struct Rod {
    start: Point,
    end: Point,
    layer: u32,
    weight_kg_m: f64,
    start_cut_angle_deg: f64,
    end_cut_angle_deg: f64,
}

/// Unvalidated serialized form of a [`Rod`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodRecord {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub layer: u32,
    pub weight_kg_m: f64,
    #[serde(default)]
    pub start_cut_angle_deg: f64,
    #[serde(default)]
    pub end_cut_angle_deg: f64,
}

impl TryFrom<RodRecord> for Rod {
    type Error = GeometryError;

    fn try_from(record: RodRecord) -> Result<Self, Self::Error> {
        Rod::new(record.start, record.end, record.layer, record.weight_kg_m)?
            .with_cut_angles(record.start_cut_angle_deg, record.end_cut_angle_deg)
    }
}

impl From<Rod> for RodRecord {
    fn from(rod: Rod) -> Self {
        Self {
            start: rod.start,
            end: rod.end,
            layer: rod.layer,
            weight_kg_m: rod.weight_kg_m,
            start_cut_angle_deg: rod.start_cut_angle_deg,
            end_cut_angle_deg: rod.end_cut_angle_deg,
        }
    }
}

impl Rod {
    /// Create a rod with square (0 degree) cuts at both ends.
    pub fn new(start: Point, end: Point, layer: u32, weight_kg_m: f64) -> Result<Self, GeometryError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate);
        }
        if start.distance(end) <= COINCIDENT_CM {
            return Err(GeometryError::ZeroLengthRod);
        }
        if !weight_kg_m.is_finite() || weight_kg_m <= 0.0 {
            return Err(GeometryError::InvalidWeight(weight_kg_m));
        }
        Ok(Self {
            start,
            end,
            layer,
            weight_kg_m,
            start_cut_angle_deg: 0.0,
            end_cut_angle_deg: 0.0,
        })
    }

    /// Replace both cut angles. Each must lie in [-90, 90] degrees.
    pub fn with_cut_angles(mut self, start_deg: f64, end_deg: f64) -> Result<Self, GeometryError> {
        for angle in [start_deg, end_deg] {
            if !angle.is_finite() || !(-90.0..=90.0).contains(&angle) {
                return Err(GeometryError::InvalidCutAngle(angle));
            }
        }
        self.start_cut_angle_deg = start_deg;
        self.end_cut_angle_deg = end_deg;
        Ok(self)
    }

    /// Same rod attributes on new endpoints.
    pub fn with_endpoints(&self, start: Point, end: Point) -> Result<Self, GeometryError> {
        Rod::new(start, end, self.layer, self.weight_kg_m)?
            .with_cut_angles(self.start_cut_angle_deg, self.end_cut_angle_deg)
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn is_frame(&self) -> bool {
        self.layer == 0
    }

    pub fn weight_kg_m(&self) -> f64 {
        self.weight_kg_m
    }

    pub fn start_cut_angle_deg(&self) -> f64 {
        self.start_cut_angle_deg
    }

    pub fn end_cut_angle_deg(&self) -> f64 {
        self.end_cut_angle_deg
    }

    pub fn length_cm(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Weight from length and linear weight.
    pub fn weight_kg(&self) -> f64 {
        self.length_cm() / 100.0 * self.weight_kg_m
    }

    /// Signed angle from vertical in degrees, in (-90, 90].
    ///
    /// 0 is vertical, positive values lean right (top end towards +x),
    /// horizontal rods report 90. Independent of rod direction.
    pub fn angle_from_vertical_deg(&self) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let mut angle = dx.atan2(dy).to_degrees();
        if angle > 90.0 {
            angle -= 180.0;
        } else if angle <= -90.0 {
            angle += 180.0;
        }
        angle
    }

    /// Point at `distance_cm` from the start, clamped to the rod.
    pub fn point_at(&self, distance_cm: f64) -> Point {
        let t = (distance_cm / self.length_cm()).clamp(0.0, 1.0);
        self.start.lerp(self.end, t)
    }

    pub fn distance_to(&self, point: Point) -> f64 {
        distance_to_segment(point, self.start, self.end)
    }

    /// True when the interiors of both rods meet in a single point.
    ///
    /// Shared endpoints, T-junctions and collinear overlaps do not cross.
    pub fn crosses(&self, other: &Rod) -> bool {
        match segment_intersection(self.start, self.end, other.start, other.end) {
            SegmentIntersection::Point { point, .. } => {
                let on_self_end =
                    point.distance(self.start) <= COINCIDENT_CM || point.distance(self.end) <= COINCIDENT_CM;
                let on_other_end = point.distance(other.start) <= COINCIDENT_CM
                    || point.distance(other.end) <= COINCIDENT_CM;
                !on_self_end && !on_other_end
            }
            _ => false,
        }
    }

    /// Bill-of-materials row for this rod.
    pub fn bom_entry(&self, id: usize) -> BomEntry {
        BomEntry {
            id,
            length_cm: round_to(self.length_cm(), 2),
            start_cut_angle_deg: round_to(self.start_cut_angle_deg, 1),
            end_cut_angle_deg: round_to(self.end_cut_angle_deg, 1),
            weight_kg: round_to(self.weight_kg(), 3),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// One bill-of-materials row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub id: usize,
    pub length_cm: f64,
    pub start_cut_angle_deg: f64,
    pub end_cut_angle_deg: f64,
    pub weight_kg: f64,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A simple polygon stored counter-clockwise without a closing vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = GeometryError;

    fn try_from(vertices: Vec<Point>) -> Result<Self, Self::Error> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

impl Polygon {
    /// Build a polygon from a vertex ring in either orientation.
    ///
    /// A repeated closing vertex and consecutive duplicates are dropped.
    pub fn new(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        if vertices.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate);
        }

        let mut ring: Vec<Point> = Vec::with_capacity(vertices.len());
        for p in vertices {
            if ring.last().is_none_or(|last| last.distance(p) > COINCIDENT_CM) {
                ring.push(p);
            }
        }
        while ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) <= COINCIDENT_CM {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeometryError::TooFewVertices(ring.len()));
        }

        let signed = signed_area(&ring);
        if signed.abs() <= COINCIDENT_CM {
            return Err(GeometryError::DegeneratePolygon);
        }
        if signed < 0.0 {
            ring.reverse();
        }

        let polygon = Self { vertices: ring };
        polygon.check_simple()?;
        Ok(polygon)
    }

    fn check_simple(&self) -> Result<(), GeometryError> {
        let n = self.vertices.len();
        let edges: Vec<(Point, Point)> = self.edges().collect();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                let (a0, a1) = edges[i];
                let (b0, b1) = edges[j];
                match segment_intersection(a0, a1, b0, b1) {
                    SegmentIntersection::None => {}
                    SegmentIntersection::Point { .. } if adjacent => {}
                    _ => return Err(GeometryError::SelfIntersecting(i, j)),
                }
            }
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Edges in ring order, closing edge last.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in &self.vertices {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        bounds
    }

    pub fn distance_to_boundary(&self, point: Point) -> f64 {
        self.edges()
            .map(|(a, b)| distance_to_segment(point, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Strict even-odd interior test, boundary points are unspecified.
    fn interior_contains(&self, point: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Point on or within the polygon, using [`BOUNDARY_TOLERANCE_CM`].
    pub fn contains(&self, point: Point) -> bool {
        self.contains_with_tolerance(point, BOUNDARY_TOLERANCE_CM)
    }

    /// Point within the polygon enlarged by `tolerance_cm`.
    pub fn contains_with_tolerance(&self, point: Point, tolerance_cm: f64) -> bool {
        self.distance_to_boundary(point) <= tolerance_cm || self.interior_contains(point)
    }

    /// Whole segment within the polygon enlarged by `tolerance_cm`.
    ///
    /// The segment is split at every boundary crossing; each piece is then
    /// either inside or outside and is classified by its midpoint.
    pub fn covers_segment(&self, a: Point, b: Point, tolerance_cm: f64) -> bool {
        if !self.contains_with_tolerance(a, tolerance_cm) || !self.contains_with_tolerance(b, tolerance_cm) {
            return false;
        }
        let mut params = vec![0.0, 1.0];
        for (e0, e1) in self.edges() {
            match segment_intersection(a, b, e0, e1) {
                SegmentIntersection::None => {}
                SegmentIntersection::Point { t, .. } => params.push(t),
                SegmentIntersection::Overlap { t0, t1 } => {
                    params.push(t0);
                    params.push(t1);
                }
            }
        }
        params.sort_by(f64::total_cmp);
        params
            .windows(2)
            .filter(|w| w[1] - w[0] > 1e-12)
            .all(|w| self.contains_with_tolerance(a.lerp(b, (w[0] + w[1]) / 2.0), tolerance_cm))
    }

    /// Points where the segment `a`-`b` meets the polygon boundary.
    pub fn segment_crossings(&self, a: Point, b: Point) -> Vec<Point> {
        let mut points = Vec::new();
        for (e0, e1) in self.edges() {
            match segment_intersection(a, b, e0, e1) {
                SegmentIntersection::None => {}
                SegmentIntersection::Point { point, .. } => points.push(point),
                SegmentIntersection::Overlap { t0, t1 } => {
                    points.push(a.lerp(b, t0));
                    points.push(a.lerp(b, t1));
                }
            }
        }
        points
    }

    /// Point at `distance_cm` along the ring from the first vertex.
    ///
    /// Distances wrap around the perimeter.
    pub fn point_at_distance(&self, distance_cm: f64) -> Point {
        let perimeter = self.perimeter();
        let mut remaining = distance_cm.rem_euclid(perimeter);
        for (a, b) in self.edges() {
            let len = a.distance(b);
            if remaining <= len {
                return a.lerp(b, remaining / len);
            }
            remaining -= len;
        }
        self.vertices[0]
    }
}

/// Shoelace area, positive for counter-clockwise rings.
pub(crate) fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Geometric validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Coordinates must be finite")]
    NonFiniteCoordinate,
    #[error("Rod endpoints must be distinct")]
    ZeroLengthRod,
    #[error("Rod weight per meter must be positive, got {0}")]
    InvalidWeight(f64),
    #[error("Cut angle {0} is outside [-90, 90] degrees")]
    InvalidCutAngle(f64),
    #[error("Polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),
    #[error("Polygon area must be positive")]
    DegeneratePolygon,
    #[error("Polygon edges {0} and {1} intersect")]
    SelfIntersecting(usize, usize),
    #[error("Frame must contain at least one rod")]
    EmptyFrame,
    #[error("Frame rod {index} is on layer {layer}, expected layer 0")]
    FrameRodLayer { index: usize, layer: u32 },
    #[error("Frame rod {0} has an endpoint outside the boundary")]
    FrameRodOutsideBoundary(usize),
    #[error("Frame rods enclose {0} regions, expected exactly one")]
    AmbiguousBoundary(usize),
    #[error("Infill rod {0} is on layer 0")]
    InfillRodOnFrameLayer(usize),
    #[error("Rod index {index} out of range for {len} rods")]
    RodIndexOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ])
        .unwrap()
    }

    #[test]
    fn test_rod_derived_values() {
        let rod = Rod::new(Point::new(0.0, 0.0), Point::new(0.0, 200.0), 1, 0.5).unwrap();
        assert!((rod.length_cm() - 200.0).abs() < 1e-9);
        assert!((rod.weight_kg() - 1.0).abs() < 1e-9);
        assert!(rod.angle_from_vertical_deg().abs() < 1e-9);
    }

    #[test]
    fn test_rod_rejects_zero_length() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(Rod::new(p, p, 0, 0.5), Err(GeometryError::ZeroLengthRod));
    }

    #[test]
    fn test_rod_rejects_bad_weight_and_cut() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(matches!(Rod::new(a, b, 0, 0.0), Err(GeometryError::InvalidWeight(_))));
        let rod = Rod::new(a, b, 0, 0.5).unwrap();
        assert!(matches!(
            rod.with_cut_angles(95.0, 0.0),
            Err(GeometryError::InvalidCutAngle(_))
        ));
    }

    #[test]
    fn test_angle_from_vertical_is_direction_independent() {
        let up = Rod::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 1, 0.3).unwrap();
        let down = Rod::new(Point::new(10.0, 10.0), Point::new(0.0, 0.0), 1, 0.3).unwrap();
        assert!((up.angle_from_vertical_deg() - 45.0).abs() < 1e-9);
        assert!((down.angle_from_vertical_deg() - 45.0).abs() < 1e-9);

        let horizontal = Rod::new(Point::new(10.0, 0.0), Point::new(0.0, 0.0), 0, 0.3).unwrap();
        assert!((horizontal.angle_from_vertical_deg() - 90.0).abs() < 1e-9);

        let left = Rod::new(Point::new(10.0, 0.0), Point::new(0.0, 10.0), 1, 0.3).unwrap();
        assert!((left.angle_from_vertical_deg() + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_crosses_ignores_touching() {
        let a = Rod::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 1, 0.3).unwrap();
        let b = Rod::new(Point::new(0.0, 10.0), Point::new(10.0, 0.0), 1, 0.3).unwrap();
        let c = Rod::new(Point::new(10.0, 10.0), Point::new(20.0, 0.0), 1, 0.3).unwrap();
        let t = Rod::new(Point::new(5.0, 5.0), Point::new(5.0, 20.0), 1, 0.3).unwrap();
        assert!(a.crosses(&b));
        assert!(!a.crosses(&c));
        assert!(!a.crosses(&t));
    }

    #[test]
    fn test_bom_entry_rounding() {
        let rod = Rod::new(Point::new(0.0, 0.0), Point::new(0.0, 123.4567), 1, 0.3)
            .unwrap()
            .with_cut_angles(12.34, -5.55)
            .unwrap();
        let entry = rod.bom_entry(7);
        assert_eq!(entry.id, 7);
        assert!((entry.length_cm - 123.46).abs() < 1e-9);
        assert!((entry.start_cut_angle_deg - 12.3).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_normalizes_orientation() {
        let clockwise = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(clockwise.vertices().len(), 4);
        assert!((clockwise.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_rejects_degenerate() {
        let line = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ]);
        assert_eq!(line, Err(GeometryError::DegeneratePolygon));

        let bowtie = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
        ]);
        assert!(matches!(bowtie, Err(GeometryError::SelfIntersecting(_, _))));
    }

    #[test]
    fn test_contains_is_boundary_inclusive() {
        let poly = square(100.0);
        assert!(poly.contains(Point::new(50.0, 50.0)));
        assert!(poly.contains(Point::new(0.0, 50.0)));
        assert!(poly.contains(Point::new(100.05, 50.0)));
        assert!(!poly.contains(Point::new(100.5, 50.0)));
    }

    #[test]
    fn test_covers_segment_on_concave_polygon() {
        // L-shape, the notch is at the top right.
        let l_shape = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 50.0),
            Point::new(50.0, 100.0),
            Point::new(0.0, 100.0),
        ])
        .unwrap();
        assert!(l_shape.covers_segment(Point::new(10.0, 10.0), Point::new(90.0, 10.0), 0.1));
        assert!(!l_shape.covers_segment(Point::new(10.0, 90.0), Point::new(90.0, 40.0), 0.1));
        assert!(l_shape.covers_segment(Point::new(50.0, 50.0), Point::new(50.0, 100.0), 0.1));
    }

    #[test]
    fn test_point_at_distance_wraps() {
        let poly = square(10.0);
        let p = poly.point_at_distance(45.0);
        assert!((p.x - 5.0).abs() < 1e-9 && p.y.abs() < 1e-9);
    }

    #[test]
    fn test_rod_serde_validates() {
        let json = r#"{"start":{"x":0.0,"y":0.0},"end":{"x":0.0,"y":0.0},"weight_kg_m":0.5}"#;
        assert!(serde_json::from_str::<Rod>(json).is_err());

        let rod = Rod::new(Point::new(0.0, 0.0), Point::new(1.0, 2.0), 2, 0.5).unwrap();
        let parsed: Rod = serde_json::from_str(&serde_json::to_string(&rod).unwrap()).unwrap();
        assert_eq!(parsed, rod);
    }
}
