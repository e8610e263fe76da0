//! Anchor point placement on frame rods and anchor lookup for editing.

use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::schema::{AnchorPoint, ConfigError, Point, Rod, check_positive};

use super::railing::RailingFrame;

/// Distance kept free at both ends of a frame rod (cm).
pub const SEGMENT_END_MARGIN_CM: f64 = 2.0;

/// Horizontal run below which a frame rod counts as vertical, relative to its rise.
const VERTICAL_RATIO: f64 = 0.1;

/// Looks up unused anchors near a position, e.g. while dragging a rod end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPointFinder {
    search_radius_cm: f64,
}

impl Default for AnchorPointFinder {
    fn default() -> Self {
        Self {
            search_radius_cm: 10.0,
        }
    }
}

impl AnchorPointFinder {
    pub fn new(search_radius_cm: f64) -> Result<Self, ConfigError> {
        check_positive("search_radius_cm", search_radius_cm)?;
        Ok(Self { search_radius_cm })
    }

    pub fn search_radius_cm(&self) -> f64 {
        self.search_radius_cm
    }

    /// Index of the closest unused anchor within the search radius.
    pub fn find_nearest_unconnected(&self, position: Point, anchors: &[AnchorPoint]) -> Option<usize> {
        let mut nearest = None;
        let mut nearest_distance = f64::INFINITY;
        for (i, anchor) in anchors.iter().enumerate() {
            if anchor.used {
                continue;
            }
            let distance = position.distance(anchor.position);
            if distance <= self.search_radius_cm && distance < nearest_distance {
                nearest = Some(i);
                nearest_distance = distance;
            }
        }
        nearest
    }

    /// All unused anchors within the search radius as `(index, distance)`,
    /// nearest first.
    pub fn find_all_unconnected_within_radius(
        &self,
        position: Point,
        anchors: &[AnchorPoint],
    ) -> Vec<(usize, f64)> {
        let mut found: Vec<(usize, f64)> = anchors
            .iter()
            .enumerate()
            .filter(|(_, anchor)| !anchor.used)
            .map(|(i, anchor)| (i, position.distance(anchor.position)))
            .filter(|(_, distance)| *distance <= self.search_radius_cm)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }
}

/// True when the rod's horizontal run is under a tenth of its rise.
pub fn is_vertical_segment(rod: &Rod) -> bool {
    let dx = (rod.end().x - rod.start().x).abs();
    let dy = (rod.end().y - rod.start().y).abs();
    dy > 0.0 && dx / dy < VERTICAL_RATIO
}

/// Anchor spacing settings for per-segment placement.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSpacing {
    pub vertical_cm: f64,
    pub other_cm: f64,
}

impl SegmentSpacing {
    pub fn for_segment(&self, is_vertical: bool) -> f64 {
        if is_vertical { self.vertical_cm } else { self.other_cm }
    }
}

/// Place anchors along every frame rod.
///
/// Each rod keeps a free margin at both ends; the usable part gets
/// `max(usable / spacing, 1)` evenly spread anchors with a small random
/// offset. When the first anchor of a rod lands too close to the last anchor
/// of the previous rod, it is dropped. Anchors come back in rod order.
pub fn segment_anchors<R: Rng + ?Sized>(
    frame: &RailingFrame,
    spacing: SegmentSpacing,
    rng: &mut R,
) -> Vec<AnchorPoint> {
    let mut per_segment: Vec<Vec<AnchorPoint>> = Vec::with_capacity(frame.rod_count());

    for (index, rod) in frame.rods().iter().enumerate() {
        let vertical = is_vertical_segment(rod);
        let min_distance = spacing.for_segment(vertical);
        let length = rod.length_cm();
        let usable = length - 2.0 * SEGMENT_END_MARGIN_CM;
        if usable <= 0.0 {
            warn!(
                "Segment {index} too short ({length:.1}cm) for {SEGMENT_END_MARGIN_CM}cm margins, skipping anchors"
            );
            per_segment.push(Vec::new());
            continue;
        }

        let count = ((usable / min_distance) as usize).max(1);
        let max_offset = (min_distance * 0.2).min(SEGMENT_END_MARGIN_CM * 0.3);
        let angle = rod.angle_from_vertical_deg();
        let mut anchors: Vec<AnchorPoint> = (0..count)
            .map(|i| {
                let base = if count > 1 {
                    i as f64 / (count - 1) as f64 * usable
                } else {
                    usable / 2.0
                };
                let offset = if max_offset > 0.0 {
                    rng.gen_range(-max_offset..=max_offset)
                } else {
                    0.0
                };
                let along = (SEGMENT_END_MARGIN_CM + base + offset)
                    .clamp(SEGMENT_END_MARGIN_CM, length - SEGMENT_END_MARGIN_CM);
                AnchorPoint::new(rod.point_at(along), index, vertical).with_segment_angle(angle)
            })
            .collect();

        let crowded = match (per_segment.last().and_then(|prev| prev.last()), anchors.first()) {
            (Some(last_prev), Some(first)) => {
                let limit = spacing
                    .for_segment(last_prev.is_vertical_segment)
                    .min(spacing.for_segment(first.is_vertical_segment));
                let distance = first.position.distance(last_prev.position);
                if distance < limit {
                    debug!(
                        "Removing anchor at segment boundary {}->{index}: {distance:.1}cm < {limit:.1}cm",
                        index - 1
                    );
                }
                distance < limit
            }
            _ => false,
        };
        if crowded {
            anchors.remove(0);
        }
        per_segment.push(anchors);
    }

    let anchors: Vec<AnchorPoint> = per_segment.into_iter().flatten().collect();
    info!(
        "Generated {} anchor points on {} frame segments",
        anchors.len(),
        frame.rod_count()
    );
    anchors
}

/// Place `count` anchors evenly around the boundary ring with random
/// displacement, keeping neighbours at least `min_distance_cm` apart.
///
/// When the ring is too short for `count` anchors at that spacing, fewer are
/// placed. Each anchor is attributed to the nearest frame rod.
pub fn boundary_anchors<R: Rng + ?Sized>(
    frame: &RailingFrame,
    count: usize,
    min_distance_cm: f64,
    rng: &mut R,
) -> Vec<AnchorPoint> {
    let perimeter = frame.boundary().perimeter();
    let mut count = count.max(1);
    let mut spacing = perimeter / count as f64;
    if spacing < min_distance_cm {
        count = ((perimeter / min_distance_cm) as usize).max(1);
        spacing = perimeter / count as f64;
    }
    let max_displacement = (spacing - min_distance_cm) / 2.0;

    (0..count)
        .map(|i| {
            let displacement = if max_displacement > 0.0 {
                rng.gen_range(-max_displacement..=max_displacement)
            } else {
                0.0
            };
            let position = frame
                .boundary()
                .point_at_distance(i as f64 * spacing + displacement);
            attribute_to_frame(frame, position)
        })
        .collect()
}

fn attribute_to_frame(frame: &RailingFrame, position: Point) -> AnchorPoint {
    let nearest = frame
        .rods()
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.distance_to(position).total_cmp(&b.1.distance_to(position)));
    match nearest {
        Some((index, rod)) => AnchorPoint::new(position, index, is_vertical_segment(rod))
            .with_segment_angle(rod.angle_from_vertical_deg()),
        None => AnchorPoint::new(position, 0, false),
    }
}

/// Shuffle anchors and deal them round-robin to layers `1..=num_layers`.
pub fn distribute_to_layers<R: Rng + ?Sized>(
    anchors: &mut [AnchorPoint],
    num_layers: u32,
    rng: &mut R,
) {
    anchors.shuffle(rng);
    for (i, anchor) in anchors.iter_mut().enumerate() {
        anchor.layer = Some(i as u32 % num_layers + 1);
    }
}

/// Fold an angle difference into [-90, 90]: the cut is measured from
/// whichever side of the frame rod is closer.
fn fold_cut_angle(angle: f64) -> f64 {
    let mut angle = angle;
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle < -180.0 {
        angle += 360.0;
    }
    if angle > 90.0 {
        180.0 - angle
    } else if angle < -90.0 {
        -180.0 - angle
    } else {
        angle
    }
}

/// Start and end cut angles of a rod meeting frame rods at the given angles.
pub fn cut_angles(rod_angle_deg: f64, start_segment_deg: f64, end_segment_deg: f64) -> (f64, f64) {
    (
        fold_cut_angle(rod_angle_deg - start_segment_deg),
        fold_cut_angle(rod_angle_deg - end_segment_deg),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{RailingShape, RectangularShape};
    use crate::schema::RectangularParameters;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rectangle() -> RailingFrame {
        RectangularShape::new(RectangularParameters::default())
            .generate_frame()
            .unwrap()
    }

    fn anchor(x: f64, y: f64, used: bool) -> AnchorPoint {
        let mut a = AnchorPoint::new(Point::new(x, y), 0, true);
        a.used = used;
        a
    }

    #[test]
    fn test_finder_rejects_bad_radius() {
        assert!(AnchorPointFinder::new(0.0).is_err());
        assert!(AnchorPointFinder::new(-1.0).is_err());
        assert!((AnchorPointFinder::default().search_radius_cm() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_find_nearest_skips_used_and_far() {
        let finder = AnchorPointFinder::new(5.0).unwrap();
        let anchors = vec![
            anchor(1.0, 0.0, true),
            anchor(3.0, 0.0, false),
            anchor(2.0, 0.0, false),
            anchor(20.0, 0.0, false),
        ];
        assert_eq!(finder.find_nearest_unconnected(Point::new(0.0, 0.0), &anchors), Some(2));
        assert_eq!(finder.find_nearest_unconnected(Point::new(50.0, 0.0), &anchors), None);
        assert_eq!(finder.find_nearest_unconnected(Point::new(0.0, 0.0), &[]), None);
    }

    #[test]
    fn test_find_all_sorted() {
        let finder = AnchorPointFinder::new(5.0).unwrap();
        let anchors = vec![
            anchor(4.0, 0.0, false),
            anchor(1.0, 0.0, true),
            anchor(2.0, 0.0, false),
            anchor(5.0, 0.0, false),
        ];
        let found = finder.find_all_unconnected_within_radius(Point::new(0.0, 0.0), &anchors);
        let indices: Vec<usize> = found.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![2, 0, 3]);
        assert!((found[2].1 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_classification() {
        let up = Rod::new(Point::new(0.0, 0.0), Point::new(5.0, 100.0), 0, 0.5).unwrap();
        let lean = Rod::new(Point::new(0.0, 0.0), Point::new(20.0, 100.0), 0, 0.5).unwrap();
        let flat = Rod::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0, 0.5).unwrap();
        assert!(is_vertical_segment(&up));
        assert!(!is_vertical_segment(&lean));
        assert!(!is_vertical_segment(&flat));
    }

    #[test]
    fn test_segment_anchors_respect_margins() {
        let frame = rectangle();
        let mut rng = StdRng::seed_from_u64(3);
        let spacing = SegmentSpacing {
            vertical_cm: 15.0,
            other_cm: 5.0,
        };
        let anchors = segment_anchors(&frame, spacing, &mut rng);
        assert!(!anchors.is_empty());
        for a in &anchors {
            let rod = &frame.rods()[a.frame_segment_index];
            assert!(rod.distance_to(a.position) < 1e-9);
            assert!(a.position.distance(rod.start()) >= SEGMENT_END_MARGIN_CM - 1e-9);
            assert!(a.position.distance(rod.end()) >= SEGMENT_END_MARGIN_CM - 1e-9);
            assert_eq!(a.is_vertical_segment, is_vertical_segment(rod));
            assert!((a.frame_segment_angle_deg - rod.angle_from_vertical_deg()).abs() < 1e-12);
            assert!(!a.used);
        }
        // bottom: 196 usable / 5 = 39 anchors; right: 96 / 15 = 6, minus the
        // one dropped next to the bottom right corner
        let bottom = anchors.iter().filter(|a| a.frame_segment_index == 0).count();
        let right = anchors.iter().filter(|a| a.frame_segment_index == 1).count();
        assert_eq!(bottom, 39);
        assert_eq!(right, 5);
    }

    #[test]
    fn test_segment_anchors_skip_short_rods() {
        let short = vec![
            Rod::new(Point::new(0.0, 0.0), Point::new(3.0, 0.0), 0, 0.5).unwrap(),
            Rod::new(Point::new(3.0, 0.0), Point::new(3.0, 100.0), 0, 0.5).unwrap(),
            Rod::new(Point::new(3.0, 100.0), Point::new(0.0, 100.0), 0, 0.5).unwrap(),
            Rod::new(Point::new(0.0, 100.0), Point::new(0.0, 0.0), 0, 0.5).unwrap(),
        ];
        let frame = RailingFrame::from_rods(short).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let anchors = segment_anchors(
            &frame,
            SegmentSpacing {
                vertical_cm: 15.0,
                other_cm: 5.0,
            },
            &mut rng,
        );
        assert!(anchors.iter().all(|a| a.frame_segment_index % 2 == 1));
    }

    #[test]
    fn test_boundary_anchors_spacing() {
        let frame = rectangle();
        let mut rng = StdRng::seed_from_u64(9);
        let anchors = boundary_anchors(&frame, 40, 10.0, &mut rng);
        assert_eq!(anchors.len(), 40);
        for a in &anchors {
            assert!(frame.boundary().distance_to_boundary(a.position) < 1e-6);
        }

        // 600 cm perimeter cannot hold 100 anchors 10 cm apart
        let crowded = boundary_anchors(&frame, 100, 10.0, &mut rng);
        assert_eq!(crowded.len(), 60);
    }

    #[test]
    fn test_distribute_round_robin() {
        let mut anchors: Vec<AnchorPoint> = (0..10).map(|i| anchor(i as f64, 0.0, false)).collect();
        let mut rng = StdRng::seed_from_u64(5);
        distribute_to_layers(&mut anchors, 3, &mut rng);
        let count = |layer| anchors.iter().filter(|a| a.layer == Some(layer)).count();
        assert_eq!(count(1), 4);
        assert_eq!(count(2), 3);
        assert_eq!(count(3), 3);
    }

    #[test]
    fn test_cut_angles() {
        let cases = [
            ((25.0, 20.0, -15.0), (5.0, 40.0)),
            ((50.0, -80.0, 80.0), (50.0, -30.0)),
            ((0.0, 90.0, 0.0), (-90.0, 0.0)),
            ((45.0, -85.0, 85.0), (50.0, -40.0)),
        ];
        for ((rod, start, end), (exp_start, exp_end)) in cases {
            let (s, e) = cut_angles(rod, start, end);
            assert!((s - exp_start).abs() < 1e-9, "{rod} {start}: {s}");
            assert!((e - exp_end).abs() < 1e-9, "{rod} {end}: {e}");
        }
    }
}
