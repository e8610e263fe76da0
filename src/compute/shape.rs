//! Frame generation from shape parameters.
//!
//! A [`Shape`] turns validated parameters into layer 0 rods and a boundary
//! polygon; a [`RailingShape`] packages both into a [`RailingFrame`].
//! Generation is pure and deterministic.

use crate::schema::{
    GeometryError, ParallelogramParameters, Point, Polygon, RectangularParameters, Rod,
    SHAPE_TYPES, ShapeParameters, StaircaseParameters,
};

use super::railing::RailingFrame;

/// Raw frame geometry.
pub trait Shape {
    /// Frame rods in boundary order.
    fn frame_rods(&self) -> Result<Vec<Rod>, GeometryError>;

    /// Outline enclosing every frame rod.
    fn boundary(&self) -> Result<Polygon, GeometryError>;
}

/// A shape that can be turned into a complete railing frame.
pub trait RailingShape: Shape {
    fn generate_frame(&self) -> Result<RailingFrame, GeometryError> {
        RailingFrame::new(self.frame_rods()?, self.boundary()?)
    }
}

/// Closed chain of frame rods through `points`, last point joined to the first.
fn closed_chain(points: &[Point], weight_kg_m: f64) -> Result<Vec<Rod>, GeometryError> {
    let n = points.len();
    (0..n)
        .map(|i| Rod::new(points[i], points[(i + 1) % n], 0, weight_kg_m))
        .collect()
}

/// Stair profile outline: left post, handrail, right post, then the steps
/// from the top right back down to the origin.
fn stair_outline(params: &StaircaseParameters) -> Vec<Point> {
    let n = params.num_steps();
    let (w, h) = (params.stair_width_cm(), params.stair_height_cm());
    let (sw, sh) = (params.step_width_cm(), params.step_height_cm());
    let post = params.post_length_cm();

    let mut points = vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, post),
        Point::new(w, post + h),
        Point::new(w, h),
    ];
    for i in (0..n).rev() {
        let y = i as f64 * sh;
        points.push(Point::new((i + 1) as f64 * sw, y));
        if i > 0 {
            points.push(Point::new(i as f64 * sw, y));
        }
    }
    points
}

/// Staircase railing: sloped handrail above a stepped stair profile.
///
/// With `n` steps the frame has `2n + 3` rods.
#[derive(Debug, Clone)]
pub struct StaircaseShape {
    params: StaircaseParameters,
}

impl StaircaseShape {
    pub fn new(params: StaircaseParameters) -> Self {
        Self { params }
    }
}

impl Shape for StaircaseShape {
    fn frame_rods(&self) -> Result<Vec<Rod>, GeometryError> {
        closed_chain(
            &stair_outline(&self.params),
            self.params.frame_weight_per_meter_kg_m(),
        )
    }

    fn boundary(&self) -> Result<Polygon, GeometryError> {
        Polygon::new(stair_outline(&self.params))
    }
}

impl RailingShape for StaircaseShape {}

/// Generic stair profile whose boundary is recovered from its rods.
#[derive(Debug, Clone)]
pub struct StairShape {
    params: StaircaseParameters,
}

impl StairShape {
    pub fn new(params: StaircaseParameters) -> Self {
        Self { params }
    }
}

impl Shape for StairShape {
    fn frame_rods(&self) -> Result<Vec<Rod>, GeometryError> {
        closed_chain(
            &stair_outline(&self.params),
            self.params.frame_weight_per_meter_kg_m(),
        )
    }

    fn boundary(&self) -> Result<Polygon, GeometryError> {
        let frame = RailingFrame::from_rods(self.frame_rods()?)?;
        Ok(frame.boundary().clone())
    }
}

/// Axis-aligned rectangle: bottom, right, top, left.
#[derive(Debug, Clone)]
pub struct RectangularShape {
    params: RectangularParameters,
}

impl RectangularShape {
    pub fn new(params: RectangularParameters) -> Self {
        Self { params }
    }

    fn corners(&self) -> Vec<Point> {
        let (w, h) = (self.params.width_cm(), self.params.height_cm());
        vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }
}

impl Shape for RectangularShape {
    fn frame_rods(&self) -> Result<Vec<Rod>, GeometryError> {
        closed_chain(&self.corners(), self.params.frame_weight_per_meter_kg_m())
    }

    fn boundary(&self) -> Result<Polygon, GeometryError> {
        Polygon::new(self.corners())
    }
}

impl RailingShape for RectangularShape {}

/// Two vertical posts joined by a sloped handrail and a parallel bottom rail.
#[derive(Debug, Clone)]
pub struct ParallelogramShape {
    params: ParallelogramParameters,
}

impl ParallelogramShape {
    pub fn new(params: ParallelogramParameters) -> Self {
        Self { params }
    }

    fn corners(&self) -> Vec<Point> {
        let post = self.params.post_length_cm();
        let (w, h) = (self.params.slope_width_cm(), self.params.slope_height_cm());
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, post),
            Point::new(w, h + post),
            Point::new(w, h),
        ]
    }
}

impl Shape for ParallelogramShape {
    fn frame_rods(&self) -> Result<Vec<Rod>, GeometryError> {
        closed_chain(&self.corners(), self.params.frame_weight_per_meter_kg_m())
    }

    fn boundary(&self) -> Result<Polygon, GeometryError> {
        Polygon::new(self.corners())
    }
}

impl RailingShape for ParallelogramShape {}

/// Shape for a parameter record.
pub fn create_shape(params: &ShapeParameters) -> Box<dyn RailingShape + Send + Sync> {
    match params {
        ShapeParameters::Staircase(p) => Box::new(StaircaseShape::new(p.clone())),
        ShapeParameters::Rectangular(p) => Box::new(RectangularShape::new(p.clone())),
        ShapeParameters::Parallelogram(p) => Box::new(ParallelogramShape::new(p.clone())),
    }
}

pub fn available_shape_types() -> &'static [&'static str] {
    SHAPE_TYPES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParallelogramDefaults, RectangularDefaults, StaircaseDefaults};
    use proptest::prelude::*;

    fn staircase(post: f64, width: f64, height: f64, steps: usize) -> StaircaseParameters {
        StaircaseParameters::try_from(StaircaseDefaults {
            post_length_cm: post,
            stair_width_cm: width,
            stair_height_cm: height,
            num_steps: steps,
            ..Default::default()
        })
        .unwrap()
    }

    fn close(a: Point, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    #[test]
    fn test_staircase_rod_count_and_layout() {
        let shape = StaircaseShape::new(staircase(120.0, 280.0, 150.0, 9));
        let frame = shape.generate_frame().unwrap();
        assert_eq!(frame.rod_count(), 21);

        let rods = frame.rods();
        assert!(close(rods[0].start(), 0.0, 0.0));
        assert!(close(rods[0].end(), 0.0, 120.0));
        assert!(close(rods[1].end(), 280.0, 270.0));
        assert!(close(rods[2].end(), 280.0, 150.0));
        assert!(close(rods[3].end(), 280.0, 150.0 * 8.0 / 9.0));
        assert!(close(rods[20].end(), 0.0, 0.0));
        assert!(rods.iter().all(|r| r.layer() == 0));
        assert!(rods.iter().all(|r| (r.weight_kg_m() - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_staircase_single_step() {
        let shape = StaircaseShape::new(staircase(100.0, 100.0, 50.0, 1));
        let frame = shape.generate_frame().unwrap();
        assert_eq!(frame.rod_count(), 5);
        // trapezoid between the posts
        let expected_area = 100.0 * 100.0 + 100.0 * 50.0 / 2.0;
        assert!((frame.boundary().area() - expected_area).abs() < 1e-6);
    }

    #[test]
    fn test_staircase_deterministic() {
        let shape = StaircaseShape::new(StaircaseParameters::default());
        assert_eq!(shape.generate_frame().unwrap(), shape.generate_frame().unwrap());
    }

    #[test]
    fn test_stair_shape_boundary_matches_staircase() {
        let params = staircase(120.0, 280.0, 150.0, 9);
        let stair = StairShape::new(params.clone()).boundary().unwrap();
        let staircase = StaircaseShape::new(params).boundary().unwrap();
        assert!((stair.area() - staircase.area()).abs() < 1e-6);
        assert!((stair.perimeter() - staircase.perimeter()).abs() < 1e-6);
    }

    #[test]
    fn test_rectangular_frame() {
        let params = RectangularParameters::try_from(RectangularDefaults::default()).unwrap();
        let frame = RectangularShape::new(params).generate_frame().unwrap();
        assert_eq!(frame.rod_count(), 4);
        assert!((frame.boundary().area() - 20000.0).abs() < 1e-6);
        assert!((frame.total_length_cm() - 600.0).abs() < 1e-9);
        assert!(close(frame.rods()[0].end(), 200.0, 0.0));
    }

    #[test]
    fn test_parallelogram_frame() {
        let params = ParallelogramParameters::try_from(ParallelogramDefaults::default()).unwrap();
        let frame = ParallelogramShape::new(params).generate_frame().unwrap();
        assert_eq!(frame.rod_count(), 4);
        // base 100 (post) times horizontal extent 300
        assert!((frame.boundary().area() - 30000.0).abs() < 1e-6);
        assert!(close(frame.rods()[1].end(), 300.0, 250.0));
    }

    #[test]
    fn test_factory() {
        for name in available_shape_types() {
            let params = ShapeParameters::defaults_for(name).unwrap();
            let frame = create_shape(&params).generate_frame().unwrap();
            assert!(frame.rod_count() >= 4);
        }
    }

    proptest! {
        #[test]
        fn prop_staircase_rods_inside_boundary(
            post in 10.0f64..300.0,
            width in 10.0f64..600.0,
            height in 10.0f64..400.0,
            steps in 1usize..=50,
        ) {
            let shape = StaircaseShape::new(staircase(post, width, height, steps));
            let frame = shape.generate_frame().unwrap();
            prop_assert_eq!(frame.rod_count(), 2 * steps + 3);
            for rod in frame.rods() {
                prop_assert!(frame.contains(rod.start()));
                prop_assert!(frame.contains(rod.end()));
            }
        }
    }
}
