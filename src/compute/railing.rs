//! Railing frame and infill aggregates.

use serde::{Deserialize, Serialize};

use crate::schema::{
    AnchorPoint, BOUNDARY_TOLERANCE_CM, BomEntry, GeometryError, Point, Polygon, Rod,
};

use super::planar::PlanarArrangement;

/// The fixed structure of a railing: layer 0 rods and their outline.
///
/// Immutable once built. Every rod is on layer 0 and every rod endpoint lies
/// on or within the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord")]
pub struct RailingFrame {
    rods: Vec<Rod>,
    boundary: Polygon,
}

#[derive(Deserialize)]
struct FrameRecord {
    rods: Vec<Rod>,
    boundary: Polygon,
}

impl TryFrom<FrameRecord> for RailingFrame {
    type Error = GeometryError;

    fn try_from(record: FrameRecord) -> Result<Self, Self::Error> {
        RailingFrame::new(record.rods, record.boundary)
    }
}

impl RailingFrame {
    pub fn new(rods: Vec<Rod>, boundary: Polygon) -> Result<Self, GeometryError> {
        if rods.is_empty() {
            return Err(GeometryError::EmptyFrame);
        }
        for (index, rod) in rods.iter().enumerate() {
            if !rod.is_frame() {
                return Err(GeometryError::FrameRodLayer {
                    index,
                    layer: rod.layer(),
                });
            }
            if !boundary.contains(rod.start()) || !boundary.contains(rod.end()) {
                return Err(GeometryError::FrameRodOutsideBoundary(index));
            }
        }
        Ok(Self { rods, boundary })
    }

    /// Build a frame whose boundary is the single region enclosed by `rods`.
    pub fn from_rods(rods: Vec<Rod>) -> Result<Self, GeometryError> {
        if rods.is_empty() {
            return Err(GeometryError::EmptyFrame);
        }
        let cells = PlanarArrangement::build(&rods).into_cells();
        if cells.len() != 1 {
            return Err(GeometryError::AmbiguousBoundary(cells.len()));
        }
        let boundary = Polygon::new(cells[0].ring().to_vec())?;
        Self::new(rods, boundary)
    }

    pub fn rods(&self) -> &[Rod] {
        &self.rods
    }

    pub fn boundary(&self) -> &Polygon {
        &self.boundary
    }

    pub fn rod_count(&self) -> usize {
        self.rods.len()
    }

    pub fn total_length_cm(&self) -> f64 {
        self.rods.iter().map(Rod::length_cm).sum()
    }

    pub fn total_weight_kg(&self) -> f64 {
        self.rods.iter().map(Rod::weight_kg).sum()
    }

    /// True when `point` is on or within the boundary.
    pub fn contains(&self, point: Point) -> bool {
        self.boundary.contains(point)
    }

    /// True when the whole rod lies within the slightly enlarged boundary.
    pub fn covers(&self, rod: &Rod) -> bool {
        self.boundary
            .covers_segment(rod.start(), rod.end(), BOUNDARY_TOLERANCE_CM)
    }

    pub fn bom(&self) -> Vec<BomEntry> {
        bom_entries(&self.rods)
    }
}

fn bom_entries(rods: &[Rod]) -> Vec<BomEntry> {
    rods.iter()
        .enumerate()
        .map(|(i, rod)| rod.bom_entry(i + 1))
        .collect()
}

/// Fitness tagged with the revision it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct ScoredRevision {
    score: f64,
    revision: u64,
}

/// Infill rods placed inside a frame.
///
/// Rods are on layer 1 or above. Every mutation bumps `revision`; a cached
/// fitness only counts as current while its revision matches.
#[derive(Debug, Clone, Serialize)]
pub struct RailingInfill {
    rods: Vec<Rod>,
    revision: u64,
    fitness: Option<ScoredRevision>,
    /// Anchor points used or offered during generation.
    pub anchor_points: Vec<AnchorPoint>,
    /// False when the generator could not place every requested rod.
    pub is_complete: bool,
    /// Identity of the generation run that produced this infill.
    pub generation_id: u64,
    pub iteration_count: usize,
    pub duration_sec: f64,
}

impl Default for RailingInfill {
    fn default() -> Self {
        Self {
            rods: Vec::new(),
            revision: 0,
            fitness: None,
            anchor_points: Vec::new(),
            is_complete: true,
            generation_id: 0,
            iteration_count: 0,
            duration_sec: 0.0,
        }
    }
}

impl RailingInfill {
    pub fn new(rods: Vec<Rod>) -> Result<Self, GeometryError> {
        if let Some(index) = rods.iter().position(Rod::is_frame) {
            return Err(GeometryError::InfillRodOnFrameLayer(index));
        }
        Ok(Self {
            rods,
            ..Default::default()
        })
    }

    pub fn rods(&self) -> &[Rod] {
        &self.rods
    }

    pub fn rod_count(&self) -> usize {
        self.rods.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn total_length_cm(&self) -> f64 {
        self.rods.iter().map(Rod::length_cm).sum()
    }

    pub fn total_weight_kg(&self) -> f64 {
        self.rods.iter().map(Rod::weight_kg).sum()
    }

    pub fn bom(&self) -> Vec<BomEntry> {
        bom_entries(&self.rods)
    }

    fn check_layer(&self, index: usize, rod: &Rod) -> Result<(), GeometryError> {
        if rod.is_frame() {
            Err(GeometryError::InfillRodOnFrameLayer(index))
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> Result<(), GeometryError> {
        if index < self.rods.len() {
            Ok(())
        } else {
            Err(GeometryError::RodIndexOutOfRange {
                index,
                len: self.rods.len(),
            })
        }
    }

    pub fn push_rod(&mut self, rod: Rod) -> Result<(), GeometryError> {
        self.check_layer(self.rods.len(), &rod)?;
        self.rods.push(rod);
        self.revision += 1;
        Ok(())
    }

    /// Replace the rod at `index`, returning the previous one.
    pub fn replace_rod(&mut self, index: usize, rod: Rod) -> Result<Rod, GeometryError> {
        self.check_index(index)?;
        self.check_layer(index, &rod)?;
        let old = std::mem::replace(&mut self.rods[index], rod);
        self.revision += 1;
        Ok(old)
    }

    pub fn remove_rod(&mut self, index: usize) -> Result<Rod, GeometryError> {
        self.check_index(index)?;
        let old = self.rods.remove(index);
        self.revision += 1;
        Ok(old)
    }

    /// Cache a score for the current revision.
    pub fn record_fitness(&mut self, score: f64) {
        self.fitness = Some(ScoredRevision {
            score,
            revision: self.revision,
        });
    }

    /// Score for the current revision, `None` if never scored or edited since.
    pub fn fitness_score(&self) -> Option<f64> {
        self.fitness
            .filter(|f| f.revision == self.revision)
            .map(|f| f.score)
    }

    /// Most recent score, even if the infill has been edited since.
    pub fn last_fitness_score(&self) -> Option<f64> {
        self.fitness.map(|f| f.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rod(x0: f64, y0: f64, x1: f64, y1: f64, layer: u32) -> Rod {
        Rod::new(Point::new(x0, y0), Point::new(x1, y1), layer, 0.5).unwrap()
    }

    fn rectangle_rods() -> Vec<Rod> {
        vec![
            rod(0.0, 0.0, 200.0, 0.0, 0),
            rod(200.0, 0.0, 200.0, 100.0, 0),
            rod(200.0, 100.0, 0.0, 100.0, 0),
            rod(0.0, 100.0, 0.0, 0.0, 0),
        ]
    }

    #[test]
    fn test_from_rods_derives_boundary() {
        let frame = RailingFrame::from_rods(rectangle_rods()).unwrap();
        assert_eq!(frame.rod_count(), 4);
        assert!((frame.boundary().area() - 20000.0).abs() < 1e-6);
        assert!((frame.total_length_cm() - 600.0).abs() < 1e-9);
        assert!((frame.total_weight_kg() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_rods_rejects_open_chain() {
        let mut rods = rectangle_rods();
        rods.pop();
        assert_eq!(
            RailingFrame::from_rods(rods),
            Err(GeometryError::AmbiguousBoundary(0))
        );
    }

    #[test]
    fn test_frame_rejects_infill_layer_and_outside_rods() {
        let boundary = RailingFrame::from_rods(rectangle_rods())
            .unwrap()
            .boundary()
            .clone();

        let mut rods = rectangle_rods();
        rods.push(rod(10.0, 0.0, 10.0, 100.0, 1));
        assert!(matches!(
            RailingFrame::new(rods, boundary.clone()),
            Err(GeometryError::FrameRodLayer { index: 4, layer: 1 })
        ));

        let mut rods = rectangle_rods();
        rods.push(rod(10.0, 0.0, 10.0, 150.0, 0));
        assert_eq!(
            RailingFrame::new(rods, boundary),
            Err(GeometryError::FrameRodOutsideBoundary(4))
        );
    }

    #[test]
    fn test_frame_requires_rods() {
        assert_eq!(RailingFrame::from_rods(Vec::new()), Err(GeometryError::EmptyFrame));
    }

    #[test]
    fn test_infill_rejects_frame_layer() {
        assert!(matches!(
            RailingInfill::new(vec![rod(0.0, 0.0, 1.0, 1.0, 0)]),
            Err(GeometryError::InfillRodOnFrameLayer(0))
        ));
    }

    #[test]
    fn test_infill_mutation_invalidates_fitness() {
        let mut infill = RailingInfill::new(vec![rod(50.0, 0.0, 50.0, 100.0, 1)]).unwrap();
        assert!(infill.is_complete);
        infill.record_fitness(0.8);
        assert_eq!(infill.fitness_score(), Some(0.8));

        infill.push_rod(rod(100.0, 0.0, 100.0, 100.0, 1)).unwrap();
        assert_eq!(infill.revision(), 1);
        assert_eq!(infill.fitness_score(), None);
        assert_eq!(infill.last_fitness_score(), Some(0.8));

        let old = infill.remove_rod(0).unwrap();
        assert!((old.start().x - 50.0).abs() < 1e-9);
        assert_eq!(infill.revision(), 2);
        assert!(infill.remove_rod(5).is_err());
        assert_eq!(infill.revision(), 2);
    }

    #[test]
    fn test_frame_serde_validates() {
        let frame = RailingFrame::from_rods(rectangle_rods()).unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: RailingFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);
    }
}
