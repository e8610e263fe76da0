//! Manual edits of a generated infill, re-scored on demand.

use std::sync::Arc;

use log::debug;

use crate::schema::{FitnessUpdate, GeometryError, Point, Rod};

use super::anchors::AnchorPointFinder;
use super::evaluator::{EvaluationError, Evaluator};
use super::railing::{RailingFrame, RailingInfill};

/// Anchors closer than this to a rod end are considered attached to it.
const ATTACHED_CM: f64 = 1e-3;

/// Which end of a rod to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RodEnd {
    Start,
    End,
}

/// An infill being edited by hand inside a shared frame.
///
/// Every mutation bumps the infill revision, so the cached score goes stale
/// until [`InfillEditSession::rescore`] runs. Only the previous score is
/// kept for the change report.
pub struct InfillEditSession {
    frame: Arc<RailingFrame>,
    infill: RailingInfill,
    evaluator: Box<dyn Evaluator>,
    finder: AnchorPointFinder,
}

impl InfillEditSession {
    pub fn new(frame: Arc<RailingFrame>, infill: RailingInfill, evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            frame,
            infill,
            evaluator,
            finder: AnchorPointFinder::default(),
        }
    }

    pub fn with_finder(mut self, finder: AnchorPointFinder) -> Self {
        self.finder = finder;
        self
    }

    pub fn frame(&self) -> &RailingFrame {
        &self.frame
    }

    pub fn infill(&self) -> &RailingInfill {
        &self.infill
    }

    pub fn into_infill(self) -> RailingInfill {
        self.infill
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// Swap the active evaluator. The cached score is kept as the baseline
    /// for the next [`rescore`](Self::rescore).
    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = evaluator;
    }

    pub fn add_rod(&mut self, rod: Rod) -> Result<usize, GeometryError> {
        self.infill.push_rod(rod)?;
        Ok(self.infill.rod_count() - 1)
    }

    /// Move both ends of a rod, keeping its layer, weight and cuts.
    ///
    /// Anchors at the old ends are released and unused anchors at the new
    /// ends are claimed.
    pub fn move_rod(&mut self, index: usize, start: Point, end: Point) -> Result<(), GeometryError> {
        let rod = self.rod(index)?;
        let (old_start, old_end, layer) = (rod.start(), rod.end(), rod.layer());
        let moved = rod.with_endpoints(start, end)?;
        self.infill.replace_rod(index, moved)?;

        for old in [old_start, old_end] {
            self.release_anchor_at(old);
        }
        for new in [start, end] {
            self.claim_anchor_at(new, layer);
        }
        Ok(())
    }

    pub fn remove_rod(&mut self, index: usize) -> Result<Rod, GeometryError> {
        let removed = self.infill.remove_rod(index)?;
        for end in [removed.start(), removed.end()] {
            self.release_anchor_at(end);
        }
        Ok(removed)
    }

    /// Move one end of a rod to the nearest unused anchor around `near`.
    ///
    /// Returns `false` and leaves the infill untouched when no unused anchor
    /// lies within the finder's search radius.
    pub fn reconnect_endpoint(
        &mut self,
        index: usize,
        end: RodEnd,
        near: Point,
    ) -> Result<bool, GeometryError> {
        let rod = self.rod(index)?.clone();
        let Some(anchor) = self
            .finder
            .find_nearest_unconnected(near, &self.infill.anchor_points)
        else {
            debug!("No unused anchor within {} cm", self.finder.search_radius_cm());
            return Ok(false);
        };

        let target = self.infill.anchor_points[anchor].position;
        let (old, moved) = match end {
            RodEnd::Start => (rod.start(), rod.with_endpoints(target, rod.end())?),
            RodEnd::End => (rod.end(), rod.with_endpoints(rod.start(), target)?),
        };
        self.infill.replace_rod(index, moved)?;
        self.release_anchor_at(old);

        let claimed = &mut self.infill.anchor_points[anchor];
        claimed.used = true;
        claimed.layer = Some(rod.layer());
        debug!("Rod {index} {end:?} reconnected to anchor {anchor}");
        Ok(true)
    }

    /// Evaluate the current infill and report the change against the
    /// previous score.
    ///
    /// Two rods on the same layer crossing each other make the edit
    /// unacceptable whatever the evaluator decides. The score is unaffected.
    pub fn rescore(&mut self) -> Result<FitnessUpdate, EvaluationError> {
        let old_score = self.infill.last_fitness_score();
        let assessment = self.evaluator.assess(&self.infill, &self.frame)?;
        self.infill.record_fitness(assessment.score);

        let mut is_acceptable = assessment.result.is_acceptable;
        if is_acceptable && has_same_layer_crossings(self.infill.rods()) {
            debug!("Rods on the same layer cross, edit not acceptable");
            is_acceptable = false;
        }
        Ok(FitnessUpdate {
            old_score,
            new_score: Some(assessment.score),
            is_acceptable: Some(is_acceptable),
        })
    }

    fn rod(&self, index: usize) -> Result<&Rod, GeometryError> {
        self.infill
            .rods()
            .get(index)
            .ok_or(GeometryError::RodIndexOutOfRange {
                index,
                len: self.infill.rod_count(),
            })
    }

    fn release_anchor_at(&mut self, position: Point) {
        if let Some(anchor) = self
            .infill
            .anchor_points
            .iter_mut()
            .find(|a| a.used && a.position.distance(position) <= ATTACHED_CM)
        {
            anchor.used = false;
        }
    }

    fn claim_anchor_at(&mut self, position: Point, layer: u32) {
        if let Some(anchor) = self
            .infill
            .anchor_points
            .iter_mut()
            .find(|a| !a.used && a.position.distance(position) <= ATTACHED_CM)
        {
            anchor.used = true;
            anchor.layer = Some(layer);
        }
    }
}

fn has_same_layer_crossings(rods: &[Rod]) -> bool {
    rods.iter().enumerate().any(|(i, a)| {
        rods[i + 1..]
            .iter()
            .any(|b| a.layer() == b.layer() && a.crosses(b))
    })
}
