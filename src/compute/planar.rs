//! Planar arrangement of rods: noding, cell extraction and junctions.
//!
//! Rods are split at every pairwise intersection (proper crossings, touching
//! endpoints and the ends of collinear overlaps). Vertices closer than
//! [`SNAP_CM`] are merged and duplicate edges collapse into one, so
//! overlapping collinear rods contribute a single boundary. Dangling edges
//! are pruned before faces are traced on the half-edge graph; every face
//! with positive signed area is a cell. A closed loop touching nothing else
//! leaves a clockwise face behind, which becomes a hole of the smallest cell
//! around it.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use crate::schema::{
    Point, Rod, SegmentIntersection, project_parameter, segment_intersection, signed_area,
};

use super::incircle::{incircle_radius_with_holes, ring_contains};

/// Vertex merge distance (cm).
pub const SNAP_CM: f64 = 1e-6;

/// Faces below this area (cm^2) are numerical slivers, not cells.
pub const MIN_CELL_AREA_CM2: f64 = 1e-9;

/// An undirected edge of the noded arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanarEdge {
    pub from: usize,
    pub to: usize,
    /// True when any infill rod contributes to this edge.
    pub infill: bool,
}

/// An enclosed region bounded by rods.
#[derive(Debug, Clone)]
pub struct Cell {
    ring: Vec<Point>,
    holes: Vec<Vec<Point>>,
    area: f64,
}

impl Cell {
    /// Counter-clockwise boundary ring without a closing vertex.
    pub fn ring(&self) -> &[Point] {
        &self.ring
    }

    /// Rings of islands floating inside the cell.
    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    /// Enclosed area with island areas subtracted.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Radius of the largest circle inside the cell that avoids its holes.
    pub fn incircle_radius(&self) -> f64 {
        incircle_radius_with_holes(&self.ring, &self.holes)
    }
}

/// A vertex where two or more edges meet.
#[derive(Debug, Clone)]
pub struct Junction {
    pub position: Point,
    /// Outgoing edge directions in radians, sorted ascending in [-pi, pi].
    pub directions: Vec<f64>,
    pub touches_infill: bool,
}

impl Junction {
    pub fn degree(&self) -> usize {
        self.directions.len()
    }

    /// Smallest angular gap relative to the gap of an even spread, in [0, 1].
    pub fn evenness(&self) -> f64 {
        let n = self.directions.len();
        if n < 2 {
            return 1.0;
        }
        let mut min_gap = TAU - (self.directions[n - 1] - self.directions[0]);
        for w in self.directions.windows(2) {
            min_gap = min_gap.min(w[1] - w[0]);
        }
        (min_gap / (TAU / n as f64)).clamp(0.0, 1.0)
    }
}

/// Spatial hash for snapping nearby vertices together.
struct VertexIndex {
    points: Vec<Point>,
    grid: HashMap<(i64, i64), Vec<usize>>,
}

impl VertexIndex {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            grid: HashMap::new(),
        }
    }

    fn key(p: Point) -> (i64, i64) {
        ((p.x / SNAP_CM).floor() as i64, (p.y / SNAP_CM).floor() as i64)
    }

    fn insert(&mut self, p: Point) -> usize {
        let (kx, ky) = Self::key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.grid.get(&(kx + dx, ky + dy)) {
                    for &id in ids {
                        if self.points[id].distance(p) <= SNAP_CM {
                            return id;
                        }
                    }
                }
            }
        }
        let id = self.points.len();
        self.points.push(p);
        self.grid.entry((kx, ky)).or_default().push(id);
        id
    }
}

/// Noded rod network with its enclosed cells.
#[derive(Debug, Clone)]
pub struct PlanarArrangement {
    vertices: Vec<Point>,
    edges: Vec<PlanarEdge>,
    cells: Vec<Cell>,
}

impl PlanarArrangement {
    /// Node the given rods and extract their cells.
    pub fn build<'a, I>(rods: I) -> Self
    where
        I: IntoIterator<Item = &'a Rod>,
    {
        let segments: Vec<(Point, Point, bool)> = rods
            .into_iter()
            .map(|rod| (rod.start(), rod.end(), !rod.is_frame()))
            .collect();

        // Split parameters along each segment.
        let mut splits: Vec<Vec<f64>> = vec![vec![0.0, 1.0]; segments.len()];
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let (a0, a1, _) = segments[i];
                let (b0, b1, _) = segments[j];
                match segment_intersection(a0, a1, b0, b1) {
                    SegmentIntersection::None => {}
                    SegmentIntersection::Point { t, u, .. } => {
                        splits[i].push(t);
                        splits[j].push(u);
                    }
                    SegmentIntersection::Overlap { t0, t1 } => {
                        splits[i].push(t0);
                        splits[i].push(t1);
                        for t in [t0, t1] {
                            let p = a0.lerp(a1, t);
                            splits[j].push(project_parameter(p, b0, b1).clamp(0.0, 1.0));
                        }
                    }
                }
            }
        }

        let mut index = VertexIndex::new();
        let mut edge_map: HashMap<(usize, usize), bool> = HashMap::new();
        for ((a, b, infill), params) in segments.iter().zip(splits.iter_mut()) {
            params.sort_by(f64::total_cmp);
            let ids: Vec<usize> = params.iter().map(|&t| index.insert(a.lerp(*b, t))).collect();
            for w in ids.windows(2) {
                if w[0] == w[1] {
                    continue;
                }
                let key = (w[0].min(w[1]), w[0].max(w[1]));
                let entry = edge_map.entry(key).or_insert(false);
                *entry |= *infill;
            }
        }

        let mut edges: Vec<PlanarEdge> = edge_map
            .into_iter()
            .map(|((from, to), infill)| PlanarEdge { from, to, infill })
            .collect();
        edges.sort_by_key(|e| (e.from, e.to));

        let vertices = index.points;
        let cells = trace_cells(&vertices, &edges);

        Self {
            vertices,
            edges,
            cells,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn edges(&self) -> &[PlanarEdge] {
        &self.edges
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// All vertices of degree two or more.
    pub fn junctions(&self) -> Vec<Junction> {
        let mut incident: Vec<Vec<(f64, bool)>> = vec![Vec::new(); self.vertices.len()];
        for edge in &self.edges {
            let a = self.vertices[edge.from];
            let b = self.vertices[edge.to];
            incident[edge.from].push(((b.y - a.y).atan2(b.x - a.x), edge.infill));
            incident[edge.to].push(((a.y - b.y).atan2(a.x - b.x), edge.infill));
        }

        incident
            .into_iter()
            .enumerate()
            .filter(|(_, dirs)| dirs.len() >= 2)
            .map(|(id, dirs)| {
                let touches_infill = dirs.iter().any(|&(_, infill)| infill);
                let mut directions: Vec<f64> = dirs.into_iter().map(|(angle, _)| angle).collect();
                directions.sort_by(f64::total_cmp);
                Junction {
                    position: self.vertices[id],
                    directions,
                    touches_infill,
                }
            })
            .collect()
    }
}

/// Trace bounded faces of the edge graph after pruning dangling edges.
fn trace_cells(vertices: &[Point], edges: &[PlanarEdge]) -> Vec<Cell> {
    let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); vertices.len()];
    for edge in edges {
        adjacency[edge.from].insert(edge.to);
        adjacency[edge.to].insert(edge.from);
    }

    // Prune degree-1 vertices until none remain.
    let mut stack: Vec<usize> = (0..vertices.len())
        .filter(|&v| adjacency[v].len() == 1)
        .collect();
    while let Some(v) = stack.pop() {
        if adjacency[v].len() != 1 {
            continue;
        }
        let Some(&n) = adjacency[v].iter().next() else {
            continue;
        };
        adjacency[v].clear();
        adjacency[n].remove(&v);
        if adjacency[n].len() == 1 {
            stack.push(n);
        }
    }

    // Neighbours of each vertex sorted counter-clockwise.
    let sorted: Vec<Vec<usize>> = adjacency
        .iter()
        .enumerate()
        .map(|(v, neighbours)| {
            let origin = vertices[v];
            let mut list: Vec<usize> = neighbours.iter().copied().collect();
            list.sort_by(|&a, &b| {
                let pa = vertices[a];
                let pb = vertices[b];
                let angle_a = (pa.y - origin.y).atan2(pa.x - origin.x);
                let angle_b = (pb.y - origin.y).atan2(pb.x - origin.x);
                angle_a.total_cmp(&angle_b)
            });
            list
        })
        .collect();

    let mut visited: HashSet<(usize, usize)> = HashSet::new();
    let mut cells = Vec::new();
    let mut inner_rings = Vec::new();

    for start in 0..vertices.len() {
        for &first in &sorted[start] {
            if visited.contains(&(start, first)) {
                continue;
            }
            let mut ring = Vec::new();
            let (mut u, mut v) = (start, first);
            loop {
                visited.insert((u, v));
                ring.push(vertices[u]);
                let around = &sorted[v];
                let Some(k) = around.iter().position(|&w| w == u) else {
                    break;
                };
                // Next edge clockwise from the reverse half-edge keeps the face on the left.
                let w = around[(k + around.len() - 1) % around.len()];
                u = v;
                v = w;
                if (u, v) == (start, first) || visited.contains(&(u, v)) {
                    break;
                }
            }

            let area = signed_area(&ring);
            if area > MIN_CELL_AREA_CM2 {
                cells.push(Cell {
                    ring,
                    holes: Vec::new(),
                    area,
                });
            } else if area < -MIN_CELL_AREA_CM2 {
                inner_rings.push((ring, -area));
            }
        }
    }

    attach_holes(&mut cells, inner_rings);
    cells
}

/// Give each clockwise ring to the smallest cell strictly enclosing it.
///
/// The outer face of every connected component is clockwise too. Only an
/// island's outer face has a strictly larger cell around it, the others are
/// dropped.
fn attach_holes(cells: &mut [Cell], inner_rings: Vec<(Vec<Point>, f64)>) {
    let outer_areas: Vec<f64> = cells.iter().map(|c| c.area).collect();
    for (ring, hole_area) in inner_rings {
        let vertex = ring[0];
        let owner = outer_areas
            .iter()
            .enumerate()
            .filter(|&(_, &area)| area > hole_area + MIN_CELL_AREA_CM2.max(hole_area * 1e-9))
            .filter(|&(i, _)| ring_contains(&cells[i].ring, vertex))
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        if let Some(i) = owner {
            cells[i].area -= hole_area;
            cells[i].holes.push(ring);
        }
    }
}
