use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashSet};

use crate::geometry::cell::Cell;
use crate::geometry::cell_id::CellId;
use crate::geometry::shape::Shape;
use crate::index::{to_id, CellRelation, ShapeIndex};
use crate::math::edge_distance::{self, update_min_distance_max_error};
use crate::math::{ChordAngle, Point};

use super::options::{Options, UNLIMITED_RESULTS};
use super::result::EdgeResult;
use super::target::Target;

/// Index cells with fewer edges than this are scanned immediately instead
/// of being queued.
const MIN_EDGES_TO_ENQUEUE: usize = 10;

/// Finds the edges of a [`ShapeIndex`] closest to a [`Target`].
///
/// Small indexes are scanned edge by edge. Larger ones are searched best
/// first: cells are visited in order of a lower bound on their distance to
/// the target and the search stops once no cell can improve the results.
///
/// ```
/// use orbis::math::from_lat_lng_degrees as ll;
/// use orbis::{ChordAngle, ClosestEdgeQuery, Shape, ShapeIndex, Target};
///
/// let index = ShapeIndex::new(vec![
///     Shape::polyline(vec![ll(0.0, 0.0), ll(0.0, 10.0)]).unwrap(),
/// ]);
/// let query = ClosestEdgeQuery::new(&index);
/// let target = Target::point(ll(1.0, 5.0));
/// let closest = query.find_closest_edge(&target);
/// assert_eq!((closest.shape_id(), closest.edge_id()), (0, 0));
/// assert!(query.is_distance_less(&target, ChordAngle::from_degrees(1.5)));
/// ```
#[derive(Debug, Clone)]
pub struct ClosestEdgeQuery<'a> {
    index: &'a ShapeIndex,
    options: Options,
    brute_force_threshold: usize,
}

impl<'a> ClosestEdgeQuery<'a> {
    /// Creates a query with default options.
    #[must_use]
    pub fn new(index: &'a ShapeIndex) -> Self {
        Self::with_options(index, Options::default())
    }

    /// Creates a query with the given options.
    #[must_use]
    pub fn with_options(index: &'a ShapeIndex, options: Options) -> Self {
        Self {
            index,
            options,
            brute_force_threshold: usize::MAX,
        }
    }

    /// Returns the index being searched.
    #[must_use]
    pub fn index(&self) -> &'a ShapeIndex {
        self.index
    }

    /// Returns the query options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the query options for modification.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Returns the cap on the brute-force cutover.
    #[must_use]
    pub fn brute_force_threshold(&self) -> usize {
        self.brute_force_threshold
    }

    /// Caps the index size (in edges) up to which every edge is scanned.
    /// The effective cutover is the smaller of this and the target's own
    /// limit; `0` always uses the cell search on non-empty indexes.
    pub fn set_brute_force_threshold(&mut self, threshold: usize) -> &mut Self {
        self.brute_force_threshold = threshold;
        self
    }

    /// Returns the closest edges to `target` satisfying the options, sorted
    /// by [`EdgeResult`] order.
    #[must_use]
    pub fn find_closest_edges(&self, target: &Target<'_>) -> Vec<EdgeResult> {
        self.search(target, &self.options)
    }

    /// Returns the single closest edge, or [`EdgeResult::empty`] if no edge
    /// satisfies the options.
    #[must_use]
    pub fn find_closest_edge(&self, target: &Target<'_>) -> EdgeResult {
        let mut options = self.options;
        options.max_results = 1;
        self.search(target, &options)
            .first()
            .copied()
            .unwrap_or_else(EdgeResult::empty)
    }

    /// Returns the distance to the closest edge, or
    /// [`ChordAngle::INFINITY`] if there is none.
    #[must_use]
    pub fn get_distance(&self, target: &Target<'_>) -> ChordAngle {
        self.find_closest_edge(target).distance()
    }

    /// Returns true if some edge is closer than `limit`. Stops at the first
    /// such edge, so it is faster than [`Self::get_distance`].
    #[must_use]
    pub fn is_distance_less(&self, target: &Target<'_>, limit: ChordAngle) -> bool {
        self.any_closer_than(target, limit)
    }

    /// Like [`Self::is_distance_less`] but with an inclusive limit.
    #[must_use]
    pub fn is_distance_less_or_equal(&self, target: &Target<'_>, limit: ChordAngle) -> bool {
        self.any_closer_than(target, limit.successor())
    }

    /// Returns true if the distance to the target could be `<= limit` once
    /// the error of the distance computation is accounted for. Never
    /// reports false when the true distance is within `limit`.
    #[must_use]
    pub fn is_conservative_distance_less_or_equal(
        &self,
        target: &Target<'_>,
        limit: ChordAngle,
    ) -> bool {
        self.any_closer_than(target, conservative(limit).successor())
    }

    /// Strict variant of [`Self::is_conservative_distance_less_or_equal`].
    #[must_use]
    pub fn is_conservative_distance_less(&self, target: &Target<'_>, limit: ChordAngle) -> bool {
        self.any_closer_than(target, conservative(limit))
    }

    /// Returns the point on the result's edge closest to `point`, or `point`
    /// itself for interior and empty results.
    #[must_use]
    pub fn project(&self, point: &Point, result: &EdgeResult) -> Point {
        let Ok(edge) = usize::try_from(result.edge_id()) else {
            return *point;
        };
        match self.index.shape(result.shape_id()) {
            Some(shape) if edge < shape.num_edges() => {
                let (a, b) = shape.edge(edge);
                edge_distance::project(point, &a, &b)
            }
            _ => *point,
        }
    }

    fn any_closer_than(&self, target: &Target<'_>, limit: ChordAngle) -> bool {
        let mut options = self.options;
        options.max_results = 1;
        options.max_distance = limit;
        options.max_error = ChordAngle::STRAIGHT;
        !self.search(target, &options).is_empty()
    }

    fn search(&self, target: &Target<'_>, options: &Options) -> Vec<EdgeResult> {
        Search::new(self.index, options, target.clone(), self.brute_force_threshold).run()
    }
}

fn conservative(limit: ChordAngle) -> ChordAngle {
    limit.plus_error(update_min_distance_max_error(limit))
}

/// Queue entry: a cell with a lower bound on its distance to the target.
/// Index cells carry their position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    distance: ChordAngle,
    id: CellId,
    index_cell: Option<usize>,
}

/// Best results found so far.
#[derive(Debug)]
enum Accumulator {
    Single(Option<EdgeResult>),
    All(Vec<EdgeResult>),
    Bounded(BTreeSet<EdgeResult>),
}

/// State of one query run. Owns a copy of the target so that it can be
/// tuned to the options without touching the caller's value.
struct Search<'q, 't> {
    index: &'q ShapeIndex,
    options: &'q Options,
    target: Target<'t>,
    brute_force_threshold: usize,
    distance_limit: ChordAngle,
    use_conservative_cell_distance: bool,
    avoid_duplicates: bool,
    tested_edges: HashSet<(i32, i32)>,
    results: Accumulator,
    queue: BinaryHeap<Reverse<Candidate>>,
}

impl<'q, 't> Search<'q, 't> {
    fn new(
        index: &'q ShapeIndex,
        options: &'q Options,
        target: Target<'t>,
        brute_force_threshold: usize,
    ) -> Self {
        let results = match options.max_results {
            1 => Accumulator::Single(None),
            UNLIMITED_RESULTS => Accumulator::All(Vec::new()),
            _ => Accumulator::Bounded(BTreeSet::new()),
        };
        Self {
            index,
            options,
            target,
            brute_force_threshold,
            distance_limit: options.max_distance,
            use_conservative_cell_distance: false,
            avoid_duplicates: false,
            tested_edges: HashSet::new(),
            results,
            queue: BinaryHeap::new(),
        }
    }

    fn run(mut self) -> Vec<EdgeResult> {
        if self.options.max_results == UNLIMITED_RESULTS
            && self.options.max_distance == ChordAngle::INFINITY
        {
            tracing::debug!("no result or distance limit set, returning all edges");
        }
        if self.distance_limit <= ChordAngle::ZERO {
            return self.finish();
        }

        if self.options.include_interiors {
            for shape_id in self.target.containing_shapes(self.index, self.options.max_results) {
                self.add_result(EdgeResult::interior(shape_id));
            }
            if self.distance_limit <= ChordAngle::ZERO {
                return self.finish();
            }
        }

        let max_error = self.options.max_error;
        let target_uses_max_error = max_error > ChordAngle::ZERO && self.target.set_max_error(max_error);
        // Only subtract the error from cell distances when the limit stays
        // positive; otherwise every cell would look like a candidate.
        self.use_conservative_cell_distance = target_uses_max_error
            && (self.distance_limit == ChordAngle::INFINITY
                || ChordAngle::ZERO < self.distance_limit - max_error);

        let threshold = self
            .brute_force_threshold
            .min(self.target.max_brute_force_index_size());
        if self.options.use_brute_force
            || self.index.num_edges_up_to(threshold.saturating_add(1)) <= threshold
        {
            tracing::trace!(edges = self.index.num_edges(), "closest edges by brute force");
            self.avoid_duplicates = false;
            self.find_by_brute_force();
        } else {
            self.avoid_duplicates = target_uses_max_error && self.options.max_results > 1;
            self.find_optimized();
        }
        self.finish()
    }

    fn find_by_brute_force(&mut self) {
        let index = self.index;
        for (shape_id, shape) in index.iter_shapes() {
            for edge in 0..shape.num_edges() {
                self.maybe_add_result(shape_id, shape, edge);
            }
        }
    }

    fn find_optimized(&mut self) {
        self.init_queue();
        let index = self.index;
        let mut visited = 0_usize;
        while let Some(Reverse(entry)) = self.queue.pop() {
            if entry.distance >= self.distance_limit {
                self.queue.clear();
                break;
            }
            visited += 1;
            if let Some(pos) = entry.index_cell {
                self.process_edges(pos);
                continue;
            }
            // Split the cell into its children. Two seeks find the index
            // cells under all four: one lands in child 1 with child 0 just
            // before it, the other in child 3 with child 2 just before it.
            let id = entry.id;
            let pos = index.seek(id.child(1).range_min());
            if let Some((found, _)) = index.cell_at(pos) {
                if found <= id.child(1).range_max() {
                    self.process_or_enqueue_child(id.child(1), pos);
                }
            }
            if let Some((found, _)) = pos.checked_sub(1).and_then(|p| index.cell_at(p)) {
                if found >= id.range_min() {
                    self.process_or_enqueue_child(id.child(0), pos - 1);
                }
            }
            let pos = index.seek(id.child(3).range_min());
            if let Some((found, _)) = index.cell_at(pos) {
                if found <= id.range_max() {
                    self.process_or_enqueue_child(id.child(3), pos);
                }
            }
            if let Some((found, _)) = pos.checked_sub(1).and_then(|p| index.cell_at(p)) {
                if found >= id.child(2).range_min() {
                    self.process_or_enqueue_child(id.child(2), pos - 1);
                }
            }
        }
        tracing::trace!(visited, "closest edges by cell search");
    }

    fn init_queue(&mut self) {
        let cap = self.target.cap_bound();
        if cap.is_empty() {
            return;
        }
        // With a single result, the index cell under the target usually
        // holds it; scanning that cell first tightens the limit early.
        if self.options.max_results == 1 {
            if let CellRelation::Indexed(pos) = self.index.locate(CellId::from_point(cap.center())) {
                self.process_edges(pos);
                if self.distance_limit <= ChordAngle::ZERO {
                    return;
                }
            }
        }
        let index = self.index;
        for &(id, index_cell) in index.covering() {
            self.process_or_enqueue(id, index_cell);
        }
    }

    /// `pos` is the index cell found inside `child`; it is the child itself
    /// when the ids match.
    fn process_or_enqueue_child(&mut self, child: CellId, pos: usize) {
        let index_cell = self
            .index
            .cell_at(pos)
            .and_then(|(id, _)| (id == child).then_some(pos));
        self.process_or_enqueue(child, index_cell);
    }

    fn process_or_enqueue(&mut self, id: CellId, index_cell: Option<usize>) {
        let index = self.index;
        if let Some((_, cell)) = index_cell.and_then(|pos| index.cell_at(pos)) {
            let num_edges = cell.num_edges();
            if num_edges == 0 {
                return;
            }
            if num_edges < MIN_EDGES_TO_ENQUEUE {
                if let Some(pos) = index_cell {
                    self.process_edges(pos);
                }
                return;
            }
        }
        let cell = Cell::new(id);
        let mut distance = self.distance_limit;
        if !self.target.update_min_distance_to_cell(&cell, &mut distance) {
            return;
        }
        if self.use_conservative_cell_distance {
            distance = distance - self.options.max_error;
        }
        self.queue.push(Reverse(Candidate {
            distance,
            id,
            index_cell,
        }));
    }

    fn process_edges(&mut self, pos: usize) {
        let index = self.index;
        let Some((_, cell)) = index.cell_at(pos) else {
            return;
        };
        for clipped in cell.clipped() {
            let Some(shape) = index.shape(clipped.shape_id()) else {
                continue;
            };
            for &edge in clipped.edges() {
                self.maybe_add_result(clipped.shape_id(), shape, edge);
            }
        }
    }

    fn maybe_add_result(&mut self, shape_id: i32, shape: &Shape, edge: usize) {
        let edge_id = to_id(edge);
        if self.avoid_duplicates && !self.tested_edges.insert((shape_id, edge_id)) {
            return;
        }
        let (a, b) = shape.edge(edge);
        let mut distance = self.distance_limit;
        if self.target.update_min_distance_to_edge(&a, &b, &mut distance) {
            self.add_result(EdgeResult::new(distance, shape_id, edge_id));
        }
    }

    fn add_result(&mut self, result: EdgeResult) {
        let max_results = self.options.max_results;
        let worst = match &mut self.results {
            Accumulator::Single(best) => {
                if best.is_some_and(|kept| kept <= result) {
                    return;
                }
                *best = Some(result);
                result.distance()
            }
            Accumulator::All(results) => {
                results.push(result);
                return;
            }
            Accumulator::Bounded(results) => {
                results.insert(result);
                if results.len() < max_results {
                    return;
                }
                if results.len() > max_results {
                    results.pop_last();
                }
                match results.last() {
                    Some(worst) => worst.distance(),
                    None => return,
                }
            }
        };
        self.distance_limit = self.cutoff(worst);
    }

    /// Distance below which a candidate can still displace the worst kept
    /// result. With exact distances, candidates tied with it stay in play
    /// and the result order decides between them.
    fn cutoff(&self, worst: ChordAngle) -> ChordAngle {
        let max_error = self.options.max_error;
        if max_error == ChordAngle::ZERO {
            worst.successor()
        } else {
            worst - max_error
        }
    }

    fn finish(self) -> Vec<EdgeResult> {
        match self.results {
            Accumulator::Single(best) => best.into_iter().collect(),
            Accumulator::All(mut results) => {
                results.sort_unstable();
                results.dedup();
                results
            }
            Accumulator::Bounded(results) => results.into_iter().collect(),
        }
    }
}
