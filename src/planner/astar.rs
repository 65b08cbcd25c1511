//! Grid A* with a resumable search frontier
//!
//! [`AStarMap`] runs a single search anchored at a fixed target and keeps its
//! frontier alive between queries, so asking for the distance of a new source
//! cell resumes the old search instead of starting over. The space-time
//! planner anchors one of these at each goal and uses it as an exact
//! distance heuristic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::grid::vec2::Vec2;

/// Planner view of the map: per-cell simultaneous-occupancy capacity.
/// Zero means impassable.
#[derive(Debug, Clone)]
pub struct CapacityGrid {
    width: i32,
    height: i32,
    cells: Vec<u32>,
}

impl CapacityGrid {
    pub fn new(width: i32, height: i32, default: u32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![default; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn idx(&self, pos: Vec2) -> usize {
        debug_assert!(self.in_bounds(pos), "out-of-bounds access at {pos}");
        (pos.x * self.height + pos.y) as usize
    }

    pub fn get(&self, pos: Vec2) -> u32 {
        self.cells[self.idx(pos)]
    }

    pub fn set(&mut self, pos: Vec2, capacity: u32) {
        let idx = self.idx(pos);
        self.cells[idx] = capacity;
    }

    pub fn passable(&self, pos: Vec2) -> bool {
        self.in_bounds(pos) && self.get(pos) > 0
    }

    /// Passable 4-neighbors of `pos`
    pub fn neighbors(&self, pos: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        [
            Vec2::new(pos.x, pos.y - 1),
            Vec2::new(pos.x, pos.y + 1),
            Vec2::new(pos.x - 1, pos.y),
            Vec2::new(pos.x + 1, pos.y),
        ]
        .into_iter()
        .filter(|&p| self.passable(p))
    }
}

/// Frontier entry; ordering is reversed so the max-heap pops the lowest f
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: i32,
    pos: Vec2,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f).then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single-target search whose frontier survives across queries
pub struct AStarMap<'a> {
    grid: &'a CapacityGrid,
    target: Vec2,
    g: AHashMap<Vec2, i32>,
    parent: AHashMap<Vec2, Vec2>,
    open: BinaryHeap<OpenNode>,
    closed: AHashSet<Vec2>,
    max_iterations: u32,
}

impl<'a> AStarMap<'a> {
    /// Build the search anchored at `target` and expand it far enough to
    /// answer the distance from `start`.
    pub fn new(start: Vec2, target: Vec2, grid: &'a CapacityGrid) -> Self {
        let mut map = Self {
            grid,
            target,
            g: AHashMap::new(),
            parent: AHashMap::new(),
            open: BinaryHeap::new(),
            closed: AHashSet::new(),
            max_iterations: (grid.width() * grid.height()) as u32,
        };
        map.g.insert(start, 0);
        map.open.push(OpenNode { f: start.distance(target), pos: start });
        map.find(target);
        map
    }

    /// Shortest-path cost from the anchored source to `pos`, expanding the
    /// frontier as needed. `None` when `pos` is unreachable.
    pub fn find(&mut self, pos: Vec2) -> Option<i32> {
        if self.closed.contains(&pos) {
            return self.g.get(&pos).copied();
        }
        // retarget the frontier ordering toward the new query cell
        self.target = pos;
        let mut reordered = BinaryHeap::with_capacity(self.open.len());
        for node in self.open.drain() {
            let Some(&dist) = self.g.get(&node.pos) else {
                continue;
            };
            reordered.push(OpenNode { f: dist + node.pos.distance(pos), pos: node.pos });
        }
        self.open = reordered;

        let mut iterations = 0;
        while let Some(node) = self.open.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                break;
            }
            if !self.closed.insert(node.pos) {
                continue;
            }
            let Some(&here) = self.g.get(&node.pos) else {
                continue;
            };
            if node.pos == pos {
                return Some(here);
            }
            for next in self.grid.neighbors(node.pos) {
                if self.closed.contains(&next) {
                    continue;
                }
                let tentative = here + 1;
                let better = self.g.get(&next).is_none_or(|&old| tentative < old);
                if better {
                    self.g.insert(next, tentative);
                    self.parent.insert(next, node.pos);
                    self.open.push(OpenNode { f: tentative + next.distance(pos), pos: next });
                }
            }
        }
        None
    }

    /// Heuristic form of [`find`](Self::find): unreachable cells report 0,
    /// which keeps the space-time search admissible instead of aborting it.
    pub fn true_distance(&mut self, pos: Vec2) -> i32 {
        self.find(pos).unwrap_or(0)
    }

    /// Path from the anchored source to `pos`, inclusive on both ends.
    /// Empty when `pos` has not been reached.
    pub fn path_to(&self, pos: Vec2) -> Vec<Vec2> {
        if !self.g.contains_key(&pos) {
            return Vec::new();
        }
        let mut path = vec![pos];
        let mut cur = pos;
        while let Some(&prev) = self.parent.get(&cur) {
            path.push(prev);
            cur = prev;
        }
        path.reverse();
        path
    }
}

/// One-shot shortest path, ignoring time and other agents
pub fn astar(start: Vec2, target: Vec2, grid: &CapacityGrid) -> Vec<Vec2> {
    let mut map = AStarMap::new(start, target, grid);
    if map.find(target).is_some() {
        map.path_to(target)
    } else {
        Vec::new()
    }
}
