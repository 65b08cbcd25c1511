//! Cooperative pathfinding in space-time
//!
//! Agents plan one after another against a shared [`ReservationTable`]: each
//! finished plan reserves its cells at the ticks it will occupy them, and
//! later agents treat a cell as blocked at a tick once the reservations
//! there reach the cell's capacity. Waiting in place is always a legal step,
//! so a boxed-in agent degrades to standing still rather than failing.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::core::types::{EntityId, Tick};
use crate::grid::vec2::Vec2;
use crate::planner::astar::{AStarMap, CapacityGrid};

/// Which agent holds which cell at which tick
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    slots: AHashMap<Tick, AHashMap<Vec2, Vec<EntityId>>>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reservations on `pos` at `time`
    pub fn occupancy(&self, time: Tick, pos: Vec2) -> usize {
        self.slots
            .get(&time)
            .and_then(|cells| cells.get(&pos))
            .map_or(0, Vec::len)
    }

    /// Whether `pos` is already at capacity at `time`. Ticks nobody has
    /// reserved yet are never saturated.
    pub fn is_saturated(&self, time: Tick, pos: Vec2, capacity: u32) -> bool {
        self.occupancy(time, pos) >= capacity as usize
    }

    pub fn reserve(&mut self, time: Tick, pos: Vec2, agent: EntityId) {
        self.slots.entry(time).or_default().entry(pos).or_default().push(agent);
    }

    /// Drop every reservation held by `agent`
    pub fn clear_agent(&mut self, agent: EntityId) {
        for cells in self.slots.values_mut() {
            for held in cells.values_mut() {
                held.retain(|&a| a != agent);
            }
            cells.retain(|_, held| !held.is_empty());
        }
        self.slots.retain(|_, cells| !cells.is_empty());
    }

    /// Forget ticks at or before `now`
    pub fn cleanup(&mut self, now: Tick) {
        self.slots.retain(|&t, _| t > now);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SpaceTime {
    pos: Vec2,
    time: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: i32,
    node: SpaceTime,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.node.time.cmp(&self.node.time))
            .then_with(|| other.node.pos.cmp(&self.node.pos))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Plan a path for `agent` from `start` toward `target`, starting at `time`,
/// avoiding saturated reservations, and looking at most `depth` ticks ahead.
///
/// The search runs on (position, tick) pairs under an iteration budget of
/// `depth * 4`; when the budget runs out the best node popped so far stands
/// in for the target, yielding a useful prefix instead of nothing. The
/// returned path starts at `start` and is at least one cell long. Cells are
/// reserved for `path length + pause` ticks (capped at `depth`), holding the
/// final cell for the extra `pause` ticks. Those linger ticks count as
/// occupancy like any other step, so reaching the target only ends the
/// search once the whole hold window has room; until then the agent keeps
/// waiting.
pub fn space_time_astar(
    agent: EntityId,
    start: Vec2,
    target: Vec2,
    time: Tick,
    grid: &CapacityGrid,
    reserved: &mut ReservationTable,
    depth: u32,
    pause: u32,
) -> Vec<Vec2> {
    let max_iterations = depth * 4;
    let mut heuristic = AStarMap::new(target, start, grid);

    let root = SpaceTime { pos: start, time };
    let mut g: AHashMap<SpaceTime, i32> = AHashMap::new();
    let mut parent: AHashMap<SpaceTime, SpaceTime> = AHashMap::new();
    let mut closed: AHashSet<SpaceTime> = AHashSet::new();
    let mut open = BinaryHeap::new();
    g.insert(root, 0);
    open.push(OpenNode { f: heuristic.true_distance(start), node: root });

    // an arrival at `tick` will also hold the target cell through its
    // linger window; it only counts if none of those ticks is already full
    let hold_free = |reserved: &ReservationTable, arrival: Tick| {
        let len = arrival - time + 1;
        let hold = (len + Tick::from(pause)).min(Tick::from(depth));
        (arrival + 1..time + hold)
            .all(|t| !reserved.is_saturated(t, target, grid.get(target)))
    };

    let mut path = Vec::new();
    let mut iterations = 0;
    while let Some(OpenNode { node, .. }) = open.pop() {
        iterations += 1;
        if !closed.insert(node) {
            continue;
        }
        let arrived = node.pos == target && hold_free(reserved, node.time);
        if iterations > max_iterations || arrived {
            // reconstruct to the best node found, partial or complete
            let mut cur = node;
            path.push(cur.pos);
            while let Some(&prev) = parent.get(&cur) {
                path.push(prev.pos);
                cur = prev;
            }
            path.reverse();
            break;
        }
        let Some(&here) = g.get(&node) else {
            continue;
        };
        let next_time = node.time + 1;
        let moves = grid
            .neighbors(node.pos)
            .chain(std::iter::once(node.pos));
        for pos in moves {
            let next = SpaceTime { pos, time: next_time };
            if closed.contains(&next) {
                continue;
            }
            if reserved.is_saturated(next_time, pos, grid.get(pos)) {
                continue;
            }
            let tentative = here + 1;
            let better = g.get(&next).is_none_or(|&old| tentative < old);
            if better {
                g.insert(next, tentative);
                parent.insert(next, node);
                open.push(OpenNode {
                    f: tentative + heuristic.true_distance(pos),
                    node: next,
                });
            }
        }
    }

    if path.is_empty() {
        // every step was saturated; stand still this tick
        path.push(start);
    }

    let hold = (path.len() as u32 + pause).min(depth);
    for i in 0..hold {
        let idx = (i as usize).min(path.len() - 1);
        reserved.reserve(time + Tick::from(i), path[idx], agent);
    }
    path
}
