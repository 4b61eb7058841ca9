//! Time-aware A* search over the terrain.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
};

use blast_arena_core::GridPosition;

use crate::{DangerMap, Terrain};

/// Ordered tiles from the start (inclusive) to the goal (inclusive).
///
/// The tile at index `k` is reached on turn `k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    positions: Vec<GridPosition>,
}

impl Path {
    /// Tiles of the path, start first.
    #[must_use]
    pub fn positions(&self) -> &[GridPosition] {
        &self.positions
    }

    /// Tile the path leaves from.
    #[must_use]
    pub fn start(&self) -> GridPosition {
        self.positions[0]
    }

    /// Tile the path ends on.
    #[must_use]
    pub fn goal(&self) -> GridPosition {
        self.positions[self.positions.len() - 1]
    }

    /// Turn on which the goal is reached.
    #[must_use]
    pub fn arrival_turn(&self) -> u32 {
        u32::try_from(self.positions.len() - 1).unwrap_or(u32::MAX)
    }

    /// Tiles to walk onto in order, excluding the start.
    pub fn steps(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.positions.iter().copied().skip(1)
    }
}

/// Finds the earliest-arrival path from `start` to `goal`.
///
/// Each expansion advances one turn; a neighbour is rejected when it is not
/// walkable or already lethal on the turn it would be entered. Ties between
/// equally promising tiles go to the one discovered first. Returns `None`
/// when the goal cannot be reached.
#[must_use]
pub fn find_path(
    terrain: &Terrain<'_>,
    danger: &DangerMap,
    start: GridPosition,
    goal: GridPosition,
) -> Option<Path> {
    if start == goal {
        return Some(Path {
            positions: vec![start],
        });
    }

    let mut open: BinaryHeap<Reverse<(u32, u64, GridPosition)>> = BinaryHeap::new();
    let mut best: HashMap<GridPosition, u32> = HashMap::new();
    let mut came_from: HashMap<GridPosition, GridPosition> = HashMap::new();
    let mut closed: HashSet<GridPosition> = HashSet::new();
    let mut sequence: u64 = 0;

    let _ = best.insert(start, 0);
    open.push(Reverse((start.manhattan_distance(goal), sequence, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct(&came_from, start, goal));
        }
        if !closed.insert(current) {
            continue;
        }

        let cost = best.get(&current).copied().unwrap_or(u32::MAX);
        let next_turn = cost.saturating_add(1);
        for neighbor in current.neighbors() {
            if closed.contains(&neighbor) || !terrain.is_walkable(neighbor) {
                continue;
            }
            if danger.is_danger_at(neighbor, next_turn) {
                continue;
            }
            if best
                .get(&neighbor)
                .is_some_and(|known| *known <= next_turn)
            {
                continue;
            }

            let _ = best.insert(neighbor, next_turn);
            let _ = came_from.insert(neighbor, current);
            sequence += 1;
            let priority = next_turn.saturating_add(neighbor.manhattan_distance(goal));
            open.push(Reverse((priority, sequence, neighbor)));
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<GridPosition, GridPosition>,
    start: GridPosition,
    goal: GridPosition,
) -> Path {
    let mut positions = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(previous) = came_from.get(&current).copied() else {
            break;
        };
        positions.push(previous);
        current = previous;
    }
    positions.reverse();
    Path { positions }
}
