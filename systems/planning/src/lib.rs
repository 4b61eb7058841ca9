#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Threat-aware planning primitives: the time-indexed danger map, the
//! constrained pathfinder and the escape prover.

mod danger;
mod escape;
mod pathfinding;

use blast_arena_core::{AgentId, AgentView, GridPosition, TileKind};
use blast_arena_world::Board;

pub use danger::{DangerMap, DangerTime};
pub use escape::EscapeProver;
pub use pathfinding::{find_path, Path};

/// Walkability of the board as seen by one planning agent.
///
/// A tile is walkable when it is empty and no other active agent stands on it
/// or is stepping onto it. Devices never block movement.
#[derive(Clone, Debug)]
pub struct Terrain<'a> {
    board: &'a Board,
    occupied: Vec<GridPosition>,
}

impl<'a> Terrain<'a> {
    /// Terrain with no agents on it.
    #[must_use]
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            occupied: Vec::new(),
        }
    }

    /// Terrain blocked by the given tiles in addition to the board itself.
    #[must_use]
    pub fn with_occupants<I>(board: &'a Board, occupied: I) -> Self
    where
        I: IntoIterator<Item = GridPosition>,
    {
        Self {
            board,
            occupied: occupied.into_iter().collect(),
        }
    }

    /// Terrain seen by `agent`: every other active agent's tiles are blocked.
    #[must_use]
    pub fn for_agent(board: &'a Board, agents: &AgentView, agent: AgentId) -> Self {
        Self::with_occupants(
            board,
            agents
                .active()
                .filter(|snapshot| snapshot.id != agent)
                .flat_map(|snapshot| std::iter::once(snapshot.tile).chain(snapshot.heading)),
        )
    }

    /// Board the terrain is built on.
    #[must_use]
    pub const fn board(&self) -> &'a Board {
        self.board
    }

    /// Reports whether the tile can be entered.
    #[must_use]
    pub fn is_walkable(&self, tile: GridPosition) -> bool {
        self.board.tile(tile) == TileKind::Empty && !self.occupied.contains(&tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blast_arena_core::{AgentKind, AgentSnapshot, Controller, TilePoint};

    fn snapshot(id: u32, tile: GridPosition, active: bool) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            kind: AgentKind::Dps,
            controller: Controller::Bot,
            tile,
            position: TilePoint::from(tile),
            heading: None,
            active,
            score: 0,
            pending_intents: 0,
        }
    }

    #[test]
    fn other_active_agents_block_their_tiles() {
        let board = Board::open(7, 7);
        let agents = AgentView::from_snapshots(vec![
            snapshot(0, GridPosition::new(1, 1), true),
            snapshot(1, GridPosition::new(3, 1), true),
            snapshot(2, GridPosition::new(5, 1), false),
        ]);

        let terrain = Terrain::for_agent(&board, &agents, AgentId::new(0));

        assert!(terrain.is_walkable(GridPosition::new(1, 1)));
        assert!(!terrain.is_walkable(GridPosition::new(3, 1)));
        assert!(terrain.is_walkable(GridPosition::new(5, 1)));
        assert!(!terrain.is_walkable(GridPosition::new(2, 2)));
        assert!(!terrain.is_walkable(GridPosition::new(-1, 1)));
    }
}
