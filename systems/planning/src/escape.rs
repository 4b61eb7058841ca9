//! Proof that an agent can outrun a device it is about to place.

use blast_arena_core::{ArenaConfig, GridPosition};
use blast_arena_world::DeviceSet;

use crate::{find_path, DangerMap, DangerTime, Path, Terrain};

/// Checks whether a hypothetical device leaves its placer a way out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscapeProver {
    fuse_ticks: u32,
    blast_range: u32,
    ticks_per_step: u32,
}

impl EscapeProver {
    /// Creates a prover that simulates devices armed with the configured rules.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            fuse_ticks: config.fuse_ticks,
            blast_range: config.blast_range,
            ticks_per_step: config.ticks_per_step,
        }
    }

    /// Returns the first path from `start` to a haven that stays safe once an
    /// ownerless device is armed at `device_at`, or `None` when no such path
    /// exists.
    ///
    /// Havens are walkable tiles no device threatens, scanned column by
    /// column. The device set is restored before this returns.
    #[must_use]
    pub fn prove(
        &self,
        terrain: &Terrain<'_>,
        devices: &mut DeviceSet,
        device_at: GridPosition,
        start: GridPosition,
    ) -> Option<Path> {
        let sandbox = devices.hypothetical(device_at, self.fuse_ticks, self.blast_range);
        let board = terrain.board();
        let danger = DangerMap::build(board, &sandbox, self.ticks_per_step);

        board
            .positions()
            .filter(|tile| terrain.is_walkable(*tile))
            .filter(|tile| danger.danger_time(*tile) == DangerTime::Safe)
            .filter_map(|haven| find_path(terrain, &danger, start, haven))
            .find(|path| !danger.is_danger_at(path.goal(), path.arrival_turn()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blast_arena_world::Board;

    #[test]
    fn open_floor_offers_an_escape() {
        let board = Board::open(15, 11);
        let terrain = Terrain::new(&board);
        let prover = EscapeProver::new(&ArenaConfig::default());
        let mut devices = DeviceSet::new();
        let start = GridPosition::new(5, 5);

        let path = prover
            .prove(&terrain, &mut devices, start, start)
            .expect("escape exists");

        assert_eq!(path.start(), start);
        assert!(path.arrival_turn() > 0);
        assert!(devices.is_empty());
    }

    #[test]
    fn short_fuse_leaves_no_time_to_escape() {
        let board = Board::open(15, 11);
        let terrain = Terrain::new(&board);
        let config = ArenaConfig {
            fuse_ticks: 1,
            ..ArenaConfig::default()
        };
        let prover = EscapeProver::new(&config);
        let mut devices = DeviceSet::new();
        let start = GridPosition::new(5, 5);

        assert_eq!(prover.prove(&terrain, &mut devices, start, start), None);
    }
}
