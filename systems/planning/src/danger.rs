//! Time-indexed danger model built from every live device.

use blast_arena_core::GridPosition;
use blast_arena_world::{Board, DeviceSet};

/// Earliest turn at which a tile becomes lethal.
///
/// `At` orders before `Safe`, and two `At` values order by turn, so the
/// minimum of several threats is the earliest one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DangerTime {
    /// Lethal from this turn onward.
    At(u32),
    /// No live device reaches the tile.
    Safe,
}

impl DangerTime {
    /// Reports whether some device threatens the tile.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        matches!(self, Self::At(_))
    }
}

/// Per-tile danger times for one planning call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DangerMap {
    columns: u32,
    rows: u32,
    times: Vec<DangerTime>,
}

impl DangerMap {
    /// Projects every device's blast against the board and records, per tile,
    /// the earliest turn any of them detonates.
    ///
    /// Armed devices threaten their blast at `fuse / ticks_per_step` turns;
    /// devices already detonating threaten their frozen blast immediately.
    #[must_use]
    pub fn build(board: &Board, devices: &DeviceSet, ticks_per_step: u32) -> Self {
        let columns = board.columns();
        let rows = board.rows();
        let cells = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut map = Self {
            columns,
            rows,
            times: vec![DangerTime::Safe; cells],
        };

        let ticks_per_step = ticks_per_step.max(1);
        for device in devices.iter() {
            let turn = device.fuse_remaining() / ticks_per_step;
            let blast = device
                .frozen_blast()
                .cloned()
                .unwrap_or_else(|| device.blast_projection(board));
            map.record(device.position(), turn);
            for tile in blast.iter() {
                map.record(tile, turn);
            }
        }

        map
    }

    /// Danger time of the tile; anything off the board is lethal now.
    #[must_use]
    pub fn danger_time(&self, tile: GridPosition) -> DangerTime {
        self.index(tile)
            .and_then(|index| self.times.get(index).copied())
            .unwrap_or(DangerTime::At(0))
    }

    /// Reports whether standing on `tile` at `turn` is lethal.
    #[must_use]
    pub fn is_danger_at(&self, tile: GridPosition, turn: u32) -> bool {
        match self.danger_time(tile) {
            DangerTime::At(time) => turn >= time,
            DangerTime::Safe => false,
        }
    }

    /// Reports whether the tile becomes lethal at some turn.
    #[must_use]
    pub fn is_threatened(&self, tile: GridPosition) -> bool {
        self.danger_time(tile).is_finite()
    }

    fn record(&mut self, tile: GridPosition, turn: u32) {
        if let Some(slot) = self.index(tile).and_then(|index| self.times.get_mut(index)) {
            *slot = (*slot).min(DangerTime::At(turn));
        }
    }

    fn index(&self, tile: GridPosition) -> Option<usize> {
        let x = u32::try_from(tile.x()).ok()?;
        let y = u32::try_from(tile.y()).ok()?;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        usize::try_from(y)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(x).ok()?)
    }
}
