//! Device countdown state machine and blast ray projection.

use std::ops::Deref;

use blast_arena_core::{AgentId, BlastSet, DeviceId, Direction, GridPosition, TileKind};

use crate::Board;

/// Projects the tiles a device at `origin` would reach with the given range.
///
/// The centre cell is included unless it is a wall. Each cardinal ray stops
/// before a wall and stops after including the first destructible tile.
#[must_use]
pub fn blast_set_of(board: &Board, origin: GridPosition, range: u32) -> BlastSet {
    let mut blast = BlastSet::new();
    if board.tile(origin) != TileKind::Wall {
        let _ = blast.insert(origin);
    }

    let reach = i32::try_from(range).unwrap_or(i32::MAX);
    for direction in Direction::CARDINAL {
        for distance in 1..=reach {
            let tile = origin.step(direction, distance);
            match board.tile(tile) {
                TileKind::Wall => break,
                TileKind::Destructible => {
                    let _ = blast.insert(tile);
                    break;
                }
                TileKind::Empty => {
                    let _ = blast.insert(tile);
                }
            }
        }
    }

    blast
}

/// Countdown phase of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevicePhase {
    /// Waiting for the fuse to burn down.
    Armed {
        /// Ticks left before detonation.
        fuse: u32,
    },
    /// Exploding; the blast lingers until the timer runs out.
    Detonating {
        /// Ticks left before the device is finished.
        remaining: u32,
    },
    /// Done; removed from the board at the end of the tick.
    Finished,
}

/// A timed explosive anchored to a single tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    owner: Option<AgentId>,
    position: GridPosition,
    range: u32,
    phase: DevicePhase,
    frozen_blast: Option<BlastSet>,
}

impl Device {
    fn armed(
        id: DeviceId,
        owner: Option<AgentId>,
        position: GridPosition,
        fuse: u32,
        range: u32,
    ) -> Self {
        Self {
            id,
            owner,
            position,
            range,
            phase: DevicePhase::Armed { fuse },
            frozen_blast: None,
        }
    }

    /// Identifier allocated to the device.
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Agent credited with hits, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<AgentId> {
        self.owner
    }

    /// Tile the device is anchored to.
    #[must_use]
    pub const fn position(&self) -> GridPosition {
        self.position
    }

    /// Maximum ray length of the blast.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Current phase of the countdown.
    #[must_use]
    pub const fn phase(&self) -> DevicePhase {
        self.phase
    }

    /// Ticks left before detonation; zero once the device has gone off.
    #[must_use]
    pub const fn fuse_remaining(&self) -> u32 {
        match self.phase {
            DevicePhase::Armed { fuse } => fuse,
            DevicePhase::Detonating { .. } | DevicePhase::Finished => 0,
        }
    }

    /// Reports whether the device has started detonating.
    #[must_use]
    pub const fn is_detonating(&self) -> bool {
        matches!(self.phase, DevicePhase::Detonating { .. })
    }

    /// Reports whether the device is done and awaiting removal.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, DevicePhase::Finished)
    }

    /// Blast captured when detonation began; `None` while still armed.
    #[must_use]
    pub fn frozen_blast(&self) -> Option<&BlastSet> {
        self.frozen_blast.as_ref()
    }

    /// Recomputes the blast against the current board.
    #[must_use]
    pub fn blast_projection(&self, board: &Board) -> BlastSet {
        blast_set_of(board, self.position, self.range)
    }

    /// Advances the countdown by one tick. Returns the frozen blast when the
    /// device starts detonating on this tick.
    fn advance(&mut self, board: &Board, explosion_ticks: u32) -> Option<BlastSet> {
        match self.phase {
            DevicePhase::Armed { fuse } => {
                let fuse = fuse.saturating_sub(1);
                if fuse > 0 {
                    self.phase = DevicePhase::Armed { fuse };
                    return None;
                }
                self.phase = DevicePhase::Detonating {
                    remaining: explosion_ticks,
                };
                let blast = self.blast_projection(board);
                self.frozen_blast = Some(blast.clone());
                Some(blast)
            }
            DevicePhase::Detonating { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.phase = if remaining > 0 {
                    DevicePhase::Detonating { remaining }
                } else {
                    DevicePhase::Finished
                };
                None
            }
            DevicePhase::Finished => None,
        }
    }
}

/// Detonation side effects that must be resolved against the board and agents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Detonation {
    pub(crate) device: DeviceId,
    pub(crate) owner: Option<AgentId>,
    pub(crate) blast: BlastSet,
}

/// Live devices in placement order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceSet {
    devices: Vec<Device>,
    next_id: u32,
}

impl DeviceSet {
    /// Creates an empty device set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterator over the live devices in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Number of live devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Reports whether no device is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Device anchored to the tile, if any.
    #[must_use]
    pub fn at(&self, position: GridPosition) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.position == position)
    }

    /// Arms a new device. Returns `None` without touching the set when the
    /// tile already holds a device.
    pub fn arm(
        &mut self,
        owner: Option<AgentId>,
        position: GridPosition,
        fuse: u32,
        range: u32,
    ) -> Option<DeviceId> {
        if self.at(position).is_some() {
            return None;
        }
        let id = self.allocate_id();
        self.devices
            .push(Device::armed(id, owner, position, fuse, range));
        Some(id)
    }

    /// Temporarily inserts an ownerless device. The device is withdrawn and the
    /// identifier counter restored when the returned guard is dropped.
    pub fn hypothetical(
        &mut self,
        position: GridPosition,
        fuse: u32,
        range: u32,
    ) -> HypotheticalDevice<'_> {
        let restore_id = self.next_id;
        let id = self.allocate_id();
        self.devices
            .push(Device::armed(id, None, position, fuse, range));
        HypotheticalDevice {
            set: self,
            id,
            restore_id,
        }
    }

    pub(crate) fn advance_at(
        &mut self,
        index: usize,
        board: &Board,
        explosion_ticks: u32,
    ) -> Option<Detonation> {
        let device = self.devices.get_mut(index)?;
        let blast = device.advance(board, explosion_ticks)?;
        Some(Detonation {
            device: device.id,
            owner: device.owner,
            blast,
        })
    }

    /// Drops every finished device in one pass, returning their identifiers.
    pub(crate) fn remove_finished(&mut self) -> Vec<DeviceId> {
        let removed: Vec<DeviceId> = self
            .devices
            .iter()
            .filter(|device| device.is_finished())
            .map(Device::id)
            .collect();
        self.devices.retain(|device| !device.is_finished());
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.devices.clear();
    }

    fn allocate_id(&mut self) -> DeviceId {
        let id = DeviceId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

/// Guard holding a sandboxed device inside a [`DeviceSet`].
#[derive(Debug)]
pub struct HypotheticalDevice<'a> {
    set: &'a mut DeviceSet,
    id: DeviceId,
    restore_id: u32,
}

impl HypotheticalDevice<'_> {
    /// Identifier of the sandboxed device.
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }
}

impl Deref for HypotheticalDevice<'_> {
    type Target = DeviceSet;

    fn deref(&self) -> &DeviceSet {
        self.set
    }
}

impl Drop for HypotheticalDevice<'_> {
    fn drop(&mut self) {
        if let Some(index) = self.set.devices.iter().rposition(|device| device.id == self.id) {
            let _ = self.set.devices.remove(index);
        }
        self.set.next_id = self.restore_id;
    }
}
