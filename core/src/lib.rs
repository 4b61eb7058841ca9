#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Blast Arena engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Systems read immutable snapshots and
//! respond exclusively with new command batches.

mod config;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use config::{AgentSpec, ArenaConfig, ConfigError};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation by a single tick.
    Tick,
    /// Externally issued request to walk onto an adjacent tile.
    RequestMove {
        /// Agent issuing the request.
        agent: AgentId,
        /// Adjacent tile the agent wants to reach.
        to: GridPosition,
    },
    /// Externally issued request to drop a device on the agent's tile.
    RequestPlaceDevice {
        /// Agent issuing the request.
        agent: AgentId,
    },
    /// Replaces an idle agent's intent queue with a freshly planned sequence.
    QueueIntents {
        /// Agent whose queue receives the plan.
        agent: AgentId,
        /// Intents executed in order, one move per step.
        intents: Vec<Intent>,
    },
    /// Generates a new board and resets agents, devices and round timers.
    RestartRound,
    /// Restarts the round and additionally clears every score.
    NewGame,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Announces that a new round was laid out.
    RoundStarted {
        /// One-based index of the round within the current game.
        round: u32,
    },
    /// Announces a round lifecycle transition.
    RoundStateChanged {
        /// State that became active.
        state: RoundState,
    },
    /// Reports that the round finished.
    RoundEnded {
        /// Sole surviving agent, if any.
        winner: Option<AgentId>,
    },
    /// Reports that an intent was refused.
    IntentRejected {
        /// Agent whose intent was refused.
        agent: AgentId,
        /// Specific reason for the refusal.
        reason: IntentRejection,
    },
    /// Confirms that an agent finished a step between two tiles.
    AgentMoved {
        /// Agent that moved.
        agent: AgentId,
        /// Tile the agent left.
        from: GridPosition,
        /// Tile the agent now occupies.
        to: GridPosition,
    },
    /// Confirms that a device was armed on the board.
    DevicePlaced {
        /// Identifier allocated to the device.
        device: DeviceId,
        /// Agent that placed the device.
        owner: Option<AgentId>,
        /// Tile the device is anchored to.
        at: GridPosition,
    },
    /// Reports that a placement request hit a tile already holding a device.
    DevicePlacementIgnored {
        /// Agent that requested the placement.
        agent: AgentId,
        /// Tile that was already occupied.
        at: GridPosition,
    },
    /// Confirms that a device started detonating.
    DeviceDetonated {
        /// Device that detonated.
        device: DeviceId,
        /// Frozen set of tiles reached by the blast.
        blast: BlastSet,
    },
    /// Reports that a blast cleared a destructible tile.
    TileDestroyed {
        /// Tile that became empty.
        at: GridPosition,
    },
    /// Reports that an agent was caught in a blast and deactivated.
    AgentHit {
        /// Agent that was hit.
        agent: AgentId,
        /// Device whose blast reached the agent.
        device: DeviceId,
        /// Owner of the device, if any.
        owner: Option<AgentId>,
    },
    /// Reports that an agent's score increased.
    ScoreAwarded {
        /// Agent receiving the point.
        agent: AgentId,
        /// Score after the award.
        score: u32,
        /// Why the point was awarded.
        reason: ScoreReason,
    },
    /// Confirms that a finished device was removed from the board.
    DeviceRemoved {
        /// Device that was removed.
        device: DeviceId,
    },
}

/// Reasons an intent may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentRejection {
    /// No agent with the provided identifier exists.
    UnknownAgent,
    /// The agent was eliminated this round.
    Inactive,
    /// Intents are only accepted while a round is in progress.
    RoundNotInProgress,
    /// The requested tile is not a cardinal neighbour of the agent.
    NotAdjacent,
    /// The agent already holds an unconsumed move request.
    MovePending,
    /// The agent already holds an unconsumed placement request.
    PlacementPending,
    /// The next queued tile stopped being walkable before the agent reached it.
    Blocked,
}

/// Reasons a point may be awarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreReason {
    /// The agent's device caught another agent.
    Elimination,
    /// The agent was the last one standing.
    LastStanding,
}

/// Lifecycle of a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundState {
    /// Pre-round countdown; agents are frozen.
    Countdown,
    /// The round is being played.
    InProgress,
    /// The round finished; the world no longer changes until restarted.
    RoundOver,
}

/// Kinds of tiles composing the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Open floor.
    Empty,
    /// Indestructible wall that stops blast rays.
    Wall,
    /// Crate that absorbs a blast ray and becomes empty.
    Destructible,
}

/// Cardinal directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing `y`.
    Up,
    /// Toward increasing `y`.
    Down,
    /// Toward decreasing `x`.
    Left,
    /// Toward increasing `x`.
    Right,
}

impl Direction {
    /// All cardinal directions in canonical expansion order.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset applied when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Location of a single board tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    x: i32,
    y: i32,
}

impl GridPosition {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Position reached by walking `steps` tiles in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction, steps: i32) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx * steps, self.y + dy * steps)
    }

    /// Cardinal neighbours in [`Direction::CARDINAL`] order.
    #[must_use]
    pub fn neighbors(self) -> [GridPosition; 4] {
        Direction::CARDINAL.map(|direction| self.step(direction, 1))
    }

    /// Direction leading to `other` when the two tiles are cardinal neighbours.
    #[must_use]
    pub fn direction_to(self, other: GridPosition) -> Option<Direction> {
        Direction::CARDINAL
            .into_iter()
            .find(|direction| self.step(*direction, 1) == other)
    }
}

/// Continuous position measured in tile units, used for smooth motion.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct TilePoint {
    /// Horizontal coordinate in tiles.
    pub x: f32,
    /// Vertical coordinate in tiles.
    pub y: f32,
}

impl TilePoint {
    /// Creates a new continuous position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance between two points.
    #[must_use]
    pub fn distance(self, other: TilePoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<GridPosition> for TilePoint {
    fn from(position: GridPosition) -> Self {
        Self::new(position.x() as f32, position.y() as f32)
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Creates a new device identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual tag attached to an agent. Only presentation layers branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// The featured player character.
    Player,
    /// Heavy armour role.
    Tank,
    /// Support role.
    Healer,
    /// Damage role.
    Dps,
}

/// Source of an agent's intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Intents come from input polling or a remote participant.
    Human,
    /// Intents come from the decision process.
    Bot,
}

/// Primitive action held in an agent's intent queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Walk onto the given adjacent tile.
    MoveTo(GridPosition),
    /// Arm a device on the agent's canonical tile.
    PlaceDevice,
}

/// Set of tiles reached by a blast. Iteration order is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlastSet {
    tiles: BTreeSet<GridPosition>,
}

impl BlastSet {
    /// Creates an empty blast set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tile, returning `false` when it was already present.
    pub fn insert(&mut self, tile: GridPosition) -> bool {
        self.tiles.insert(tile)
    }

    /// Reports whether the blast reaches the tile.
    #[must_use]
    pub fn contains(&self, tile: GridPosition) -> bool {
        self.tiles.contains(&tile)
    }

    /// Number of distinct tiles in the blast.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the blast reaches no tile at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterator over the tiles in row-major order of `(x, y)`.
    pub fn iter(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.tiles.iter().copied()
    }
}

impl FromIterator<GridPosition> for BlastSet {
    fn from_iter<I: IntoIterator<Item = GridPosition>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
        }
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Visual tag for presentation layers.
    pub kind: AgentKind,
    /// Source of the agent's intents.
    pub controller: Controller,
    /// Canonical tile used for collision, walkability and blast checks.
    pub tile: GridPosition,
    /// Interpolated position for smooth presentation.
    pub position: TilePoint,
    /// Tile the agent is currently walking toward, if any.
    pub heading: Option<GridPosition>,
    /// Whether the agent is still in the round.
    pub active: bool,
    /// Points accumulated during the current game.
    pub score: u32,
    /// Number of unconsumed intents in the agent's queue.
    pub pending_intents: usize,
}

impl AgentSnapshot {
    /// Reports whether the agent still has work queued or a step in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_intents > 0 || self.heading.is_some()
    }
}

/// Read-only snapshot describing all agents in the arena.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over agents that are still in the round.
    pub fn active(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Looks up the snapshot of a single agent.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Tiles anchored by active agents, including tiles they are stepping onto.
    pub fn anchored_tiles(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.active()
            .flat_map(|snapshot| std::iter::once(snapshot.tile).chain(snapshot.heading))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}
