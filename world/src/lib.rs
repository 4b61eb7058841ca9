#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Blast Arena.

mod agents;
mod board;
mod devices;

use blast_arena_core::{
    AgentId, ArenaConfig, Command, ConfigError, Event, GridPosition, Intent, IntentRejection,
    RoundState, ScoreReason, TileKind,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use agents::Agent;
use devices::Detonation;

pub use board::{spawn_corners, Board, LayoutError};
pub use devices::{blast_set_of, Device, DevicePhase, DeviceSet, HypotheticalDevice};

/// Represents the authoritative Blast Arena world state.
#[derive(Debug)]
pub struct World {
    config: ArenaConfig,
    board: Board,
    layout: Option<Board>,
    spawns: Vec<GridPosition>,
    devices: DeviceSet,
    agents: Vec<Agent>,
    rng: ChaCha8Rng,
    round_state: RoundState,
    countdown_remaining: u32,
    stage_remaining: u32,
    round_index: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world with a freshly generated arena drawn from `seed`.
    pub fn new(config: ArenaConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let board = generate_board(&config, &mut rng);
        let spawns = spawn_corners(config.columns, config.rows).to_vec();
        Ok(Self::assemble(config, board, None, spawns, rng))
    }

    /// Creates a world on a fixed layout that is reused by every restart.
    ///
    /// Agents spawn round-robin on `spawns`, or on the inset corners when no
    /// spawn list (or an empty one) is provided.
    pub fn with_layout(
        config: ArenaConfig,
        layout: Board,
        spawns: Option<Vec<GridPosition>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if layout.columns() != config.columns || layout.rows() != config.rows {
            return Err(ConfigError::LayoutMismatch {
                columns: config.columns,
                rows: config.rows,
                actual_columns: layout.columns(),
                actual_rows: layout.rows(),
            });
        }

        let spawns = match spawns {
            Some(spawns) if !spawns.is_empty() => spawns,
            _ => spawn_corners(config.columns, config.rows).to_vec(),
        };
        if let Some(blocked) = spawns
            .iter()
            .find(|spawn| layout.tile(**spawn) != TileKind::Empty)
        {
            return Err(ConfigError::SpawnBlocked {
                x: blocked.x(),
                y: blocked.y(),
            });
        }

        let rng = ChaCha8Rng::seed_from_u64(0);
        Ok(Self::assemble(
            config,
            layout.clone(),
            Some(layout),
            spawns,
            rng,
        ))
    }

    fn assemble(
        config: ArenaConfig,
        board: Board,
        layout: Option<Board>,
        spawns: Vec<GridPosition>,
        rng: ChaCha8Rng,
    ) -> Self {
        let agents = config
            .agents
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let id = AgentId::new(u32::try_from(index).unwrap_or(u32::MAX));
                Agent::spawn(id, spec.kind, spec.controller, spawns[index % spawns.len()])
            })
            .collect();
        let round_state = opening_state(&config);

        Self {
            countdown_remaining: config.countdown_ticks,
            stage_remaining: config.stage_ticks,
            config,
            board,
            layout,
            spawns,
            devices: DeviceSet::new(),
            agents,
            rng,
            round_state,
            round_index: 1,
            tick_index: 0,
        }
    }

    fn agent_index(&self, agent: AgentId) -> Option<usize> {
        self.agents.iter().position(|candidate| candidate.id() == agent)
    }

    /// Validates that an agent may receive intents right now.
    fn admit(&self, agent: AgentId) -> Result<usize, IntentRejection> {
        let index = self
            .agent_index(agent)
            .ok_or(IntentRejection::UnknownAgent)?;
        if !self.agents[index].is_active() {
            return Err(IntentRejection::Inactive);
        }
        if self.round_state != RoundState::InProgress {
            return Err(IntentRejection::RoundNotInProgress);
        }
        Ok(index)
    }

    fn is_walkable_for(&self, tile: GridPosition, mover: AgentId) -> bool {
        self.board.tile(tile) == TileKind::Empty
            && !self
                .agents
                .iter()
                .any(|agent| agent.id() != mover && agent.anchors(tile))
    }

    fn request_move(&mut self, agent: AgentId, to: GridPosition) -> Result<(), IntentRejection> {
        let index = self.admit(agent)?;
        let actor = &mut self.agents[index];
        if actor.tile().direction_to(to).is_none() {
            return Err(IntentRejection::NotAdjacent);
        }
        if actor.has_pending_move() {
            return Err(IntentRejection::MovePending);
        }
        actor.push_intent(Intent::MoveTo(to));
        Ok(())
    }

    fn request_place_device(&mut self, agent: AgentId) -> Result<(), IntentRejection> {
        let index = self.admit(agent)?;
        let actor = &mut self.agents[index];
        if actor.has_pending_placement() {
            return Err(IntentRejection::PlacementPending);
        }
        actor.push_intent(Intent::PlaceDevice);
        Ok(())
    }

    fn queue_intents(&mut self, agent: AgentId, intents: Vec<Intent>) -> Result<(), IntentRejection> {
        let index = self.admit(agent)?;
        self.agents[index].replace_intents(intents);
        Ok(())
    }

    fn advance_round(&mut self, out_events: &mut Vec<Event>) {
        match self.round_state {
            RoundState::Countdown => {
                self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
                if self.countdown_remaining == 0 {
                    self.enter_state(RoundState::InProgress, out_events);
                }
            }
            RoundState::InProgress => {
                self.execute_intents(out_events);
                self.advance_devices(out_events);
                for device in self.devices.remove_finished() {
                    out_events.push(Event::DeviceRemoved { device });
                }
                self.evaluate_round_end(out_events);
            }
            RoundState::RoundOver => {}
        }
    }

    fn execute_intents(&mut self, out_events: &mut Vec<Event>) {
        let speed = 1.0 / self.config.ticks_per_step as f32;
        for index in 0..self.agents.len() {
            if !self.agents[index].is_active() {
                continue;
            }
            self.release_intents(index, out_events);
            if let Some((from, to)) = self.agents[index].advance_motion(speed) {
                out_events.push(Event::AgentMoved {
                    agent: self.agents[index].id(),
                    from,
                    to,
                });
            }
        }
    }

    /// Consumes queued intents until a step starts or the queue runs dry.
    /// Placements are instantaneous, so a move queued behind one starts on the
    /// same tick.
    fn release_intents(&mut self, index: usize, out_events: &mut Vec<Event>) {
        while !self.agents[index].is_stepping() {
            let Some(intent) = self.agents[index].next_intent() else {
                return;
            };
            let id = self.agents[index].id();
            match intent {
                Intent::PlaceDevice => {
                    let _ = self.agents[index].pop_intent();
                    let at = self.agents[index].tile();
                    self.place_device(id, at, out_events);
                }
                Intent::MoveTo(to) => {
                    let from = self.agents[index].tile();
                    let rejection = if from.direction_to(to).is_none() {
                        Some(IntentRejection::NotAdjacent)
                    } else if !self.is_walkable_for(to, id) {
                        Some(IntentRejection::Blocked)
                    } else {
                        None
                    };
                    if let Some(reason) = rejection {
                        self.agents[index].clear_intents();
                        out_events.push(Event::IntentRejected { agent: id, reason });
                        return;
                    }
                    let _ = self.agents[index].pop_intent();
                    self.agents[index].begin_step(to);
                }
            }
        }
    }

    fn place_device(&mut self, owner: AgentId, at: GridPosition, out_events: &mut Vec<Event>) {
        let armed = self.devices.arm(
            Some(owner),
            at,
            self.config.fuse_ticks,
            self.config.blast_range,
        );
        match armed {
            Some(device) => {
                debug!(
                    device = device.get(),
                    owner = owner.get(),
                    x = at.x(),
                    y = at.y(),
                    "device armed"
                );
                out_events.push(Event::DevicePlaced {
                    device,
                    owner: Some(owner),
                    at,
                });
            }
            None => out_events.push(Event::DevicePlacementIgnored { agent: owner, at }),
        }
    }

    /// Advances every device in placement order. A detonation is resolved
    /// before the next device advances, so later blasts see the tiles earlier
    /// ones destroyed.
    fn advance_devices(&mut self, out_events: &mut Vec<Event>) {
        let explosion_ticks = self.config.explosion_ticks;
        for index in 0..self.devices.len() {
            if let Some(detonation) = self.devices.advance_at(index, &self.board, explosion_ticks) {
                self.resolve_detonation(detonation, out_events);
            }
        }
    }

    fn resolve_detonation(&mut self, detonation: Detonation, out_events: &mut Vec<Event>) {
        let Detonation {
            device,
            owner,
            blast,
        } = detonation;
        debug!(device = device.get(), tiles = blast.len(), "device detonated");
        out_events.push(Event::DeviceDetonated {
            device,
            blast: blast.clone(),
        });

        for tile in blast.iter() {
            if self.board.destroy(tile) {
                out_events.push(Event::TileDestroyed { at: tile });
            }
        }

        let mut victims = Vec::new();
        for agent in self.agents.iter_mut() {
            if agent.is_active() && blast.contains(agent.tile()) {
                agent.deactivate();
                victims.push(agent.id());
            }
        }

        for victim in victims {
            info!(agent = victim.get(), device = device.get(), "agent hit");
            out_events.push(Event::AgentHit {
                agent: victim,
                device,
                owner,
            });
            let Some(owner) = owner.filter(|owner| *owner != victim) else {
                continue;
            };
            self.award(owner, ScoreReason::Elimination, out_events);
        }
    }

    fn award(&mut self, agent: AgentId, reason: ScoreReason, out_events: &mut Vec<Event>) {
        let Some(index) = self.agent_index(agent) else {
            return;
        };
        let score = self.agents[index].award_point();
        out_events.push(Event::ScoreAwarded {
            agent,
            score,
            reason,
        });
    }

    fn evaluate_round_end(&mut self, out_events: &mut Vec<Event>) {
        let mut survivors = self.agents.iter().filter(|agent| agent.is_active());
        let first = survivors.next().map(Agent::id);
        let contested = survivors.next().is_some();

        if !contested {
            if let Some(winner) = first {
                self.award(winner, ScoreReason::LastStanding, out_events);
            }
            self.finish_round(first, out_events);
            return;
        }

        self.stage_remaining = self.stage_remaining.saturating_sub(1);
        if self.stage_remaining == 0 {
            self.finish_round(None, out_events);
        }
    }

    fn finish_round(&mut self, winner: Option<AgentId>, out_events: &mut Vec<Event>) {
        info!(
            round = self.round_index,
            winner = winner.map(|id| id.get()),
            scores = ?self.agents.iter().map(Agent::score).collect::<Vec<_>>(),
            "round over"
        );
        out_events.push(Event::RoundEnded { winner });
        self.enter_state(RoundState::RoundOver, out_events);
    }

    fn enter_state(&mut self, state: RoundState, out_events: &mut Vec<Event>) {
        self.round_state = state;
        out_events.push(Event::RoundStateChanged { state });
    }

    fn restart_round(&mut self, out_events: &mut Vec<Event>) {
        self.board = match &self.layout {
            Some(layout) => layout.clone(),
            None => generate_board(&self.config, &mut self.rng),
        };
        self.devices.clear();
        for (index, agent) in self.agents.iter_mut().enumerate() {
            agent.respawn(self.spawns[index % self.spawns.len()]);
        }
        self.countdown_remaining = self.config.countdown_ticks;
        self.stage_remaining = self.config.stage_ticks;
        self.round_index = self.round_index.saturating_add(1);

        info!(round = self.round_index, "round started");
        out_events.push(Event::RoundStarted {
            round: self.round_index,
        });
        self.enter_state(opening_state(&self.config), out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.advance_round(out_events);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
        }
        Command::RequestMove { agent, to } => {
            if let Err(reason) = world.request_move(agent, to) {
                out_events.push(Event::IntentRejected { agent, reason });
            }
        }
        Command::RequestPlaceDevice { agent } => {
            if let Err(reason) = world.request_place_device(agent) {
                out_events.push(Event::IntentRejected { agent, reason });
            }
        }
        Command::QueueIntents { agent, intents } => {
            if let Err(reason) = world.queue_intents(agent, intents) {
                out_events.push(Event::IntentRejected { agent, reason });
            }
        }
        Command::RestartRound => world.restart_round(out_events),
        Command::NewGame => {
            for agent in world.agents.iter_mut() {
                agent.reset_score();
            }
            world.round_index = 0;
            world.restart_round(out_events);
        }
    }
}

fn generate_board(config: &ArenaConfig, rng: &mut ChaCha8Rng) -> Board {
    Board::generate(
        config.columns,
        config.rows,
        config.destructible_density,
        config.safe_zone_radius,
        rng,
    )
}

fn opening_state(config: &ArenaConfig) -> RoundState {
    if config.countdown_ticks == 0 {
        RoundState::InProgress
    } else {
        RoundState::Countdown
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use blast_arena_core::{
        AgentView, ArenaConfig, BlastSet, DeviceId, GridPosition, RoundState, TileKind,
    };

    use super::{Board, DeviceSet, World};

    /// Provides read-only access to the current board.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        &world.board
    }

    /// Kind of the tile at `(x, y)`; out-of-bounds reads are walls.
    #[must_use]
    pub fn tile_at(world: &World, x: i32, y: i32) -> TileKind {
        world.board.tile_at(x, y)
    }

    /// Reports whether the tile is empty and no active agent is anchored to it.
    #[must_use]
    pub fn is_walkable(world: &World, tile: GridPosition) -> bool {
        world.board.tile(tile) == TileKind::Empty
            && !world.agents.iter().any(|agent| agent.anchors(tile))
    }

    /// Provides read-only access to the live devices.
    #[must_use]
    pub fn devices(world: &World) -> &DeviceSet {
        &world.devices
    }

    /// Blast footprint of every live device: the frozen blast once detonating,
    /// otherwise the projection against the current board.
    #[must_use]
    pub fn hazard_preview(world: &World) -> Vec<(DeviceId, BlastSet)> {
        world
            .devices
            .iter()
            .map(|device| {
                let blast = device
                    .frozen_blast()
                    .cloned()
                    .unwrap_or_else(|| device.blast_projection(&world.board));
                (device.id(), blast)
            })
            .collect()
    }

    /// Captures a read-only view of every agent.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.agents.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Current lifecycle state of the round.
    #[must_use]
    pub fn round_state(world: &World) -> RoundState {
        world.round_state
    }

    /// Ticks left on the stage timer.
    #[must_use]
    pub fn stage_ticks_remaining(world: &World) -> u32 {
        world.stage_remaining
    }

    /// Ticks left before the round starts.
    #[must_use]
    pub fn countdown_ticks_remaining(world: &World) -> u32 {
        world.countdown_remaining
    }

    /// Rules the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &ArenaConfig {
        &world.config
    }

    /// One-based index of the current round within the game.
    #[must_use]
    pub fn round_index(world: &World) -> u32 {
        world.round_index
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
