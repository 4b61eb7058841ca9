#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round orchestrator that drives one tick of play: human input first, then
//! bot planning, then the world clock.

use blast_arena_core::{AgentId, Command, Controller, Direction, Event, RoundState};
use blast_arena_system_decision::{Decision, Rule};
use blast_arena_world::{apply, query, World};

/// Input sampled from the local player for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HumanInput {
    /// Direction held this tick, if any.
    pub movement: Option<Direction>,
    /// Whether the place-device button was pressed this tick.
    pub place_device: bool,
}

/// Owns the world and runs the per-tick pipeline against it.
#[derive(Debug)]
pub struct Round {
    world: World,
    decision: Decision,
    commands: Vec<Command>,
    events: Vec<Event>,
    decisions: Vec<(AgentId, Rule)>,
}

impl Round {
    /// Wraps a world; bots plan with the world's own rules.
    #[must_use]
    pub fn new(world: World) -> Self {
        let decision = Decision::new(query::config(&world));
        Self {
            world,
            decision,
            commands: Vec::new(),
            events: Vec::new(),
            decisions: Vec::new(),
        }
    }

    /// Advances the simulation by one tick and returns the events it produced.
    ///
    /// Human input and bot plans are only submitted while the round is in
    /// progress; the tick itself always runs so countdowns keep moving.
    pub fn step(&mut self, input: HumanInput) -> &[Event] {
        self.events.clear();
        self.commands.clear();
        self.decisions.clear();

        if query::round_state(&self.world) == RoundState::InProgress {
            self.collect_human_commands(input);
            self.collect_bot_commands();
            for command in self.commands.drain(..) {
                apply(&mut self.world, command, &mut self.events);
            }
        }

        apply(&mut self.world, Command::Tick, &mut self.events);
        &self.events
    }

    /// Lays out a fresh round, keeping scores.
    pub fn restart_round(&mut self) -> &[Event] {
        self.events.clear();
        apply(&mut self.world, Command::RestartRound, &mut self.events);
        &self.events
    }

    /// Lays out a fresh round and clears every score.
    pub fn new_game(&mut self) -> &[Event] {
        self.events.clear();
        apply(&mut self.world, Command::NewGame, &mut self.events);
        &self.events
    }

    /// Read-only access to the world for rendering and queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Rules chosen by bots that planned during the last tick.
    #[must_use]
    pub fn decisions(&self) -> &[(AgentId, Rule)] {
        &self.decisions
    }

    fn collect_human_commands(&mut self, input: HumanInput) {
        let agents = query::agent_view(&self.world);
        let Some(human) = agents
            .active()
            .find(|snapshot| snapshot.controller == Controller::Human)
        else {
            return;
        };

        if input.place_device {
            self.commands
                .push(Command::RequestPlaceDevice { agent: human.id });
        }
        if let Some(direction) = input.movement {
            if !human.is_busy() {
                self.commands.push(Command::RequestMove {
                    agent: human.id,
                    to: human.tile.step(direction, 1),
                });
            }
        }
    }

    fn collect_bot_commands(&mut self) {
        let agents = query::agent_view(&self.world);
        let board = query::board(&self.world);
        let devices = query::devices(&self.world);
        for bot in agents
            .active()
            .filter(|snapshot| snapshot.controller == Controller::Bot)
        {
            if let Some(rule) =
                self.decision
                    .handle(bot.id, board, devices, &agents, &mut self.commands)
            {
                self.decisions.push((bot.id, rule));
            }
        }
    }
}
