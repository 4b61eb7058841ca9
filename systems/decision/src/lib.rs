#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent priority state machine that turns threat analysis into intents.
//!
//! Each planning cycle evaluates, in order: survive, attack, farm, roam. The
//! first rule that produces intents wins and its plan replaces the agent's
//! queue through [`Command::QueueIntents`].

use std::collections::{HashMap, HashSet, VecDeque};

use blast_arena_core::{
    AgentId, AgentSnapshot, AgentView, ArenaConfig, Command, GridPosition, Intent, TileKind,
    TilePoint,
};
use blast_arena_system_planning::{find_path, DangerMap, DangerTime, EscapeProver, Path, Terrain};
use blast_arena_world::{blast_set_of, Board, DeviceSet};
use tracing::trace;

/// Rule that produced an agent's plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Fleeing a tile some device threatens.
    Survival,
    /// Placing a device that catches another agent.
    Offense,
    /// Placing a device next to a destructible tile.
    Farming,
    /// Walking toward the nearest enemy.
    Roaming,
    /// Walking toward, or blasting, the nearest destructible tile.
    Breaking,
    /// Nothing worth doing this cycle.
    Idle,
}

/// Pure system that plans for one bot at a time.
#[derive(Debug)]
pub struct Decision {
    prover: EscapeProver,
    blast_range: u32,
    ticks_per_step: u32,
}

impl Decision {
    /// Creates a decision process playing by the provided rules.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            prover: EscapeProver::new(config),
            blast_range: config.blast_range,
            ticks_per_step: config.ticks_per_step,
        }
    }

    /// Plans for `agent` and emits its intents into `out`.
    ///
    /// Returns `None` when the agent is unknown, inactive or still working
    /// through an earlier plan; otherwise the rule that decided this cycle.
    pub fn handle(
        &self,
        agent: AgentId,
        board: &Board,
        devices: &DeviceSet,
        agents: &AgentView,
        out: &mut Vec<Command>,
    ) -> Option<Rule> {
        let me = agents.get(agent)?;
        if !me.active || me.is_busy() {
            return None;
        }

        let mut devices = devices.clone();
        let terrain = Terrain::for_agent(board, agents, agent);
        let danger = DangerMap::build(board, &devices, self.ticks_per_step);
        let mut planner = Planner {
            decision: self,
            me,
            agents,
            terrain: &terrain,
            danger: &danger,
            devices: &mut devices,
        };

        let (rule, intents) = planner.plan();
        trace!(
            agent = agent.get(),
            rule = ?rule,
            intents = intents.len(),
            "planned"
        );
        if !intents.is_empty() {
            out.push(Command::QueueIntents { agent, intents });
        }
        Some(rule)
    }
}

struct Planner<'a> {
    decision: &'a Decision,
    me: &'a AgentSnapshot,
    agents: &'a AgentView,
    terrain: &'a Terrain<'a>,
    danger: &'a DangerMap,
    devices: &'a mut DeviceSet,
}

impl Planner<'_> {
    fn plan(&mut self) -> (Rule, Vec<Intent>) {
        if self.danger.is_threatened(self.me.tile) {
            return match self.flee() {
                Some(intents) => (Rule::Survival, intents),
                None => (Rule::Idle, Vec::new()),
            };
        }
        if let Some(intents) = self.attack() {
            return (Rule::Offense, intents);
        }
        if let Some(intents) = self.farm() {
            return (Rule::Farming, intents);
        }
        if let Some(intents) = self.roam() {
            return (Rule::Roaming, intents);
        }
        if let Some(intents) = self.break_through() {
            return (Rule::Breaking, intents);
        }
        (Rule::Idle, Vec::new())
    }

    /// Breadth-first flight to the nearest tile no device threatens.
    ///
    /// Routes that stay ahead of every blast are preferred. When none exists
    /// the agent may still cross tiles that detonate no earlier than its own,
    /// since standing still is no better; otherwise it waits and replans.
    fn flee(&self) -> Option<Vec<Intent>> {
        let danger = self.danger;
        let staying = danger.danger_time(self.me.tile);
        self.search_haven(|tile, turn| !danger.is_danger_at(tile, turn))
            .or_else(|| {
                self.search_haven(|tile, turn| {
                    let ahead = !danger.is_danger_at(tile, turn);
                    !danger.is_danger_at(tile, 0) && (ahead || danger.danger_time(tile) >= staying)
                })
            })
            .map(|route| route.into_iter().map(Intent::MoveTo).collect())
    }

    fn search_haven<F>(&self, passable: F) -> Option<Vec<GridPosition>>
    where
        F: Fn(GridPosition, u32) -> bool,
    {
        let start = self.me.tile;
        let mut queue = VecDeque::from([(start, 0u32)]);
        let mut visited = HashSet::from([start]);
        let mut came_from: HashMap<GridPosition, GridPosition> = HashMap::new();

        while let Some((tile, turn)) = queue.pop_front() {
            if self.danger.danger_time(tile) == DangerTime::Safe {
                return Some(route_to(&came_from, start, tile));
            }
            for next in tile.neighbors() {
                if visited.contains(&next) || !self.terrain.is_walkable(next) {
                    continue;
                }
                if !passable(next, turn + 1) {
                    continue;
                }
                let _ = visited.insert(next);
                let _ = came_from.insert(next, tile);
                queue.push_back((next, turn + 1));
            }
        }
        None
    }

    fn attack(&mut self) -> Option<Vec<Intent>> {
        if !self.can_place() {
            return None;
        }
        let blast = blast_set_of(self.terrain.board(), self.me.tile, self.decision.blast_range);
        let me = self.me.id;
        if !self
            .agents
            .active()
            .any(|enemy| enemy.id != me && blast.contains(enemy.tile))
        {
            return None;
        }
        self.place_and_escape()
    }

    fn farm(&mut self) -> Option<Vec<Intent>> {
        if !self.can_place() {
            return None;
        }
        let board = self.terrain.board();
        if !self
            .me
            .tile
            .neighbors()
            .into_iter()
            .any(|tile| board.tile(tile) == TileKind::Destructible)
        {
            return None;
        }
        self.place_and_escape()
    }

    fn roam(&self) -> Option<Vec<Intent>> {
        let target = self.roam_target();
        if self.terrain.is_walkable(target) || target == self.me.tile {
            return self.first_step_toward(target);
        }
        target
            .neighbors()
            .into_iter()
            .filter(|tile| self.terrain.is_walkable(*tile))
            .find_map(|tile| self.first_step_toward(tile))
    }

    fn break_through(&mut self) -> Option<Vec<Intent>> {
        let crate_tile = self.nearest_destructible()?;
        if crate_tile.manhattan_distance(self.me.tile) == 1 {
            if !self.can_place() {
                return None;
            }
            return self.place_and_escape();
        }
        crate_tile
            .neighbors()
            .into_iter()
            .filter(|tile| self.terrain.is_walkable(*tile))
            .find_map(|tile| self.first_step_toward(tile))
    }

    /// Nearest active enemy by straight-line distance, or the board centre.
    fn roam_target(&self) -> GridPosition {
        let origin: TilePoint = self.me.position;
        let mut best = self.terrain.board().center();
        let mut best_distance = f32::MAX;
        for enemy in self.agents.active().filter(|enemy| enemy.id != self.me.id) {
            let distance = origin.distance(enemy.position);
            if distance < best_distance {
                best_distance = distance;
                best = enemy.tile;
            }
        }
        best
    }

    fn nearest_destructible(&self) -> Option<GridPosition> {
        let board = self.terrain.board();
        let mut best: Option<(u32, GridPosition)> = None;
        for tile in board.positions() {
            if board.tile(tile) != TileKind::Destructible {
                continue;
            }
            let distance = tile.manhattan_distance(self.me.tile);
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, tile));
            }
        }
        best.map(|(_, tile)| tile)
    }

    fn first_step_toward(&self, goal: GridPosition) -> Option<Vec<Intent>> {
        let path = find_path(self.terrain, self.danger, self.me.tile, goal)?;
        let step = path.steps().next();
        step.map(|step| vec![Intent::MoveTo(step)])
    }

    fn can_place(&self) -> bool {
        self.devices.at(self.me.tile).is_none()
    }

    fn place_and_escape(&mut self) -> Option<Vec<Intent>> {
        let tile = self.me.tile;
        let escape: Path = self
            .decision
            .prover
            .prove(self.terrain, &mut *self.devices, tile, tile)?;
        Some(
            std::iter::once(Intent::PlaceDevice)
                .chain(escape.steps().map(Intent::MoveTo))
                .collect(),
        )
    }
}

fn route_to(
    came_from: &HashMap<GridPosition, GridPosition>,
    start: GridPosition,
    goal: GridPosition,
) -> Vec<GridPosition> {
    let mut route = Vec::new();
    let mut current = goal;
    while current != start {
        route.push(current);
        match came_from.get(&current) {
            Some(previous) => current = *previous,
            None => break,
        }
    }
    route.reverse();
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use blast_arena_core::{AgentKind, Controller};

    fn snapshot(id: u32, tile: GridPosition) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            kind: AgentKind::Tank,
            controller: Controller::Bot,
            tile,
            position: TilePoint::from(tile),
            heading: None,
            active: true,
            score: 0,
            pending_intents: 0,
        }
    }

    #[test]
    fn busy_agents_are_not_replanned() {
        let board = Board::open(15, 11);
        let mut me = snapshot(0, GridPosition::new(1, 1));
        me.pending_intents = 2;
        let agents = AgentView::from_snapshots(vec![me, snapshot(1, GridPosition::new(13, 9))]);
        let decision = Decision::new(&ArenaConfig::default());
        let mut out = Vec::new();

        let rule = decision.handle(AgentId::new(0), &board, &DeviceSet::new(), &agents, &mut out);

        assert_eq!(rule, None);
        assert!(out.is_empty());
    }

    #[test]
    fn roaming_queues_a_single_step_toward_the_enemy() {
        let board = Board::open(15, 11);
        let agents = AgentView::from_snapshots(vec![
            snapshot(0, GridPosition::new(1, 1)),
            snapshot(1, GridPosition::new(13, 9)),
        ]);
        let decision = Decision::new(&ArenaConfig::default());
        let mut out = Vec::new();

        let rule = decision.handle(AgentId::new(0), &board, &DeviceSet::new(), &agents, &mut out);

        assert_eq!(rule, Some(Rule::Roaming));
        let [Command::QueueIntents { agent, intents }] = out.as_slice() else {
            panic!("expected a single plan, got {out:?}");
        };
        assert_eq!(*agent, AgentId::new(0));
        assert_eq!(intents.len(), 1);
        let Intent::MoveTo(step) = intents[0] else {
            panic!("expected a move");
        };
        assert_eq!(step.manhattan_distance(GridPosition::new(1, 1)), 1);
    }

    #[test]
    fn walled_off_enemy_sends_agent_to_the_nearest_crate() {
        let board = Board::parse(
            "
            #########
            #...+.#.#
            #########
            ",
        )
        .expect("valid layout");
        let agents = AgentView::from_snapshots(vec![
            snapshot(0, GridPosition::new(1, 1)),
            snapshot(1, GridPosition::new(7, 1)),
        ]);
        let decision = Decision::new(&ArenaConfig::default());
        let mut out = Vec::new();

        let rule = decision.handle(AgentId::new(0), &board, &DeviceSet::new(), &agents, &mut out);

        assert_eq!(rule, Some(Rule::Breaking));
        assert_eq!(
            out,
            vec![Command::QueueIntents {
                agent: AgentId::new(0),
                intents: vec![Intent::MoveTo(GridPosition::new(2, 1))],
            }]
        );
    }
}
