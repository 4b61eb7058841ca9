//! Agent state owned by the world: motion between tiles and the intent queue.

use std::collections::VecDeque;

use blast_arena_core::{AgentId, AgentKind, AgentSnapshot, Controller, GridPosition, Intent, TilePoint};
use glam::Vec2;

/// Distance under which a moving agent snaps onto its destination tile.
const SNAP_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Step {
    from: GridPosition,
    to: GridPosition,
}

#[derive(Clone, Debug)]
pub(crate) struct Agent {
    id: AgentId,
    kind: AgentKind,
    controller: Controller,
    position: Vec2,
    step: Option<Step>,
    intents: VecDeque<Intent>,
    active: bool,
    score: u32,
}

impl Agent {
    pub(crate) fn spawn(
        id: AgentId,
        kind: AgentKind,
        controller: Controller,
        tile: GridPosition,
    ) -> Self {
        Self {
            id,
            kind,
            controller,
            position: to_vec(tile),
            step: None,
            intents: VecDeque::new(),
            active: true,
            score: 0,
        }
    }

    pub(crate) const fn id(&self) -> AgentId {
        self.id
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) const fn score(&self) -> u32 {
        self.score
    }

    /// Canonical tile: the continuous position rounded to the nearest cell.
    pub(crate) fn tile(&self) -> GridPosition {
        let rounded = self.position.round();
        GridPosition::new(rounded.x as i32, rounded.y as i32)
    }

    pub(crate) fn heading(&self) -> Option<GridPosition> {
        self.step.map(|step| step.to)
    }

    /// Tiles this agent blocks for others: where it stands and where it is headed.
    pub(crate) fn anchors(&self, tile: GridPosition) -> bool {
        self.active && (self.tile() == tile || self.heading() == Some(tile))
    }

    pub(crate) fn is_stepping(&self) -> bool {
        self.step.is_some()
    }

    pub(crate) fn has_pending_move(&self) -> bool {
        self.is_stepping()
            || self
                .intents
                .iter()
                .any(|intent| matches!(intent, Intent::MoveTo(_)))
    }

    pub(crate) fn has_pending_placement(&self) -> bool {
        self.intents.contains(&Intent::PlaceDevice)
    }

    pub(crate) fn push_intent(&mut self, intent: Intent) {
        self.intents.push_back(intent);
    }

    pub(crate) fn replace_intents(&mut self, intents: Vec<Intent>) {
        self.intents = intents.into();
    }

    pub(crate) fn next_intent(&self) -> Option<Intent> {
        self.intents.front().copied()
    }

    pub(crate) fn pop_intent(&mut self) -> Option<Intent> {
        self.intents.pop_front()
    }

    pub(crate) fn clear_intents(&mut self) {
        self.intents.clear();
    }

    pub(crate) fn begin_step(&mut self, to: GridPosition) {
        self.step = Some(Step {
            from: self.tile(),
            to,
        });
    }

    /// Moves `speed` tiles toward the heading. Returns the completed step once
    /// the agent snaps onto its destination.
    pub(crate) fn advance_motion(&mut self, speed: f32) -> Option<(GridPosition, GridPosition)> {
        let step = self.step?;
        let target = to_vec(step.to);
        let delta = target - self.position;
        if delta.length() <= speed + SNAP_EPSILON {
            self.position = target;
            self.step = None;
            return Some((step.from, step.to));
        }
        self.position += delta.normalize_or_zero() * speed;
        None
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.step = None;
        self.intents.clear();
    }

    pub(crate) fn award_point(&mut self) -> u32 {
        self.score = self.score.saturating_add(1);
        self.score
    }

    pub(crate) fn reset_score(&mut self) {
        self.score = 0;
    }

    /// Puts the agent back on its spawn tile for a fresh round.
    pub(crate) fn respawn(&mut self, tile: GridPosition) {
        self.position = to_vec(tile);
        self.step = None;
        self.intents.clear();
        self.active = true;
    }

    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            kind: self.kind,
            controller: self.controller,
            tile: self.tile(),
            position: TilePoint::new(self.position.x, self.position.y),
            heading: self.heading(),
            active: self.active,
            score: self.score,
            pending_intents: self.intents.len(),
        }
    }
}

fn to_vec(tile: GridPosition) -> Vec2 {
    Vec2::new(tile.x() as f32, tile.y() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at(x: i32, y: i32) -> Agent {
        Agent::spawn(
            AgentId::new(0),
            AgentKind::Player,
            Controller::Bot,
            GridPosition::new(x, y),
        )
    }

    #[test]
    fn single_tick_step_snaps_immediately() {
        let mut agent = agent_at(1, 1);
        agent.begin_step(GridPosition::new(2, 1));

        let moved = agent.advance_motion(1.0);

        assert_eq!(
            moved,
            Some((GridPosition::new(1, 1), GridPosition::new(2, 1)))
        );
        assert_eq!(agent.tile(), GridPosition::new(2, 1));
        assert!(!agent.is_stepping());
    }

    #[test]
    fn slow_step_switches_canonical_tile_halfway() {
        let mut agent = agent_at(1, 1);
        agent.begin_step(GridPosition::new(1, 2));

        assert_eq!(agent.advance_motion(0.25), None);
        assert_eq!(agent.tile(), GridPosition::new(1, 1));
        assert_eq!(agent.advance_motion(0.25), None);
        assert_eq!(agent.advance_motion(0.25), None);
        assert_eq!(agent.tile(), GridPosition::new(1, 2));
        assert!(agent.anchors(GridPosition::new(1, 2)));
        assert!(agent.advance_motion(0.25).is_some());
        assert_eq!(agent.snapshot().position, TilePoint::new(1.0, 2.0));
    }

    #[test]
    fn deactivated_agent_drops_its_plan() {
        let mut agent = agent_at(3, 3);
        agent.push_intent(Intent::PlaceDevice);
        agent.begin_step(GridPosition::new(3, 4));

        agent.deactivate();

        assert!(!agent.is_active());
        assert!(!agent.is_stepping());
        assert_eq!(agent.next_intent(), None);
        assert!(!agent.anchors(GridPosition::new(3, 3)));
    }

    #[test]
    fn pending_requests_are_tracked_per_kind() {
        let mut agent = agent_at(3, 3);
        assert!(!agent.has_pending_move());
        assert!(!agent.has_pending_placement());

        agent.push_intent(Intent::PlaceDevice);
        assert!(agent.has_pending_placement());
        assert!(!agent.has_pending_move());

        agent.push_intent(Intent::MoveTo(GridPosition::new(3, 4)));
        assert!(agent.has_pending_move());
    }
}
