use blast_arena_core::{
    AgentId, AgentKind, AgentSpec, ArenaConfig, Command, DeviceId, Event, GridPosition, Intent,
    RoundState, ScoreReason, TileKind,
};
use blast_arena_world::{apply, query, Board, World};

fn config(fuse_ticks: u32) -> ArenaConfig {
    ArenaConfig {
        columns: 7,
        rows: 5,
        fuse_ticks,
        countdown_ticks: 0,
        agents: vec![
            AgentSpec::bot(AgentKind::Player),
            AgentSpec::bot(AgentKind::Tank),
        ],
        ..ArenaConfig::default()
    }
}

fn world(layout: &str, fuse_ticks: u32, spawns: [GridPosition; 2]) -> World {
    let layout = Board::parse(layout).expect("valid layout");
    World::with_layout(config(fuse_ticks), layout, Some(spawns.to_vec())).expect("valid world")
}

const OPEN: &str = "
    #######
    #.....#
    #.#.#.#
    #.....#
    #######
";

fn queue(world: &mut World, agent: AgentId, intents: Vec<Intent>, events: &mut Vec<Event>) {
    apply(world, Command::QueueIntents { agent, intents }, events);
}

fn tick(world: &mut World, count: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..count {
        apply(world, Command::Tick, &mut events);
    }
    events
}

fn score(world: &World, agent: AgentId) -> u32 {
    query::agent_view(world).get(agent).expect("agent").score
}

#[test]
fn owner_scores_elimination_and_last_standing() {
    let attacker = AgentId::new(0);
    let target = AgentId::new(1);
    let mut world = world(OPEN, 4, [GridPosition::new(1, 1), GridPosition::new(4, 1)]);
    let mut events = Vec::new();
    queue(
        &mut world,
        attacker,
        vec![
            Intent::PlaceDevice,
            Intent::MoveTo(GridPosition::new(2, 1)),
            Intent::MoveTo(GridPosition::new(3, 1)),
            Intent::MoveTo(GridPosition::new(3, 2)),
        ],
        &mut events,
    );

    let events = tick(&mut world, 4);

    assert!(events.contains(&Event::AgentHit {
        agent: target,
        device: DeviceId::new(0),
        owner: Some(attacker),
    }));
    assert!(events.contains(&Event::ScoreAwarded {
        agent: attacker,
        score: 1,
        reason: ScoreReason::Elimination,
    }));
    assert!(events.contains(&Event::ScoreAwarded {
        agent: attacker,
        score: 2,
        reason: ScoreReason::LastStanding,
    }));
    assert!(events.contains(&Event::RoundEnded {
        winner: Some(attacker)
    }));
    assert_eq!(query::round_state(&world), RoundState::RoundOver);
    assert_eq!(score(&world, attacker), 2);
    assert_eq!(score(&world, target), 0);
}

#[test]
fn self_hit_awards_nothing_to_the_owner() {
    let owner = AgentId::new(0);
    let bystander = AgentId::new(1);
    let mut world = world(OPEN, 2, [GridPosition::new(1, 1), GridPosition::new(5, 3)]);
    let mut events = Vec::new();
    queue(&mut world, owner, vec![Intent::PlaceDevice], &mut events);

    let events = tick(&mut world, 2);

    assert!(events.contains(&Event::AgentHit {
        agent: owner,
        device: DeviceId::new(0),
        owner: Some(owner),
    }));
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::ScoreAwarded {
            reason: ScoreReason::Elimination,
            ..
        }
    )));
    assert_eq!(score(&world, owner), 0);
    assert_eq!(score(&world, bystander), 1);
}

#[test]
fn round_end_is_idempotent() {
    let owner = AgentId::new(0);
    let mut world = world(OPEN, 2, [GridPosition::new(1, 1), GridPosition::new(5, 3)]);
    let mut events = Vec::new();
    queue(&mut world, owner, vec![Intent::PlaceDevice], &mut events);
    let _ = tick(&mut world, 2);
    let scores: Vec<u32> = query::agent_view(&world).iter().map(|agent| agent.score).collect();

    let later = tick(&mut world, 5);

    assert!(later
        .iter()
        .all(|event| matches!(event, Event::TimeAdvanced { .. })));
    let after: Vec<u32> = query::agent_view(&world).iter().map(|agent| agent.score).collect();
    assert_eq!(scores, after);
    assert_eq!(query::round_state(&world), RoundState::RoundOver);
}

#[test]
fn stage_timer_ends_round_without_winner() {
    let layout = Board::parse(OPEN).expect("valid layout");
    let config = ArenaConfig {
        stage_ticks: 3,
        ..config(8)
    };
    let mut world = World::with_layout(config, layout, None).expect("valid world");

    let early = tick(&mut world, 2);
    assert!(!early
        .iter()
        .any(|event| matches!(event, Event::RoundEnded { .. })));
    assert_eq!(query::stage_ticks_remaining(&world), 1);

    let events = tick(&mut world, 1);
    assert!(events.contains(&Event::RoundEnded { winner: None }));
    assert_eq!(query::round_state(&world), RoundState::RoundOver);
}

#[test]
fn blast_clears_crate_and_device_lingers_before_removal() {
    let layout = "
        #######
        #..+..#
        #.#.#.#
        #.....#
        #######
    ";
    let owner = AgentId::new(0);
    let mut world = world(layout, 4, [GridPosition::new(1, 1), GridPosition::new(5, 3)]);
    let mut events = Vec::new();
    queue(
        &mut world,
        owner,
        vec![
            Intent::PlaceDevice,
            Intent::MoveTo(GridPosition::new(1, 2)),
            Intent::MoveTo(GridPosition::new(1, 3)),
            Intent::MoveTo(GridPosition::new(2, 3)),
        ],
        &mut events,
    );

    let events = tick(&mut world, 4);
    assert!(events.contains(&Event::TileDestroyed {
        at: GridPosition::new(3, 1)
    }));
    assert_eq!(query::tile_at(&world, 3, 1), TileKind::Empty);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::AgentHit { .. })));

    let lingering = tick(&mut world, 1);
    assert!(!lingering
        .iter()
        .any(|event| matches!(event, Event::DeviceRemoved { .. })));
    assert_eq!(query::devices(&world).len(), 1);

    let removal = tick(&mut world, 1);
    assert!(removal.contains(&Event::DeviceRemoved {
        device: DeviceId::new(0)
    }));
    assert!(query::devices(&world).is_empty());
}

#[test]
fn new_game_resets_scores() {
    let owner = AgentId::new(0);
    let bystander = AgentId::new(1);
    let mut world = world(OPEN, 2, [GridPosition::new(1, 1), GridPosition::new(5, 3)]);
    let mut events = Vec::new();
    queue(&mut world, owner, vec![Intent::PlaceDevice], &mut events);
    let _ = tick(&mut world, 2);
    assert_eq!(score(&world, bystander), 1);

    apply(&mut world, Command::RestartRound, &mut events);
    assert_eq!(score(&world, bystander), 1);
    assert_eq!(query::round_index(&world), 2);

    apply(&mut world, Command::NewGame, &mut events);
    assert_eq!(score(&world, bystander), 0);
    assert_eq!(query::round_index(&world), 1);
    assert!(query::agent_view(&world).iter().all(|agent| agent.active));
}
