use blast_arena_core::{
    AgentId, AgentKind, AgentSnapshot, AgentView, ArenaConfig, Command, Controller, GridPosition,
    Intent, TilePoint,
};
use blast_arena_system_decision::{Decision, Rule};
use blast_arena_system_planning::{DangerMap, DangerTime};
use blast_arena_world::{Board, DeviceSet};

fn snapshot(id: u32, x: i32, y: i32) -> AgentSnapshot {
    let tile = GridPosition::new(x, y);
    AgentSnapshot {
        id: AgentId::new(id),
        kind: AgentKind::Healer,
        controller: Controller::Bot,
        tile,
        position: TilePoint::from(tile),
        heading: None,
        active: true,
        score: 0,
        pending_intents: 0,
    }
}

/// Perimeter walls around an empty interior.
fn empty_board(columns: usize, rows: usize) -> Board {
    let mut layout = String::new();
    for y in 0..rows {
        for x in 0..columns {
            let border = x == 0 || y == 0 || x + 1 == columns || y + 1 == rows;
            layout.push(if border { '#' } else { '.' });
        }
        layout.push('\n');
    }
    Board::parse(&layout).expect("valid layout")
}

fn plan(
    board: &Board,
    devices: &DeviceSet,
    agents: &AgentView,
    config: &ArenaConfig,
) -> (Option<Rule>, Vec<Intent>) {
    let decision = Decision::new(config);
    let mut out = Vec::new();
    let rule = decision.handle(AgentId::new(0), board, devices, agents, &mut out);
    let intents = out
        .into_iter()
        .flat_map(|command| match command {
            Command::QueueIntents { intents, .. } => intents,
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    (rule, intents)
}

fn moves(intents: &[Intent]) -> Vec<GridPosition> {
    intents
        .iter()
        .filter_map(|intent| match intent {
            Intent::MoveTo(tile) => Some(*tile),
            Intent::PlaceDevice => None,
        })
        .collect()
}

#[test]
fn agent_on_short_fuse_flees_its_tile() {
    let board = empty_board(11, 11);
    let mut devices = DeviceSet::new();
    let _ = devices.arm(Some(AgentId::new(1)), GridPosition::new(5, 5), 1, 3);
    let agents = AgentView::from_snapshots(vec![snapshot(0, 5, 5), snapshot(1, 1, 1)]);

    let (rule, intents) = plan(&board, &devices, &agents, &ArenaConfig::default());

    assert_eq!(rule, Some(Rule::Survival));
    assert!(!intents.contains(&Intent::PlaceDevice));
    let route = moves(&intents);
    assert!(!route.is_empty());
    assert_eq!(route[0].manhattan_distance(GridPosition::new(5, 5)), 1);
    let danger = DangerMap::build(&board, &devices, 1);
    assert_eq!(danger.danger_time(route[0]), DangerTime::At(1));
    assert!(!danger.is_threatened(route[route.len() - 1]));
}

#[test]
fn agent_waits_rather_than_cross_a_tile_that_detonates_first() {
    let board = Board::parse(
        "
        #######
        #.....#
        #.#####
        #.#####
        #.#####
        #.....#
        #######
        ",
    )
    .expect("valid layout");
    let mut devices = DeviceSet::new();
    let _ = devices.arm(None, GridPosition::new(5, 1), 8, 3);
    let _ = devices.arm(None, GridPosition::new(1, 3), 3, 3);
    let agents = AgentView::from_snapshots(vec![snapshot(0, 4, 1), snapshot(1, 5, 5)]);

    let (rule, intents) = plan(&board, &devices, &agents, &ArenaConfig::default());

    let danger = DangerMap::build(&board, &devices, 1);
    assert_eq!(danger.danger_time(GridPosition::new(4, 1)), DangerTime::At(8));
    assert_eq!(danger.danger_time(GridPosition::new(1, 1)), DangerTime::At(3));
    assert_eq!(rule, Some(Rule::Idle));
    assert!(intents.is_empty());
}

#[test]
fn agent_with_no_reachable_haven_takes_no_action() {
    let board = Board::parse(
        "
        #####
        #...#
        #####
        ",
    )
    .expect("valid layout");
    let mut devices = DeviceSet::new();
    let _ = devices.arm(None, GridPosition::new(2, 1), 5, 3);
    let agents = AgentView::from_snapshots(vec![snapshot(0, 1, 1)]);

    let (rule, intents) = plan(&board, &devices, &agents, &ArenaConfig::default());

    assert_eq!(rule, Some(Rule::Idle));
    assert!(intents.is_empty());
}

#[test]
fn survival_route_stays_ahead_of_the_blast() {
    let board = empty_board(11, 11);
    let mut devices = DeviceSet::new();
    let _ = devices.arm(None, GridPosition::new(5, 5), 4, 3);
    let agents = AgentView::from_snapshots(vec![snapshot(0, 5, 5), snapshot(1, 1, 1)]);

    let (rule, intents) = plan(&board, &devices, &agents, &ArenaConfig::default());

    assert_eq!(rule, Some(Rule::Survival));
    let danger = DangerMap::build(&board, &devices, 1);
    for (index, tile) in moves(&intents).into_iter().enumerate() {
        let turn = u32::try_from(index + 1).expect("short route");
        assert!(!danger.is_danger_at(tile, turn), "{tile:?} at turn {turn}");
    }
}

#[test]
fn adjacent_enemy_triggers_placement_with_escape() {
    let board = empty_board(11, 11);
    let agents = AgentView::from_snapshots(vec![snapshot(0, 5, 5), snapshot(1, 6, 5)]);

    let (rule, intents) = plan(&board, &DeviceSet::new(), &agents, &ArenaConfig::default());

    assert_eq!(rule, Some(Rule::Offense));
    assert_eq!(intents[0], Intent::PlaceDevice);
    let route = moves(&intents[1..]);
    assert_eq!(route.len(), intents.len() - 1);
    assert!(!route.is_empty());
    assert!(!route.contains(&GridPosition::new(6, 5)));
}

#[test]
fn crate_neighbour_triggers_farming() {
    let board = Board::parse(
        "
        #########
        #.......#
        #.+.....#
        #.......#
        #########
        ",
    )
    .expect("valid layout");
    let agents = AgentView::from_snapshots(vec![snapshot(0, 2, 1), snapshot(1, 7, 3)]);

    let (rule, intents) = plan(&board, &DeviceSet::new(), &agents, &ArenaConfig::default());

    assert_eq!(rule, Some(Rule::Farming));
    assert_eq!(intents.first(), Some(&Intent::PlaceDevice));
    assert!(intents.len() > 1);
}

#[test]
fn enclosed_agent_never_places_a_device() {
    let board = Board::parse(
        "
        #########
        #.......#
        #.##+##.#
        #.#...+.#
        #.##+##.#
        #.......#
        #########
        ",
    )
    .expect("valid layout");
    let agents = AgentView::from_snapshots(vec![snapshot(0, 3, 3), snapshot(1, 1, 1)]);
    let config = ArenaConfig::default();

    let (rule, intents) = plan(&board, &DeviceSet::new(), &agents, &config);

    assert!(!intents.contains(&Intent::PlaceDevice));
    assert_ne!(rule, Some(Rule::Offense));
    assert_ne!(rule, Some(Rule::Farming));
}
