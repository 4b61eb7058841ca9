//! ASCII rendering of the arena for headless runs.

use std::fmt::Write as _;

use blast_arena_core::TileKind;
use blast_arena_world::{query, World};

const AGENT_GLYPHS: [char; 4] = ['1', '2', '3', '4'];

/// Draws the board, devices, lingering blasts and active agents, followed by
/// a status line.
///
/// Glyphs: `#` wall, `+` destructible, `.` floor, `o` armed device, `*` blast,
/// digits for agents.
pub(crate) fn render(world: &World) -> String {
    let board = query::board(world);
    let columns = usize::try_from(board.columns()).unwrap_or(0);
    let rows = usize::try_from(board.rows()).unwrap_or(0);
    let mut cells: Vec<Vec<char>> = (0..rows)
        .map(|y| {
            (0..columns)
                .map(|x| match board.tile_at(x as i32, y as i32) {
                    TileKind::Wall => '#',
                    TileKind::Destructible => '+',
                    TileKind::Empty => '.',
                })
                .collect()
        })
        .collect();

    let mut paint = |x: i32, y: i32, glyph: char| {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if let Some(cell) = cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = glyph;
        }
    };

    for device in query::devices(world).iter() {
        match device.frozen_blast() {
            Some(blast) => {
                for tile in blast.iter() {
                    paint(tile.x(), tile.y(), '*');
                }
            }
            None => paint(device.position().x(), device.position().y(), 'o'),
        }
    }

    let agents = query::agent_view(world);
    for agent in agents.active() {
        let index = usize::try_from(agent.id.get()).unwrap_or(usize::MAX);
        let glyph = AGENT_GLYPHS.get(index).copied().unwrap_or('@');
        paint(agent.tile.x(), agent.tile.y(), glyph);
    }

    let mut frame = String::with_capacity((columns + 1) * (rows + 1));
    for row in cells {
        frame.extend(row);
        frame.push('\n');
    }

    let _ = write!(
        frame,
        "round {} {:?} stage {}",
        query::round_index(world),
        query::round_state(world),
        query::stage_ticks_remaining(world)
    );
    for agent in agents.iter() {
        let _ = write!(frame, " | {:?} {}", agent.kind, agent.score);
    }
    frame.push('\n');
    frame
}
