//! Tile storage, arena generation and fixed layouts.

use blast_arena_core::{GridPosition, TileKind};
use rand::Rng;
use thiserror::Error;

/// Dense W×H grid of tile kinds stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl Board {
    /// Builds the bare wall skeleton: the perimeter plus a pillar on every cell
    /// whose coordinates are both even. The inset spawn corners stay open.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let mut tiles = Vec::with_capacity(cell_count(columns, rows));
        for y in 0..rows {
            for x in 0..columns {
                let perimeter = x == 0 || y == 0 || x + 1 == columns || y + 1 == rows;
                let pillar = x % 2 == 0 && y % 2 == 0;
                tiles.push(if perimeter || pillar {
                    TileKind::Wall
                } else {
                    TileKind::Empty
                });
            }
        }

        let mut board = Self {
            columns,
            rows,
            tiles,
        };
        for corner in spawn_corners(columns, rows) {
            if let Some(index) = board.index(corner) {
                board.tiles[index] = TileKind::Empty;
            }
        }
        board
    }

    /// Generates a playable arena: the skeleton from [`Board::open`] with a
    /// uniformly sampled share of the remaining open cells turned into
    /// destructible tiles. Cells within `safe_zone_radius` (Manhattan) of a
    /// spawn corner are never filled.
    pub fn generate<R: Rng + ?Sized>(
        columns: u32,
        rows: u32,
        density: f32,
        safe_zone_radius: u32,
        rng: &mut R,
    ) -> Self {
        let mut board = Self::open(columns, rows);
        let corners = spawn_corners(columns, rows);

        let eligible: Vec<usize> = board
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == TileKind::Empty)
            .map(|(index, _)| index)
            .filter(|index| {
                let position = board.position_of(*index);
                corners
                    .iter()
                    .all(|corner| corner.manhattan_distance(position) > safe_zone_radius)
            })
            .collect();

        let density = density.clamp(0.0, 1.0);
        let amount = ((eligible.len() as f32) * density).round() as usize;
        let amount = amount.min(eligible.len());

        for chosen in rand::seq::index::sample(rng, eligible.len(), amount).into_iter() {
            board.tiles[eligible[chosen]] = TileKind::Destructible;
        }

        board
    }

    /// Parses an ASCII layout: `#` wall, `+` destructible, `.` empty.
    ///
    /// Blank lines and surrounding whitespace are ignored; every remaining row
    /// must have the same width.
    pub fn parse(layout: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = lines.first() else {
            return Err(LayoutError::Empty);
        };
        let width = first.chars().count();

        let mut tiles = Vec::with_capacity(width * lines.len());
        for (y, line) in lines.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected: width,
                    actual,
                });
            }
            for (x, symbol) in line.chars().enumerate() {
                tiles.push(match symbol {
                    '#' => TileKind::Wall,
                    '+' => TileKind::Destructible,
                    '.' => TileKind::Empty,
                    other => return Err(LayoutError::UnknownTile { symbol: other, x, y }),
                });
            }
        }

        let columns = u32::try_from(width).map_err(|_| LayoutError::TooLarge)?;
        let rows = u32::try_from(lines.len()).map_err(|_| LayoutError::TooLarge)?;
        Ok(Self {
            columns,
            rows,
            tiles,
        })
    }

    /// Width of the board in tiles.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the board in tiles.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Kind of the tile at `(x, y)`; anything outside the board is a wall.
    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> TileKind {
        self.tile(GridPosition::new(x, y))
    }

    /// Kind of the tile at `position`; anything outside the board is a wall.
    #[must_use]
    pub fn tile(&self, position: GridPosition) -> TileKind {
        self.index(position)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(TileKind::Wall)
    }

    /// Reports whether the position lies on the board.
    #[must_use]
    pub fn contains(&self, position: GridPosition) -> bool {
        self.index(position).is_some()
    }

    /// Turns a destructible tile into empty floor. Returns whether anything
    /// changed; every other tile kind is left untouched.
    pub fn destroy(&mut self, position: GridPosition) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        match self.tiles.get_mut(index) {
            Some(tile) if *tile == TileKind::Destructible => {
                *tile = TileKind::Empty;
                true
            }
            _ => false,
        }
    }

    /// Every position on the board, columns outermost.
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> {
        let columns = i32::try_from(self.columns).unwrap_or(0);
        let rows = i32::try_from(self.rows).unwrap_or(0);
        (0..columns).flat_map(move |x| (0..rows).map(move |y| GridPosition::new(x, y)))
    }

    /// Central tile of the board.
    #[must_use]
    pub fn center(&self) -> GridPosition {
        let x = i32::try_from(self.columns / 2).unwrap_or(0);
        let y = i32::try_from(self.rows / 2).unwrap_or(0);
        GridPosition::new(x, y)
    }

    /// Number of tiles of the given kind.
    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    pub(crate) fn index(&self, position: GridPosition) -> Option<usize> {
        let x = u32::try_from(position.x()).ok()?;
        let y = u32::try_from(position.y()).ok()?;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn position_of(&self, index: usize) -> GridPosition {
        let width = usize::try_from(self.columns).unwrap_or(1).max(1);
        let x = i32::try_from(index % width).unwrap_or(0);
        let y = i32::try_from(index / width).unwrap_or(0);
        GridPosition::new(x, y)
    }
}

/// Inset corner tiles where agents spawn, clockwise from the top-left.
#[must_use]
pub fn spawn_corners(columns: u32, rows: u32) -> [GridPosition; 4] {
    let right = i32::try_from(columns).unwrap_or(i32::MAX).saturating_sub(2);
    let bottom = i32::try_from(rows).unwrap_or(i32::MAX).saturating_sub(2);
    [
        GridPosition::new(1, 1),
        GridPosition::new(right, 1),
        GridPosition::new(right, bottom),
        GridPosition::new(1, bottom),
    ]
}

/// Reasons an ASCII layout cannot be turned into a [`Board`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contains no rows.
    #[error("layout contains no rows")]
    Empty,
    /// A row is wider or narrower than the first one.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    Ragged {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A character does not map to a tile kind.
    #[error("unknown tile {symbol:?} at ({x}, {y})")]
    UnknownTile {
        /// Offending character.
        symbol: char,
        /// Column of the character.
        x: usize,
        /// Row of the character.
        y: usize,
    },
    /// The layout cannot be addressed with 32-bit coordinates.
    #[error("layout exceeds the addressable size")]
    TooLarge,
}

fn cell_count(columns: u32, rows: u32) -> usize {
    let count = u64::from(columns) * u64::from(rows);
    usize::try_from(count).unwrap_or(0)
}
