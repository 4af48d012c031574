//! Maze read contract and an in-memory tile grid.
//!
//! The simulation only talks to a maze through the [`Maze`] trait: bounds,
//! tile lookup and tile enumeration. [`TileGrid`] is the grid the binary and
//! the tests use, either parsed from ASCII or built by [`generate`].

pub mod generate;

use std::fmt;

use bitflags::bitflags;

use crate::error::MazeError;

// ============================================================================
// Coordinates & Directions
// ============================================================================

/// Integer (column, row) position on the tile grid. Rows grow downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    #[must_use]
    pub const fn step(self, dir: Dir) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    #[must_use]
    pub const fn distance_sq(self, other: Self) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance in tiles.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Order in which candidate moves are evaluated; earlier wins ties.
    pub const SCAN: [Self; 4] = [Self::Down, Self::Up, Self::Right, Self::Left];

    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction of a single-axis unit step, if `(dx, dy)` is one.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            _ => None,
        }
    }
}

// ============================================================================
// Tiles
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    Boundary,
    Wall,
    Path,
    PowerPellet,
    GhostSpawn,
    Door,
}

bitflags! {
    /// Set of tile kinds an entity may step onto.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TileMask: u8 {
        const BOUNDARY = 1 << 0;
        const WALL = 1 << 1;
        const PATH = 1 << 2;
        const POWER_PELLET = 1 << 3;
        const GHOST_SPAWN = 1 << 4;
        const DOOR = 1 << 5;

        const WALKABLE = Self::PATH.bits()
            | Self::POWER_PELLET.bits()
            | Self::GHOST_SPAWN.bits()
            | Self::DOOR.bits();
    }
}

impl Tile {
    #[must_use]
    pub const fn mask(self) -> TileMask {
        match self {
            Self::Boundary => TileMask::BOUNDARY,
            Self::Wall => TileMask::WALL,
            Self::Path => TileMask::PATH,
            Self::PowerPellet => TileMask::POWER_PELLET,
            Self::GhostSpawn => TileMask::GHOST_SPAWN,
            Self::Door => TileMask::DOOR,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Boundary => '#',
            Self::Wall => 'W',
            Self::Path => '.',
            Self::PowerPellet => 'o',
            Self::GhostSpawn => 'S',
            Self::Door => 'D',
        }
    }

    #[must_use]
    pub const fn from_symbol(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Boundary),
            'W' => Some(Self::Wall),
            '.' => Some(Self::Path),
            'o' => Some(Self::PowerPellet),
            'S' => Some(Self::GhostSpawn),
            'D' => Some(Self::Door),
            _ => None,
        }
    }
}

// ============================================================================
// Maze Contract
// ============================================================================

/// Read-only view of a maze. The maze never changes while a level runs.
pub trait Maze {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Tile at `pos`. Positions outside the grid read as [`Tile::Boundary`].
    fn tile(&self, pos: GridPos) -> Tile;

    fn is_valid(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width() && pos.y < self.height()
    }

    /// Every position holding `kind`, in row-major order.
    fn tiles_of(&self, kind: Tile) -> Vec<GridPos> {
        let mut found = Vec::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let pos = GridPos::new(x, y);
                if self.tile(pos) == kind {
                    found.push(pos);
                }
            }
        }
        found
    }

    fn clamp(&self, pos: GridPos) -> GridPos {
        GridPos::new(
            pos.x.clamp(0, (self.width() - 1).max(0)),
            pos.y.clamp(0, (self.height() - 1).max(0)),
        )
    }
}

// ============================================================================
// Tile Grid
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Grid of `width` x `height` filled with `fill`.
    #[must_use]
    pub fn filled(width: i32, height: i32, fill: Tile) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width: width.max(0),
            height: height.max(0),
            tiles: vec![fill; len],
        }
    }

    /// Parses one row per line using the symbols of [`Tile::symbol`].
    /// Blank lines and trailing whitespace are ignored.
    pub fn parse(text: &str) -> Result<Self, MazeError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.chars().count();

        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(MazeError::Ragged {
                    row: y,
                    expected,
                    found,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = Tile::from_symbol(ch).ok_or(MazeError::UnknownTile { ch, x, y })?;
                tiles.push(tile);
            }
        }

        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            tiles,
        })
    }

    pub fn set(&mut self, pos: GridPos, tile: Tile) {
        if let Some(idx) = self.index(pos) {
            self.tiles[idx] = tile;
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.is_valid(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }
}

impl Maze for TileGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn tile(&self, pos: GridPos) -> Tile {
        self.index(pos).map_or(Tile::Boundary, |idx| self.tiles[idx])
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", self.tile(GridPos::new(x, y)).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = "
#####
#.o.#
#WDW#
#.S.#
#####
";

    #[test]
    fn parses_layout() {
        let grid = TileGrid::parse(LAYOUT).unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.tile(GridPos::new(2, 1)), Tile::PowerPellet);
        assert_eq!(grid.tile(GridPos::new(2, 2)), Tile::Door);
        assert_eq!(grid.tile(GridPos::new(1, 2)), Tile::Wall);
        assert_eq!(grid.tile(GridPos::new(2, 3)), Tile::GhostSpawn);
        assert_eq!(grid.to_string().trim(), LAYOUT.trim());
    }

    #[test]
    fn out_of_range_reads_as_boundary() {
        let grid = TileGrid::parse(LAYOUT).unwrap();
        assert!(!grid.is_valid(GridPos::new(-1, 0)));
        assert!(!grid.is_valid(GridPos::new(5, 0)));
        assert_eq!(grid.tile(GridPos::new(7, 7)), Tile::Boundary);
    }

    #[test]
    fn enumerates_tiles_row_major() {
        let grid = TileGrid::parse(LAYOUT).unwrap();
        assert_eq!(
            grid.tiles_of(Tile::Path),
            vec![
                GridPos::new(1, 1),
                GridPos::new(3, 1),
                GridPos::new(1, 3),
                GridPos::new(3, 3)
            ]
        );
        assert_eq!(grid.tiles_of(Tile::GhostSpawn), vec![GridPos::new(2, 3)]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = TileGrid::parse("###\n#.\n###").unwrap_err();
        assert_eq!(
            err,
            MazeError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_unknown_symbols() {
        let err = TileGrid::parse("###\n#?#\n###").unwrap_err();
        assert_eq!(err, MazeError::UnknownTile { ch: '?', x: 1, y: 1 });
    }

    #[test]
    fn rejects_empty_layout() {
        assert_eq!(TileGrid::parse("\n  \n").unwrap_err(), MazeError::Empty);
    }

    #[test]
    fn clamps_into_bounds() {
        let grid = TileGrid::parse(LAYOUT).unwrap();
        assert_eq!(grid.clamp(GridPos::new(-3, 9)), GridPos::new(0, 4));
    }

    #[test]
    fn walkable_mask_excludes_walls() {
        assert!(!TileMask::WALKABLE.contains(Tile::Wall.mask()));
        assert!(!TileMask::WALKABLE.contains(Tile::Boundary.mask()));
        assert!(TileMask::WALKABLE.contains(Tile::Door.mask()));
    }
}
