/// Grid geometry: directions, buffer positions, unit moves.
///
/// Coordinates are (line, column) in buffer space. Both are signed so that a
/// candidate move off the top or left edge can be represented and rejected.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit offset as (line delta, column delta).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up    => (-1, 0),
            Direction::Down  => (1, 0),
            Direction::Left  => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    #[cfg(test)]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up    => Direction::Down,
            Direction::Down  => Direction::Up,
            Direction::Left  => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up    => "up",
            Direction::Down  => "down",
            Direction::Left  => "left",
            Direction::Right => "right",
        }
    }

    /// Single-character arrow, used in logs.
    pub fn arrow(self) -> char {
        match self {
            Direction::Up    => '↑',
            Direction::Down  => '↓',
            Direction::Left  => '←',
            Direction::Right => '→',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Position {
    pub line: i32,
    pub column: i32,
}

impl Position {
    pub const fn new(line: i32, column: i32) -> Self {
        Position { line, column }
    }

    /// One cell over in direction `d`. No bounds checking.
    pub fn translate(self, d: Direction) -> Position {
        let (dl, dc) = d.offset();
        Position::new(self.line + dl, self.column + dc)
    }

    /// Inside buffer space (no negative line or column).
    pub fn in_buffer_space(self) -> bool {
        self.line >= 0 && self.column >= 0
    }

    /// Stable textual key, `"line-column"`.
    pub fn key(self) -> String {
        format!("{}-{}", self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
