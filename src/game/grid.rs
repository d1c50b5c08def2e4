use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn reverses(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

impl Position {
    // Screen coordinates: y grows downward, so Up decrements y.
    pub fn step(self, direction: Direction) -> Position {
        match direction {
            Direction::Up => Position {
                x: self.x,
                y: self.y - 1,
            },
            Direction::Down => Position {
                x: self.x,
                y: self.y + 1,
            },
            Direction::Left => Position {
                x: self.x - 1,
                y: self.y,
            },
            Direction::Right => Position {
                x: self.x + 1,
                y: self.y,
            },
        }
    }

    pub fn chebyshev_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub fn contains(self, position: Position) -> bool {
        position.x >= 0 && position.x < self.width && position.y >= 0 && position.y < self.height
    }

    pub fn cells(self) -> impl Iterator<Item = Position> {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position { x, y }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_applies_screen_coordinates() {
        let origin = Position { x: 3, y: 3 };
        assert_eq!(origin.step(Direction::Up), Position { x: 3, y: 2 });
        assert_eq!(origin.step(Direction::Down), Position { x: 3, y: 4 });
        assert_eq!(origin.step(Direction::Left), Position { x: 2, y: 3 });
        assert_eq!(origin.step(Direction::Right), Position { x: 4, y: 3 });
    }

    #[test]
    fn reversal_pairs_are_symmetric() {
        assert!(Direction::Up.reverses(Direction::Down));
        assert!(Direction::Down.reverses(Direction::Up));
        assert!(Direction::Left.reverses(Direction::Right));
        assert!(Direction::Right.reverses(Direction::Left));
        assert!(!Direction::Up.reverses(Direction::Left));
        assert!(!Direction::Right.reverses(Direction::Right));
    }

    #[test]
    fn grid_bounds_are_half_open() {
        let grid = Grid {
            width: 5,
            height: 5,
        };
        assert!(grid.contains(Position { x: 0, y: 0 }));
        assert!(grid.contains(Position { x: 4, y: 4 }));
        assert!(!grid.contains(Position { x: 5, y: 4 }));
        assert!(!grid.contains(Position { x: 4, y: 5 }));
        assert!(!grid.contains(Position { x: -1, y: 0 }));
    }

    #[test]
    fn cells_cover_the_whole_grid() {
        let grid = Grid {
            width: 4,
            height: 3,
        };
        let cells: Vec<Position> = grid.cells().collect();
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|cell| grid.contains(*cell)));
    }
}
