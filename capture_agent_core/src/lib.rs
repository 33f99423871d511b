use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod distance;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod game;
pub mod layout;
pub mod map;
pub mod selector;
pub mod state;
pub mod successor;

/// Seat number of an agent in a game. Even seats play red, odd seats play blue.
pub type AgentIndex = usize;

/// Positions closer than this to a whole cell count as aligned.
const ALIGNMENT_TOLERANCE: f64 = 1e-3;

/// Represents a 2D cell coordinate in the maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The neighboring cell one step in `direction`, or `None` when it would leave the
    /// non-negative quadrant.
    pub fn step(&self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

/// A possibly fractional agent location. Agents moving at half speed sit between cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true when the point lies on a whole cell.
    pub fn is_aligned(&self) -> bool {
        (self.x - self.x.round()).abs() < ALIGNMENT_TOLERANCE
            && (self.y - self.y.round()).abs() < ALIGNMENT_TOLERANCE
    }

    /// Rounds to the closest cell. Negative coordinates clamp to zero.
    pub fn nearest_cell(&self) -> Position {
        Position {
            x: self.x.round().max(0.0) as usize,
            y: self.y.round().max(0.0) as usize,
        }
    }

    /// The cell reached by finishing the current step along `direction`. Aligned
    /// points stay where they are.
    pub fn cell_ahead(&self, direction: Direction) -> Position {
        if self.is_aligned() {
            return self.nearest_cell();
        }
        let (dx, dy) = direction.delta();
        let finish = |value: f64, delta: isize| match delta.signum() {
            1 => value.ceil(),
            -1 => value.floor(),
            _ => value.round(),
        };
        Position {
            x: finish(self.x, dx).max(0.0) as usize,
            y: finish(self.y, dy).max(0.0) as usize,
        }
    }

    /// Moves `distance` cells along `direction`.
    pub fn advance(&self, direction: Direction, distance: f64) -> Point {
        let (dx, dy) = direction.delta();
        Point {
            x: self.x + dx as f64 * distance,
            y: self.y + dy as f64 * distance,
        }
    }

    pub fn manhattan(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl From<Position> for Point {
    fn from(value: Position) -> Self {
        Point {
            x: value.x as f64,
            y: value.y as f64,
        }
    }
}

/// Moves an agent can choose. `Stop` keeps the agent in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Stop,
}

impl Direction {
    /// The four moving directions, in the order legal actions are reported.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Column/row offset of one step. Rows grow downwards.
    pub const fn delta(&self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Stop => (0, 0),
        }
    }

    pub const fn reverse(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Stop => Direction::Stop,
        }
    }
}

/// The two sides of a capture game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// Team that owns a seat.
    pub const fn of(index: AgentIndex) -> Team {
        if index % 2 == 0 { Team::Red } else { Team::Blue }
    }

    pub const fn from_is_red(is_red: bool) -> Team {
        if is_red { Team::Red } else { Team::Blue }
    }

    pub const fn opponent(&self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Whether column `x` lies in this team's home territory on a maze `width` cells wide.
    /// Red owns the left half.
    pub const fn owns_column(&self, x: usize, width: usize) -> bool {
        match self {
            Team::Red => x < width / 2,
            Team::Blue => x >= width / 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_step_points_are_not_aligned() {
        let start = Point::from(Position::new(3, 2));
        let half = start.advance(Direction::East, 0.5);
        assert!(start.is_aligned());
        assert!(!half.is_aligned());
        assert!(half.advance(Direction::East, 0.5).is_aligned());
        assert_eq!(
            half.advance(Direction::East, 0.5).nearest_cell(),
            Position::new(4, 2)
        );
    }

    #[test]
    fn half_steps_finish_in_the_direction_of_travel() {
        let west = Point::new(4.5, 1.0);
        assert_eq!(west.cell_ahead(Direction::West), Position::new(4, 1));
        assert_eq!(west.cell_ahead(Direction::East), Position::new(5, 1));
        let north = Point::new(2.0, 2.5);
        assert_eq!(north.cell_ahead(Direction::North), Position::new(2, 2));
        assert_eq!(north.cell_ahead(Direction::South), Position::new(2, 3));
        assert_eq!(
            Point::new(3.0, 1.0).cell_ahead(Direction::West),
            Position::new(3, 1)
        );
    }

    #[test]
    fn reverse_is_an_involution() {
        for direction in Direction::CARDINALS {
            assert_ne!(direction.reverse(), direction);
            assert_eq!(direction.reverse().reverse(), direction);
        }
        assert_eq!(Direction::Stop.reverse(), Direction::Stop);
    }

    #[test]
    fn seats_alternate_between_teams() {
        assert_eq!(Team::of(0), Team::Red);
        assert_eq!(Team::of(1), Team::Blue);
        assert_eq!(Team::of(2), Team::Red);
        assert!(Team::Red.owns_column(4, 10));
        assert!(Team::Blue.owns_column(5, 10));
        assert!(!Team::Red.owns_column(5, 10));
    }

    #[test]
    fn step_refuses_to_leave_the_quadrant() {
        assert_eq!(Position::new(0, 0).step(Direction::West), None);
        assert_eq!(
            Position::new(0, 0).step(Direction::South),
            Some(Position::new(0, 1))
        );
    }
}
