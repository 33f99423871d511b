use std::{
    collections::VecDeque,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// A generic 2D grid over maze cells.
///
/// Stores elements of type `T` in a flat vector using row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Static wall layout of a maze: `true` marks a wall.
pub type Walls = Grid<bool>;

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a new grid filled by a generator taking `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells, walls included.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Converts a position to its flat row-major index, or `None` when out of bounds.
    #[inline]
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if self.is_valid(position) {
            Some(position.y * self.width + position.x)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_valid(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    pub fn get(&self, position: Position) -> Option<&T> {
        self.index_of(position).and_then(|index| self.cells.get(index))
    }

    /// Sets the value of a cell, failing with `GridError::OutOfBounds` off the grid.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self.index_of(position).ok_or(GridError::OutOfBounds {
            x: position.x,
            y: position.y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            (
                Position {
                    x: index % width,
                    y: index / width,
                },
                cell,
            )
        })
    }

    /// In-bounds neighbors one step away in each cardinal direction.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::CARDINALS
            .into_iter()
            .filter_map(move |direction| position.step(direction))
            .filter(|next| self.is_valid(*next))
    }
}

impl Walls {
    /// Returns true for walls and for anything outside the maze.
    pub fn is_wall(&self, position: Position) -> bool {
        self.get(position).copied().unwrap_or(true)
    }

    /// Walkable cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.enumerate()
            .filter(|(_, wall)| !**wall)
            .map(|(position, _)| position)
    }

    /// First walkable cell, in row-major order, with no path from `start`.
    pub fn first_unreachable(&self, start: Position) -> Option<Position> {
        let mut seen: Grid<bool> = Grid::new(self.width, self.height);
        let mut frontier = VecDeque::new();
        if !self.is_wall(start) {
            seen[start] = true;
            frontier.push_back(start);
        }
        while let Some(current) = frontier.pop_front() {
            for next in self.neighbors(current) {
                if !self.is_wall(next) && !seen[next] {
                    seen[next] = true;
                    frontier.push_back(next);
                }
            }
        }
        self.open_cells().find(|cell| !seen[*cell])
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        match self.index_of(index) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.x, index.y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: Position) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.index_of(index) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.x, index.y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_index_round_trips_through_position() {
        let grid: Grid<u8> = Grid::new(4, 3);
        let position = Position::new(3, 2);
        let index = grid.index_of(position).unwrap();
        assert_eq!(index, 11);
        assert_eq!(grid.enumerate().nth(index).map(|(at, _)| at), Some(position));
        assert_eq!(grid.index_of(Position::new(4, 0)), None);
    }

    #[test]
    fn set_out_of_bounds_is_an_error() {
        let mut grid: Grid<bool> = Grid::new(2, 2);
        assert_eq!(
            grid.set(Position::new(2, 1), true),
            Err(GridError::OutOfBounds {
                x: 2,
                y: 1,
                width: 2,
                height: 2
            })
        );
        grid.set(Position::new(1, 1), true).unwrap();
        assert!(grid[Position::new(1, 1)]);
    }

    #[test]
    fn corner_cells_have_two_neighbors() {
        let grid: Grid<bool> = Grid::new(3, 3);
        assert_eq!(grid.neighbors(Position::new(0, 0)).count(), 2);
        assert_eq!(grid.neighbors(Position::new(1, 1)).count(), 4);
    }

    #[test]
    fn outside_the_maze_counts_as_wall() {
        let walls = Walls::from_generator(3, 1, |x, _| x == 0);
        assert!(walls.is_wall(Position::new(0, 0)));
        assert!(!walls.is_wall(Position::new(1, 0)));
        assert!(walls.is_wall(Position::new(7, 0)));
        assert_eq!(walls.open_cells().count(), 2);
    }

    #[test]
    fn sealed_pockets_are_found() {
        let walls = Walls::from_generator(5, 1, |x, _| x == 2);
        assert_eq!(
            walls.first_unreachable(Position::new(0, 0)),
            Some(Position::new(3, 0))
        );
        assert_eq!(
            walls.first_unreachable(Position::new(4, 0)),
            Some(Position::new(0, 0))
        );
        let open = Walls::from_generator(3, 2, |_, _| false);
        assert_eq!(open.first_unreachable(Position::new(2, 1)), None);
    }
}
