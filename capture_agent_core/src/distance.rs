use std::collections::VecDeque;

use tracing::info;

use crate::{
    Position,
    error::AgentError,
    map::{Grid, Walls},
};

/// Marks pairs with no connecting path.
const UNREACHABLE: u32 = u32::MAX;

/// All-pairs shortest path lengths over the walkable cells of a maze.
///
/// Built once with one breadth-first search per walkable cell (4-connected, unit
/// edges) and never mutated afterwards, so a single table can be shared behind an
/// `Arc` by every agent of a team.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    /// Flat cell index -> dense id of the walkable cell, `None` for walls.
    ids: Grid<Option<usize>>,
    /// Row-major `open * open` matrix of hop counts.
    hops: Vec<u32>,
    open: usize,
}

impl DistanceTable {
    pub fn new(walls: &Walls) -> Self {
        let mut next_id = 0;
        let ids = Grid::from_generator(walls.width(), walls.height(), |x, y| {
            if walls.is_wall(Position { x, y }) {
                None
            } else {
                next_id += 1;
                Some(next_id - 1)
            }
        });
        let open = next_id;
        let mut hops = vec![UNREACHABLE; open * open];

        let mut frontier = VecDeque::new();
        for source in walls.open_cells() {
            let Some(source_id) = ids[source] else {
                continue;
            };
            let row = &mut hops[source_id * open..(source_id + 1) * open];
            row[source_id] = 0;
            frontier.clear();
            frontier.push_back(source);

            while let Some(current) = frontier.pop_front() {
                let Some(current_id) = ids[current] else {
                    continue;
                };
                let next_hops = row[current_id] + 1;
                for neighbor in walls.neighbors(current) {
                    if let Some(neighbor_id) = ids[neighbor] {
                        if row[neighbor_id] == UNREACHABLE {
                            row[neighbor_id] = next_hops;
                            frontier.push_back(neighbor);
                        }
                    }
                }
            }
        }

        info!(
            width = walls.width(),
            height = walls.height(),
            open_cells = open,
            "built distance table"
        );

        Self { ids, hops, open }
    }

    /// Shortest path length between two walkable cells.
    pub fn distance(&self, a: Position, b: Position) -> Result<u32, AgentError> {
        let from = self.id(a)?;
        let to = self.id(b)?;
        match self.hops[from * self.open + to] {
            UNREACHABLE => Err(AgentError::Unreachable { from: a, to: b }),
            hops => Ok(hops),
        }
    }

    /// Smallest distance from `from` to any of `targets`, or `None` when there are no targets.
    pub fn nearest<I>(&self, from: Position, targets: I) -> Result<Option<u32>, AgentError>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut best: Option<u32> = None;
        for target in targets {
            let hops = self.distance(from, target)?;
            best = Some(best.map_or(hops, |current| current.min(hops)));
        }
        Ok(best)
    }

    /// Number of walkable cells covered by the table.
    pub fn open_cells(&self) -> usize {
        self.open
    }

    fn id(&self, position: Position) -> Result<usize, AgentError> {
        self.ids
            .get(position)
            .copied()
            .flatten()
            .ok_or(AgentError::InvalidCell(position))
    }
}
