use std::str::FromStr;

use crate::{
    AgentIndex, Position,
    map::{Grid, GridError, Walls},
};

/// Highest number of seats a layout can declare (`1` through `4`).
pub const MAX_AGENTS: usize = 4;

/// A small two-versus-two capture maze, point symmetric between the halves.
pub const DEFAULT_LAYOUT: &str = "\
%%%%%%%%%%%%%%%%%%%%
%1 ..%   .  o  %. .%
%3%% % %%%% %% % % %
% .  %  .   %.   % %
% %. . %%  %% . .% %
% %   .%   .  %  . %
% % % %% %%%% % %%4%
%. .%  o  .   %.. 2%
%%%%%%%%%%%%%%%%%%%%
";

/// Errors raised while reading a layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Layout is empty")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown layout glyph '{glyph}' at position ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("Agent {agent} appears more than once")]
    DuplicateAgent { agent: AgentIndex },
    #[error("Layout places no agents")]
    NoAgents,
    #[error("Cell ({x}, {y}) cannot be reached from the agent starts")]
    Disconnected { x: usize, y: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Static content of a capture maze before any move is made.
///
/// Glyphs: `%` wall, `.` food, `o` capsule, `1`-`4` agent start (seat = digit - 1),
/// space for an empty floor cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub walls: Walls,
    pub food: Grid<bool>,
    pub capsules: Vec<Position>,
    /// Start cell per seat; `None` for seats the layout leaves empty.
    pub agent_starts: Vec<Option<Position>>,
}

impl Layout {
    pub fn width(&self) -> usize {
        self.walls.width()
    }

    pub fn height(&self) -> usize {
        self.walls.height()
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<char>> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();
        let width = rows.first().map(Vec::len).ok_or(LayoutError::Empty)?;
        let height = rows.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(LayoutError::Ragged {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        let mut walls = Walls::new(width, height);
        let mut food: Grid<bool> = Grid::new(width, height);
        let mut capsules = Vec::new();
        let mut agent_starts = vec![None; MAX_AGENTS];

        for (y, cells) in rows.iter().enumerate() {
            for (x, glyph) in cells.iter().copied().enumerate() {
                let position = Position { x, y };
                match glyph {
                    '%' => walls.set(position, true)?,
                    '.' => food.set(position, true)?,
                    'o' => capsules.push(position),
                    ' ' => {}
                    '1'..='4' => {
                        let agent = (glyph as u8 - b'1') as usize;
                        if agent_starts[agent].replace(position).is_some() {
                            return Err(LayoutError::DuplicateAgent { agent });
                        }
                    }
                    unknown => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: unknown,
                            x,
                            y,
                        });
                    }
                }
            }
        }

        while agent_starts.last().is_some_and(Option::is_none) {
            agent_starts.pop();
        }
        let start = agent_starts
            .iter()
            .flatten()
            .copied()
            .next()
            .ok_or(LayoutError::NoAgents)?;
        if let Some(cell) = walls.first_unreachable(start) {
            return Err(LayoutError::Disconnected {
                x: cell.x,
                y: cell.y,
            });
        }

        Ok(Layout {
            walls,
            food,
            capsules,
            agent_starts,
        })
    }
}
