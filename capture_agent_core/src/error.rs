use crate::{AgentIndex, Direction, Position};

/// Contract violations surfaced by the decision pipeline. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("Cell ({}, {}) is a wall or outside the maze", .0.x, .0.y)]
    InvalidCell(Position),
    #[error("No path between ({}, {}) and ({}, {})", .from.x, .from.y, .to.x, .to.y)]
    Unreachable { from: Position, to: Position },
    #[error("Action {action:?} is not legal for agent {agent}")]
    IllegalAction { agent: AgentIndex, action: Direction },
    #[error("Agent {agent} has no legal actions")]
    NoLegalAction { agent: AgentIndex },
    #[error("Position of agent {agent} is not observable")]
    UnknownPosition { agent: AgentIndex },
}
