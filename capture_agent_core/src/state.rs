//! The read-only game API the decision pipeline consumes.
//!
//! Any engine can drive the agents by implementing [`GameState`]; the crate's own
//! reference engine lives in [`crate::environment`].

use serde::{Deserialize, Serialize};

use crate::{AgentIndex, Direction, Point, Position, Team, error::AgentError, map::Walls};

/// Snapshot of a single agent as seen by an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Current location. `None` when the observer cannot see this agent.
    pub position: Option<Point>,
    /// Direction of the last move.
    pub direction: Direction,
    /// True while the agent is in enemy territory.
    pub is_pacman: bool,
    /// Pellets picked up and not yet brought home.
    pub num_carrying: usize,
    /// Remaining moves of being scared by an enemy capsule.
    pub scared_timer: u32,
}

impl AgentState {
    /// Whole cell the agent occupies, if visible.
    pub fn cell(&self) -> Option<Position> {
        self.position.map(|point| point.nearest_cell())
    }

    pub fn is_scared(&self) -> bool {
        self.scared_timer > 0
    }
}

/// An immutable game snapshot.
///
/// Every method is a pure query; `successor` returns a new snapshot and leaves
/// `self` untouched.
pub trait GameState: Sized {
    /// Actions `agent` may take in this snapshot.
    fn legal_actions(&self, agent: AgentIndex) -> Vec<Direction>;

    /// Snapshot after `agent` takes `action`. Fails with `IllegalAction` when the
    /// action is not among [`GameState::legal_actions`].
    fn successor(&self, agent: AgentIndex, action: Direction) -> Result<Self, AgentError>;

    /// State of `agent`, or `None` for a seat that is not in the game.
    fn agent_state(&self, agent: AgentIndex) -> Option<&AgentState>;

    /// Food pellets lying in `side`'s territory.
    fn food(&self, side: Team) -> Vec<Position>;

    /// Capsules lying in `side`'s territory.
    fn capsules(&self, side: Team) -> Vec<Position>;

    /// Score from `team`'s point of view; positive favors `team`.
    fn score(&self, team: Team) -> i64;

    /// Seats of every agent playing for `team`'s opponent.
    fn opponents(&self, team: Team) -> Vec<AgentIndex>;

    /// Static wall layout.
    fn walls(&self) -> &Walls;
}
