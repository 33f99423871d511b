use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    AgentIndex, Direction, Team,
    agent::{CaptureAgent, create_team},
    config::TeamConfig,
    distance::DistanceTable,
    environment::CaptureState,
    layout::Layout,
    state::GameState,
};

/// The game ends once either side has this little food left to defend.
pub const MIN_FOOD: usize = 2;
/// Default number of individual agent moves before the game is called.
pub const DEFAULT_MOVE_LIMIT: usize = 1200;

/// Represents the outcome of processing one agent's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The agent's own choice was applied.
    Played { agent: AgentIndex, action: Direction },
    /// The agent failed or chose an illegal move; `action` was applied instead.
    FellBack { agent: AgentIndex, action: Direction },
    /// The game had already ended.
    Over(Outcome),
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Team),
    Tie,
}

/// Drives a capture game: hands each agent its observation in seat order and
/// applies the returned action to the true state.
pub struct CaptureGame {
    pub state: CaptureState,
    pub agents: Vec<Box<dyn CaptureAgent<CaptureState>>>,
    pub moves_played: usize,
    pub move_limit: usize,
    next_turn: usize,
}

impl CaptureGame {
    pub fn new(state: CaptureState, agents: Vec<Box<dyn CaptureAgent<CaptureState>>>) -> Self {
        CaptureGame {
            state,
            agents,
            moves_played: 0,
            move_limit: DEFAULT_MOVE_LIMIT,
            next_turn: 0,
        }
    }

    /// Sets up a layout with a red team in seats 0/2 and a blue team in seats 1/3.
    /// Seats the layout leaves empty get no agent.
    pub fn from_layout(layout: &Layout, red: &TeamConfig, blue: &TeamConfig) -> Self {
        let state = CaptureState::new(layout);
        let distances = Arc::new(DistanceTable::new(state.walls()));
        let seats: Vec<AgentIndex> = state.seats().collect();

        let mut agents: Vec<Box<dyn CaptureAgent<CaptureState>>> = Vec::new();
        for (is_red, config) in [(true, red), (false, blue)] {
            let (first, second) = if is_red { (0, 2) } else { (1, 3) };
            for agent in create_team(first, second, is_red, Arc::clone(&distances), config) {
                if seats.contains(&CaptureAgent::<CaptureState>::index(&agent)) {
                    agents.push(Box::new(agent));
                }
            }
        }
        agents.sort_by_key(|agent| agent.index());

        Self::new(state, agents)
    }

    pub fn with_move_limit(mut self, move_limit: usize) -> Self {
        self.move_limit = move_limit;
        self
    }

    /// The outcome once the game has ended, `None` while it is still running.
    pub fn outcome(&self) -> Option<Outcome> {
        let red_food = self.state.food(Team::Red).len();
        let blue_food = self.state.food(Team::Blue).len();
        let decided = red_food <= MIN_FOOD || blue_food <= MIN_FOOD;
        if !decided && self.moves_played < self.move_limit && !self.agents.is_empty() {
            return None;
        }
        Some(match self.state.score(Team::Red) {
            score if score > 0 => Outcome::Winner(Team::Red),
            score if score < 0 => Outcome::Winner(Team::Blue),
            _ if blue_food <= MIN_FOOD && red_food > MIN_FOOD => Outcome::Winner(Team::Red),
            _ if red_food <= MIN_FOOD && blue_food > MIN_FOOD => Outcome::Winner(Team::Blue),
            _ => Outcome::Tie,
        })
    }

    /// Processes one move for the agent whose turn it is.
    pub fn step(&mut self) -> MoveResult {
        if let Some(outcome) = self.outcome() {
            return MoveResult::Over(outcome);
        }

        let turn = self.next_turn % self.agents.len();
        self.next_turn = turn + 1;
        let behavior = &mut self.agents[turn];
        let agent = behavior.index();
        let observation = self.state.observation(agent);

        let chosen = behavior
            .choose_action(&observation)
            .and_then(|action| Ok((action, self.state.successor(agent, action)?)));
        let result = match chosen {
            Ok((action, next)) => {
                self.state = next;
                MoveResult::Played { agent, action }
            }
            Err(error) => {
                let action = self.fallback_action(agent);
                warn!(agent, %error, ?action, "agent move rejected, playing fallback");
                match self.state.successor(agent, action) {
                    Ok(next) => self.state = next,
                    Err(error) => warn!(agent, %error, "fallback move failed, agent skipped"),
                }
                MoveResult::FellBack { agent, action }
            }
        };
        self.moves_played += 1;

        if let Some(outcome) = self.outcome() {
            info!(
                ?outcome,
                moves = self.moves_played,
                red_score = self.state.score(Team::Red),
                "game over"
            );
        }
        result
    }

    /// `Stop` when the agent may stand still, otherwise the one move it is forced
    /// to make (finishing a half step).
    fn fallback_action(&self, agent: AgentIndex) -> Direction {
        let legal = self.state.legal_actions(agent);
        if legal.contains(&Direction::Stop) {
            Direction::Stop
        } else {
            legal.first().copied().unwrap_or(Direction::Stop)
        }
    }

    /// Plays until the game ends.
    pub fn run(&mut self) -> Outcome {
        loop {
            if let MoveResult::Over(outcome) = self.step() {
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentIndex, error::AgentError, layout::DEFAULT_LAYOUT};

    /// Always asks for a move into the north wall.
    struct Stubborn(AgentIndex);

    impl CaptureAgent<CaptureState> for Stubborn {
        fn index(&self) -> AgentIndex {
            self.0
        }

        fn choose_action(&mut self, _state: &CaptureState) -> Result<Direction, AgentError> {
            Ok(Direction::North)
        }
    }

    fn stubborn(seat: AgentIndex) -> Vec<Box<dyn CaptureAgent<CaptureState>>> {
        let agent: Box<dyn CaptureAgent<CaptureState>> = Box::new(Stubborn(seat));
        vec![agent]
    }

    #[test]
    fn default_layout_seats_four_agents_in_order() {
        let layout: Layout = DEFAULT_LAYOUT.parse().unwrap();
        let game = CaptureGame::from_layout(&layout, &TeamConfig::default(), &TeamConfig::default());
        let seats: Vec<AgentIndex> = game.agents.iter().map(|agent| agent.index()).collect();
        assert_eq!(seats, vec![0, 1, 2, 3]);
        assert_eq!(game.outcome(), None);
    }

    #[test]
    fn illegal_choices_fall_back_to_stop() {
        let layout: Layout = "%%%%%%%%%%\n%1...2...%\n%%%%%%%%%%".parse().unwrap();
        let state = CaptureState::new(&layout);
        let mut game = CaptureGame::new(state.clone(), stubborn(0));
        assert_eq!(
            game.step(),
            MoveResult::FellBack {
                agent: 0,
                action: Direction::Stop
            }
        );
        assert_eq!(
            game.state.agent_state(0).unwrap().cell(),
            state.agent_state(0).unwrap().cell()
        );
    }

    #[test]
    fn fallback_finishes_a_half_step() {
        let layout: Layout = "%%%%%%%%%%\n%1...2...%\n%%%%%%%%%%".parse().unwrap();
        let halfway = CaptureState::new(&layout)
            .with_scared_timer(0, 10)
            .successor(0, Direction::East)
            .unwrap();
        assert!(!halfway.agent_state(0).unwrap().position.unwrap().is_aligned());

        let mut game = CaptureGame::new(halfway, stubborn(0));
        assert_eq!(
            game.step(),
            MoveResult::FellBack {
                agent: 0,
                action: Direction::East
            }
        );
        let agent = game.state.agent_state(0).unwrap();
        assert!(agent.position.unwrap().is_aligned());
        assert_eq!(agent.cell(), Some(crate::Position::new(2, 1)));
        assert_eq!(agent.scared_timer, 8);

        // Aligned again, so later rejections stand still.
        assert_eq!(
            game.step(),
            MoveResult::FellBack {
                agent: 0,
                action: Direction::Stop
            }
        );
    }

    #[test]
    fn move_limit_ends_the_game_in_a_tie() {
        let layout: Layout = "%%%%%%%%%%\n%1...2...%\n%%%%%%%%%%".parse().unwrap();
        let mut game = CaptureGame::new(CaptureState::new(&layout), stubborn(0))
            .with_move_limit(3);
        assert_eq!(game.run(), Outcome::Tie);
        assert_eq!(game.moves_played, 3);
    }

    #[test]
    fn full_game_terminates() {
        let layout: Layout = DEFAULT_LAYOUT.parse().unwrap();
        let red = TeamConfig {
            seed: 1,
            ..TeamConfig::default()
        };
        let blue = TeamConfig {
            seed: 2,
            ..TeamConfig::default()
        };
        let mut game = CaptureGame::from_layout(&layout, &red, &blue).with_move_limit(400);
        game.run();
        assert!(game.moves_played <= 400);
        assert!(game.outcome().is_some());
    }
}
