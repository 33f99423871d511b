use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::{
    AgentIndex, Direction, Team,
    config::TeamConfig,
    distance::DistanceTable,
    error::AgentError,
    evaluator::{Evaluator, WeightTable},
    features::{FeatureVector, Profile, Viewpoint},
    selector::select_action,
    state::GameState,
};

/// Trait defining the behavior of an agent.
/// Agents decide which action to take given their observation of the game.
pub trait CaptureAgent<S: GameState> {
    /// Seat this agent plays.
    fn index(&self) -> AgentIndex;

    /// Chooses one legal action for the current turn.
    /// `&mut self` only advances the agent's random source; no game state is kept.
    fn choose_action(&mut self, state: &S) -> Result<Direction, AgentError>;
}

/// One-ply greedy agent: scores every legal move with a linear model over the
/// features of its profile and plays the best one.
#[derive(Debug, Clone)]
pub struct ReflexAgent {
    index: AgentIndex,
    team: Team,
    profile: Profile,
    weights: WeightTable,
    distances: Arc<DistanceTable>,
    rng: StdRng,
}

impl ReflexAgent {
    pub fn new(
        index: AgentIndex,
        team: Team,
        profile: Profile,
        weights: WeightTable,
        distances: Arc<DistanceTable>,
        rng: StdRng,
    ) -> Self {
        Self {
            index,
            team,
            profile,
            weights,
            distances,
            rng,
        }
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    fn evaluator(&self) -> Evaluator<'_> {
        evaluator(
            self.index,
            self.team,
            self.profile,
            &self.weights,
            &self.distances,
        )
    }

    /// Features of taking `action` from `state`, as this agent sees them.
    pub fn features<S: GameState>(
        &self,
        state: &S,
        action: Direction,
    ) -> Result<FeatureVector, AgentError> {
        self.evaluator().features(state, action)
    }

    /// Linear score of taking `action` from `state`.
    pub fn evaluate<S: GameState>(&self, state: &S, action: Direction) -> Result<f64, AgentError> {
        self.evaluator().evaluate(state, action)
    }
}

impl<S: GameState> CaptureAgent<S> for ReflexAgent {
    fn index(&self) -> AgentIndex {
        self.index
    }

    fn choose_action(&mut self, state: &S) -> Result<Direction, AgentError> {
        // Borrows fields one by one so `rng` stays free for the selector.
        let evaluator = evaluator(
            self.index,
            self.team,
            self.profile,
            &self.weights,
            &self.distances,
        );
        let action = select_action(state, self.index, &mut self.rng, |state, action| {
            evaluator.evaluate(state, action)
        })?;
        debug!(agent = self.index, profile = ?self.profile, ?action, "chose action");
        Ok(action)
    }
}

fn evaluator<'a>(
    agent: AgentIndex,
    team: Team,
    profile: Profile,
    weights: &'a WeightTable,
    distances: &'a DistanceTable,
) -> Evaluator<'a> {
    Evaluator {
        profile,
        weights,
        viewpoint: Viewpoint {
            agent,
            team,
            distances,
        },
    }
}

/// Builds the two agents of a team: `first` attacks, `second` defends.
///
/// Both share the same distance table. Each agent's random source
/// is seeded from `config.seed` and its seat, so replays with the same config are
/// identical.
pub fn create_team(
    first: AgentIndex,
    second: AgentIndex,
    is_red: bool,
    distances: Arc<DistanceTable>,
    config: &TeamConfig,
) -> [ReflexAgent; 2] {
    let team = Team::from_is_red(is_red);
    let build = |index: AgentIndex, profile: Profile| {
        ReflexAgent::new(
            index,
            team,
            profile,
            config.weights(profile).clone(),
            Arc::clone(&distances),
            StdRng::seed_from_u64(config.seed.wrapping_add(index as u64)),
        )
    };
    [
        build(first, Profile::Offensive),
        build(second, Profile::Defensive),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{environment::CaptureState, layout::Layout};

    fn game(text: &str) -> (CaptureState, Arc<DistanceTable>) {
        let state = CaptureState::new(&text.parse::<Layout>().unwrap());
        let distances = Arc::new(DistanceTable::new(state.walls()));
        (state, distances)
    }

    #[test]
    fn team_roles_follow_seat_order() {
        let (_, distances) = game("%%%%%%\n%1  2%\n%%%%%%");
        let [attacker, defender] = create_team(0, 2, true, distances, &TeamConfig::default());
        assert_eq!(CaptureAgent::<CaptureState>::index(&attacker), 0);
        assert_eq!(attacker.profile(), Profile::Offensive);
        assert_eq!(CaptureAgent::<CaptureState>::index(&defender), 2);
        assert_eq!(defender.profile(), Profile::Defensive);
        assert_eq!(defender.team(), Team::Red);
        assert_eq!(
            defender.weights(),
            &WeightTable::for_profile(Profile::Defensive)
        );
    }

    #[test]
    fn blue_team_uses_blue_perspective() {
        let (_, distances) = game("%%%%%%\n%1  2%\n%%%%%%");
        let [attacker, _] = create_team(1, 3, false, distances, &TeamConfig::default());
        assert_eq!(attacker.team(), Team::Blue);
    }

    #[test]
    fn chosen_actions_are_legal() {
        let (state, distances) = game(crate::layout::DEFAULT_LAYOUT);
        let [mut red_attack, mut red_defend] =
            create_team(0, 2, true, Arc::clone(&distances), &TeamConfig::default());
        let [mut blue_attack, mut blue_defend] =
            create_team(1, 3, false, distances, &TeamConfig::default());
        let agents: [&mut ReflexAgent; 4] = [
            &mut red_attack,
            &mut blue_attack,
            &mut red_defend,
            &mut blue_defend,
        ];
        for agent in agents {
            let seat = CaptureAgent::<CaptureState>::index(agent);
            let observed = state.observation(seat);
            let action = agent.choose_action(&observed).unwrap();
            assert!(observed.legal_actions(seat).contains(&action));
        }
    }

    #[test]
    fn same_seed_replays_the_same_choice() {
        let (state, distances) = game("%%%%%%%%%%\n%        %\n%   1    %\n%        %\n%%%%%%%%%%");
        let config = TeamConfig {
            seed: 11,
            ..TeamConfig::default()
        };
        let choose = || {
            let [_, mut defender] = create_team(2, 0, true, Arc::clone(&distances), &config);
            // The defender's seat is 0 here so it drives the only agent on the board.
            CaptureAgent::<CaptureState>::choose_action(&mut defender, &state).unwrap()
        };
        let first = choose();
        for _ in 0..10 {
            assert_eq!(choose(), first);
        }
    }
}
