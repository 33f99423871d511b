use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Direction,
    error::AgentError,
    features::{
        ATTACKER_DISTANCE, DISTANCE_TO_CAPSULE, DISTANCE_TO_FOOD, ENEMY_DISTANCE, FeatureVector,
        GHOST_DISTANCE, INVADER_DISTANCE, NUM_INVADERS, ON_DEFENSE, Profile, REVERSE, STOP, SUCCESSOR_SCORE,
        Viewpoint,
    },
    state::GameState,
};

/// Feature name -> weight of a fixed linear model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<String, f64>);

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in weights of a profile.
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Offensive => [
                (SUCCESSOR_SCORE, 100.0),
                (DISTANCE_TO_FOOD, -1.0),
                (DISTANCE_TO_CAPSULE, -0.5),
                (ATTACKER_DISTANCE, 0.0),
                (GHOST_DISTANCE, 0.5),
            ]
            .into_iter()
            .collect(),
            // stop and reverse carry zero weight unless a config overrides them.
            Profile::Defensive => [
                (ON_DEFENSE, 150.0),
                (NUM_INVADERS, -1000.0),
                (INVADER_DISTANCE, -10.0),
                (ENEMY_DISTANCE, -1.0),
                (STOP, 0.0),
                (REVERSE, 0.0),
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, weight: f64) {
        self.0.insert(name.into(), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(name, weight)| (name.as_str(), *weight))
    }

    /// Dot product over the features present. Features without a weight and weights
    /// without a feature both contribute nothing.
    pub fn evaluate(&self, features: &FeatureVector) -> f64 {
        features
            .iter()
            .filter_map(|(name, value)| self.get(name).map(|weight| weight * value))
            .sum()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, weight)| (name.to_owned(), weight))
                .collect(),
        )
    }
}

/// Scores candidate actions for one agent: features of the projected successor
/// weighted by the agent's table.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    pub profile: Profile,
    pub weights: &'a WeightTable,
    pub viewpoint: Viewpoint<'a>,
}

impl Evaluator<'_> {
    pub fn features<S: GameState>(
        &self,
        state: &S,
        action: Direction,
    ) -> Result<FeatureVector, AgentError> {
        self.profile.extract(&self.viewpoint, state, action)
    }

    pub fn evaluate<S: GameState>(&self, state: &S, action: Direction) -> Result<f64, AgentError> {
        Ok(self.weights.evaluate(&self.features(state, action)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_is_the_dot_product_of_present_keys() {
        let weights: WeightTable = [("a", 2.0), ("b", -3.0), ("unused", 99.0)]
            .into_iter()
            .collect();
        let features: FeatureVector = [("a", 4.0), ("b", 1.5)].into_iter().collect();
        assert_eq!(weights.evaluate(&features), 2.0 * 4.0 - 3.0 * 1.5);
    }

    #[test]
    fn features_without_weights_contribute_nothing() {
        let weights: WeightTable = [("a", 2.0)].into_iter().collect();
        let features: FeatureVector = [("a", 1.0), ("orphan", 50.0)].into_iter().collect();
        assert_eq!(weights.evaluate(&features), 2.0);
        assert_eq!(weights.evaluate(&FeatureVector::new()), 0.0);
    }

    #[test]
    fn defensive_defaults_keep_stop_and_reverse_inert() {
        let weights = WeightTable::for_profile(Profile::Defensive);
        assert_eq!(weights.get(STOP), Some(0.0));
        assert_eq!(weights.get(REVERSE), Some(0.0));
        assert_eq!(weights.get(ON_DEFENSE), Some(150.0));
        assert_eq!(weights.get(NUM_INVADERS), Some(-1000.0));
    }

    #[test]
    fn offensive_defaults_favor_score_and_food() {
        let weights = WeightTable::for_profile(Profile::Offensive);
        assert_eq!(weights.get(SUCCESSOR_SCORE), Some(100.0));
        assert_eq!(weights.get(DISTANCE_TO_FOOD), Some(-1.0));
        assert_eq!(weights.get(GHOST_DISTANCE), Some(0.5));
    }

    #[test]
    fn evaluator_scores_the_projected_successor() {
        use crate::{Team, distance::DistanceTable, environment::CaptureState, layout::Layout};

        let layout: Layout = "%%%%%%%%%%\n%1   .   %\n%%%%%%%%%%".parse().unwrap();
        let state = CaptureState::new(&layout);
        let distances = DistanceTable::new(state.walls());
        let weights = WeightTable::for_profile(Profile::Offensive);
        let evaluator = Evaluator {
            profile: Profile::Offensive,
            weights: &weights,
            viewpoint: Viewpoint {
                agent: 0,
                team: Team::Red,
                distances: &distances,
            },
        };
        assert_eq!(evaluator.evaluate(&state, Direction::East), Ok(-3.0));
        assert_eq!(evaluator.evaluate(&state, Direction::Stop), Ok(-4.0));
    }
}
