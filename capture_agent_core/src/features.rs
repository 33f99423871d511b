//! Named numeric features of a hypothetical successor state.
//!
//! A feature is only present when it applies: with no food left there is no
//! `distanceToFood`, with no visible invader there is no `invaderDistance`. Absent
//! keys contribute nothing to a linear score, so omission and zero are equivalent
//! for the evaluator but remain distinguishable for inspection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AgentIndex, Direction, Position, Team,
    distance::DistanceTable,
    error::AgentError,
    state::{AgentState, GameState},
    successor::project,
};

pub const SUCCESSOR_SCORE: &str = "successorScore";
pub const DISTANCE_TO_FOOD: &str = "distanceToFood";
pub const DISTANCE_TO_CAPSULE: &str = "distanceToCapsule";
pub const ATTACKER_DISTANCE: &str = "attackerDistance";
pub const GHOST_DISTANCE: &str = "ghostDistance";
pub const ON_DEFENSE: &str = "onDefense";
pub const NUM_INVADERS: &str = "numInvaders";
pub const INVADER_DISTANCE: &str = "invaderDistance";
pub const ENEMY_DISTANCE: &str = "enemyDistance";
pub const STOP: &str = "stop";
pub const REVERSE: &str = "reverse";

/// Feature name -> value for one candidate action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureVector(BTreeMap<&'static str, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        self.0.insert(name, value);
    }

    /// Sets `name` only when a value exists.
    pub fn set_some(&mut self, name: &'static str, value: Option<f64>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(name, value)| (*name, *value))
    }
}

impl FromIterator<(&'static str, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (&'static str, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Who is asking: the seat, its team and the maze distances it measures with.
#[derive(Debug, Clone, Copy)]
pub struct Viewpoint<'a> {
    pub agent: AgentIndex,
    pub team: Team,
    pub distances: &'a DistanceTable,
}

/// Which feature set an agent plays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// Raids the enemy side for food and capsules.
    Offensive,
    /// Holds the home side and chases invaders.
    Defensive,
}

impl Profile {
    /// Features of the state reached by taking `action` from `state`.
    pub fn extract<S: GameState>(
        &self,
        viewpoint: &Viewpoint<'_>,
        state: &S,
        action: Direction,
    ) -> Result<FeatureVector, AgentError> {
        let successor = project(state, viewpoint.agent, action)?;
        match self {
            Profile::Offensive => offensive_features(viewpoint, &successor),
            Profile::Defensive => defensive_features(viewpoint, state, &successor, action),
        }
    }
}

fn offensive_features<S: GameState>(
    viewpoint: &Viewpoint<'_>,
    successor: &S,
) -> Result<FeatureVector, AgentError> {
    let here = own_cell(viewpoint, successor)?;
    let enemy_side = viewpoint.team.opponent();
    let attackers = visible_enemies(viewpoint, successor, |enemy| enemy.is_pacman);
    let ghosts = visible_enemies(viewpoint, successor, |enemy| {
        !enemy.is_pacman && !enemy.is_scared()
    });

    let mut features = FeatureVector::new();
    features.set(SUCCESSOR_SCORE, successor.score(viewpoint.team) as f64);
    features.set_some(
        DISTANCE_TO_FOOD,
        nearest(viewpoint, here, successor.food(enemy_side))?,
    );
    features.set_some(
        DISTANCE_TO_CAPSULE,
        nearest(viewpoint, here, successor.capsules(enemy_side))?,
    );
    features.set_some(ATTACKER_DISTANCE, nearest(viewpoint, here, attackers)?);
    features.set_some(GHOST_DISTANCE, nearest(viewpoint, here, ghosts)?);
    Ok(features)
}

fn defensive_features<S: GameState>(
    viewpoint: &Viewpoint<'_>,
    state: &S,
    successor: &S,
    action: Direction,
) -> Result<FeatureVector, AgentError> {
    let here = own_cell(viewpoint, successor)?;
    let is_pacman = successor
        .agent_state(viewpoint.agent)
        .is_some_and(|agent| agent.is_pacman);
    let invaders = visible_enemies(viewpoint, successor, |enemy| enemy.is_pacman);
    let enemies = visible_enemies(viewpoint, successor, |_| true);

    let mut features = FeatureVector::new();
    features.set(ON_DEFENSE, if is_pacman { 0.0 } else { 1.0 });
    features.set(NUM_INVADERS, invaders.len() as f64);
    features.set_some(INVADER_DISTANCE, nearest(viewpoint, here, invaders)?);
    features.set_some(ENEMY_DISTANCE, nearest(viewpoint, here, enemies)?);

    if action == Direction::Stop {
        features.set(STOP, 1.0);
    } else {
        let facing = state
            .agent_state(viewpoint.agent)
            .map(|agent| agent.direction)
            .unwrap_or(Direction::Stop);
        if facing != Direction::Stop && action == facing.reverse() {
            features.set(REVERSE, 1.0);
        }
    }
    Ok(features)
}

fn own_cell<S: GameState>(viewpoint: &Viewpoint<'_>, state: &S) -> Result<Position, AgentError> {
    state
        .agent_state(viewpoint.agent)
        .and_then(|agent| agent.cell())
        .ok_or(AgentError::UnknownPosition {
            agent: viewpoint.agent,
        })
}

/// Cells of enemies whose position is exposed and that pass `keep`.
/// Hidden enemies are left out entirely.
fn visible_enemies<S: GameState>(
    viewpoint: &Viewpoint<'_>,
    state: &S,
    keep: impl Fn(&AgentState) -> bool,
) -> Vec<Position> {
    state
        .opponents(viewpoint.team)
        .into_iter()
        .filter_map(|enemy| state.agent_state(enemy))
        .filter(|enemy| keep(enemy))
        .filter_map(|enemy| enemy.cell())
        .collect()
}

fn nearest(
    viewpoint: &Viewpoint<'_>,
    from: Position,
    targets: Vec<Position>,
) -> Result<Option<f64>, AgentError> {
    Ok(viewpoint
        .distances
        .nearest(from, targets)?
        .map(f64::from))
}
