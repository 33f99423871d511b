use rand::{Rng, seq::IndexedRandom};
use tracing::debug;

use crate::{AgentIndex, Direction, error::AgentError, state::GameState};

/// Picks the best legal action for `agent`.
///
/// Every legal action is scored with `score`; one of the top-scoring actions is
/// drawn uniformly from `rng`, so ties never favor a fixed direction.
pub fn select_action<S, R, F>(
    state: &S,
    agent: AgentIndex,
    rng: &mut R,
    mut score: F,
) -> Result<Direction, AgentError>
where
    S: GameState,
    R: Rng + ?Sized,
    F: FnMut(&S, Direction) -> Result<f64, AgentError>,
{
    let actions = state.legal_actions(agent);
    if actions.is_empty() {
        return Err(AgentError::NoLegalAction { agent });
    }

    let mut best_score = f64::NEG_INFINITY;
    let mut best_actions = Vec::with_capacity(actions.len());
    for action in actions {
        let value = score(state, action)?;
        debug!(agent, ?action, value, "scored action");
        if value > best_score {
            best_score = value;
            best_actions.clear();
            best_actions.push(action);
        } else if value == best_score {
            best_actions.push(action);
        }
    }

    let chosen = *best_actions
        .choose(rng)
        .ok_or(AgentError::NoLegalAction { agent })?;
    debug!(agent, ?chosen, best_score, ties = best_actions.len(), "selected action");
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{environment::CaptureState, layout::Layout};

    fn open_state() -> CaptureState {
        // Agent 0 can go any direction from the middle of a 3x3 room.
        let layout: Layout = "%%%%%\n%   %\n% 1 %\n%   %\n%%%%%".parse().unwrap();
        CaptureState::new(&layout)
    }

    #[test]
    fn unique_maximum_is_always_chosen() {
        let state = open_state();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let chosen = select_action(&state, 0, &mut rng, |_, action| {
                Ok(if action == Direction::South { 1.0 } else { 0.0 })
            })
            .unwrap();
            assert_eq!(chosen, Direction::South);
        }
    }

    #[test]
    fn ties_are_broken_uniformly() {
        let state = open_state();
        let legal = state.legal_actions(0);
        assert_eq!(legal.len(), 5);

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 10_000;
        let mut counts = [0usize; 5];
        for _ in 0..draws {
            let chosen = select_action(&state, 0, &mut rng, |_, _| Ok(3.5)).unwrap();
            let slot = legal.iter().position(|action| *action == chosen).unwrap();
            counts[slot] += 1;
        }
        let expected = draws / legal.len();
        for count in counts {
            assert!(
                count.abs_diff(expected) < expected / 10,
                "counts {counts:?} stray from {expected}"
            );
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let state = open_state();
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            select_action(&state, 0, &mut rng, |_, _| Ok(0.0)).unwrap()
        };
        for seed in 0..20 {
            assert_eq!(pick(seed), pick(seed));
        }
    }

    #[test]
    fn no_legal_actions_is_an_error() {
        let state = open_state();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            select_action(&state, 2, &mut rng, |_, _| Ok(0.0)),
            Err(AgentError::NoLegalAction { agent: 2 })
        );
    }

    #[test]
    fn scoring_errors_propagate() {
        let state = open_state();
        let mut rng = StdRng::seed_from_u64(0);
        let result = select_action(&state, 0, &mut rng, |_, action| {
            Err(AgentError::IllegalAction { agent: 0, action })
        });
        assert!(matches!(result, Err(AgentError::IllegalAction { .. })));
    }
}
