use crate::{AgentIndex, Direction, error::AgentError, state::GameState};

/// Snapshot after `agent` takes `action`, always with the agent on a whole cell.
///
/// A single move can leave a slowed agent halfway between cells; the same action is
/// then applied once more so feature extraction only ever sees integer positions.
pub fn project<S: GameState>(
    state: &S,
    agent: AgentIndex,
    action: Direction,
) -> Result<S, AgentError> {
    let successor = state.successor(agent, action)?;
    let aligned = successor
        .agent_state(agent)
        .and_then(|agent_state| agent_state.position)
        .is_none_or(|point| point.is_aligned());
    if aligned {
        Ok(successor)
    } else {
        successor.successor(agent, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{environment::CaptureState, layout::Layout};

    fn state(text: &str) -> CaptureState {
        CaptureState::new(&text.parse::<Layout>().unwrap())
    }

    #[test]
    fn half_steps_are_completed() {
        let start = state("%%%%%%%\n%1   2%\n%%%%%%%").with_scared_timer(1, 5);
        for action in start.legal_actions(1) {
            let projected = project(&start, 1, action).unwrap();
            let point = projected.agent_state(1).unwrap().position.unwrap();
            assert!(point.is_aligned(), "{action:?} left agent at {point:?}");
        }
        let west = project(&start, 1, Direction::West).unwrap();
        assert_eq!(
            west.agent_state(1).unwrap().cell(),
            Some(crate::Position::new(4, 1))
        );
    }

    #[test]
    fn full_steps_are_returned_as_is() {
        let start = state("%%%%%%%\n%1   2%\n%%%%%%%");
        let projected = project(&start, 0, Direction::East).unwrap();
        assert_eq!(projected, start.successor(0, Direction::East).unwrap());
    }

    #[test]
    fn illegal_actions_are_reported() {
        let start = state("%%%%%%%\n%1   2%\n%%%%%%%");
        assert_eq!(
            project(&start, 0, Direction::West),
            Err(AgentError::IllegalAction {
                agent: 0,
                action: Direction::West
            })
        );
    }
}
