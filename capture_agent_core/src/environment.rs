use std::sync::Arc;

use crate::{
    AgentIndex, Direction, Position, Team,
    error::AgentError,
    layout::Layout,
    map::{Grid, Walls},
    state::{AgentState, GameState},
};

/// Moves an agent stays scared after an enemy eats a capsule.
pub const SCARED_TIME: u32 = 40;
/// Agents closer than this collide.
pub const COLLISION_TOLERANCE: f64 = 0.7;
/// Enemies farther than this (manhattan, from every teammate) are hidden by `observation`.
pub const SIGHT_RANGE: usize = 5;

/// Engine-side bookkeeping for one seat.
#[derive(Debug, Clone, PartialEq)]
struct AgentSlot {
    state: AgentState,
    start: Position,
    /// Cells of the pellets currently carried, restored if the agent is caught.
    carried: Vec<Position>,
}

impl AgentSlot {
    fn new(start: Position) -> Self {
        Self {
            state: AgentState {
                position: Some(start.into()),
                direction: Direction::Stop,
                is_pacman: false,
                num_carrying: 0,
                scared_timer: 0,
            },
            start,
            carried: Vec::new(),
        }
    }
}

/// Reference capture-the-flag engine.
///
/// Snapshots are cheap to clone (the wall grid is shared) and every move produces
/// a new snapshot through [`GameState::successor`].
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureState {
    walls: Arc<Walls>,
    food: Grid<bool>,
    capsules: Vec<Position>,
    agents: Vec<Option<AgentSlot>>,
    /// Red's score; blue sees the negation.
    score: i64,
}

impl CaptureState {
    /// Creates the opening snapshot of a layout.
    pub fn new(layout: &Layout) -> Self {
        CaptureState {
            walls: Arc::new(layout.walls.clone()),
            food: layout.food.clone(),
            capsules: layout.capsules.clone(),
            agents: layout
                .agent_starts
                .iter()
                .map(|start| start.map(AgentSlot::new))
                .collect(),
            score: 0,
        }
    }

    /// Seats occupied by an agent, in turn order.
    pub fn seats(&self) -> impl Iterator<Item = AgentIndex> + '_ {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| index)
    }

    pub fn start(&self, agent: AgentIndex) -> Option<Position> {
        self.slot(agent).map(|slot| slot.start)
    }

    pub fn has_food(&self, position: Position) -> bool {
        self.food.get(position).copied().unwrap_or(false)
    }

    pub fn has_capsule(&self, position: Position) -> bool {
        self.capsules.contains(&position)
    }

    /// Returns a copy with `agent` scared for `ticks` moves.
    pub fn with_scared_timer(mut self, agent: AgentIndex, ticks: u32) -> Self {
        if let Some(slot) = self.slot_mut(agent) {
            slot.state.scared_timer = ticks;
        }
        self
    }

    /// What `observer` is allowed to see: enemies out of sight range of every
    /// teammate lose their position.
    pub fn observation(&self, observer: AgentIndex) -> Self {
        let team = Team::of(observer);
        let lookouts: Vec<Position> = self
            .seats()
            .filter(|seat| Team::of(*seat) == team)
            .filter_map(|seat| self.slot(seat).and_then(|slot| slot.state.cell()))
            .collect();

        let mut observed = self.clone();
        for enemy in self.opponents(team) {
            let Some(slot) = observed.slot_mut(enemy) else {
                continue;
            };
            let visible = slot.state.cell().is_some_and(|cell| {
                lookouts
                    .iter()
                    .any(|lookout| lookout.manhattan(&cell) <= SIGHT_RANGE)
            });
            if !visible {
                slot.state.position = None;
            }
        }
        observed
    }

    fn slot(&self, agent: AgentIndex) -> Option<&AgentSlot> {
        self.agents.get(agent).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, agent: AgentIndex) -> Option<&mut AgentSlot> {
        self.agents.get_mut(agent).and_then(Option::as_mut)
    }

    /// Moves the agent, updates its mode and banks carried food on return home.
    fn apply_move(&mut self, agent: AgentIndex, action: Direction) {
        let team = Team::of(agent);
        let width = self.walls.width();
        let Some(slot) = self.slot_mut(agent) else {
            return;
        };
        let Some(position) = slot.state.position else {
            return;
        };

        let speed = if slot.state.is_scared() { 0.5 } else { 1.0 };
        let mut next = position.advance(action, speed);
        if action != Direction::Stop {
            slot.state.direction = action;
        }
        if slot.state.is_scared() {
            slot.state.scared_timer -= 1;
            if slot.state.scared_timer == 0 {
                next = next.cell_ahead(action).into();
            }
        }
        slot.state.position = Some(next);

        let cell = next.nearest_cell();
        slot.state.is_pacman = !team.owns_column(cell.x, width);
        if !slot.state.is_pacman && slot.state.num_carrying > 0 {
            let banked = slot.state.num_carrying as i64;
            slot.state.num_carrying = 0;
            slot.carried.clear();
            self.score += match team {
                Team::Red => banked,
                Team::Blue => -banked,
            };
        }
    }

    /// A pacman on a whole cell eats enemy food and capsules there.
    fn consume(&mut self, agent: AgentIndex) {
        let team = Team::of(agent);
        let width = self.walls.width();
        let Some(slot) = self.slot(agent) else {
            return;
        };
        let Some(point) = slot.state.position else {
            return;
        };
        if !slot.state.is_pacman || !point.is_aligned() {
            return;
        }
        let cell = point.nearest_cell();
        if team.owns_column(cell.x, width) {
            return;
        }

        if self.has_food(cell) {
            self.food[cell] = false;
            if let Some(slot) = self.slot_mut(agent) {
                slot.state.num_carrying += 1;
                slot.carried.push(cell);
            }
        }

        if let Some(found) = self.capsules.iter().position(|capsule| *capsule == cell) {
            self.capsules.swap_remove(found);
            for enemy in self.opponents(team) {
                if let Some(slot) = self.slot_mut(enemy) {
                    slot.state.scared_timer = SCARED_TIME;
                }
            }
        }
    }

    /// Resolves contact between the mover and every visible enemy.
    fn resolve_collisions(&mut self, agent: AgentIndex) {
        let team = Team::of(agent);
        for enemy in self.opponents(team) {
            let (Some(mover), Some(other)) = (self.slot(agent), self.slot(enemy)) else {
                continue;
            };
            let (Some(a), Some(b)) = (mover.state.position, other.state.position) else {
                continue;
            };
            if a.manhattan(&b) > COLLISION_TOLERANCE {
                continue;
            }

            let (pacman, ghost) = match (mover.state.is_pacman, other.state.is_pacman) {
                (true, false) => (agent, enemy),
                (false, true) => (enemy, agent),
                _ => continue,
            };
            let ghost_scared = self.slot(ghost).is_some_and(|slot| slot.state.is_scared());
            if ghost_scared {
                self.send_home(ghost);
            } else {
                self.send_home(pacman);
                if pacman == agent {
                    return;
                }
            }
        }
    }

    /// Returns a caught agent to its start and drops its pellets back where they were.
    fn send_home(&mut self, agent: AgentIndex) {
        let Some(slot) = self.slot_mut(agent) else {
            return;
        };
        let dropped = std::mem::take(&mut slot.carried);
        slot.state = AgentSlot::new(slot.start).state;
        for cell in dropped {
            self.food[cell] = true;
        }
    }
}

impl GameState for CaptureState {
    fn legal_actions(&self, agent: AgentIndex) -> Vec<Direction> {
        let Some(state) = self.slot(agent).map(|slot| &slot.state) else {
            return Vec::new();
        };
        let Some(point) = state.position else {
            return Vec::new();
        };

        // Mid-step agents must finish the step they started.
        if !point.is_aligned() {
            return vec![state.direction];
        }

        let cell = point.nearest_cell();
        let mut actions: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|direction| {
                cell.step(*direction)
                    .is_some_and(|next| !self.walls.is_wall(next))
            })
            .collect();
        actions.push(Direction::Stop);
        actions
    }

    fn successor(&self, agent: AgentIndex, action: Direction) -> Result<Self, AgentError> {
        if !self.legal_actions(agent).contains(&action) {
            return Err(AgentError::IllegalAction { agent, action });
        }
        let mut next = self.clone();
        next.apply_move(agent, action);
        next.consume(agent);
        next.resolve_collisions(agent);
        Ok(next)
    }

    fn agent_state(&self, agent: AgentIndex) -> Option<&AgentState> {
        self.slot(agent).map(|slot| &slot.state)
    }

    fn food(&self, side: Team) -> Vec<Position> {
        let width = self.walls.width();
        self.food
            .enumerate()
            .filter(|(position, food)| **food && side.owns_column(position.x, width))
            .map(|(position, _)| position)
            .collect()
    }

    fn capsules(&self, side: Team) -> Vec<Position> {
        let width = self.walls.width();
        self.capsules
            .iter()
            .copied()
            .filter(|capsule| side.owns_column(capsule.x, width))
            .collect()
    }

    fn score(&self, team: Team) -> i64 {
        match team {
            Team::Red => self.score,
            Team::Blue => -self.score,
        }
    }

    fn opponents(&self, team: Team) -> Vec<AgentIndex> {
        self.seats()
            .filter(|seat| Team::of(*seat) == team.opponent())
            .collect()
    }

    fn walls(&self) -> &Walls {
        &self.walls
    }
}
