//  PLANNER.rs
//    by Lut99
//
//  Created:
//    21 Mar 2025, 10:44:02
//  Last edited:
//    16 Jul 2025, 11:31:18
//  Auto updated?
//    Yes
//
//  Description:
//!   The planner contract and the simulation loop.
//!
//!   A [`Planner`] is anything that can pick a ground action given the current atoms and
//!   values; [`simulate`] drives one round of it against a problem. The bundled
//!   [`RandomPlanner`] picks uniformly among the enabled actions and doubles as the
//!   reference planner in tests.
//

use std::rc::Rc;

use rand::{Rng as _, RngCore, SeedableRng as _};
use rand::rngs::StdRng;

use crate::actions::Action;
use crate::errors::Result;
use crate::expressions::ValueMap;
use crate::formulas::AtomSet;
use crate::problems::Problem;
use crate::rational::Rational;
use crate::states::State;


/***** LIBRARY *****/
/// Picks ground actions during simulation.
pub trait Planner {
    /// Called once before a round starts.
    fn init_round(&mut self) {}

    /// Picks the action to apply in the state described by the given atoms and values, or
    /// [`None`] to end the round.
    ///
    /// # Errors
    /// Implementations evaluating preconditions may fail with the errors of formula
    /// evaluation.
    fn decide_action(&mut self, atoms: &AtomSet, values: &ValueMap) -> Result<Option<Rc<Action>>>;

    /// Called once after a round ends.
    fn end_round(&mut self) {}
}



/// A planner picking uniformly among the enabled actions.
pub struct RandomPlanner<'p> {
    /// The problem planned over.
    problem: &'p Problem<'p>,
    /// The planner's own RNG, separate from the simulation's.
    rng: StdRng,
}
impl<'p> RandomPlanner<'p> {
    /// Constructs a random planner over the given problem.
    #[inline]
    pub fn new(problem: &'p Problem<'p>, seed: u64) -> Self { Self { problem, rng: StdRng::seed_from_u64(seed) } }
}
impl<'p> Planner for RandomPlanner<'p> {
    fn decide_action(&mut self, atoms: &AtomSet, values: &ValueMap) -> Result<Option<Rc<Action>>> {
        let enabled: Vec<Rc<Action>> = self.problem.enabled_actions(atoms, values)?;
        if enabled.is_empty() { Ok(None) } else { Ok(Some(enabled[self.rng.gen_range(0..enabled.len())].clone())) }
    }
}



/// The outcome of one simulated round.
#[derive(Clone, Debug)]
pub struct Episode {
    /// The number of transitions taken.
    pub turns: usize,
    /// Whether the final state is a goal state.
    pub goal_achieved: bool,
    /// The problem's metric, evaluated in the final state.
    pub metric: Rational,
}

/// Runs one round of the given planner against the given problem.
///
/// The round starts from the initial state and ends when the goal is reached, the planner
/// returns no action, or `limit` transitions have been taken.
///
/// # Errors
/// Fails with the errors of state construction, transition, planning, and metric
/// evaluation.
pub fn simulate(problem: &Problem, planner: &mut dyn Planner, limit: usize, rng: &mut dyn RngCore) -> Result<Episode> {
    planner.init_round();
    let mut state: State = State::initial(problem, rng)?;
    let mut turns: usize = 0;
    while turns < limit && !state.goal() {
        let action: Rc<Action> = match planner.decide_action(state.atoms(), state.values())? {
            Some(action) => action,
            None => break,
        };
        log::trace!("Turn {}: applying {}", turns + 1, action.display(&problem.names()));
        state = state.next(&action, rng, None)?;
        turns += 1;
    }
    planner.end_round();
    let metric: Rational = problem.metric_value(state.values())?;
    log::debug!(
        "Problem '{}': round over after {} turn(s), goal {}, metric {}",
        problem.name(),
        turns,
        if state.goal() { "achieved" } else { "not achieved" },
        metric
    );
    Ok(Episode { turns, goal_achieved: state.goal(), metric })
}





/***** TESTS *****/
