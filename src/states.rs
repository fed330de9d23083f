//  STATES.rs
//    by Lut99
//
//  Created:
//    21 Mar 2025, 09:13:44
//  Last edited:
//    16 Jul 2025, 11:20:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Concrete simulation states.
//!
//!   A [`State`] is an atom set plus a fluent value map, tied to its problem. Transitions
//!   produce fresh states; the goal reward and the `goal-achieved` flag are applied exactly
//!   once, on the transition where the goal first becomes true.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use rand::RngCore;

use crate::actions::Action;
use crate::effects::Update;
use crate::env::Env;
use crate::errors::Result;
use crate::expressions::{Fluent, ValueMap};
use crate::formulas::{Atom, AtomSet, Formula};
use crate::problems::Problem;
use crate::rational::Rational;


/***** LIBRARY *****/
/// A concrete state of one problem's simulation.
#[derive(Clone, Debug)]
pub struct State<'p> {
    /// The problem this state belongs to.
    problem: &'p Problem<'p>,
    /// The atoms that hold.
    atoms: AtomSet,
    /// The fluent values.
    values: ValueMap,
    /// Whether the goal holds here.
    goal: bool,
}

// Constructors
impl<'p> State<'p> {
    /// Builds the initial state of the given problem.
    ///
    /// The initial atoms and values are copied, then the problem's init effects are
    /// resolved against them and their adds and updates (not their deletes) applied. If
    /// the goal already holds, the `goal-achieved` flag and the goal reward are applied
    /// here.
    ///
    /// # Errors
    /// Fails with the errors of effect resolution and goal evaluation.
    pub fn initial(problem: &'p Problem<'p>, rng: &mut dyn RngCore) -> Result<Self> {
        let mut atoms: AtomSet = problem.init_atoms().clone();
        let mut values: ValueMap = problem.init_values().clone();

        for effect in problem.init_effects() {
            let mut adds: Vec<Rc<Atom>> = Vec::new();
            let mut deletes: Vec<Rc<Atom>> = Vec::new();
            let mut updates: Vec<Update> = Vec::new();
            {
                let env: Env = problem.env(&atoms, &values, true);
                effect.state_change(&mut adds, &mut deletes, &mut updates, &env, rng)?;
            }
            atoms.extend(adds);
            for update in &updates {
                update.affect(&mut values, &problem.names())?;
            }
        }

        let goal: bool = {
            let env: Env = problem.env(&atoms, &values, true);
            Formula::holds(problem.goal(), &env)?
        };
        if goal {
            reward_goal(problem, &mut values)?;
        }
        log::debug!("Problem '{}': initial state with {} atom(s){}", problem.name(), atoms.len(), if goal { ", goal already achieved" } else { "" });
        Ok(Self { problem, atoms, values, goal })
    }
}

// Accessors
impl<'p> State<'p> {
    /// The atoms that hold in this state.
    #[inline]
    pub fn atoms(&self) -> &AtomSet { &self.atoms }

    /// The fluent values of this state.
    #[inline]
    pub fn values(&self) -> &ValueMap { &self.values }

    /// Whether the goal holds in this state.
    #[inline]
    pub fn goal(&self) -> bool { self.goal }
}

// Transitions
impl<'p> State<'p> {
    /// Returns the successor state after applying the given action.
    ///
    /// The `total-time` fluent is incremented on every transition (an absent value counts
    /// as zero); the `goal-achieved` flag and the goal reward are applied exactly on the
    /// transition where the goal first becomes true. When `changes` is given, the observed
    /// delta is appended to it as a `<state-change>` element.
    ///
    /// # Errors
    /// Fails with the errors of effect resolution and goal evaluation.
    pub fn next(&self, action: &Action, rng: &mut dyn RngCore, changes: Option<&mut String>) -> Result<Self> {
        let mut atoms: AtomSet = self.atoms.clone();
        let mut values: ValueMap = self.values.clone();
        action.affect(&self.problem.names(), self.problem.domain().atom_table(), self.problem.domain().fluent_table(), &mut atoms, &mut values, rng, changes)?;

        let goal: bool = {
            let env: Env = self.problem.env(&atoms, &values, true);
            Formula::holds(self.problem.goal(), &env)?
        };
        if goal && !self.goal {
            reward_goal(self.problem, &mut values)?;
        }

        let total_time: Rc<Fluent> = Fluent::make(self.problem.domain().total_time(), vec![], self.problem.domain().fluent_table());
        let elapsed: Rational = values.get(&total_time).copied().unwrap_or(Rational::ZERO);
        values.insert(total_time, elapsed + Rational::ONE);

        Ok(Self { problem: self.problem, atoms, values, goal })
    }
}

// Formatting
impl<'p> State<'p> {
    /// Returns a formatter that writes this state's XML form: non-static atoms and
    /// dynamic, non-reserved fluents, preceded by `<is-goal/>` in a goal state.
    #[inline]
    pub fn xml(&self) -> impl Display + '_ { XmlState { state: self } }
}

impl<'p> Display for State<'p> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        let names = self.problem.names();
        for atom in &self.atoms {
            if !names.predicates.is_static(atom.predicate()) {
                write!(f, "{} ", atom.display(&names))?;
            }
        }
        for (fluent, value) in &self.values {
            if !names.functions.is_static(fluent.function()) && !self.problem.domain().is_reserved(fluent.function()) {
                write!(f, "(= {} {}) ", fluent.display(&names), value)?;
            }
        }
        if self.goal {
            write!(f, "<goal>")?;
        }
        Ok(())
    }
}



/***** HELPER FUNCTIONS *****/
/// Sets the `goal-achieved` flag and applies the problem's goal reward, if any.
fn reward_goal(problem: &Problem, values: &mut ValueMap) -> Result<()> {
    let flag: Rc<Fluent> = Fluent::make(problem.domain().goal_achieved(), vec![], problem.domain().fluent_table());
    values.insert(flag, Rational::ONE);
    if let Some(reward) = problem.goal_reward() {
        reward.affect(values, &problem.names())?;
    }
    Ok(())
}



/***** FORMATTERS *****/
/// Formats a [`State`] in its XML form.
struct XmlState<'a> {
    state: &'a State<'a>,
}
impl<'a> Display for XmlState<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        let names = self.state.problem.names();
        write!(f, "<state>")?;
        if self.state.goal {
            write!(f, "<is-goal/>")?;
        }
        for atom in &self.state.atoms {
            if !names.predicates.is_static(atom.predicate()) {
                write!(f, "{}", atom.xml(&names))?;
            }
        }
        for (fluent, value) in &self.state.values {
            if !names.functions.is_static(fluent.function()) && !self.state.problem.domain().is_reserved(fluent.function()) {
                write!(f, "<fluent>{}<value>{}</value></fluent>", fluent.xml(&names), value)?;
            }
        }
        write!(f, "</state>")
    }
}





/***** TESTS *****/
