//  PROBLEMS.rs
//    by Lut99
//
//  Created:
//    20 Mar 2025, 15:11:36
//  Last edited:
//    16 Jul 2025, 11:02:59
//  Auto updated?
//    Yes
//
//  Description:
//!   The problem: one concrete instance of a domain.
//!
//!   A [`Problem`] borrows its [`Domain`] and extends the domain's term table with its own
//!   objects. [`Problem::instantiate`] is the grounding entry point: it folds the goal, the
//!   goal reward and the metric against the initial atoms and values, and expands every
//!   schema into the ground action set.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use crate::actions::{Action, ActionSet};
use crate::domains::Domain;
use crate::effects::{Effect, Update};
use crate::env::{Env, Names};
use crate::errors::Result;
use crate::expressions::{Expression, Fluent, ValueMap};
use crate::formulas::{Atom, AtomSet, Formula};
use crate::rational::Rational;
use crate::symbols::{Substitution, TermTable};


/***** LIBRARY *****/
/// One concrete instance of a [`Domain`].
#[derive(Debug)]
pub struct Problem<'d> {
    /// The problem's name.
    name: String,
    /// The domain this problem instantiates.
    domain: &'d Domain,
    /// The problem-level objects, extending the domain's.
    terms: TermTable<'d>,
    /// The atoms true in the initial state.
    init_atoms: AtomSet,
    /// The fluent values of the initial state.
    init_values: ValueMap,
    /// Effects applied once when the initial state is built (their adds and updates only).
    init_effects: Vec<Rc<Effect>>,
    /// The goal formula. Defaults to the contradiction: no state is a goal state.
    goal: Rc<Formula>,
    /// The reward update applied when the goal first becomes true, if any.
    goal_reward: Option<Update>,
    /// The metric to report at the end of a session. Defaults to the constant zero.
    metric: Rc<Expression>,
    /// The ground actions, filled in by [`Problem::instantiate`].
    actions: ActionSet,
}

// Constructors
impl<'d> Problem<'d> {
    /// Constructs an empty problem over the given domain.
    pub fn new(name: impl Into<String>, domain: &'d Domain) -> Self {
        Self {
            name: name.into(),
            domain,
            terms: TermTable::with_parent(domain.terms()),
            init_atoms: AtomSet::new(),
            init_values: ValueMap::new(),
            init_effects: Vec::new(),
            goal: Formula::constant(false),
            goal_reward: None,
            metric: Expression::value(Rational::ZERO),
            actions: ActionSet::new(),
        }
    }
}

// Builders
impl<'d> Problem<'d> {
    /// The problem-level term table, mutably, for declaring objects.
    #[inline]
    pub fn terms_mut(&mut self) -> &mut TermTable<'d> { &mut self.terms }

    /// Marks an atom as true in the initial state.
    #[inline]
    pub fn add_init_atom(&mut self, atom: Rc<Atom>) { self.init_atoms.insert(atom); }

    /// Gives a fluent its initial value.
    #[inline]
    pub fn add_init_value(&mut self, fluent: Rc<Fluent>, value: Rational) { self.init_values.insert(fluent, value); }

    /// Appends an effect applied once when the initial state is built.
    #[inline]
    pub fn add_init_effect(&mut self, effect: Rc<Effect>) { self.init_effects.push(effect); }

    /// Sets the goal formula.
    #[inline]
    pub fn set_goal(&mut self, goal: Rc<Formula>) { self.goal = goal; }

    /// Sets the reward update applied when the goal first becomes true.
    #[inline]
    pub fn set_goal_reward(&mut self, reward: Update) { self.goal_reward = Some(reward); }

    /// Sets the metric expression. A minimized metric is stored negated, so higher is
    /// always better.
    pub fn set_metric(&mut self, metric: Rc<Expression>, minimize: bool) {
        self.metric = if minimize { Expression::subtraction(&Expression::value(Rational::ZERO), &metric) } else { metric };
    }
}

// Accessors
impl<'d> Problem<'d> {
    /// The problem's name.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// The domain this problem instantiates.
    #[inline]
    pub fn domain(&self) -> &'d Domain { self.domain }

    /// The problem-level term table.
    #[inline]
    pub fn terms(&self) -> &TermTable<'d> { &self.terms }

    /// The atoms true in the initial state.
    #[inline]
    pub fn init_atoms(&self) -> &AtomSet { &self.init_atoms }

    /// The fluent values of the initial state.
    #[inline]
    pub fn init_values(&self) -> &ValueMap { &self.init_values }

    /// The effects applied once when the initial state is built.
    #[inline]
    pub fn init_effects(&self) -> &[Rc<Effect>] { &self.init_effects }

    /// The goal formula.
    #[inline]
    pub fn goal(&self) -> &Rc<Formula> { &self.goal }

    /// The reward update applied when the goal first becomes true, if any.
    #[inline]
    pub fn goal_reward(&self) -> Option<&Update> { self.goal_reward.as_ref() }

    /// The metric expression.
    #[inline]
    pub fn metric(&self) -> &Rc<Expression> { &self.metric }

    /// The ground actions. Empty until [`Problem::instantiate`] has run.
    #[inline]
    pub fn actions(&self) -> &ActionSet { &self.actions }

    /// Bundles the problem's symbol tables for formatting and type lookups.
    #[inline]
    pub fn names(&self) -> Names { Names { types: self.domain.types(), predicates: self.domain.predicates(), functions: self.domain.functions(), terms: &self.terms } }

    /// Bundles a full evaluation environment over the given atoms and values.
    #[inline]
    pub fn env<'e>(&'e self, atoms: &'e AtomSet, values: &'e ValueMap, state: bool) -> Env<'e> {
        Env::new(self.names(), self.domain.atom_table(), self.domain.fluent_table(), atoms, values, state)
    }
}

// Grounding
impl<'d> Problem<'d> {
    /// Grounds the problem: folds the goal, the goal reward and the metric against the
    /// initial atoms and values, and expands every schema of the domain into the ground
    /// action set.
    ///
    /// # Errors
    /// Fails with the errors of formula and expression instantiation.
    pub fn instantiate(&mut self) -> Result<()> {
        let subst: Substitution = Substitution::new();
        let (goal, goal_reward, metric, actions) = {
            let env: Env = self.env(&self.init_atoms, &self.init_values, false);
            let goal: Rc<Formula> = Formula::instantiation(&self.goal, &subst, &env)?;
            let goal_reward: Option<Update> = match &self.goal_reward {
                Some(reward) => Some(reward.instantiation(&subst, &env)?),
                None => None,
            };
            let metric: Rc<Expression> = Expression::instantiation(&self.metric, &subst, &env)?;
            let mut actions: ActionSet = ActionSet::new();
            for schema in self.domain.actions() {
                schema.instantiations(&mut actions, &env)?;
            }
            (goal, goal_reward, metric, actions)
        };
        log::debug!("Problem '{}': grounded {} action(s)", self.name, actions.len());
        self.goal = goal;
        self.goal_reward = goal_reward;
        self.metric = metric;
        self.actions = actions;
        Ok(())
    }
}

// Simulation
impl<'d> Problem<'d> {
    /// Returns the ground actions whose precondition holds in the given state.
    pub fn enabled_actions(&self, atoms: &AtomSet, values: &ValueMap) -> Result<Vec<Rc<Action>>> {
        let env: Env = self.env(atoms, values, true);
        let mut enabled: Vec<Rc<Action>> = Vec::new();
        for action in &self.actions {
            if action.enabled(&env)? {
                enabled.push(action.clone());
            }
        }
        Ok(enabled)
    }

    /// Returns whether the metric folded to a constant during grounding.
    #[inline]
    pub fn constant_metric(&self) -> bool { matches!(self.metric.as_ref(), Expression::Value(_)) }

    /// Evaluates the metric against the given fluent values.
    #[inline]
    pub fn metric_value(&self, values: &ValueMap) -> Result<Rational> { self.metric.evaluate(values, &self.names()) }
}

impl<'d> Display for Problem<'d> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "problem '{}' over {} ({} ground action(s))", self.name, self.domain, self.actions.len())
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::UpdateKind;
    use crate::symbols::{Object, Predicate, Type};
    use crate::tests::{make_drive_domain, setup_logger};

    #[test]
    fn test_instantiate_grounds_actions() {
        setup_logger();
        let domain: Domain = make_drive_domain();
        let city: Type = domain.types().find_type("city").unwrap();
        let at: Predicate = domain.predicates().find_predicate("at").unwrap();
        let road: Predicate = domain.predicates().find_predicate("road").unwrap();

        let mut problem: Problem = Problem::new("p01", &domain);
        let rome: Object = problem.terms_mut().add_object("rome", city);
        let pisa: Object = problem.terms_mut().add_object("pisa", city);
        problem.add_init_atom(Atom::make(at, vec![rome.into()], domain.atom_table()));
        problem.add_init_atom(Atom::make(road, vec![rome.into(), pisa.into()], domain.atom_table()));
        problem.set_goal(Formula::atom(Atom::make(at, vec![pisa.into()], domain.atom_table())));
        problem.instantiate().unwrap();

        // Only (drive rome pisa) survives the static road fold
        assert_eq!(problem.actions().len(), 1);
        let drive: &Rc<Action> = problem.actions().iter().next().unwrap();
        assert_eq!(drive.arguments(), [rome, pisa]);

        // The goal mentions a dynamic predicate, so it survives as a formula
        assert!(matches!(problem.goal().as_ref(), Formula::Atom(_)));

        let enabled: Vec<Rc<Action>> = problem.enabled_actions(problem.init_atoms(), problem.init_values()).unwrap();
        assert_eq!(enabled.len(), 1);
    }

    #[test]
    fn test_metric_folding() {
        setup_logger();
        let domain: Domain = make_drive_domain();
        let mut problem: Problem = Problem::new("p01", &domain);

        // The metric over the reserved (dynamic) total-time does not fold
        let total_time: Rc<Fluent> = Fluent::make(domain.total_time(), vec![], domain.fluent_table());
        problem.set_metric(Expression::fluent(total_time.clone()), true);
        problem.instantiate().unwrap();
        assert!(!problem.constant_metric());

        let mut values: ValueMap = ValueMap::new();
        values.insert(total_time, Rational::from(3));
        // Minimized metrics are negated
        assert_eq!(problem.metric_value(&values).unwrap(), Rational::from(-3));
    }

    #[test]
    fn test_goal_reward_instantiation() {
        setup_logger();
        let domain: Domain = make_drive_domain();
        let mut problem: Problem = Problem::new("p01", &domain);
        let reward_fluent: Rc<Fluent> = Fluent::make(domain.goal_achieved(), vec![], domain.fluent_table());
        problem.set_goal_reward(Update::new(UpdateKind::Assign, reward_fluent, Expression::value(Rational::from(100))));
        problem.instantiate().unwrap();
        assert!(problem.goal_reward().is_some());
    }
}
