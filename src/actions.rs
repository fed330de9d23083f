//  ACTIONS.rs
//    by Lut99
//
//  Created:
//    20 Mar 2025, 09:40:55
//  Last edited:
//    16 Jul 2025, 10:31:42
//  Auto updated?
//    Yes
//
//  Description:
//!   Action schemas and their ground instantiations.
//!
//!   Grounding binds one parameter at a time and re-instantiates the precondition after
//!   every binding: a precondition that already folded to the contradiction sentinel on a
//!   partial binding prunes every extension of that binding, which is what keeps the
//!   backtracking tractable on large object sets.
//

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FResult, Write as _};
use std::rc::Rc;

use itertools::Itertools as _;
use rand::RngCore;

use crate::effects::{Effect, Update};
use crate::env::{Env, Names};
use crate::errors::Result;
use crate::expressions::{FluentTable, ValueMap};
use crate::formulas::{Atom, AtomSet, AtomTable, Formula};
use crate::symbols::{Object, Substitution, Term, Variable};


/***** LIBRARY *****/
/// The ground actions of a problem, ordered by name and arguments.
pub type ActionSet = BTreeSet<Rc<Action>>;



/// A lifted action schema, as declared in a domain.
#[derive(Clone, Debug)]
pub struct ActionSchema {
    /// The schema's name.
    name: String,
    /// The typed parameters, bound during grounding.
    parameters: Vec<Variable>,
    /// The precondition over the parameters.
    precondition: Rc<Formula>,
    /// The effect over the parameters.
    effect: Rc<Effect>,
}

// Constructors
impl ActionSchema {
    /// Constructs a schema with the given name, no parameters, a tautological
    /// precondition and a no-op effect.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parameters: Vec::new(), precondition: Formula::constant(true), effect: Effect::empty() }
    }

    /// Appends a parameter to this schema.
    #[inline]
    pub fn add_parameter(&mut self, parameter: Variable) { self.parameters.push(parameter); }

    /// Sets this schema's precondition.
    #[inline]
    pub fn set_precondition(&mut self, precondition: Rc<Formula>) { self.precondition = precondition; }

    /// Sets this schema's effect.
    #[inline]
    pub fn set_effect(&mut self, effect: Rc<Effect>) { self.effect = effect; }
}

// Accessors
impl ActionSchema {
    /// The schema's name.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// The schema's parameters.
    #[inline]
    pub fn parameters(&self) -> &[Variable] { &self.parameters }

    /// The schema's effect.
    #[inline]
    pub fn effect(&self) -> &Rc<Effect> { &self.effect }
}

// Grounding
impl ActionSchema {
    /// Inserts every consistent ground instantiation of this schema into the given set.
    ///
    /// The environment's atoms and values are the problem's initial ones; static
    /// predicates and fluents fold against them, so instantiations whose precondition
    /// folds to the contradiction are never produced.
    pub fn instantiations(&self, actions: &mut ActionSet, env: &Env) -> Result<()> {
        if self.parameters.is_empty() {
            let precondition: Rc<Formula> = Formula::instantiation(&self.precondition, &Substitution::new(), env)?;
            if !precondition.contradiction() {
                actions.insert(self.ground(Vec::new(), &Substitution::new(), precondition, env)?);
            }
            return Ok(());
        }

        // Any parameter without compatible objects rules out all instantiations
        let mut domains: Vec<Rc<Vec<Object>>> = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            let objects: Rc<Vec<Object>> = env.names.terms.compatible_objects(env.names.types, env.names.terms.type_of(Term::Variable(*parameter)));
            if objects.is_empty() {
                log::trace!("Schema '{}' has no objects compatible with parameter {}", self.name, Term::Variable(*parameter).display(env.names.terms));
                return Ok(());
            }
            domains.push(objects);
        }

        let before: usize = actions.len();
        let mut args: Substitution = Substitution::new();
        self.bind(0, &mut args, &self.precondition, &domains, actions, env)?;
        log::trace!("Schema '{}' produced {} ground action(s)", self.name, actions.len() - before);
        Ok(())
    }

    /// Binds parameter `i` to each of its compatible objects, pruning on preconditions
    /// that fold to the contradiction under the partial binding.
    fn bind(
        &self,
        i: usize,
        args: &mut Substitution,
        precondition: &Rc<Formula>,
        domains: &[Rc<Vec<Object>>],
        actions: &mut ActionSet,
        env: &Env,
    ) -> Result<()> {
        if i == self.parameters.len() {
            let arguments: Vec<Object> = self.parameters.iter().map(|parameter| args[parameter]).collect();
            actions.insert(self.ground(arguments, args, precondition.clone(), env)?);
            return Ok(());
        }
        let mut binding: Substitution = Substitution::new();
        for object in domains[i].iter() {
            args.insert(self.parameters[i], *object);
            binding.insert(self.parameters[i], *object);
            let precondition: Rc<Formula> = Formula::instantiation(precondition, &binding, env)?;
            if !precondition.contradiction() {
                self.bind(i + 1, args, &precondition, domains, actions, env)?;
            }
        }
        args.remove(&self.parameters[i]);
        Ok(())
    }

    /// Builds the ground action for one full binding.
    fn ground(&self, arguments: Vec<Object>, args: &Substitution, precondition: Rc<Formula>, env: &Env) -> Result<Rc<Action>> {
        Ok(Rc::new(Action { name: self.name.clone(), arguments, precondition, effect: Effect::instantiation(&self.effect, args, env)? }))
    }
}



/// A fully-ground action.
#[derive(Clone, Debug)]
pub struct Action {
    /// The name of the schema this action instantiates.
    name: String,
    /// The objects bound to the schema's parameters, in parameter order.
    arguments: Vec<Object>,
    /// The ground precondition.
    precondition: Rc<Formula>,
    /// The ground effect.
    effect: Rc<Effect>,
}

// Identity is the (name, arguments) pair; the formula trees play no part in it.
impl Eq for Action {}
impl PartialEq for Action {
    #[inline]
    fn eq(&self, other: &Self) -> bool { self.name == other.name && self.arguments == other.arguments }
}
impl Ord for Action {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering { self.name.cmp(&other.name).then_with(|| self.arguments.cmp(&other.arguments)) }
}
impl PartialOrd for Action {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

// Accessors
impl Action {
    /// The name of the schema this action instantiates.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// The objects bound to the schema's parameters.
    #[inline]
    pub fn arguments(&self) -> &[Object] { &self.arguments }

    /// The ground precondition.
    #[inline]
    pub fn precondition(&self) -> &Rc<Formula> { &self.precondition }

    /// The ground effect.
    #[inline]
    pub fn effect(&self) -> &Rc<Effect> { &self.effect }
}

// Simulation
impl Action {
    /// Tests whether this action's precondition holds in the environment.
    #[inline]
    pub fn enabled(&self, env: &Env) -> Result<bool> { Formula::holds(&self.precondition, env) }

    /// Applies this action's effect to the given atoms and values.
    ///
    /// The effect's change is resolved against the state _before_ any of it is applied;
    /// deletes are applied before adds, fluent updates last and in effect order. When
    /// `changes` is given, the observed delta is appended to it as a `<state-change>`
    /// element (updates report the post-update value).
    pub fn affect(
        &self,
        names: &Names,
        atom_table: &AtomTable,
        fluent_table: &FluentTable,
        atoms: &mut AtomSet,
        values: &mut ValueMap,
        rng: &mut dyn RngCore,
        mut changes: Option<&mut String>,
    ) -> Result<()> {
        let mut adds: Vec<Rc<Atom>> = Vec::new();
        let mut deletes: Vec<Rc<Atom>> = Vec::new();
        let mut updates: Vec<Update> = Vec::new();
        {
            let env: Env = Env::new(*names, atom_table, fluent_table, atoms, values, true);
            self.effect.state_change(&mut adds, &mut deletes, &mut updates, &env, rng)?;
        }

        if let Some(changes) = changes.as_mut() {
            changes.push_str("<state-change>");
        }
        for atom in &deletes {
            if atoms.remove(atom) {
                if let Some(changes) = changes.as_mut() {
                    let _ = write!(changes, "<del>{}</del>", atom.xml(names));
                }
            }
        }
        for atom in &adds {
            if atoms.insert(atom.clone()) {
                if let Some(changes) = changes.as_mut() {
                    let _ = write!(changes, "<add>{}</add>", atom.xml(names));
                }
            }
        }
        for update in &updates {
            update.affect(values, names)?;
            if let Some(changes) = changes.as_mut() {
                // Unwrap never fires: affect just inserted the fluent
                if let Some(value) = values.get(update.fluent()) {
                    let _ = write!(changes, "<fluent>{}<value>{}</value></fluent>", update.fluent().xml(names), value);
                }
            }
        }
        if let Some(changes) = changes.as_mut() {
            changes.push_str("</state-change>");
        }
        Ok(())
    }
}

// Formatting
impl Action {
    /// Returns a formatter that writes this action as `(name arg...)`.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayAction { action: self, names: *names } }
}



/***** FORMATTERS *****/
/// Formats an [`Action`] as `(name arg...)`.
struct DisplayAction<'a> {
    action: &'a Action,
    names:  Names<'a>,
}
impl<'a> Display for DisplayAction<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        if self.action.arguments.is_empty() {
            write!(f, "({})", self.action.name)
        } else {
            write!(f, "({} {})", self.action.name, self.action.arguments.iter().map(|object| self.names.terms.name_of(*object)).join(" "))
        }
    }
}





/***** TESTS *****/
