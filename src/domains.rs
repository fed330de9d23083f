//  DOMAINS.rs
//    by Lut99
//
//  Created:
//    20 Mar 2025, 14:02:17
//  Last edited:
//    16 Jul 2025, 10:44:05
//  Auto updated?
//    Yes
//
//  Description:
//!   The domain: the shared declarations of a planning task.
//!
//!   A [`Domain`] owns the symbol tables, the interners, and the action schemas; problems
//!   borrow it. Registering a schema is the single point where predicates and functions
//!   lose their static flag, so the fold rules downstream can trust the flags.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::actions::ActionSchema;
use crate::effects::Effect;
use crate::expressions::FluentTable;
use crate::formulas::AtomTable;
use crate::symbols::{Function, FunctionTable, PredicateTable, TermTable, TypeTable};


/***** CONSTANTS *****/
/// The name of the reserved fluent counting simulation steps.
pub const TOTAL_TIME_NAME: &str = "total-time";
/// The name of the reserved fluent flagging goal achievement.
pub const GOAL_ACHIEVED_NAME: &str = "goal-achieved";



/***** LIBRARY *****/
/// The declarations shared by all problems of a planning task.
#[derive(Debug)]
pub struct Domain {
    /// The domain's name.
    name: String,
    /// The type lattice.
    types: TypeTable,
    /// The declared predicates.
    predicates: PredicateTable,
    /// The declared functions.
    functions: FunctionTable,
    /// The domain-level objects (constants).
    terms: TermTable<'static>,
    /// The interner for ground atoms, shared with all problems.
    atom_table: AtomTable,
    /// The interner for ground fluents, shared with all problems.
    fluent_table: FluentTable,
    /// The action schemas, in declaration order.
    actions: IndexMap<String, ActionSchema>,
    /// The reserved step-counting function.
    total_time: Function,
    /// The reserved goal-flag function.
    goal_achieved: Function,
}

// Constructors
impl Domain {
    /// Constructs a domain with the given name and the two reserved functions declared.
    pub fn new(name: impl Into<String>) -> Self {
        let mut functions: FunctionTable = FunctionTable::new();
        let total_time: Function = functions.add_function(TOTAL_TIME_NAME);
        functions.make_dynamic(total_time);
        let goal_achieved: Function = functions.add_function(GOAL_ACHIEVED_NAME);
        functions.make_dynamic(goal_achieved);
        Self {
            name: name.into(),
            types: TypeTable::new(),
            predicates: PredicateTable::new(),
            functions,
            terms: TermTable::new(),
            atom_table: AtomTable::new(),
            fluent_table: FluentTable::new(),
            actions: IndexMap::new(),
            total_time,
            goal_achieved,
        }
    }
}

// Table management
impl Domain {
    /// Registers an action schema, marking every predicate its effect adds or deletes and
    /// every function it updates as dynamic.
    pub fn add_action(&mut self, schema: ActionSchema) {
        mark_dynamic(schema.effect(), &mut self.predicates, &mut self.functions);
        log::debug!("Domain '{}': registered schema '{}' with {} parameter(s)", self.name, schema.name(), schema.parameters().len());
        self.actions.insert(schema.name().to_string(), schema);
    }

    /// Returns the schema with the given name, if it was registered.
    #[inline]
    pub fn find_action(&self, name: &str) -> Option<&ActionSchema> { self.actions.get(name) }
}

// Accessors
impl Domain {
    /// The domain's name.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// The type lattice.
    #[inline]
    pub fn types(&self) -> &TypeTable { &self.types }

    /// The type lattice, mutably.
    #[inline]
    pub fn types_mut(&mut self) -> &mut TypeTable { &mut self.types }

    /// The declared predicates.
    #[inline]
    pub fn predicates(&self) -> &PredicateTable { &self.predicates }

    /// The declared predicates, mutably.
    #[inline]
    pub fn predicates_mut(&mut self) -> &mut PredicateTable { &mut self.predicates }

    /// The declared functions.
    #[inline]
    pub fn functions(&self) -> &FunctionTable { &self.functions }

    /// The declared functions, mutably.
    #[inline]
    pub fn functions_mut(&mut self) -> &mut FunctionTable { &mut self.functions }

    /// The domain-level objects.
    #[inline]
    pub fn terms(&self) -> &TermTable<'static> { &self.terms }

    /// The domain-level objects, mutably.
    #[inline]
    pub fn terms_mut(&mut self) -> &mut TermTable<'static> { &mut self.terms }

    /// The interner for ground atoms.
    #[inline]
    pub fn atom_table(&self) -> &AtomTable { &self.atom_table }

    /// The interner for ground fluents.
    #[inline]
    pub fn fluent_table(&self) -> &FluentTable { &self.fluent_table }

    /// The registered schemas, in declaration order.
    #[inline]
    pub fn actions(&self) -> impl Iterator<Item = &ActionSchema> { self.actions.values() }

    /// The reserved step-counting function.
    #[inline]
    pub fn total_time(&self) -> Function { self.total_time }

    /// The reserved goal-flag function.
    #[inline]
    pub fn goal_achieved(&self) -> Function { self.goal_achieved }

    /// Returns whether the given function is one of the reserved ones.
    #[inline]
    pub fn is_reserved(&self, function: Function) -> bool { function == self.total_time || function == self.goal_achieved }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "domain '{}' ({} schema(s))", self.name, self.actions.len())
    }
}



/***** HELPER FUNCTIONS *****/
/// Marks every predicate an effect adds or deletes and every function it updates as
/// dynamic.
fn mark_dynamic(effect: &Rc<Effect>, predicates: &mut PredicateTable, functions: &mut FunctionTable) {
    match effect.as_ref() {
        Effect::Empty => {},
        Effect::Add(atom) | Effect::Delete(atom) => predicates.make_dynamic(atom.predicate()),
        Effect::Update(update) => functions.make_dynamic(update.fluent().function()),
        Effect::Conjunction(effects) => {
            for effect in effects {
                mark_dynamic(effect, predicates, functions);
            }
        },
        Effect::Conditional(_, effect) => mark_dynamic(effect, predicates, functions),
        Effect::Probabilistic(outcomes) => {
            for (_, effect) in outcomes {
                mark_dynamic(effect, predicates, functions);
            }
        },
        Effect::Quantified(_, effect) => mark_dynamic(effect, predicates, functions),
    }
}





/***** TESTS *****/
