//  EFFECTS.rs
//    by Lut99
//
//  Created:
//    19 Mar 2025, 15:22:30
//  Last edited:
//    16 Jul 2025, 10:12:06
//  Auto updated?
//    Yes
//
//  Description:
//!   State-changing effects.
//!
//!   Effects describe how an action rewrites the atom set and the fluent values. The
//!   probabilistic variant carries exact rational weights; sampling resolves them without
//!   ever rounding through floats.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use itertools::Itertools as _;
use rand::{Rng as _, RngCore};

use crate::env::{Env, Names};
use crate::errors::{Error, Result};
use crate::expressions::{Expression, Fluent, ValueMap};
use crate::formulas::{Atom, Formula};
use crate::rational::Rational;
use crate::symbols::{Object, Substitution, Term, Variable};


/***** LIBRARY *****/
/// The update flavours a fluent value can undergo.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UpdateKind {
    /// Overwrite the value.
    Assign,
    /// Multiply the current value.
    ScaleUp,
    /// Divide the current value.
    ScaleDown,
    /// Add to the current value.
    Increase,
    /// Subtract from the current value.
    Decrease,
}
impl UpdateKind {
    /// Returns the keyword of this update kind.
    #[inline]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::ScaleUp => "scale-up",
            Self::ScaleDown => "scale-down",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

/// A single fluent update, e.g. `(increase (fuel scania) 5)`.
#[derive(Clone, Debug)]
pub struct Update {
    /// How the fluent's value changes.
    kind: UpdateKind,
    /// The fluent changed.
    fluent: Rc<Fluent>,
    /// The (ground, at application time) right-hand side.
    expression: Rc<Expression>,
}
impl Update {
    /// Constructs a new update.
    #[inline]
    pub fn new(kind: UpdateKind, fluent: Rc<Fluent>, expression: Rc<Expression>) -> Self { Self { kind, fluent, expression } }

    /// The fluent this update changes.
    #[inline]
    pub fn fluent(&self) -> &Rc<Fluent> { &self.fluent }

    /// Returns an instantiation of this update under the given substitution.
    pub fn instantiation(&self, subst: &Substitution, env: &Env) -> Result<Self> {
        Ok(Self {
            kind: self.kind,
            fluent: Fluent::substitution(&self.fluent, subst, env.fluent_table),
            expression: Expression::instantiation(&self.expression, subst, env)?,
        })
    }

    /// Applies this update to the given value map.
    ///
    /// # Errors
    /// Every kind but [`UpdateKind::Assign`] requires the fluent to already have a value
    /// and fails with [`Error::UndefinedValue`] otherwise; [`UpdateKind::ScaleDown`] fails
    /// with [`Error::DivisionByZero`] on a zero right-hand side.
    pub fn affect(&self, values: &mut ValueMap, names: &Names) -> Result<()> {
        let rhs: Rational = self.expression.evaluate(values, names)?;
        if let UpdateKind::Assign = self.kind {
            values.insert(self.fluent.clone(), rhs);
            return Ok(());
        }
        let current: Rational = match values.get(&self.fluent) {
            Some(value) => *value,
            None => return Err(Error::UndefinedValue(self.fluent.display(names).to_string())),
        };
        let updated: Rational = match self.kind {
            UpdateKind::Assign => rhs,
            UpdateKind::ScaleUp => current * rhs,
            UpdateKind::ScaleDown => current.checked_div(rhs)?,
            UpdateKind::Increase => current + rhs,
            UpdateKind::Decrease => current - rhs,
        };
        values.insert(self.fluent.clone(), updated);
        Ok(())
    }

    /// Returns a formatter that writes this update as `(kind fluent expr)`.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayUpdate { update: self, names: *names } }
}



/// A state-changing effect.
#[derive(Clone, Debug)]
pub enum Effect {
    /// The no-op effect.
    Empty,
    /// Makes an atom true.
    Add(Rc<Atom>),
    /// Makes an atom false.
    Delete(Rc<Atom>),
    /// Changes a fluent value.
    Update(Update),
    /// All subeffects happen together.
    Conjunction(Vec<Rc<Effect>>),
    /// The effect happens only when the condition holds.
    Conditional(Rc<Formula>, Rc<Effect>),
    /// Exactly one outcome happens, chosen by weight; weight mass missing from 1 is the
    /// no-op outcome.
    Probabilistic(Vec<(Rational, Rc<Effect>)>),
    /// The effect happens for every compatible binding of the parameters.
    Quantified(Vec<Variable>, Rc<Effect>),
}

// Constructors
impl Effect {
    /// Returns the no-op effect.
    #[inline]
    pub fn empty() -> Rc<Self> { Rc::new(Self::Empty) }

    /// Returns an effect adding the given atom.
    #[inline]
    pub fn add(atom: Rc<Atom>) -> Rc<Self> { Rc::new(Self::Add(atom)) }

    /// Returns an effect deleting the given atom.
    #[inline]
    pub fn delete(atom: Rc<Atom>) -> Rc<Self> { Rc::new(Self::Delete(atom)) }

    /// Returns an update effect, folding the identity updates away.
    ///
    /// Scaling by the constant one and increasing or decreasing by the constant zero are
    /// no-ops.
    pub fn update(kind: UpdateKind, fluent: Rc<Fluent>, expression: Rc<Expression>) -> Rc<Self> {
        if let Expression::Value(value) = expression.as_ref() {
            match kind {
                UpdateKind::ScaleUp | UpdateKind::ScaleDown if *value == Rational::ONE => return Self::empty(),
                UpdateKind::Increase | UpdateKind::Decrease if *value == Rational::ZERO => return Self::empty(),
                _ => {},
            }
        }
        Rc::new(Self::Update(Update::new(kind, fluent, expression)))
    }

    /// Returns the conjunction of the two effects, absorbing no-ops and flattening nested
    /// conjunctions.
    pub fn and(e1: &Rc<Self>, e2: &Rc<Self>) -> Rc<Self> {
        if matches!(e1.as_ref(), Self::Empty) {
            return e2.clone();
        }
        if matches!(e2.as_ref(), Self::Empty) {
            return e1.clone();
        }
        let mut conjuncts: Vec<Rc<Self>> = Vec::new();
        for e in [e1, e2] {
            match e.as_ref() {
                Self::Conjunction(es) => conjuncts.extend(es.iter().cloned()),
                _ => conjuncts.push(e.clone()),
            }
        }
        Rc::new(Self::Conjunction(conjuncts))
    }

    /// Returns a conditional effect.
    ///
    /// A tautological condition yields the effect itself; a contradictory condition or a
    /// no-op effect yields the no-op.
    pub fn conditional(condition: &Rc<Formula>, effect: &Rc<Self>) -> Rc<Self> {
        if condition.tautology() {
            effect.clone()
        } else if condition.contradiction() || matches!(effect.as_ref(), Self::Empty) {
            Self::empty()
        } else {
            Rc::new(Self::Conditional(condition.clone(), effect.clone()))
        }
    }

    /// Returns a probabilistic effect over the given weighted outcomes.
    ///
    /// Nested probabilistic outcomes are flattened by multiplying weights through, zero
    /// weights are dropped, and no-op outcomes are removed after the total weight is
    /// checked (their mass stays unassigned and samples to the no-op).
    ///
    /// # Errors
    /// Fails with [`Error::InconsistentEffect`] when the weights sum to more than one.
    pub fn probabilistic(outcomes: Vec<(Rational, Rc<Self>)>) -> Result<Rc<Self>> {
        let mut flat: Vec<(Rational, Rc<Self>)> = Vec::with_capacity(outcomes.len());
        let mut total: Rational = Rational::ZERO;
        for (weight, effect) in outcomes {
            if weight == Rational::ZERO {
                continue;
            }
            total = total + weight;
            match effect.as_ref() {
                Self::Probabilistic(inner) => {
                    for (w, e) in inner {
                        flat.push((weight * *w, e.clone()));
                    }
                },
                Self::Empty => {},
                _ => flat.push((weight, effect)),
            }
        }
        if total > Rational::ONE {
            return Err(Error::InconsistentEffect(format!("outcome weights sum to {total}")));
        }
        if flat.is_empty() { Ok(Self::empty()) } else { Ok(Rc::new(Self::Probabilistic(flat))) }
    }

    /// Returns a quantified effect, degenerating to the body on an empty parameter list
    /// and to the no-op on a no-op body.
    pub fn quantified(parameters: Vec<Variable>, body: &Rc<Self>) -> Rc<Self> {
        if matches!(body.as_ref(), Self::Empty) {
            Self::empty()
        } else if parameters.is_empty() {
            body.clone()
        } else {
            Rc::new(Self::Quantified(parameters, body.clone()))
        }
    }
}

// Grounding
impl Effect {
    /// Returns an instantiation of this effect under the given substitution.
    ///
    /// Quantified effects are expanded into conjunctions over the compatible objects of
    /// their parameters. If nothing changes, the returned node is reference-equal to
    /// `this`.
    pub fn instantiation(this: &Rc<Self>, subst: &Substitution, env: &Env) -> Result<Rc<Self>> {
        match this.as_ref() {
            Self::Empty => Ok(this.clone()),
            Self::Add(atom) => {
                let inst: Rc<Atom> = Atom::substitution(atom, subst, env.atom_table);
                if Rc::ptr_eq(&inst, atom) { Ok(this.clone()) } else { Ok(Self::add(inst)) }
            },
            Self::Delete(atom) => {
                let inst: Rc<Atom> = Atom::substitution(atom, subst, env.atom_table);
                if Rc::ptr_eq(&inst, atom) { Ok(this.clone()) } else { Ok(Self::delete(inst)) }
            },
            Self::Update(update) => {
                let fluent: Rc<Fluent> = Fluent::substitution(&update.fluent, subst, env.fluent_table);
                let expression: Rc<Expression> = Expression::instantiation(&update.expression, subst, env)?;
                if Rc::ptr_eq(&fluent, &update.fluent) && Rc::ptr_eq(&expression, &update.expression) {
                    Ok(this.clone())
                } else {
                    Ok(Self::update(update.kind, fluent, expression))
                }
            },
            Self::Conjunction(es) => {
                let mut unchanged: bool = true;
                let mut result: Rc<Self> = Self::empty();
                for e in es {
                    let i: Rc<Self> = Self::instantiation(e, subst, env)?;
                    unchanged &= Rc::ptr_eq(&i, e);
                    result = Self::and(&result, &i);
                }
                if unchanged { Ok(this.clone()) } else { Ok(result) }
            },
            Self::Conditional(condition, effect) => {
                let c: Rc<Formula> = Formula::instantiation(condition, subst, env)?;
                let e: Rc<Self> = Self::instantiation(effect, subst, env)?;
                if Rc::ptr_eq(&c, condition) && Rc::ptr_eq(&e, effect) { Ok(this.clone()) } else { Ok(Self::conditional(&c, &e)) }
            },
            Self::Probabilistic(outcomes) => {
                let mut unchanged: bool = true;
                let mut insts: Vec<(Rational, Rc<Self>)> = Vec::with_capacity(outcomes.len());
                for (weight, effect) in outcomes {
                    let i: Rc<Self> = Self::instantiation(effect, subst, env)?;
                    unchanged &= Rc::ptr_eq(&i, effect);
                    insts.push((*weight, i));
                }
                if unchanged { Ok(this.clone()) } else { Self::probabilistic(insts) }
            },
            Self::Quantified(parameters, body) => {
                let mut args: Substitution = subst.clone();
                expand_quantified(parameters, 0, &mut args, body, env)
            },
        }
    }
}

// Application
impl Effect {
    /// Collects the ground change this effect makes to a state, resolving conditions
    /// against the environment and sampling probabilistic outcomes from the given RNG.
    ///
    /// Adds, deletes and updates are appended to the given lists in effect order; the
    /// caller applies deletes before adds and updates last.
    ///
    /// # Errors
    /// Fails with [`Error::UnsupportedConstruct`] on a quantified effect (grounding
    /// expands those away) and with the errors of condition evaluation.
    pub fn state_change(
        &self,
        adds: &mut Vec<Rc<Atom>>,
        deletes: &mut Vec<Rc<Atom>>,
        updates: &mut Vec<Update>,
        env: &Env,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Add(atom) => {
                adds.push(atom.clone());
                Ok(())
            },
            Self::Delete(atom) => {
                deletes.push(atom.clone());
                Ok(())
            },
            Self::Update(update) => {
                updates.push(update.clone());
                Ok(())
            },
            Self::Conjunction(es) => {
                for e in es {
                    e.state_change(adds, deletes, updates, env, rng)?;
                }
                Ok(())
            },
            Self::Conditional(condition, effect) => {
                if Formula::holds(condition, env)? {
                    effect.state_change(adds, deletes, updates, env, rng)?;
                }
                Ok(())
            },
            Self::Probabilistic(outcomes) => {
                // Draw an integer below the common denominator so the sampling is exact
                let den: i64 = outcomes.iter().fold(1, |den, (weight, _)| Rational::multipliers(den, weight.denominator()).1 * weight.denominator());
                let mut draw: i64 = rng.gen_range(0..den);
                for (weight, effect) in outcomes {
                    let mass: i64 = weight.numerator() * (den / weight.denominator());
                    if draw < mass {
                        return effect.state_change(adds, deletes, updates, env, rng);
                    }
                    draw -= mass;
                }
                // Leftover mass is the implicit no-op outcome
                Ok(())
            },
            Self::Quantified(..) => Err(Error::UnsupportedConstruct(self.display(&env.names).to_string())),
        }
    }
}

// Formatting
impl Effect {
    /// Returns a formatter that writes this effect in prefix notation.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayEffect { effect: self, names: *names } }
}



/***** HELPER FUNCTIONS *****/
/// Expands a quantified effect into the conjunction of its body's instantiations over the
/// compatible objects of its parameters.
///
/// No compatible objects for some parameter makes the whole effect a no-op.
fn expand_quantified(parameters: &[Variable], i: usize, args: &mut Substitution, body: &Rc<Effect>, env: &Env) -> Result<Rc<Effect>> {
    if i == parameters.len() {
        return Effect::instantiation(body, args, env);
    }
    let objects: Rc<Vec<Object>> = env.names.terms.compatible_objects(env.names.types, env.names.terms.type_of(Term::Variable(parameters[i])));
    let mut result: Rc<Effect> = Effect::empty();
    for object in objects.iter() {
        args.insert(parameters[i], *object);
        let inst: Rc<Effect> = expand_quantified(parameters, i + 1, args, body, env)?;
        result = Effect::and(&result, &inst);
    }
    args.remove(&parameters[i]);
    Ok(result)
}



/***** FORMATTERS *****/
/// Formats an [`Update`] as `(kind fluent expr)`.
struct DisplayUpdate<'a> {
    update: &'a Update,
    names:  Names<'a>,
}
impl<'a> Display for DisplayUpdate<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "({} {} {})", self.update.kind.keyword(), self.update.fluent.display(&self.names), self.update.expression.display(&self.names))
    }
}

/// Formats an [`Effect`] in prefix notation.
struct DisplayEffect<'a> {
    effect: &'a Effect,
    names:  Names<'a>,
}
impl<'a> Display for DisplayEffect<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self.effect {
            Effect::Empty => write!(f, "(and)"),
            Effect::Add(atom) => write!(f, "{}", atom.display(&self.names)),
            Effect::Delete(atom) => write!(f, "(not {})", atom.display(&self.names)),
            Effect::Update(update) => write!(f, "{}", update.display(&self.names)),
            Effect::Conjunction(es) => write!(f, "(and {})", es.iter().map(|e| e.display(&self.names)).join(" ")),
            Effect::Conditional(condition, effect) => write!(f, "(when {} {})", condition.display(&self.names), effect.display(&self.names)),
            Effect::Probabilistic(outcomes) => {
                write!(f, "(probabilistic {})", outcomes.iter().map(|(w, e)| format!("{} {}", w, e.display(&self.names))).join(" "))
            },
            Effect::Quantified(vars, body) => {
                write!(f, "(forall ({}) {})", vars.iter().map(|var| format!("{}", Term::Variable(*var).display(self.names.terms))).join(" "), body.display(&self.names))
            },
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;
    use crate::expressions::FluentTable;
    use crate::formulas::{AtomSet, AtomTable};
    use crate::symbols::{Function, FunctionTable, Predicate, PredicateTable, TermTable, Type, TypeTable};

    /// A coin-flipping fixture: predicate `heads()`, function `flips()`.
    struct Fixture {
        types: TypeTable,
        predicates: PredicateTable,
        functions: FunctionTable,
        terms: TermTable<'static>,
        atom_table: AtomTable,
        fluent_table: FluentTable,
        atoms: AtomSet,
        values: ValueMap,
        heads: Predicate,
        flips: Function,
    }
    impl Fixture {
        fn new() -> Self {
            let mut predicates: PredicateTable = PredicateTable::new();
            let heads: Predicate = predicates.add_predicate("heads");
            predicates.make_dynamic(heads);
            let mut functions: FunctionTable = FunctionTable::new();
            let flips: Function = functions.add_function("flips");
            functions.make_dynamic(flips);
            let fluent_table: FluentTable = FluentTable::new();
            let mut values: ValueMap = ValueMap::new();
            values.insert(Fluent::make(flips, vec![], &fluent_table), Rational::ZERO);
            Self {
                types: TypeTable::new(),
                predicates,
                functions,
                terms: TermTable::new(),
                atom_table: AtomTable::new(),
                fluent_table,
                atoms: AtomSet::new(),
                values,
                heads,
                flips,
            }
        }

        fn names(&self) -> Names { Names { types: &self.types, predicates: &self.predicates, functions: &self.functions, terms: &self.terms } }

        fn env(&self) -> Env { Env::new(self.names(), &self.atom_table, &self.fluent_table, &self.atoms, &self.values, true) }

        fn heads_atom(&self) -> Rc<Atom> { Atom::make(self.heads, vec![], &self.atom_table) }

        fn flips_fluent(&self) -> Rc<Fluent> { Fluent::make(self.flips, vec![], &self.fluent_table) }
    }

    fn ratio(num: i64, den: i64) -> Rational { Rational::new(num, den).unwrap() }

    #[test]
    fn test_constructor_folding() {
        let fix: Fixture = Fixture::new();
        let add: Rc<Effect> = Effect::add(fix.heads_atom());

        assert!(matches!(Effect::and(&Effect::empty(), &add).as_ref(), Effect::Add(_)));
        assert!(matches!(Effect::and(&add, &Effect::empty()).as_ref(), Effect::Add(_)));
        assert!(matches!(Effect::conditional(&Formula::constant(true), &add).as_ref(), Effect::Add(_)));
        assert!(matches!(Effect::conditional(&Formula::constant(false), &add).as_ref(), Effect::Empty));
        assert!(matches!(Effect::conditional(&Formula::atom(fix.heads_atom()), &Effect::empty()).as_ref(), Effect::Empty));
        assert!(matches!(Effect::quantified(vec![], &add).as_ref(), Effect::Add(_)));

        // Identity updates fold to the no-op
        let one: Rc<Expression> = Expression::value(Rational::ONE);
        let zero: Rc<Expression> = Expression::value(Rational::ZERO);
        assert!(matches!(Effect::update(UpdateKind::ScaleUp, fix.flips_fluent(), one.clone()).as_ref(), Effect::Empty));
        assert!(matches!(Effect::update(UpdateKind::Increase, fix.flips_fluent(), zero).as_ref(), Effect::Empty));
        assert!(matches!(Effect::update(UpdateKind::Assign, fix.flips_fluent(), one).as_ref(), Effect::Update(_)));
    }

    #[test]
    fn test_probabilistic_normalization() {
        let fix: Fixture = Fixture::new();
        let add: Rc<Effect> = Effect::add(fix.heads_atom());
        let delete: Rc<Effect> = Effect::delete(fix.heads_atom());

        // Zero weights and no-op outcomes are dropped
        let effect: Rc<Effect> = Effect::probabilistic(vec![(ratio(1, 2), add.clone()), (Rational::ZERO, delete.clone()), (ratio(1, 4), Effect::empty())]).unwrap();
        match effect.as_ref() {
            Effect::Probabilistic(outcomes) => assert_eq!(outcomes.len(), 1),
            other => panic!("expected a probabilistic effect, got {other:?}"),
        }

        // Nested probabilistic effects flatten with multiplied weights
        let inner: Rc<Effect> = Effect::probabilistic(vec![(ratio(1, 2), add.clone()), (ratio(1, 2), delete.clone())]).unwrap();
        let outer: Rc<Effect> = Effect::probabilistic(vec![(ratio(1, 2), inner)]).unwrap();
        match outer.as_ref() {
            Effect::Probabilistic(outcomes) => {
                assert_eq!(outcomes.len(), 2);
                assert_eq!(outcomes[0].0, ratio(1, 4));
                assert_eq!(outcomes[1].0, ratio(1, 4));
            },
            other => panic!("expected a probabilistic effect, got {other:?}"),
        }

        // Overweight outcome lists are rejected
        assert!(matches!(Effect::probabilistic(vec![(ratio(3, 4), add), (ratio(1, 2), delete)]), Err(Error::InconsistentEffect(_))));
    }

    #[test]
    fn test_update_affect() {
        let fix: Fixture = Fixture::new();
        let names: Names = fix.names();
        let flips: Rc<Fluent> = fix.flips_fluent();
        let mut values: ValueMap = fix.values.clone();

        Update::new(UpdateKind::Assign, flips.clone(), Expression::value(Rational::from(6))).affect(&mut values, &names).unwrap();
        assert_eq!(values.get(&flips), Some(&Rational::from(6)));
        Update::new(UpdateKind::Increase, flips.clone(), Expression::value(Rational::from(2))).affect(&mut values, &names).unwrap();
        assert_eq!(values.get(&flips), Some(&Rational::from(8)));
        Update::new(UpdateKind::ScaleDown, flips.clone(), Expression::value(Rational::from(4))).affect(&mut values, &names).unwrap();
        assert_eq!(values.get(&flips), Some(&Rational::from(2)));
        assert!(matches!(
            Update::new(UpdateKind::ScaleDown, flips.clone(), Expression::value(Rational::ZERO)).affect(&mut values, &names),
            Err(Error::DivisionByZero)
        ));

        // Non-assign updates require a prior value
        let mut empty: ValueMap = ValueMap::new();
        assert!(matches!(Update::new(UpdateKind::Increase, flips, Expression::value(Rational::ONE)).affect(&mut empty, &names), Err(Error::UndefinedValue(_))));
    }

    #[test]
    fn test_state_change_conditional() {
        let fix: Fixture = Fixture::new();
        let env: Env = fix.env();
        let mut rng: StdRng = StdRng::seed_from_u64(42);

        // `heads` does not hold, so only the else-free condition misses
        let effect: Rc<Effect> = Effect::and(
            &Effect::conditional(&Formula::atom(fix.heads_atom()), &Effect::delete(fix.heads_atom())),
            &Effect::conditional(&Formula::negation(&Formula::atom(fix.heads_atom())), &Effect::add(fix.heads_atom())),
        );
        let (mut adds, mut deletes, mut updates) = (Vec::new(), Vec::new(), Vec::new());
        effect.state_change(&mut adds, &mut deletes, &mut updates, &env, &mut rng).unwrap();
        assert_eq!(adds.len(), 1);
        assert!(deletes.is_empty());
        assert!(updates.is_empty());
    }

    #[test]
    fn test_state_change_probabilistic_is_seed_deterministic() {
        let fix: Fixture = Fixture::new();
        let env: Env = fix.env();
        let effect: Rc<Effect> =
            Effect::probabilistic(vec![(ratio(1, 2), Effect::add(fix.heads_atom())), (ratio(1, 2), Effect::delete(fix.heads_atom()))]).unwrap();

        let sample = |seed: u64| -> (usize, usize) {
            let mut rng: StdRng = StdRng::seed_from_u64(seed);
            let (mut adds, mut deletes, mut updates) = (Vec::new(), Vec::new(), Vec::new());
            effect.state_change(&mut adds, &mut deletes, &mut updates, &env, &mut rng).unwrap();
            (adds.len(), deletes.len())
        };
        assert_eq!(sample(42), sample(42));
        assert_eq!(sample(123), sample(123));
    }

    #[test]
    fn test_state_change_probabilistic_frequencies() {
        let fix: Fixture = Fixture::new();
        let env: Env = fix.env();
        let effect: Rc<Effect> =
            Effect::probabilistic(vec![(ratio(1, 4), Effect::add(fix.heads_atom())), (ratio(1, 2), Effect::delete(fix.heads_atom()))]).unwrap();

        let mut rng: StdRng = StdRng::seed_from_u64(42);
        let (mut n_add, mut n_delete, mut n_noop) = (0usize, 0usize, 0usize);
        for _ in 0..10_000 {
            let (mut adds, mut deletes, mut updates) = (Vec::new(), Vec::new(), Vec::new());
            effect.state_change(&mut adds, &mut deletes, &mut updates, &env, &mut rng).unwrap();
            match (adds.len(), deletes.len()) {
                (1, 0) => n_add += 1,
                (0, 1) => n_delete += 1,
                (0, 0) => n_noop += 1,
                counts => panic!("expected exactly one outcome, got {counts:?}"),
            }
        }
        // Expected 2500 / 5000 / 2500, with generous slack
        assert!((2000..3000).contains(&n_add), "add sampled {n_add} times");
        assert!((4500..5500).contains(&n_delete), "delete sampled {n_delete} times");
        assert!((2000..3000).contains(&n_noop), "no-op sampled {n_noop} times");
    }

    #[test]
    fn test_instantiation_idempotent() {
        let fix: Fixture = Fixture::new();
        let env: Env = fix.env();
        let effect: Rc<Effect> = Effect::and(
            &Effect::add(fix.heads_atom()),
            &Effect::update(UpdateKind::Increase, fix.flips_fluent(), Expression::value(Rational::ONE)),
        );
        let inst: Rc<Effect> = Effect::instantiation(&effect, &Substitution::new(), &env).unwrap();
        assert!(Rc::ptr_eq(&effect, &inst));
    }

    #[test]
    fn test_quantified_expansion() {
        let mut types: TypeTable = TypeTable::new();
        let city: Type = types.add_type("city");
        let mut predicates: PredicateTable = PredicateTable::new();
        let visited: Predicate = predicates.add_predicate("visited");
        predicates.add_parameter(visited, city);
        predicates.make_dynamic(visited);
        let functions: FunctionTable = FunctionTable::new();
        let mut base: TermTable = TermTable::new();
        base.add_object("rome", city);
        base.add_object("pisa", city);
        let mut terms: TermTable = TermTable::with_parent(&base);
        let var: Variable = terms.add_variable(city);

        let atom_table: AtomTable = AtomTable::new();
        let fluent_table: FluentTable = FluentTable::new();
        let atoms: AtomSet = AtomSet::new();
        let values: ValueMap = ValueMap::new();
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let env: Env = Env::new(names, &atom_table, &fluent_table, &atoms, &values, false);

        let body: Rc<Effect> = Effect::add(Atom::make(visited, vec![var.into()], &atom_table));
        let effect: Rc<Effect> = Effect::quantified(vec![var], &body);
        let inst: Rc<Effect> = Effect::instantiation(&effect, &Substitution::new(), &env).unwrap();
        match inst.as_ref() {
            Effect::Conjunction(es) => {
                assert_eq!(es.len(), 2);
                assert!(es.iter().all(|e| matches!(e.as_ref(), Effect::Add(atom) if atom.is_ground())));
            },
            other => panic!("expected a conjunction over both cities, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let fix: Fixture = Fixture::new();
        let names: Names = fix.names();
        let effect: Rc<Effect> = Effect::probabilistic(vec![
            (ratio(1, 2), Effect::add(fix.heads_atom())),
            (ratio(1, 2), Effect::update(UpdateKind::Increase, fix.flips_fluent(), Expression::value(Rational::ONE))),
        ])
        .unwrap();
        assert_eq!(effect.display(&names).to_string(), "(probabilistic 1/2 (heads) 1/2 (increase (flips) 1))");
    }
}
