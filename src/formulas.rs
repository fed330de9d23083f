//  FORMULAS.rs
//    by Lut99
//
//  Created:
//    19 Mar 2025, 13:05:12
//  Last edited:
//    16 Jul 2025, 09:58:41
//  Auto updated?
//    Yes
//
//  Description:
//!   Boolean state formulas.
//!
//!   Fully-ground [`Atom`]s are hash-consed through the [`AtomTable`]. The
//!   [`Formula::Constant`] variants are the short-circuit sentinels of the whole system:
//!   the smart constructors guarantee that every simplification path that proves a
//!   tautology or contradiction yields them, which is what makes precondition pruning
//!   during grounding sound.
//

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use itertools::Itertools as _;

use crate::env::{Env, Names};
use crate::errors::{Error, Result};
use crate::expressions::Expression;
use crate::rational::Rational;
use crate::symbols::{Object, Predicate, Substitution, Term, Variable};


/***** LIBRARY *****/
/// The set of atoms that hold in a state, ordered for deterministic iteration.
pub type AtomSet = BTreeSet<Rc<Atom>>;



/// An application of a [`Predicate`] to a list of terms.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Atom {
    /// The predicate applied.
    predicate: Predicate,
    /// The terms it is applied to.
    terms: Vec<Term>,
}

// Constructors
impl Atom {
    /// Returns an atom with the given predicate and terms.
    ///
    /// If all terms are objects, the atom is interned in the given table: structurally
    /// identical constructions return the same shared node.
    pub fn make(predicate: Predicate, terms: Vec<Term>, table: &AtomTable) -> Rc<Self> {
        if terms.iter().all(Term::is_object) { table.get_or_intern(predicate, terms) } else { Rc::new(Self { predicate, terms }) }
    }
}

// Accessors
impl Atom {
    /// Returns the predicate applied by this atom.
    #[inline]
    pub fn predicate(&self) -> Predicate { self.predicate }

    /// Returns the terms the predicate is applied to.
    #[inline]
    pub fn terms(&self) -> &[Term] { &self.terms }

    /// Returns whether this atom is free of variables.
    #[inline]
    pub fn is_ground(&self) -> bool { self.terms.iter().all(Term::is_object) }
}

// Grounding
impl Atom {
    /// Returns this atom subject to the given substitution.
    ///
    /// # Returns
    /// The substituted (and, when ground, interned) atom, or a clone of `this` if no term
    /// changed.
    pub fn substitution(this: &Rc<Self>, subst: &Substitution, table: &AtomTable) -> Rc<Self> {
        let mut substituted: bool = false;
        let terms: Vec<Term> = this
            .terms
            .iter()
            .map(|term| match term.as_variable().and_then(|var| subst.get(&var)) {
                Some(object) => {
                    substituted = true;
                    Term::Object(*object)
                },
                None => *term,
            })
            .collect();
        if substituted { Self::make(this.predicate, terms, table) } else { this.clone() }
    }
}

// Formatting
impl Atom {
    /// Returns a formatter that writes this atom as `(predicate term...)`.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayAtom { atom: self, names: *names } }

    /// Returns a formatter that writes this atom's XML form,
    /// `<atom><predicate>p</predicate><term>t</term>...</atom>`.
    #[inline]
    pub fn xml<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { XmlAtom { atom: self, names: *names } }
}



/// Interning table for ground [`Atom`]s.
///
/// Holds a strong reference to every interned atom for the table's lifetime.
#[derive(Debug, Default)]
pub struct AtomTable {
    /// The interned atoms, keyed by structural content.
    atoms: RefCell<BTreeMap<(Predicate, Vec<Term>), Rc<Atom>>>,
}
impl AtomTable {
    /// Constructs an empty atom table.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Returns the canonical node for the given ground application, interning it first if
    /// it is new.
    pub fn get_or_intern(&self, predicate: Predicate, terms: Vec<Term>) -> Rc<Atom> {
        if let Some(atom) = self.atoms.borrow().get(&(predicate, terms.clone())) {
            return atom.clone();
        }
        let atom: Rc<Atom> = Rc::new(Atom { predicate, terms: terms.clone() });
        self.atoms.borrow_mut().insert((predicate, terms), atom.clone());
        atom
    }
}



/// The five numeric comparison kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComparisonOp {
    /// Strictly less than.
    Less,
    /// Less than or equal.
    LessEq,
    /// Numerically equal.
    Equal,
    /// Greater than or equal.
    GreaterEq,
    /// Strictly greater than.
    Greater,
}
impl ComparisonOp {
    /// Returns the prefix symbol of this comparison.
    #[inline]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Equal => "=",
            Self::GreaterEq => ">=",
            Self::Greater => ">",
        }
    }

    /// Applies this comparison to two values.
    #[inline]
    pub fn test(&self, v1: Rational, v2: Rational) -> bool {
        match self {
            Self::Less => v1 < v2,
            Self::LessEq => v1 <= v2,
            Self::Equal => v1 == v2,
            Self::GreaterEq => v1 >= v2,
            Self::Greater => v1 > v2,
        }
    }
}



/// A boolean formula over a state.
#[derive(Clone, Debug)]
pub enum Formula {
    /// The constant sentinels; `Constant(true)` is the tautology, `Constant(false)` the
    /// contradiction.
    Constant(bool),
    /// An atom, holding iff it is in the state's atom set.
    Atom(Rc<Atom>),
    /// Equality of two terms.
    Equality(Term, Term),
    /// A numeric comparison of two expressions.
    Comparison(ComparisonOp, Rc<Expression>, Rc<Expression>),
    /// The negation of a formula.
    Negation(Rc<Formula>),
    /// A conjunction of two or more formulas.
    Conjunction(Vec<Rc<Formula>>),
    /// A disjunction of two or more formulas.
    Disjunction(Vec<Rc<Formula>>),
    /// Existential quantification over typed parameters.
    Exists(Vec<Variable>, Rc<Formula>),
    /// Universal quantification over typed parameters.
    Forall(Vec<Variable>, Rc<Formula>),
}

// Constructors
impl Formula {
    /// Returns a constant formula.
    #[inline]
    pub fn constant(value: bool) -> Rc<Self> { Rc::new(Self::Constant(value)) }

    /// Returns an atom formula.
    #[inline]
    pub fn atom(atom: Rc<Atom>) -> Rc<Self> { Rc::new(Self::Atom(atom)) }

    /// Returns an equality over two terms, folded where decidable.
    ///
    /// Identical terms are a tautology; two distinct objects are a contradiction.
    pub fn equality(term1: Term, term2: Term) -> Rc<Self> {
        if term1 == term2 {
            Self::constant(true)
        } else if term1.is_object() && term2.is_object() {
            Self::constant(false)
        } else {
            Rc::new(Self::Equality(term1, term2))
        }
    }

    /// Returns a comparison over two expressions, folded if both are constants.
    pub fn comparison(op: ComparisonOp, expr1: &Rc<Expression>, expr2: &Rc<Expression>) -> Rc<Self> {
        if let (Expression::Value(v1), Expression::Value(v2)) = (expr1.as_ref(), expr2.as_ref()) {
            return Self::constant(op.test(*v1, *v2));
        }
        Rc::new(Self::Comparison(op, expr1.clone(), expr2.clone()))
    }

    /// Returns the negation of the given formula, flipping constants.
    pub fn negation(formula: &Rc<Self>) -> Rc<Self> {
        match formula.as_ref() {
            Self::Constant(value) => Self::constant(!value),
            _ => Rc::new(Self::Negation(formula.clone())),
        }
    }

    /// Returns the conjunction of the two formulas.
    ///
    /// Contradictions and tautologies short-circuit, identical operands collapse, and
    /// nested conjunctions are flattened.
    pub fn and(f1: &Rc<Self>, f2: &Rc<Self>) -> Rc<Self> {
        if f1.contradiction() {
            return f1.clone();
        }
        if f2.contradiction() {
            return f2.clone();
        }
        if f1.tautology() {
            return f2.clone();
        }
        if f2.tautology() {
            return f1.clone();
        }
        if Rc::ptr_eq(f1, f2) {
            return f1.clone();
        }
        let mut conjuncts: Vec<Rc<Self>> = Vec::new();
        for f in [f1, f2] {
            match f.as_ref() {
                Self::Conjunction(fs) => conjuncts.extend(fs.iter().cloned()),
                _ => conjuncts.push(f.clone()),
            }
        }
        Rc::new(Self::Conjunction(conjuncts))
    }

    /// Returns the disjunction of the two formulas, dual to [`Formula::and`].
    pub fn or(f1: &Rc<Self>, f2: &Rc<Self>) -> Rc<Self> {
        if f1.tautology() {
            return f1.clone();
        }
        if f2.tautology() {
            return f2.clone();
        }
        if f1.contradiction() {
            return f2.clone();
        }
        if f2.contradiction() {
            return f1.clone();
        }
        if Rc::ptr_eq(f1, f2) {
            return f1.clone();
        }
        let mut disjuncts: Vec<Rc<Self>> = Vec::new();
        for f in [f1, f2] {
            match f.as_ref() {
                Self::Disjunction(fs) => disjuncts.extend(fs.iter().cloned()),
                _ => disjuncts.push(f.clone()),
            }
        }
        Rc::new(Self::Disjunction(disjuncts))
    }

    /// Returns an existential quantification, degenerating to the body when the parameter
    /// list is empty or the body is constant.
    pub fn exists(parameters: Vec<Variable>, body: &Rc<Self>) -> Rc<Self> {
        if parameters.is_empty() || matches!(body.as_ref(), Self::Constant(_)) { body.clone() } else { Rc::new(Self::Exists(parameters, body.clone())) }
    }

    /// Returns a universal quantification, degenerating to the body when the parameter
    /// list is empty or the body is constant.
    pub fn forall(parameters: Vec<Variable>, body: &Rc<Self>) -> Rc<Self> {
        if parameters.is_empty() || matches!(body.as_ref(), Self::Constant(_)) { body.clone() } else { Rc::new(Self::Forall(parameters, body.clone())) }
    }
}

// Sentinel tests
impl Formula {
    /// Returns whether this formula is the constant-true sentinel.
    #[inline]
    pub fn tautology(&self) -> bool { matches!(self, Self::Constant(true)) }

    /// Returns whether this formula is the constant-false sentinel.
    #[inline]
    pub fn contradiction(&self) -> bool { matches!(self, Self::Constant(false)) }
}

// Evaluation
impl Formula {
    /// Tests whether this (ground) formula holds in the environment's atoms and values.
    ///
    /// # Errors
    /// Fails with [`Error::UnsupportedConstruct`] on an equality over unbound terms (the
    /// constructors fold every decidable equality away), or with the errors of numeric
    /// evaluation.
    pub fn holds(this: &Rc<Self>, env: &Env) -> Result<bool> {
        match this.as_ref() {
            Self::Constant(value) => Ok(*value),
            Self::Atom(atom) => Ok(env.atoms.contains(atom)),
            Self::Equality(..) => Err(Error::UnsupportedConstruct(this.display(&env.names).to_string())),
            Self::Comparison(op, e1, e2) => Ok(op.test(e1.evaluate(env.values, &env.names)?, e2.evaluate(env.values, &env.names)?)),
            Self::Negation(f) => Ok(!Self::holds(f, env)?),
            Self::Conjunction(fs) => {
                for f in fs {
                    if !Self::holds(f, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            Self::Disjunction(fs) => {
                for f in fs {
                    if Self::holds(f, env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            },
            Self::Exists(..) | Self::Forall(..) => {
                // Quantifiers are tested by expanding them against the concrete state.
                let env: Env = Env { state: true, ..*env };
                Ok(Self::instantiation(this, &Substitution::new(), &env)?.tautology())
            },
        }
    }

    /// Returns an instantiation of this formula under the given substitution.
    ///
    /// Ground atoms of static predicates (and, when `env.state` is set, of dynamic ones
    /// too) fold to the sentinels by membership in `env.atoms`; quantifiers are expanded
    /// over the type-compatible objects with early exit on a decided prefix. If nothing
    /// changes, the returned node is reference-equal to `this`.
    pub fn instantiation(this: &Rc<Self>, subst: &Substitution, env: &Env) -> Result<Rc<Self>> {
        match this.as_ref() {
            Self::Constant(_) => Ok(this.clone()),
            Self::Atom(atom) => {
                let inst: Rc<Atom> = Atom::substitution(atom, subst, env.atom_table);
                if (env.state || env.names.predicates.is_static(inst.predicate())) && inst.is_ground() {
                    Ok(Self::constant(env.atoms.contains(&inst)))
                } else if Rc::ptr_eq(&inst, atom) {
                    Ok(this.clone())
                } else {
                    Ok(Self::atom(inst))
                }
            },
            Self::Equality(term1, term2) => {
                let r1: Term = resolve(*term1, subst);
                let r2: Term = resolve(*term2, subst);
                if r1 == *term1 && r2 == *term2 { Ok(this.clone()) } else { Ok(Self::equality(r1, r2)) }
            },
            Self::Comparison(op, e1, e2) => {
                let i1: Rc<Expression> = Expression::instantiation(e1, subst, env)?;
                let i2: Rc<Expression> = Expression::instantiation(e2, subst, env)?;
                if Rc::ptr_eq(&i1, e1) && Rc::ptr_eq(&i2, e2) { Ok(this.clone()) } else { Ok(Self::comparison(*op, &i1, &i2)) }
            },
            Self::Negation(f) => {
                let i: Rc<Self> = Self::instantiation(f, subst, env)?;
                if Rc::ptr_eq(&i, f) { Ok(this.clone()) } else { Ok(Self::negation(&i)) }
            },
            Self::Conjunction(fs) => {
                let mut unchanged: bool = true;
                let mut result: Rc<Self> = Self::constant(true);
                for f in fs {
                    let i: Rc<Self> = Self::instantiation(f, subst, env)?;
                    unchanged &= Rc::ptr_eq(&i, f);
                    result = Self::and(&result, &i);
                    if result.contradiction() {
                        return Ok(result);
                    }
                }
                if unchanged { Ok(this.clone()) } else { Ok(result) }
            },
            Self::Disjunction(fs) => {
                let mut unchanged: bool = true;
                let mut result: Rc<Self> = Self::constant(false);
                for f in fs {
                    let i: Rc<Self> = Self::instantiation(f, subst, env)?;
                    unchanged &= Rc::ptr_eq(&i, f);
                    result = Self::or(&result, &i);
                    if result.tautology() {
                        return Ok(result);
                    }
                }
                if unchanged { Ok(this.clone()) } else { Ok(result) }
            },
            Self::Exists(parameters, body) => {
                let mut args: Substitution = subst.clone();
                expand_exists(parameters, 0, &mut args, body, env)
            },
            Self::Forall(parameters, body) => {
                let mut args: Substitution = subst.clone();
                expand_forall(parameters, 0, &mut args, body, env)
            },
        }
    }
}

// Formatting
impl Formula {
    /// Returns a formatter that writes this formula in prefix notation.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayFormula { formula: self, names: *names } }
}



/***** HELPER FUNCTIONS *****/
/// Applies a substitution to a single term.
#[inline]
fn resolve(term: Term, subst: &Substitution) -> Term {
    match term.as_variable().and_then(|var| subst.get(&var)) {
        Some(object) => Term::Object(*object),
        None => term,
    }
}

/// Expands an existential quantifier over the compatible objects of its parameters,
/// disjoining per-binding instantiations with early exit on a tautology.
///
/// No compatible objects for some parameter makes the whole formula a contradiction.
fn expand_exists(parameters: &[Variable], i: usize, args: &mut Substitution, body: &Rc<Formula>, env: &Env) -> Result<Rc<Formula>> {
    if i == parameters.len() {
        return Formula::instantiation(body, args, env);
    }
    let objects: Rc<Vec<Object>> = env.names.terms.compatible_objects(env.names.types, env.names.terms.type_of(Term::Variable(parameters[i])));
    let mut result: Rc<Formula> = Formula::constant(false);
    for object in objects.iter() {
        args.insert(parameters[i], *object);
        let inst: Rc<Formula> = expand_exists(parameters, i + 1, args, body, env)?;
        result = Formula::or(&result, &inst);
        if result.tautology() {
            break;
        }
    }
    args.remove(&parameters[i]);
    Ok(result)
}

/// Expands a universal quantifier over the compatible objects of its parameters,
/// conjoining per-binding instantiations with early exit on a contradiction.
///
/// No compatible objects for some parameter makes the whole formula a tautology.
fn expand_forall(parameters: &[Variable], i: usize, args: &mut Substitution, body: &Rc<Formula>, env: &Env) -> Result<Rc<Formula>> {
    if i == parameters.len() {
        return Formula::instantiation(body, args, env);
    }
    let objects: Rc<Vec<Object>> = env.names.terms.compatible_objects(env.names.types, env.names.terms.type_of(Term::Variable(parameters[i])));
    let mut result: Rc<Formula> = Formula::constant(true);
    for object in objects.iter() {
        args.insert(parameters[i], *object);
        let inst: Rc<Formula> = expand_forall(parameters, i + 1, args, body, env)?;
        result = Formula::and(&result, &inst);
        if result.contradiction() {
            break;
        }
    }
    args.remove(&parameters[i]);
    Ok(result)
}



/***** FORMATTERS *****/
/// Formats an [`Atom`] as `(predicate term...)`.
struct DisplayAtom<'a> {
    atom:  &'a Atom,
    names: Names<'a>,
}
impl<'a> Display for DisplayAtom<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "({}", self.names.predicates.name_of(self.atom.predicate))?;
        for term in &self.atom.terms {
            write!(f, " {}", term.display(self.names.terms))?;
        }
        write!(f, ")")
    }
}

/// Formats an [`Atom`] in its XML form.
struct XmlAtom<'a> {
    atom:  &'a Atom,
    names: Names<'a>,
}
impl<'a> Display for XmlAtom<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "<atom><predicate>{}</predicate>", self.names.predicates.name_of(self.atom.predicate))?;
        for term in &self.atom.terms {
            write!(f, "<term>{}</term>", term.display(self.names.terms))?;
        }
        write!(f, "</atom>")
    }
}

/// Formats a [`Formula`] in prefix notation.
struct DisplayFormula<'a> {
    formula: &'a Formula,
    names:   Names<'a>,
}
impl<'a> Display for DisplayFormula<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self.formula {
            Formula::Constant(value) => write!(f, "{}", if *value { "true" } else { "false" }),
            Formula::Atom(atom) => write!(f, "{}", atom.display(&self.names)),
            Formula::Equality(t1, t2) => write!(f, "(= {} {})", t1.display(self.names.terms), t2.display(self.names.terms)),
            Formula::Comparison(op, e1, e2) => write!(f, "({} {} {})", op.symbol(), e1.display(&self.names), e2.display(&self.names)),
            Formula::Negation(formula) => write!(f, "(not {})", formula.display(&self.names)),
            Formula::Conjunction(fs) => write!(f, "(and {})", fs.iter().map(|formula| formula.display(&self.names)).join(" ")),
            Formula::Disjunction(fs) => write!(f, "(or {})", fs.iter().map(|formula| formula.display(&self.names)).join(" ")),
            Formula::Exists(vars, body) => {
                write!(f, "(exists ({}) {})", vars.iter().map(|var| format!("{}", Term::Variable(*var).display(self.names.terms))).join(" "), body.display(&self.names))
            },
            Formula::Forall(vars, body) => {
                write!(f, "(forall ({}) {})", vars.iter().map(|var| format!("{}", Term::Variable(*var).display(self.names.terms))).join(" "), body.display(&self.names))
            },
        }
    }
}





/***** TESTS *****/
