//  EXPRESSIONS.rs
//    by Lut99
//
//  Created:
//    19 Mar 2025, 09:12:40
//  Last edited:
//    11 Jul 2025, 10:34:27
//  Auto updated?
//    Yes
//
//  Description:
//!   Numeric expressions over fluents.
//!
//!   Fully-ground [`Fluent`]s are hash-consed through the [`FluentTable`]: two
//!   constructions with the same function and terms yield the same shared node. Fluent
//!   values live in an external [`ValueMap`], never in the node itself.
//!
//!   The arithmetic constructors fold constants eagerly, so a ground expression over
//!   static fluents collapses to a single [`Value`](Expression::Value) at grounding time.
//

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FResult};
use std::rc::Rc;

use crate::env::{Env, Names};
use crate::errors::{Error, Result};
use crate::rational::Rational;
use crate::symbols::{Function, Substitution, Term};


/***** LIBRARY *****/
/// A map from (ground) fluents to their current values.
pub type ValueMap = BTreeMap<Rc<Fluent>, Rational>;



/// An application of a [`Function`] to a list of terms: a named numeric state variable.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Fluent {
    /// The function applied.
    function: Function,
    /// The terms it is applied to.
    terms: Vec<Term>,
}

// Constructors
impl Fluent {
    /// Returns a fluent with the given function and terms.
    ///
    /// If all terms are objects, the fluent is interned in the given table: structurally
    /// identical constructions return the same shared node.
    pub fn make(function: Function, terms: Vec<Term>, table: &FluentTable) -> Rc<Self> {
        if terms.iter().all(Term::is_object) { table.get_or_intern(function, terms) } else { Rc::new(Self { function, terms }) }
    }
}

// Accessors
impl Fluent {
    /// Returns the function applied by this fluent.
    #[inline]
    pub fn function(&self) -> Function { self.function }

    /// Returns the terms the function is applied to.
    #[inline]
    pub fn terms(&self) -> &[Term] { &self.terms }

    /// Returns whether this fluent is free of variables.
    #[inline]
    pub fn is_ground(&self) -> bool { self.terms.iter().all(Term::is_object) }
}

// Grounding
impl Fluent {
    /// Returns this fluent subject to the given substitution.
    ///
    /// # Returns
    /// The substituted (and, when ground, interned) fluent, or a clone of `this` if no
    /// term changed.
    pub fn substitution(this: &Rc<Self>, subst: &Substitution, table: &FluentTable) -> Rc<Self> {
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
        if substituted { Self::make(this.function, terms, table) } else { this.clone() }
    }
}

// Formatting
impl Fluent {
    /// Returns a formatter that writes this fluent as `(function term...)`.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayFluent { fluent: self, names: *names } }

    /// Returns a formatter that writes this fluent's XML form,
    /// `<function>f</function><term>t</term>...`.
    #[inline]
    pub fn xml<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { XmlFluent { fluent: self, names: *names } }
}



/// Interning table for ground [`Fluent`]s.
///
/// Holds a strong reference to every interned fluent for the table's lifetime.
#[derive(Debug, Default)]
pub struct FluentTable {
    /// The interned fluents, keyed by structural content.
    fluents: RefCell<BTreeMap<(Function, Vec<Term>), Rc<Fluent>>>,
}
impl FluentTable {
    /// Constructs an empty fluent table.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Returns the canonical node for the given ground application, interning it first if
    /// it is new.
    pub fn get_or_intern(&self, function: Function, terms: Vec<Term>) -> Rc<Fluent> {
        if let Some(fluent) = self.fluents.borrow().get(&(function, terms.clone())) {
            return fluent.clone();
        }
        let fluent: Rc<Fluent> = Rc::new(Fluent { function, terms: terms.clone() });
        self.fluents.borrow_mut().insert((function, terms), fluent.clone());
        fluent
    }
}



/// A numeric expression over fluents.
#[derive(Clone, Debug)]
pub enum Expression {
    /// A constant value.
    Value(Rational),
    /// A reference to a fluent, resolved against a [`ValueMap`].
    Fluent(Rc<Fluent>),
    /// The sum of two subexpressions.
    Addition(Rc<Expression>, Rc<Expression>),
    /// The difference of two subexpressions.
    Subtraction(Rc<Expression>, Rc<Expression>),
    /// The product of two subexpressions.
    Multiplication(Rc<Expression>, Rc<Expression>),
    /// The quotient of two subexpressions.
    Division(Rc<Expression>, Rc<Expression>),
}

// Constructors
impl Expression {
    /// Returns a constant expression.
    #[inline]
    pub fn value(value: Rational) -> Rc<Self> { Rc::new(Self::Value(value)) }

    /// Returns a fluent-reference expression.
    #[inline]
    pub fn fluent(fluent: Rc<Fluent>) -> Rc<Self> { Rc::new(Self::Fluent(fluent)) }

    /// Returns the sum of the two expressions, folding constants.
    pub fn addition(term1: &Rc<Self>, term2: &Rc<Self>) -> Rc<Self> {
        if let (Self::Value(v1), Self::Value(v2)) = (term1.as_ref(), term2.as_ref()) {
            return Self::value(*v1 + *v2);
        }
        Rc::new(Self::Addition(term1.clone(), term2.clone()))
    }

    /// Returns the difference of the two expressions, folding constants.
    pub fn subtraction(term1: &Rc<Self>, term2: &Rc<Self>) -> Rc<Self> {
        if let (Self::Value(v1), Self::Value(v2)) = (term1.as_ref(), term2.as_ref()) {
            return Self::value(*v1 - *v2);
        }
        Rc::new(Self::Subtraction(term1.clone(), term2.clone()))
    }

    /// Returns the product of the two expressions, folding constants.
    pub fn multiplication(factor1: &Rc<Self>, factor2: &Rc<Self>) -> Rc<Self> {
        if let (Self::Value(v1), Self::Value(v2)) = (factor1.as_ref(), factor2.as_ref()) {
            return Self::value(*v1 * *v2);
        }
        Rc::new(Self::Multiplication(factor1.clone(), factor2.clone()))
    }

    /// Returns the quotient of the two expressions, folding constants.
    ///
    /// # Errors
    /// Fails with [`Error::DivisionByZero`] if both operands are constants and the divisor
    /// is zero.
    pub fn division(factor1: &Rc<Self>, factor2: &Rc<Self>) -> Result<Rc<Self>> {
        if let (Self::Value(v1), Self::Value(v2)) = (factor1.as_ref(), factor2.as_ref()) {
            return Ok(Self::value(v1.checked_div(*v2)?));
        }
        Ok(Rc::new(Self::Division(factor1.clone(), factor2.clone())))
    }
}

// Evaluation
impl Expression {
    /// Evaluates this expression against the given fluent values.
    ///
    /// # Errors
    /// Fails with [`Error::UndefinedValue`] if a referenced fluent has no value, or
    /// [`Error::DivisionByZero`] on a zero divisor.
    pub fn evaluate(&self, values: &ValueMap, names: &Names) -> Result<Rational> {
        match self {
            Self::Value(value) => Ok(*value),
            Self::Fluent(fluent) => match values.get(fluent.as_ref()) {
                Some(value) => Ok(*value),
                None => Err(Error::UndefinedValue(fluent.display(names).to_string())),
            },
            Self::Addition(e1, e2) => Ok(e1.evaluate(values, names)? + e2.evaluate(values, names)?),
            Self::Subtraction(e1, e2) => Ok(e1.evaluate(values, names)? - e2.evaluate(values, names)?),
            Self::Multiplication(e1, e2) => Ok(e1.evaluate(values, names)? * e2.evaluate(values, names)?),
            Self::Division(e1, e2) => e1.evaluate(values, names)?.checked_div(e2.evaluate(values, names)?),
        }
    }

    /// Returns an instantiation of this expression under the given substitution.
    ///
    /// Static ground fluents are folded into their (initial, hence permanent) values;
    /// arithmetic over constants is folded by the constructors. If nothing changes, the
    /// returned node is reference-equal to `this`.
    ///
    /// # Errors
    /// Fails with [`Error::UndefinedValue`] if a static fluent has no declared value, or
    /// [`Error::DivisionByZero`] if folding divides by a constant zero.
    pub fn instantiation(this: &Rc<Self>, subst: &Substitution, env: &Env) -> Result<Rc<Self>> {
        match this.as_ref() {
            Self::Value(_) => Ok(this.clone()),
            Self::Fluent(fluent) => {
                let inst: Rc<Fluent> = Fluent::substitution(fluent, subst, env.fluent_table);
                if env.names.functions.is_static(inst.function()) && inst.is_ground() {
                    match env.values.get(inst.as_ref()) {
                        Some(value) => Ok(Self::value(*value)),
                        None => Err(Error::UndefinedValue(inst.display(&env.names).to_string())),
                    }
                } else if Rc::ptr_eq(&inst, fluent) {
                    Ok(this.clone())
                } else {
                    Ok(Self::fluent(inst))
                }
            },
            Self::Addition(e1, e2) => {
                let (i1, i2): (Rc<Self>, Rc<Self>) = (Self::instantiation(e1, subst, env)?, Self::instantiation(e2, subst, env)?);
                if Rc::ptr_eq(&i1, e1) && Rc::ptr_eq(&i2, e2) { Ok(this.clone()) } else { Ok(Self::addition(&i1, &i2)) }
            },
            Self::Subtraction(e1, e2) => {
                let (i1, i2): (Rc<Self>, Rc<Self>) = (Self::instantiation(e1, subst, env)?, Self::instantiation(e2, subst, env)?);
                if Rc::ptr_eq(&i1, e1) && Rc::ptr_eq(&i2, e2) { Ok(this.clone()) } else { Ok(Self::subtraction(&i1, &i2)) }
            },
            Self::Multiplication(e1, e2) => {
                let (i1, i2): (Rc<Self>, Rc<Self>) = (Self::instantiation(e1, subst, env)?, Self::instantiation(e2, subst, env)?);
                if Rc::ptr_eq(&i1, e1) && Rc::ptr_eq(&i2, e2) { Ok(this.clone()) } else { Ok(Self::multiplication(&i1, &i2)) }
            },
            Self::Division(e1, e2) => {
                let (i1, i2): (Rc<Self>, Rc<Self>) = (Self::instantiation(e1, subst, env)?, Self::instantiation(e2, subst, env)?);
                if Rc::ptr_eq(&i1, e1) && Rc::ptr_eq(&i2, e2) { Ok(this.clone()) } else { Self::division(&i1, &i2) }
            },
        }
    }
}

// Formatting
impl Expression {
    /// Returns a formatter that writes this expression in prefix notation.
    #[inline]
    pub fn display<'a>(&'a self, names: &'a Names<'a>) -> impl Display + 'a { DisplayExpression { expression: self, names: *names } }
}



/// Formats a [`Fluent`] as `(function term...)`.
struct DisplayFluent<'a> {
    fluent: &'a Fluent,
    names:  Names<'a>,
}
impl<'a> Display for DisplayFluent<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "({}", self.names.functions.name_of(self.fluent.function))?;
        for term in &self.fluent.terms {
            write!(f, " {}", term.display(self.names.terms))?;
        }
        write!(f, ")")
    }
}

/// Formats a [`Fluent`] in its XML form.
struct XmlFluent<'a> {
    fluent: &'a Fluent,
    names:  Names<'a>,
}
impl<'a> Display for XmlFluent<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "<function>{}</function>", self.names.functions.name_of(self.fluent.function))?;
        for term in &self.fluent.terms {
            write!(f, "<term>{}</term>", term.display(self.names.terms))?;
        }
        Ok(())
    }
}

/// Formats an [`Expression`] in prefix notation.
struct DisplayExpression<'a> {
    expression: &'a Expression,
    names: Names<'a>,
}
impl<'a> Display for DisplayExpression<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self.expression {
            Expression::Value(value) => write!(f, "{value}"),
            Expression::Fluent(fluent) => write!(f, "{}", fluent.display(&self.names)),
            Expression::Addition(e1, e2) => write!(f, "(+ {} {})", e1.display(&self.names), e2.display(&self.names)),
            Expression::Subtraction(e1, e2) => write!(f, "(- {} {})", e1.display(&self.names), e2.display(&self.names)),
            Expression::Multiplication(e1, e2) => write!(f, "(* {} {})", e1.display(&self.names), e2.display(&self.names)),
            Expression::Division(e1, e2) => write!(f, "(/ {} {})", e1.display(&self.names), e2.display(&self.names)),
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulas::{AtomSet, AtomTable};
    use crate::symbols::{FunctionTable, Object, PredicateTable, TermTable, Type, TypeTable, Variable};

    /// Builds the tables and a fluent `(fuel rome)` used by the tests below.
    #[allow(clippy::type_complexity)]
    fn setup() -> (TypeTable, PredicateTable, FunctionTable, TermTable<'static>, Function, Object) {
        let mut types: TypeTable = TypeTable::new();
        let city: Type = types.add_type("city");
        let predicates: PredicateTable = PredicateTable::new();
        let mut functions: FunctionTable = FunctionTable::new();
        let fuel: Function = functions.add_function("fuel");
        functions.add_parameter(fuel, city);
        let mut terms: TermTable<'static> = TermTable::new();
        let rome: Object = terms.add_object("rome", city);
        (types, predicates, functions, terms, fuel, rome)
    }

    #[test]
    fn test_fluent_interning() {
        let (_, _, _, _, fuel, rome) = setup();
        let table: FluentTable = FluentTable::new();
        let f1: Rc<Fluent> = Fluent::make(fuel, vec![rome.into()], &table);
        let f2: Rc<Fluent> = Fluent::make(fuel, vec![rome.into()], &table);
        assert!(Rc::ptr_eq(&f1, &f2));

        // Lifted fluents are not interned
        let v1: Rc<Fluent> = Fluent::make(fuel, vec![Variable(0).into()], &table);
        let v2: Rc<Fluent> = Fluent::make(fuel, vec![Variable(0).into()], &table);
        assert!(!Rc::ptr_eq(&v1, &v2));
        assert!(!v1.is_ground());
    }

    #[test]
    fn test_constant_folding() {
        let two: Rc<Expression> = Expression::value(Rational::from(2));
        let three: Rc<Expression> = Expression::value(Rational::from(3));
        assert!(matches!(Expression::addition(&two, &three).as_ref(), Expression::Value(v) if *v == Rational::from(5)));
        assert!(matches!(Expression::subtraction(&two, &three).as_ref(), Expression::Value(v) if *v == Rational::from(-1)));
        assert!(matches!(Expression::multiplication(&two, &three).as_ref(), Expression::Value(v) if *v == Rational::from(6)));
        assert!(
            matches!(Expression::division(&two, &three).unwrap().as_ref(), Expression::Value(v) if *v == Rational::new(2, 3).unwrap())
        );
        assert!(Expression::division(&two, &Expression::value(Rational::ZERO)).is_err());
    }

    #[test]
    fn test_evaluate() {
        let (types, predicates, functions, terms, fuel, rome) = setup();
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let table: FluentTable = FluentTable::new();
        let fluent: Rc<Fluent> = Fluent::make(fuel, vec![rome.into()], &table);

        let mut values: ValueMap = ValueMap::new();
        let expr: Rc<Expression> = Expression::addition(&Expression::fluent(fluent.clone()), &Expression::value(Rational::from(1)));
        assert!(expr.evaluate(&values, &names).is_err());
        values.insert(fluent, Rational::from(4));
        assert_eq!(expr.evaluate(&values, &names).unwrap(), Rational::from(5));
    }

    #[test]
    fn test_instantiation_folds_static_fluents() {
        let (types, predicates, mut functions, mut terms, fuel, rome) = setup();
        let var: Variable = terms.add_variable(types.find_type("city").unwrap());
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let atom_table: AtomTable = AtomTable::new();
        let fluent_table: FluentTable = FluentTable::new();

        let ground: Rc<Fluent> = Fluent::make(fuel, vec![rome.into()], &fluent_table);
        let mut values: ValueMap = ValueMap::new();
        values.insert(ground, Rational::from(7));
        let atoms: AtomSet = AtomSet::new();
        let env: Env = Env::new(names, &atom_table, &fluent_table, &atoms, &values, false);

        let lifted: Rc<Expression> = Expression::fluent(Fluent::make(fuel, vec![var.into()], &fluent_table));
        let mut subst: Substitution = Substitution::new();
        subst.insert(var, rome);

        // Static function: folds into its initial value
        let inst: Rc<Expression> = Expression::instantiation(&lifted, &subst, &env).unwrap();
        assert!(matches!(inst.as_ref(), Expression::Value(v) if *v == Rational::from(7)));

        // Dynamic function: stays a fluent reference
        functions.make_dynamic(fuel);
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let env: Env = Env::new(names, &atom_table, &fluent_table, &atoms, &values, false);
        let inst: Rc<Expression> = Expression::instantiation(&lifted, &subst, &env).unwrap();
        assert!(matches!(inst.as_ref(), Expression::Fluent(fl) if fl.is_ground()));
    }

    #[test]
    fn test_instantiation_idempotent() {
        let (types, predicates, mut functions, terms, fuel, rome) = setup();
        functions.make_dynamic(fuel);
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let atom_table: AtomTable = AtomTable::new();
        let fluent_table: FluentTable = FluentTable::new();
        let values: ValueMap = ValueMap::new();
        let atoms: AtomSet = AtomSet::new();
        let env: Env = Env::new(names, &atom_table, &fluent_table, &atoms, &values, false);

        let expr: Rc<Expression> =
            Expression::addition(&Expression::fluent(Fluent::make(fuel, vec![rome.into()], &fluent_table)), &Expression::value(Rational::ONE));
        let inst: Rc<Expression> = Expression::instantiation(&expr, &Substitution::new(), &env).unwrap();
        assert!(Rc::ptr_eq(&expr, &inst));
    }

    #[test]
    fn test_display() {
        let (types, predicates, functions, terms, fuel, rome) = setup();
        let names: Names = Names { types: &types, predicates: &predicates, functions: &functions, terms: &terms };
        let table: FluentTable = FluentTable::new();
        let fluent: Rc<Fluent> = Fluent::make(fuel, vec![rome.into()], &table);
        assert_eq!(fluent.display(&names).to_string(), "(fuel rome)");
        assert_eq!(fluent.xml(&names).to_string(), "<function>fuel</function><term>rome</term>");

        let expr: Rc<Expression> = Expression::subtraction(&Expression::fluent(fluent), &Expression::value(Rational::new(1, 2).unwrap()));
        assert_eq!(expr.display(&names).to_string(), "(- (fuel rome) 1/2)");
    }
}
