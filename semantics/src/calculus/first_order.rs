use alloc::{boxed::Box, vec::Vec};

use crate::{
    calculus::{
        predicate::{Atom, Term},
        Evaluable, EvaluationContext,
    },
    error::{Error, UnsupportedFeature},
    grounding::{Grounding, Parameter, ParameterGenerator},
};

/// Formula of goals, preconditions, effect guards and axiom bodies.
///
/// Free variables are looked up in the [Grounding] passed to
/// [Evaluable::eval]. Constructs the evaluator cannot decide are
/// kept as [Formula::Unsupported] and fail every evaluation of the
/// formula that contains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Atom(Atom),
    Equal(Term, Term),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    ForAll(Vec<Parameter>, Box<Formula>),
    Exists(Vec<Parameter>, Box<Formula>),
    Unsupported(UnsupportedFeature),
}

impl Formula {
    pub fn atom(atom: Atom) -> Self {
        Self::Atom(atom)
    }

    pub fn equal(left: Term, right: Term) -> Self {
        Self::Equal(left, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(formula: Formula) -> Self {
        Self::Not(Box::new(formula))
    }

    pub fn and(formulas: Vec<Formula>) -> Self {
        Self::And(formulas)
    }

    pub fn or(formulas: Vec<Formula>) -> Self {
        Self::Or(formulas)
    }

    /// `a -> b` as `not a or b`.
    pub fn imply(antecedent: Formula, consequent: Formula) -> Self {
        Self::Or(alloc::vec![Self::not(antecedent), consequent])
    }

    pub fn forall(parameters: Vec<Parameter>, formula: Formula) -> Self {
        Self::ForAll(parameters, Box::new(formula))
    }

    pub fn exists(parameters: Vec<Parameter>, formula: Formula) -> Self {
        Self::Exists(parameters, Box::new(formula))
    }

    /// The empty conjunction.
    pub fn truth() -> Self {
        Self::And(Vec::new())
    }
}

impl Default for Formula {
    fn default() -> Self {
        Self::truth()
    }
}

impl Formula {
    /// First construct the evaluator cannot decide, anywhere in the formula.
    pub fn unsupported(&self) -> Option<&UnsupportedFeature> {
        match self {
            Formula::Atom(_) | Formula::Equal(..) => None,
            Formula::Not(f) | Formula::ForAll(_, f) | Formula::Exists(_, f) => f.unsupported(),
            Formula::And(fs) | Formula::Or(fs) => fs.iter().find_map(Formula::unsupported),
            Formula::Unsupported(feature) => Some(feature),
        }
    }

    fn holds(
        &self,
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<bool, Error> {
        match self {
            Formula::Atom(atom) => atom.eval(context, grounding),
            Formula::Equal(left, right) => Ok(left.ground(grounding)? == right.ground(grounding)?),
            Formula::Not(f) => f.holds(context, grounding).map(|v| !v),
            Formula::And(fs) => {
                for f in fs {
                    if !f.holds(context, grounding)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::Or(fs) => {
                for f in fs {
                    if f.holds(context, grounding)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::ForAll(parameters, f) => {
                for arguments in &ParameterGenerator::new(context.objects(), parameters) {
                    let holds = grounding.with_bindings(parameters, &arguments, |g| {
                        f.holds(context, g)
                    })?;
                    if !holds {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::Exists(parameters, f) => {
                for arguments in &ParameterGenerator::new(context.objects(), parameters) {
                    let holds = grounding.with_bindings(parameters, &arguments, |g| {
                        f.holds(context, g)
                    })?;
                    if holds {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::Unsupported(feature) => Err(Error::UnsupportedFeature(feature.clone())),
        }
    }
}

/// Fails on any unsupported construct before evaluating,
/// so short-circuiting never hides one.
impl Evaluable for Formula {
    fn eval(
        &self,
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<bool, Error> {
        if let Some(feature) = self.unsupported() {
            return Err(Error::UnsupportedFeature(feature.clone()));
        }
        self.holds(context, grounding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calculus::{predicate::Proposition, Snapshot},
        entity::{Object, ObjectIndex, Type, TypeHierarchy},
        grounding::Variable,
        state::State,
    };
    use alloc::{string::String, vec};

    struct World {
        index: ObjectIndex,
        state: State,
        t1: Type,
        t2: Type,
        a: Object,
        b1: Object,
        b2: Object,
    }

    fn world() -> World {
        let mut types = TypeHierarchy::default();
        let t1 = types.get_or_create("t1");
        let t2 = types.get_or_create("t2");
        let _ = types.get_or_create("t3");

        let a = Object::new("a", t1);
        let b1 = Object::new("b1", t2);
        let b2 = Object::new("b2", t2);

        let state = State::default().with_propositions(&[
            Proposition::new("p", vec![a, b1]),
            Proposition::new("p", vec![a, b2]),
            Proposition::new("q", vec![a]),
        ]);

        World {
            index: ObjectIndex::new(types, [a, b1, b2]),
            state,
            t1,
            t2,
            a,
            b1,
            b2,
        }
    }

    fn eval(world: &World, formula: &Formula) -> Result<bool, Error> {
        formula.eval(
            &Snapshot::new(&world.index, &world.state),
            &mut Grounding::default(),
        )
    }

    #[test]
    fn test_connectives() {
        let w = world();
        let p_ab1 = Formula::atom(Atom::new("p", vec![Term::object(&w.a), Term::object(&w.b1)]));
        let q_b1 = Formula::atom(Atom::new("q", vec![Term::object(&w.b1)]));

        assert_eq!(eval(&w, &p_ab1), Ok(true));
        assert_eq!(eval(&w, &q_b1), Ok(false));
        assert_eq!(eval(&w, &Formula::not(q_b1.clone())), Ok(true));
        assert_eq!(eval(&w, &Formula::and(vec![p_ab1.clone(), q_b1.clone()])), Ok(false));
        assert_eq!(eval(&w, &Formula::or(vec![q_b1.clone(), p_ab1.clone()])), Ok(true));
        assert_eq!(eval(&w, &Formula::imply(q_b1.clone(), p_ab1.clone())), Ok(true));
        assert_eq!(eval(&w, &Formula::imply(p_ab1.clone(), q_b1.clone())), Ok(false));
        assert_eq!(eval(&w, &Formula::truth()), Ok(true));
        assert_eq!(eval(&w, &Formula::or(vec![])), Ok(false));
        assert_eq!(
            eval(&w, &Formula::equal(Term::object(&w.b1), Term::object(&w.b1))),
            Ok(true)
        );
        assert_eq!(
            eval(&w, &Formula::equal(Term::object(&w.b1), Term::object(&w.b2))),
            Ok(false)
        );
    }

    #[test]
    fn test_quantifiers() {
        let w = world();
        let x = Parameter::new("?x", w.t1);
        let y = Parameter::new("?y", w.t2);
        let p_xy = Formula::atom(Atom::new(
            "p",
            vec![Term::variable(x.variable()), Term::variable(y.variable())],
        ));

        // Every `t2` is related to `a`
        let f = Formula::forall(vec![y], Formula::atom(Atom::new(
            "p",
            vec![Term::object(&w.a), Term::variable(y.variable())],
        )));
        assert_eq!(eval(&w, &f), Ok(true));

        let f = Formula::exists(vec![x], Formula::forall(vec![y], p_xy.clone()));
        assert_eq!(eval(&w, &f), Ok(true));

        // Only `a` has `q`, no `t2` does
        let f = Formula::exists(
            vec![y],
            Formula::atom(Atom::new("q", vec![Term::variable(y.variable())])),
        );
        assert_eq!(eval(&w, &f), Ok(false));

        // Empty domains
        let t3 = w.index.types().get("t3").unwrap();
        let z = Parameter::new("?z", t3);
        let q_z = Formula::atom(Atom::new("q", vec![Term::variable(z.variable())]));
        assert_eq!(eval(&w, &Formula::forall(vec![z], q_z.clone())), Ok(true));
        assert_eq!(eval(&w, &Formula::exists(vec![z], q_z)), Ok(false));

        // Distinct pairs with equality
        let y2 = Parameter::new("?y2", w.t2);
        let f = Formula::exists(
            vec![y, y2],
            Formula::not(Formula::equal(
                Term::variable(y.variable()),
                Term::variable(y2.variable()),
            )),
        );
        assert_eq!(eval(&w, &f), Ok(true));
    }

    #[test]
    fn test_free_variable() {
        let w = world();
        let f = Formula::atom(Atom::new("q", vec![Term::variable(&Variable::new("?free"))]));
        assert_eq!(eval(&w, &f), Err(Error::UnboundVariable(String::from("?free"))));

        let mut grounding = Grounding::default();
        grounding.bind(&Variable::new("?free"), &w.a);
        assert_eq!(
            f.eval(&Snapshot::new(&w.index, &w.state), &mut grounding),
            Ok(true)
        );
    }

    #[test]
    fn test_unsupported() {
        let w = world();
        let bad = Formula::Unsupported(UnsupportedFeature::Preference);
        let yes = Formula::atom(Atom::new("q", vec![Term::object(&w.a)]));

        assert_eq!(
            eval(&w, &bad),
            Err(Error::UnsupportedFeature(UnsupportedFeature::Preference))
        );
        assert!(eval(&w, &Formula::not(bad.clone())).is_err());
        assert!(eval(&w, &Formula::and(vec![yes.clone(), bad.clone()])).is_err());
        // Fails even where evaluation would stop before the construct
        assert_eq!(
            eval(&w, &Formula::or(vec![yes.clone(), bad.clone()])),
            Err(Error::UnsupportedFeature(UnsupportedFeature::Preference))
        );
        assert_eq!(
            eval(&w, &Formula::and(vec![Formula::not(yes.clone()), bad.clone()])),
            Err(Error::UnsupportedFeature(UnsupportedFeature::Preference))
        );
        // Also under a quantifier with nothing to range over
        let t3 = w.index.types().get("t3").unwrap();
        let x = Parameter::new("?x", t3);
        assert!(eval(&w, &Formula::forall(vec![x], bad.clone())).is_err());

        assert_eq!(yes.unsupported(), None);
        assert_eq!(
            Formula::or(vec![yes, Formula::not(bad)]).unsupported(),
            Some(&UnsupportedFeature::Preference)
        );
    }
}
