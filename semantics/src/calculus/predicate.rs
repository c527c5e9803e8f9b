use alloc::{string::String, vec::Vec};
use getset::Getters;
use itertools::Itertools;

use crate::{
    calculus::{Evaluable, EvaluationContext},
    entity::{Object, Type},
    error::Error,
    grounding::{Grounding, Variable},
    intern, resolve,
    util::named::Named,
    InternerSymbol,
};

/// Declared name and parameter types of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PredicateSignature {
    name: InternerSymbol,
    #[getset(get = "pub")]
    parameters: Vec<Type>,
}

impl PredicateSignature {
    pub fn new(name: &str, parameters: Vec<Type>) -> Self {
        Self {
            name: intern(name),
            parameters,
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl Named for PredicateSignature {
    fn symbol(&self) -> InternerSymbol {
        self.name
    }
}

/// Argument of a lifted atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Object(Object),
    Variable(Variable),
}

impl Term {
    pub fn object(object: &Object) -> Self {
        Self::Object(*object)
    }

    pub fn variable(variable: &Variable) -> Self {
        Self::Variable(*variable)
    }

    pub fn ground(&self, grounding: &Grounding) -> Result<Object, Error> {
        match self {
            Self::Object(o) => Ok(*o),
            Self::Variable(v) => grounding
                .get(v)
                .ok_or_else(|| Error::UnboundVariable(v.name())),
        }
    }
}

/// A predicate applied to terms, how it appears in
/// preconditions, effects, axioms and goals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Getters)]
pub struct Atom {
    pub(crate) name: InternerSymbol,
    #[getset(get = "pub")]
    terms: Vec<Term>,
}

impl Atom {
    pub fn new(name: &str, terms: Vec<Term>) -> Self {
        Self {
            name: intern(name),
            terms,
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }

    /// Substitutes every variable with its bound object.
    pub fn ground(&self, grounding: &Grounding) -> Result<Proposition, Error> {
        Ok(Proposition {
            name: self.name,
            arguments: self
                .terms
                .iter()
                .map(|t| t.ground(grounding))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl Evaluable for Atom {
    fn eval(
        &self,
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<bool, Error> {
        self.ground(grounding).map(|p| context.holds(&p))
    }
}

/// A ground atom, how it is stored in a [State](crate::state::State).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Getters)]
pub struct Proposition {
    pub(crate) name: InternerSymbol,
    #[getset(get = "pub")]
    arguments: Vec<Object>,
}

impl Proposition {
    pub fn new(name: &str, arguments: Vec<Object>) -> Self {
        Self {
            name: intern(name),
            arguments,
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }
}

impl core::fmt::Display for Proposition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} {}", self.name(), self.arguments.iter().join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_equality() {
        let t = Type::new("block");
        let a = Object::new("a", t);
        let b = Object::new("b", t);

        assert_eq!(
            Proposition::new("on", vec![a, b]),
            Proposition::new("on", vec![a, b])
        );
        // Argument order matters
        assert_ne!(
            Proposition::new("on", vec![a, b]),
            Proposition::new("on", vec![b, a])
        );
        // Same name with another arity is another predicate
        assert_ne!(
            Proposition::new("clear", vec![a]),
            Proposition::new("clear", vec![])
        );
    }

    #[test]
    fn test_display() {
        let t = Type::new("block");
        let a = Object::new("a", t);
        let b = Object::new("b", t);

        assert_eq!(Proposition::new("on", vec![a, b]).to_string(), "on a b");
        assert_eq!(Proposition::new("handempty", vec![]).to_string(), "handempty");
    }

    #[test]
    fn test_signature() {
        let t = Type::new("block");
        let on = PredicateSignature::new("on", vec![t, t]);
        assert_eq!(on.name(), "on");
        assert_eq!(on.arity(), 2);
    }

    #[test]
    fn test_grounding() {
        let t = Type::new("block");
        let a = Object::new("a", t);
        let b = Object::new("b", t);
        let x = Variable::new("?x");
        let y = Variable::new("?y");

        let atom = Atom::new("on", vec![Term::variable(&x), Term::object(&b)]);

        let mut grounding = Grounding::default();
        assert_eq!(
            atom.ground(&grounding),
            Err(Error::UnboundVariable(String::from("?x")))
        );

        grounding.bind(&x, &a);
        assert_eq!(
            atom.ground(&grounding).unwrap(),
            Proposition::new("on", vec![a, b])
        );

        let atom = Atom::new("on", vec![Term::variable(&x), Term::variable(&y)]);
        assert!(atom.ground(&grounding).is_err());
    }
}
