use alloc::{string::String, vec::Vec};
use core::iter::FusedIterator;
use getset::Getters;

use crate::{
    entity::{Object, ObjectIndex, Type},
    intern, resolve, InternerSymbol,
};

/// A variable name such as `?x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    name: InternerSymbol,
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Self { name: intern(name) }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }
}

impl core::fmt::Display for Variable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed variable of an action, quantifier or axiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Getters)]
pub struct Parameter {
    #[getset(get = "pub")]
    variable: Variable,
    r#type: Type,
}

impl Parameter {
    pub fn new(variable: &str, r#type: Type) -> Self {
        Self {
            variable: Variable::new(variable),
            r#type,
        }
    }

    pub fn name(&self) -> String {
        self.variable.name()
    }

    pub fn r#type(&self) -> Type {
        self.r#type
    }
}

impl core::fmt::Display for Parameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} - {}", self.variable, self.r#type)
    }
}

/// Variable environment used while evaluating lifted formulas and effects.
///
/// Later bindings shadow earlier ones, so nested quantifiers
/// may reuse variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grounding {
    bindings: Vec<(Variable, Object)>,
}

impl Grounding {
    pub fn new(parameters: &[Parameter], arguments: &[Object]) -> Self {
        Self {
            bindings: parameters
                .iter()
                .map(|p| p.variable)
                .zip(arguments.iter().copied())
                .collect(),
        }
    }

    pub fn get(&self, variable: &Variable) -> Option<Object> {
        self.bindings
            .iter()
            .rev()
            .find(|(v, _)| v == variable)
            .map(|(_, o)| *o)
    }

    pub fn bind(&mut self, variable: &Variable, object: &Object) {
        self.bindings.push((*variable, *object));
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Runs `f` with `parameters` bound to `arguments` and drops
    /// those bindings again afterwards.
    pub fn with_bindings<F, R>(&mut self, parameters: &[Parameter], arguments: &[Object], f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let mark = self.bindings.len();
        for (p, o) in parameters.iter().zip(arguments) {
            self.bind(&p.variable, o);
        }

        let res = f(self);

        self.bindings.truncate(mark);
        res
    }
}

/// Every assignment of objects to a list of typed parameters.
///
/// Tuples come in declaration order with the leftmost parameter
/// changing slowest. The generator only keeps the candidate
/// domains, so it can be iterated any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGenerator<'a> {
    domains: Vec<&'a [Object]>,
}

impl<'a> ParameterGenerator<'a> {
    pub fn new(index: &'a ObjectIndex, parameters: &[Parameter]) -> Self {
        Self {
            domains: parameters.iter().map(|p| index.lookup(&p.r#type)).collect(),
        }
    }

    pub fn iter(&self) -> Tuples<'_, 'a> {
        Tuples {
            domains: &self.domains,
            indices: alloc::vec![0; self.domains.len()],
            done: self.domains.iter().any(|d| d.is_empty()),
        }
    }

    /// Number of tuples the generator yields, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.domains
            .iter()
            .fold(1usize, |n, d| n.saturating_mul(d.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.domains.iter().any(|d| d.is_empty())
    }
}

impl<'g, 'a> IntoIterator for &'g ParameterGenerator<'a> {
    type Item = Vec<Object>;
    type IntoIter = Tuples<'g, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Odometer over the domains of a [ParameterGenerator].
#[derive(Debug, Clone)]
pub struct Tuples<'g, 'a> {
    domains: &'g [&'a [Object]],
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for Tuples<'_, '_> {
    type Item = Vec<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tuple = self
            .indices
            .iter()
            .zip(self.domains)
            .map(|(i, d)| d[*i])
            .collect();

        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.domains[pos].len() {
                return Some(tuple);
            }
            self.indices[pos] = 0;
        }

        // Every position wrapped around
        self.done = true;
        Some(tuple)
    }
}

impl FusedIterator for Tuples<'_, '_> {}
