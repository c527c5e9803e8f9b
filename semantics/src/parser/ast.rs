//! Records a parsed domain and problem are described with.
//!
//! They mirror the text closely. Names are plain strings, nothing is
//! resolved yet and `imply` is still its own node.
//! [Problem::new](crate::problem::Problem::new) turns them into the model.
use alloc::{boxed::Box, string::String, vec::Vec};

use crate::{entity::ROOT_TYPE, error::UnsupportedFeature};

/// `name - type`, used for types, constants, objects and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedName {
    pub name: String,
    pub r#type: String,
}

impl TypedName {
    pub fn new(name: &str, r#type: &str) -> Self {
        Self {
            name: String::from(name),
            r#type: String::from(r#type),
        }
    }

    /// A name without explicit type, which defaults to `object`.
    pub fn untyped(name: &str) -> Self {
        Self::new(name, ROOT_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateDef {
    pub name: String,
    pub parameters: Vec<TypedName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermDef {
    Name(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomDef {
    pub predicate: String,
    pub terms: Vec<TermDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalDef {
    Atom(AtomDef),
    Equal(TermDef, TermDef),
    Not(Box<GoalDef>),
    And(Vec<GoalDef>),
    Or(Vec<GoalDef>),
    Imply(Box<GoalDef>, Box<GoalDef>),
    ForAll(Vec<TypedName>, Box<GoalDef>),
    Exists(Vec<TypedName>, Box<GoalDef>),
    Unsupported(UnsupportedFeature),
}

impl Default for GoalDef {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectDef {
    Add(AtomDef),
    Delete(AtomDef),
    And(Vec<EffectDef>),
    When(GoalDef, Box<EffectDef>),
    ForAll(Vec<TypedName>, Box<EffectDef>),
    Unsupported(UnsupportedFeature),
}

impl Default for EffectDef {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDef {
    pub name: String,
    pub parameters: Vec<TypedName>,
    pub precondition: GoalDef,
    pub effect: EffectDef,
}

/// `(:axiom :vars (..) :context .. :implies ..)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxiomDef {
    pub vars: Vec<TypedName>,
    pub context: GoalDef,
    pub implies: GoalDef,
}

/// `(:derived (name ?x - t ..) body)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedDef {
    pub head: PredicateDef,
    pub body: GoalDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainDef {
    pub name: String,
    pub requirements: Vec<String>,
    pub types: Vec<TypedName>,
    pub constants: Vec<TypedName>,
    pub predicates: Vec<PredicateDef>,
    pub actions: Vec<ActionDef>,
    pub axioms: Vec<AxiomDef>,
    pub derived: Vec<DerivedDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProblemDef {
    pub name: String,
    pub domain_name: String,
    pub requirements: Vec<String>,
    pub objects: Vec<TypedName>,
    pub init: Vec<AtomDef>,
    pub goal: GoalDef,
}
