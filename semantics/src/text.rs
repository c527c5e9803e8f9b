//! Conversions of query results to the plain strings used at the text boundary.
use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    action::{Action, GroundAction},
    entity::Object,
    state::State,
};

pub trait Stringify {
    type Output;

    fn stringify(&self) -> Self::Output;
}

/// Propositions as `name arg1 .. argN`.
impl Stringify for State {
    type Output = BTreeSet<String>;

    fn stringify(&self) -> Self::Output {
        self.iter().map(|p| p.to_string()).collect()
    }
}

/// Action names.
impl Stringify for [Action] {
    type Output = Vec<String>;

    fn stringify(&self) -> Self::Output {
        self.iter().map(Action::name).collect()
    }
}

impl Stringify for [GroundAction] {
    type Output = Vec<String>;

    fn stringify(&self) -> Self::Output {
        self.iter().map(|a| a.to_string()).collect()
    }
}

/// Object names.
impl Stringify for [Object] {
    type Output = Vec<String>;

    fn stringify(&self) -> Self::Output {
        self.iter().map(Object::name).collect()
    }
}

impl Stringify for [Vec<Object>] {
    type Output = Vec<Vec<String>>;

    fn stringify(&self) -> Self::Output {
        self.iter().map(|args| args.stringify()).collect()
    }
}
