pub mod first_order;
pub mod predicate;

use crate::{
    calculus::predicate::Proposition, entity::ObjectIndex, error::Error, grounding::Grounding,
    state::State,
};

pub trait Evaluable {
    fn eval(
        &self,
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<bool, Error>;
}

/// What a formula is evaluated against: the objects quantifiers
/// range over and the set of propositions that currently hold.
pub trait EvaluationContext {
    fn objects(&self) -> &ObjectIndex;
    fn holds(&self, proposition: &Proposition) -> bool;
}

/// A state together with the objects of its problem.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub objects: &'a ObjectIndex,
    pub state: &'a State,
}

impl<'a> Snapshot<'a> {
    pub fn new(objects: &'a ObjectIndex, state: &'a State) -> Self {
        Self { objects, state }
    }
}

impl EvaluationContext for Snapshot<'_> {
    fn objects(&self) -> &ObjectIndex {
        self.objects
    }

    fn holds(&self, proposition: &Proposition) -> bool {
        self.state.contains(proposition)
    }
}
