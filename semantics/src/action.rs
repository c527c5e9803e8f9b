use alloc::{string::String, vec::Vec};
use getset::Getters;
use itertools::Itertools;

use crate::{
    calculus::{first_order::Formula, Evaluable, Snapshot},
    effect::{Effect, StateDelta},
    entity::{Object, ObjectIndex},
    error::{Error, InvalidCall},
    grounding::{Grounding, Parameter},
    intern, resolve,
    state::State,
    util::named::Named,
    InternerSymbol,
};

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Action {
    name: InternerSymbol,
    #[getset(get = "pub")]
    parameters: Vec<Parameter>,
    #[getset(get = "pub")]
    precondition: Formula,
    #[getset(get = "pub")]
    effects: Vec<Effect>,
}

impl Named for Action {
    fn symbol(&self) -> InternerSymbol {
        self.name
    }
}

impl Action {
    pub fn new(
        name: &str,
        parameters: Vec<Parameter>,
        precondition: Formula,
        effects: Vec<Effect>,
    ) -> Self {
        Self {
            name: intern(name),
            parameters,
            precondition,
            effects,
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Binds `arguments` to the parameters, checking their
    /// number and that every object satisfies its parameter type.
    pub fn bind(&self, index: &ObjectIndex, arguments: &[Object]) -> Result<Grounding, Error> {
        if arguments.len() != self.parameters.len() {
            return Err(InvalidCall::ArityMismatch {
                name: self.name(),
                expected: self.parameters.len(),
                found: arguments.len(),
            }
            .into());
        }

        for (p, o) in self.parameters.iter().zip(arguments) {
            if !index.satisfies(o, &p.r#type()) {
                return Err(Error::InvalidArgumentType {
                    parameter: p.name(),
                    expected: p.r#type().name(),
                    object: o.name(),
                    found: o.r#type().name(),
                });
            }
        }

        Ok(Grounding::new(&self.parameters, arguments))
    }

    /// Whether the precondition holds in `state` for these arguments.
    pub fn is_valid(
        &self,
        index: &ObjectIndex,
        state: &State,
        arguments: &[Object],
    ) -> Result<bool, Error> {
        let mut grounding = self.bind(index, arguments)?;
        self.precondition
            .eval(&Snapshot::new(index, state), &mut grounding)
    }

    /// Changes the effects make to `state`. The precondition is not checked.
    pub fn delta(
        &self,
        index: &ObjectIndex,
        state: &State,
        arguments: &[Object],
    ) -> Result<StateDelta, Error> {
        let mut grounding = self.bind(index, arguments)?;
        StateDelta::collect(
            &self.effects,
            &Snapshot::new(index, state),
            &mut grounding,
        )
    }

    pub fn apply(
        &self,
        index: &ObjectIndex,
        state: &State,
        arguments: &[Object],
    ) -> Result<State, Error> {
        self.delta(index, state, arguments).map(|d| d.apply(state))
    }

    /// Returns `true` if `state` changed. On error `state` is left untouched.
    pub fn apply_in_place(
        &self,
        index: &ObjectIndex,
        arguments: &[Object],
        state: &mut State,
    ) -> Result<bool, Error> {
        let delta = self.delta(index, state, arguments)?;
        log::trace!(
            "{}: +{} -{}",
            GroundAction::new(self, arguments),
            delta.add().len(),
            delta.delete().len()
        );
        Ok(delta.apply_in_place(state))
    }
}

/// An action name with concrete arguments, printed as `name arg1 .. argN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Getters)]
pub struct GroundAction {
    name: InternerSymbol,
    #[getset(get = "pub")]
    arguments: Vec<Object>,
}

impl GroundAction {
    pub fn new(action: &Action, arguments: &[Object]) -> Self {
        Self {
            name: action.name,
            arguments: arguments.to_vec(),
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }
}

impl core::fmt::Display for GroundAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} {}", self.name(), self.arguments.iter().join(" "))
        }
    }
}
