use alloc::{collections::BTreeSet, vec::Vec};
use getset::Getters;

use crate::{
    calculus::{
        first_order::Formula,
        predicate::{Atom, Proposition},
        Evaluable, EvaluationContext,
    },
    error::{Error, UnsupportedFeature},
    grounding::{Grounding, Parameter, ParameterGenerator},
    state::State,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Add(Atom),
    Delete(Atom),
    /// Nested effects that only apply if the condition holds
    /// in the state the action is applied to.
    When {
        condition: Formula,
        effects: Vec<Effect>,
    },
    /// Nested effects applied once per binding of the parameters.
    ForAll {
        parameters: Vec<Parameter>,
        effects: Vec<Effect>,
    },
    Unsupported(UnsupportedFeature),
}

impl Effect {
    /// First unsupported construct in the effect or in any of its guards.
    pub fn unsupported(&self) -> Option<&UnsupportedFeature> {
        match self {
            Effect::Add(_) | Effect::Delete(_) => None,
            Effect::When { condition, effects } => condition
                .unsupported()
                .or_else(|| effects.iter().find_map(Effect::unsupported)),
            Effect::ForAll { effects, .. } => effects.iter().find_map(Effect::unsupported),
            Effect::Unsupported(feature) => Some(feature),
        }
    }
}

/// Ground changes an effect tree makes to one state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct StateDelta {
    add: BTreeSet<Proposition>,
    delete: BTreeSet<Proposition>,
}

impl StateDelta {
    /// Walks `effects` under `grounding`.
    ///
    /// Every condition is evaluated against `context`, the state
    /// before any of the collected changes are made. Fails if the tree
    /// holds an unsupported construct, whether or not a guard reaches it.
    pub fn collect(
        effects: &[Effect],
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<Self, Error> {
        if let Some(feature) = effects.iter().find_map(Effect::unsupported) {
            return Err(Error::UnsupportedFeature(feature.clone()));
        }
        let mut delta = Self::default();
        for effect in effects {
            delta.visit(effect, context, grounding)?;
        }
        Ok(delta)
    }

    fn visit(
        &mut self,
        effect: &Effect,
        context: &impl EvaluationContext,
        grounding: &mut Grounding,
    ) -> Result<(), Error> {
        match effect {
            Effect::Add(atom) => {
                self.add.insert(atom.ground(grounding)?);
            }
            Effect::Delete(atom) => {
                self.delete.insert(atom.ground(grounding)?);
            }
            Effect::When { condition, effects } => {
                if condition.eval(context, grounding)? {
                    for e in effects {
                        self.visit(e, context, grounding)?;
                    }
                }
            }
            Effect::ForAll {
                parameters,
                effects,
            } => {
                for arguments in &ParameterGenerator::new(context.objects(), parameters) {
                    grounding.with_bindings(parameters, &arguments, |g| {
                        effects.iter().try_for_each(|e| self.visit(e, context, g))
                    })?;
                }
            }
            Effect::Unsupported(feature) => {
                return Err(Error::UnsupportedFeature(feature.clone()));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty()
    }

    /// `(state - delete) + add`. A proposition both added and
    /// deleted ends up in the result.
    pub fn apply(&self, state: &State) -> State {
        let mut next = state.clone();
        self.apply_in_place(&mut next);
        next
    }

    /// Returns `true` if `state` changed.
    pub fn apply_in_place(&self, state: &mut State) -> bool {
        let mut changed = false;
        for p in self.delete.difference(&self.add) {
            changed |= state.remove(p);
        }
        for p in &self.add {
            changed |= state.insert(p.clone());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calculus::{predicate::Term, Snapshot},
        entity::{Object, ObjectIndex, TypeHierarchy},
    };
    use alloc::vec;

    #[test]
    fn test_add_wins() {
        let mut types = TypeHierarchy::default();
        let t = types.get_or_create("t");
        let a = Object::new("a", t);
        let index = ObjectIndex::new(types, [a]);

        let p = Proposition::new("p", vec![a]);
        let q = Proposition::new("q", vec![a]);
        let state = State::default().with_propositions(&[p.clone(), q.clone()]);

        let effects = vec![
            Effect::Delete(Atom::new("p", vec![Term::object(&a)])),
            Effect::Delete(Atom::new("q", vec![Term::object(&a)])),
            Effect::Add(Atom::new("p", vec![Term::object(&a)])),
        ];
        let delta = StateDelta::collect(
            &effects,
            &Snapshot::new(&index, &state),
            &mut Grounding::default(),
        )
        .unwrap();

        let next = delta.apply(&state);
        assert!(next.contains(&p));
        assert!(!next.contains(&q));

        let mut same = next.clone();
        assert!(!delta.apply_in_place(&mut same));
        assert_eq!(same, next);
    }

    #[test]
    fn test_conditions_see_the_old_state() {
        let mut types = TypeHierarchy::default();
        let t = types.get_or_create("t");
        let a = Object::new("a", t);
        let b = Object::new("b", t);
        let c = Object::new("c", t);
        let index = ObjectIndex::new(types, [a, b, c]);

        let state = State::default().with_propositions(&[
            Proposition::new("lit", vec![a]),
            Proposition::new("lit", vec![c]),
        ]);

        // Toggle every object: lit ones go dark, dark ones light up
        let x = Parameter::new("?x", t);
        let lit_x = Atom::new("lit", vec![Term::variable(x.variable())]);
        let effects = vec![Effect::ForAll {
            parameters: vec![x],
            effects: vec![
                Effect::When {
                    condition: Formula::atom(lit_x.clone()),
                    effects: vec![Effect::Delete(lit_x.clone())],
                },
                Effect::When {
                    condition: Formula::not(Formula::atom(lit_x.clone())),
                    effects: vec![Effect::Add(lit_x)],
                },
            ],
        }];

        let delta = StateDelta::collect(
            &effects,
            &Snapshot::new(&index, &state),
            &mut Grounding::default(),
        )
        .unwrap();
        assert_eq!(
            delta.apply(&state),
            State::default().with_propositions(&[Proposition::new("lit", vec![b])])
        );
    }

    #[test]
    fn test_unsupported_effect() {
        let index = ObjectIndex::default();
        let state = State::default();
        let effects = vec![Effect::Unsupported(UnsupportedFeature::NumericFluent(
            "increase".into(),
        ))];

        let res = StateDelta::collect(
            &effects,
            &Snapshot::new(&index, &state),
            &mut Grounding::default(),
        );
        assert!(matches!(res, Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_unreached_unsupported_effect() {
        let mut types = TypeHierarchy::default();
        let t = types.get_or_create("t");
        let a = Object::new("a", t);
        let index = ObjectIndex::new(types, [a]);
        let state = State::default();
        let snapshot = Snapshot::new(&index, &state);
        let p_a = Atom::new("p", vec![Term::object(&a)]);

        // The guard is false, so the unsupported effect is never reached
        let hidden = vec![
            Effect::Add(p_a.clone()),
            Effect::When {
                condition: Formula::atom(p_a.clone()),
                effects: vec![Effect::Unsupported(UnsupportedFeature::NumericFluent(
                    "increase".into(),
                ))],
            },
        ];
        assert!(matches!(
            StateDelta::collect(&hidden, &snapshot, &mut Grounding::default()),
            Err(Error::UnsupportedFeature(UnsupportedFeature::NumericFluent(_)))
        ));

        // Unsupported guard behind a disjunct that already holds
        let guarded = vec![Effect::When {
            condition: Formula::or(vec![
                Formula::not(Formula::atom(p_a.clone())),
                Formula::Unsupported(UnsupportedFeature::Preference),
            ]),
            effects: vec![Effect::Add(p_a)],
        }];
        assert_eq!(
            guarded[0].unsupported(),
            Some(&UnsupportedFeature::Preference)
        );
        assert_eq!(
            StateDelta::collect(&guarded, &snapshot, &mut Grounding::default()),
            Err(Error::UnsupportedFeature(UnsupportedFeature::Preference))
        );
    }
}
