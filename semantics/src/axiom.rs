use alloc::{string::String, vec, vec::Vec};
use getset::Getters;

use crate::{
    calculus::{first_order::Formula, predicate::Atom, Snapshot},
    effect::{Effect, StateDelta},
    entity::ObjectIndex,
    error::Error,
    grounding::{Grounding, Parameter},
    state::State,
};

/// Rule deriving `head` for every binding of the parameters
/// under which `body` holds.
///
/// Axioms only ever add propositions.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Axiom {
    #[getset(get = "pub")]
    parameters: Vec<Parameter>,
    #[getset(get = "pub")]
    body: Formula,
    #[getset(get = "pub")]
    head: Atom,
    effects: Vec<Effect>,
}

impl Axiom {
    pub fn new(parameters: Vec<Parameter>, body: Formula, head: Atom) -> Self {
        let effects = vec![Effect::ForAll {
            parameters: parameters.clone(),
            effects: vec![Effect::When {
                condition: body.clone(),
                effects: vec![Effect::Add(head.clone())],
            }],
        }];

        Self {
            parameters,
            body,
            head,
            effects,
        }
    }

    /// Name of the derived predicate.
    pub fn name(&self) -> String {
        self.head.name()
    }

    /// Returns `true` if new propositions were derived.
    pub fn apply_in_place(&self, index: &ObjectIndex, state: &mut State) -> Result<bool, Error> {
        let delta = StateDelta::collect(
            &self.effects,
            &Snapshot::new(index, state),
            &mut Grounding::default(),
        )?;
        Ok(delta.apply_in_place(state))
    }
}

/// Applies `axioms` in order until a full sweep derives nothing new.
///
/// Returns `true` if `state` changed.
pub fn apply_axioms<'a, I>(axioms: I, index: &ObjectIndex, state: &mut State) -> Result<bool, Error>
where
    I: IntoIterator<Item = &'a Axiom> + Clone,
{
    let mut changed = false;
    let mut sweep = 0usize;
    loop {
        sweep += 1;
        let mut sweep_changed = false;
        for axiom in axioms.clone() {
            sweep_changed |= axiom.apply_in_place(index, state)?;
        }
        log::trace!(
            "Axiom sweep {}: {} propositions, changed: {}",
            sweep,
            state.len(),
            sweep_changed
        );

        if !sweep_changed {
            return Ok(changed);
        }
        changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calculus::predicate::{Proposition, Term},
        entity::{Object, TypeHierarchy},
    };
    use test_log::test;

    fn chain() -> (ObjectIndex, [Object; 4], Vec<Axiom>) {
        let mut types = TypeHierarchy::default();
        let node = types.get_or_create("node");
        let objects = [
            Object::new("n1", node),
            Object::new("n2", node),
            Object::new("n3", node),
            Object::new("n4", node),
        ];
        let index = ObjectIndex::new(types, objects);

        let x = Parameter::new("?x", node);
        let y = Parameter::new("?y", node);
        let z = Parameter::new("?z", node);
        let var = |p: &Parameter| Term::variable(p.variable());

        // reach(x, y) <- edge(x, y)
        // reach(x, y) <- exists z. edge(x, z) and reach(z, y)
        let axioms = vec![
            Axiom::new(
                vec![x, y],
                Formula::atom(Atom::new("edge", vec![var(&x), var(&y)])),
                Atom::new("reach", vec![var(&x), var(&y)]),
            ),
            Axiom::new(
                vec![x, y],
                Formula::exists(
                    vec![z],
                    Formula::and(vec![
                        Formula::atom(Atom::new("edge", vec![var(&x), var(&z)])),
                        Formula::atom(Atom::new("reach", vec![var(&z), var(&y)])),
                    ]),
                ),
                Atom::new("reach", vec![var(&x), var(&y)]),
            ),
        ];

        (index, objects, axioms)
    }

    #[test]
    fn test_transitive_closure() {
        let (index, [n1, n2, n3, n4], axioms) = chain();
        let mut state = State::default().with_propositions(&[
            Proposition::new("edge", vec![n1, n2]),
            Proposition::new("edge", vec![n2, n3]),
            Proposition::new("edge", vec![n3, n4]),
        ]);

        assert_eq!(apply_axioms(&axioms, &index, &mut state), Ok(true));

        let reach = |a: Object, b: Object| Proposition::new("reach", vec![a, b]);
        for (a, b) in [(n1, n2), (n1, n3), (n1, n4), (n2, n3), (n2, n4), (n3, n4)] {
            assert!(state.contains(&reach(a, b)), "missing reach {} {}", a, b);
        }
        assert!(!state.contains(&reach(n4, n1)));
        assert!(!state.contains(&reach(n1, n1)));
        assert_eq!(state.len(), 3 + 6);
    }

    #[test]
    fn test_idempotence() {
        let (index, [n1, n2, ..], axioms) = chain();
        let mut state = State::default().with_propositions(&[
            Proposition::new("edge", vec![n1, n2]),
            Proposition::new("edge", vec![n2, n1]),
        ]);

        // A cycle still reaches a fixed point
        assert_eq!(apply_axioms(&axioms, &index, &mut state), Ok(true));
        let once = state.clone();
        assert!(once.contains(&Proposition::new("reach", vec![n1, n1])));

        assert_eq!(apply_axioms(&axioms, &index, &mut state), Ok(false));
        assert_eq!(state, once);
    }

    #[test]
    fn test_order_independent() {
        let (index, [n1, n2, n3, _], axioms) = chain();
        let initial = State::default().with_propositions(&[
            Proposition::new("edge", vec![n1, n2]),
            Proposition::new("edge", vec![n2, n3]),
        ]);

        let mut forward = initial.clone();
        apply_axioms(&axioms, &index, &mut forward).unwrap();
        let mut backward = initial;
        apply_axioms(axioms.iter().rev(), &index, &mut backward).unwrap();

        assert_eq!(forward, backward);
    }
}
