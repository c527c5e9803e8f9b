//! One-time translation of the parsed records into the model a
//! [Problem](crate::problem::Problem) answers queries with.
use alloc::{boxed::Box, string::String, vec::Vec};

use crate::{
    action::Action,
    axiom::{apply_axioms, Axiom},
    calculus::{
        first_order::Formula,
        predicate::{Atom, PredicateSignature, Proposition, Term},
    },
    effect::Effect,
    entity::{Object, ObjectIndex, Type, TypeError, TypeHierarchy, ROOT_TYPE},
    error::{BadDefinition as BD, Error},
    grounding::{Parameter, Variable},
    parser::{ast::*, plan::is_name},
    state::State,
    util::named::NamedStorage,
};

pub(crate) struct Model {
    pub objects: ObjectIndex,
    pub predicates: NamedStorage<PredicateSignature>,
    pub actions: NamedStorage<Action>,
    pub axioms: Vec<Axiom>,
    pub derived_predicates: Vec<Axiom>,
    pub initial_state: State,
    pub goal: Formula,
}

pub(crate) fn build_types(defs: &[TypedName]) -> Result<TypeHierarchy, Error> {
    let mut types = TypeHierarchy::default();
    for def in defs {
        let t = types.get_or_create(&def.name);
        let parent = types.get_or_create(&def.r#type);
        if def.name == ROOT_TYPE {
            continue;
        }
        types
            .create_inheritance(&t, &parent)
            .map_err(|e| match e {
                TypeError::AlreadyHasSuperType(_) => BD::AlreadyHasSuperType(def.name.clone()),
                TypeError::CreatesCircularInheritance => BD::CircularInheritance(def.name.clone()),
            })?;
    }
    Ok(types)
}

/// Variables visible at some point of a formula, innermost last.
#[derive(Default)]
struct Scope {
    parameters: Vec<Parameter>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<Variable> {
        self.parameters
            .iter()
            .rev()
            .find(|p| p.name() == name)
            .map(|p| *p.variable())
    }

    fn with<R>(&mut self, parameters: &[Parameter], f: impl FnOnce(&mut Self) -> R) -> R {
        let mark = self.parameters.len();
        self.parameters.extend_from_slice(parameters);
        let res = f(self);
        self.parameters.truncate(mark);
        res
    }
}

struct Translator {
    objects: ObjectIndex,
    predicates: NamedStorage<PredicateSignature>,
}

impl Translator {
    fn r#type(&self, name: &str) -> Result<Type, Error> {
        self.objects
            .types()
            .get(name)
            .ok_or_else(|| BD::UnknownType(String::from(name)).into())
    }

    fn parameters(&self, defs: &[TypedName]) -> Result<Vec<Parameter>, Error> {
        defs.iter()
            .map(|d| self.r#type(&d.r#type).map(|t| Parameter::new(&d.name, t)))
            .collect()
    }

    fn object(&self, name: &str) -> Result<Object, Error> {
        self.objects
            .get(name)
            .ok_or_else(|| BD::UnknownObject(String::from(name)).into())
    }

    fn term(&self, def: &TermDef, scope: &Scope) -> Result<Term, Error> {
        match def {
            TermDef::Name(n) => self.object(n).map(Term::Object),
            TermDef::Variable(v) => scope
                .get(v)
                .map(Term::Variable)
                .ok_or_else(|| BD::UnknownVariable(v.clone()).into()),
        }
    }

    fn check_arity(&self, predicate: &str, found: usize) -> Result<(), Error> {
        let signature = self
            .predicates
            .get(predicate)
            .ok_or_else(|| BD::UnknownPredicate(String::from(predicate)))?;
        if signature.arity() != found {
            return Err(BD::ArityMismatch {
                predicate: String::from(predicate),
                expected: signature.arity(),
                found,
            }
            .into());
        }
        Ok(())
    }

    fn atom(&self, def: &AtomDef, scope: &Scope) -> Result<Atom, Error> {
        self.check_arity(&def.predicate, def.terms.len())?;
        Ok(Atom::new(
            &def.predicate,
            def.terms
                .iter()
                .map(|t| self.term(t, scope))
                .collect::<Result<_, _>>()?,
        ))
    }

    fn proposition(&self, def: &AtomDef) -> Result<Proposition, Error> {
        self.check_arity(&def.predicate, def.terms.len())?;
        Ok(Proposition::new(
            &def.predicate,
            def.terms
                .iter()
                .map(|t| match t {
                    TermDef::Name(n) => self.object(n),
                    TermDef::Variable(v) => Err(BD::Unexpected {
                        expected: String::from("object"),
                        found: v.clone(),
                    }
                    .into()),
                })
                .collect::<Result<_, _>>()?,
        ))
    }

    fn formulas(&self, defs: &[GoalDef], scope: &mut Scope) -> Result<Vec<Formula>, Error> {
        defs.iter().map(|d| self.formula(d, scope)).collect()
    }

    fn formula(&self, def: &GoalDef, scope: &mut Scope) -> Result<Formula, Error> {
        Ok(match def {
            GoalDef::Atom(a) => Formula::Atom(self.atom(a, scope)?),
            GoalDef::Equal(l, r) => Formula::Equal(self.term(l, scope)?, self.term(r, scope)?),
            GoalDef::Not(g) => Formula::not(self.formula(g, scope)?),
            GoalDef::And(gs) => Formula::And(self.formulas(gs, scope)?),
            GoalDef::Or(gs) => Formula::Or(self.formulas(gs, scope)?),
            GoalDef::Imply(a, b) => {
                Formula::imply(self.formula(a, scope)?, self.formula(b, scope)?)
            }
            GoalDef::ForAll(vars, g) => {
                let parameters = self.parameters(vars)?;
                let body = scope.with(&parameters, |s| self.formula(g, s))?;
                Formula::ForAll(parameters, Box::new(body))
            }
            GoalDef::Exists(vars, g) => {
                let parameters = self.parameters(vars)?;
                let body = scope.with(&parameters, |s| self.formula(g, s))?;
                Formula::Exists(parameters, Box::new(body))
            }
            GoalDef::Unsupported(feature) => Formula::Unsupported(feature.clone()),
        })
    }

    /// Flattens nested conjunctions into `out`.
    fn effects(&self, def: &EffectDef, scope: &mut Scope, out: &mut Vec<Effect>) -> Result<(), Error> {
        match def {
            EffectDef::Add(a) => out.push(Effect::Add(self.atom(a, scope)?)),
            EffectDef::Delete(a) => out.push(Effect::Delete(self.atom(a, scope)?)),
            EffectDef::And(es) => {
                for e in es {
                    self.effects(e, scope, out)?;
                }
            }
            EffectDef::When(condition, e) => {
                let condition = self.formula(condition, scope)?;
                let mut effects = Vec::new();
                self.effects(e, scope, &mut effects)?;
                out.push(Effect::When { condition, effects });
            }
            EffectDef::ForAll(vars, e) => {
                let parameters = self.parameters(vars)?;
                let mut effects = Vec::new();
                scope.with(&parameters, |s| self.effects(e, s, &mut effects))?;
                out.push(Effect::ForAll {
                    parameters,
                    effects,
                });
            }
            EffectDef::Unsupported(feature) => out.push(Effect::Unsupported(feature.clone())),
        }
        Ok(())
    }

    fn action(&self, def: &ActionDef) -> Result<Action, Error> {
        let parameters = self.parameters(&def.parameters)?;
        let mut scope = Scope::default();
        scope.with(&parameters, |s| {
            let precondition = self.formula(&def.precondition, s)?;
            let mut effects = Vec::new();
            self.effects(&def.effect, s, &mut effects)?;
            Ok(Action::new(&def.name, parameters.clone(), precondition, effects))
        })
    }

    fn derived(&self, def: &DerivedDef) -> Result<Axiom, Error> {
        let parameters = self.parameters(&def.head.parameters)?;
        let head = Atom::new(
            &def.head.name,
            parameters
                .iter()
                .map(|p| Term::variable(p.variable()))
                .collect(),
        );
        let mut scope = Scope::default();
        let body = scope.with(&parameters, |s| self.formula(&def.body, s))?;
        Ok(Axiom::new(parameters, body, head))
    }

    fn axiom(&self, def: &AxiomDef) -> Result<Axiom, Error> {
        let parameters = self.parameters(&def.vars)?;
        let mut scope = Scope::default();
        scope.with(&parameters, |s| {
            let body = self.formula(&def.context, s)?;
            let head = match &def.implies {
                GoalDef::Atom(a) => self.atom(a, s)?,
                GoalDef::Not(inner) => {
                    let name = match inner.as_ref() {
                        GoalDef::Atom(a) => a.predicate.clone(),
                        _ => String::from("not"),
                    };
                    return Err(BD::NegatedAxiomHead(name).into());
                }
                _ => {
                    return Err(BD::Unexpected {
                        expected: String::from("atom as axiom head"),
                        found: String::from("compound formula"),
                    }
                    .into())
                }
            };
            Ok(Axiom::new(parameters.clone(), body, head))
        })
    }
}

/// Names of objects, predicates and actions must read back as calls.
fn check_name(name: &str) -> Result<(), Error> {
    if is_name(name) {
        Ok(())
    } else {
        Err(BD::InvalidName(String::from(name)).into())
    }
}

pub(crate) fn translate(domain: &DomainDef, problem: &ProblemDef) -> Result<Model, Error> {
    if domain.name != problem.domain_name {
        return Err(BD::WrongDomain {
            expected: domain.name.clone(),
            found: problem.domain_name.clone(),
        }
        .into());
    }

    let types = build_types(&domain.types)?;
    let objects = domain
        .constants
        .iter()
        .chain(&problem.objects)
        .map(|o| {
            check_name(&o.name)?;
            types
                .get(&o.r#type)
                .map(|t| Object::new(&o.name, t))
                .ok_or_else(|| Error::from(BD::UnknownType(o.r#type.clone())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut translator = Translator {
        objects: ObjectIndex::new(types, objects),
        predicates: NamedStorage::default(),
    };

    for p in &domain.predicates {
        check_name(&p.name)?;
        let parameters = p
            .parameters
            .iter()
            .map(|d| translator.r#type(&d.r#type))
            .collect::<Result<_, _>>()?;
        if translator
            .predicates
            .insert(PredicateSignature::new(&p.name, parameters))
            .is_some()
        {
            log::warn!("Predicate `{}` is declared more than once.", p.name);
        }
    }
    // Derived predicates do not have to be declared separately
    for d in &domain.derived {
        check_name(&d.head.name)?;
        if !translator.predicates.contains(&d.head.name) {
            let parameters = d
                .head
                .parameters
                .iter()
                .map(|p| translator.r#type(&p.r#type))
                .collect::<Result<_, _>>()?;
            translator
                .predicates
                .insert(PredicateSignature::new(&d.head.name, parameters));
        }
    }

    let mut actions = NamedStorage::default();
    for a in &domain.actions {
        check_name(&a.name)?;
        if actions.insert(translator.action(a)?).is_some() {
            log::warn!("Action `{}` is declared more than once, keeping the last.", a.name);
        }
    }
    let derived_predicates = domain
        .derived
        .iter()
        .map(|d| translator.derived(d))
        .collect::<Result<Vec<_>, _>>()?;
    let axioms = domain
        .axioms
        .iter()
        .map(|a| translator.axiom(a))
        .collect::<Result<Vec<_>, _>>()?;

    let mut initial_state = problem
        .init
        .iter()
        .map(|a| translator.proposition(a))
        .collect::<Result<State, _>>()?;
    apply_axioms(
        derived_predicates.iter().chain(&axioms),
        &translator.objects,
        &mut initial_state,
    )?;

    let goal = translator.formula(&problem.goal, &mut Scope::default())?;

    log::debug!(
        "Translated problem `{}`: {} objects, {} actions, {} axioms, {} derived predicates, {} initial propositions.",
        problem.name,
        translator.objects.objects().len(),
        actions.len(),
        axioms.len(),
        derived_predicates.len(),
        initial_state.len()
    );

    Ok(Model {
        objects: translator.objects,
        predicates: translator.predicates,
        actions,
        axioms,
        derived_predicates,
        initial_state,
        goal,
    })
}
