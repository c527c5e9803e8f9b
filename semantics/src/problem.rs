use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};
use getset::Getters;

use crate::{
    action::{Action, GroundAction},
    axiom::{apply_axioms, Axiom},
    calculus::{
        first_order::Formula,
        predicate::{PredicateSignature, Proposition},
        Evaluable, Snapshot,
    },
    entity::{Object, ObjectIndex},
    error::{Error, InvalidCall},
    grounding::{Grounding, ParameterGenerator},
    parser::{
        ast::{DomainDef, ProblemDef},
        parse_domain, parse_problem,
        plan::{parse_call, parse_plan, Call},
    },
    state::State,
    text::Stringify,
    translate::translate,
    util::named::NamedStorage,
    validator::{typecheck, Report, ValidationOptions},
};

/// A domain and problem pair, translated once and then queried.
///
/// Every method takes `&self`, so one problem can be shared between threads.
/// States are plain values passed in and returned by the caller.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Problem {
    name: String,
    domain_name: String,
    objects: ObjectIndex,
    predicates: NamedStorage<PredicateSignature>,
    actions: NamedStorage<Action>,
    /// Rules from `:axiom` blocks.
    axioms: Vec<Axiom>,
    /// Rules from `:derived` blocks.
    derived_predicates: Vec<Axiom>,
    /// Closed under all rules.
    initial_state: State,
    goal: Formula,
    domain_def: DomainDef,
    problem_def: ProblemDef,
}

impl Problem {
    pub fn new(domain: DomainDef, problem: ProblemDef) -> Result<Self, Error> {
        let model = translate(&domain, &problem)?;
        log::debug!(
            "Problem `{}`: {} objects, {} actions, {} rules, {} initial propositions.",
            problem.name,
            model.objects.objects().len(),
            model.actions.len(),
            model.axioms.len() + model.derived_predicates.len(),
            model.initial_state.len()
        );

        Ok(Self {
            name: problem.name.clone(),
            domain_name: domain.name.clone(),
            objects: model.objects,
            predicates: model.predicates,
            actions: model.actions,
            axioms: model.axioms,
            derived_predicates: model.derived_predicates,
            initial_state: model.initial_state,
            goal: model.goal,
            domain_def: domain,
            problem_def: problem,
        })
    }

    /// Parses and translates domain and problem text.
    pub fn from_pddl(domain: &str, problem: &str) -> Result<Self, Error> {
        Self::new(parse_domain(domain)?, parse_problem(problem)?)
    }

    /// Runs the static checks of [typecheck] over the definitions
    /// this problem was built from.
    pub fn validate(&self, options: ValidationOptions) -> Report {
        typecheck(&self.domain_def, &self.problem_def, options)
    }

    fn rules(&self) -> impl Iterator<Item = &Axiom> + Clone {
        self.derived_predicates.iter().chain(&self.axioms)
    }

    fn object(&self, name: &str) -> Result<Object, Error> {
        self.objects
            .get(name)
            .ok_or_else(|| InvalidCall::UnknownObject(String::from(name)).into())
    }

    fn resolve_call(&self, call: &Call<'_>) -> Result<(&Action, Vec<Object>), Error> {
        let action = self
            .actions
            .get(call.name)
            .ok_or_else(|| InvalidCall::UnknownAction(String::from(call.name)))?;
        if action.arity() != call.arguments.len() {
            return Err(InvalidCall::ArityMismatch {
                name: String::from(call.name),
                expected: action.arity(),
                found: call.arguments.len(),
            }
            .into());
        }

        let arguments = call
            .arguments
            .iter()
            .map(|a| self.object(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((action, arguments))
    }

    /// Reads `name arg1 .. argN` into a proposition over known objects.
    pub fn parse_proposition(&self, text: &str) -> Result<Proposition, Error> {
        let call = parse_call(text)?;
        let predicate = self
            .predicates
            .get(call.name)
            .ok_or_else(|| InvalidCall::UnknownPredicate(String::from(call.name)))?;
        if predicate.arity() != call.arguments.len() {
            return Err(InvalidCall::ArityMismatch {
                name: String::from(call.name),
                expected: predicate.arity(),
                found: call.arguments.len(),
            }
            .into());
        }

        let arguments = call
            .arguments
            .iter()
            .map(|a| self.object(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Proposition::new(call.name, arguments))
    }

    pub fn parse_state<I>(&self, propositions: I) -> Result<State, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        propositions
            .into_iter()
            .map(|p| self.parse_proposition(p.as_ref()))
            .collect()
    }

    /// Reads `name arg1 .. argN` into an action and its arguments.
    pub fn parse_action_call(&self, text: &str) -> Result<(&Action, Vec<Object>), Error> {
        self.resolve_call(&parse_call(text)?)
    }

    /// Closes `state` under the derived predicates and axioms.
    pub fn close(&self, state: &mut State) -> Result<bool, Error> {
        apply_axioms(self.rules(), &self.objects, state)
    }

    /// Applies the effects of `action` and closes the result under all rules.
    /// The precondition is not checked.
    pub fn apply(&self, state: &State, action: &Action, arguments: &[Object]) -> Result<State, Error> {
        let mut next = action.apply(&self.objects, state, arguments)?;
        self.close(&mut next)?;
        Ok(next)
    }

    /// In place version of [Problem::apply]. Returns `true` if `state` changed.
    ///
    /// If a rule fails to evaluate, `state` keeps the effects applied so far.
    pub fn apply_in_place(
        &self,
        action: &Action,
        arguments: &[Object],
        state: &mut State,
    ) -> Result<bool, Error> {
        let changed = action.apply_in_place(&self.objects, arguments, state)?;
        Ok(self.close(state)? || changed)
    }

    /// State after executing `call` in `state`, without checking its precondition.
    pub fn next_state(&self, state: &State, call: &str) -> Result<State, Error> {
        let (action, arguments) = self.parse_action_call(call)?;
        self.apply(state, action, &arguments)
    }

    pub fn next_state_str(
        &self,
        state: &BTreeSet<String>,
        call: &str,
    ) -> Result<BTreeSet<String>, Error> {
        self.next_state(&self.parse_state(state)?, call)
            .map(|s| s.stringify())
    }

    /// Whether the precondition of `call` holds in `state`.
    pub fn is_valid_action(&self, state: &State, call: &str) -> Result<bool, Error> {
        let (action, arguments) = self.parse_action_call(call)?;
        action.is_valid(&self.objects, state, &arguments)
    }

    pub fn is_valid_action_str(&self, state: &BTreeSet<String>, call: &str) -> Result<bool, Error> {
        self.is_valid_action(&self.parse_state(state)?, call)
    }

    /// Whether `call` is applicable in `state` and leads exactly to `next`.
    pub fn is_valid_tuple(&self, state: &State, call: &str, next: &State) -> Result<bool, Error> {
        let (action, arguments) = self.parse_action_call(call)?;
        if !action.is_valid(&self.objects, state, &arguments)? {
            return Ok(false);
        }
        Ok(self.apply(state, action, &arguments)? == *next)
    }

    pub fn is_valid_tuple_str(
        &self,
        state: &BTreeSet<String>,
        call: &str,
        next: &BTreeSet<String>,
    ) -> Result<bool, Error> {
        self.is_valid_tuple(&self.parse_state(state)?, call, &self.parse_state(next)?)
    }

    pub fn is_goal_satisfied(&self, state: &State) -> Result<bool, Error> {
        self.goal
            .eval(&Snapshot::new(&self.objects, state), &mut Grounding::default())
    }

    pub fn is_goal_satisfied_str(&self, state: &BTreeSet<String>) -> Result<bool, Error> {
        self.is_goal_satisfied(&self.parse_state(state)?)
    }

    /// Stops at the first inapplicable step, so calls after it are
    /// never read.
    fn run_plan<'c>(
        &self,
        calls: impl IntoIterator<Item = Result<Call<'c>, Error>>,
    ) -> Result<bool, Error> {
        let mut state = self.initial_state.clone();
        for (step, call) in calls.into_iter().enumerate() {
            let (action, arguments) = self.resolve_call(&call?)?;
            if !action.is_valid(&self.objects, &state, &arguments)? {
                log::debug!(
                    "Plan step {} `{}` is not applicable.",
                    step + 1,
                    GroundAction::new(action, &arguments)
                );
                return Ok(false);
            }
            self.apply_in_place(action, &arguments, &mut state)?;
        }
        self.is_goal_satisfied(&state)
    }

    /// Whether every call is applicable in turn starting from the initial
    /// state and the final state satisfies the goal.
    pub fn is_valid_plan(&self, calls: &[impl AsRef<str>]) -> Result<bool, Error> {
        self.run_plan(
            calls
                .iter()
                .map(|c| parse_call(c.as_ref()).map_err(Error::from)),
        )
    }

    /// [Problem::is_valid_plan] over a plan file, see [parse_plan].
    pub fn is_valid_plan_text(&self, plan: &str) -> Result<bool, Error> {
        self.run_plan(parse_plan(plan)?.into_iter().map(Ok))
    }

    /// Every argument tuple for which `action` is applicable in `state`,
    /// in declaration order of the objects.
    pub fn list_valid_arguments(
        &self,
        state: &State,
        action: &Action,
    ) -> Result<Vec<Vec<Object>>, Error> {
        let generator = ParameterGenerator::new(&self.objects, action.parameters());
        let mut valid = Vec::new();
        for arguments in &generator {
            if action.is_valid(&self.objects, state, &arguments)? {
                valid.push(arguments);
            }
        }
        log::trace!(
            "{}: {} of {} groundings applicable.",
            action.name(),
            valid.len(),
            generator.len()
        );
        Ok(valid)
    }

    pub fn list_valid_arguments_str(
        &self,
        state: &BTreeSet<String>,
        action: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        let action = self
            .actions
            .get(action)
            .ok_or_else(|| InvalidCall::UnknownAction(String::from(action)))?;
        self.list_valid_arguments(&self.parse_state(state)?, action)
            .map(|args| args.stringify())
    }

    /// Every applicable ground action, grouped by action in declaration order.
    pub fn list_valid_actions(&self, state: &State) -> Result<Vec<GroundAction>, Error> {
        let mut valid = Vec::new();
        for action in self.actions.values() {
            valid.extend(
                self.list_valid_arguments(state, action)?
                    .iter()
                    .map(|args| GroundAction::new(action, args)),
            );
        }
        Ok(valid)
    }

    pub fn list_valid_actions_str(&self, state: &BTreeSet<String>) -> Result<Vec<String>, Error> {
        Ok(self
            .list_valid_actions(&self.parse_state(state)?)?
            .iter()
            .map(|a| a.to_string())
            .collect())
    }
}
