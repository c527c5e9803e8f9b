//! Static checks over a parsed domain and problem.
//!
//! Unlike [Problem::new](crate::problem::Problem::new), which stops at
//! the first inconsistency, the checker walks the whole definition and
//! reports everything it finds.
use alloc::{
    collections::{BTreeMap, BTreeSet},
    format,
    string::String,
    vec::Vec,
};
use getset::Getters;

use crate::{
    entity::{Type, TypeHierarchy, ROOT_TYPE},
    error::UnsupportedFeature,
    parser::ast::*,
    translate::build_types,
};

/// Requirement flags naming features the evaluator rejects.
const UNSUPPORTED_REQUIREMENTS: &[&str] = &[
    ":durative-actions",
    ":duration-inequalities",
    ":continuous-effects",
    ":fluents",
    ":numeric-fluents",
    ":object-fluents",
    ":action-costs",
    ":preferences",
    ":constraints",
    ":timed-initial-literals",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationOptions {
    /// Keep warnings in the report and log every diagnostic.
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Diagnostic {
    severity: Severity,
    message: String,
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// `true` if no errors were found. Warnings do not fail a report.
    pub fn passed(&self) -> bool {
        self.diagnostics
            .iter()
            .all(|d| d.severity != Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

/// A variable in scope and its type, if the type is known.
type Binding<'d> = (&'d str, Option<Type>);

struct Checker {
    options: ValidationOptions,
    types: TypeHierarchy,
    objects: BTreeMap<String, Option<Type>>,
    predicates: BTreeMap<String, Vec<Option<Type>>>,
    report: Report,
}

impl Checker {
    fn push(&mut self, severity: Severity, message: String) {
        let diagnostic = Diagnostic { severity, message };
        if self.options.verbose {
            match severity {
                Severity::Warning => log::warn!("{}", diagnostic),
                Severity::Error => log::error!("{}", diagnostic),
            }
        }
        if severity == Severity::Error || self.options.verbose {
            self.report.diagnostics.push(diagnostic);
        }
    }

    fn error(&mut self, message: String) {
        self.push(Severity::Error, message);
    }

    fn warning(&mut self, message: String) {
        self.push(Severity::Warning, message);
    }

    fn unsupported(&mut self, feature: &UnsupportedFeature, context: &str) {
        self.warning(format!(
            "{} in {} is unsupported and fails when evaluated",
            feature, context
        ));
    }

    fn r#type(&mut self, name: &str, context: &str) -> Option<Type> {
        let t = self.types.get(name);
        if t.is_none() {
            self.error(format!("unknown type `{}` in {}", name, context));
        }
        t
    }

    fn bindings<'d>(&mut self, defs: &'d [TypedName], context: &str) -> Vec<Binding<'d>> {
        let mut seen = BTreeSet::new();
        defs.iter()
            .map(|d| {
                if !seen.insert(d.name.as_str()) {
                    self.error(format!("variable `{}` declared twice in {}", d.name, context));
                }
                (d.name.as_str(), self.r#type(&d.r#type, context))
            })
            .collect()
    }

    fn term(&mut self, term: &TermDef, scope: &[Binding<'_>], context: &str) -> Option<Type> {
        match term {
            TermDef::Name(n) => match self.objects.get(n) {
                Some(t) => *t,
                None => {
                    self.error(format!("unknown object `{}` in {}", n, context));
                    None
                }
            },
            TermDef::Variable(v) => match scope.iter().rev().find(|(name, _)| *name == v.as_str()) {
                Some((_, t)) => *t,
                None => {
                    self.error(format!("unbound variable `{}` in {}", v, context));
                    None
                }
            },
        }
    }

    fn atom(&mut self, atom: &AtomDef, scope: &[Binding<'_>], context: &str) {
        let Some(parameters) = self.predicates.get(&atom.predicate).cloned() else {
            self.error(format!("unknown predicate `{}` in {}", atom.predicate, context));
            return;
        };
        if parameters.len() != atom.terms.len() {
            self.error(format!(
                "`{}` takes {} arguments, {} given in {}",
                atom.predicate,
                parameters.len(),
                atom.terms.len(),
                context
            ));
            return;
        }

        for (i, (term, expected)) in atom.terms.iter().zip(parameters).enumerate() {
            let found = self.term(term, scope, context);
            if let (Some(found), Some(expected)) = (found, expected) {
                if !self.types.inherits_or_eq(&found, &expected) {
                    self.error(format!(
                        "argument {} of `{}` has type `{}`, expected `{}` in {}",
                        i + 1,
                        atom.predicate,
                        found,
                        expected,
                        context
                    ));
                }
            }
        }
    }

    fn goal<'d>(&mut self, goal: &'d GoalDef, scope: &mut Vec<Binding<'d>>, context: &str) {
        match goal {
            GoalDef::Atom(a) => self.atom(a, scope, context),
            GoalDef::Equal(l, r) => {
                self.term(l, scope, context);
                self.term(r, scope, context);
            }
            GoalDef::Not(g) => self.goal(g, scope, context),
            GoalDef::And(gs) | GoalDef::Or(gs) => {
                for g in gs {
                    self.goal(g, scope, context);
                }
            }
            GoalDef::Imply(a, b) => {
                self.goal(a, scope, context);
                self.goal(b, scope, context);
            }
            GoalDef::ForAll(vars, g) | GoalDef::Exists(vars, g) => {
                let mark = scope.len();
                scope.extend(self.bindings(vars, context));
                self.goal(g, scope, context);
                scope.truncate(mark);
            }
            GoalDef::Unsupported(feature) => self.unsupported(feature, context),
        }
    }

    fn effect<'d>(&mut self, effect: &'d EffectDef, scope: &mut Vec<Binding<'d>>, context: &str) {
        match effect {
            EffectDef::Add(a) | EffectDef::Delete(a) => self.atom(a, scope, context),
            EffectDef::And(es) => {
                for e in es {
                    self.effect(e, scope, context);
                }
            }
            EffectDef::When(condition, e) => {
                self.goal(condition, scope, context);
                self.effect(e, scope, context);
            }
            EffectDef::ForAll(vars, e) => {
                let mark = scope.len();
                scope.extend(self.bindings(vars, context));
                self.effect(e, scope, context);
                scope.truncate(mark);
            }
            EffectDef::Unsupported(feature) => self.unsupported(feature, context),
        }
    }

    fn requirements(&mut self, requirements: &[String], context: &str) {
        for r in requirements {
            if UNSUPPORTED_REQUIREMENTS
                .iter()
                .any(|u| u.eq_ignore_ascii_case(r))
            {
                self.warning(format!("requirement `{}` of {} is not supported", r, context));
            }
        }
    }

    fn objects(&mut self, defs: &[TypedName], context: &str) {
        for o in defs {
            let t = self.r#type(&o.r#type, context);
            if self.objects.contains_key(&o.name) {
                self.warning(format!("object `{}` declared twice in {}", o.name, context));
                continue;
            }
            self.objects.insert(o.name.clone(), t);
        }
    }
}

/// Type checks `domain` and `problem` against each other.
pub fn typecheck(domain: &DomainDef, problem: &ProblemDef, options: ValidationOptions) -> Report {
    let mut checker = Checker {
        options,
        types: TypeHierarchy::default(),
        objects: BTreeMap::new(),
        predicates: BTreeMap::new(),
        report: Report::default(),
    };

    match build_types(&domain.types) {
        Ok(types) => checker.types = types,
        Err(e) => checker.error(format!("{} in domain `{}`", e, domain.name)),
    }
    for t in &domain.types {
        if t.r#type != ROOT_TYPE && !domain.types.iter().any(|d| d.name == t.r#type) {
            checker.warning(format!(
                "super type `{}` of `{}` is not declared",
                t.r#type, t.name
            ));
        }
    }

    checker.requirements(&domain.requirements, "the domain");
    checker.requirements(&problem.requirements, "the problem");
    if domain.name != problem.domain_name {
        checker.error(format!(
            "problem `{}` is defined for domain `{}`, not `{}`",
            problem.name, problem.domain_name, domain.name
        ));
    }

    checker.objects(&domain.constants, "the domain constants");
    checker.objects(&problem.objects, "the problem objects");

    for p in &domain.predicates {
        let context = format!("predicate `{}`", p.name);
        let parameters = checker
            .bindings(&p.parameters, &context)
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        if checker.predicates.insert(p.name.clone(), parameters).is_some() {
            checker.error(format!("predicate `{}` declared twice", p.name));
        }
    }
    for d in &domain.derived {
        if !checker.predicates.contains_key(&d.head.name) {
            let context = format!("derived predicate `{}`", d.head.name);
            let parameters = checker
                .bindings(&d.head.parameters, &context)
                .into_iter()
                .map(|(_, t)| t)
                .collect();
            checker.predicates.insert(d.head.name.clone(), parameters);
        }
    }

    let mut actions = BTreeSet::new();
    for a in &domain.actions {
        let context = format!("action `{}`", a.name);
        if !actions.insert(a.name.as_str()) {
            checker.error(format!("{} declared twice", context));
        }
        let mut scope = checker.bindings(&a.parameters, &context);
        checker.goal(&a.precondition, &mut scope, &context);
        checker.effect(&a.effect, &mut scope, &context);
    }

    for d in &domain.derived {
        let context = format!("derived predicate `{}`", d.head.name);
        let mut scope = checker.bindings(&d.head.parameters, &context);
        checker.goal(&d.body, &mut scope, &context);
    }

    for (i, a) in domain.axioms.iter().enumerate() {
        let context = format!("axiom {}", i + 1);
        let mut scope = checker.bindings(&a.vars, &context);
        checker.goal(&a.context, &mut scope, &context);
        match &a.implies {
            GoalDef::Atom(head) => checker.atom(head, &scope, &context),
            _ => checker.error(format!("{} must imply a single positive atom", context)),
        }
    }

    for fact in &problem.init {
        checker.atom(fact, &[], "the initial state");
    }
    checker.goal(&problem.goal, &mut Vec::new(), "the goal");

    log::debug!(
        "Checked problem `{}`: {} diagnostics.",
        problem.name,
        checker.report.diagnostics.len()
    );
    checker.report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_domain, parse_problem};

    const DOMAIN: &str = r#"
(define (domain logistics)
  (:requirements :strips :typing)
  (:types truck - vehicle vehicle place - object)
  (:constants depot - place)
  (:predicates (at ?v - vehicle ?p - place) (road ?from ?to - place))
  (:action drive
    :parameters (?v - vehicle ?from ?to - place)
    :precondition (and (at ?v ?from) (road ?from ?to))
    :effect (and (not (at ?v ?from)) (at ?v ?to))))
"#;

    fn check(domain: &str, problem: &str, verbose: bool) -> Report {
        typecheck(
            &parse_domain(domain).unwrap(),
            &parse_problem(problem).unwrap(),
            ValidationOptions { verbose },
        )
    }

    #[test]
    fn test_valid() {
        let report = check(
            DOMAIN,
            r#"
(define (problem p) (:domain logistics)
  (:objects t1 - truck home - place)
  (:init (at t1 depot) (road depot home))
  (:goal (exists (?v - vehicle) (at ?v home))))
"#,
            true,
        );
        assert!(report.passed(), "{:?}", report);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn test_errors() {
        let report = check(
            DOMAIN,
            r#"
(define (problem p) (:domain logistic)
  (:objects t1 - truck home - place spot - parking)
  (:init (at home t1) (road depot) (fly t1))
  (:goal (and (at ?v home) (at nobody home))))
"#,
            false,
        );
        assert!(!report.passed());

        let messages = report
            .errors()
            .map(|d| d.message().as_str())
            .collect::<Vec<_>>();
        let expect = [
            "is defined for domain `logistic`",
            "unknown type `parking`",
            "argument 1 of `at` has type `place`, expected `vehicle`",
            "argument 2 of `at` has type `truck`, expected `place`",
            "`road` takes 2 arguments, 1 given",
            "unknown predicate `fly`",
            "unbound variable `?v` in the goal",
            "unknown object `nobody` in the goal",
        ];
        for e in expect {
            assert!(
                messages.iter().any(|m| m.contains(e)),
                "missing `{}` in {:?}",
                e,
                messages
            );
        }
        assert_eq!(messages.len(), expect.len(), "{:?}", messages);
    }

    #[test]
    fn test_warnings_need_verbose() {
        let domain = r#"
(define (domain d)
  (:requirements :strips :fluents)
  (:predicates (p))
  (:action a :effect (and (p) (increase (total-cost) 1))))
"#;
        let problem = "(define (problem q) (:domain d) (:goal (p)))";

        let quiet = check(domain, problem, false);
        assert!(quiet.passed());
        assert!(quiet.diagnostics().is_empty());

        let verbose = check(domain, problem, true);
        assert!(verbose.passed());
        assert_eq!(verbose.diagnostics().len(), 2);
        assert!(verbose
            .diagnostics()
            .iter()
            .all(|d| *d.severity() == Severity::Warning));
    }
}
