pub mod ast;
pub mod plan;
pub mod sexpr;

use alloc::{
    boxed::Box,
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use crate::error::{BadDefinition as BD, Error, InputKind, UnsupportedFeature as UF};
use ast::*;
use sexpr::{parse_one, SExpr};

/// Goal constructs of PDDL3 trajectory constraints.
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "always",
    "sometime",
    "within",
    "at-most-once",
    "sometime-after",
    "sometime-before",
    "always-within",
    "hold-during",
    "hold-after",
];
const NUMERIC_COMPARISONS: &[&str] = &["<", ">", "<=", ">="];
const NUMERIC_EFFECTS: &[&str] = &["increase", "decrease", "assign", "scale-up", "scale-down"];

fn unexpected(expected: &str, found: &SExpr<'_>) -> Error {
    BD::Unexpected {
        expected: String::from(expected),
        found: found.to_string(),
    }
    .into()
}

fn name<'a>(e: &SExpr<'a>, what: &str) -> Result<&'a str, Error> {
    e.as_atom().ok_or_else(|| unexpected(what, e))
}

fn list<'s, 'a>(e: &'s SExpr<'a>, what: &str) -> Result<&'s [SExpr<'a>], Error> {
    e.as_list().ok_or_else(|| unexpected(what, e))
}

fn single<'s, 'a>(args: &'s [SExpr<'a>], whole: &SExpr<'_>) -> Result<&'s SExpr<'a>, Error> {
    match args {
        [arg] => Ok(arg),
        _ => Err(unexpected("exactly one argument", whole)),
    }
}

/// `a b - t c - u d`, where `d` gets the root type.
fn typed_list(items: &[SExpr<'_>]) -> Result<Vec<TypedName>, Error> {
    let mut res = Vec::new();
    let mut pending = Vec::new();
    let mut it = items.iter();

    while let Some(item) = it.next() {
        if item.as_atom() != Some("-") {
            pending.push(name(item, "name")?);
            continue;
        }

        let r#type = match it.next() {
            Some(SExpr::Atom(t)) => *t,
            Some(SExpr::List(l)) if l.first().is_some_and(|h| h.is_keyword("either")) => {
                return Err(UF::EitherOfTypes.into())
            }
            Some(other) => return Err(unexpected("type name", other)),
            None => return Err(BD::Missing(String::from("type after `-`")).into()),
        };
        if pending.is_empty() {
            return Err(BD::Missing(format!("names before `- {}`", r#type)).into());
        }
        res.extend(pending.drain(..).map(|n| TypedName::new(n, r#type)));
    }

    res.extend(pending.into_iter().map(TypedName::untyped));
    Ok(res)
}

fn term(e: &SExpr<'_>) -> Result<TermDef, Error> {
    let n = name(e, "term")?;
    Ok(if n.starts_with('?') {
        TermDef::Variable(String::from(n))
    } else {
        TermDef::Name(String::from(n))
    })
}

/// `(predicate term*)`
fn atom(items: &[SExpr<'_>], whole: &SExpr<'_>) -> Result<AtomDef, Error> {
    let (predicate, terms) = items
        .split_first()
        .ok_or_else(|| unexpected("atom", whole))?;
    Ok(AtomDef {
        predicate: String::from(name(predicate, "predicate name")?),
        terms: terms.iter().map(term).collect::<Result<_, _>>()?,
    })
}

fn temporal(items: &[SExpr<'_>]) -> Option<UF> {
    match items {
        [at, when, SExpr::List(_)]
            if at.is_keyword("at") && (when.is_keyword("start") || when.is_keyword("end")) =>
        {
            Some(UF::Temporal(format!(
                "at {}",
                when.to_string().to_ascii_lowercase()
            )))
        }
        [over, all, _] if over.is_keyword("over") && all.is_keyword("all") => {
            Some(UF::Temporal(String::from("over all")))
        }
        _ => None,
    }
}

fn quantified<'s, 'a>(
    args: &'s [SExpr<'a>],
    whole: &SExpr<'_>,
) -> Result<(Vec<TypedName>, &'s SExpr<'a>), Error> {
    let [vars, body] = args else {
        return Err(unexpected("variable list and body", whole));
    };
    Ok((typed_list(list(vars, "variable list")?)?, body))
}

pub fn parse_goal(e: &SExpr<'_>) -> Result<GoalDef, Error> {
    let items = list(e, "goal")?;
    let Some(head) = items.first() else {
        return Ok(GoalDef::And(vec![]));
    };
    if let Some(feature) = temporal(items) {
        return Ok(GoalDef::Unsupported(feature));
    }

    let keyword = name(head, "predicate or connective")?.to_ascii_lowercase();
    let args = &items[1..];
    let goal = match keyword.as_str() {
        "and" => GoalDef::And(args.iter().map(parse_goal).collect::<Result<_, _>>()?),
        "or" => GoalDef::Or(args.iter().map(parse_goal).collect::<Result<_, _>>()?),
        "not" => GoalDef::Not(Box::new(parse_goal(single(args, e)?)?)),
        "imply" => {
            let [a, b] = args else {
                return Err(unexpected("antecedent and consequent", e));
            };
            GoalDef::Imply(Box::new(parse_goal(a)?), Box::new(parse_goal(b)?))
        }
        "forall" => {
            let (vars, body) = quantified(args, e)?;
            GoalDef::ForAll(vars, Box::new(parse_goal(body)?))
        }
        "exists" => {
            let (vars, body) = quantified(args, e)?;
            GoalDef::Exists(vars, Box::new(parse_goal(body)?))
        }
        "=" => match args {
            [l @ SExpr::Atom(_), r @ SExpr::Atom(_)] => GoalDef::Equal(term(l)?, term(r)?),
            _ => GoalDef::Unsupported(UF::NumericFluent(String::from("="))),
        },
        "preference" => GoalDef::Unsupported(UF::Preference),
        op if NUMERIC_COMPARISONS.contains(&op) => {
            GoalDef::Unsupported(UF::NumericFluent(String::from(op)))
        }
        op if CONSTRAINT_KEYWORDS.contains(&op) && args.iter().any(|a| a.as_list().is_some()) => {
            GoalDef::Unsupported(UF::Constraint(String::from(op)))
        }
        _ => GoalDef::Atom(atom(items, e)?),
    };
    Ok(goal)
}

pub fn parse_effect(e: &SExpr<'_>) -> Result<EffectDef, Error> {
    let items = list(e, "effect")?;
    let Some(head) = items.first() else {
        return Ok(EffectDef::And(vec![]));
    };
    if let Some(feature) = temporal(items) {
        return Ok(EffectDef::Unsupported(feature));
    }

    let keyword = name(head, "predicate or effect keyword")?.to_ascii_lowercase();
    let args = &items[1..];
    let effect = match keyword.as_str() {
        "and" => EffectDef::And(args.iter().map(parse_effect).collect::<Result<_, _>>()?),
        "not" => {
            let inner = single(args, e)?;
            EffectDef::Delete(atom(list(inner, "atom")?, inner)?)
        }
        "when" => {
            let [condition, effect] = args else {
                return Err(unexpected("condition and effect", e));
            };
            EffectDef::When(parse_goal(condition)?, Box::new(parse_effect(effect)?))
        }
        "forall" => {
            let (vars, body) = quantified(args, e)?;
            EffectDef::ForAll(vars, Box::new(parse_effect(body)?))
        }
        op if NUMERIC_EFFECTS.contains(&op) => {
            EffectDef::Unsupported(UF::NumericFluent(String::from(op)))
        }
        _ => EffectDef::Add(atom(items, e)?),
    };
    Ok(effect)
}

/// `(name ?x - t ..)`
fn predicate_def(e: &SExpr<'_>) -> Result<PredicateDef, Error> {
    let items = list(e, "predicate declaration")?;
    let (head, params) = items
        .split_first()
        .ok_or_else(|| unexpected("predicate declaration", e))?;
    Ok(PredicateDef {
        name: String::from(name(head, "predicate name")?),
        parameters: typed_list(params)?,
    })
}

/// Pairs of `:keyword value` following the first `skip` items.
fn keyword_pairs<'s, 'a>(
    items: &'s [SExpr<'a>],
    skip: usize,
    whole: &SExpr<'_>,
) -> Result<Vec<(&'s SExpr<'a>, &'s SExpr<'a>)>, Error> {
    items
        .get(skip..)
        .unwrap_or_default()
        .chunks(2)
        .map(|pair| match pair {
            [k, v] => Ok((k, v)),
            _ => Err(unexpected("keyword followed by a value", whole)),
        })
        .collect()
}

fn action(items: &[SExpr<'_>], whole: &SExpr<'_>) -> Result<ActionDef, Error> {
    let action_name = match items.get(1) {
        Some(n) => name(n, "action name")?,
        None => return Err(BD::Missing(String::from("action name")).into()),
    };

    let mut def = ActionDef {
        name: String::from(action_name),
        parameters: vec![],
        precondition: GoalDef::default(),
        effect: EffectDef::default(),
    };
    for (key, value) in keyword_pairs(items, 2, whole)? {
        if key.is_keyword(":parameters") {
            def.parameters = typed_list(list(value, "parameter list")?)?;
        } else if key.is_keyword(":precondition") {
            def.precondition = parse_goal(value)?;
        } else if key.is_keyword(":effect") {
            def.effect = parse_effect(value)?;
        } else {
            return Err(unexpected("action keyword", key));
        }
    }
    Ok(def)
}

fn derived(items: &[SExpr<'_>], whole: &SExpr<'_>) -> Result<DerivedDef, Error> {
    let [_, head, body] = items else {
        return Err(unexpected("`(:derived (head) body)`", whole));
    };
    Ok(DerivedDef {
        head: predicate_def(head)?,
        body: parse_goal(body)?,
    })
}

fn axiom(items: &[SExpr<'_>], whole: &SExpr<'_>) -> Result<AxiomDef, Error> {
    let mut vars = vec![];
    let mut context = GoalDef::default();
    let mut implies = None;
    for (key, value) in keyword_pairs(items, 1, whole)? {
        if key.is_keyword(":vars") {
            vars = typed_list(list(value, "variable list")?)?;
        } else if key.is_keyword(":context") {
            context = parse_goal(value)?;
        } else if key.is_keyword(":implies") {
            implies = Some(parse_goal(value)?);
        } else {
            return Err(unexpected("axiom keyword", key));
        }
    }
    Ok(AxiomDef {
        vars,
        context,
        implies: implies.ok_or_else(|| BD::Missing(String::from("`:implies` of axiom")))?,
    })
}

/// `(define (kind name) sections*)`
fn header<'s, 'a>(
    root: &'s SExpr<'a>,
    kind: &str,
) -> Result<(String, &'s [SExpr<'a>]), Error> {
    let expected = format!("`(define ({} <name>) ...)`", kind);
    let items = list(root, &expected)?;
    let [define, declaration, sections @ ..] = items else {
        return Err(unexpected(&expected, root));
    };
    if !define.is_keyword("define") {
        return Err(unexpected(&expected, define));
    }
    match list(declaration, &expected)? {
        [k, n] if k.is_keyword(kind) => Ok((String::from(name(n, "name")?), sections)),
        _ => Err(unexpected(&expected, declaration)),
    }
}

/// Lower-cased `:keyword` of a section and all of its items.
fn section<'s, 'a>(e: &'s SExpr<'a>, what: &str) -> Result<(String, &'s [SExpr<'a>]), Error> {
    let items = list(e, what)?;
    let key = match items.first() {
        Some(k) => name(k, what)?,
        None => return Err(unexpected(what, e)),
    };
    Ok((key.to_ascii_lowercase(), items))
}

fn names(args: &[SExpr<'_>], what: &str) -> Result<Vec<String>, Error> {
    args.iter()
        .map(|a| name(a, what).map(String::from))
        .collect()
}

pub fn parse_domain(source: &str) -> Result<DomainDef, Error> {
    let root = parse_one(source, InputKind::Domain)?;
    let (domain_name, sections) = header(&root, "domain")?;
    let mut domain = DomainDef {
        name: domain_name,
        ..Default::default()
    };

    for e in sections {
        let (key, items) = section(e, "domain section")?;
        let args = &items[1..];
        match key.as_str() {
            ":requirements" => domain.requirements.extend(names(args, "requirement")?),
            ":types" => domain.types.extend(typed_list(args)?),
            ":constants" => domain.constants.extend(typed_list(args)?),
            ":predicates" => {
                for p in args {
                    domain.predicates.push(predicate_def(p)?);
                }
            }
            ":functions" => log::warn!("Ignoring `:functions` of domain `{}`.", domain.name),
            ":constraints" => return Err(UF::Constraint(String::from(":constraints")).into()),
            ":action" => domain.actions.push(action(items, e)?),
            ":durative-action" => return Err(UF::DurativeAction.into()),
            ":derived" => domain.derived.push(derived(items, e)?),
            ":axiom" => domain.axioms.push(axiom(items, e)?),
            _ => return Err(unexpected("domain section", e)),
        }
    }

    log::debug!(
        "Parsed domain `{}`: {} types, {} predicates, {} actions.",
        domain.name,
        domain.types.len(),
        domain.predicates.len(),
        domain.actions.len()
    );
    Ok(domain)
}

fn init_fact(e: &SExpr<'_>) -> Result<Option<AtomDef>, Error> {
    let items = list(e, "initial fact")?;
    match items {
        [h, ..] if h.is_keyword("not") => {
            log::warn!("Ignoring negative initial literal `{}`.", e);
            Ok(None)
        }
        [h, ..] if h.is_keyword("=") => Err(UF::NumericFluent(String::from("=")).into()),
        [h, t, SExpr::List(_)]
            if h.is_keyword("at") && t.as_atom().is_some_and(|t| t.parse::<f64>().is_ok()) =>
        {
            Err(UF::TimedInitialLiteral.into())
        }
        _ => {
            let fact = atom(items, e)?;
            if fact.terms.iter().any(|t| matches!(t, TermDef::Variable(_))) {
                return Err(unexpected("ground fact", e));
            }
            Ok(Some(fact))
        }
    }
}

pub fn parse_problem(source: &str) -> Result<ProblemDef, Error> {
    let root = parse_one(source, InputKind::Problem)?;
    let (problem_name, sections) = header(&root, "problem")?;
    let mut domain_name = None;
    let mut goal = None;
    let mut problem = ProblemDef {
        name: problem_name,
        ..Default::default()
    };

    for e in sections {
        let (key, items) = section(e, "problem section")?;
        let args = &items[1..];
        match key.as_str() {
            ":domain" => domain_name = Some(String::from(name(single(args, e)?, "domain name")?)),
            ":requirements" => problem.requirements.extend(names(args, "requirement")?),
            ":objects" => problem.objects.extend(typed_list(args)?),
            ":init" => {
                for fact in args {
                    problem.init.extend(init_fact(fact)?);
                }
            }
            ":goal" => goal = Some(parse_goal(single(args, e)?)?),
            ":constraints" => return Err(UF::Constraint(String::from(":constraints")).into()),
            ":metric" => return Err(UF::MetricSpec.into()),
            ":length" => return Err(UF::LengthSpec.into()),
            _ => return Err(unexpected("problem section", e)),
        }
    }

    problem.domain_name =
        domain_name.ok_or_else(|| BD::Missing(String::from("`:domain` of problem")))?;
    problem.goal = goal.ok_or_else(|| BD::Missing(String::from("`:goal` of problem")))?;
    log::debug!(
        "Parsed problem `{}`: {} objects, {} initial facts.",
        problem.name,
        problem.objects.len(),
        problem.init.len()
    );
    Ok(problem)
}
