use alloc::string::String;
use thiserror::Error;

/// Which piece of input text a syntax error was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Domain,
    Problem,
    Plan,
}

impl core::fmt::Display for InputKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::Problem => write!(f, "problem"),
            Self::Plan => write!(f, "plan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The front end could not produce a domain or a problem.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(#[from] UnsupportedFeature),
    /// A textual action call or proposition does not match the model.
    #[error("invalid call: {0}")]
    InvalidCall(#[from] InvalidCall),
    #[error(
        "object `{object}` of type `{found}` cannot be bound to parameter `{parameter}` of type `{expected}`"
    )]
    InvalidArgumentType {
        parameter: String,
        expected: String,
        object: String,
        found: String,
    },
    #[error("variable `{0}` is not bound")]
    UnboundVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInput {
    /// The text is written incorrectly.
    #[error("syntax error in {input} at line {line}: {reason}")]
    Syntax {
        input: InputKind,
        line: usize,
        reason: String,
    },
    /// The text parses but does not describe a consistent domain or problem.
    #[error("{0}")]
    BadDefinition(#[from] BadDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadDefinition {
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("predicate `{predicate}` expects {expected} arguments, got {found}")]
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },
    #[error("problem is defined for domain `{found}`, not `{expected}`")]
    WrongDomain { expected: String, found: String },
    #[error("type `{0}` inherits from itself")]
    CircularInheritance(String),
    #[error("type `{0}` already has a different super type")]
    AlreadyHasSuperType(String),
    #[error("axiom for `{0}` must imply a positive atom")]
    NegatedAxiomHead(String),
    #[error("expected {expected}, found `{found}`")]
    Unexpected { expected: String, found: String },
    #[error("missing {0}")]
    Missing(String),
    #[error("`{0}` is not a valid name")]
    InvalidName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedFeature {
    #[error("`either` types")]
    EitherOfTypes,
    #[error("numeric fluents (`{0}`)")]
    NumericFluent(String),
    #[error("temporal construct (`{0}`)")]
    Temporal(String),
    #[error("preferences")]
    Preference,
    #[error("constraint (`{0}`)")]
    Constraint(String),
    #[error("durative actions")]
    DurativeAction,
    #[error("timed initial literals")]
    TimedInitialLiteral,
    #[error("metric specification")]
    MetricSpec,
    #[error("length specification")]
    LengthSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCall {
    #[error("cannot read `{0}` as a call")]
    Malformed(String),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("`{name}` takes {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

impl From<BadDefinition> for Error {
    fn from(value: BadDefinition) -> Self {
        Self::MalformedInput(MalformedInput::BadDefinition(value))
    }
}
