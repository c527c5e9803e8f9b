//! Grounded semantics for typed PDDL domains.
//!
//! A [Problem] is built once from a parsed domain and problem and then
//! answers queries about state transitions, action validity, goal
//! satisfaction and the legal groundings of actions.
//!
//!```
//! use pddl_semantics::Problem;
//!
//! let domain = r#"
//! (define (domain switches)
//!   (:requirements :strips :typing)
//!   (:types switch)
//!   (:predicates (on ?s - switch) (off ?s - switch))
//!   (:action flip-on
//!     :parameters (?s - switch)
//!     :precondition (off ?s)
//!     :effect (and (on ?s) (not (off ?s)))))
//! "#;
//! let problem = r#"
//! (define (problem lights)
//!   (:domain switches)
//!   (:objects s1 s2 - switch)
//!   (:init (off s1) (off s2))
//!   (:goal (and (on s1) (on s2))))
//! "#;
//!
//! let problem = Problem::from_pddl(domain, problem).unwrap();
//! assert!(problem.is_valid_plan(&["flip-on s1", "flip-on s2"]).unwrap());
//! assert!(!problem.is_valid_plan(&["flip-on s1"]).unwrap());
//!```
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod action;
pub mod axiom;
pub mod calculus;
pub mod effect;
pub mod entity;
pub mod error;
pub mod grounding;
pub mod parser;
pub mod problem;
pub mod state;
pub mod text;
mod translate;
pub mod util;
pub mod validator;

pub use action::{Action, GroundAction};
pub use axiom::Axiom;
pub use calculus::{first_order::Formula, predicate::Proposition};
pub use entity::{Object, ObjectIndex, Type};
pub use error::Error;
pub use grounding::{Parameter, ParameterGenerator};
pub use problem::Problem;
pub use state::State;
pub use text::Stringify;
pub use validator::{Report, ValidationOptions};

use alloc::string::String;
use spin::Mutex;
use string_interner::{backend::BufferBackend, symbol::SymbolU32, StringInterner};

type InternerSymbol = SymbolU32;
type Interner = StringInterner<BufferBackend<InternerSymbol>>;
lazy_static::lazy_static! {
    static ref INTERNER: Mutex<Interner> = Mutex::new(Interner::new());
}

pub(crate) fn intern(name: &str) -> InternerSymbol {
    INTERNER.lock().get_or_intern(name)
}

/// Looks a name up without interning it.
/// Names that were never interned cannot belong to any entity.
pub(crate) fn lookup_symbol(name: &str) -> Option<InternerSymbol> {
    INTERNER.lock().get(name)
}

pub(crate) fn resolve(symbol: InternerSymbol) -> String {
    String::from(
        INTERNER
            .lock()
            .resolve(symbol)
            .expect("Symbols are only created by the interner."),
    )
}
