//! Typed fluent/action modelling layer.
//!
//! Problems are built programmatically: declare types and fluents, add action
//! schemas with preconditions and effects, then objects, initial values, goals
//! and an optional quality metric. Every builder call validates what it is
//! given against the declarations made so far.
pub mod action;
pub mod expression;
pub mod kind;
pub mod predicate;
pub mod problem;
pub mod types;
pub mod writer;

pub use action::{Effect, InstantaneousAction};
pub use expression::{Expression, Term};
pub use kind::Requirement;
pub use predicate::{Fluent, Parameter};
pub use problem::{GroundAtom, Problem, QualityMetric};
pub use types::{Object, UserType};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{namespace} '{name}' is declared twice")]
    Duplicate { namespace: &'static str, name: String },

    #[error("fluent '{0}' is not declared")]
    UndeclaredFluent(String),

    #[error("object '{0}' is not declared")]
    UndeclaredObject(String),

    #[error("action '{0}' is not declared")]
    UndeclaredAction(String),

    #[error("variable '?{variable}' is not a parameter of '{scope}'")]
    UndeclaredVariable { scope: String, variable: String },

    #[error("fluent '{fluent}' takes {expected} arguments, got {found}")]
    Arity { fluent: String, expected: usize, found: usize },

    #[error("argument '{argument}' of '{fluent}' has type '{found}', expected '{expected}'")]
    TypeMismatch { fluent: String, argument: String, expected: String, found: String },

    #[error("expression {0} is not ground")]
    NotGround(String),

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("no cost given for action '{0}'")]
    MissingCost(String),
}
