use std::fmt;

use super::expression::{Expression, Term};
use super::predicate::Parameter;
use super::types::UserType;
use super::Error;

/// Assignment of a fluent literal, optionally guarded by a condition and
/// quantified over extra variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub fluent: String,
    pub args: Vec<Term>,
    pub value: bool,
    pub condition: Option<Expression>,
    pub forall: Vec<Parameter>,
}

impl Effect {
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let target = Expression::Literal { fluent: self.fluent.clone(), args: self.args.clone() };
        let assignment = if self.value { format!("{}", target) } else { format!("(not {})", target) };
        let guarded = match &self.condition {
            Some(c) => format!("(when {} {})", c, assignment),
            None => assignment,
        };
        if self.forall.is_empty() {
            write!(f, "{}", guarded)
        } else {
            let vars = self.forall.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ");
            write!(f, "(forall ({}) {})", vars, guarded)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantaneousAction {
    name: String,
    parameters: Vec<Parameter>,
    preconditions: Vec<Expression>,
    effects: Vec<Effect>,
}

impl InstantaneousAction {
    pub fn new(name: &str, parameters: &[(&str, &UserType)]) -> Self {
        Self {
            name: name.to_string(),
            parameters: Parameter::list(parameters),
            preconditions: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn preconditions(&self) -> &[Expression] {
        &self.preconditions
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// All preconditions as a single conjunction.
    pub fn precondition(&self) -> Expression {
        Expression::And(self.preconditions.clone())
    }

    pub fn add_precondition(&mut self, precondition: Expression) {
        self.preconditions.push(precondition);
    }

    pub fn add_effect(&mut self, target: Expression, value: bool) -> Result<(), Error> {
        self.add_effect_with(target, value, None, &[])
    }

    pub fn add_conditional_effect(&mut self, target: Expression, value: bool, condition: Expression) -> Result<(), Error> {
        self.add_effect_with(target, value, Some(condition), &[])
    }

    /// `forall` declares variables that range over every object of their
    /// type; they may appear in `target` and `condition`.
    pub fn add_effect_with(&mut self, target: Expression, value: bool, condition: Option<Expression>,
            forall: &[(&str, &UserType)]) -> Result<(), Error> {
        match target {
            Expression::Literal { fluent, args } => {
                self.effects.push(Effect { fluent, args, value, condition, forall: Parameter::list(forall) });
                Ok(())
            }
            other => Err(Error::Unsupported(format!("effect target {} must be a single literal", other))),
        }
    }
}

impl fmt::Display for InstantaneousAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let params = self.parameters.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ");
        let effects = self.effects.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" ");
        write!(f, "(:action {} :parameters ({}) :precondition {} :effect (and {}))",
            self.name, params, self.precondition(), effects)
    }
}
