use std::fmt;

use super::expression::{Expression, Term};
use super::types::UserType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub kind: UserType,
}

impl Parameter {
    pub fn new(name: &str, kind: &UserType) -> Self {
        Self { name: name.to_string(), kind: kind.clone() }
    }

    pub(crate) fn list(parameters: &[(&str, &UserType)]) -> Vec<Parameter> {
        parameters.iter().map(|(name, kind)| Parameter::new(name, kind)).collect()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "?{} - {}", self.name, self.kind)
    }
}

/// Boolean state variable. Fluents are referenced by name from expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fluent {
    name: String,
    parameters: Vec<Parameter>,
}

impl Fluent {
    pub fn new(name: &str, parameters: &[(&str, &UserType)]) -> Fluent {
        Fluent { name: name.to_string(), parameters: Parameter::list(parameters) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Literal over this fluent. `?x` arguments are variables, anything else
    /// names an object.
    pub fn call(&self, args: &[&str]) -> Expression {
        Expression::Literal {
            fluent: self.name.clone(),
            args: args.iter().map(|a| Term::from(*a)).collect(),
        }
    }
}

impl fmt::Display for Fluent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}", self.name)?;
        for p in &self.parameters {
            write!(f, " {}", p)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Expression, Term, UserType};
    use super::Fluent;

    #[test]
    fn test_call_builds_literal() {
        let junction = UserType::new("junction");
        let same_line = Fluent::new("same_line", &[("xy", &junction), ("xy2", &junction)]);
        assert_eq!(same_line.arity(), 2);
        assert_eq!(same_line.call(&["?xy", "junction0-0"]), Expression::Literal {
            fluent: "same_line".to_string(),
            args: vec![Term::Variable("xy".to_string()), Term::Object("junction0-0".to_string())],
        });
        assert_eq!(format!("{}", same_line), "(same_line ?xy - junction ?xy2 - junction)");
    }
}
