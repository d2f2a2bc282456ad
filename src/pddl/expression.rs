use std::collections::BTreeSet;
use std::fmt;

use super::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Variable(String),
    Object(String),
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        match s.strip_prefix('?') {
            Some(name) => Term::Variable(name.to_string()),
            None => Term::Object(s.to_string()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "?{}", v),
            Term::Object(o) => write!(f, "{}", o),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    And(Vec<Expression>),
    Not(Box<Expression>),
    Literal { fluent: String, args: Vec<Term> },
}

#[macro_export]
macro_rules! expNot {
    ( $e: expr ) => {
        $crate::pddl::Expression::Not(Box::new($e.clone()))
    };
}

#[macro_export]
macro_rules! expAnd {
    ( $($e: expr), * ) => {
        {
            let mut temp_vec = Vec::new();
            $(
                temp_vec.push($e.clone());
            )*
            $crate::pddl::Expression::And(temp_vec)
        }
    };
}

/// One (possibly negated) literal of a flattened conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal<'a> {
    pub positive: bool,
    pub fluent: &'a str,
    pub args: &'a [Term],
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::And(v) => {
                write!(f, "(and")?;
                v.iter().try_for_each(|item| write!(f, " {}", item))?;
                write!(f, ")")
            }
            Expression::Not(item) => write!(f, "(not {})", item),
            Expression::Literal { fluent, args } => {
                write!(f, "({}", fluent)?;
                args.iter().try_for_each(|a| write!(f, " {}", a))?;
                write!(f, ")")
            }
        }
    }
}

impl Expression {
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut variable_set = BTreeSet::new();
        fn rec_collect<'e>(e: &'e Expression, set: &mut BTreeSet<&'e str>) {
            match e {
                Expression::And(v) => v.iter().for_each(|e| rec_collect(e, set)),
                Expression::Not(e) => rec_collect(e, set),
                Expression::Literal { args, .. } => set.extend(args.iter().filter_map(|a| match a {
                    Term::Variable(v) => Some(v.as_str()),
                    Term::Object(_) => None,
                })),
            }
        }
        rec_collect(self, &mut variable_set);
        variable_set
    }

    pub fn is_ground(&self) -> bool {
        self.variables().is_empty()
    }

    /// Flattens a conjunction of literals. Negation is only allowed directly
    /// above a literal (double negation cancels out).
    pub fn literals(&self) -> Result<Vec<Literal<'_>>, Error> {
        let mut out = Vec::new();
        fn rec_flatten<'e>(e: &'e Expression, positive: bool, out: &mut Vec<Literal<'e>>) -> Result<(), Error> {
            match e {
                Expression::And(v) if positive => v.iter().try_for_each(|e| rec_flatten(e, true, out)),
                Expression::And(_) => Err(Error::Unsupported(format!("negated conjunction (not {})", e))),
                Expression::Not(inner) => rec_flatten(inner, !positive, out),
                Expression::Literal { fluent, args } => {
                    out.push(Literal { positive, fluent, args });
                    Ok(())
                }
            }
        }
        rec_flatten(self, true, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{Expression, Term};
    use crate::{expAnd, expNot};

    fn lit(fluent: &str, args: &[&str]) -> Expression {
        Expression::Literal { fluent: fluent.to_string(), args: args.iter().map(|a| Term::from(*a)).collect() }
    }

    #[test]
    fn test_flatten() {
        let e = expAnd!(lit("clear", &["?xf"]), expNot!(lit("in_place", &["?r1"])), expNot!(expNot!(lit("clear", &["a"]))));
        let literals = e.literals().unwrap();
        assert_eq!(literals.len(), 3);
        assert!(literals[0].positive);
        assert!(!literals[1].positive);
        assert_eq!(literals[1].fluent, "in_place");
        assert!(literals[2].positive);
        assert_eq!(e.variables().into_iter().collect::<Vec<_>>(), vec!["r1", "xf"]);
        assert!(!e.is_ground());
    }

    #[test]
    fn test_negated_and_is_rejected() {
        let e = expNot!(expAnd!(lit("clear", &["a"])));
        assert!(e.literals().is_err());
    }

    #[test]
    fn test_display() {
        let e = expAnd!(lit("connected", &["?x", "f0-0f"]), expNot!(lit("clear", &["?x"])));
        assert_eq!(format!("{}", e), "(and (connected ?x f0-0f) (not (clear ?x)))");
    }
}
