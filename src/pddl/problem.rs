use std::collections::{BTreeMap, HashMap};
use std::fmt;

use enumset::EnumSet;

use super::action::InstantaneousAction;
use super::expression::{Expression, Term};
use super::kind::Requirement;
use super::predicate::{Fluent, Parameter};
use super::types::{Object, UserType};
use super::Error;

/// Fluent applied to objects only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundAtom {
    pub fluent: String,
    pub args: Vec<String>,
}

impl GroundAtom {
    pub fn new(fluent: &str, args: &[&str]) -> Self {
        Self { fluent: fluent.to_string(), args: args.iter().map(|a| a.to_string()).collect() }
    }
}

impl fmt::Display for GroundAtom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}", self.fluent)?;
        self.args.iter().try_for_each(|a| write!(f, " {}", a))?;
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QualityMetric {
    #[default]
    MinimizeSequentialPlanLength,
    MinimizeActionCosts { costs: BTreeMap<String, u32>, default: Option<u32> },
}

impl QualityMetric {
    pub fn action_costs(costs: &[(&str, u32)]) -> Self {
        QualityMetric::MinimizeActionCosts {
            costs: costs.iter().map(|(name, cost)| (name.to_string(), *cost)).collect(),
            default: None,
        }
    }

    /// Cost of one application of `action`, `None` when the metric does not
    /// price it.
    pub fn cost_of(&self, action: &str) -> Option<u32> {
        match self {
            QualityMetric::MinimizeSequentialPlanLength => Some(1),
            QualityMetric::MinimizeActionCosts { costs, default } => costs.get(action).copied().or(*default),
        }
    }
}

/// A planning problem: domain model plus instance data.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    name: String,
    types: Vec<UserType>,
    fluents: Vec<Fluent>,
    fluent_defaults: Vec<bool>,
    fluent_mapping: HashMap<String, usize>,
    actions: Vec<InstantaneousAction>,
    objects: Vec<Object>,
    object_mapping: HashMap<String, usize>,
    initial_values: BTreeMap<GroundAtom, bool>,
    goals: Vec<Expression>,
    metric: QualityMetric,
}

impl Problem {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[UserType] {
        &self.types
    }

    pub fn fluents(&self) -> &[Fluent] {
        &self.fluents
    }

    pub fn fluent(&self, name: &str) -> Option<&Fluent> {
        self.fluent_mapping.get(name).map(|i| &self.fluents[*i])
    }

    pub fn fluent_default(&self, name: &str) -> bool {
        self.fluent_mapping.get(name).map(|i| self.fluent_defaults[*i]).unwrap_or(false)
    }

    pub fn actions(&self) -> &[InstantaneousAction] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&InstantaneousAction> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.object_mapping.get(name).map(|i| &self.objects[*i])
    }

    pub fn object_id(&self, name: &str) -> Option<usize> {
        self.object_mapping.get(name).copied()
    }

    /// Objects of `kind` or any of its subtypes, in declaration order.
    pub fn objects_of<'a>(&'a self, kind: &'a UserType) -> impl Iterator<Item = &'a Object> + 'a {
        self.objects.iter().filter(move |o| o.kind().is_subtype_of(kind))
    }

    pub fn goals(&self) -> &[Expression] {
        &self.goals
    }

    pub fn metric(&self) -> &QualityMetric {
        &self.metric
    }

    pub fn explicit_initial_values(&self) -> &BTreeMap<GroundAtom, bool> {
        &self.initial_values
    }

    pub fn initial_value(&self, atom: &GroundAtom) -> bool {
        match self.initial_values.get(atom) {
            Some(v) => *v,
            None => self.fluent_default(&atom.fluent),
        }
    }

    /// Every atom that holds in the initial state, explicit values first,
    /// then the tuples of fluents whose default is `true`.
    pub fn initial_atoms(&self) -> Vec<GroundAtom> {
        let mut atoms: Vec<GroundAtom> = self.initial_values.iter()
            .filter(|(_, v)| **v)
            .map(|(a, _)| a.clone())
            .collect();
        for (fluent, default) in self.fluents.iter().zip(&self.fluent_defaults) {
            if !*default {
                continue;
            }
            let domains: Vec<Vec<&str>> = fluent.parameters().iter()
                .map(|p| self.objects_of(&p.kind).map(|o| o.name()).collect())
                .collect();
            let mut tuple = Vec::with_capacity(domains.len());
            fn rec_product(domains: &[Vec<&str>], tuple: &mut Vec<String>, fluent: &str, out: &mut Vec<GroundAtom>) {
                match domains.split_first() {
                    None => out.push(GroundAtom { fluent: fluent.to_string(), args: tuple.clone() }),
                    Some((first, rest)) => for o in first {
                        tuple.push(o.to_string());
                        rec_product(rest, tuple, fluent, out);
                        tuple.pop();
                    },
                }
            }
            let mut defaults = Vec::new();
            rec_product(&domains, &mut tuple, fluent.name(), &mut defaults);
            atoms.extend(defaults.into_iter().filter(|a| !self.initial_values.contains_key(a)));
        }
        atoms
    }

    fn register_type(&mut self, kind: &UserType) {
        if let Some(father) = kind.father() {
            self.register_type(father);
        }
        if !self.types.iter().any(|t| t.name() == kind.name()) {
            self.types.push(kind.clone());
        }
    }

    pub fn add_fluent(&mut self, fluent: &Fluent, default_initial_value: bool) -> Result<(), Error> {
        if self.fluent_mapping.contains_key(fluent.name()) {
            return Err(Error::Duplicate { namespace: "fluent", name: fluent.name().to_string() });
        }
        fluent.parameters().iter().for_each(|p| self.register_type(&p.kind));
        self.fluent_mapping.insert(fluent.name().to_string(), self.fluents.len());
        self.fluents.push(fluent.clone());
        self.fluent_defaults.push(default_initial_value);
        Ok(())
    }

    pub fn add_object(&mut self, object: &Object) -> Result<(), Error> {
        if self.object_mapping.contains_key(object.name()) {
            return Err(Error::Duplicate { namespace: "object", name: object.name().to_string() });
        }
        self.register_type(object.kind());
        self.object_mapping.insert(object.name().to_string(), self.objects.len());
        self.objects.push(object.clone());
        Ok(())
    }

    pub fn add_objects(&mut self, objects: &[Object]) -> Result<(), Error> {
        objects.iter().try_for_each(|o| self.add_object(o))
    }

    /// Checks fluent existence, arity, variable scope and argument types of
    /// one literal.
    fn check_literal(&self, fluent: &str, args: &[Term], scope: &[&Parameter], scope_name: &str) -> Result<(), Error> {
        let declared = self.fluent(fluent).ok_or_else(|| Error::UndeclaredFluent(fluent.to_string()))?;
        if declared.arity() != args.len() {
            return Err(Error::Arity { fluent: fluent.to_string(), expected: declared.arity(), found: args.len() });
        }
        for (arg, expected) in args.iter().zip(declared.parameters()) {
            let found = match arg {
                Term::Variable(v) => match scope.iter().find(|p| &p.name == v) {
                    Some(p) => &p.kind,
                    None => return Err(Error::UndeclaredVariable { scope: scope_name.to_string(), variable: v.clone() }),
                },
                Term::Object(o) => match self.object(o) {
                    Some(object) => object.kind(),
                    None => return Err(Error::UndeclaredObject(o.clone())),
                },
            };
            if !found.is_subtype_of(&expected.kind) {
                return Err(Error::TypeMismatch {
                    fluent: fluent.to_string(),
                    argument: arg.to_string(),
                    expected: expected.kind.name().to_string(),
                    found: found.name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_expression(&self, e: &Expression, scope: &[&Parameter], scope_name: &str) -> Result<(), Error> {
        for literal in e.literals()? {
            self.check_literal(literal.fluent, literal.args, scope, scope_name)?;
        }
        Ok(())
    }

    pub fn add_action(&mut self, action: InstantaneousAction) -> Result<(), Error> {
        if self.action(action.name()).is_some() {
            return Err(Error::Duplicate { namespace: "action", name: action.name().to_string() });
        }
        let params: Vec<&Parameter> = action.parameters().iter().collect();
        for precondition in action.preconditions() {
            self.check_expression(precondition, &params, action.name())?;
        }
        for effect in action.effects() {
            let mut scope = params.clone();
            scope.extend(effect.forall.iter());
            self.check_literal(&effect.fluent, &effect.args, &scope, action.name())?;
            if let Some(condition) = &effect.condition {
                self.check_expression(condition, &scope, action.name())?;
            }
        }
        let mut kinds: Vec<UserType> = action.parameters().iter().map(|p| p.kind.clone()).collect();
        kinds.extend(action.effects().iter().flat_map(|e| e.forall.iter().map(|p| p.kind.clone())));
        kinds.iter().for_each(|k| self.register_type(k));
        self.actions.push(action);
        Ok(())
    }

    pub fn set_initial_value(&mut self, atom: Expression, value: bool) -> Result<(), Error> {
        let atom = self.ground_atom(&atom)?;
        self.initial_values.insert(atom, value);
        Ok(())
    }

    /// Validates a ground literal expression and converts it to a `GroundAtom`.
    pub fn ground_atom(&self, atom: &Expression) -> Result<GroundAtom, Error> {
        match atom {
            Expression::Literal { fluent, args } => {
                if !atom.is_ground() {
                    return Err(Error::NotGround(atom.to_string()));
                }
                self.check_literal(fluent, args, &[], "init")?;
                Ok(GroundAtom {
                    fluent: fluent.clone(),
                    args: args.iter().map(|a| match a {
                        Term::Object(o) | Term::Variable(o) => o.clone(),
                    }).collect(),
                })
            }
            other => Err(Error::Unsupported(format!("initial value target {} must be a single literal", other))),
        }
    }

    pub fn add_goal(&mut self, goal: Expression) -> Result<(), Error> {
        if !goal.is_ground() {
            return Err(Error::NotGround(goal.to_string()));
        }
        self.check_expression(&goal, &[], "goal")?;
        self.goals.push(goal);
        Ok(())
    }

    pub fn add_quality_metric(&mut self, metric: QualityMetric) -> Result<(), Error> {
        if let QualityMetric::MinimizeActionCosts { costs, .. } = &metric {
            if let Some(unknown) = costs.keys().find(|name| self.action(name).is_none()) {
                return Err(Error::UndeclaredAction(unknown.clone()));
            }
        }
        self.metric = metric;
        Ok(())
    }

    /// Language features used by this problem.
    pub fn kind(&self) -> EnumSet<Requirement> {
        let mut kind = EnumSet::only(Requirement::Strips);
        if !self.types.is_empty() {
            kind.insert(Requirement::Typing);
        }
        let negative = |e: &Expression| e.literals().map(|ls| ls.iter().any(|l| !l.positive)).unwrap_or(false);
        for action in &self.actions {
            if action.preconditions().iter().any(negative) {
                kind.insert(Requirement::NegativePreconditions);
            }
            for effect in action.effects() {
                if effect.is_conditional() {
                    kind.insert(Requirement::ConditionalEffects);
                    if effect.condition.iter().any(negative) {
                        kind.insert(Requirement::NegativePreconditions);
                    }
                }
                if !effect.forall.is_empty() {
                    kind.insert(Requirement::UniversalEffects);
                }
            }
        }
        if self.goals.iter().any(negative) {
            kind.insert(Requirement::NegativePreconditions);
        }
        if let QualityMetric::MinimizeActionCosts { .. } = self.metric {
            kind.insert(Requirement::ActionCosts);
        }
        kind
    }
}

#[cfg(test)]
mod tests {
    use enumset::enum_set;

    use super::super::{Error, Fluent, InstantaneousAction, Object, UserType};
    use super::{GroundAtom, Problem, QualityMetric, Requirement};
    use crate::expNot;

    fn blocks() -> (Problem, Fluent, Fluent, UserType) {
        let cell = UserType::new("cell");
        let clear = Fluent::new("clear", &[("c", &cell)]);
        let next = Fluent::new("next", &[("a", &cell), ("b", &cell)]);
        let mut problem = Problem::new("cells");
        problem.add_fluent(&clear, false).unwrap();
        problem.add_fluent(&next, false).unwrap();
        problem.add_objects(&[Object::new("c0", &cell), Object::new("c1", &cell)]).unwrap();
        (problem, clear, next, cell)
    }

    #[test]
    fn test_initial_values_and_defaults() {
        let (mut problem, clear, _, _) = blocks();
        problem.set_initial_value(clear.call(&["c0"]), true).unwrap();
        assert!(problem.initial_value(&GroundAtom::new("clear", &["c0"])));
        assert!(!problem.initial_value(&GroundAtom::new("clear", &["c1"])));
    }

    #[test]
    fn test_rejects_bad_literals() {
        let (mut problem, clear, next, cell) = blocks();
        assert_eq!(problem.set_initial_value(clear.call(&["c9"]), true), Err(Error::UndeclaredObject("c9".to_string())));
        assert!(matches!(problem.set_initial_value(next.call(&["c0"]), true), Err(Error::Arity { expected: 2, found: 1, .. })));
        assert!(matches!(problem.add_goal(clear.call(&["?x"])), Err(Error::NotGround(_))));
        let ghost = Fluent::new("ghost", &[("c", &cell)]);
        assert_eq!(problem.add_goal(ghost.call(&["c0"])), Err(Error::UndeclaredFluent("ghost".to_string())));
        assert!(matches!(problem.add_fluent(&clear, false), Err(Error::Duplicate { .. })));
    }

    #[test]
    fn test_type_mismatch() {
        let (mut problem, clear, _, _) = blocks();
        let car = UserType::new("car");
        problem.add_object(&Object::new("car0", &car)).unwrap();
        assert!(matches!(problem.set_initial_value(clear.call(&["car0"]), true), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_action_scope() {
        let (mut problem, clear, next, cell) = blocks();
        let mut step = InstantaneousAction::new("step", &[("from", &cell), ("to", &cell)]);
        step.add_precondition(next.call(&["?from", "?to"]));
        step.add_precondition(expNot!(clear.call(&["?nowhere"])));
        assert!(matches!(problem.add_action(step), Err(Error::UndeclaredVariable { .. })));

        let mut step = InstantaneousAction::new("step", &[("from", &cell), ("to", &cell)]);
        step.add_precondition(next.call(&["?from", "?to"]));
        step.add_precondition(expNot!(clear.call(&["?to"])));
        step.add_effect(clear.call(&["?to"]), true).unwrap();
        problem.add_action(step).unwrap();
        assert!(matches!(problem.add_quality_metric(QualityMetric::action_costs(&[("jump", 1)])), Err(Error::UndeclaredAction(_))));
        problem.add_quality_metric(QualityMetric::action_costs(&[("step", 3)])).unwrap();
        assert_eq!(problem.metric().cost_of("step"), Some(3));
        assert_eq!(problem.kind(), enum_set!(Requirement::Strips | Requirement::Typing
            | Requirement::NegativePreconditions | Requirement::ActionCosts));
    }
}
