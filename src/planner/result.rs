use std::fmt;

use thiserror::Error;

use super::task::Task;
use crate::pddl::{self, Problem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanGenerationResultStatus {
    SolvedSatisficing,
    SolvedOptimally,
    UnsolvableProven,
    Timeout,
    UnsupportedProblem,
    InternalError,
}

impl PlanGenerationResultStatus {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::SolvedSatisficing | Self::SolvedOptimally)
    }
}

impl fmt::Display for PlanGenerationResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::SolvedSatisficing => "SOLVED_SATISFICING",
            Self::SolvedOptimally => "SOLVED_OPTIMALLY",
            Self::UnsolvableProven => "UNSOLVABLE_PROVEN",
            Self::Timeout => "TIMEOUT",
            Self::UnsupportedProblem => "UNSUPPORTED_PROBLEM",
            Self::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", name)
    }
}

/// An action schema applied to concrete objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInstance {
    pub action: String,
    pub parameters: Vec<String>,
}

impl fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.action, self.parameters.join(", "))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Model(#[from] pddl::Error),
    #[error("step {step}: no action `{action}` in the problem")]
    UnknownAction { step: usize, action: String },
    #[error("step {step}: `{action}` is not applicable")]
    Inapplicable { step: usize, action: String },
    #[error("the plan does not reach the goal")]
    GoalNotReached,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequentialPlan {
    actions: Vec<ActionInstance>,
}

impl SequentialPlan {
    pub fn new(actions: Vec<ActionInstance>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[ActionInstance] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Replays the plan from the initial state of `problem` and returns its cost.
    pub fn validate(&self, problem: &Problem) -> Result<u64, ValidationError> {
        let task = Task::ground(problem)?;
        let mut state = task.init().clone();
        let mut cost = 0u64;
        for (step, instance) in self.actions.iter().enumerate() {
            let name = instance.to_string();
            let action = match task.find_action(&name) {
                Some(i) => &task.actions()[i],
                // never grounded means never applicable, unless the schema is unknown
                None if problem.action(&instance.action).is_some() => {
                    return Err(ValidationError::Inapplicable { step, action: name })
                }
                None => return Err(ValidationError::UnknownAction { step, action: name }),
            };
            if !task.is_applicable(&state, action) {
                return Err(ValidationError::Inapplicable { step, action: name });
            }
            state = task.apply(&state, action);
            cost += action.cost as u64;
        }
        if task.is_goal(&state) { Ok(cost) } else { Err(ValidationError::GoalNotReached) }
    }
}

impl fmt::Display for SequentialPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SequentialPlan:")?;
        for action in &self.actions {
            writeln!(f, "    {}", action)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PlanGenerationResult {
    pub status: PlanGenerationResultStatus,
    pub plan: Option<SequentialPlan>,
    pub engine_name: String,
    /// Plan cost under the problem's quality metric.
    pub metric_value: Option<u64>,
    pub log: Vec<String>,
}

impl PlanGenerationResult {
    pub fn is_solved(&self) -> bool {
        self.status.is_solved()
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionInstance, PlanGenerationResultStatus, SequentialPlan, ValidationError};
    use crate::pddl::{Fluent, InstantaneousAction, Object, Problem, UserType};

    fn lamp() -> Problem {
        let lamp = UserType::new("lamp");
        let on = Fluent::new("on", &[("l", &lamp)]);
        let mut problem = Problem::new("lamp");
        problem.add_fluent(&on, false).unwrap();
        let mut switch_on = InstantaneousAction::new("switch_on", &[("l", &lamp)]);
        switch_on.add_effect(on.call(&["?l"]), true).unwrap();
        problem.add_action(switch_on).unwrap();
        let mut switch_off = InstantaneousAction::new("switch_off", &[("l", &lamp)]);
        switch_off.add_precondition(on.call(&["?l"]));
        switch_off.add_effect(on.call(&["?l"]), false).unwrap();
        problem.add_action(switch_off).unwrap();
        problem.add_object(&Object::new("l1", &lamp)).unwrap();
        problem.add_goal(on.call(&["l1"])).unwrap();
        problem
    }

    fn step(action: &str) -> ActionInstance {
        ActionInstance { action: action.to_string(), parameters: vec!["l1".to_string()] }
    }

    #[test]
    fn test_validate() {
        let problem = lamp();
        let plan = SequentialPlan::new(vec![step("switch_on"), step("switch_off"), step("switch_on")]);
        assert_eq!(plan.validate(&problem), Ok(3));
        assert_eq!(plan.to_string(), "SequentialPlan:\n    switch_on(l1)\n    switch_off(l1)\n    switch_on(l1)\n");

        let bad = SequentialPlan::new(vec![step("switch_on"), step("switch_on"), step("switch_off")]);
        assert_eq!(bad.validate(&problem), Err(ValidationError::GoalNotReached));
        let bad = SequentialPlan::new(vec![step("switch_off")]);
        assert!(matches!(bad.validate(&problem), Err(ValidationError::Inapplicable { step: 0, .. })));
        let bad = SequentialPlan::new(vec![step("toggle")]);
        assert!(matches!(bad.validate(&problem), Err(ValidationError::UnknownAction { step: 0, .. })));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(PlanGenerationResultStatus::SolvedOptimally.to_string(), "SOLVED_OPTIMALLY");
        assert!(PlanGenerationResultStatus::SolvedSatisficing.is_solved());
        assert!(!PlanGenerationResultStatus::Timeout.is_solved());
    }
}
