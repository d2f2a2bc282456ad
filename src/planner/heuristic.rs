//! Delete-relaxation heuristics.
//!
//! Negative preconditions and delete effects are ignored. A conditional
//! effect becomes its own relaxed operator whose precondition is the action
//! precondition plus the effect condition.
use std::cmp::Reverse;

use priority_queue::PriorityQueue;

use super::state::State;
use super::task::Task;

const INFINITY: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicKind {
    /// 0 on goal states, cheapest action cost elsewhere.
    Blind,
    /// Admissible.
    HMax,
    HAdd,
    HFF,
}

#[derive(Debug)]
struct RelaxedOperator {
    pre: Vec<usize>,
    add: Vec<usize>,
    cost: u64,
}

pub struct Heuristic<'t> {
    kind: HeuristicKind,
    task: &'t Task,
    operators: Vec<RelaxedOperator>,
    precondition_of: Vec<Vec<usize>>,
    no_pre: Vec<usize>,
    cheapest_action: Option<u64>,
    atom_cost: Vec<u64>,
    supporter: Vec<Option<usize>>,
    unsatisfied: Vec<usize>,
    operator_value: Vec<u64>,
    marked: Vec<bool>,
}

impl<'t> Heuristic<'t> {
    pub fn new(task: &'t Task, kind: HeuristicKind) -> Self {
        let mut operators = Vec::new();
        for action in task.actions() {
            let cost = action.cost as u64;
            if !action.add.is_empty() {
                operators.push(RelaxedOperator { pre: action.pre.clone(), add: action.add.clone(), cost });
            }
            for c in action.conditional.iter().filter(|c| !c.add.is_empty()) {
                let mut pre = action.pre.clone();
                pre.extend(&c.condition);
                pre.sort_unstable();
                pre.dedup();
                operators.push(RelaxedOperator { pre, add: c.add.clone(), cost });
            }
        }
        let atom_count = task.atoms().len();
        let mut precondition_of = vec![Vec::new(); atom_count];
        let mut no_pre = Vec::new();
        for (i, op) in operators.iter().enumerate() {
            if op.pre.is_empty() {
                no_pre.push(i);
            }
            op.pre.iter().for_each(|p| precondition_of[*p].push(i));
        }
        let n = operators.len();
        Self {
            kind,
            task,
            operators,
            precondition_of,
            no_pre,
            cheapest_action: task.actions().iter().map(|a| a.cost as u64).min(),
            atom_cost: vec![INFINITY; atom_count],
            supporter: vec![None; atom_count],
            unsatisfied: vec![0; n],
            operator_value: vec![0; n],
            marked: vec![false; n],
        }
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }

    /// Estimated cost to the goal, `None` for recognized dead ends.
    pub fn evaluate(&mut self, state: &State) -> Option<u64> {
        match self.kind {
            HeuristicKind::Blind => {
                if self.task.is_goal(state) { Some(0) } else { self.cheapest_action }
            }
            HeuristicKind::HMax => {
                self.explore(state, u64::max);
                self.goal_costs().map(|costs| costs.max().unwrap_or(0))
            }
            HeuristicKind::HAdd => {
                self.explore(state, |a, b| a.saturating_add(b));
                self.goal_costs().map(|costs| costs.fold(0u64, |acc, c| acc.saturating_add(c)))
            }
            HeuristicKind::HFF => {
                self.explore(state, |a, b| a.saturating_add(b));
                self.goal_costs()?;
                Some(self.relaxed_plan_cost(state))
            }
        }
    }

    fn goal_costs(&self) -> Option<impl Iterator<Item = u64> + '_> {
        if self.task.goal().iter().any(|g| self.atom_cost[*g] == INFINITY) {
            None
        } else {
            Some(self.task.goal().iter().map(|g| self.atom_cost[*g]))
        }
    }

    /// Generalized Dijkstra over the relaxed operators. Stops once every goal
    /// atom has a final cost.
    fn explore<F: Fn(u64, u64) -> u64>(&mut self, state: &State, combine: F) {
        self.atom_cost.iter_mut().for_each(|c| *c = INFINITY);
        self.supporter.iter_mut().for_each(|s| *s = None);
        self.operator_value.iter_mut().for_each(|v| *v = 0);
        for (u, op) in self.unsatisfied.iter_mut().zip(&self.operators) {
            *u = op.pre.len();
        }

        let mut queue = PriorityQueue::new();
        for atom in state.iter() {
            self.atom_cost[atom] = 0;
            queue.push(atom, Reverse(0));
        }
        for i in 0..self.no_pre.len() {
            let op = self.no_pre[i];
            self.fire(op, &mut queue);
        }
        let mut goals_left = self.task.goal().len();
        let mut is_goal = vec![false; self.atom_cost.len()];
        self.task.goal().iter().for_each(|g| is_goal[*g] = true);

        while let Some((atom, Reverse(cost))) = queue.pop() {
            if is_goal[atom] {
                goals_left -= 1;
                if goals_left == 0 {
                    break;
                }
            }
            for i in 0..self.precondition_of[atom].len() {
                let op = self.precondition_of[atom][i];
                self.unsatisfied[op] -= 1;
                self.operator_value[op] = combine(self.operator_value[op], cost);
                if self.unsatisfied[op] == 0 {
                    self.fire(op, &mut queue);
                }
            }
        }
    }

    fn fire(&mut self, op: usize, queue: &mut PriorityQueue<usize, Reverse<u64>>) {
        let value = self.operator_value[op].saturating_add(self.operators[op].cost);
        for i in 0..self.operators[op].add.len() {
            let atom = self.operators[op].add[i];
            if value < self.atom_cost[atom] {
                self.atom_cost[atom] = value;
                self.supporter[atom] = Some(op);
                queue.push(atom, Reverse(value));
            }
        }
    }

    /// Cost of the relaxed plan read off the best supporters.
    fn relaxed_plan_cost(&mut self, state: &State) -> u64 {
        self.marked.iter_mut().for_each(|m| *m = false);
        let mut total = 0u64;
        let mut stack: Vec<usize> = self.task.goal().to_vec();
        while let Some(atom) = stack.pop() {
            if state.contains(atom) {
                continue;
            }
            if let Some(op) = self.supporter[atom] {
                if !self.marked[op] {
                    self.marked[op] = true;
                    total += self.operators[op].cost;
                    stack.extend(&self.operators[op].pre);
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::{Heuristic, HeuristicKind};
    use crate::pddl::{Fluent, InstantaneousAction, Object, Problem, QualityMetric, UserType};
    use crate::planner::task::Task;

    /// Chain a -> b -> c with costs 2 and 3, plus a shortcut a -> c of cost 10.
    fn chain() -> Task {
        let node = UserType::new("node");
        let at = Fluent::new("at", &[("n", &node)]);
        let mut problem = Problem::new("chain");
        problem.add_fluent(&at, false).unwrap();
        problem.add_objects(&[Object::new("a", &node), Object::new("b", &node), Object::new("c", &node)]).unwrap();
        for (name, from, to) in [("ab", "a", "b"), ("bc", "b", "c"), ("ac", "a", "c")] {
            let mut hop = InstantaneousAction::new(name, &[]);
            hop.add_precondition(at.call(&[from]));
            hop.add_effect(at.call(&[to]), true).unwrap();
            hop.add_effect(at.call(&[from]), false).unwrap();
            problem.add_action(hop).unwrap();
        }
        problem.add_quality_metric(QualityMetric::action_costs(&[("ab", 2), ("bc", 3), ("ac", 10)])).unwrap();
        problem.set_initial_value(at.call(&["a"]), true).unwrap();
        problem.add_goal(at.call(&["c"])).unwrap();
        Task::ground(&problem).unwrap()
    }

    #[test]
    fn test_relaxed_costs() {
        let task = chain();
        let init = task.init().clone();
        assert_eq!(Heuristic::new(&task, HeuristicKind::HMax).evaluate(&init), Some(5));
        assert_eq!(Heuristic::new(&task, HeuristicKind::HAdd).evaluate(&init), Some(5));
        assert_eq!(Heuristic::new(&task, HeuristicKind::HFF).evaluate(&init), Some(5));
        assert_eq!(Heuristic::new(&task, HeuristicKind::Blind).evaluate(&init), Some(2));
    }

    #[test]
    fn test_goal_state_is_zero() {
        let task = chain();
        let ac = task.find_action("ac()").unwrap();
        let goal_state = task.apply(task.init(), &task.actions()[ac]);
        for kind in [HeuristicKind::Blind, HeuristicKind::HMax, HeuristicKind::HAdd, HeuristicKind::HFF] {
            assert_eq!(Heuristic::new(&task, kind).evaluate(&goal_state), Some(0));
        }
    }

    #[test]
    fn test_dead_end() {
        let task = chain();
        let ac = task.find_action("ac()").unwrap();
        let mut stuck = task.apply(task.init(), &task.actions()[ac]);
        let c = task.goal()[0];
        stuck.remove(c);
        assert_eq!(Heuristic::new(&task, HeuristicKind::HMax).evaluate(&stuck), None);
    }
}
