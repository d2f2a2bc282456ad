//! Grounding of a lifted `Problem` into a propositional task.
//!
//! Parameters are bound by joining the positive preconditions against the
//! atoms that are reachable in the delete relaxation, so only actions that
//! could ever fire are instantiated. Fluents that no action changes are
//! static: they are checked here and never reach the search.
use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use super::state::State;
use crate::pddl::{self, GroundAtom, Problem, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalEffect {
    pub condition: Vec<usize>,
    pub condition_neg: Vec<usize>,
    pub add: Vec<usize>,
    pub del: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundAction {
    pub schema: String,
    pub arguments: Vec<String>,
    pub pre: Vec<usize>,
    pub pre_neg: Vec<usize>,
    pub add: Vec<usize>,
    pub del: Vec<usize>,
    pub conditional: Vec<ConditionalEffect>,
    pub cost: u32,
}

impl fmt::Display for GroundAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.schema, self.arguments.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Param(usize),
    Object(usize),
}

#[derive(Debug)]
struct LiftedLiteral {
    positive: bool,
    fluent: usize,
    args: Vec<Slot>,
}

#[derive(Debug)]
struct LiftedEffect {
    fluent: usize,
    args: Vec<Slot>,
    value: bool,
    condition: Vec<LiftedLiteral>,
    forall: Vec<usize>,
}

#[derive(Debug)]
struct Schema {
    name: String,
    params: usize,
    /// objects admitted by every slot, action parameters first then forall variables
    members: Vec<Vec<usize>>,
    allowed: Vec<Vec<bool>>,
    pre: Vec<LiftedLiteral>,
    join_order: Vec<usize>,
    effects: Vec<LiftedEffect>,
    cost: u32,
}

/// Reachable tuples of one fluent, indexed by (argument position, object).
#[derive(Debug, Default)]
struct AtomTable {
    tuples: Vec<Vec<usize>>,
    set: HashSet<Vec<usize>>,
    by_arg: Vec<HashMap<usize, Vec<usize>>>,
}

impl AtomTable {
    fn new(arity: usize) -> Self {
        Self { by_arg: (0..arity).map(|_| HashMap::new()).collect(), ..Default::default() }
    }

    fn insert(&mut self, tuple: Vec<usize>) -> bool {
        if self.set.contains(&tuple) {
            return false;
        }
        let idx = self.tuples.len();
        for (pos, obj) in tuple.iter().enumerate() {
            self.by_arg[pos].entry(*obj).or_default().push(idx);
        }
        self.set.insert(tuple.clone());
        self.tuples.push(tuple);
        true
    }

    fn contains(&self, tuple: &[usize]) -> bool {
        self.set.contains(tuple)
    }

    fn bucket(&self, pos: usize, obj: usize) -> &[usize] {
        self.by_arg[pos].get(&obj).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

fn resolve(args: &[Slot], binding: &[Option<usize>]) -> Vec<usize> {
    args.iter().map(|s| match s {
        Slot::Object(o) => *o,
        Slot::Param(p) => binding[*p].expect("slot bound before resolving"),
    }).collect()
}

struct Grounder<'p> {
    problem: &'p Problem,
    static_fluents: Vec<bool>,
    init: Vec<AtomTable>,
    reachable: Vec<AtomTable>,
    schemas: Vec<Schema>,
}

impl<'p> Grounder<'p> {
    fn new(problem: &'p Problem) -> Result<Self, pddl::Error> {
        let fluent_ids: HashMap<&str, usize> = problem.fluents().iter().enumerate().map(|(i, f)| (f.name(), i)).collect();
        let mut static_fluents = vec![true; problem.fluents().len()];
        for action in problem.actions() {
            for effect in action.effects() {
                static_fluents[fluent_ids[effect.fluent.as_str()]] = false;
            }
        }
        let mut init: Vec<AtomTable> = problem.fluents().iter().map(|f| AtomTable::new(f.arity())).collect();
        let mut reachable: Vec<AtomTable> = problem.fluents().iter().map(|f| AtomTable::new(f.arity())).collect();
        for atom in problem.initial_atoms() {
            let fluent = fluent_ids[atom.fluent.as_str()];
            let tuple = atom.args.iter().map(|a| Self::object(problem, a)).collect::<Result<Vec<_>, _>>()?;
            init[fluent].insert(tuple.clone());
            reachable[fluent].insert(tuple);
        }
        let schemas = problem.actions().iter()
            .map(|a| Self::schema(problem, &fluent_ids, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { problem, static_fluents, init, reachable, schemas })
    }

    fn object(problem: &Problem, name: &str) -> Result<usize, pddl::Error> {
        problem.object_id(name).ok_or_else(|| pddl::Error::UndeclaredObject(name.to_string()))
    }

    /// `scope` maps variable names to binding slots.
    fn slot(problem: &Problem, scope: &[(&str, usize)], term: &Term) -> Result<Slot, pddl::Error> {
        match term {
            Term::Object(o) => Ok(Slot::Object(Self::object(problem, o)?)),
            Term::Variable(v) => scope.iter().find(|(name, _)| name == v).map(|(_, slot)| Slot::Param(*slot)).ok_or_else(|| {
                let names: Vec<&str> = scope.iter().map(|(name, _)| *name).collect();
                pddl::Error::UndeclaredVariable { scope: names.join(", "), variable: v.clone() }
            }),
        }
    }

    fn literals(problem: &Problem, fluent_ids: &HashMap<&str, usize>, scope: &[(&str, usize)], e: &pddl::Expression)
            -> Result<Vec<LiftedLiteral>, pddl::Error> {
        e.literals()?.iter().map(|l| -> Result<LiftedLiteral, pddl::Error> {
            let fluent = *fluent_ids.get(l.fluent).ok_or_else(|| pddl::Error::UndeclaredFluent(l.fluent.to_string()))?;
            let args = l.args.iter().map(|t| Self::slot(problem, scope, t)).collect::<Result<Vec<_>, _>>()?;
            Ok(LiftedLiteral { positive: l.positive, fluent, args })
        }).collect()
    }

    fn schema(problem: &Problem, fluent_ids: &HashMap<&str, usize>, action: &pddl::InstantaneousAction)
            -> Result<Schema, pddl::Error> {
        let params: Vec<(&str, usize)> = action.parameters().iter().enumerate().map(|(i, p)| (p.name.as_str(), i)).collect();
        let mut kinds: Vec<&pddl::UserType> = action.parameters().iter().map(|p| &p.kind).collect();
        let mut pre = Vec::new();
        for precondition in action.preconditions() {
            pre.extend(Self::literals(problem, fluent_ids, &params, precondition)?);
        }

        let mut effects = Vec::new();
        for effect in action.effects() {
            let mut scope = params.clone();
            let mut forall = Vec::new();
            for var in &effect.forall {
                scope.push((var.name.as_str(), kinds.len()));
                forall.push(kinds.len());
                kinds.push(&var.kind);
            }
            let condition = match &effect.condition {
                Some(c) => Self::literals(problem, fluent_ids, &scope, c)?,
                None => Vec::new(),
            };
            let args = effect.args.iter().map(|t| Self::slot(problem, &scope, t)).collect::<Result<Vec<_>, _>>()?;
            effects.push(LiftedEffect { fluent: fluent_ids[effect.fluent.as_str()], args, value: effect.value, condition, forall });
        }

        let objects = problem.objects();
        let allowed: Vec<Vec<bool>> = kinds.iter()
            .map(|k| objects.iter().map(|o| o.kind().is_subtype_of(k)).collect())
            .collect();
        let members = allowed.iter()
            .map(|row| row.iter().enumerate().filter(|(_, ok)| **ok).map(|(i, _)| i).collect())
            .collect();

        // most constrained positive literal first, so later literals hit the index
        let mut join_order = Vec::new();
        let mut bound = vec![false; params.len()];
        let mut remaining: Vec<usize> = (0..pre.len()).filter(|i| pre[*i].positive).collect();
        while !remaining.is_empty() {
            let score = |i: usize| {
                let lit: &LiftedLiteral = &pre[remaining[i]];
                let known = lit.args.iter().filter(|s| match s {
                    Slot::Object(_) => true,
                    Slot::Param(p) => bound[*p],
                }).count();
                (known, lit.args.len())
            };
            let pos = (0..remaining.len())
                .max_by(|x, y| score(*x).cmp(&score(*y)).then(y.cmp(x)))
                .expect("remaining is not empty");
            let next = remaining.remove(pos);
            for s in &pre[next].args {
                if let Slot::Param(p) = s {
                    bound[*p] = true;
                }
            }
            join_order.push(next);
        }

        let cost = problem.metric().cost_of(action.name()).ok_or_else(|| pddl::Error::MissingCost(action.name().to_string()))?;
        Ok(Schema { name: action.name().to_string(), params: params.len(), members, allowed, pre, join_order, effects, cost })
    }

    fn join(&self, schema: &Schema, depth: usize, binding: &mut Vec<Option<usize>>, out: &mut Vec<Vec<usize>>) {
        if depth == schema.join_order.len() {
            self.enumerate_free(schema, 0, binding, out);
            return;
        }
        let lit = &schema.pre[schema.join_order[depth]];
        let table = &self.reachable[lit.fluent];
        let bucket = lit.args.iter().enumerate()
            .filter_map(|(pos, s)| match s {
                Slot::Object(o) => Some(table.bucket(pos, *o)),
                Slot::Param(p) => binding[*p].map(|o| table.bucket(pos, o)),
            })
            .min_by_key(|b| b.len());
        match bucket {
            Some(b) => for t in b {
                self.try_tuple(schema, depth, &lit.args, &table.tuples[*t], binding, out);
            },
            None => for tuple in &table.tuples {
                self.try_tuple(schema, depth, &lit.args, tuple, binding, out);
            },
        }
    }

    fn try_tuple(&self, schema: &Schema, depth: usize, args: &[Slot], tuple: &[usize],
            binding: &mut Vec<Option<usize>>, out: &mut Vec<Vec<usize>>) {
        let mut newly = Vec::new();
        let mut ok = true;
        for (slot, obj) in args.iter().zip(tuple) {
            match slot {
                Slot::Object(o) => ok = o == obj,
                Slot::Param(p) => match binding[*p] {
                    Some(b) => ok = b == *obj,
                    None if schema.allowed[*p][*obj] => {
                        binding[*p] = Some(*obj);
                        newly.push(*p);
                    }
                    None => ok = false,
                },
            }
            if !ok {
                break;
            }
        }
        if ok {
            self.join(schema, depth + 1, binding, out);
        }
        for p in newly {
            binding[p] = None;
        }
    }

    fn enumerate_free(&self, schema: &Schema, p: usize, binding: &mut Vec<Option<usize>>, out: &mut Vec<Vec<usize>>) {
        if p == schema.params {
            let static_neg_holds = schema.pre.iter()
                .filter(|l| !l.positive && self.static_fluents[l.fluent])
                .all(|l| !self.init[l.fluent].contains(&resolve(&l.args, binding)));
            if static_neg_holds {
                out.push(binding[..schema.params].iter().map(|b| b.expect("all parameters bound")).collect());
            }
            return;
        }
        if binding[p].is_some() {
            return self.enumerate_free(schema, p + 1, binding, out);
        }
        for obj in &schema.members[p] {
            binding[p] = Some(*obj);
            self.enumerate_free(schema, p + 1, binding, out);
        }
        binding[p] = None;
    }

    /// Calls `f` for every assignment of the forall variables of `effect`.
    fn for_each_forall<F: FnMut(&[Option<usize>])>(schema: &Schema, effect: &LiftedEffect, i: usize,
            binding: &mut Vec<Option<usize>>, f: &mut F) {
        if i == effect.forall.len() {
            f(binding.as_slice());
            return;
        }
        let slot = effect.forall[i];
        for obj in &schema.members[slot] {
            binding[slot] = Some(*obj);
            Self::for_each_forall(schema, effect, i + 1, binding, f);
        }
        binding[slot] = None;
    }

    /// Whether a condition can ever hold given the reachable atoms.
    fn possibly_true(&self, condition: &[LiftedLiteral], binding: &[Option<usize>]) -> bool {
        condition.iter().all(|l| {
            let tuple = resolve(&l.args, binding);
            if l.positive {
                self.reachable[l.fluent].contains(&tuple)
            } else {
                !self.static_fluents[l.fluent] || !self.init[l.fluent].contains(&tuple)
            }
        })
    }

    fn binding_for(schema: &Schema, params: &[usize]) -> Vec<Option<usize>> {
        let mut binding: Vec<Option<usize>> = params.iter().map(|o| Some(*o)).collect();
        binding.resize(schema.members.len(), None);
        binding
    }

    /// Relaxed reachability fixpoint. Returns the reachable bindings per schema.
    fn explore(&mut self) -> Vec<Vec<Vec<usize>>> {
        let mut seen: Vec<HashSet<Vec<usize>>> = self.schemas.iter().map(|_| HashSet::new()).collect();
        let mut bindings: Vec<Vec<Vec<usize>>> = self.schemas.iter().map(|_| Vec::new()).collect();
        let mut iterations = 0;
        loop {
            iterations += 1;
            let mut new_atoms = Vec::new();
            for (si, schema) in self.schemas.iter().enumerate() {
                let mut found = Vec::new();
                self.join(schema, 0, &mut vec![None; schema.members.len()], &mut found);
                for b in found {
                    if seen[si].insert(b.clone()) {
                        bindings[si].push(b);
                    }
                }
                for params in &bindings[si] {
                    let mut binding = Self::binding_for(schema, params);
                    for effect in schema.effects.iter().filter(|e| e.value) {
                        Self::for_each_forall(schema, effect, 0, &mut binding, &mut |full| {
                            if self.possibly_true(&effect.condition, full) {
                                let tuple = resolve(&effect.args, full);
                                if !self.reachable[effect.fluent].contains(&tuple) {
                                    new_atoms.push((effect.fluent, tuple));
                                }
                            }
                        });
                    }
                }
            }
            let mut changed = false;
            for (fluent, tuple) in new_atoms {
                changed |= self.reachable[fluent].insert(tuple);
            }
            if !changed {
                break;
            }
        }
        debug!(event = "relaxed_exploration", iterations, problem = self.problem.name());
        bindings
    }
}

#[derive(Default)]
struct Interner {
    ids: HashMap<(usize, Vec<usize>), usize>,
    atoms: Vec<(usize, Vec<usize>)>,
}

impl Interner {
    fn intern(&mut self, fluent: usize, tuple: Vec<usize>) -> usize {
        let key = (fluent, tuple);
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.atoms.len();
        self.atoms.push(key.clone());
        self.ids.insert(key, id);
        id
    }
}

fn normalize(v: &mut Vec<usize>) {
    v.sort_unstable();
    v.dedup();
}

/// Propositional planning task.
#[derive(Debug, Clone)]
pub struct Task {
    atoms: Vec<GroundAtom>,
    actions: Vec<GroundAction>,
    init: State,
    goal: Vec<usize>,
    goal_neg: Vec<usize>,
    successor_index: Vec<Vec<usize>>,
    unkeyed: Vec<usize>,
}

impl Task {
    pub fn ground(problem: &Problem) -> Result<Task, pddl::Error> {
        let mut grounder = Grounder::new(problem)?;
        let bindings = grounder.explore();
        let g = &grounder;
        let mut interner = Interner::default();
        let mut actions = Vec::new();

        for (schema, params_list) in g.schemas.iter().zip(&bindings) {
            for params in params_list {
                let mut binding = Grounder::binding_for(schema, params);
                let mut action = GroundAction {
                    schema: schema.name.clone(),
                    arguments: params.iter().map(|o| problem.objects()[*o].name().to_string()).collect(),
                    pre: Vec::new(),
                    pre_neg: Vec::new(),
                    add: Vec::new(),
                    del: Vec::new(),
                    conditional: Vec::new(),
                    cost: schema.cost,
                };
                for lit in schema.pre.iter().filter(|l| !g.static_fluents[l.fluent]) {
                    let tuple = resolve(&lit.args, &binding);
                    if lit.positive {
                        action.pre.push(interner.intern(lit.fluent, tuple));
                    } else if g.reachable[lit.fluent].contains(&tuple) {
                        action.pre_neg.push(interner.intern(lit.fluent, tuple));
                    }
                }
                for effect in &schema.effects {
                    Grounder::for_each_forall(schema, effect, 0, &mut binding, &mut |full| {
                        if !g.possibly_true(&effect.condition, full) {
                            return;
                        }
                        let mut condition = Vec::new();
                        let mut condition_neg = Vec::new();
                        for lit in effect.condition.iter().filter(|l| !g.static_fluents[l.fluent]) {
                            let tuple = resolve(&lit.args, full);
                            if lit.positive {
                                condition.push(interner.intern(lit.fluent, tuple));
                            } else if g.reachable[lit.fluent].contains(&tuple) {
                                condition_neg.push(interner.intern(lit.fluent, tuple));
                            }
                        }
                        let target = interner.intern(effect.fluent, resolve(&effect.args, full));
                        if condition.is_empty() && condition_neg.is_empty() {
                            if effect.value { action.add.push(target) } else { action.del.push(target) }
                        } else {
                            let (add, del) = if effect.value { (vec![target], vec![]) } else { (vec![], vec![target]) };
                            action.conditional.push(ConditionalEffect { condition, condition_neg, add, del });
                        }
                    });
                }
                normalize(&mut action.pre);
                normalize(&mut action.pre_neg);
                normalize(&mut action.add);
                normalize(&mut action.del);
                let add = action.add.clone();
                action.del.retain(|a| !add.contains(a));
                for c in action.conditional.iter_mut() {
                    normalize(&mut c.condition);
                    normalize(&mut c.condition_neg);
                }
                actions.push(action);
            }
        }

        let fluent_ids: HashMap<&str, usize> = problem.fluents().iter().enumerate().map(|(i, f)| (f.name(), i)).collect();
        let mut goal = Vec::new();
        let mut goal_neg = Vec::new();
        for expression in problem.goals() {
            for lit in expression.literals()? {
                let tuple = lit.args.iter().map(|t| match t {
                    Term::Object(o) | Term::Variable(o) => Grounder::object(problem, o),
                }).collect::<Result<Vec<_>, _>>()?;
                let fluent = *fluent_ids.get(lit.fluent).ok_or_else(|| pddl::Error::UndeclaredFluent(lit.fluent.to_string()))?;
                let id = interner.intern(fluent, tuple);
                if lit.positive { goal.push(id) } else { goal_neg.push(id) }
            }
        }
        normalize(&mut goal);
        normalize(&mut goal_neg);

        let mut init = State::new(interner.atoms.len());
        for (id, (fluent, tuple)) in interner.atoms.iter().enumerate() {
            if g.init[*fluent].contains(tuple) {
                init.insert(id);
            }
        }
        let atoms: Vec<GroundAtom> = interner.atoms.iter().map(|(fluent, tuple)| GroundAtom {
            fluent: problem.fluents()[*fluent].name().to_string(),
            args: tuple.iter().map(|o| problem.objects()[*o].name().to_string()).collect(),
        }).collect();

        // key every action on its least shared precondition
        let mut occurrences = vec![0usize; atoms.len()];
        actions.iter().flat_map(|a| a.pre.iter()).for_each(|p| occurrences[*p] += 1);
        let mut successor_index = vec![Vec::new(); atoms.len()];
        let mut unkeyed = Vec::new();
        for (i, a) in actions.iter().enumerate() {
            match a.pre.iter().min_by_key(|p| occurrences[**p]) {
                Some(key) => successor_index[*key].push(i),
                None => unkeyed.push(i),
            }
        }

        debug!(event = "grounded", problem = problem.name(), atoms = atoms.len(), actions = actions.len());
        Ok(Task { atoms, actions, init, goal, goal_neg, successor_index, unkeyed })
    }

    pub fn atoms(&self) -> &[GroundAtom] {
        &self.atoms
    }

    pub fn actions(&self) -> &[GroundAction] {
        &self.actions
    }

    pub fn init(&self) -> &State {
        &self.init
    }

    pub fn goal(&self) -> &[usize] {
        &self.goal
    }

    pub fn goal_neg(&self) -> &[usize] {
        &self.goal_neg
    }

    pub fn atom_id(&self, atom: &GroundAtom) -> Option<usize> {
        self.atoms.iter().position(|a| a == atom)
    }

    pub fn is_goal(&self, state: &State) -> bool {
        state.contains_all(&self.goal) && state.contains_none(&self.goal_neg)
    }

    pub fn is_applicable(&self, state: &State, action: &GroundAction) -> bool {
        state.contains_all(&action.pre) && state.contains_none(&action.pre_neg)
    }

    /// Conditions are evaluated on `state`; deletes happen before adds.
    pub fn apply(&self, state: &State, action: &GroundAction) -> State {
        let fired: Vec<&ConditionalEffect> = action.conditional.iter()
            .filter(|c| state.contains_all(&c.condition) && state.contains_none(&c.condition_neg))
            .collect();
        let mut next = state.clone();
        action.del.iter().chain(fired.iter().flat_map(|c| c.del.iter())).for_each(|a| next.remove(*a));
        action.add.iter().chain(fired.iter().flat_map(|c| c.add.iter())).for_each(|a| next.insert(*a));
        next
    }

    pub fn applicable_actions(&self, state: &State) -> Vec<usize> {
        let mut result: Vec<usize> = self.unkeyed.iter().copied()
            .filter(|i| self.is_applicable(state, &self.actions[*i]))
            .collect();
        for atom in state.iter() {
            result.extend(self.successor_index[atom].iter().copied().filter(|i| self.is_applicable(state, &self.actions[*i])));
        }
        result
    }

    /// Index of the grounded action printed as `name`, e.g. `car_start(junction0-1, car0, garage0)`.
    pub fn find_action(&self, name: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.to_string() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::Task;
    use crate::expNot;
    use crate::pddl::{Fluent, GroundAtom, InstantaneousAction, Object, Problem, UserType};

    /// Line of three cells; a token slides right, `link` is static.
    fn slide() -> Problem {
        let cell = UserType::new("cell");
        let token = UserType::new("token");
        let at = Fluent::new("at", &[("t", &token), ("c", &cell)]);
        let link = Fluent::new("link", &[("a", &cell), ("b", &cell)]);
        let lit = Fluent::new("lit", &[("c", &cell)]);
        let mut problem = Problem::new("slide");
        problem.add_fluent(&at, false).unwrap();
        problem.add_fluent(&link, false).unwrap();
        problem.add_fluent(&lit, false).unwrap();
        let mut step = InstantaneousAction::new("step", &[("t", &token), ("from", &cell), ("to", &cell)]);
        step.add_precondition(at.call(&["?t", "?from"]));
        step.add_precondition(link.call(&["?from", "?to"]));
        step.add_precondition(expNot!(lit.call(&["?to"])));
        step.add_effect(at.call(&["?t", "?from"]), false).unwrap();
        step.add_effect(at.call(&["?t", "?to"]), true).unwrap();
        step.add_effect(lit.call(&["?from"]), true).unwrap();
        problem.add_action(step).unwrap();
        problem.add_objects(&[Object::new("c0", &cell), Object::new("c1", &cell), Object::new("c2", &cell),
            Object::new("tok", &token)]).unwrap();
        problem.set_initial_value(at.call(&["tok", "c0"]), true).unwrap();
        problem.set_initial_value(link.call(&["c0", "c1"]), true).unwrap();
        problem.set_initial_value(link.call(&["c1", "c2"]), true).unwrap();
        problem.add_goal(at.call(&["tok", "c2"])).unwrap();
        problem
    }

    #[test]
    fn test_grounding_follows_reachability() {
        let task = Task::ground(&slide()).unwrap();
        let names: Vec<String> = task.actions().iter().map(|a| a.to_string()).collect();
        assert_eq!(names, vec!["step(tok, c0, c1)", "step(tok, c1, c2)"]);
        // static link never reaches the state
        assert!(task.atoms().iter().all(|a| a.fluent != "link"));
    }

    #[test]
    fn test_apply_and_goal() {
        let task = Task::ground(&slide()).unwrap();
        let first = task.find_action("step(tok, c0, c1)").unwrap();
        let second = task.find_action("step(tok, c1, c2)").unwrap();
        let s0 = task.init().clone();
        assert_eq!(task.applicable_actions(&s0), vec![first]);
        let s1 = task.apply(&s0, &task.actions()[first]);
        let lit_c0 = task.atom_id(&GroundAtom::new("lit", &["c0"])).unwrap();
        assert!(s1.contains(lit_c0));
        assert!(!task.is_goal(&s1));
        let s2 = task.apply(&s1, &task.actions()[second]);
        assert!(task.is_goal(&s2));
    }

    #[test]
    fn test_negative_precondition_blocks() {
        let task = Task::ground(&slide()).unwrap();
        let first = &task.actions()[task.find_action("step(tok, c0, c1)").unwrap()];
        // lit(c1) is reachable, so it shows up as a negative precondition
        let lit_c1 = task.atom_id(&GroundAtom::new("lit", &["c1"])).unwrap();
        assert_eq!(first.pre_neg, vec![lit_c1]);
        let mut blocked = task.init().clone();
        blocked.insert(lit_c1);
        assert!(!task.is_applicable(&blocked, first));
    }

    #[test]
    fn test_conditions_read_the_pre_state() {
        let lamp = UserType::new("lamp");
        let on = Fluent::new("on", &[("l", &lamp)]);
        let mut problem = Problem::new("toggle");
        problem.add_fluent(&on, false).unwrap();
        let mut toggle = InstantaneousAction::new("toggle", &[("l", &lamp)]);
        toggle.add_conditional_effect(on.call(&["?l"]), false, on.call(&["?l"])).unwrap();
        toggle.add_conditional_effect(on.call(&["?l"]), true, expNot!(on.call(&["?l"]))).unwrap();
        problem.add_action(toggle).unwrap();
        let mut reset = InstantaneousAction::new("reset", &[("l", &lamp)]);
        reset.add_effect(on.call(&["?l"]), false).unwrap();
        reset.add_effect(on.call(&["?l"]), true).unwrap();
        problem.add_action(reset).unwrap();
        problem.add_object(&Object::new("l1", &lamp)).unwrap();
        problem.add_goal(on.call(&["l1"])).unwrap();

        let task = Task::ground(&problem).unwrap();
        let toggle = &task.actions()[task.find_action("toggle(l1)").unwrap()];
        let on_l1 = task.atom_id(&GroundAtom::new("on", &["l1"])).unwrap();
        let lit = task.apply(task.init(), toggle);
        assert!(lit.contains(on_l1));
        assert!(!task.apply(&lit, toggle).contains(on_l1));

        // add wins over delete
        let reset = &task.actions()[task.find_action("reset(l1)").unwrap()];
        assert!(reset.del.is_empty());
        assert!(task.apply(&lit, reset).contains(on_l1));
    }
}
