//! One-shot planning: ground, search, and package the outcome.
use std::fmt;

use enumset::EnumSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::heuristic::{Heuristic, HeuristicKind};
use super::result::{ActionInstance, PlanGenerationResult, PlanGenerationResultStatus, SequentialPlan};
use super::search::{best_first_search, SearchMode, SearchOutcome};
use super::task::Task;
use crate::pddl::{Problem, Requirement};

pub const DEFAULT_MAX_EXPANSIONS: usize = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    AstarBlind,
    AstarHmax,
    GbfsHadd,
    GbfsHff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimalityGuarantee {
    SatisficingOnly,
    SolvedOptimally,
}

impl Engine {
    pub fn name(&self) -> &'static str {
        match self {
            Engine::AstarBlind => "astar-blind",
            Engine::AstarHmax => "astar-hmax",
            Engine::GbfsHadd => "gbfs-hadd",
            Engine::GbfsHff => "gbfs-hff",
        }
    }

    /// A* with an admissible heuristic returns cost-optimal plans.
    pub fn is_optimal(&self) -> bool {
        matches!(self, Engine::AstarBlind | Engine::AstarHmax)
    }

    pub fn supported_kind(&self) -> EnumSet<Requirement> {
        EnumSet::all()
    }

    fn mode(&self) -> SearchMode {
        if self.is_optimal() { SearchMode::Astar } else { SearchMode::Greedy }
    }

    fn heuristic(&self) -> HeuristicKind {
        match self {
            Engine::AstarBlind => HeuristicKind::Blind,
            Engine::AstarHmax => HeuristicKind::HMax,
            Engine::GbfsHadd => HeuristicKind::HAdd,
            Engine::GbfsHff => HeuristicKind::HFF,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub struct OneshotPlanner {
    engine: Engine,
    max_expansions: usize,
}

impl OneshotPlanner {
    pub fn new(engine: Engine) -> Self {
        Self { engine, max_expansions: DEFAULT_MAX_EXPANSIONS }
    }

    /// Picks an engine that supports `kind` and meets the guarantee.
    /// Satisficing requests prefer the greedy engines.
    pub fn for_kind(kind: EnumSet<Requirement>, guarantee: OptimalityGuarantee) -> Option<Self> {
        let preference: &[Engine] = match guarantee {
            OptimalityGuarantee::SolvedOptimally => &[Engine::AstarHmax, Engine::AstarBlind],
            OptimalityGuarantee::SatisficingOnly => &[Engine::GbfsHff, Engine::GbfsHadd, Engine::AstarHmax, Engine::AstarBlind],
        };
        preference.iter()
            .find(|e| kind.is_subset(e.supported_kind()))
            .map(|e| Self::new(*e))
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn name(&self) -> &'static str {
        self.engine.name()
    }

    fn finish(&self, status: PlanGenerationResultStatus, plan: Option<SequentialPlan>, metric_value: Option<u64>,
            log: Vec<String>) -> PlanGenerationResult {
        info!(event = "solve_end", engine = self.name(), status = %status, metric_value = ?metric_value);
        PlanGenerationResult { status, plan, engine_name: self.name().to_string(), metric_value, log }
    }

    pub fn solve(&self, problem: &Problem) -> PlanGenerationResult {
        info!(event = "solve_start", engine = self.name(), problem = problem.name(), max_expansions = self.max_expansions);
        let mut log = Vec::new();

        let unsupported = problem.kind().difference(self.engine.supported_kind());
        if !unsupported.is_empty() {
            log.push(format!("unsupported requirements: {:?}", unsupported));
            return self.finish(PlanGenerationResultStatus::UnsupportedProblem, None, None, log);
        }

        let task = match Task::ground(problem) {
            Ok(task) => task,
            Err(e) => {
                warn!(event = "grounding_failed", problem = problem.name(), error = %e);
                log.push(format!("grounding failed: {}", e));
                return self.finish(PlanGenerationResultStatus::InternalError, None, None, log);
            }
        };
        log.push(format!("grounded {} atoms and {} actions", task.atoms().len(), task.actions().len()));

        let mut heuristic = Heuristic::new(&task, self.engine.heuristic());
        let (outcome, stats) = best_first_search(&task, &mut heuristic, self.engine.mode(), self.max_expansions);
        log.push(format!("expanded {} states, generated {}, evaluated {}, reopened {}",
            stats.expanded, stats.generated, stats.evaluated, stats.reopened));

        match outcome {
            SearchOutcome::Solved { path, cost } => {
                let actions = path.iter().map(|a| {
                    let action = &task.actions()[*a];
                    ActionInstance { action: action.schema.clone(), parameters: action.arguments.clone() }
                }).collect();
                let status = if self.engine.is_optimal() {
                    PlanGenerationResultStatus::SolvedOptimally
                } else {
                    PlanGenerationResultStatus::SolvedSatisficing
                };
                self.finish(status, Some(SequentialPlan::new(actions)), Some(cost), log)
            }
            SearchOutcome::Unsolvable => self.finish(PlanGenerationResultStatus::UnsolvableProven, None, None, log),
            SearchOutcome::LimitReached => {
                log.push(format!("expansion limit of {} reached", self.max_expansions));
                self.finish(PlanGenerationResultStatus::Timeout, None, None, log)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use enumset::EnumSet;

    use super::{Engine, OneshotPlanner, OptimalityGuarantee};
    use crate::pddl::{Fluent, InstantaneousAction, Object, Problem, QualityMetric, UserType};
    use crate::planner::result::PlanGenerationResultStatus;

    /// Fill `n` jars; each jar has a cheap pour that needs the previous jar full.
    fn jars(n: usize) -> Problem {
        let jar = UserType::new("jar");
        let full = Fluent::new("full", &[("j", &jar)]);
        let before = Fluent::new("before", &[("a", &jar), ("b", &jar)]);
        let mut problem = Problem::new("jars");
        problem.add_fluent(&full, false).unwrap();
        problem.add_fluent(&before, false).unwrap();
        let mut fill = InstantaneousAction::new("fill", &[("j", &jar)]);
        fill.add_effect(full.call(&["?j"]), true).unwrap();
        problem.add_action(fill).unwrap();
        let mut pour = InstantaneousAction::new("pour", &[("a", &jar), ("b", &jar)]);
        pour.add_precondition(full.call(&["?a"]));
        pour.add_precondition(before.call(&["?a", "?b"]));
        pour.add_effect(full.call(&["?b"]), true).unwrap();
        problem.add_action(pour).unwrap();
        problem.add_quality_metric(QualityMetric::action_costs(&[("fill", 5), ("pour", 1)])).unwrap();
        let names: Vec<String> = (0..n).map(|i| format!("j{}", i)).collect();
        for name in &names {
            problem.add_object(&Object::new(name, &jar)).unwrap();
            problem.add_goal(full.call(&[name.as_str()])).unwrap();
        }
        for pair in names.windows(2) {
            problem.set_initial_value(before.call(&[pair[0].as_str(), pair[1].as_str()]), true).unwrap();
        }
        problem
    }

    #[test]
    fn test_optimal_engines_agree() {
        let problem = jars(3);
        for engine in [Engine::AstarBlind, Engine::AstarHmax] {
            let result = OneshotPlanner::new(engine).solve(&problem);
            assert_eq!(result.status, PlanGenerationResultStatus::SolvedOptimally);
            assert_eq!(result.metric_value, Some(7));
            assert_eq!(result.engine_name, engine.name());
            let plan = result.plan.unwrap();
            assert_eq!(plan.validate(&problem), Ok(7));
        }
    }

    #[test]
    fn test_satisficing_engines() {
        let problem = jars(4);
        for engine in [Engine::GbfsHadd, Engine::GbfsHff] {
            let result = OneshotPlanner::new(engine).solve(&problem);
            assert_eq!(result.status, PlanGenerationResultStatus::SolvedSatisficing);
            let plan = result.plan.unwrap();
            assert_eq!(plan.validate(&problem).ok(), result.metric_value);
        }
    }

    #[test]
    fn test_failure_statuses() {
        let mut problem = jars(3);
        let jar = UserType::new("jar");
        let before = Fluent::new("before", &[("a", &jar), ("b", &jar)]);
        problem.add_goal(before.call(&["j2", "j0"])).unwrap();
        let result = OneshotPlanner::new(Engine::AstarBlind).solve(&problem);
        assert_eq!(result.status, PlanGenerationResultStatus::UnsolvableProven);
        assert!(result.plan.is_none());

        let result = OneshotPlanner::new(Engine::AstarBlind).with_max_expansions(1).solve(&jars(3));
        assert_eq!(result.status, PlanGenerationResultStatus::Timeout);
        assert!(result.log.iter().any(|l| l.contains("expansion limit")));
    }

    #[test]
    fn test_engine_selection() {
        let kind = jars(2).kind();
        let optimal = OneshotPlanner::for_kind(kind, OptimalityGuarantee::SolvedOptimally).unwrap();
        assert_eq!(optimal.engine(), Engine::AstarHmax);
        let any = OneshotPlanner::for_kind(kind, OptimalityGuarantee::SatisficingOnly).unwrap();
        assert_eq!(any.engine(), Engine::GbfsHff);
        assert!(OneshotPlanner::for_kind(EnumSet::empty(), OptimalityGuarantee::SolvedOptimally).is_some());
    }
}
