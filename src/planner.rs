//! Grounded state-space planning over `pddl::Problem` models.
pub mod engine;
pub mod heuristic;
pub mod result;
pub mod search;
pub mod state;
pub mod task;

pub use engine::{Engine, OneshotPlanner, OptimalityGuarantee};
pub use result::{ActionInstance, PlanGenerationResult, PlanGenerationResultStatus, SequentialPlan, ValidationError};
pub use task::Task;
