pub mod config;
pub mod pddl;
pub mod planner;
pub mod problems;
