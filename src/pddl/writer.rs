//! Renders a `Problem` as PDDL domain and problem files.
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::{fs, io};

use super::problem::{Problem, QualityMetric};

const TOTAL_COST: &str = "(total-cost)";

fn requirements_line(problem: &Problem) -> String {
    let mut keywords: Vec<&str> = Vec::new();
    for r in problem.kind().iter() {
        let keyword = r.pddl_keyword();
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords.join(" ")
}

fn types_line(problem: &Problem) -> String {
    // father name -> children, top level types hang below `object`
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for kind in problem.types() {
        let father = kind.father().map(|f| f.name()).unwrap_or("object");
        children.entry(father).or_default().push(kind.name());
    }
    children.iter()
        .map(|(father, kids)| format!("{} - {}", kids.join(" "), father))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn domain_name(problem: &Problem) -> String {
    format!("{}-domain", problem.name())
}

pub fn domain_pddl(problem: &Problem) -> String {
    let costs = matches!(problem.metric(), QualityMetric::MinimizeActionCosts { .. });
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(out, "(define (domain {})", domain_name(problem));
    let _ = writeln!(out, " (:requirements {})", requirements_line(problem));
    let _ = writeln!(out, " (:types {})", types_line(problem));
    let predicates = problem.fluents().iter().map(|f| f.to_string()).collect::<Vec<_>>().join(" ");
    let _ = writeln!(out, " (:predicates {})", predicates);
    if costs {
        let _ = writeln!(out, " (:functions {} - number)", TOTAL_COST);
    }
    for action in problem.actions() {
        let params = action.parameters().iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ");
        let mut effects: Vec<String> = action.effects().iter().map(|e| e.to_string()).collect();
        if costs {
            if let Some(cost) = problem.metric().cost_of(action.name()) {
                effects.push(format!("(increase {} {})", TOTAL_COST, cost));
            }
        }
        let _ = writeln!(out, " (:action {}", action.name());
        let _ = writeln!(out, "  :parameters ({})", params);
        let _ = writeln!(out, "  :precondition {}", action.precondition());
        let _ = writeln!(out, "  :effect (and {}))", effects.join(" "));
    }
    out.push_str(")\n");
    out
}

pub fn problem_pddl(problem: &Problem) -> String {
    let costs = matches!(problem.metric(), QualityMetric::MinimizeActionCosts { .. });
    let mut objects: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for object in problem.objects() {
        objects.entry(object.kind().name()).or_default().push(object.name());
    }
    let objects = objects.iter()
        .map(|(kind, names)| format!("{} - {}", names.join(" "), kind))
        .collect::<Vec<_>>()
        .join(" ");
    let mut init: Vec<String> = problem.initial_atoms().iter().map(|a| a.to_string()).collect();
    if costs {
        init.push(format!("(= {} 0)", TOTAL_COST));
    }
    let goals = problem.goals().iter().map(|g| g.to_string()).collect::<Vec<_>>().join(" ");

    let mut out = String::new();
    let _ = writeln!(out, "(define (problem {})", problem.name());
    let _ = writeln!(out, " (:domain {})", domain_name(problem));
    let _ = writeln!(out, " (:objects {})", objects);
    let _ = writeln!(out, " (:init {})", init.join(" "));
    let _ = writeln!(out, " (:goal (and {}))", goals);
    if costs {
        let _ = writeln!(out, " (:metric minimize {})", TOTAL_COST);
    }
    out.push_str(")\n");
    out
}

/// Writes `<name>-domain.pddl` and `<name>-problem.pddl` into `dir`.
pub fn write_pddl(problem: &Problem, dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let domain_path = dir.join(format!("{}-domain.pddl", problem.name()));
    let problem_path = dir.join(format!("{}-problem.pddl", problem.name()));
    fs::write(&domain_path, domain_pddl(problem))?;
    fs::write(&problem_path, problem_pddl(problem))?;
    Ok((domain_path, problem_path))
}
