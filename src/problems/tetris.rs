//! Tetris: slide pieces on a 6x4 grid until the top three rows are empty.
use crate::pddl::{Error, Fluent, InstantaneousAction, Object, Problem, UserType};

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 4;

pub const INITIALLY_CLEAR: &[&str] = &[
    "f0-3f", "f2-3f", "f3-0f", "f3-1f", "f3-2f", "f3-3f",
    "f4-0f", "f4-1f", "f4-2f", "f4-3f",
    "f5-0f", "f5-1f", "f5-2f", "f5-3f",
];

pub fn position(row: usize, column: usize) -> String {
    format!("f{}-{}f", row, column)
}

pub fn create_problem() -> Result<Problem, Error> {
    let position_type = UserType::new("position");
    let pieces = UserType::new("pieces");
    let one_square = UserType::with_father("one_square", &pieces);
    let two_straight = UserType::with_father("two_straight", &pieces);
    let right_l = UserType::with_father("right_l", &pieces);

    let mut problem = Problem::new("tetris");

    let p = &position_type;
    let clear = Fluent::new("clear", &[("position", p)]);
    let connected = Fluent::new("connected", &[("x", p), ("y", p)]);
    let at_square = Fluent::new("at_square", &[("element", &one_square), ("xy", p)]);
    let at_two = Fluent::new("at_two", &[("element", &two_straight), ("xy", p), ("xy2", p)]);
    let at_right_l = Fluent::new("at_right_l", &[("element", &right_l), ("xy", p), ("xy2", p), ("xy3", p)]);
    for fluent in [&clear, &connected, &at_square, &at_two, &at_right_l] {
        problem.add_fluent(fluent, false)?;
    }

    for row in 0..ROWS {
        for column in 0..COLUMNS {
            problem.add_object(&Object::new(&position(row, column), p))?;
        }
    }
    for i in 0..3 {
        problem.add_object(&Object::new(&format!("square{}", i), &one_square))?;
    }
    for i in 0..2 {
        problem.add_object(&Object::new(&format!("straight{}", i), &two_straight))?;
    }
    problem.add_object(&Object::new("rightl0", &right_l))?;

    let mut move_square = InstantaneousAction::new("move_square",
        &[("xy_initial", p), ("xy_final", p), ("element", &one_square)]);
    move_square.add_precondition(clear.call(&["?xy_final"]));
    move_square.add_precondition(at_square.call(&["?element", "?xy_initial"]));
    move_square.add_precondition(connected.call(&["?xy_initial", "?xy_final"]));
    move_square.add_effect(clear.call(&["?xy_initial"]), true)?;
    move_square.add_effect(at_square.call(&["?element", "?xy_final"]), true)?;
    move_square.add_effect(clear.call(&["?xy_final"]), false)?;
    move_square.add_effect(at_square.call(&["?element", "?xy_initial"]), false)?;
    problem.add_action(move_square)?;

    // the tail cell is freed and the head advances, which also covers turning
    let mut move_two = InstantaneousAction::new("move_two",
        &[("xy_initial1", p), ("xy_initial2", p), ("xy_final", p), ("element", &two_straight)]);
    move_two.add_precondition(clear.call(&["?xy_final"]));
    move_two.add_precondition(at_two.call(&["?element", "?xy_initial1", "?xy_initial2"]));
    move_two.add_precondition(connected.call(&["?xy_initial2", "?xy_final"]));
    move_two.add_effect(clear.call(&["?xy_initial1"]), true)?;
    move_two.add_effect(at_two.call(&["?element", "?xy_initial2", "?xy_final"]), true)?;
    move_two.add_effect(clear.call(&["?xy_final"]), false)?;
    move_two.add_effect(at_two.call(&["?element", "?xy_initial1", "?xy_initial2"]), false)?;
    problem.add_action(move_two)?;

    let l_params: &[(&str, &UserType)] = &[("xy_initial1", p), ("xy_initial2", p), ("xy_initial3", p),
        ("xy_final", p), ("xy_final2", p), ("element", &right_l)];

    let mut move_l_right = InstantaneousAction::new("move_l_right", l_params);
    move_l_right.add_precondition(clear.call(&["?xy_final"]));
    move_l_right.add_precondition(clear.call(&["?xy_final2"]));
    move_l_right.add_precondition(at_right_l.call(&["?element", "?xy_initial1", "?xy_initial2", "?xy_initial3"]));
    move_l_right.add_precondition(connected.call(&["?xy_initial1", "?xy_final"]));
    move_l_right.add_precondition(connected.call(&["?xy_initial3", "?xy_final2"]));
    move_l_right.add_effect(clear.call(&["?xy_initial2"]), true)?;
    move_l_right.add_effect(clear.call(&["?xy_initial1"]), true)?;
    move_l_right.add_effect(at_right_l.call(&["?element", "?xy_final", "?xy_initial3", "?xy_final2"]), true)?;
    move_l_right.add_effect(clear.call(&["?xy_final"]), false)?;
    move_l_right.add_effect(clear.call(&["?xy_final2"]), false)?;
    move_l_right.add_effect(at_right_l.call(&["?element", "?xy_initial1", "?xy_initial2", "?xy_initial3"]), false)?;
    problem.add_action(move_l_right)?;

    let mut move_l_left = InstantaneousAction::new("move_l_left", l_params);
    move_l_left.add_precondition(clear.call(&["?xy_final"]));
    move_l_left.add_precondition(clear.call(&["?xy_final2"]));
    move_l_left.add_precondition(at_right_l.call(&["?element", "?xy_initial1", "?xy_initial2", "?xy_initial3"]));
    move_l_left.add_precondition(connected.call(&["?xy_initial1", "?xy_final"]));
    move_l_left.add_precondition(connected.call(&["?xy_initial2", "?xy_final2"]));
    move_l_left.add_precondition(connected.call(&["?xy_final2", "?xy_final"]));
    move_l_left.add_effect(clear.call(&["?xy_initial3"]), true)?;
    move_l_left.add_effect(clear.call(&["?xy_initial1"]), true)?;
    move_l_left.add_effect(at_right_l.call(&["?element", "?xy_final", "?xy_final2", "?xy_initial2"]), true)?;
    move_l_left.add_effect(clear.call(&["?xy_final"]), false)?;
    move_l_left.add_effect(clear.call(&["?xy_final2"]), false)?;
    move_l_left.add_effect(at_right_l.call(&["?element", "?xy_initial1", "?xy_initial2", "?xy_initial3"]), false)?;
    problem.add_action(move_l_left)?;

    // 4-neighbourhood, both directions
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            let here = position(row, column);
            if column + 1 < COLUMNS {
                let right = position(row, column + 1);
                problem.set_initial_value(connected.call(&[here.as_str(), right.as_str()]), true)?;
                problem.set_initial_value(connected.call(&[right.as_str(), here.as_str()]), true)?;
            }
            if row + 1 < ROWS {
                let below = position(row + 1, column);
                problem.set_initial_value(connected.call(&[here.as_str(), below.as_str()]), true)?;
                problem.set_initial_value(connected.call(&[below.as_str(), here.as_str()]), true)?;
            }
        }
    }
    for name in INITIALLY_CLEAR {
        problem.set_initial_value(clear.call(&[*name]), true)?;
    }

    problem.set_initial_value(at_right_l.call(&["rightl0", "f0-2f", "f1-2f", "f1-3f"]), true)?;
    problem.set_initial_value(at_two.call(&["straight0", "f0-0f", "f1-0f"]), true)?;
    problem.set_initial_value(at_two.call(&["straight1", "f0-1f", "f1-1f"]), true)?;
    problem.set_initial_value(at_square.call(&["square0", "f2-0f"]), true)?;
    problem.set_initial_value(at_square.call(&["square1", "f2-1f"]), true)?;
    problem.set_initial_value(at_square.call(&["square2", "f2-2f"]), true)?;

    for row in 0..3 {
        for column in 0..COLUMNS {
            problem.add_goal(clear.call(&[position(row, column).as_str()]))?;
        }
    }
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::{create_problem, position, COLUMNS};
    use crate::pddl::{writer, GroundAtom, Requirement};
    use crate::planner::{Engine, OneshotPlanner, PlanGenerationResultStatus, Task};

    #[test]
    fn test_model() {
        let problem = create_problem().unwrap();
        assert_eq!(problem.objects().len(), 24 + 6);
        assert_eq!(problem.goals().len(), 12);
        // 6 rows x 3 horizontal edges + 5 x 4 vertical edges, both directions
        let connections = problem.initial_atoms().iter().filter(|a| a.fluent == "connected").count();
        assert_eq!(connections, 2 * (6 * 3 + 5 * 4));
        assert!(problem.initial_value(&GroundAtom::new("connected", &["f1-3f", "f2-3f"])));
        assert!(!problem.initial_value(&GroundAtom::new("connected", &["f0-0f", "f1-1f"])));
        assert!(!problem.kind().contains(Requirement::ActionCosts));
        let l = problem.types().iter().find(|t| t.name() == "right_l").unwrap();
        assert_eq!(l.father().map(|f| f.name()), Some("pieces"));
    }

    #[test]
    fn test_static_connectivity_is_compiled_away() {
        let task = Task::ground(&create_problem().unwrap()).unwrap();
        assert!(task.atoms().iter().all(|a| a.fluent != "connected"));
        assert!(task.actions().iter().any(|a| a.to_string() == "move_square(f2-2f, f2-3f, square2)"));
    }

    #[test]
    fn test_plan_clears_top_rows() {
        let problem = create_problem().unwrap();
        let result = OneshotPlanner::new(Engine::GbfsHff).solve(&problem);
        assert_eq!(result.status, PlanGenerationResultStatus::SolvedSatisficing);
        let plan = result.plan.unwrap();
        assert_eq!(plan.validate(&problem), Ok(plan.len() as u64));
        assert_eq!(result.metric_value, Some(plan.len() as u64));
    }

    #[test]
    fn test_emit_pddl() {
        let problem = create_problem().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (domain_path, problem_path) = writer::write_pddl(&problem, dir.path()).unwrap();
        let domain = std::fs::read_to_string(domain_path).unwrap();
        assert!(domain.starts_with("(define (domain tetris-domain)"));
        assert!(domain.contains("one_square two_straight right_l - pieces"));
        assert!(domain.contains("(:action move_l_left"));
        assert!(!domain.contains("total-cost"));
        let text = std::fs::read_to_string(problem_path).unwrap();
        assert!(text.contains("(at_square square0 f2-0f)"));
        for column in 0..COLUMNS {
            assert!(text.contains(&format!("(clear {})", position(0, column))));
        }
    }
}
