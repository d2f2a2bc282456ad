//! City-car: cars leave a garage and drive to their destination junctions
//! over roads that have to be built first.
use crate::pddl::{Error, Fluent, InstantaneousAction, Object, Problem, QualityMetric, UserType};

pub const ACTION_COSTS: &[(&str, u32)] = &[
    ("move_car_in_road", 1),
    ("move_car_out_road", 1),
    ("car_arrived", 0),
    ("car_start", 0),
    ("build_diagonal_oneway", 30),
    ("build_straight_oneway", 20),
    ("destroy_road", 10),
];

pub fn create_problem() -> Result<Problem, Error> {
    let mut problem = Problem::new("citycar");

    let car = UserType::new("car");
    let junction = UserType::new("junction");
    let garage = UserType::new("garage");
    let road = UserType::new("road");

    // junctions in the same row or column
    let same_line = Fluent::new("same_line", &[("xy", &junction), ("xy2", &junction)]);
    let diagonal = Fluent::new("diagonal", &[("x", &junction), ("y", &junction)]);
    let at_car_jun = Fluent::new("at_car_jun", &[("c", &car), ("x", &junction)]);
    let at_car_road = Fluent::new("at_car_road", &[("c", &car), ("x", &road)]);
    let starting = Fluent::new("starting", &[("c", &car), ("x", &garage)]);
    let arrived = Fluent::new("arrived", &[("c", &car), ("x", &junction)]);
    let road_connect = Fluent::new("road_connect", &[("r1", &road), ("xy", &junction), ("xy2", &junction)]);
    let clear = Fluent::new("clear", &[("xy", &junction)]);
    let in_place = Fluent::new("in_place", &[("x", &road)]);
    let at_garage = Fluent::new("at_garage", &[("g", &garage), ("xy", &junction)]);

    for fluent in [&same_line, &diagonal, &at_car_jun, &at_car_road, &starting, &arrived, &road_connect, &clear,
            &in_place, &at_garage] {
        problem.add_fluent(fluent, false)?;
    }

    let mut move_car_in_road = InstantaneousAction::new("move_car_in_road",
        &[("xy_initial", &junction), ("xy_final", &junction), ("machine", &car), ("r1", &road)]);
    move_car_in_road.add_precondition(at_car_jun.call(&["?machine", "?xy_initial"]));
    move_car_in_road.add_precondition(road_connect.call(&["?r1", "?xy_initial", "?xy_final"]));
    move_car_in_road.add_precondition(in_place.call(&["?r1"]));
    move_car_in_road.add_effect(clear.call(&["?xy_initial"]), true)?;
    move_car_in_road.add_effect(at_car_road.call(&["?machine", "?r1"]), true)?;
    move_car_in_road.add_effect(at_car_jun.call(&["?machine", "?xy_initial"]), false)?;
    problem.add_action(move_car_in_road)?;

    let mut move_car_out_road = InstantaneousAction::new("move_car_out_road",
        &[("xy_initial", &junction), ("xy_final", &junction), ("machine", &car), ("r1", &road)]);
    move_car_out_road.add_precondition(at_car_road.call(&["?machine", "?r1"]));
    move_car_out_road.add_precondition(clear.call(&["?xy_final"]));
    move_car_out_road.add_precondition(road_connect.call(&["?r1", "?xy_initial", "?xy_final"]));
    move_car_out_road.add_precondition(in_place.call(&["?r1"]));
    move_car_out_road.add_effect(at_car_jun.call(&["?machine", "?xy_final"]), true)?;
    move_car_out_road.add_effect(clear.call(&["?xy_final"]), false)?;
    move_car_out_road.add_effect(at_car_road.call(&["?machine", "?r1"]), false)?;
    problem.add_action(move_car_out_road)?;

    let mut car_arrived = InstantaneousAction::new("car_arrived", &[("xy_final", &junction), ("machine", &car)]);
    car_arrived.add_precondition(at_car_jun.call(&["?machine", "?xy_final"]));
    car_arrived.add_effect(clear.call(&["?xy_final"]), true)?;
    car_arrived.add_effect(arrived.call(&["?machine", "?xy_final"]), true)?;
    car_arrived.add_effect(at_car_jun.call(&["?machine", "?xy_final"]), false)?;
    problem.add_action(car_arrived)?;

    let mut car_start = InstantaneousAction::new("car_start",
        &[("xy_final", &junction), ("machine", &car), ("g", &garage)]);
    car_start.add_precondition(at_garage.call(&["?g", "?xy_final"]));
    car_start.add_precondition(starting.call(&["?machine", "?g"]));
    car_start.add_precondition(clear.call(&["?xy_final"]));
    car_start.add_effect(clear.call(&["?xy_final"]), false)?;
    car_start.add_effect(at_car_jun.call(&["?machine", "?xy_final"]), true)?;
    car_start.add_effect(starting.call(&["?machine", "?g"]), false)?;
    problem.add_action(car_start)?;

    // both builders differ only in the adjacency fluent they require
    for (name, adjacency) in [("build_diagonal_oneway", &diagonal), ("build_straight_oneway", &same_line)] {
        let mut build = InstantaneousAction::new(name,
            &[("xy_initial", &junction), ("xy_final", &junction), ("r1", &road)]);
        build.add_precondition(clear.call(&["?xy_final"]));
        build.add_precondition(adjacency.call(&["?xy_initial", "?xy_final"]));
        build.add_precondition(crate::expNot!(in_place.call(&["?r1"])));
        build.add_effect(road_connect.call(&["?r1", "?xy_initial", "?xy_final"]), true)?;
        build.add_effect(in_place.call(&["?r1"]), true)?;
        problem.add_action(build)?;
    }

    let mut destroy_road = InstantaneousAction::new("destroy_road",
        &[("xy_initial", &junction), ("xy_final", &junction), ("r1", &road)]);
    destroy_road.add_precondition(road_connect.call(&["?r1", "?xy_initial", "?xy_final"]));
    destroy_road.add_precondition(in_place.call(&["?r1"]));
    destroy_road.add_effect(in_place.call(&["?r1"]), false)?;
    destroy_road.add_effect(road_connect.call(&["?r1", "?xy_initial", "?xy_final"]), false)?;
    // cars still on the road end up back at its start
    let on_road = at_car_road.call(&["?c", "?r1"]);
    destroy_road.add_effect_with(on_road.clone(), false, Some(on_road.clone()), &[("c", &car)])?;
    destroy_road.add_effect_with(at_car_jun.call(&["?c", "?xy_initial"]), true, Some(on_road), &[("c", &car)])?;
    problem.add_action(destroy_road)?;

    problem.add_quality_metric(QualityMetric::action_costs(ACTION_COSTS))?;

    let junctions = ["junction0-0", "junction0-1", "junction1-0", "junction1-1"];
    for name in junctions {
        problem.add_object(&Object::new(name, &junction))?;
    }
    problem.add_objects(&[Object::new("car0", &car), Object::new("car1", &car)])?;
    problem.add_object(&Object::new("garage0", &garage))?;
    for i in 0..4 {
        problem.add_object(&Object::new(&format!("road{}", i), &road))?;
    }

    let [j00, j01, j10, j11] = junctions;
    for (a, b) in [(j00, j01), (j10, j11), (j00, j10), (j01, j11)] {
        problem.set_initial_value(same_line.call(&[a, b]), true)?;
        problem.set_initial_value(same_line.call(&[b, a]), true)?;
    }
    for (a, b) in [(j00, j11), (j01, j10)] {
        problem.set_initial_value(diagonal.call(&[a, b]), true)?;
        problem.set_initial_value(diagonal.call(&[b, a]), true)?;
    }
    for j in junctions {
        problem.set_initial_value(clear.call(&[j]), true)?;
    }
    problem.set_initial_value(at_garage.call(&["garage0", j01]), true)?;
    problem.set_initial_value(starting.call(&["car0", "garage0"]), true)?;
    problem.set_initial_value(starting.call(&["car1", "garage0"]), true)?;

    problem.add_goal(arrived.call(&["car0", j11]))?;
    problem.add_goal(arrived.call(&["car1", j10]))?;
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::create_problem;
    use crate::pddl::{writer, Requirement};
    use crate::planner::heuristic::{Heuristic, HeuristicKind};
    use crate::planner::{Engine, OneshotPlanner, OptimalityGuarantee, PlanGenerationResultStatus, Task};

    #[test]
    fn test_model() {
        let problem = create_problem().unwrap();
        assert_eq!(problem.actions().len(), 7);
        assert_eq!(problem.objects().len(), 11);
        assert_eq!(problem.initial_atoms().len(), 8 + 4 + 4 + 3);
        let kind = problem.kind();
        for r in [Requirement::NegativePreconditions, Requirement::ConditionalEffects,
                Requirement::UniversalEffects, Requirement::ActionCosts] {
            assert!(kind.contains(r));
        }
        let destroy = problem.action("destroy_road").unwrap();
        assert_eq!(destroy.effects().iter().filter(|e| !e.forall.is_empty()).count(), 2);
    }

    #[test]
    fn test_optimal_plan() {
        let problem = create_problem().unwrap();
        let planner = OneshotPlanner::for_kind(problem.kind(), OptimalityGuarantee::SolvedOptimally).unwrap();
        assert_eq!(planner.engine(), Engine::AstarHmax);
        let result = planner.solve(&problem);
        assert_eq!(result.status, PlanGenerationResultStatus::SolvedOptimally);
        assert_eq!(result.metric_value, Some(46));
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 12);
        assert_eq!(plan.validate(&problem), Ok(46));
        assert_eq!(plan.actions().iter().filter(|a| a.action == "build_straight_oneway").count(), 2);
    }

    #[test]
    fn test_satisficing_plan_validates() {
        let problem = create_problem().unwrap();
        let result = OneshotPlanner::new(Engine::GbfsHff).solve(&problem);
        assert_eq!(result.status, PlanGenerationResultStatus::SolvedSatisficing);
        let cost = result.plan.unwrap().validate(&problem).unwrap();
        assert!(cost >= 46);
        assert_eq!(result.metric_value, Some(cost));
    }

    #[test]
    fn test_hmax_is_admissible_at_the_start() {
        let task = Task::ground(&create_problem().unwrap()).unwrap();
        let h = Heuristic::new(&task, HeuristicKind::HMax).evaluate(task.init()).unwrap();
        assert!(h > 0 && h <= 46);
    }

    #[test]
    fn test_pddl_text() {
        let problem = create_problem().unwrap();
        let domain = writer::domain_pddl(&problem);
        assert!(domain.contains(":negative-preconditions"));
        assert!(domain.contains("(:functions (total-cost) - number)"));
        assert!(domain.contains("(forall (?c - car) (when (at_car_road ?c ?r1) (not (at_car_road ?c ?r1))))"));
        assert!(domain.contains("(increase (total-cost) 30)"));
        let text = writer::problem_pddl(&problem);
        assert!(text.contains("(:metric minimize (total-cost))"));
        assert!(text.contains("(starting car0 garage0)"));
        assert!(text.contains("(:goal (and (arrived car0 junction1-1) (arrived car1 junction1-0)))"));
    }
}
