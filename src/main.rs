use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pddl_puzzles::config::{ConfigError, PlannerConfig};
use pddl_puzzles::pddl::{self, writer, Problem};
use pddl_puzzles::planner::{Engine, OneshotPlanner, OptimalityGuarantee, PlanGenerationResult};
use pddl_puzzles::problems::{city_car, tetris};

const DEFAULT_FILTER: &str = "pddl_puzzles=info";

#[derive(Parser)]
#[command(name = "pddl_puzzles")]
#[command(about = "Models the city-car and tetris planning puzzles and solves them")]
struct Cli {
    /// TOML file with planner settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop the search after this many state expansions
    #[arg(long, global = true)]
    max_expansions: Option<usize>,

    /// Also write the model as PDDL domain and problem files into DIR
    #[arg(long, global = true, value_name = "DIR")]
    emit_pddl: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build roads and drive both cars home at minimum cost
    CityCar {
        #[arg(long, value_enum)]
        engine: Option<Engine>,

        /// Follow the optimal run with one by the engine chosen for the problem kind
        #[arg(long)]
        compare: bool,
    },
    /// Clear the top three rows of the board
    Tetris {
        #[arg(long, value_enum)]
        engine: Option<Engine>,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("model: {0}")]
    Model(#[from] pddl::Error),

    #[error("writing PDDL: {0}")]
    Io(#[from] std::io::Error),
}

fn init_logging(config: &PlannerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.as_deref().unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(problem: &Problem, dir: Option<&Path>) -> Result<(), AppError> {
    if let Some(dir) = dir {
        let (domain, problem_file) = writer::write_pddl(problem, dir)?;
        info!(event = "pddl_written", domain = %domain.display(), problem = %problem_file.display());
    }
    Ok(())
}

fn print_failure(result: &PlanGenerationResult) {
    println!("Status: {}", result.status);
    println!("Engine name: {}", result.engine_name);
    if !result.log.is_empty() {
        println!("Log: {:?}", result.log);
    }
    match result.metric_value {
        Some(value) => println!("Metric value: {}", value),
        None => println!("Metric value: None"),
    }
}

fn run_city_car(cli: &Cli, config: &PlannerConfig, engine: Option<Engine>, compare: bool) -> Result<bool, AppError> {
    let problem = city_car::create_problem()?;
    emit(&problem, cli.emit_pddl.as_deref())?;

    println!("\nTrying optimal solver:");
    let optimal = match engine.or(config.engine) {
        Some(engine) => Some(OneshotPlanner::new(engine)),
        None => OneshotPlanner::for_kind(problem.kind(), OptimalityGuarantee::SolvedOptimally),
    };
    let mut solved = false;
    match optimal {
        Some(planner) => {
            let result = planner.with_max_expansions(config.max_expansions).solve(&problem);
            match (&result.plan, result.is_solved()) {
                (Some(plan), true) => {
                    print!("Optimal solution found: {}", plan);
                    println!("Number of actions: {}", plan.len());
                    solved = true;
                }
                (None, true) => println!("Solver returned success but no plan was found"),
                _ => {
                    println!("No optimal solution found");
                    print_failure(&result);
                }
            }
        }
        None => println!("No optimal engine supports this problem kind"),
    }

    if compare {
        println!("\nTrying regular solver:");
        let planner = OneshotPlanner::for_kind(problem.kind(), OptimalityGuarantee::SatisficingOnly)
            .map(|p| p.with_max_expansions(config.max_expansions));
        match planner.map(|p| p.solve(&problem)) {
            Some(PlanGenerationResult { plan: Some(plan), .. }) => {
                print!("Solution found: {}", plan);
                println!("Number of actions: {}", plan.len());
            }
            _ => println!("No solution found"),
        }
    }
    Ok(solved)
}

fn run_tetris(cli: &Cli, config: &PlannerConfig, engine: Option<Engine>) -> Result<bool, AppError> {
    let problem = tetris::create_problem()?;
    emit(&problem, cli.emit_pddl.as_deref())?;

    let engine = engine.or(config.engine).unwrap_or(Engine::GbfsHff);
    let result = OneshotPlanner::new(engine).with_max_expansions(config.max_expansions).solve(&problem);
    match &result.plan {
        Some(plan) if result.is_solved() => {
            print!("{} returned: {}", result.engine_name, plan);
            Ok(true)
        }
        _ => {
            println!("No plan found.");
            Ok(false)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => match PlannerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", AppError::from(e));
                return ExitCode::from(2);
            }
        },
        None => PlannerConfig::default(),
    };
    if let Some(max_expansions) = cli.max_expansions {
        config.max_expansions = max_expansions;
    }
    init_logging(&config);

    let outcome = match &cli.command {
        Command::CityCar { engine, compare } => run_city_car(&cli, &config, *engine, *compare),
        Command::Tetris { engine } => run_tetris(&cli, &config, *engine),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
