// Demonstration: evaluate a baseline policy on a coverage map.
//
// Run from the repo root:
//   cargo run --example coverage_demo -- --policy greedy --episodes 50 --grid 10 --agents 3
//   cargo run --example coverage_demo -- --layout saved_layout.json

use std::env;

use maac::env::{CoverageEnv, EnvConfig, EnvLayout};
use maac::policy::{GreedyCoveragePolicy, Policy, RandomPolicy};
use maac::training::{EvaluationMetrics, TrainingConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("maac=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> maac::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("greedy");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let grid: usize = arg_value(&args, "--grid")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let agents: usize = arg_value(&args, "--agents")
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    let layout = match arg_value(&args, "--layout") {
        Some(path) => EnvLayout::load_json(path)?,
        None => TrainingConfig {
            grid_size: grid,
            agent_count: agents,
            seed,
            ..Default::default()
        }
        .layout()?,
    };
    let config = EnvConfig::new(layout);
    let actions = config.action_set();
    let mut env = CoverageEnv::new(config)?;

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(actions, seed)),
        "greedy" => Box::new(GreedyCoveragePolicy::new(actions, seed)),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'greedy' or 'random'.", other);
            std::process::exit(2);
        }
    };

    let metrics = EvaluationMetrics::evaluate(&mut env, policy.as_mut(), episodes)?;
    println!("Policy: {}", policy.name());
    println!("{}", metrics);
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
