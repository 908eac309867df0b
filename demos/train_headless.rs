// Demonstration: run the training loop on a background thread and watch it
// through a render channel, the way a GUI would.
//
// Run from the repo root:
//   cargo run --example train_headless -- --episodes 500 --seconds 10 --prioritized
//   RUST_LOG=maac=debug cargo run --example train_headless -- --episodes 5

use std::env;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use maac::env::EnvConfig;
use maac::policy::GreedyCoveragePolicy;
use maac::training::{ChannelSink, RenderFrame, Trainer, TrainingConfig};
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
    let episodes: u32 = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(200);
    let seconds: u64 = arg_value(&args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let config = TrainingConfig {
        grid_size: 8,
        agent_count: 3,
        n_episodes: episodes,
        buffer_capacity: 10_000,
        batch_size: 64,
        render_period: 50,
        print_interval: 50,
        exploration_noise: 0.2,
        prioritized: args.iter().any(|a| a == "--prioritized"),
        seed,
        ..Default::default()
    };

    let layout = config.layout()?;
    if let Some(path) = arg_value(&args, "--save-layout") {
        layout.save_json(path)?;
    }
    let actions = EnvConfig::new(layout.clone()).action_set();
    let policy = Box::new(GreedyCoveragePolicy::new(actions, seed));

    let (sink, frames) = ChannelSink::bounded(256);
    let handle = Trainer::with_layout(config, layout, policy)?
        .with_sink(sink)
        .spawn();

    let deadline = Instant::now() + Duration::from_secs(seconds);
    loop {
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) if frame.visual && (frame.reset || frame.dirty_remaining() == 0) => {
                print_frame(&frame);
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if Instant::now() >= deadline && !handle.is_finished() {
            println!("time limit reached, stopping");
            handle.stop();
        }
        if handle.is_finished() {
            break;
        }
    }

    let report = handle.join()?;
    println!(
        "episodes: {}  steps: {}  learn calls: {}  stopped: {}",
        report.episodes(),
        report.total_steps,
        report.learn_calls,
        report.stopped
    );
    if let Some(avg) = report.average_score() {
        println!("average score (last 100): {:.2}", avg);
    }
    match report.fastest_solve {
        Some(steps) => println!("fastest solve: {} steps", steps),
        None => println!("no episode cleared the map"),
    }
    println!("resume from episode {}", report.next_episode);
    Ok(())
}

/// Prints a frame as text: digits for agents, `#` for dirty cells, a letter
/// for the agent that first visited a clean cell.
fn print_frame(frame: &RenderFrame) {
    println!(
        "episode {} step {}{}",
        frame.episode,
        frame.steps,
        if frame.reset { " (reset)" } else { "" }
    );
    let (n_row, n_col) = frame.dirty.dim();
    for row in 0..n_row {
        let line: String = (0..n_col)
            .map(|col| {
                if let Some(agent) = frame.agents.iter().find(|a| a.position.ix() == (row, col)) {
                    return char::from_digit(agent.index as u32 % 10, 10).unwrap_or('?');
                }
                if frame.dirty[(row, col)] {
                    return '#';
                }
                match frame.visited[(row, col)] {
                    Some(agent) => (b'a' + (agent % 26) as u8) as char,
                    None => '.',
                }
            })
            .collect();
        println!("  {}", line);
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
