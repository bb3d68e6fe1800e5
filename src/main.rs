//! Robo Track entry point
//!
//! Runs a headless match: loads settings, drives the player with a simple
//! autopilot, and logs events until the match ends or the tick budget runs out.
//!
//! Usage: `robo-track [SETTINGS.json] [--max-ticks N] [--dump]`

use std::path::PathBuf;
use std::process::ExitCode;

use robo_track::Settings;
use robo_track::audio::SoundBoard;
use robo_track::compass_heading;
use robo_track::consts::STEER_INCREMENT;
use robo_track::sim::{Outcome, Targets, TurnDirection, World, plan_turn, tick};

const DEFAULT_MAX_TICKS: u64 = 30_000;

struct Args {
    settings_path: Option<PathBuf>,
    max_ticks: u64,
    dump: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        settings_path: None,
        max_ticks: DEFAULT_MAX_TICKS,
        dump: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dump" => args.dump = true,
            "--max-ticks" => {
                let value = iter.next().ok_or("--max-ticks needs a value")?;
                args.max_ticks = value
                    .parse()
                    .map_err(|_| format!("invalid tick count: {value}"))?;
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option: {arg}")),
            _ => args.settings_path = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

/// Steer the player toward its next checkpoint, easing off on sharp turns
fn autopilot(world: &mut World) {
    let Some(stats) = world.player_stats() else {
        return;
    };
    let target = world.checkpoint_position(stats.last_checkpoint + 1);
    let desired = compass_heading(world.player_position(), target);
    let plan = plan_turn(stats.heading, desired);

    let wanted = match plan.direction {
        TurnDirection::Right => plan.right_amount,
        TurnDirection::Left => -plan.left_amount,
    };
    if wanted > stats.steering + STEER_INCREMENT {
        world.steer_right();
    } else if wanted < stats.steering - STEER_INCREMENT {
        world.steer_left();
    }

    if plan.sharp {
        world.brake();
    } else {
        world.accelerate();
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("usage: robo-track [SETTINGS.json] [--max-ticks N] [--dump]");
            return ExitCode::from(2);
        }
    };

    let settings = args
        .settings_path
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    let interval = settings.tick_interval_ms;
    log::info!("Robo Track (headless) starting, seed {}", settings.seed);

    let mut sounds = SoundBoard::default();
    let mut world = World::initialized(settings);
    let flip_at = args.max_ticks / 2;
    let mut outcome = None;

    for n in 0..args.max_ticks {
        if n == flip_at {
            world.toggle_agent_strategies();
        }
        autopilot(&mut world);

        let report = tick(&mut world, interval);
        for event in &report.events {
            log::debug!("{event:?}");
        }
        sounds.dispatch(&world, &report.events);

        if report.outcome.is_some() {
            outcome = report.outcome;
            break;
        }
    }

    if args.dump {
        match serde_json::to_string_pretty(&world.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Failed to serialize world: {err}"),
        }
    }

    match outcome {
        Some(Outcome::PlayerWon { clock_secs }) => {
            println!("You win! Total time: {clock_secs}s");
            ExitCode::SUCCESS
        }
        Some(Outcome::OpponentWon) => {
            println!("Game over, a non-player robot wins");
            ExitCode::from(1)
        }
        Some(Outcome::PlayerLost) => {
            println!("Game over, you failed");
            ExitCode::from(1)
        }
        None => {
            println!(
                "No winner after {} ticks; player at checkpoint {}",
                args.max_ticks,
                world.player_last_checkpoint()
            );
            ExitCode::from(3)
        }
    }
}
