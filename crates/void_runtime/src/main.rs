//! Void World Runner
//!
//! Loads a world document and plays it headless for a fixed number of frames.
//!
//! Run with: cargo run -p void_runtime -- crates/void_runtime/worlds/demo.json
//!       or: cargo run --bin void-world -- --frames=10

mod config;

use std::process::ExitCode;

use thiserror::Error;
use void_core::CoreError;
use void_parse::ParseError;
use void_world::{Factories, World, WorldError};

use crate::config::RuntimeConfig;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn main() -> ExitCode {
    let config = RuntimeConfig::load();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter())).init();
    config.print_summary();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RuntimeConfig) -> Result<(), RunError> {
    let world = World::new(&config.name, Factories::with_builtins()?)?;
    let mut world = match &config.world {
        Some(path) => void_parse::load_world_file(path, world)?,
        None => {
            log::warn!("No world document given; running an empty world");
            world
        }
    };

    let step = config.step();
    for frame in 0..config.frames {
        world.tick(step)?;
        log::trace!("frame {} done", frame);
    }

    let time = world.state().game_time;
    log::info!(
        "'{}' ran {} frames ({:?} of game time, {} events pending)",
        world.name(),
        config.frames,
        time.total,
        world.events().len()
    );
    Ok(())
}
