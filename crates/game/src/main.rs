//! Polarity headless runner: plays the scripted input from the config through
//! the game at a fixed physics rate and logs what the agent does.
//!
//! `polarity [config.ron]` runs; `polarity --write-default-config` writes the
//! defaults to `config.ron` and exits.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_core::Time;
use game::{AgentFactory, Game, GameConfig, ScriptKey, ScriptedInput};
use input::{ElementState, InputState, KeyBindings, KeyCode};

fn key_for(bindings: &KeyBindings, key: ScriptKey) -> Option<KeyCode> {
    match key {
        ScriptKey::Left => bindings.left.first().copied(),
        ScriptKey::Right => bindings.right.first().copied(),
        ScriptKey::Jump => Some(bindings.jump),
        ScriptKey::Dash => Some(bindings.dash),
        ScriptKey::Shift => Some(bindings.shift),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(arg) if arg == "--write-default-config" => {
            let path = PathBuf::from("config.ron");
            GameConfig::default().save(&path);
            log::info!("Wrote default config to {:?}", path);
            return Ok(());
        }
        Some(path) => GameConfig::load_from(&PathBuf::from(path)),
        None => GameConfig::load(),
    };
    let run = config.run.clone();

    let mut script: Vec<ScriptedInput> = run.script.clone();
    script.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut script = script.into_iter().peekable();

    let mut game = Game::new(config).context("invalid configuration")?;
    let bindings = KeyBindings::default();
    let mut input = InputState::with_bindings(bindings.clone());
    let mut time = Time::new();
    time.set_fixed_rate(run.fixed_rate_hz);
    let fixed_dt = time.fixed_timestep_seconds();
    let frame = Duration::from_secs_f32(run.frame_delta);

    log::info!(
        "Starting Polarity: {:.1}s at {} Hz physics, {} scripted inputs",
        run.duration,
        run.fixed_rate_hz,
        run.script.len()
    );
    game.on_init();

    let mut physics_steps: u64 = 0;
    let mut shifts = 0u32;
    let mut polarity = game.polarity();
    let mut next_report = 1.0;

    while time.elapsed_seconds() < run.duration {
        time.advance(frame);
        input.begin_frame();

        while let Some(event) = script.next_if(|e| e.at <= time.elapsed_seconds()) {
            match key_for(&bindings, event.key) {
                Some(key) => {
                    let state = if event.pressed {
                        ElementState::Pressed
                    } else {
                        ElementState::Released
                    };
                    log::debug!("t={:.2} {:?} {:?}", time.elapsed_seconds(), event.key, state);
                    input.process_keyboard(key, state);
                }
                None => log::warn!("no key bound for {:?}", event.key),
            }
        }

        game.on_input_tick(time.delta_seconds(), &input);
        while time.should_fixed_update() {
            game.on_physics_tick(fixed_dt);
            physics_steps += 1;
        }

        if game.polarity() != polarity {
            polarity = game.polarity();
            shifts += 1;
        }

        if time.elapsed_seconds() >= next_report {
            next_report += 1.0;
            match (game.agent(), game.controller()) {
                (Some(agent), Some(controller)) => log::info!(
                    "t={:.1} {:?} at {:?} {:?} jumps={} dash_ready={}",
                    time.elapsed_seconds(),
                    polarity,
                    game.stage().agent_position(agent).unwrap_or_default(),
                    controller.locomotion_state(),
                    controller.state().jump_count,
                    controller.can_dash()
                ),
                _ => log::info!("t={:.1} shifting", time.elapsed_seconds()),
            }
        }
    }

    log::info!(
        "Done: {} frames, {} physics steps, {} shifts, ending {:?} with camera at {:?}",
        time.frame_count(),
        physics_steps,
        shifts,
        game.polarity(),
        game.camera().position()
    );
    Ok(())
}
