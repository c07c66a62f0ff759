//! CutsceneKit player (ckit-player) - Main entry point
//!
//! Plays a TOML cutscene script in real time: a tokio interval drives the
//! host loop, stdin commands skip the current group, and the final stage
//! state is printed on exit.

use std::cell::Cell;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use ckit_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use ckit_common::events::{CutsceneEvent, EventBus};
use ckit_common::time::format_duration;
use ckit_player::script::Script;
use ckit_player::{HostLoop, Playlist, Stage};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for ckit-player
#[derive(Parser, Debug)]
#[command(name = "ckit-player")]
#[command(about = "Play a CutsceneKit script")]
#[command(version)]
struct Args {
    /// Cutscene script (TOML)
    script: PathBuf,

    /// Config file path
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Host loop tick interval in milliseconds (overrides config)
    #[arg(long, env = "CKIT_TICK_MS")]
    tick_ms: Option<u64>,

    /// Print lifecycle events to stdout as JSON lines
    #[arg(long)]
    events: bool,
}

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Finished,
    Quit,
    Interrupted,
}

// Rc-based scheduler: everything stays on one thread
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config)?;

    info!("Starting CutsceneKit player");
    if let Some(path) = &config_path {
        info!("Config: {}", path.display());
    }
    info!("Script: {}", args.script.display());

    let script = Script::load(&args.script)
        .with_context(|| format!("Failed to load script {}", args.script.display()))?;
    info!(
        groups = script.groups.len(),
        actions = script.action_count(),
        "Script loaded"
    );

    let stage = Stage::new();
    let groups = script
        .build(&stage, config.playback.default_easing)
        .context("Failed to build cutscene")?;

    let host = HostLoop::new();
    let bus = EventBus::new(config.playback.event_capacity);
    let events = args.events.then(|| bus.subscribe());
    let playlist = Playlist::with_groups(&host, groups)
        .context("Failed to queue groups")?
        .with_event_bus(bus);

    let exit = play(&host, &playlist, &config, events).await?;

    info!(
        ?exit,
        groups_played = playlist.groups_played(),
        elapsed = %format_duration(host.now()),
        "Player stopped"
    );
    print!("{}", stage);
    Ok(())
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        format!("ckit_player={level},ckit_common={level}").into()
    });

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Drive the playlist until it drains, the user quits, or Ctrl+C
async fn play(
    host: &HostLoop,
    playlist: &Playlist,
    config: &TomlConfig,
    mut events: Option<broadcast::Receiver<CutsceneEvent>>,
) -> Result<Exit> {
    let done = Rc::new(Cell::new(false));
    let finished = done.clone();
    playlist.begin(move || finished.set(true));
    print_events(&mut events)?;

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !done.get() {
        tokio::select! {
            tick = ticker.tick() => {
                let dt: Duration = tick.duration_since(last);
                last = tick;
                host.tick(dt);
            }
            line = stdin.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match line.trim() {
                        "s" | "skip" => {
                            if !playlist.skip_current() {
                                warn!("Nothing to skip");
                            }
                        }
                        "q" | "quit" => return Ok(Exit::Quit),
                        "" => {}
                        other => warn!("Unknown command '{}' (skip, quit)", other),
                    },
                    None => stdin_open = false,
                }
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, stopping");
                return Ok(Exit::Interrupted);
            }
        }
        print_events(&mut events)?;
    }

    Ok(Exit::Finished)
}

fn print_events(events: &mut Option<broadcast::Receiver<CutsceneEvent>>) -> Result<()> {
    let Some(rx) = events else {
        return Ok(());
    };
    loop {
        match rx.try_recv() {
            Ok(event) => println!("{}", event.to_json_line().context("Failed to encode event")?),
            Err(TryRecvError::Lagged(missed)) => warn!(missed, "Event output lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}
