//! Segue demo player - Main entry point
//!
//! Drives a playlist of simulated tracks through the playback controller and
//! prints the events it emits: item changes, boundary handoffs, skips and the
//! end of the queue.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use segue_common::{PlaybackEndReason, PlayerEvent, RepeatMode};
use segue_player::playback::{engine_channel, EngineState, PlaybackEngine, SimulatedEngine, Track};
use segue_player::{Player, PlayerConfig, PlayerHandle};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for segue
#[derive(Parser, Debug)]
#[command(name = "segue")]
#[command(about = "Queue-driven playback transitions over a simulated engine")]
#[command(version)]
struct Args {
    /// Path to config file (overrides SEGUE_CONFIG and the user config dir)
    #[arg(short, long, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,

    /// Number of simulated tracks to enqueue
    #[arg(short, long, default_value = "3")]
    tracks: usize,

    /// Duration of each simulated track in milliseconds
    #[arg(long, default_value = "2000")]
    track_ms: u64,

    /// Repeat mode: off, track or queue (overrides config)
    #[arg(short, long)]
    repeat: Option<RepeatMode>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Stop after this many seconds even if playback has not ended
    #[arg(long, default_value = "60")]
    max_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PlayerConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(mode) = args.repeat {
        config.repeat_mode = mode;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    let level = &config.logging.level;
                    format!("segue={0},segue_player={0},segue_common={0}", level).into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting segue with {} tracks of {}ms (repeat {})",
        args.tracks, args.track_ms, config.repeat_mode
    );

    let (callbacks, engine_events) = engine_channel();
    let engine = SimulatedEngine::new(callbacks);
    let player = Player::spawn(engine, engine_events, config);
    let handle = player.handle();
    let mut events = handle.subscribe();

    let playlist: Vec<Track> = (1..=args.tracks)
        .map(|n| Track::new(format!("Track {}", n), Duration::from_millis(args.track_ms)))
        .collect();
    handle
        .add(playlist, Some(true))
        .await
        .context("Failed to enqueue playlist")?;

    let deadline = tokio::time::sleep(Duration::from_secs(args.max_seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    print_event(&event, args.json)?;
                    if is_end_of_queue(&event, &handle).await? {
                        info!("Queue finished");
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!("Missed {} events", missed),
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                info!("Time limit of {}s reached", args.max_seconds);
                break;
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    player.shutdown().await;
    Ok(())
}

fn print_event(event: &PlayerEvent<Track>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event).context("Failed to encode event")?);
        return Ok(());
    }

    match event {
        PlayerEvent::CurrentItemChanged {
            item,
            index,
            previous_position_ms,
            ..
        } => match (item, index) {
            (Some(track), Some(index)) => println!(
                "now playing [{}] {} (previous stopped at {}ms)",
                index, track, previous_position_ms
            ),
            _ => println!("nothing loaded"),
        },
        PlayerEvent::PlaybackEnded { reason, .. } => println!("ended: {}", reason),
        PlayerEvent::QueueChanged {
            length,
            current_index,
            trigger,
            ..
        } => println!(
            "queue: {} items, current {:?} ({})",
            length, current_index, trigger
        ),
        PlayerEvent::RepeatModeChanged { mode, .. } => println!("repeat: {}", mode),
    }
    Ok(())
}

/// A played-until-end that left the engine in its terminal state
async fn is_end_of_queue(
    event: &PlayerEvent<Track>,
    handle: &PlayerHandle<SimulatedEngine>,
) -> Result<bool> {
    if !matches!(
        event,
        PlayerEvent::PlaybackEnded {
            reason: PlaybackEndReason::PlayedUntilEnd,
            ..
        }
    ) {
        return Ok(false);
    }
    let state = handle.with(|c| c.engine().state()).await?;
    Ok(state == EngineState::Ended)
}
