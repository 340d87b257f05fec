//! Grasp CLI
//!
//! Inspect registered actions and replay reflows against a fixed rect.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grasp_core::signals::channels;
use grasp_core::{event_type, EventPhase, Point, Propagation, Rect, Scope, Target};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::GraspConfig;

#[derive(Parser)]
#[command(name = "grasp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grasp interaction engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./grasp.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the actions registered in the configured scope
    Actions,

    /// Replay one reflow and log every synthesized event
    Reflow {
        /// Action to reflow (drag, resize, gesture, ...)
        #[arg(short, long, default_value = "drag")]
        action: String,

        /// Target rect as LEFT,TOP,RIGHT,BOTTOM
        #[arg(short, long, value_parser = parse_rect, allow_hyphen_values = true)]
        rect: Rect,

        /// Offset applied to the pointer before the move, as DX,DY
        #[arg(short, long, value_parser = parse_point, allow_hyphen_values = true)]
        steer: Option<Point>,

        /// Veto the end and stop the interaction on a timer
        #[arg(long)]
        veto: bool,

        /// Delay before the vetoed interaction is stopped
        #[arg(long, default_value = "0")]
        veto_delay_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = GraspConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Actions => cmd_actions(config),

        Commands::Reflow {
            action,
            rect,
            steer,
            veto,
            veto_delay_ms,
        } => cmd_reflow(
            config,
            &action,
            rect,
            steer,
            veto.then(|| Duration::from_millis(veto_delay_ms)),
        ),
    }
}

fn cmd_actions(config: GraspConfig) -> Result<()> {
    let scope = Scope::with_config(config.scope);

    for name in scope.actions().names() {
        let events = scope
            .actions()
            .get(&name)
            .map(|kind| kind.event_types().join(", "))
            .unwrap_or_default();
        println!("{name:<12} {events}");
    }
    Ok(())
}

fn cmd_reflow(
    config: GraspConfig,
    action: &str,
    rect: Rect,
    steer: Option<Point>,
    veto_stop_after: Option<Duration>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async {
        let scope = Scope::with_config(config.scope);
        let target = scope.interactable(Target::element(1));
        target.set_rect_checker(move |_| Some(rect));

        for phase in EventPhase::ALL {
            scope.on(&event_type(action, phase), |event| {
                info!(
                    event = %event.event_type,
                    x = event.page.x,
                    y = event.page.y,
                    delta = ?event.delta.map(|d| (d.x, d.y)),
                    t = event.time_stamp,
                    "event"
                );
            });
        }

        if let Some(offset) = steer {
            scope.signals().on(channels::BEFORE_ACTION_MOVE, move |payload| {
                if let Some(interaction) = payload.interaction() {
                    let page = interaction.cur_coords().page;
                    interaction.set_cur_page(page + offset);
                }
            });
        }

        if let Some(delay) = veto_stop_after {
            scope.signals().on(channels::BEFORE_ACTION_END, move |payload| {
                let Some(interaction) = payload.interaction().cloned() else {
                    return Propagation::Continue;
                };
                info!(delay_ms = delay.as_millis() as u64, "vetoing end");
                tokio::task::spawn_local(async move {
                    tokio::time::sleep(delay).await;
                    interaction.stop();
                });
                Propagation::Veto
            });
        }

        let handle = target
            .reflow(action)
            .with_context(|| format!("Failed to reflow '{action}'"))?;
        let interaction = handle.interaction().clone();
        info!(
            interaction = interaction.id().0,
            pending = !handle.is_complete(),
            "reflow started"
        );

        handle.await.context("Reflow did not complete")?;
        info!(
            interaction = interaction.id().0,
            moved = interaction.pointer_was_moved(),
            "reflow complete"
        );
        Ok::<(), anyhow::Error>(())
    })
}

fn parse_numbers<const N: usize>(value: &str) -> std::result::Result<[f64; N], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got '{value}'"));
    }

    let mut numbers = [0.0; N];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(numbers)
}

fn parse_rect(value: &str) -> std::result::Result<Rect, String> {
    let [left, top, right, bottom] = parse_numbers::<4>(value)?;
    if right < left || bottom < top {
        return Err(format!("rect '{value}' has negative size"));
    }
    Ok(Rect::new(top, left, bottom, right))
}

fn parse_point(value: &str) -> std::result::Result<Point, String> {
    let [x, y] = parse_numbers::<2>(value)?;
    Ok(Point::new(x, y))
}
