//! A terminal client for signing in to a woven server

/// The "functional core" to the main module's "imperative shell"
mod app;

/// Configuration and argument parsing
mod config;

/// Focus cycling for forms
mod form_fields;

use app::{App, EffectContext, Problem};
use clap::Parser;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::{io, path::Path, process::ExitCode, sync::Arc, time::Duration};
use tokio::{
    fs,
    sync::mpsc::{unbounded_channel, UnboundedSender},
    task::JoinHandle,
    time,
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use woven_core::MissingTokenPolicy;

/// How long to wait for each outstanding effect when exiting.
const EXIT_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<ExitCode, Problem> {
    let config = config::Config::parse();

    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir).await?;
    let _log_guard = init_logging(&data_dir);

    let context = Arc::new(EffectContext::new(&config)?);
    tracing::info!(server = %config.server, "starting");

    let mut terminal = ratatui::init();
    terminal.clear()?;
    let res = run(terminal, context, config.missing_token_policy()).await;
    ratatui::restore();

    Ok(res?)
}

/// The terminal belongs to the UI, so logs go to a file in the data directory.
/// Logs are flushed when the returned guard is dropped.
fn init_logging(data_dir: &Path) -> WorkerGuard {
    let appender = rolling::never(data_dir, "woven.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    guard
}

/// Manage the lifecycle of the app
async fn run(
    mut terminal: DefaultTerminal,
    context: Arc<EffectContext>,
    policy: MissingTokenPolicy,
) -> io::Result<ExitCode> {
    let mut app = App::new(policy);

    // We expect side-effectful behaviors (that is, things like FS or network
    // access) to take place via async tasks. Once those tasks are done, we read
    // their results off of a channel. We keep track of outstanding effects so
    // we can exit cleanly.
    let (effect_tx, mut effect_rx) = unbounded_channel();
    let mut outstanding_effects = Vec::with_capacity(1);

    outstanding_effects.push(spawn_effect_task(
        effect_tx.clone(),
        Arc::clone(&context),
        app.init(),
    ));
    terminal.draw(|frame| app.render(frame))?;

    let mut event_stream = EventStream::new();

    loop {
        // Wait for either external input or the result of an effect. Not
        // every terminal event matters to us, hence the `Option`.
        let next_action_opt = tokio::select! {
            event_opt = event_stream.next() => {
                match event_opt {
                    Some(Ok(Event::Key(key_event))) => {
                        Some(app::Action::Key(key_event))
                    }
                    Some(Err(err)) => {
                        Some(app::Action::Problem(err.to_string()))
                    }
                    _ => None,
                }
            },

            effect_opt = effect_rx.recv() => {
                effect_opt
            }
        };

        if let Some(action) = next_action_opt {
            for effect in app.handle(action) {
                outstanding_effects.push(spawn_effect_task(
                    effect_tx.clone(),
                    Arc::clone(&context),
                    effect,
                ));
            }
        }

        terminal.draw(|frame| app.render(frame))?;

        // This list should never be too long (since we do this on every pass
        // through the event loop) so a full scan is fine.
        outstanding_effects.retain(|handle| !handle.is_finished());

        // Give outstanding effects (e.g. saving the session token) a chance
        // to finish before exiting. Requests have no timeout of their own
        // unless configured, so we can't wait on them forever.
        if let Some(code) = app.should_exit() {
            for effect in outstanding_effects.drain(..) {
                match time::timeout(EXIT_GRACE, effect).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => tracing::error!(?err, "effect task failed while exiting"),
                    Err(_) => tracing::warn!("gave up waiting for an effect while exiting"),
                }
            }

            return Ok(code);
        }
    }
}

/// Spawn a task to run an effect and send the next action to the app.
fn spawn_effect_task(
    effect_tx: UnboundedSender<app::Action>,
    context: Arc<EffectContext>,
    effect: app::Effect,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(next_action) = effect.run(&context).await {
            // A closed channel means we're shutting down, so it's fine to
            // drop the action.
            let _ = effect_tx.send(next_action);
        }
    })
}
