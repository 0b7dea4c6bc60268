//! Headless macro recorder: records and replays through the configured
//! global hotkeys until interrupted.

use anyhow::{bail, Context};
use clap::Parser;
use macro_recorder::{
    format_time, ActionLog, Engine, HotkeyAction, InputHook, InputSynthesizer, MacroRecorder,
    RdevSynthesizer, RecorderEvent, SessionState, Settings, XcapScreen,
};
use std::path::PathBuf;
use tokio::signal::ctrl_c;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "macro-recorder")]
#[command(about = "Record and replay global keyboard and mouse input")]
#[command(version)]
struct Cli {
    /// Settings file (created with defaults by --write-settings)
    #[arg(long, default_value = "macro-recorder.json")]
    settings: PathBuf,

    /// Write the effective settings back to the settings file and exit
    #[arg(long)]
    write_settings: bool,

    /// Override the snapshot cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Macro file to load at startup
    #[arg(short, long)]
    open: Option<PathBuf>,

    /// Save the macro here on exit
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Start playing the loaded macro immediately
    #[arg(long, requires = "open")]
    play: bool,

    /// Log synthesized input instead of injecting it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.settings)
        .with_context(|| format!("Failed to read settings from {}", cli.settings.display()))?;
    if let Some(cache_dir) = cli.cache_dir {
        settings.cache_dir = cache_dir;
    }
    if cli.write_settings {
        settings.save(&cli.settings)?;
        return Ok(());
    }

    for action in [HotkeyAction::Record, HotkeyAction::Play, HotkeyAction::Stop] {
        info!(
            action = action.setting_key(),
            hotkey = %settings.hotkeys.get(action).name(),
            "Hotkey"
        );
    }

    let dry_run_log = cli.dry_run.then(ActionLog::new);
    let synth: Box<dyn InputSynthesizer> = match &dry_run_log {
        Some(log) => Box::new(log.clone()),
        None => Box::new(RdevSynthesizer::new()),
    };
    let engine = Engine::new(settings, synth, Box::new(XcapScreen::new()))?;
    let recorder = MacroRecorder::spawn(engine);
    let mut events = recorder.event_stream();

    if let Some(path) = &cli.open {
        recorder
            .load(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        if cli.play {
            recorder.play().await?;
        }
    }

    let hook = InputHook::start(recorder.clone())?;
    info!("Listening for hotkeys. Press Ctrl+C to exit.");

    let mut hook_error = None;
    let mut dry_run_actions = 0usize;
    loop {
        tokio::select! {
            _ = ctrl_c() => {
                info!("Interrupted");
                break;
            }
            event = events.next() => {
                match event {
                    Some(RecorderEvent::StateChanged { from, to }) => {
                        info!(?from, ?to, "State changed");
                        if from == SessionState::Recording {
                            let snapshot = recorder.snapshot().await?;
                            info!(
                                length = %format_time(snapshot.timeline.total_length()),
                                mouse_positions = snapshot.timeline.mouse_positions.len(),
                                key_presses = snapshot.timeline.key_presses.len(),
                                mouse_presses = snapshot.timeline.mouse_presses.len(),
                                "Recorded"
                            );
                        }
                    }
                    Some(RecorderEvent::HookFailed(reason)) => {
                        error!(%reason, "Input hook failed");
                        hook_error = Some(reason);
                        break;
                    }
                    Some(RecorderEvent::Played { current_time, actions }) => {
                        debug!(current_time, actions, "Played");
                        if let Some(log) = &dry_run_log {
                            dry_run_actions += log.take().len();
                        }
                    }
                    Some(other) => debug!(?other, "Recorder event"),
                    None => {
                        warn!("Recorder event stream closed");
                        break;
                    }
                }
            }
        }
    }

    hook.stop();
    recorder.stop().await?;
    if let Some(path) = &cli.save {
        recorder
            .save(path)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
    }
    if let Some(log) = dry_run_log {
        dry_run_actions += log.take().len();
        info!(actions = dry_run_actions, "Dry run finished");
    }
    recorder.shutdown().await?;

    if let Some(reason) = hook_error {
        bail!("input hook registration failed: {}", reason);
    }
    Ok(())
}
