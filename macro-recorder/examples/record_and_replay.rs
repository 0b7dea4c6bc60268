use macro_recorder::{
    ActionLog, Engine, InputHook, MacroRecorder, RecorderEvent, SessionState, Settings,
    XcapScreen,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Records for five seconds, replays into an action log and saves the macro.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let log = ActionLog::new();
    let engine = Engine::new(
        Settings::default(),
        Box::new(log.clone()),
        Box::new(XcapScreen::new()),
    )?;
    let recorder = MacroRecorder::spawn(engine);
    let mut events = recorder.event_stream();
    let _hook = InputHook::start(recorder.clone())?;

    info!("Recording for 5 seconds. Move the mouse around...");
    recorder.record().await?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    recorder.stop().await?;

    if recorder.snapshot().await?.timeline.has_mouse_positions() {
        recorder.play().await?;
        while let Some(event) = events.next().await {
            if event
                == (RecorderEvent::StateChanged {
                    from: SessionState::Playing,
                    to: SessionState::Idle,
                })
            {
                break;
            }
        }
        info!(actions = log.actions().len(), "Replayed into the action log");
    }

    let output_path = PathBuf::from("macro_recording.json");
    recorder.save(&output_path).await?;
    info!("Macro saved to {:?}", output_path);
    recorder.shutdown().await?;
    Ok(())
}
