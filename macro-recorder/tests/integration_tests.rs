use image::{Rgba, RgbaImage};
use macro_recorder::*;
use rdev::Key;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio_stream::{Stream, StreamExt};

struct GreyScreen;

impl ScreenSource for GreyScreen {
    fn screen_rect(&mut self) -> Result<Rect> {
        Ok(Rect { x: 0, y: 0, width: 16, height: 12 })
    }

    fn capture(&mut self, rect: Rect) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(rect.width, rect.height, Rgba([128, 128, 128, 255])))
    }
}

fn spawn_recorder() -> (RecorderHandle, ActionLog, TempDir) {
    let dir = tempdir().expect("Failed to create temp dir");
    let settings = Settings {
        cache_dir: dir.path().join("cache"),
        ..Settings::default()
    };
    let log = ActionLog::new();
    let engine = Engine::new(settings, Box::new(log.clone()), Box::new(GreyScreen))
        .expect("Failed to create engine");
    (MacroRecorder::spawn(engine), log, dir)
}

async fn wait_for<S, F>(stream: &mut S, mut matches: F) -> RecorderEvent
where
    S: Stream<Item = RecorderEvent> + Unpin,
    F: FnMut(&RecorderEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(event) if matches(&event) => return event,
                Some(_) => continue,
                None => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for recorder event")
}

#[tokio::test]
async fn test_record_through_handle() {
    let (recorder, _log, _dir) = spawn_recorder();
    let mut events = recorder.event_stream();

    recorder.record().await.unwrap();
    let event = wait_for(&mut events, |e| matches!(e, RecorderEvent::StateChanged { .. })).await;
    assert_eq!(
        event,
        RecorderEvent::StateChanged {
            from: SessionState::Idle,
            to: SessionState::Recording
        }
    );

    recorder
        .send_input(InputEvent::now(InputEventKind::MouseMoved { x: 10, y: 10 }))
        .unwrap();
    recorder
        .send_input(InputEvent::now(InputEventKind::KeyPressed(Key::KeyQ)))
        .unwrap();
    recorder
        .send_input(InputEvent::now(InputEventKind::KeyReleased(Key::KeyQ)))
        .unwrap();

    // Recording ticks keep grabbing the screen
    wait_for(&mut events, |e| matches!(e, RecorderEvent::SnapshotTaken(_))).await;

    recorder.stop().await.unwrap();
    let snapshot = recorder.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.timeline.mouse_positions.len(), 1);
    assert_eq!(snapshot.timeline.key_presses.len(), 1);
    assert!(!snapshot.timeline.key_presses[0].is_open());
    assert!(!snapshot.timeline.screen_states.is_empty());
    assert_eq!(snapshot.timeline.screen_states[0].width, 8);
}

#[tokio::test]
async fn test_playback_runs_to_completion() {
    let (recorder, log, _dir) = spawn_recorder();
    let mut events = recorder.event_stream();

    recorder
        .edit(|timeline| {
            timeline.push_mouse_pos(MousePos::new(0, 1, 1));
            timeline.push_mouse_pos(MousePos::new(200, 2, 2));
            timeline.key_presses.push(Press::closed(0x41, 5, 10));
        })
        .await
        .unwrap();

    recorder.play().await.unwrap();
    wait_for(&mut events, |e| {
        *e == RecorderEvent::StateChanged {
            from: SessionState::Playing,
            to: SessionState::Idle,
        }
    })
    .await;

    assert_eq!(
        log.actions(),
        vec![
            SynthesizedAction::MouseMove { x: 1, y: 1 },
            SynthesizedAction::KeyDown(0x41),
            SynthesizedAction::KeyUp(0x41),
            SynthesizedAction::MouseMove { x: 2, y: 2 },
        ]
    );
    assert_eq!(recorder.state().await.unwrap(), SessionState::Idle);
}

#[tokio::test]
async fn test_play_without_mouse_positions_stays_idle() {
    let (recorder, log, _dir) = spawn_recorder();
    recorder.play().await.unwrap();
    assert_eq!(recorder.state().await.unwrap(), SessionState::Idle);
    assert!(log.actions().is_empty());
}

#[tokio::test]
async fn test_edit_is_refused_while_recording() {
    let (recorder, _log, _dir) = spawn_recorder();
    recorder.record().await.unwrap();

    let result = recorder.edit(|timeline| timeline.clear_events()).await;
    assert!(matches!(
        result,
        Err(MacroRecorderError::Busy(SessionState::Recording))
    ));

    recorder.stop().await.unwrap();
    recorder
        .edit(|timeline| timeline.push_mouse_pos(MousePos::new(7, 0, 0)))
        .await
        .unwrap();
    let snapshot = recorder.snapshot().await.unwrap();
    assert_eq!(snapshot.timeline.mouse_positions, vec![MousePos::new(7, 0, 0)]);
}

#[tokio::test]
async fn test_save_and_load_through_handle() {
    let (recorder, _log, dir) = spawn_recorder();
    let path = dir.path().join("macro.json");

    recorder
        .edit(|timeline| {
            timeline.push_mouse_pos(MousePos::new(0, 5, 5));
            timeline.mouse_presses.push(Press::closed(1, 3, 40));
            timeline.key_presses.push(Press::open(0x20, 9));
        })
        .await
        .unwrap();
    recorder.save(&path).await.unwrap();
    let saved = recorder.snapshot().await.unwrap().timeline;

    recorder.edit(|timeline| timeline.clear_events()).await.unwrap();
    recorder.load(&path).await.unwrap();
    assert_eq!(recorder.snapshot().await.unwrap().timeline, saved);

    let result = recorder.load(dir.path().join("missing.json")).await;
    assert!(matches!(result, Err(MacroRecorderError::LoadError(_))));
    assert_eq!(recorder.snapshot().await.unwrap().timeline, saved);
}

#[tokio::test]
async fn test_hook_failure_is_published() {
    let (recorder, _log, _dir) = spawn_recorder();
    let mut events = recorder.event_stream();
    recorder.record().await.unwrap();

    recorder.hook_failed("no permission".to_string()).unwrap();
    let event = wait_for(&mut events, |e| matches!(e, RecorderEvent::HookFailed(_))).await;
    assert_eq!(event, RecorderEvent::HookFailed("no permission".to_string()));
    assert_eq!(recorder.state().await.unwrap(), SessionState::Idle);
}

#[tokio::test]
async fn test_shutdown_disconnects_handles() {
    let (recorder, _log, _dir) = spawn_recorder();
    let other = recorder.clone();
    recorder.shutdown().await.unwrap();
    assert!(matches!(other.state().await, Err(MacroRecorderError::Disconnected)));
}
