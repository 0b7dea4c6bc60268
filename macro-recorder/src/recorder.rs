use crate::engine::{Engine, TickOutcome};
use crate::session::SessionState;
use crate::{InputEvent, MacroRecorderError, Result, ScreenState, Timeline};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;
use tracing::{debug, error, info, instrument};

mod hook;

pub use self::hook::{DragTracker, InputHook};

type EditFn = Box<dyn FnOnce(&mut Timeline) + Send>;

enum Command {
    Input(InputEvent),
    Record,
    Play,
    Stop,
    Save(PathBuf, oneshot::Sender<Result<()>>),
    Load(PathBuf, oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<RecorderSnapshot>),
    Edit(EditFn, oneshot::Sender<Result<()>>),
    HookFailed(String),
    Shutdown(oneshot::Sender<()>),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Input(_) => "Input",
            Command::Record => "Record",
            Command::Play => "Play",
            Command::Stop => "Stop",
            Command::Save(..) => "Save",
            Command::Load(..) => "Load",
            Command::Snapshot(_) => "Snapshot",
            Command::Edit(..) => "Edit",
            Command::HookFailed(_) => "HookFailed",
            Command::Shutdown(_) => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Notifications published by the recorder task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecorderEvent {
    StateChanged { from: SessionState, to: SessionState },
    /// A recording tick stored a frame
    SnapshotTaken(ScreenState),
    /// A playback tick synthesized input
    Played { current_time: u64, actions: usize },
    /// The global input hook died
    HookFailed(String),
}

/// Point-in-time copy of the recorder's state
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSnapshot {
    pub state: SessionState,
    pub current_time: u64,
    pub timeline: Timeline,
}

/// The single owner of an [`Engine`].
///
/// Input notifications, ticks and requests are all serialized onto one
/// task, so the timeline is only ever mutated from one place.
pub struct MacroRecorder {
    engine: Engine,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: broadcast::Sender<RecorderEvent>,
}

impl MacroRecorder {
    /// Move `engine` onto a new task and return a handle to it.
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: Engine) -> RecorderHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(100);
        let recorder = Self {
            engine,
            command_rx,
            event_tx: event_tx.clone(),
        };
        tokio::spawn(recorder.run());
        RecorderHandle {
            command_tx,
            event_tx,
        }
    }

    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.engine.settings().tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Recorder task started");

        loop {
            let active = self.engine.state() != SessionState::Idle;
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else {
                        debug!("All handles dropped");
                        break;
                    };
                    let before = self.engine.state();
                    let keep_running = self.handle(command);
                    let after = self.engine.state();
                    if before == SessionState::Idle && after != SessionState::Idle {
                        ticker.reset();
                    }
                    self.state_changed(before, after);
                    if !keep_running {
                        break;
                    }
                }
                _ = ticker.tick(), if active => {
                    let before = self.engine.state();
                    let outcome = self.engine.tick(Instant::now());
                    self.publish_tick(outcome);
                    self.state_changed(before, self.engine.state());
                }
            }
        }

        self.engine.stop();
        info!("Recorder task finished");
    }

    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Input(event) => {
                self.engine.handle_input(&event);
            }
            Command::Record => {
                self.engine.record(Instant::now());
            }
            Command::Play => {
                self.engine.play_back(Instant::now());
            }
            Command::Stop => {
                self.engine.stop();
            }
            Command::Save(path, reply) => {
                let _ = reply.send(self.engine.save_to_file(&path));
            }
            Command::Load(path, reply) => {
                let _ = reply.send(self.engine.load_from_file(&path));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(RecorderSnapshot {
                    state: self.engine.state(),
                    current_time: self.engine.session().current_time(),
                    timeline: self.engine.timeline().clone(),
                });
            }
            Command::Edit(edit, reply) => {
                let result = self.engine.timeline_mut().map(|timeline| edit(timeline));
                let _ = reply.send(result);
            }
            Command::HookFailed(reason) => {
                error!(%reason, "Input hook failed");
                self.engine.stop();
                let _ = self.event_tx.send(RecorderEvent::HookFailed(reason));
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn publish_tick(&self, outcome: TickOutcome) {
        if let Some(state) = outcome.snapshot {
            let _ = self.event_tx.send(RecorderEvent::SnapshotTaken(state));
        }
        if outcome.actions > 0 {
            let _ = self.event_tx.send(RecorderEvent::Played {
                current_time: outcome.current_time,
                actions: outcome.actions,
            });
        }
    }

    fn state_changed(&self, from: SessionState, to: SessionState) {
        if from != to {
            debug!(?from, ?to, "State changed");
            let _ = self.event_tx.send(RecorderEvent::StateChanged { from, to });
        }
    }
}

/// Cloneable front end to a running [`MacroRecorder`]
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<RecorderEvent>,
}

impl RecorderHandle {
    /// Get a stream of recorder events
    pub fn event_stream(&self) -> impl Stream<Item = RecorderEvent> {
        let mut rx = self.event_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Forward a raw input notification. Callable from any thread.
    pub fn send_input(&self, event: InputEvent) -> Result<()> {
        self.send(Command::Input(event))
    }

    #[instrument(skip(self))]
    pub async fn record(&self) -> Result<()> {
        self.send(Command::Record)
    }

    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Save(path.as_ref().to_path_buf(), reply))?;
        rx.await.map_err(|_| MacroRecorderError::Disconnected)?
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Load(path.as_ref().to_path_buf(), reply))?;
        rx.await.map_err(|_| MacroRecorderError::Disconnected)?
    }

    /// Run `edit` against the timeline on the recorder task. Refused with
    /// [`MacroRecorderError::Busy`] unless the recorder is idle.
    #[instrument(skip_all)]
    pub async fn edit<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Timeline) + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Edit(Box::new(edit), reply))?;
        rx.await.map_err(|_| MacroRecorderError::Disconnected)?
    }

    pub async fn snapshot(&self) -> Result<RecorderSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| MacroRecorderError::Disconnected)
    }

    pub async fn state(&self) -> Result<SessionState> {
        Ok(self.snapshot().await?.state)
    }

    /// Report a dead input hook; the recorder stops and publishes
    /// [`RecorderEvent::HookFailed`].
    pub fn hook_failed(&self, reason: String) -> Result<()> {
        self.send(Command::HookFailed(reason))
    }

    /// Stop the recorder task. Resolves once it has acknowledged.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown(reply))?;
        rx.await.map_err(|_| MacroRecorderError::Disconnected)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| MacroRecorderError::Disconnected)
    }
}
