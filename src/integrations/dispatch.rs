use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use super::playback::{PlayerBackend, PlayerStateUpdate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendCommand {
    Next,
    Previous,
    Pause,
    TogglePause,
    Stop,
    Play,
    SetPlayerState(PlayerStateUpdate),
}

impl BackendCommand {
    fn apply(self, backend: &mut dyn PlayerBackend) -> Result<()> {
        match self {
            Self::Next => backend.play_next(),
            Self::Previous => backend.play_previous(),
            Self::Pause => backend.pause(),
            Self::TogglePause => backend.toggle_pause(),
            Self::Stop => backend.stop(),
            Self::Play => backend.play(),
            Self::SetPlayerState(update) => backend.set_player_state(update),
        }
    }
}

/// Queues commands for a worker thread that owns the real backend.
pub struct CommandDispatcher {
    sender: Option<Sender<BackendCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl CommandDispatcher {
    pub fn spawn(mut backend: Box<dyn PlayerBackend>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<BackendCommand>();

        let worker = thread::Builder::new()
            .name("beefweb-commands".to_string())
            .spawn(move || {
                for command in receiver {
                    debug!(command = ?command, "sending backend command");
                    if let Err(err) = command.apply(backend.as_mut()) {
                        warn!(command = ?command, error = ?err, "backend command failed");
                    }
                }
                debug!("command worker stopped");
            })
            .context("failed to spawn command worker thread")?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    fn enqueue(&self, command: BackendCommand) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or_else(|| anyhow!("command dispatcher is shut down"))?
            .send(command)
            .map_err(|_| anyhow!("command worker exited; dropping {command:?}"))
    }

    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for CommandDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PlayerBackend for CommandDispatcher {
    fn play_next(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::Next)
    }

    fn play_previous(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::Previous)
    }

    fn pause(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::Pause)
    }

    fn toggle_pause(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::TogglePause)
    }

    fn stop(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::Stop)
    }

    fn play(&mut self) -> Result<()> {
        self.enqueue(BackendCommand::Play)
    }

    fn set_player_state(&mut self, update: PlayerStateUpdate) -> Result<()> {
        self.enqueue(BackendCommand::SetPlayerState(update))
    }
}
