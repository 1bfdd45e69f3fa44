use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::sim::{decode_session, encode_session, SaveError, Session};

use super::persistence::{PersistenceError, SaveStore};
use super::view::{draw_error, draw_session, FrameInfo, Surface};
use super::InputSnapshot;

/// Builds the starting world. The loop runner calls it once at startup and
/// again every time the player dies.
pub trait WorldFactory {
    fn build(&self, seed: u64) -> Session;

    /// Image ids that must load before the first tick.
    fn asset_manifest(&self) -> &[&'static str];
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub save_file_name: String,
    pub death_restart_delay: Duration,
}

enum RuntimeState {
    Playing(Box<Session>),
    /// Startup failed; only the error screen is shown.
    Failed(String),
}

/// Everything between the window loop and the simulation: the live session,
/// pause state, save slots and the restart-after-death timer.
pub struct GameRuntime {
    factory: Box<dyn WorldFactory>,
    store: SaveStore,
    options: RuntimeOptions,
    state: RuntimeState,
    seed: u64,
    paused: bool,
    dead_since: Option<Instant>,
}

impl GameRuntime {
    pub fn start(
        factory: Box<dyn WorldFactory>,
        store: SaveStore,
        options: RuntimeOptions,
        seed: u64,
    ) -> Self {
        let session = factory.build(seed);
        Self {
            factory,
            store,
            options,
            state: RuntimeState::Playing(Box::new(session)),
            seed,
            paused: false,
            dead_since: None,
        }
    }

    pub fn failed(
        factory: Box<dyn WorldFactory>,
        store: SaveStore,
        options: RuntimeOptions,
        message: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            store,
            options,
            state: RuntimeState::Failed(message.into()),
            seed: 0,
            paused: false,
            dead_since: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            RuntimeState::Playing(session) => Some(session.as_ref()),
            RuntimeState::Failed(_) => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.state {
            RuntimeState::Playing(session) => Some(session.as_mut()),
            RuntimeState::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, RuntimeState::Failed(_))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the logic clock should be running.
    pub fn is_running(&self) -> bool {
        !self.paused && !self.is_failed()
    }

    pub fn toggle_pause(&mut self) {
        if self.is_failed() {
            return;
        }
        self.paused = !self.paused;
        info!(paused = self.paused, "pause_toggled");
    }

    /// Runs one logic tick. Returns `false` when paused or failed.
    pub fn tick(&mut self, input: &InputSnapshot) -> bool {
        if self.paused {
            return false;
        }
        match &mut self.state {
            RuntimeState::Playing(session) => {
                session.tick(input.held_command());
                true
            }
            RuntimeState::Failed(_) => false,
        }
    }

    /// Starts the death timer when the player dies and rebuilds the world
    /// once it runs out. Returns `true` on restart.
    pub fn update_death_clock(&mut self, now: Instant) -> bool {
        let dead = self.session().is_some_and(Session::is_dead);
        if !dead {
            self.dead_since = None;
            return false;
        }
        let since = *self.dead_since.get_or_insert(now);
        if now.saturating_duration_since(since) < self.options.death_restart_delay {
            return false;
        }

        self.seed = self.seed.wrapping_add(1);
        self.state = RuntimeState::Playing(Box::new(self.factory.build(self.seed)));
        self.dead_since = None;
        info!(seed = self.seed, "session_restarted_after_death");
        true
    }

    /// Writes the session to the save file. Only honored while paused;
    /// returns `Ok(false)` otherwise.
    pub fn save(&mut self) -> Result<bool, RuntimeError> {
        if !self.paused {
            return Ok(false);
        }
        let Some(session) = self.session() else {
            return Ok(false);
        };
        let payload = encode_session(session)?;
        self.store.save(&self.options.save_file_name, &payload)?;
        Ok(true)
    }

    /// Replaces the session with the newest save. Only honored while paused;
    /// on any error the running session is left as it was.
    pub fn load(&mut self) -> Result<bool, RuntimeError> {
        if !self.paused || self.is_failed() {
            return Ok(false);
        }
        let payload = self.store.load()?;
        let session = decode_session(&payload, self.seed)?;
        info!(
            map = session.world().current_key(),
            "session_loaded"
        );
        self.state = RuntimeState::Playing(Box::new(session));
        self.dead_since = None;
        Ok(true)
    }

    pub fn draw(&self, surface: &mut dyn Surface, fps_label: &str) {
        match &self.state {
            RuntimeState::Playing(session) => draw_session(
                surface,
                session,
                FrameInfo {
                    paused: self.paused,
                    fps_label,
                },
            ),
            RuntimeState::Failed(message) => draw_error(surface, message),
        }
    }
}

/// Logs the outcome of a save or load request from the keyboard.
pub(crate) fn log_persistence_outcome(operation: &'static str, outcome: Result<bool, RuntimeError>) {
    match outcome {
        Ok(true) => {}
        Ok(false) => info!(operation, "persistence_ignored_while_running"),
        Err(error) => warn!(operation, error = %error, "persistence_failed"),
    }
}
