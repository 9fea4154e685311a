use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::bands::BandSample;
use crate::config::{Config, MAX_SESSION_SECS};
use crate::error::Result;
use crate::history::{GameStats, HistoryStore};
use crate::session::{Analysis, Session};

/// Where the game is, as shown in the corner of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GameState {
    /// Nothing has run yet
    Starting,
    Paused,
    Running,
    Finished,
}

/// User intent, decoupled from the terminal key that triggered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a fresh session, or abandon the running one
    Toggle,
    Lengthen,
    Shorten,
    Save,
    Quit,
}

impl Command {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Quit)
            }
            KeyCode::Char('r') => Some(Command::Toggle),
            KeyCode::Char('s') => Some(Command::Save),
            KeyCode::Up => Some(Command::Lengthen),
            KeyCode::Down => Some(Command::Shorten),
            KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the running session and everything the loop needs between frames
pub struct App {
    pub config: Config,
    pub state: GameState,
    pub session: Session,
    pub last_sample: BandSample,
    pub stats: GameStats,
    pub source_name: String,
    history: Box<dyn HistoryStore>,
}

impl App {
    pub fn new(config: Config, history: Box<dyn HistoryStore>, now: Instant) -> Self {
        let stats = history.load();
        Self {
            session: Session::new_at(config.session_secs, now),
            config,
            state: GameState::Starting,
            last_sample: BandSample::default(),
            stats,
            source_name: String::from("fixed"),
            history,
        }
    }

    pub fn session_secs(&self) -> u64 {
        self.config.session_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }

    pub fn apply(&mut self, command: Command, now: Instant) -> Result<Flow> {
        match command {
            Command::Toggle => self.toggle(now),
            Command::Lengthen => self.lengthen(now),
            Command::Shorten => self.shorten(now),
            Command::Save => self.save(now)?,
            Command::Quit => {
                self.save(now)?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Every toggle rebuilds the session; a stopped run cannot be resumed
    pub fn toggle(&mut self, now: Instant) {
        let secs = self.session_secs();
        match self.state {
            GameState::Starting | GameState::Paused | GameState::Finished => {
                self.session.reset(secs, now);
                self.session.start(now);
                self.state = GameState::Running;
                log::info!("session started for {secs}s");
            }
            GameState::Running => {
                self.session.reset(secs, now);
                self.state = GameState::Paused;
                log::info!("session abandoned");
            }
        }
    }

    pub fn lengthen(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        let secs = self
            .session_secs()
            .saturating_add(self.config.length_step_secs)
            .min(MAX_SESSION_SECS);
        self.set_length(secs, now);
    }

    /// Never goes below a single step
    pub fn shorten(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        let step = self.config.length_step_secs;
        let secs = self.session_secs().saturating_sub(step).max(step);
        self.set_length(secs, now);
    }

    fn set_length(&mut self, secs: u64, now: Instant) {
        self.config.session_secs = secs;
        self.session.reset(secs, now);
        log::debug!("session length set to {secs}s");
    }

    /// Feed one sample; finishes and records the session when time runs out
    pub fn on_tick(&mut self, sample: BandSample, now: Instant) -> Analysis {
        let analysis = self.session.analyze(&sample, now);
        self.last_sample = sample;

        if analysis == Analysis::Expired && self.state == GameState::Running {
            self.state = GameState::Finished;
            if let Err(e) = self.record(now) {
                log::warn!("could not save finished session: {e}");
            }
        }
        analysis
    }

    /// Stop scoring and append the current totals to the history.
    ///
    /// A finished session was already recorded on expiry and is not appended
    /// again.
    pub fn save(&mut self, now: Instant) -> Result<()> {
        if self.state == GameState::Finished {
            log::debug!("finished session already saved");
            return Ok(());
        }
        self.session.stop();
        if self.state == GameState::Running {
            self.state = GameState::Paused;
        }
        self.record(now)
    }

    fn record(&mut self, now: Instant) -> Result<()> {
        let record = self.session.record(now);
        self.stats = self.history.append(record)?;
        Ok(())
    }

    /// Mean alpha of the latest sample, scaled for the focus ring
    pub fn alpha_average(&self) -> f64 {
        self.last_sample.alpha_average()
    }

    pub fn alpha_cue(&self) -> bool {
        self.alpha_average() >= self.config.alpha_cue_threshold
    }

    /// Label for the single action key, following the game state
    pub fn action_label(&self) -> &'static str {
        match self.state {
            GameState::Running => "(r) stop",
            GameState::Starting | GameState::Paused | GameState::Finished => "(r) start",
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("sessions_saved", &self.stats.len())
            .finish()
    }
}
