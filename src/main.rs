use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use neurofeed::{
    app::{App, Command, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{FileHistoryStore, HistoryStore, MemoryHistoryStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    source::{BandSource, FixedSource, ReplaySource, SimulatedSource},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// terminal neurofeedback game
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Scores live EEG band powers as relative wave percentages over a timed session and keeps a history of session totals."
)]
pub struct Cli {
    /// session length in seconds
    #[clap(short = 's', long)]
    session_secs: Option<u64>,

    /// where band samples come from
    #[clap(long, value_enum, default_value_t = SourceKind::Simulated)]
    source: SourceKind,

    /// json-lines file of recorded band samples (implies --source replay)
    #[clap(long)]
    replay: Option<PathBuf>,

    /// electrode channels for the simulated source
    #[clap(short = 'c', long)]
    channels: Option<usize>,

    /// seed for the simulated source
    #[clap(long)]
    seed: Option<u64>,

    /// config file (defaults to the platform config dir)
    #[clap(long)]
    config: Option<PathBuf>,

    /// session history file (defaults to the state dir)
    #[clap(long)]
    history: Option<PathBuf>,

    /// keep session history in memory only
    #[clap(long)]
    no_save: bool,

    /// log level: error, warn, info, debug, trace
    #[clap(long, default_value = "warn")]
    log_level: String,

    /// log file (defaults to the state dir)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Fixed,
    Simulated,
    Replay,
}

impl Cli {
    /// Overlay command line flags on the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(secs) = self.session_secs {
            config.session_secs = secs;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        config
    }

    fn source_kind(&self) -> SourceKind {
        if self.replay.is_some() {
            SourceKind::Replay
        } else {
            self.source
        }
    }

    fn build_source(&self, config: &Config) -> Result<Box<dyn BandSource>, Box<dyn Error>> {
        let source: Box<dyn BandSource> = match self.source_kind() {
            SourceKind::Fixed => Box::new(FixedSource::dev()),
            SourceKind::Simulated => match self.seed {
                Some(seed) => Box::new(SimulatedSource::seeded(
                    seed,
                    config.channels,
                    config.smoothing_window,
                )),
                None => Box::new(SimulatedSource::new(
                    config.channels,
                    config.smoothing_window,
                )),
            },
            SourceKind::Replay => {
                let Some(path) = self.replay.as_ref() else {
                    return Err("--source replay needs --replay <FILE>".into());
                };
                Box::new(ReplaySource::from_path(path)?)
            }
        };
        Ok(source)
    }

    fn history_store(&self) -> Box<dyn HistoryStore> {
        if self.no_save {
            return Box::new(MemoryHistoryStore::default());
        }
        match &self.history {
            Some(path) => Box::new(FileHistoryStore::with_path(path)),
            None => Box::new(FileHistoryStore::new()),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

const FALLBACK_LOG_FILE: &str = "neurofeed.log";

/// Open `path` for logging, falling back to `fallback` when its directory
/// cannot be created. Problems are reported on stderr before the terminal
/// switches to raw mode.
fn open_log_file(path: PathBuf, fallback: &Path) -> Option<(PathBuf, File)> {
    let mut path = path;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!(
                "cannot create log directory {}: {e}; logging to {}",
                parent.display(),
                fallback.display()
            );
            path = fallback.to_path_buf();
        }
    }

    match File::create(&path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging disabled", path.display());
            None
        }
    }
}

fn init_logging(cli: &Cli) {
    let path = cli
        .log_file
        .clone()
        .or_else(AppDirs::log_path)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_LOG_FILE));

    let mut builder = env_logger::Builder::new();
    builder.filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn));
    // the terminal belongs to the ui, so logs only ever go to a file
    match open_log_file(path, Path::new(FALLBACK_LOG_FILE)) {
        Some((_, file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli);

    let config_store = cli.config_store();
    let config = cli.apply_to(config_store.load());
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
    }

    let mut source = match cli.build_source(&config) {
        Ok(source) => source,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    let mut app = App::new(config.clone(), cli.history_store(), Instant::now());
    app.source_name = source.name().to_string();
    log::info!(
        "starting with {}s sessions from the {} source",
        config.session_secs,
        app.source_name
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(config.tick_rate_ms)),
    );
    let result = run_game(&mut terminal, &mut app, source.as_mut(), &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.config.session_secs != config.session_secs {
        if let Err(e) = config_store.save(&app.config) {
            log::warn!("could not save config: {e}");
        }
    }

    result
}

fn run_game<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    source: &mut dyn BandSource,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                let sample = source.pull();
                app.on_tick(sample, Instant::now());
            }
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if let Some(command) = Command::from_key(key) {
                    match app.apply(command, Instant::now()) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => {
                            log::warn!("{command:?} failed: {e}");
                            if command == Command::Quit {
                                break;
                            }
                        }
                    }
                }
            }
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
