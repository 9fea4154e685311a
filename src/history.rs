use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::bands::{Band, Bands};
use crate::error::Result;
use crate::scorer::SessionTotals;
use crate::util::{mean, std_dev};

/// One finished (or saved) session as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_date: DateTime<Local>,
    pub end_date: DateTime<Local>,
    /// Configured session length
    pub duration_secs: u64,
    #[serde(default)]
    pub elapsed_secs: f64,
    #[serde(default)]
    pub ticks: u64,
    pub total_score: SessionTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl GameStats {
    pub fn push(&mut self, record: SessionRecord) {
        self.sessions.push(record);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn last(&self) -> Option<&SessionRecord> {
        self.sessions.last()
    }

    /// Highest session total seen for every band
    pub fn best_totals(&self) -> Option<SessionTotals> {
        if self.sessions.is_empty() {
            return None;
        }
        Some(Bands::from_fn(|band| {
            self.sessions
                .iter()
                .map(|s| *s.total_score.get(band))
                .max()
                .unwrap_or_default()
        }))
    }

    fn band_totals(&self, band: Band) -> Vec<f64> {
        self.sessions
            .iter()
            .map(|s| *s.total_score.get(band) as f64)
            .collect()
    }

    /// Mean session total for `band`
    pub fn mean_total(&self, band: Band) -> Option<f64> {
        mean(&self.band_totals(band))
    }

    /// How much the session totals for `band` swing between sessions
    pub fn total_spread(&self, band: Band) -> Option<f64> {
        std_dev(&self.band_totals(band))
    }
}

pub trait HistoryStore {
    fn load(&self) -> GameStats;
    fn save(&self, stats: &GameStats) -> Result<()>;

    /// Load, append `record`, write back
    fn append(&self, record: SessionRecord) -> Result<GameStats> {
        let mut stats = self.load();
        stats.push(record);
        self.save(&stats)?;
        Ok(stats)
    }
}

#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new() -> Self {
        let path = AppDirs::history_path().unwrap_or_else(|| PathBuf::from("game_stats.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `game_stats.json.bak` next to the history file
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }
}

impl Default for FileHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> GameStats {
        let Ok(bytes) = fs::read(&self.path) else {
            return GameStats::default();
        };
        match serde_json::from_slice::<GameStats>(&bytes) {
            Ok(stats) => stats,
            Err(e) => {
                // move it aside so the next save does not overwrite it
                let backup = self.backup_path();
                match fs::rename(&self.path, &backup) {
                    Ok(()) => log::warn!(
                        "unreadable history {} moved to {}: {e}",
                        self.path.display(),
                        backup.display()
                    ),
                    Err(re) => log::warn!(
                        "ignoring unreadable history {} ({e}), backup failed: {re}",
                        self.path.display()
                    ),
                }
                GameStats::default()
            }
        }
    }

    fn save(&self, stats: &GameStats) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(stats)?;
        fs::write(&self.path, data)?;
        log::info!(
            "saved {} sessions to {}",
            stats.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps history in memory; used by tests and `--no-save`
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    stats: std::cell::RefCell<GameStats>,
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> GameStats {
        self.stats.borrow().clone()
    }

    fn save(&self, stats: &GameStats) -> Result<()> {
        *self.stats.borrow_mut() = stats.clone();
        Ok(())
    }
}
