use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::bands::BandSample;
use crate::history::SessionRecord;
use crate::scorer::{SessionTotals, WaveScorer, WaveScores};
use crate::timer::{SessionTimer, TickOutcome};

/// What a single `analyze` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    /// Session not running; nothing was touched
    Skipped,
    Scored(WaveScores),
    /// The timer ran out on this tick; the sample was not scored
    Expired,
}

/// One timed scoring run: a countdown gating a wave scorer.
///
/// There is no partial reset. `reset` swaps in a freshly built session so
/// totals, scores and timing never leak from one run into the next.
#[derive(Debug, Clone)]
pub struct Session {
    pub timer: SessionTimer,
    pub scorer: WaveScorer,
    started_at: DateTime<Local>,
    first_started: Option<Instant>,
}

impl Session {
    pub fn new(total_secs: u64) -> Self {
        Self::new_at(total_secs, Instant::now())
    }

    pub fn new_at(total_secs: u64, now: Instant) -> Self {
        Self {
            timer: SessionTimer::new_at(total_secs, now),
            scorer: WaveScorer::new(),
            started_at: Local::now(),
            first_started: None,
        }
    }

    pub fn reset(&mut self, total_secs: u64, now: Instant) {
        log::debug!("session reset to {total_secs}s");
        *self = Self::new_at(total_secs, now);
    }

    pub fn start(&mut self, now: Instant) {
        if self.first_started.is_none() {
            self.first_started = Some(now);
        }
        self.timer.start();
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    /// Advance the countdown without scoring
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.timer.tick(now);
        if outcome == TickOutcome::Expired {
            log::info!("session time expired");
        }
        outcome
    }

    /// Score `sample` if the session is live at `now`
    pub fn analyze(&mut self, sample: &BandSample, now: Instant) -> Analysis {
        match self.tick(now) {
            TickOutcome::Idle => Analysis::Skipped,
            TickOutcome::Expired => Analysis::Expired,
            TickOutcome::Running => Analysis::Scored(self.scorer.analyze(sample)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn scores(&self) -> &WaveScores {
        self.scorer.scores()
    }

    pub fn totals(&self) -> &SessionTotals {
        self.scorer.totals()
    }

    pub fn time_left(&self) -> String {
        self.timer.time_left()
    }

    pub fn seconds_left(&self) -> u64 {
        self.timer.seconds_left()
    }

    pub fn total_secs(&self) -> u64 {
        self.timer.total_secs()
    }

    /// Time spent since the first `start`, capped at the configured length
    pub fn elapsed(&self, now: Instant) -> Duration {
        let limit = Duration::from_secs(self.total_secs());
        match self.first_started {
            Some(started) => now.saturating_duration_since(started).min(limit),
            None => Duration::ZERO,
        }
    }

    /// Read-only snapshot for the history store
    pub fn record(&self, now: Instant) -> SessionRecord {
        SessionRecord {
            start_date: self.started_at,
            end_date: Local::now(),
            duration_secs: self.total_secs(),
            elapsed_secs: self.elapsed(now).as_secs_f64(),
            ticks: self.scorer.ticks(),
            total_score: *self.totals(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerState;
    use assert_matches::assert_matches;

    fn dev_sample() -> BandSample {
        BandSample {
            deltas: vec![1.0],
            thetas: vec![2.0],
            alphas: vec![0.5, 0.5],
            betas: vec![4.0],
            concentrations: vec![5.0],
            anxieties: vec![6.0],
        }
    }

    #[test]
    fn test_analyze_while_idle_is_noop() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);

        let result = session.analyze(&dev_sample(), now + Duration::from_secs(1));

        assert_matches!(result, Analysis::Skipped);
        assert_eq!(session.totals(), &SessionTotals::default());
        assert_eq!(session.scores(), &WaveScores::default());
        assert_eq!(session.seconds_left(), 30);
    }

    #[test]
    fn test_analyze_while_stopped_is_noop() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);
        session.start(now);
        session.analyze(&dev_sample(), now + Duration::from_secs(1));
        session.stop();

        let totals = *session.totals();
        let scores = *session.scores();
        let result = session.analyze(&dev_sample(), now + Duration::from_secs(2));

        assert_matches!(result, Analysis::Skipped);
        assert_eq!(session.totals(), &totals);
        assert_eq!(session.scores(), &scores);
    }

    #[test]
    fn test_analyze_running_scores_dev_sample() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);
        session.start(now);

        let result = session.analyze(&dev_sample(), now + Duration::from_millis(100));

        assert_matches!(result, Analysis::Scored(scores) if scores.beta == 50);
        assert_eq!(session.totals().delta, 12);
        assert_eq!(session.totals().theta, 25);
        assert_eq!(session.totals().alpha, 12);
        assert_eq!(session.totals().beta, 50);
        assert_eq!(session.seconds_left(), 29);
    }

    #[test]
    fn test_analyze_accumulates_over_ticks() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);
        session.start(now);

        for i in 1..=5 {
            session.analyze(&dev_sample(), now + Duration::from_millis(100 * i));
        }

        assert_eq!(session.totals().delta, 60);
        assert_eq!(session.totals().beta, 250);
        assert_eq!(session.totals().anxiety, 3000);
        assert_eq!(session.scorer.ticks(), 5);
    }

    #[test]
    fn test_analyze_after_deadline_expires_without_scoring() {
        let now = Instant::now();
        let mut session = Session::new_at(10, now);
        session.start(now);
        session.analyze(&dev_sample(), now + Duration::from_secs(1));
        let totals = *session.totals();

        let result = session.analyze(&dev_sample(), now + Duration::from_secs(11));

        assert_matches!(result, Analysis::Expired);
        assert!(!session.is_running());
        assert_eq!(session.timer.state(), TimerState::Stopped);
        assert_eq!(session.seconds_left(), 0);
        assert_eq!(session.totals(), &totals);

        // further calls stay inert
        assert_matches!(
            session.analyze(&dev_sample(), now + Duration::from_secs(12)),
            Analysis::Skipped
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);
        session.start(now);
        session.analyze(&dev_sample(), now + Duration::from_secs(3));

        session.reset(60, now + Duration::from_secs(3));

        assert_eq!(session.totals(), &SessionTotals::default());
        assert_eq!(session.scores(), &WaveScores::default());
        assert_eq!(session.seconds_left(), 60);
        assert!(!session.is_running());
        assert_eq!(session.scorer.ticks(), 0);
        assert_eq!(session.elapsed(now + Duration::from_secs(10)), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_is_capped_at_length() {
        let now = Instant::now();
        let mut session = Session::new_at(10, now);
        assert_eq!(session.elapsed(now + Duration::from_secs(5)), Duration::ZERO);

        session.start(now + Duration::from_secs(1));
        assert_eq!(
            session.elapsed(now + Duration::from_secs(4)),
            Duration::from_secs(3)
        );
        assert_eq!(
            session.elapsed(now + Duration::from_secs(60)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_record_snapshots_totals() {
        let now = Instant::now();
        let mut session = Session::new_at(30, now);
        session.start(now);
        session.analyze(&dev_sample(), now + Duration::from_secs(1));
        session.analyze(&dev_sample(), now + Duration::from_secs(2));

        let record = session.record(now + Duration::from_secs(2));

        assert_eq!(record.duration_secs, 30);
        assert_eq!(record.elapsed_secs, 2.0);
        assert_eq!(record.ticks, 2);
        assert_eq!(record.total_score.theta, 50);
        assert_eq!(record.total_score.concentration, 1000);
        assert!(record.end_date >= record.start_date);
    }
}
