use std::time::{Duration, Instant};

/// Deadline used when `total_secs` does not fit after `now`
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Lifecycle of a session countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Stopped,
}

/// Result of advancing the timer by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing changed
    Idle,
    Running,
    /// The deadline passed on this tick and the timer stopped at zero
    Expired,
}

/// Countdown toward a fixed deadline.
///
/// The deadline is set when the timer is built and never moves: `start`
/// after a `stop` keeps counting toward the same `end_time`.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    state: TimerState,
    end_time: Instant,
    total_secs: u64,
    seconds_left: u64,
}

impl SessionTimer {
    pub fn new(total_secs: u64) -> Self {
        Self::new_at(total_secs, Instant::now())
    }

    pub fn new_at(total_secs: u64, now: Instant) -> Self {
        let end_time = now
            .checked_add(Duration::from_secs(total_secs))
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self {
            state: TimerState::Idle,
            end_time,
            total_secs,
            seconds_left: total_secs,
        }
    }

    pub fn start(&mut self) {
        if self.state != TimerState::Running {
            log::debug!("timer started with {}s left", self.seconds_left);
        }
        self.state = TimerState::Running;
    }

    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
            log::debug!("timer stopped with {}s left", self.seconds_left);
        }
    }

    /// Discard everything and count down from `total_secs` again
    pub fn reset(&mut self, total_secs: u64, now: Instant) {
        *self = Self::new_at(total_secs, now);
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Idle;
        }

        if now >= self.end_time {
            self.state = TimerState::Stopped;
            self.seconds_left = 0;
            return TickOutcome::Expired;
        }

        self.seconds_left = self.end_time.duration_since(now).as_secs();
        TickOutcome::Running
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    /// Remaining time as `M:SS`, derived from the current `seconds_left`
    pub fn time_left(&self) -> String {
        format_time_left(self.seconds_left)
    }
}

/// Render whole seconds as `M:SS`.
///
/// Seconds are padded only while the remainder is below 9, so a remainder of
/// exactly 9 prints as `M:9`. Saved sessions and screenshots depend on this
/// exact output.
pub fn format_time_left(seconds_left: u64) -> String {
    let minutes = seconds_left / 60;
    let seconds = seconds_left % 60;

    if seconds < 9 {
        format!("{minutes}:0{seconds}")
    } else {
        format!("{minutes}:{seconds}")
    }
}
