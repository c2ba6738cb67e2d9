#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Race stopwatch and the fixed-width `MM:SS.mmm` time format.
//!
//! Formatted times are zero padded so that comparing two strings orders them
//! the same way as comparing the durations, up to 99 minutes.

use std::time::Duration;

use thiserror::Error;

/// Reasons a stored time string cannot be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimeFormatError {
    /// The string does not have the `MM:SS.mmm` shape.
    #[error("`{input}` is not a time in MM:SS.mmm format")]
    Malformed {
        /// Rejected input.
        input: String,
    },
    /// The seconds field is 60 or larger.
    #[error("seconds field {seconds} must be below 60")]
    SecondsOutOfRange {
        /// Parsed seconds value.
        seconds: u64,
    },
}

/// Formats elapsed time as `MM:SS.mmm`, truncating sub-millisecond precision.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_millis = elapsed.as_millis();
    let minutes = total_millis / 60_000;
    let seconds = (total_millis / 1_000) % 60;
    let millis = total_millis % 1_000;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parses a `MM:SS.mmm` string produced by [`format_elapsed`].
pub fn parse_formatted(input: &str) -> Result<Duration, TimeFormatError> {
    let malformed = || TimeFormatError::Malformed {
        input: input.to_owned(),
    };

    let (minutes, rest) = input.split_once(':').ok_or_else(malformed)?;
    let (seconds, millis) = rest.split_once('.').ok_or_else(malformed)?;
    if minutes.len() < 2 || seconds.len() != 2 || millis.len() != 3 {
        return Err(malformed());
    }

    let field = |digits: &str| -> Result<u64, TimeFormatError> {
        if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(malformed());
        }
        digits.parse().map_err(|_| malformed())
    };
    let minutes = field(minutes)?;
    let seconds = field(seconds)?;
    let millis = field(millis)?;
    if seconds >= 60 {
        return Err(TimeFormatError::SecondsOutOfRange { seconds });
    }

    Ok(Duration::from_millis(
        minutes
            .saturating_mul(60_000)
            .saturating_add(seconds * 1_000)
            .saturating_add(millis),
    ))
}

/// Monotonic stopwatch fed with readings from an external clock.
///
/// Readings are durations since an arbitrary epoch, such as accumulated
/// simulation time, which keeps the timer deterministic under replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RaceTimer {
    origin: Duration,
    elapsed: Duration,
    running: bool,
}

impl RaceTimer {
    /// Captures `now` as the origin and starts running from zero.
    pub fn start(&mut self, now: Duration) {
        self.origin = now;
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    /// Recomputes the elapsed time while running.
    pub fn update(&mut self, now: Duration) {
        if self.running {
            self.elapsed = now.saturating_sub(self.origin);
        }
    }

    /// Freezes the elapsed time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Reports whether the timer is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Elapsed time as of the last update.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time formatted as `MM:SS.mmm`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format_elapsed(self.elapsed)
    }
}
