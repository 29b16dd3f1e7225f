use std::time::Instant;

use chrono::{Datelike, Timelike};

/// Calendar time as reported by the clock collaborator.
///
/// `weekday` is 0-based with 0 = Sunday, matching the schedule grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub weekday: u32,
}

impl CalendarTime {
    /// Timestamp-derived session filename, e.g. `/20260827_14-03-59.wav`.
    pub fn session_filename(&self, extension: &str) -> String {
        format!(
            "/{:04}{:02}{:02}_{:02}-{:02}-{:02}.{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, extension
        )
    }
}

/// Monotonic milliseconds since some fixed origin (e.g. boot).
pub trait MonotonicClock {
    fn monotonic_ms(&self) -> u64;
}

/// Wall-clock calendar time.
pub trait WallClock {
    fn now(&self) -> CalendarTime;
}

/// Host clock: `Instant` for monotonic time, `chrono::Local` for calendar
/// time.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> CalendarTime {
        let now = chrono::Local::now();
        CalendarTime {
            year: now.year(),
            month: now.month(),
            day: now.day(),
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
            weekday: now.weekday().num_days_from_sunday(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_filename_format() {
        let t = CalendarTime {
            year: 2026,
            month: 8,
            day: 27,
            hour: 9,
            minute: 5,
            second: 3,
            weekday: 4,
        };
        assert_eq!(t.session_filename("wav"), "/20260827_09-05-03.wav");
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic_ms();
        let b = clock.monotonic_ms();
        assert!(b >= a);
    }
}
