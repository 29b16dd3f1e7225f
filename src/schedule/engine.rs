use super::table::{ScheduleMode, ScheduleTable, DAYS_PER_WEEK, HOURS_PER_DAY};

/// Returned when a full week's scan finds no mode change outside the
/// all-record case. Reached only by degenerate tables; the value is a
/// documented default rather than a derived one.
pub const DEGENERATE_FALLBACK_MINUTES: u64 = 60;

/// Mode for the current hour, or Idle when there is no table.
pub fn current_mode(table: &ScheduleTable, hour: u32, weekday: u32) -> ScheduleMode {
    if !table.exists() || hour as usize >= HOURS_PER_DAY || weekday as usize >= DAYS_PER_WEEK {
        return ScheduleMode::Idle;
    }
    table.mode_at(hour as usize, weekday as usize)
}

/// Minutes until the schedule leaves `mode`, scanning forward hour by hour
/// and wrapping the day of week at hour 24.
///
/// The scan starts at the hour after the current one; the first candidate
/// costs the remaining minutes of the current hour, each further unchanged
/// hour adds 60. Returns 0 when the table is absent, when the current cell
/// no longer matches `mode` (change is immediate), or when `mode` is
/// Record and the whole grid is record mode (continuous recording, no
/// scheduled end). A full-week scan with no change on any other table
/// falls back to [`DEGENERATE_FALLBACK_MINUTES`].
pub fn minutes_until_next_change(
    table: &ScheduleTable,
    hour: u32,
    weekday: u32,
    mode: ScheduleMode,
    minutes_into_hour: u32,
) -> u64 {
    if !table.exists() || current_mode(table, hour, weekday) != mode {
        return 0;
    }

    let mut hour = hour as usize;
    let mut day = weekday as usize;
    let mut elapsed = 60 - minutes_into_hour.min(60) as u64;

    advance(&mut hour, &mut day);
    for _ in 1..HOURS_PER_DAY * DAYS_PER_WEEK {
        if table.mode_at(hour, day) != mode {
            return elapsed;
        }
        advance(&mut hour, &mut day);
        elapsed += 60;
    }

    if mode == ScheduleMode::Record && table.all_record() {
        return 0;
    }

    log::warn!(
        "no schedule change within a full week; defaulting to {DEGENERATE_FALLBACK_MINUTES} minutes"
    );
    DEGENERATE_FALLBACK_MINUTES
}

fn advance(hour: &mut usize, day: &mut usize) {
    *hour += 1;
    if *hour == HOURS_PER_DAY {
        *hour = 0;
        *day = (*day + 1) % DAYS_PER_WEEK;
    }
}
