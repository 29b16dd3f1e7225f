use std::io::{BufRead, BufReader, Read, Write};

use crate::models::error::RecorderError;
use crate::traits::medium::{OpenMode, StorageMedium};

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;

/// A cell of the weekly schedule grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Idle,
    Record,
}

impl ScheduleMode {
    /// Table cells are small integers; 1 means record.
    fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            Self::Record
        } else {
            Self::Idle
        }
    }
}

/// The weekly record/idle grid, hour-of-day by day-of-week.
///
/// Loaded once per wake cycle from a line-oriented table: one header line,
/// then 24 lines of `hour;mode0;mode1;...;mode6` covering days 0–6
/// (Sunday first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    grid: [[ScheduleMode; DAYS_PER_WEEK]; HOURS_PER_DAY],
    exists: bool,
}

impl ScheduleTable {
    /// The "no table" placeholder; every query against it reads Idle.
    pub fn absent() -> Self {
        Self {
            grid: [[ScheduleMode::Idle; DAYS_PER_WEEK]; HOURS_PER_DAY],
            exists: false,
        }
    }

    pub fn from_grid(grid: [[ScheduleMode; DAYS_PER_WEEK]; HOURS_PER_DAY]) -> Self {
        Self { grid, exists: true }
    }

    pub fn parse<R: Read>(source: R) -> Result<Self, RecorderError> {
        let mut lines = BufReader::new(source).lines();

        // Header line carries day names only.
        lines
            .next()
            .transpose()
            .map_err(|e| RecorderError::Schedule(format!("failed to read table header: {e}")))?
            .ok_or_else(|| RecorderError::Schedule("schedule table is empty".into()))?;

        let mut grid = [[ScheduleMode::Idle; DAYS_PER_WEEK]; HOURS_PER_DAY];
        for hour in 0..HOURS_PER_DAY {
            let line = lines
                .next()
                .transpose()
                .map_err(|e| RecorderError::Schedule(format!("failed to read table row: {e}")))?
                .ok_or_else(|| {
                    RecorderError::Schedule(format!("table truncated at hour {hour}"))
                })?;

            let fields: Vec<i64> = line
                .trim()
                .split(';')
                .map(|f| f.trim().parse::<i64>())
                .collect::<Result<_, _>>()
                .map_err(|e| {
                    RecorderError::Schedule(format!("bad value in row for hour {hour}: {e}"))
                })?;

            if fields.len() != DAYS_PER_WEEK + 1 || fields[0] != hour as i64 {
                return Err(RecorderError::Schedule(format!(
                    "malformed row for hour {hour}: {line:?}"
                )));
            }

            for day in 0..DAYS_PER_WEEK {
                grid[hour][day] = ScheduleMode::from_flag(fields[day + 1]);
            }
        }

        Ok(Self { grid, exists: true })
    }

    /// Load the table from the medium.
    pub fn from_medium(medium: &mut dyn StorageMedium, path: &str) -> Result<Self, RecorderError> {
        let file = medium.open(path, OpenMode::Read)?;
        Self::parse(file)
    }

    /// Write the default all-idle table to the medium.
    pub fn write_default(medium: &mut dyn StorageMedium, path: &str) -> Result<(), RecorderError> {
        log::info!("creating default schedule table at {path}");
        let mut file = medium.open(path, OpenMode::Create)?;

        let mut contents =
            String::from("hour;sunday;monday;tuesday;wednesday;thursday;friday;saturday\n");
        for hour in 0..HOURS_PER_DAY {
            contents.push_str(&format!("{hour};0;0;0;0;0;0;0\n"));
        }
        file.write_all(contents.as_bytes())
            .map_err(|e| RecorderError::medium(&format!("failed to write {path}"), e))
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn mode_at(&self, hour: usize, weekday: usize) -> ScheduleMode {
        self.grid[hour][weekday]
    }

    /// True iff every cell of the grid is record mode.
    pub fn all_record(&self) -> bool {
        self.grid
            .iter()
            .all(|row| row.iter().all(|&m| m == ScheduleMode::Record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fs::FsMedium;

    fn table_text(flag: u8) -> String {
        let mut text = String::from("hour;sunday;monday;tuesday;wednesday;thursday;friday;saturday\n");
        for hour in 0..HOURS_PER_DAY {
            text.push_str(&format!(
                "{hour};{f};{f};{f};{f};{f};{f};{f}\n",
                f = flag
            ));
        }
        text
    }

    #[test]
    fn parses_all_idle_table() {
        let table = ScheduleTable::parse(table_text(0).as_bytes()).unwrap();
        assert!(table.exists());
        assert!(!table.all_record());
        assert_eq!(table.mode_at(13, 3), ScheduleMode::Idle);
    }

    #[test]
    fn parses_all_record_table() {
        let table = ScheduleTable::parse(table_text(1).as_bytes()).unwrap();
        assert!(table.all_record());
        assert_eq!(table.mode_at(0, 0), ScheduleMode::Record);
    }

    #[test]
    fn truncated_table_is_schedule_error() {
        let mut text = table_text(0);
        let keep: String = text.lines().take(10).map(|l| format!("{l}\n")).collect();
        text = keep;
        let err = ScheduleTable::parse(text.as_bytes()).unwrap_err();
        assert!(matches!(err, RecorderError::Schedule(_)));
    }

    #[test]
    fn misnumbered_row_is_schedule_error() {
        let mut text = String::from("hour;s;m;t;w;t;f;s\n");
        text.push_str("5;0;0;0;0;0;0;0\n"); // first row must be hour 0
        let err = ScheduleTable::parse(text.as_bytes()).unwrap_err();
        assert!(matches!(err, RecorderError::Schedule(_)));
    }

    #[test]
    fn non_numeric_cell_is_schedule_error() {
        let mut text = String::from("hour;s;m;t;w;t;f;s\n");
        text.push_str("0;0;0;x;0;0;0;0\n");
        let err = ScheduleTable::parse(text.as_bytes()).unwrap_err();
        assert!(matches!(err, RecorderError::Schedule(_)));
    }

    #[test]
    fn default_table_roundtrips_through_medium() {
        let root = std::env::temp_dir().join("field_recorder_table_default");
        std::fs::remove_dir_all(&root).ok();
        let mut medium = FsMedium::new(root.clone());
        medium.mount().unwrap();

        ScheduleTable::write_default(&mut medium, "/Calendar.csv").unwrap();
        assert!(medium.exists("/Calendar.csv"));

        let table = ScheduleTable::from_medium(&mut medium, "/Calendar.csv").unwrap();
        assert!(table.exists());
        assert!(!table.all_record());
        for hour in 0..HOURS_PER_DAY {
            for day in 0..DAYS_PER_WEEK {
                assert_eq!(table.mode_at(hour, day), ScheduleMode::Idle);
            }
        }

        std::fs::remove_dir_all(root).ok();
    }
}
