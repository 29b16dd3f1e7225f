use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::session_stats::SessionStats;
use crate::schedule::engine;
use crate::schedule::table::{ScheduleMode, ScheduleTable};
use crate::session::recorder::Recorder;
use crate::storage::stats;
use crate::traits::clock::{MonotonicClock, WallClock};
use crate::traits::medium::StorageMedium;
use crate::traits::sample_source::SampleSource;
use crate::traits::sleep::SleepController;

/// What a wake cycle did before handing control back (or requesting
/// deep sleep).
#[derive(Debug)]
pub enum CycleOutcome {
    /// The schedule said idle; slept until the next mode change.
    SleptIdle { minutes: u64 },
    /// Recorded one bounded session, then slept to re-evaluate the
    /// schedule on the next wake.
    RecordedThenSlept {
        stats: SessionStats,
        slept_minutes: u64,
    },
    /// Continuous mode ran chained sub-sessions until the stop flag.
    ContinuousStopped { sessions: Vec<SessionStats> },
}

/// Drives one wake-to-sleep cycle of the recorder: load the schedule,
/// decide between idle, bounded recording and continuous recording, run
/// the session(s), and request deep sleep.
///
/// Owns the medium between sessions and lends it to the recorder's drain
/// worker for the duration of each one.
pub struct Orchestrator<S, W, M, P>
where
    S: SampleSource,
    W: WallClock,
    M: MonotonicClock,
    P: SleepController,
{
    recorder: Recorder,
    source: S,
    medium: Option<Box<dyn StorageMedium>>,
    wall: W,
    monotonic: M,
    sleeper: P,
    stop: Arc<AtomicBool>,
}

impl<S, W, M, P> Orchestrator<S, W, M, P>
where
    S: SampleSource,
    W: WallClock,
    M: MonotonicClock,
    P: SleepController,
{
    pub fn new(
        config: RecorderConfiguration,
        source: S,
        medium: Box<dyn StorageMedium>,
        wall: W,
        monotonic: M,
        sleeper: P,
    ) -> Result<Self, RecorderError> {
        Ok(Self {
            recorder: Recorder::new(config)?,
            source,
            medium: Some(medium),
            wall,
            monotonic,
            sleeper,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag that ends continuous recording at the next cycle
    /// boundary. Bounded sessions honor it too.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run one wake cycle to completion.
    pub fn run_wake_cycle(&mut self) -> Result<CycleOutcome, RecorderError> {
        let mut medium = self.take_medium()?;
        let evaluated = Self::evaluate_schedule(
            &mut *medium,
            &self.recorder.config().schedule_path,
            &self.wall,
        );
        self.medium = Some(medium);
        let (mode, change_minutes) = evaluated?;

        match (mode, change_minutes) {
            (ScheduleMode::Idle, minutes) => {
                log::info!("schedule is idle; sleeping {minutes} minutes");
                self.sleep(minutes);
                Ok(CycleOutcome::SleptIdle { minutes })
            }
            (ScheduleMode::Record, 0) => self.run_continuous(),
            (ScheduleMode::Record, minutes) => {
                let path = self.wall.now().session_filename("wav");
                let stats = self.run_one(&path, minutes)?;
                let slept_minutes = self.recorder.config().post_session_sleep_minutes;
                log::info!("scheduled session done; sleeping {slept_minutes} minutes");
                self.sleep(slept_minutes);
                Ok(CycleOutcome::RecordedThenSlept {
                    stats,
                    slept_minutes,
                })
            }
        }
    }

    /// Continuous mode: chained fixed-length sub-sessions, each in its own
    /// container with a fresh timestamp-derived name, until the stop flag.
    /// A session failure halts the cycle rather than looping on a broken
    /// medium.
    fn run_continuous(&mut self) -> Result<CycleOutcome, RecorderError> {
        let sub_minutes = self.recorder.config().sub_session_minutes;
        log::info!("schedule has no end; recording continuously in {sub_minutes}-minute sessions");

        let mut sessions = Vec::new();
        while !self.stop.load(Ordering::SeqCst) {
            let path = self.wall.now().session_filename("wav");
            let stats = self.run_one(&path, sub_minutes).map_err(|e| {
                RecorderError::Halted(format!("continuous recording failed: {e}"))
            })?;
            sessions.push(stats);
        }
        log::info!("continuous recording stopped after {} sessions", sessions.len());
        Ok(CycleOutcome::ContinuousStopped { sessions })
    }

    fn run_one(&mut self, path: &str, minutes: u64) -> Result<SessionStats, RecorderError> {
        log::info!("recording {minutes} minutes to {path}");
        let medium = self.take_medium()?;

        let (mut medium, report) = self.recorder.run_sub_session(
            &mut self.source,
            medium,
            &self.monotonic,
            self.stop.as_ref(),
            path,
            minutes,
        )?;

        // The recording itself is already safe on the medium; checksum and
        // sidecar failures only cost the audit trail.
        let checksum = match stats::checksum(&mut *medium, path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                log::warn!("checksum of {path} failed: {e}");
                None
            }
        };
        let stats = SessionStats::new(
            path,
            minutes,
            report.elapsed_ms,
            report.payload_bytes,
            report.epochs_drained,
            checksum,
        );
        if let Err(e) = stats::write_sidecar(&mut *medium, path, &stats) {
            log::warn!("stats sidecar for {path} failed: {e}");
        }
        self.medium = Some(medium);

        log::info!(
            "session complete: requested {} min, actual {:.2} min, {} payload bytes over {} epochs",
            minutes,
            stats.actual_minutes(),
            report.payload_bytes,
            report.epochs_drained,
        );
        Ok(stats)
    }

    /// Mount the medium, load (or create) the schedule table, and compute
    /// the current mode plus minutes until it changes.
    fn evaluate_schedule(
        medium: &mut dyn StorageMedium,
        schedule_path: &str,
        wall: &W,
    ) -> Result<(ScheduleMode, u64), RecorderError> {
        medium.mount()?;
        let table = Self::load_schedule(medium, schedule_path)?;

        let now = wall.now();
        let mode = engine::current_mode(&table, now.hour, now.weekday);
        let change_minutes =
            engine::minutes_until_next_change(&table, now.hour, now.weekday, mode, now.minute);
        log::info!(
            "schedule at day {} hour {:02}:{:02}: {mode:?}, next change in {change_minutes} min",
            now.weekday,
            now.hour,
            now.minute
        );
        Ok((mode, change_minutes))
    }

    fn load_schedule(
        medium: &mut dyn StorageMedium,
        path: &str,
    ) -> Result<ScheduleTable, RecorderError> {
        if !medium.exists(path) {
            log::info!("no schedule table at {path}");
            ScheduleTable::write_default(medium, path)?;
        }
        match ScheduleTable::from_medium(medium, path) {
            Ok(table) => Ok(table),
            Err(RecorderError::Schedule(reason)) => {
                // One recreate attempt; if the fresh default will not parse
                // either, the medium itself is suspect.
                log::warn!("schedule table unreadable ({reason}); recreating default");
                ScheduleTable::write_default(medium, path)?;
                ScheduleTable::from_medium(medium, path)
            }
            Err(e) => Err(e),
        }
    }

    fn take_medium(&mut self) -> Result<Box<dyn StorageMedium>, RecorderError> {
        self.medium
            .take()
            .ok_or_else(|| RecorderError::Halted("storage medium lost by an earlier failure".into()))
    }

    fn sleep(&mut self, minutes: u64) {
        if let Some(medium) = self.medium.as_mut() {
            medium.unmount();
        }
        self.sleeper.request_deep_sleep(minutes);
    }
}
