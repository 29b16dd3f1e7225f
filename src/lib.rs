//! # Field Recorder Core
//!
//! Recording pipeline and schedule engine for an autonomous field audio
//! logger: capture into a fixed staging arena, drain to WAV containers on
//! a slow persistent medium, and decide when to record from a weekly
//! schedule table.
//!
//! ## Architecture
//!
//! ```text
//! field-recorder-core
//! ├── models/       Configuration, state machine, errors, session stats
//! ├── traits/       Collaborator interfaces (source, medium, clocks, sleep)
//! ├── processing/   Sample arena and WAV header layout
//! ├── storage/      Container lifecycle, host filesystem medium, sidecars
//! ├── schedule/     Weekly record/idle table and next-change scan
//! └── session/      Capture/drain recorder and the wake-cycle orchestrator
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use field_recorder_core::{
//!     FsMedium, Orchestrator, RecorderConfiguration, SleepController, SystemClock,
//! };
//! # use field_recorder_core::{RecorderError, SampleSource};
//! # struct Codec;
//! # impl SampleSource for Codec {
//! #     fn read(&mut self, _: &mut [i16], _: u32) -> Result<usize, RecorderError> { Ok(0) }
//! #     fn write(&mut self, _: &[i16], _: u32) -> Result<usize, RecorderError> { Ok(0) }
//! # }
//! struct HostSleep;
//! impl SleepController for HostSleep {
//!     fn request_deep_sleep(&mut self, minutes: u64) {
//!         std::thread::sleep(std::time::Duration::from_secs(minutes * 60));
//!     }
//! }
//!
//! # fn main() -> Result<(), RecorderError> {
//! let mut orchestrator = Orchestrator::new(
//!     RecorderConfiguration::default(),
//!     Codec,
//!     Box::new(FsMedium::new("/media/recorder")),
//!     SystemClock::new(),
//!     SystemClock::new(),
//!     HostSleep,
//! )?;
//! loop {
//!     orchestrator.run_wake_cycle()?;
//! }
//! # }
//! ```

pub mod models;
pub mod processing;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod traits;

pub use models::config::RecorderConfiguration;
pub use models::error::RecorderError;
pub use models::session_stats::SessionStats;
pub use models::state::RecorderState;
pub use schedule::table::{ScheduleMode, ScheduleTable};
pub use session::orchestrator::{CycleOutcome, Orchestrator};
pub use session::recorder::{Recorder, SubSessionReport};
pub use storage::fs::FsMedium;
pub use traits::clock::{CalendarTime, MonotonicClock, SystemClock, WallClock};
pub use traits::medium::{MediumFile, OpenMode, StorageMedium};
pub use traits::sample_source::SampleSource;
pub use traits::sleep::SleepController;
