//! Deterministic fakes for session tests: a scripted clock, a sample
//! source that advances it, an in-memory medium, and a sleep spy.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::traits::clock::{CalendarTime, MonotonicClock, WallClock};
use crate::traits::medium::{MediumFile, OpenMode, StorageMedium};
use crate::traits::sample_source::SampleSource;
use crate::traits::sleep::SleepController;

/// Monotonic clock backed by a shared counter; only the scripted source
/// advances it, so sessions run in compressed time.
#[derive(Clone)]
pub struct FakeClock {
    ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.ms)
    }
}

impl MonotonicClock for FakeClock {
    fn monotonic_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

/// Wall clock derived from the same counter: base calendar time plus the
/// elapsed fake milliseconds, wrapping within the day.
pub struct FakeWall {
    base: CalendarTime,
    ms: Arc<AtomicU64>,
}

impl FakeWall {
    pub fn new(base: CalendarTime, ms: Arc<AtomicU64>) -> Self {
        Self { base, ms }
    }
}

impl WallClock for FakeWall {
    fn now(&self) -> CalendarTime {
        let elapsed_secs = self.ms.load(Ordering::SeqCst) / 1000;
        let total = (self.base.hour as u64 * 3600
            + self.base.minute as u64 * 60
            + self.base.second as u64
            + elapsed_secs)
            % 86_400;
        CalendarTime {
            hour: (total / 3600) as u32,
            minute: ((total % 3600) / 60) as u32,
            second: (total % 60) as u32,
            ..self.base
        }
    }
}

/// Sample source that fills its buffer with a counting signal and charges
/// `tick_ms` of fake time per read. A small real delay per cycle keeps the
/// drain worker comfortably ahead; overrun tests remove it.
pub struct ScriptedSource {
    clock: Arc<AtomicU64>,
    tick_ms: u64,
    real_delay: Duration,
    counter: i16,
    reads: u64,
    silent: bool,
    stop_after: Option<(Arc<AtomicBool>, u64)>,
}

impl ScriptedSource {
    pub fn new(clock: Arc<AtomicU64>, tick_ms: u64) -> Self {
        Self {
            clock,
            tick_ms,
            real_delay: Duration::from_millis(1),
            counter: 0,
            reads: 0,
            silent: false,
            stop_after: None,
        }
    }

    /// No real delay per cycle; capture runs as fast as it can.
    pub fn unthrottled(mut self) -> Self {
        self.real_delay = Duration::ZERO;
        self
    }

    /// Return no samples (the clock still advances).
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Raise `flag` once `reads` reads have happened.
    pub fn stop_after(mut self, flag: Arc<AtomicBool>, reads: u64) -> Self {
        self.stop_after = Some((flag, reads));
        self
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self, buf: &mut [i16], _timeout_ms: u32) -> Result<usize, RecorderError> {
        if !self.real_delay.is_zero() {
            std::thread::sleep(self.real_delay);
        }
        self.clock.fetch_add(self.tick_ms, Ordering::SeqCst);
        self.reads += 1;
        if let Some((flag, after)) = &self.stop_after {
            if self.reads >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if self.silent {
            return Ok(0);
        }
        for frame in buf.chunks_mut(2) {
            frame[0] = self.counter;
            if frame.len() > 1 {
                frame[1] = 0;
            }
            self.counter = self.counter.wrapping_add(1);
        }
        Ok(buf.len())
    }

    fn write(&mut self, buf: &[i16], _timeout_ms: u32) -> Result<usize, RecorderError> {
        Ok(buf.len())
    }
}

type Store = Arc<Mutex<HashMap<String, Arc<Mutex<Vec<u8>>>>>>;

/// In-memory medium. Clones share the same file store, so a test can keep
/// a handle while the orchestrator owns the boxed copy.
#[derive(Clone)]
pub struct MemMedium {
    files: Store,
    mounted: bool,
    write_delay: Duration,
    fail_all_opens: bool,
    fail_write_opens: bool,
    write_counter: Arc<AtomicU64>,
    fail_write_at: Option<u64>,
}

impl MemMedium {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            mounted: false,
            write_delay: Duration::ZERO,
            fail_all_opens: false,
            fail_write_opens: false,
            write_counter: Arc::new(AtomicU64::new(0)),
            fail_write_at: None,
        }
    }

    /// Stall every write, starving the drain below capture throughput.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn failing_opens(mut self) -> Self {
        self.fail_all_opens = true;
        self
    }

    /// Reads still work; any open that could write fails.
    pub fn failing_write_opens(mut self) -> Self {
        self.fail_write_opens = true;
        self
    }

    /// Fail exactly the `n`th write call (1-based, counted across all
    /// files); every other write succeeds.
    pub fn failing_nth_write(mut self, n: u64) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    pub fn preload(&self, path: &str, contents: &[u8]) {
        self.files
            .lock()
            .insert(path.to_string(), Arc::new(Mutex::new(contents.to_vec())));
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).map(|d| d.lock().clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl StorageMedium for MemMedium {
    fn mount(&mut self) -> Result<(), RecorderError> {
        self.mounted = true;
        Ok(())
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }

    fn exists(&self, path: &str) -> bool {
        self.files.lock().contains_key(path)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn MediumFile>, RecorderError> {
        if self.fail_all_opens || (self.fail_write_opens && mode != OpenMode::Read) {
            return Err(RecorderError::Medium(format!(
                "injected open failure for {path}"
            )));
        }
        if !self.mounted {
            return Err(RecorderError::Medium("medium not mounted".into()));
        }

        let mut files = self.files.lock();
        let data = match mode {
            OpenMode::Create => {
                let data = Arc::new(Mutex::new(Vec::new()));
                files.insert(path.to_string(), Arc::clone(&data));
                data
            }
            OpenMode::Append => Arc::clone(files.entry(path.to_string()).or_default()),
            OpenMode::Read | OpenMode::ReadUpdate => files
                .get(path)
                .map(Arc::clone)
                .ok_or_else(|| RecorderError::Medium(format!("{path} not found")))?,
        };
        let pos = if mode == OpenMode::Append {
            data.lock().len() as u64
        } else {
            0
        };
        Ok(Box::new(MemFile {
            data,
            pos,
            write_delay: self.write_delay,
            write_counter: Arc::clone(&self.write_counter),
            fail_write_at: self.fail_write_at,
        }))
    }
}

struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: u64,
    write_delay: Duration,
    write_counter: Arc<AtomicU64>,
    fail_write_at: Option<u64>,
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.lock();
        let pos = self.pos as usize;
        if pos >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - pos);
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let nth = self.write_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(nth) == self.fail_write_at {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        let mut data = self.data.lock();
        let pos = self.pos as usize;
        let end = pos + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[pos..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let len = self.data.lock().len() as i64;
        let target = match from {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

/// Records deep-sleep requests instead of powering anything down.
#[derive(Clone, Default)]
pub struct SleepSpy {
    pub requests: Arc<Mutex<Vec<u64>>>,
}

impl SleepController for SleepSpy {
    fn request_deep_sleep(&mut self, minutes: u64) {
        self.requests.lock().push(minutes);
    }
}
