use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::state::RecorderState;
use crate::processing::arena::SampleArena;
use crate::storage::container::{self, PayloadSink};
use crate::traits::clock::MonotonicClock;
use crate::traits::medium::StorageMedium;
use crate::traits::sample_source::SampleSource;

/// What a completed sub-session reports to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubSessionReport {
    pub elapsed_ms: u64,
    pub payload_bytes: u64,
    pub epochs_drained: u64,
}

/// Commands from the capture context to the drain context.
enum DrainCommand {
    /// Create the container and write its placeholder header.
    CreateContainer,
    /// Open the append handle onto the container payload.
    OpenPayload,
    /// Emit arena contents `[drain cursor, upto)` to the medium in blocks.
    Drain { upto: usize, epoch: u64 },
    /// Patch the container's size fields from the file's true length.
    Finalize,
    Shutdown,
}

/// Replies from the drain context. Each command produces exactly one
/// event, so the capture context never has more than one outstanding
/// request.
enum DrainEvent {
    ContainerCreated,
    PayloadOpen,
    MediumFailed(RecorderError),
    DrainComplete { epoch: u64, bytes: u64 },
    DrainFailed(RecorderError),
    Finalized { payload_bytes: u32 },
    FinalizeFailed(RecorderError),
}

/// The drain context: owns the medium and the drain cursor, blocks on
/// medium writes for as long as they take. Returns the medium to the
/// caller when shut down.
struct DrainWorker {
    medium: Box<dyn StorageMedium>,
    arena: Arc<Mutex<SampleArena>>,
    path: String,
    block_samples: usize,
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    sink: Option<PayloadSink>,
}

impl DrainWorker {
    fn run(
        mut self,
        commands: Receiver<DrainCommand>,
        events: Sender<DrainEvent>,
    ) -> Box<dyn StorageMedium> {
        while let Ok(command) = commands.recv() {
            let event = match command {
                DrainCommand::CreateContainer => self.create_container(),
                DrainCommand::OpenPayload => self.open_payload(),
                DrainCommand::Drain { upto, epoch } => self.drain(upto, epoch),
                DrainCommand::Finalize => self.finalize(),
                DrainCommand::Shutdown => break,
            };
            if events.send(event).is_err() {
                break;
            }
        }
        self.medium
    }

    fn create_container(&mut self) -> DrainEvent {
        let result = self.medium.mount().and_then(|_| {
            container::create(
                &mut *self.medium,
                &self.path,
                self.sample_rate,
                self.bit_depth,
                self.channels,
            )
        });
        match result {
            Ok(()) => DrainEvent::ContainerCreated,
            Err(e) => DrainEvent::MediumFailed(e),
        }
    }

    fn open_payload(&mut self) -> DrainEvent {
        match PayloadSink::open(&mut *self.medium, &self.path) {
            Ok(sink) => {
                self.sink = Some(sink);
                DrainEvent::PayloadOpen
            }
            Err(e) => DrainEvent::MediumFailed(e),
        }
    }

    fn drain(&mut self, upto: usize, epoch: u64) -> DrainEvent {
        let Some(mut sink) = self.sink.take() else {
            return DrainEvent::DrainFailed(RecorderError::Medium(
                "drain requested without an open payload handle".into(),
            ));
        };

        let mut bytes = 0u64;
        loop {
            // Lock only long enough to copy a block out; the medium write
            // happens with the arena unlocked so capture never stalls on it.
            let block = self.arena.lock().drain_block(self.block_samples, upto);
            let Some(block) = block else { break };

            let pcm: Vec<u8> = block.iter().flat_map(|s| s.to_le_bytes()).collect();
            if let Err(e) = sink.append(&pcm) {
                // Abort immediately: retries belong to the orchestrator at
                // session granularity, never mid-drain.
                log::error!("drain aborted after {bytes} bytes: {e}");
                return DrainEvent::DrainFailed(e);
            }
            bytes += pcm.len() as u64;
        }

        match sink.finish() {
            Ok(()) => {
                log::info!("arena drained: {bytes} bytes (epoch {epoch})");
                DrainEvent::DrainComplete { epoch, bytes }
            }
            Err(e) => DrainEvent::DrainFailed(e),
        }
    }

    fn finalize(&mut self) -> DrainEvent {
        self.sink = None;
        match container::finalize(&mut *self.medium, &self.path) {
            Ok(payload_bytes) => DrainEvent::Finalized { payload_bytes },
            Err(e) => DrainEvent::FinalizeFailed(e),
        }
    }
}

/// Runs one bounded recording sub-session: a real-time capture loop
/// feeding the arena, with a background drain worker emptying it to the
/// container on the medium.
///
/// The two contexts synchronize only at state-machine transition
/// boundaries, through a command/event channel pair — the capture context
/// owns the capture cursor, the drain context owns the drain cursor, and
/// neither writes the other's.
pub struct Recorder {
    config: RecorderConfiguration,
}

impl Recorder {
    pub fn new(config: RecorderConfiguration) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    /// Capture for `minutes` of wall-clock time (or until `stop` is set),
    /// draining the arena to `path` on the medium. Returns the medium for
    /// reuse along with the session report.
    ///
    /// The capture loop polls the monotonic clock rather than sleeping the
    /// process; its pacing comes from the sample source's blocking read.
    pub fn run_sub_session<S: SampleSource>(
        &self,
        source: &mut S,
        medium: Box<dyn StorageMedium>,
        clock: &dyn MonotonicClock,
        stop: &AtomicBool,
        path: &str,
        minutes: u64,
    ) -> Result<(Box<dyn StorageMedium>, SubSessionReport), RecorderError> {
        let arena = Arc::new(Mutex::new(SampleArena::new(self.config.arena_samples)));
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();

        let worker = DrainWorker {
            medium,
            arena: Arc::clone(&arena),
            path: path.to_string(),
            block_samples: self.config.drain_block_samples(),
            sample_rate: self.config.sample_rate,
            bit_depth: self.config.bit_depth,
            channels: self.config.channels,
            sink: None,
        };
        let handle = thread::Builder::new()
            .name("drain-worker".into())
            .spawn(move || worker.run(cmd_rx, evt_tx))
            .map_err(|e| RecorderError::Halted(format!("failed to spawn drain worker: {e}")))?;

        let outcome = self.capture_session(source, clock, stop, minutes, &arena, &cmd_tx, &evt_rx);

        let _ = cmd_tx.send(DrainCommand::Shutdown);
        let medium = handle
            .join()
            .map_err(|_| RecorderError::Halted("drain worker panicked".into()))?;

        let report = outcome?;
        Ok((medium, report))
    }

    fn capture_session<S: SampleSource>(
        &self,
        source: &mut S,
        clock: &dyn MonotonicClock,
        stop: &AtomicBool,
        minutes: u64,
        arena: &Mutex<SampleArena>,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
    ) -> Result<SubSessionReport, RecorderError> {
        // Header first, so even an empty session leaves a container that
        // can be finalized rather than a stray file of raw bytes.
        send(commands, DrainCommand::CreateContainer)?;
        match recv_blocking(events)? {
            DrainEvent::ContainerCreated => {}
            DrainEvent::MediumFailed(e) => return Err(e),
            _ => return Err(protocol_error()),
        }

        let start = clock.monotonic_ms();
        let mut epochs_drained = 0u64;
        let captured = self.capture_and_drain(
            source,
            clock,
            stop,
            start + minutes * 60_000,
            arena,
            commands,
            events,
            &mut epochs_drained,
        );

        // Finalize even after a failed drain or a capture overrun: the
        // header must never keep its placeholder sizes over payload bytes
        // that did reach the medium.
        let finalized = self.request_finalize(commands, events);

        match captured {
            Ok(()) => Ok(SubSessionReport {
                elapsed_ms: clock.monotonic_ms() - start,
                payload_bytes: finalized?,
                epochs_drained,
            }),
            Err(e) => {
                if let Err(fe) = finalized {
                    log::warn!("finalize after failed session also failed: {fe}");
                }
                Err(e)
            }
        }
    }

    fn capture_and_drain<S: SampleSource>(
        &self,
        source: &mut S,
        clock: &dyn MonotonicClock,
        stop: &AtomicBool,
        deadline: u64,
        arena: &Mutex<SampleArena>,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
        epochs_drained: &mut u64,
    ) -> Result<(), RecorderError> {
        let mut state = RecorderState::Idle;
        let mut frames = vec![0i16; self.config.capture_chunk * 2];

        while clock.monotonic_ms() < deadline && !stop.load(Ordering::SeqCst) {
            let read = source.read(&mut frames, self.config.read_timeout_ms)?;
            if read > 0 {
                // Full-duplex monitoring; a dropped monitor frame is not
                // worth failing the session over.
                if let Err(e) = source.write(&frames[..read], self.config.write_timeout_ms) {
                    log::debug!("monitor passthrough write failed: {e}");
                }
                arena.lock().append(&frames[..read])?;
            }
            state = self.service_state(state, arena, commands, events, epochs_drained)?;
        }

        self.finish_drains(state, arena, commands, events, epochs_drained)
    }

    /// Ask the drain context to patch the container sizes. Skips stale
    /// replies left in the channel by a drain the capture error path
    /// abandoned.
    fn request_finalize(
        &self,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
    ) -> Result<u64, RecorderError> {
        send(commands, DrainCommand::Finalize)?;
        loop {
            match recv_blocking(events)? {
                DrainEvent::Finalized { payload_bytes } => return Ok(payload_bytes as u64),
                DrainEvent::FinalizeFailed(e) => return Err(e),
                _ => {}
            }
        }
    }

    /// Advance the state machine once per capture cycle. The recording
    /// state is momentary: it dispatches its drain within the same cycle.
    fn service_state(
        &self,
        state: RecorderState,
        arena: &Mutex<SampleArena>,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
        epochs_drained: &mut u64,
    ) -> Result<RecorderState, RecorderError> {
        let mut state = self.step_state(state, arena, commands, events, epochs_drained)?;
        if state == RecorderState::Recording {
            state = self.step_state(state, arena, commands, events, epochs_drained)?;
        }
        Ok(state)
    }

    fn step_state(
        &self,
        state: RecorderState,
        arena: &Mutex<SampleArena>,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
        epochs_drained: &mut u64,
    ) -> Result<RecorderState, RecorderError> {
        match state {
            RecorderState::Idle => {
                let cycles_left = arena.lock().cycles_until_full(self.config.capture_chunk);
                if cycles_left <= self.config.lead_margin_cycles {
                    arena.lock().mark_drain_pending();
                    send(commands, DrainCommand::OpenPayload)?;
                    log::debug!("opening medium {cycles_left} capture cycles before arena wrap");
                    Ok(RecorderState::MediumOpening)
                } else {
                    Ok(RecorderState::Idle)
                }
            }
            RecorderState::MediumOpening => match try_recv(events)? {
                Some(DrainEvent::PayloadOpen) => Ok(RecorderState::Recording),
                Some(DrainEvent::MediumFailed(e)) => Err(e),
                Some(_) => Err(protocol_error()),
                None => Ok(RecorderState::MediumOpening),
            },
            RecorderState::Recording => {
                let (upto, epoch) = {
                    let a = arena.lock();
                    (a.capacity(), a.epoch())
                };
                send(commands, DrainCommand::Drain { upto, epoch })?;
                log::info!("arena drain started (epoch {epoch}, {upto} samples)");
                Ok(RecorderState::Draining)
            }
            RecorderState::Draining => match try_recv(events)? {
                Some(DrainEvent::DrainComplete { epoch, .. }) => {
                    arena.lock().complete_drain();
                    *epochs_drained += 1;
                    log::debug!("epoch {epoch} complete, arena reset");
                    Ok(RecorderState::Idle)
                }
                Some(DrainEvent::DrainFailed(e)) => Err(e),
                Some(_) => Err(protocol_error()),
                None => Ok(RecorderState::Draining),
            },
        }
    }

    /// After the capture loop exits: run any outstanding drain to
    /// completion, then force a final synchronous drain of whatever the
    /// arena still holds, so the container is never finalized with staged
    /// audio left behind.
    fn finish_drains(
        &self,
        state: RecorderState,
        arena: &Mutex<SampleArena>,
        commands: &Sender<DrainCommand>,
        events: &Receiver<DrainEvent>,
        epochs_drained: &mut u64,
    ) -> Result<(), RecorderError> {
        if state.drain_outstanding() {
            if !state.is_draining() {
                if state == RecorderState::MediumOpening {
                    match recv_blocking(events)? {
                        DrainEvent::PayloadOpen => {}
                        DrainEvent::MediumFailed(e) => return Err(e),
                        _ => return Err(protocol_error()),
                    }
                }
                let (upto, epoch) = {
                    let a = arena.lock();
                    (a.filled_extent(), a.epoch())
                };
                send(commands, DrainCommand::Drain { upto, epoch })?;
            }
            self.await_drain(events)?;
            arena.lock().complete_drain();
            *epochs_drained += 1;
        }

        let (remaining, epoch) = {
            let a = arena.lock();
            (a.capture_cursor(), a.epoch())
        };
        if remaining > 0 {
            send(commands, DrainCommand::OpenPayload)?;
            match recv_blocking(events)? {
                DrainEvent::PayloadOpen => {}
                DrainEvent::MediumFailed(e) => return Err(e),
                _ => return Err(protocol_error()),
            }
            send(commands, DrainCommand::Drain { upto: remaining, epoch })?;
            self.await_drain(events)?;
            arena.lock().complete_drain();
            *epochs_drained += 1;
        }
        Ok(())
    }

    fn await_drain(&self, events: &Receiver<DrainEvent>) -> Result<(), RecorderError> {
        match recv_blocking(events)? {
            DrainEvent::DrainComplete { .. } => Ok(()),
            DrainEvent::DrainFailed(e) => Err(e),
            _ => Err(protocol_error()),
        }
    }
}

fn send(commands: &Sender<DrainCommand>, command: DrainCommand) -> Result<(), RecorderError> {
    commands
        .send(command)
        .map_err(|_| RecorderError::Halted("drain worker terminated unexpectedly".into()))
}

fn recv_blocking(events: &Receiver<DrainEvent>) -> Result<DrainEvent, RecorderError> {
    events
        .recv()
        .map_err(|_| RecorderError::Halted("drain worker terminated unexpectedly".into()))
}

fn try_recv(events: &Receiver<DrainEvent>) -> Result<Option<DrainEvent>, RecorderError> {
    match events.try_recv() {
        Ok(event) => Ok(Some(event)),
        Err(TryRecvError::Empty) => Ok(None),
        Err(TryRecvError::Disconnected) => Err(RecorderError::Halted(
            "drain worker terminated unexpectedly".into(),
        )),
    }
}

fn protocol_error() -> RecorderError {
    RecorderError::Halted("unexpected reply from drain worker".into())
}
