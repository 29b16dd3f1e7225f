/// Configuration for the recorder core.
///
/// The lead margin and drain block size are deliberately configuration
/// rather than constants: the overrun-safety guarantee of the arena only
/// holds when drain throughput exceeds capture throughput by the margin,
/// and that ratio depends on the target medium.
#[derive(Debug, Clone)]
pub struct RecorderConfiguration {
    /// Output sample rate in Hz (default: 44_100).
    pub sample_rate: u32,

    /// Bit depth of the PCM payload (default: 16).
    pub bit_depth: u16,

    /// Channels in the container (default: 1 — the capture path
    /// channel-selects one side of the stereo bus).
    pub channels: u16,

    /// Arena capacity in samples. One session epoch fills the arena from
    /// offset 0 to capacity before it is drained and reset.
    pub arena_samples: usize,

    /// Samples appended to the arena per capture cycle.
    pub capture_chunk: usize,

    /// Capture cycles before arena-full at which the drain is triggered
    /// (default: 10).
    pub lead_margin_cycles: usize,

    /// Size of each block the drain writes to the medium (default: 3 KiB).
    pub drain_block_bytes: usize,

    /// Timeout for the blocking sample-source read, per cycle.
    pub read_timeout_ms: u32,

    /// Timeout for the monitor passthrough write.
    pub write_timeout_ms: u32,

    /// Duration of each chained sub-session in continuous mode.
    pub sub_session_minutes: u64,

    /// Deep-sleep interval after a bounded session, so the schedule is
    /// re-evaluated on the next wake.
    pub post_session_sleep_minutes: u64,

    /// Path of the schedule table on the medium.
    pub schedule_path: String,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.arena_samples == 0 || self.capture_chunk == 0 {
            return Err("arena and capture chunk must be non-empty".into());
        }
        if self.capture_chunk > self.arena_samples {
            return Err("capture chunk larger than arena".into());
        }
        if self.lead_margin_cycles == 0 {
            return Err("lead margin must be at least one cycle".into());
        }
        if self.lead_margin_cycles >= self.arena_samples / self.capture_chunk {
            return Err("lead margin covers the whole arena".into());
        }
        if self.drain_block_bytes < 2 || self.drain_block_bytes % 2 != 0 {
            return Err("drain block must hold whole 16-bit samples".into());
        }
        Ok(())
    }

    /// Samples per drain block.
    pub fn drain_block_samples(&self) -> usize {
        self.drain_block_bytes / 2
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            bit_depth: 16,
            channels: 1,
            arena_samples: 4 * 1024 * 1024,
            capture_chunk: 512,
            lead_margin_cycles: 10,
            drain_block_bytes: 3 * 1024,
            read_timeout_ms: 1000,
            write_timeout_ms: 100,
            sub_session_minutes: 60,
            post_session_sleep_minutes: 60,
            schedule_path: "/Calendar.csv".into(),
        }
    }
}
